use salda_booking::pricing::compute_price;

#[test]
fn base_rate_two_hours() {
    // 100k/hr with 30% fee -> 130k/hr; 2 hours -> 260k; 11% tax -> 288.6k.
    let quote = compute_price(100_000, 2, None);

    assert!((quote.price_with_fee - 130_000.0).abs() < 1e-6);
    assert!((quote.subtotal - 260_000.0).abs() < 1e-6);
    assert!((quote.tax - 28_600.0).abs() < 1e-6);
    assert_eq!(quote.total, 288_600);
    assert_eq!(quote.discount, 0);
    assert_eq!(quote.final_price, 288_600);
}

#[test]
fn voucher_discount_applied() {
    let quote = compute_price(100_000, 2, Some(50_000));

    assert_eq!(quote.total, 288_600);
    assert_eq!(quote.discount, 50_000);
    assert_eq!(quote.final_price, 238_600);
}

#[test]
fn discount_never_exceeds_total() {
    let quote = compute_price(100_000, 2, Some(1_000_000));

    assert_eq!(quote.discount, quote.total);
    assert_eq!(quote.final_price, 0);
}

#[test]
fn negative_discount_ignored() {
    let quote = compute_price(100_000, 2, Some(-500));

    assert_eq!(quote.discount, 0);
    assert_eq!(quote.final_price, quote.total);
}

#[test]
fn rounding_happens_once_at_total() {
    // 75k/hr -> 97.5k with fee; 1 hour -> tax 10,725 -> total 108,225.
    let quote = compute_price(75_000, 1, None);

    assert_eq!(quote.total, 108_225);

    // 99,999/hr keeps fractional intermediates until the final round.
    let quote = compute_price(99_999, 3, None);
    let expected = (99_999.0 * 1.3 * 3.0 * 1.11_f64).round() as i64;
    assert_eq!(quote.total, expected);
}

#[test]
fn zero_hours_quotes_zero() {
    let quote = compute_price(100_000, 0, Some(50_000));

    assert_eq!(quote.total, 0);
    assert_eq!(quote.discount, 0);
    assert_eq!(quote.final_price, 0);
}
