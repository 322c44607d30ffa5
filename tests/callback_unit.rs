use salda_booking::api::midtrans::{is_failed, is_settled};
use salda_booking::api::midtrans_client::signature_key;
use salda_booking::booking::{PaymentMetadata, VoucherSnapshot};

#[test]
fn settlement_statuses() {
    assert!(is_settled("settlement"));
    assert!(is_settled("capture"));
    assert!(!is_settled("pending"));
    assert!(!is_settled("deny"));
}

#[test]
fn failure_statuses() {
    for status in ["deny", "cancel", "expire", "failure"] {
        assert!(is_failed(status), "{status} should map to FAILED");
    }
    assert!(!is_failed("settlement"));
    assert!(!is_failed("pending"));
}

#[test]
fn signature_is_deterministic_and_keyed() {
    let a = signature_key("BOOKING-1", "200", "238600.00", "server-key");
    let b = signature_key("BOOKING-1", "200", "238600.00", "server-key");
    assert_eq!(a, b);
    // 128 hex chars of SHA-512.
    assert_eq!(a.len(), 128);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

    assert_ne!(a, signature_key("BOOKING-2", "200", "238600.00", "server-key"));
    assert_ne!(a, signature_key("BOOKING-1", "201", "238600.00", "server-key"));
    assert_ne!(a, signature_key("BOOKING-1", "200", "238601.00", "server-key"));
    assert_ne!(a, signature_key("BOOKING-1", "200", "238600.00", "other-key"));
}

#[test]
fn metadata_wire_format_matches_checkout_payload() {
    let meta = PaymentMetadata {
        streamer_id: 7,
        user_id: 3,
        start_time: "2030-06-12T10:00:00Z".parse().unwrap(),
        end_time: "2030-06-12T12:00:00Z".parse().unwrap(),
        platform: "shopee".to_string(),
        special_request: None,
        sub_acc_link: Some("https://sub.example".to_string()),
        sub_acc_pass: None,
        first_name: "Ayu".to_string(),
        last_name: "Lestari".to_string(),
        price: 288_600,
        voucher: Some(VoucherSnapshot {
            id: 1,
            code: "SAVE10".to_string(),
            discount_amount: 50_000,
        }),
        final_price: 238_600,
    };

    let value = serde_json::to_value(&meta).unwrap();
    let obj = value.as_object().unwrap();

    // camelCase except the sub-account fields, which the checkout payload
    // carries snake_cased.
    assert!(obj.contains_key("streamerId"));
    assert!(obj.contains_key("finalPrice"));
    assert!(obj.contains_key("sub_acc_link"));
    assert!(!obj.contains_key("specialRequest"));
    assert_eq!(value["voucher"]["discountAmount"], 50_000);

    let back: PaymentMetadata = serde_json::from_value(value).unwrap();
    assert_eq!(back.final_price, meta.final_price);
    assert_eq!(back.voucher.unwrap().code, "SAVE10");
}
