use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::payments::create_payment,
        crate::api::midtrans::payment_callback
    ),
    components(
        schemas(
            crate::api::auth::RegisterRequest,
            crate::api::auth::LoginRequest,
            crate::api::auth::AuthResponse,
            crate::api::payments::CreatePaymentRequest,
            crate::api::payments::CheckoutRequest,
            crate::api::midtrans::PaymentCallback,
            crate::api::midtrans::MidtransNotification,
            crate::booking::PaymentMetadata,
            crate::booking::VoucherSnapshot
        )
    ),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "payments", description = "Snap checkout and settlement callback")
    )
)]
pub struct ApiDoc;
