//! The webhook's HMAC gate, exercised against a stub handler: the middleware either replays the verified body into
//! the route or rejects the delivery outright.

use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use scg_common::Secret;

use crate::{helpers::calculate_hmac, middleware::HmacMiddlewareFactory};

const WEBHOOK_SECRET: &str = "whsec_test";
const SIGNATURE_HEADER: &str = "x-payment-signature";

async fn deliver(body: &'static str, signature: Option<String>, enabled: bool) -> StatusCode {
    let app = test::init_service(
        App::new().service(
            web::scope("/webhook")
                .wrap(HmacMiddlewareFactory::new(
                    SIGNATURE_HEADER,
                    Secret::new(WEBHOOK_SECRET.to_string()),
                    enabled,
                ))
                .route(
                    "/payments",
                    web::post().to(|body: web::Bytes| async move {
                        // The middleware must hand the handler the original body, intact.
                        assert!(!body.is_empty());
                        HttpResponse::Ok().body("ok")
                    }),
                ),
        ),
    )
    .await;
    let mut req = test::TestRequest::post()
        .uri("/webhook/payments")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body);
    if let Some(sig) = signature {
        req = req.insert_header((SIGNATURE_HEADER, sig));
    }
    match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => res.status(),
        Err(e) => super::helpers::error_to_parts(e).await.0,
    }
}

const BODY: &str = r#"{"type":"payment_intent.created","payment_id":"pi_1","order_id":"ord-1","amount":43600}"#;

#[actix_web::test]
async fn valid_signature_is_accepted() {
    let sig = calculate_hmac(WEBHOOK_SECRET, BODY.as_bytes());
    assert_eq!(deliver(BODY, Some(sig), true).await, StatusCode::OK);
}

#[actix_web::test]
async fn missing_signature_is_forbidden() {
    assert_eq!(deliver(BODY, None, true).await, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn wrong_signature_is_forbidden() {
    let sig = calculate_hmac("some-other-secret", BODY.as_bytes());
    assert_eq!(deliver(BODY, Some(sig), true).await, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn disabled_checks_let_unsigned_requests_through() {
    assert_eq!(deliver(BODY, None, false).await, StatusCode::OK);
}
