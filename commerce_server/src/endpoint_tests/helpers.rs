use actix_web::{http::StatusCode, test, web, web::ServiceConfig, App};
use chrono::{Days, Utc};
use commerce_engine::db_types::Role;
use scg_common::Secret;

use crate::auth::{JwtClaims, TokenIssuer, TokenVerifier};

pub const TEST_JWT_SECRET: &str = "scg-endpoint-test-secret";

pub fn issue_token(user_id: &str, roles: Vec<Role>) -> String {
    let claims = JwtClaims::new(user_id, roles, Utc::now() + Days::new(1));
    TokenIssuer::new(&Secret::new(TEST_JWT_SECRET.to_string())).issue_token(claims).expect("could not issue token")
}

/// Issue a GET and return the response status and body. Errors raised before the handler runs (failed extractors,
/// middleware rejections) come back as service-level `Err`s; render those the way the server would.
pub async fn get_request<F>(token: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let verifier = TokenVerifier::new(&Secret::new(TEST_JWT_SECRET.to_string()));
    let app = App::new().app_data(web::Data::new(verifier)).configure(configure);
    let service = test::init_service(app).await;
    let mut req = test::TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).to_string())
        },
        Err(e) => error_to_parts(e).await,
    }
}

pub async fn error_to_parts(e: actix_web::Error) -> (StatusCode, String) {
    let res = e.error_response();
    let status = res.status();
    let body = actix_web::body::to_bytes(res.into_body()).await.unwrap_or_default();
    (status, String::from_utf8_lossy(&body).to_string())
}
