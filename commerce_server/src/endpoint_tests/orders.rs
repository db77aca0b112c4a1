use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use commerce_engine::{
    db_types::{Order, OrderId, OrderStatusType, Role},
    order_objects::OrderResult,
    OrderQueryApi,
};
use scg_common::Money;

use super::{helpers::{get_request, issue_token}, mocks::MockOrderManager};
use crate::routes::{MyOrdersRoute, OrderByIdRoute, SearchOrdersRoute};

fn order_for(user_id: &str) -> Order {
    Order {
        id: 1,
        order_id: OrderId("ord-0000000000000001".into()),
        user_id: user_id.to_string(),
        status: OrderStatusType::Pending,
        subtotal: Money::from_major(200),
        discount: Money::ZERO,
        shipping: Money::from_major(200),
        tax: Money::from_major(36),
        total_price: Money::from_major(436),
        coupon_code: None,
        coupon_kind: None,
        coupon_value: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 12, 10, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 12, 10, 30, 0).unwrap(),
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut manager = MockOrderManager::new();
    manager.expect_fetch_orders_for_user().returning(|user_id| Ok(vec![order_for(user_id)]));
    manager.expect_fetch_order_details().returning(|_| {
        Ok(Some(OrderResult { order: order_for("alice"), items: vec![], tracking: vec![] }))
    });
    manager.expect_search_orders().returning(|_| Ok(vec![order_for("alice"), order_for("bob")]));
    let api = OrderQueryApi::new(manager);
    cfg.service(MyOrdersRoute::<MockOrderManager>::new())
        .service(OrderByIdRoute::<MockOrderManager>::new())
        .service(SearchOrdersRoute::<MockOrderManager>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn fetch_my_orders_without_token_is_unauthorized() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("", "/orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token was provided"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_my_orders_with_tampered_token_is_unauthorized() {
    let _ = env_logger::try_init();
    let mut token = issue_token("alice", vec![Role::User]);
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let (status, body) = get_request(&token, "/orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token signature is invalid"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/orders", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ord-0000000000000001"), "unexpected body: {body}");
    assert!(body.contains(r#""user_id":"alice""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn owners_see_their_own_order() {
    let _ = env_logger::try_init();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/orders/ord-0000000000000001", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""tracking":[]"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn other_users_orders_are_forbidden() {
    let _ = env_logger::try_init();
    let token = issue_token("mallory", vec![Role::User]);
    let (status, body) = get_request(&token, "/orders/ord-0000000000000001", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("your own orders"), "unexpected body: {body}");
}

#[actix_web::test]
async fn admins_see_any_order() {
    let _ = env_logger::try_init();
    let token = issue_token("support-1", vec![Role::User, Role::Admin]);
    let (status, _) = get_request(&token, "/orders/ord-0000000000000001", configure).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn order_search_requires_the_admin_role() {
    let _ = env_logger::try_init();
    let token = issue_token("alice", vec![Role::User]);
    let (status, _) = get_request(&token, "/admin/orders?user_id=alice", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = issue_token("support-1", vec![Role::User, Role::Admin]);
    let (status, body) = get_request(&token, "/admin/orders?user_id=alice", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("bob"), "unexpected body: {body}");
}
