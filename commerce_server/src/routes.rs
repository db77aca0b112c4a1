//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate
//! module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the engine traits, so the whole surface can be exercised against a mock backend. Since
//! actix cannot register generic handlers directly, each route gets a tiny `HttpServiceFactory` struct via the
//! `route!` macro below.

use actix_web::{get, web, HttpResponse, Responder};
use commerce_engine::{
    db_types::{NewCoupon, NewProduct, OrderId, ProductId, Role},
    order_objects::OrderQueryFilter,
    traits::{OrderFlowDatabase, OrderManagement},
    CheckoutApi,
    OrderFlowApi,
    OrderQueryApi,
};
use log::*;

use crate::{
    auth::JwtClaims,
    data_objects::{
        BulkStatusParams,
        BulkStockParams,
        CartItemParams,
        CheckoutParams,
        OrderSearchParams,
        UpdateStatusParams,
    },
    errors::ServerError,
};

// Actix cannot handle generics in handlers, so the registration glue is generated with the `route!` macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>); }
        paste::paste! {
            impl<A> [<$name:camel Route>]<A> {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self {
                    Self(core::marker::PhantomData)
                }
            }
        }
        paste::paste! {
            impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
            where A: $($bounds +)+ 'static
            {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name::<A>);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:tt),+ requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>); }
        paste::paste! {
            impl<A> [<$name:camel Route>]<A> {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self {
                    Self(core::marker::PhantomData)
                }
            }
        }
        paste::paste! {
            impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
            where A: $($bounds +)+ 'static
            {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name::<A>)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };
}

// ----------------------------------------------   Health  -----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------------
route!(checkout => Post "/checkout" impl OrderFlowDatabase);
/// Convert the caller's cart into an order. The user id comes from the access token; prices, discounts and totals
/// are computed server-side from stored data, so the request body carries nothing but an optional coupon code.
pub async fn checkout<B: OrderFlowDatabase>(
    claims: JwtClaims,
    body: web::Json<CheckoutParams>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST checkout for user {}", claims.user_id());
    let placed = api.checkout(claims.user_id(), params.coupon_code).await?;
    Ok(HttpResponse::Created().json(placed))
}

//----------------------------------------------     Cart    ----------------------------------------------------------
route!(my_cart => Get "/cart" impl OrderManagement);
pub async fn my_cart<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let items = api.cart(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(set_cart_item => Put "/cart" impl OrderFlowDatabase);
/// Set the quantity for one product (last-writer-wins). Quantity zero removes the line.
pub async fn set_cart_item<B: OrderFlowDatabase>(
    claims: JwtClaims,
    body: web::Json<CartItemParams>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let items = api.set_cart_item(claims.user_id(), &params.product_id, params.quantity).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(remove_cart_item => Delete "/cart/{product_id}" impl OrderFlowDatabase);
pub async fn remove_cart_item<B: OrderFlowDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = ProductId::from(path.into_inner());
    api.remove_cart_item(claims.user_id(), &product_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------    Orders   ----------------------------------------------------------
route!(my_orders => Get "/orders" impl OrderManagement);
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user {}", claims.user_id());
    let orders = api.orders_for_user(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
/// Fetch one order with items and tracking history. Owners see their own orders; admins see everyone's.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let details = api
        .order_details(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    if details.order.user_id != claims.user_id() && !claims.is_admin() {
        debug!("💻️ User {} may not view order {order_id}", claims.user_id());
        return Err(ServerError::InsufficientPermissions("You may only view your own orders.".to_string()));
    }
    Ok(HttpResponse::Ok().json(details))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl OrderFlowDatabase);
/// Cancel an order as its owner. The state machine decides whether the order can still be cancelled; ownership is
/// decided here.
pub async fn cancel_order<B: OrderFlowDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    query_api: web::Data<OrderQueryApi<B>>,
    flow_api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let order = query_api
        .order_by_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    if order.user_id != claims.user_id() && !claims.is_admin() {
        return Err(ServerError::InsufficientPermissions("You may only cancel your own orders.".to_string()));
    }
    let order = flow_api.cancel_order(&order_id, "Cancelled by customer").await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Post "/orders/{order_id}/status" impl OrderFlowDatabase requires [Role::Admin]);
/// Admin status override. Still runs through the transition table; an illegal move gets a 409 naming both statuses.
pub async fn update_order_status<B: OrderFlowDatabase>(
    path: web::Path<String>,
    body: web::Json<UpdateStatusParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let params = body.into_inner();
    debug!("💻️ POST status change for {order_id} to {}", params.status);
    let (order, entry) = api.update_status(&order_id, params.status, params.tracking_update()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "order": order, "tracking": entry })))
}

//----------------------------------------------    Admin    ----------------------------------------------------------
route!(search_orders => Get "/admin/orders" impl OrderManagement requires [Role::Admin]);
pub async fn search_orders<B: OrderManagement>(
    query: web::Query<OrderSearchParams>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::from(query.into_inner());
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(bulk_status_update => Post "/admin/orders/status" impl OrderFlowDatabase requires [Role::Admin]);
/// Bulk status update with partial-failure semantics: the response reports per-item verdicts and the batch itself
/// always succeeds with a 200.
pub async fn bulk_status_update<B: OrderFlowDatabase>(
    body: web::Json<BulkStatusParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let updates = body.into_inner().updates;
    debug!("💻️ POST bulk status update for {} orders", updates.len());
    let outcome = api.bulk_update_statuses(updates).await;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(upsert_product => Post "/admin/products" impl OrderFlowDatabase requires [Role::Admin]);
pub async fn upsert_product<B: OrderFlowDatabase>(
    body: web::Json<NewProduct>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.upsert_product(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(bulk_stock_update => Post "/admin/products/stock" impl OrderFlowDatabase requires [Role::Admin]);
pub async fn bulk_stock_update<B: OrderFlowDatabase>(
    body: web::Json<BulkStockParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let adjustments = body.into_inner().adjustments;
    debug!("💻️ POST bulk stock adjustment for {} products", adjustments.len());
    let outcome = api.bulk_adjust_stock(adjustments).await;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(create_coupon => Post "/admin/coupons" impl OrderFlowDatabase requires [Role::Admin]);
pub async fn create_coupon<B: OrderFlowDatabase>(
    body: web::Json<NewCoupon>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let coupon = api.create_coupon(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(coupon))
}

route!(coupon_by_code => Get "/admin/coupons/{code}" impl OrderManagement requires [Role::Admin]);
pub async fn coupon_by_code<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let code = path.into_inner();
    let coupon =
        api.coupon(&code).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Coupon {code} not found")))?;
    Ok(HttpResponse::Ok().json(coupon))
}

//----------------------------------------------   Products  ----------------------------------------------------------
route!(product_by_id => Get "/products/{product_id}" impl OrderManagement);
pub async fn product_by_id<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = ProductId::from(path.into_inner());
    let product = api
        .product(&product_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Product {product_id} not found")))?;
    Ok(HttpResponse::Ok().json(product))
}
