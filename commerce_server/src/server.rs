use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use commerce_engine::{
    events::EventProducers,
    CheckoutApi,
    OrderFlowApi,
    OrderQueryApi,
    PaymentEventApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    middleware::HmacMiddlewareFactory,
    payment_routes::PaymentWebhookRoute,
    routes::{
        health,
        BulkStatusUpdateRoute,
        BulkStockUpdateRoute,
        CancelOrderRoute,
        CheckoutRoute,
        CouponByCodeRoute,
        CreateCouponRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        ProductByIdRoute,
        RemoveCartItemRoute,
        SearchOrdersRoute,
        SetCartItemRoute,
        UpdateOrderStatusRoute,
        UpsertProductRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let producers = EventProducers::default();
    start_expiry_worker(
        db.clone(),
        producers.clone(),
        config.pending_order_timeout,
        Duration::from_secs(config.expiry_check_interval_secs),
    );
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), config.pricing.clone(), producers.clone());
        let flow_api = OrderFlowApi::new(db.clone(), producers.clone());
        let payment_api = PaymentEventApi::new(db.clone(), producers.clone());
        let query_api = OrderQueryApi::new(db.clone());
        let verifier = TokenVerifier::new(&config.auth.jwt_secret);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("scg::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(verifier));
        // Everything under /api requires a bearer token; admin routes additionally require the admin role.
        let api_scope = web::scope("/api")
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(SetCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(SearchOrdersRoute::<SqliteDatabase>::new())
            .service(BulkStatusUpdateRoute::<SqliteDatabase>::new())
            .service(BulkStockUpdateRoute::<SqliteDatabase>::new())
            .service(UpsertProductRoute::<SqliteDatabase>::new())
            .service(CreateCouponRoute::<SqliteDatabase>::new())
            .service(CouponByCodeRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new());
        // The webhook is authenticated by its HMAC signature, not a bearer token.
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                &config.webhook.hmac_header,
                config.webhook.hmac_secret.clone(),
                config.webhook.hmac_checks,
            ))
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
