//----------------------------------------------   Payment webhook  ---------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use commerce_engine::{
    traits::{OrderFlowDatabase, OrderFlowError, PaymentEvent, PaymentEventOutcome},
    PaymentEventApi,
};
use log::{debug, info, trace, warn};

use crate::{data_objects::JsonResponse, route};

route!(payment_webhook => Post "/payments" impl OrderFlowDatabase);
/// Payment-provider event intake. The HMAC middleware has already authenticated the delivery by the time this runs.
///
/// Responses are always in the 200 range: the provider retries anything else, and a business-rule rejection (an
/// illegal transition, an unknown order) will not improve with retrying. The JSON body says what actually happened.
pub async fn payment_webhook<B>(
    req: HttpRequest,
    body: web::Json<PaymentEvent>,
    api: web::Data<PaymentEventApi<B>>,
) -> HttpResponse
where
    B: OrderFlowDatabase,
{
    trace!("🪝️ Received webhook request: {}", req.uri());
    let event = body.into_inner();
    let kind = event.kind;
    let payment_id = event.payment_id.clone();
    let result = match api.handle_event(event).await {
        Ok(PaymentEventOutcome::Applied(order)) => {
            info!("🪝️ Event {kind} for [{payment_id}] applied. Order {} is now {}", order.order_id, order.status);
            JsonResponse::success(format!("Order {} is now {}", order.order_id, order.status))
        },
        Ok(PaymentEventOutcome::Recorded) => {
            debug!("🪝️ Event {kind} for [{payment_id}] recorded");
            JsonResponse::success("Event recorded.")
        },
        Ok(PaymentEventOutcome::AlreadyProcessed) => {
            info!("🪝️ Event {kind} for [{payment_id}] was already processed");
            JsonResponse::success("Event already processed.")
        },
        Err(OrderFlowError::DatabaseError(e)) => {
            warn!("🪝️ Could not process event {kind} for [{payment_id}]. {e}");
            JsonResponse::failure(e)
        },
        Err(e) => {
            warn!("🪝️ Event {kind} for [{payment_id}] rejected. {e}");
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}
