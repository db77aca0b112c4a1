use std::fmt::Debug;

use log::*;

use crate::{
    db_types::OrderStatusType,
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    traits::{OrderFlowDatabase, OrderFlowError, PaymentEvent, PaymentEventOutcome},
};

/// The payment reconciler: consumes provider events and drives order status, payment intents and stock through the
/// backend's idempotent application flow. Safe to call with duplicated, delayed or reordered deliveries.
pub struct PaymentEventApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PaymentEventApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentEventApi")
    }
}

impl<B> PaymentEventApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> PaymentEventApi<B>
where B: OrderFlowDatabase
{
    pub async fn handle_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, OrderFlowError> {
        let kind = event.kind;
        let payment_id = event.payment_id.clone();
        let outcome = self.db.apply_payment_event(event).await?;
        match &outcome {
            PaymentEventOutcome::Applied(order) => {
                debug!("💰️ Event {kind} for [{payment_id}] applied; order {} is now {}", order.order_id, order.status);
                match order.status {
                    OrderStatusType::Paid => {
                        for producer in &self.producers.order_paid_producer {
                            producer.publish_event(OrderPaidEvent::new(order.clone())).await;
                        }
                    },
                    OrderStatusType::Failed | OrderStatusType::Refunded => {
                        for producer in &self.producers.order_annulled_producer {
                            producer.publish_event(OrderAnnulledEvent::new(order.clone())).await;
                        }
                    },
                    _ => {},
                }
            },
            PaymentEventOutcome::Recorded => {
                trace!("💰️ Event {kind} for [{payment_id}] recorded on the intent only");
            },
            PaymentEventOutcome::AlreadyProcessed => {
                debug!("💰️ Event {kind} for [{payment_id}] was already processed. No action taken");
            },
        }
        Ok(outcome)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
