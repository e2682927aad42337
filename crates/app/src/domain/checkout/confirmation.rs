//! Payment Confirmation Handler
//!
//! Drives `Idle -> Confirming -> {Succeeded, Failed, AwaitingRedirect}` per checkout key.
//! Confirmation may send the customer away to the gateway; when they come back (possibly on a
//! fresh process) [`PaymentConfirmationHandler::resume`] asks the gateway what happened and
//! finishes the checkout from the saved continuation.
//!
//! Phase bookkeeping happens in short critical sections. No lock is held while the gateway,
//! continuation store or datastore is called. `Succeeded` and `Failed` end an attempt and the key
//! reads as `Idle` again; `AwaitingRedirect` is kept until the customer returns or it expires.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{
    checkout::{CheckoutKey, materializer::OrderMaterializer, outcomes::CheckoutOutcome},
    continuations::{ContinuationStore, models::CheckoutContinuation},
    notifications::FulfillmentNotifier,
    orders::models::PaymentReference,
    payments::{
        GatewayError, PaymentGateway,
        models::{
            ClientSecret, Confirmation, IntentId, IntentStatus, PaymentIntent, PaymentSession,
        },
    },
};

const DEFAULT_DECLINE_MESSAGE: &str = "the payment was not authorised";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfirmationPhase {
    Idle,
    Confirming,
    Succeeded,
    Failed,
    AwaitingRedirect,
}

/// Reference carried back on the return URL after a gateway redirect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReturnReference {
    #[serde(rename = "payment_intent")]
    pub intent_id: IntentId,

    #[serde(rename = "payment_intent_client_secret")]
    pub client_secret: ClientSecret,
}

#[derive(Debug, Copy, Clone)]
struct TrackedPhase {
    phase: ConfirmationPhase,
    since: Timestamp,
}

pub struct PaymentConfirmationHandler {
    gateway: Arc<dyn PaymentGateway>,
    continuations: Arc<dyn ContinuationStore>,
    materializer: OrderMaterializer,
    notifier: FulfillmentNotifier,

    /// How long a key may stay `AwaitingRedirect`
    max_age: SignedDuration,
    phases: Mutex<FxHashMap<CheckoutKey, TrackedPhase>>,
}

impl std::fmt::Debug for PaymentConfirmationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfirmationHandler")
            .field("materializer", &self.materializer)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

/// Holds a key in [`ConfirmationPhase::Confirming`]. Dropping it without calling
/// [`PhaseGuard::finish`] puts the key back to `Idle`.
struct PhaseGuard<'a> {
    handler: &'a PaymentConfirmationHandler,
    key: CheckoutKey,
    finished: bool,
}

impl PhaseGuard<'_> {
    fn finish(mut self, phase: ConfirmationPhase) {
        let mut phases = self.handler.phases();

        match phase {
            ConfirmationPhase::Confirming | ConfirmationPhase::AwaitingRedirect => {
                phases.insert(
                    self.key.clone(),
                    TrackedPhase {
                        phase,
                        since: Timestamp::now(),
                    },
                );
            }
            ConfirmationPhase::Idle | ConfirmationPhase::Succeeded | ConfirmationPhase::Failed => {
                phases.remove(&self.key);
            }
        }

        self.finished = true;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.handler.phases().remove(&self.key);
        }
    }
}

impl PaymentConfirmationHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        continuations: Arc<dyn ContinuationStore>,
        materializer: OrderMaterializer,
        notifier: FulfillmentNotifier,
        max_age: SignedDuration,
    ) -> Self {
        Self {
            gateway,
            continuations,
            materializer,
            notifier,
            max_age,
            phases: Mutex::new(FxHashMap::default()),
        }
    }

    /// Current phase for `key`.
    pub fn phase(&self, key: &CheckoutKey) -> ConfirmationPhase {
        self.phases()
            .get(key)
            .map_or(ConfirmationPhase::Idle, |tracked| tracked.phase)
    }

    /// Forget the phase recorded for `key`, unless a confirmation is running.
    pub fn reset(&self, key: &CheckoutKey) {
        let mut phases = self.phases();

        if phases.get(key).map(|tracked| tracked.phase) != Some(ConfirmationPhase::Confirming) {
            phases.remove(key);
        }
    }

    /// Forget keys left `AwaitingRedirect` for longer than the maximum age at `now`.
    ///
    /// Running confirmations are never expired; their guard removes them.
    pub fn expire(&self, now: Timestamp) {
        let max_age = self.max_age;

        self.phases().retain(|_, tracked| {
            tracked.phase == ConfirmationPhase::Confirming
                || now.duration_since(tracked.since) <= max_age
        });
    }

    /// Confirm `session` with the gateway.
    ///
    /// `continuation` is saved before the gateway is contacted. If it cannot be saved nothing is
    /// confirmed and the outcome is [`CheckoutOutcome::GatewayUnavailable`].
    #[tracing::instrument(
        name = "checkout.confirmation.confirm",
        skip(self, session, continuation, confirmation),
        fields(checkout_key = %key, intent_id = %session.intent_id)
    )]
    pub async fn confirm(
        &self,
        key: &CheckoutKey,
        session: &PaymentSession,
        continuation: CheckoutContinuation,
        confirmation: Confirmation,
    ) -> CheckoutOutcome {
        let Some(guard) = self.begin(key) else {
            return CheckoutOutcome::InProgress;
        };

        if let Err(error) = self.continuations.save(&continuation).await {
            error!(checkout_key = %key, %error, "continuation could not be saved; not confirming");

            return CheckoutOutcome::GatewayUnavailable;
        }

        let return_url = confirmation.return_url.clone();

        let confirmed = self
            .gateway
            .confirm_intent(&session.client_secret, confirmation)
            .await;

        let intent = match confirmed {
            Ok(intent) => intent,
            Err(GatewayError::Declined { message }) => {
                self.clear_continuation(key).await;
                guard.finish(ConfirmationPhase::Failed);

                return CheckoutOutcome::PaymentDeclined { message };
            }
            Err(GatewayError::Timeout) => {
                warn!(checkout_key = %key, "confirmation timed out; checking intent status");

                match self.gateway.retrieve_intent(&session.client_secret).await {
                    Ok(intent) if reached_gateway(&intent) => intent,
                    Ok(intent) => {
                        info!(
                            checkout_key = %key,
                            status = ?intent.status,
                            "intent not confirmed after timeout"
                        );

                        return CheckoutOutcome::GatewayUnavailable;
                    }
                    Err(error) => {
                        warn!(checkout_key = %key, %error, "intent status unknown after timeout");

                        return CheckoutOutcome::GatewayUnavailable;
                    }
                }
            }
            Err(error) => {
                warn!(checkout_key = %key, %error, "confirmation failed");

                return CheckoutOutcome::GatewayUnavailable;
            }
        };

        match intent.status {
            IntentStatus::Succeeded => {
                let outcome = self.finalize(key, &intent, Some(continuation)).await;

                guard.finish(ConfirmationPhase::Succeeded);

                outcome
            }
            IntentStatus::RequiresAction => {
                let redirect_url = intent
                    .redirect_url
                    .clone()
                    .unwrap_or_else(|| return_url_for(&return_url, &intent));

                guard.finish(ConfirmationPhase::AwaitingRedirect);

                info!(checkout_key = %key, "awaiting customer authentication");

                CheckoutOutcome::AwaitingRedirect { redirect_url }
            }
            IntentStatus::Processing => {
                guard.finish(ConfirmationPhase::AwaitingRedirect);

                info!(checkout_key = %key, "payment processing; sending customer to return url");

                CheckoutOutcome::AwaitingRedirect {
                    redirect_url: return_url_for(&return_url, &intent),
                }
            }
            IntentStatus::Failed => {
                self.clear_continuation(key).await;
                guard.finish(ConfirmationPhase::Failed);

                CheckoutOutcome::PaymentDeclined {
                    message: decline_message(&intent),
                }
            }
        }
    }

    /// Finish a checkout the customer has been redirected back to.
    ///
    /// The gateway is only ever asked for the intent status here, never to charge. On success
    /// the order is created from the continuation saved for this intent, or from the payment
    /// alone if that continuation is gone.
    #[tracing::instrument(
        name = "checkout.confirmation.resume",
        skip(self, reference),
        fields(checkout_key = %key, intent_id = %reference.intent_id)
    )]
    pub async fn resume(&self, key: &CheckoutKey, reference: &ReturnReference) -> CheckoutOutcome {
        if reference.client_secret.intent_id().as_ref() != Some(&reference.intent_id) {
            warn!(checkout_key = %key, "return reference does not match its client secret");

            return CheckoutOutcome::StaleSession;
        }

        let Some(guard) = self.begin(key) else {
            return CheckoutOutcome::InProgress;
        };

        let intent = match self.gateway.retrieve_intent(&reference.client_secret).await {
            Ok(intent) => intent,
            Err(error) => {
                warn!(checkout_key = %key, %error, "intent status could not be retrieved");

                return CheckoutOutcome::GatewayUnavailable;
            }
        };

        if intent.id != reference.intent_id {
            return CheckoutOutcome::StaleSession;
        }

        match intent.status {
            IntentStatus::Succeeded => {
                let continuation = match self.continuations.load(key).await {
                    Ok(Some(continuation)) if continuation.intent_id == intent.id => {
                        Some(continuation)
                    }
                    Ok(Some(continuation)) => {
                        warn!(
                            checkout_key = %key,
                            continuation_intent_id = %continuation.intent_id,
                            "continuation belongs to another payment; ignoring it"
                        );

                        None
                    }
                    Ok(None) => None,
                    Err(error) => {
                        error!(
                            checkout_key = %key,
                            payment_reference = %intent.id,
                            %error,
                            "continuation could not be read; leaving order for a later resume"
                        );

                        return CheckoutOutcome::PaymentCapturedOrderPending {
                            payment_reference: PaymentReference::from(&intent.id),
                        };
                    }
                };

                if continuation.is_none() {
                    warn!(
                        checkout_key = %key,
                        payment_reference = %intent.id,
                        "no continuation for captured payment; creating pending order"
                    );
                }

                let outcome = self.finalize(key, &intent, continuation).await;

                guard.finish(ConfirmationPhase::Succeeded);

                outcome
            }
            IntentStatus::Failed => {
                self.clear_continuation(key).await;
                guard.finish(ConfirmationPhase::Failed);

                CheckoutOutcome::PaymentDeclined {
                    message: decline_message(&intent),
                }
            }
            IntentStatus::Processing => {
                guard.finish(ConfirmationPhase::AwaitingRedirect);

                info!(checkout_key = %key, "payment still processing");

                CheckoutOutcome::InProgress
            }
            IntentStatus::RequiresAction => {
                guard.finish(ConfirmationPhase::Failed);

                CheckoutOutcome::PaymentDeclined {
                    message: "the payment was not completed".to_string(),
                }
            }
        }
    }

    /// Materialize the order for a captured payment, then send the invoice.
    async fn finalize(
        &self,
        key: &CheckoutKey,
        intent: &PaymentIntent,
        continuation: Option<CheckoutContinuation>,
    ) -> CheckoutOutcome {
        let materialized = match &continuation {
            Some(continuation) => self.materializer.materialize(continuation).await,
            None => self.materializer.materialize_degraded(intent).await,
        };

        let materialized = match materialized {
            Ok(materialized) => materialized,
            Err(_) => {
                return CheckoutOutcome::PaymentCapturedOrderPending {
                    payment_reference: PaymentReference::from(&intent.id),
                };
            }
        };

        if continuation.is_some() {
            self.clear_continuation(key).await;
        }

        let order_number = materialized.order.order.number.clone();

        if !materialized.created {
            return CheckoutOutcome::Success { order_number };
        }

        if self.notifier.notify(&materialized.order).await.is_delivered() {
            CheckoutOutcome::Success { order_number }
        } else {
            CheckoutOutcome::SuccessWithNotificationPending { order_number }
        }
    }

    async fn clear_continuation(&self, key: &CheckoutKey) {
        if let Err(error) = self.continuations.clear(key).await {
            warn!(checkout_key = %key, %error, "continuation could not be cleared");
        }
    }

    fn begin(&self, key: &CheckoutKey) -> Option<PhaseGuard<'_>> {
        let mut phases = self.phases();

        if phases.get(key).map(|tracked| tracked.phase) == Some(ConfirmationPhase::Confirming) {
            info!(checkout_key = %key, "confirmation already in progress");

            return None;
        }

        phases.insert(
            key.clone(),
            TrackedPhase {
                phase: ConfirmationPhase::Confirming,
                since: Timestamp::now(),
            },
        );

        Some(PhaseGuard {
            handler: self,
            key: key.clone(),
            finished: false,
        })
    }

    fn phases(&self) -> MutexGuard<'_, FxHashMap<CheckoutKey, TrackedPhase>> {
        self.phases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.phases().len()
    }
}

/// Whether a confirmation that timed out was taken up by the gateway and may still capture.
fn reached_gateway(intent: &PaymentIntent) -> bool {
    match intent.status {
        IntentStatus::Succeeded | IntentStatus::Processing => true,
        IntentStatus::RequiresAction => intent.redirect_url.is_some(),
        IntentStatus::Failed => false,
    }
}

/// Return URL carrying the intent reference, for intents that need action but gave no redirect.
fn return_url_for(return_url: &str, intent: &PaymentIntent) -> String {
    let separator = if return_url.contains('?') { '&' } else { '?' };

    format!(
        "{return_url}{separator}payment_intent={}&payment_intent_client_secret={}",
        intent.id,
        intent.client_secret.as_str()
    )
}

fn decline_message(intent: &PaymentIntent) -> String {
    intent
        .failure_message
        .clone()
        .unwrap_or_else(|| DEFAULT_DECLINE_MESSAGE.to_string())
}
