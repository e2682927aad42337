//! Payment Session Manager
//!
//! One session per checkout key. Opening a new session replaces the old one, so a client secret
//! handed out for a previous total can no longer be confirmed. Sessions nobody comes back for are
//! dropped once older than the maximum age.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    checkout::CheckoutKey,
    payments::{
        errors::{GatewayError, SessionError},
        gateway::PaymentGateway,
        models::{ClientSecret, IntentMetadata, NewIntent, PaymentSession},
    },
};

#[derive(Debug, Clone)]
struct OpenPaymentSession {
    session: PaymentSession,
    opened_at: Timestamp,
}

pub struct PaymentSessionManager {
    gateway: Arc<dyn PaymentGateway>,
    max_age: SignedDuration,
    sessions: Mutex<FxHashMap<CheckoutKey, OpenPaymentSession>>,
}

impl std::fmt::Debug for PaymentSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSessionManager")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl PaymentSessionManager {
    #[must_use]
    pub fn new(gateway: Arc<dyn PaymentGateway>, max_age: SignedDuration) -> Self {
        Self {
            gateway,
            max_age,
            sessions: Mutex::new(FxHashMap::default()),
        }
    }

    /// Open a payment intent for `amount` and make it the current session for `key`.
    ///
    /// Any previous session for `key` is discarded first, including when opening fails.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the intent could not be created.
    #[tracing::instrument(
        name = "payments.sessions.open",
        skip(self, metadata),
        fields(checkout_key = %key, intent_id = tracing::field::Empty),
        err
    )]
    pub async fn open(
        &self,
        key: &CheckoutKey,
        amount: u64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentSession, GatewayError> {
        self.discard(key);

        let intent = self
            .gateway
            .create_intent(NewIntent {
                amount,
                currency: currency.to_string(),
                idempotency_key: format!("{key}-{}", Uuid::now_v7().simple()),
                metadata,
            })
            .await?;

        tracing::Span::current().record("intent_id", tracing::field::display(&intent.id));

        let session = PaymentSession::from(&intent);
        let now = Timestamp::now();

        self.expire(now);
        self.sessions().insert(
            key.clone(),
            OpenPaymentSession {
                session: session.clone(),
                opened_at: now,
            },
        );

        info!(checkout_key = %key, intent_id = %session.intent_id, amount, "opened payment session");

        Ok(session)
    }

    /// The session currently open for `key`.
    pub fn current(&self, key: &CheckoutKey) -> Option<PaymentSession> {
        let now = Timestamp::now();

        self.sessions()
            .get(key)
            .filter(|open| self.is_live(open, now))
            .map(|open| open.session.clone())
    }

    /// Check `secret` belongs to the session currently open for `key`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Missing`]: no session is open for `key`, or it has expired.
    /// - [`SessionError::Stale`]: `secret` belongs to a session that has since been replaced.
    pub fn verify(
        &self,
        key: &CheckoutKey,
        secret: &ClientSecret,
    ) -> Result<PaymentSession, SessionError> {
        let now = Timestamp::now();
        let mut sessions = self.sessions();
        let open = sessions.get(key).ok_or(SessionError::Missing)?;

        if !self.is_live(open, now) {
            info!(checkout_key = %key, "payment session expired");
            sessions.remove(key);

            return Err(SessionError::Missing);
        }

        if open.session.client_secret != *secret {
            return Err(SessionError::Stale);
        }

        Ok(open.session.clone())
    }

    /// Forget the session for `key`.
    pub fn discard(&self, key: &CheckoutKey) -> Option<PaymentSession> {
        self.sessions().remove(key).map(|open| open.session)
    }

    /// Drop sessions older than the maximum age at `now`.
    pub fn expire(&self, now: Timestamp) {
        self.sessions().retain(|_, open| self.is_live(open, now));
    }

    fn is_live(&self, open: &OpenPaymentSession, now: Timestamp) -> bool {
        now.duration_since(open.opened_at) <= self.max_age
    }

    fn sessions(&self) -> MutexGuard<'_, FxHashMap<CheckoutKey, OpenPaymentSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
