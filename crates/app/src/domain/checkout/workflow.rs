//! Checkout workflow
//!
//! Composes pricing, coupons, payment sessions, confirmation and fulfillment into the steps the
//! checkout UI calls.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jiff::{SignedDuration, Timestamp};
use rusty_money::iso::Currency;
use rustc_hash::FxHashMap;
use storefront::pricing::{PriceBreakdown, TaxRate, price_items};
use tracing::{info, warn};

use crate::domain::{
    addresses::{Address, AddressValidator},
    carts::Cart,
    checkout::{
        CheckoutKey,
        confirmation::{PaymentConfirmationHandler, ReturnReference},
        coupons::{CouponRejection, CouponResolver},
        materializer::OrderMaterializer,
        outcomes::{CheckoutOutcome, ValidationError},
    },
    continuations::{ContinuationStore, ContinuationStoreError, models::CheckoutContinuation},
    coupons::CouponsService,
    notifications::{FulfillmentNotifier, Mailer},
    orders::OrdersService,
    payments::{
        PaymentGateway, PaymentSessionManager, SessionError,
        models::{ClientSecret, Confirmation, IntentId, IntentMetadata},
    },
};

/// Currency and tax applied to every checkout.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutSettings {
    pub currency: &'static Currency,
    pub tax_rate: TaxRate,

    /// How long an unconfirmed session, or a checkout awaiting the customer's return, is kept
    pub session_max_age: SignedDuration,
}

/// Collaborators the workflow drives.
#[derive(Clone)]
pub struct CheckoutServices {
    pub coupons: Arc<dyn CouponsService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub continuations: Arc<dyn ContinuationStore>,
    pub orders: Arc<dyn OrdersService>,
    pub mailer: Arc<dyn Mailer>,
}

/// A priced cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub breakdown: PriceBreakdown<'static>,

    /// Code of the coupon applied to `breakdown`
    pub coupon: Option<String>,

    /// Set when a coupon was given but could not be applied
    pub rejection: Option<(String, CouponRejection)>,
}

/// Details collected before a payment session can be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    pub customer_name: String,
    pub address: Address,
    pub cart: Cart,
    pub coupon_code: Option<String>,
}

/// A payment session ready for the client to confirm.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedSession {
    pub intent_id: IntentId,
    pub client_secret: ClientSecret,
    pub breakdown: PriceBreakdown<'static>,
    pub coupon: Option<String>,
}

/// Checkout context held between opening a session and confirming it.
#[derive(Debug, Clone)]
struct PendingCheckout {
    customer_name: String,
    address: Address,
    cart: Cart,
    coupon_code: Option<String>,
    opened_at: Timestamp,
}

pub struct CheckoutWorkflow {
    settings: CheckoutSettings,
    validator: AddressValidator,
    coupons: CouponResolver,
    sessions: PaymentSessionManager,
    confirmation: PaymentConfirmationHandler,
    continuations: Arc<dyn ContinuationStore>,
    pending: Mutex<FxHashMap<CheckoutKey, PendingCheckout>>,
}

impl std::fmt::Debug for CheckoutWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutWorkflow")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CheckoutWorkflow {
    /// # Errors
    ///
    /// Returns an error if the address patterns fail to compile.
    pub fn new(
        settings: CheckoutSettings,
        services: CheckoutServices,
    ) -> Result<Self, regex::Error> {
        let materializer = OrderMaterializer::new(services.orders, settings.tax_rate);
        let notifier = FulfillmentNotifier::new(services.mailer);

        Ok(Self {
            settings,
            validator: AddressValidator::new()?,
            coupons: CouponResolver::new(services.coupons),
            sessions: PaymentSessionManager::new(
                Arc::clone(&services.gateway),
                settings.session_max_age,
            ),
            confirmation: PaymentConfirmationHandler::new(
                services.gateway,
                Arc::clone(&services.continuations),
                materializer,
                notifier,
                settings.session_max_age,
            ),
            continuations: services.continuations,
            pending: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Price `cart`, applying `coupon_code` if it resolves.
    ///
    /// A rejected coupon does not fail the quote; the cart is priced without it and the
    /// rejection is reported alongside.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutOutcome::ValidationError`] if the cart is invalid or cannot be priced.
    #[tracing::instrument(name = "checkout.workflow.quote", skip(self, cart), err(Debug))]
    pub async fn quote(
        &self,
        cart: &Cart,
        coupon_code: Option<&str>,
    ) -> Result<Quote, CheckoutOutcome> {
        cart.validate().map_err(ValidationError::from)?;

        let items = cart
            .line_items(self.settings.currency)
            .map_err(ValidationError::from)?;

        let (terms, rejection) = match coupon_code {
            Some(code) => match self.coupons.resolve(code).await {
                Ok(terms) => (Some(terms), None),
                Err(reason) => (None, Some((code.to_string(), reason))),
            },
            None => (None, None),
        };

        let discount = terms
            .as_ref()
            .map(|terms| terms.discount(self.settings.currency));

        let breakdown = price_items(&items, discount.as_ref(), &self.settings.tax_rate)
            .map_err(|error| ValidationError::Pricing(error.to_string()))?;

        Ok(Quote {
            breakdown,
            coupon: terms.map(|terms| terms.code),
            rejection,
        })
    }

    /// Validate the address, price the cart and open a payment session for the final total.
    ///
    /// Any session previously opened for `key` is discarded first, so it can no longer be
    /// confirmed against an old total.
    ///
    /// # Errors
    ///
    /// Returns the outcome to report when no session could be opened. Nothing is persisted.
    #[tracing::instrument(
        name = "checkout.workflow.open_session",
        skip(self, request),
        fields(checkout_key = %key),
        err(Debug)
    )]
    pub async fn open_session(
        &self,
        key: &CheckoutKey,
        request: OpenSession,
    ) -> Result<OpenedSession, CheckoutOutcome> {
        self.expire(Timestamp::now());

        self.sessions.discard(key);
        self.pending().remove(key);
        self.confirmation.reset(key);

        self.validator
            .validate(&request.address)
            .map_err(ValidationError::from)?;

        let quote = self
            .quote(&request.cart, request.coupon_code.as_deref())
            .await?;

        if let Some((code, reason)) = quote.rejection {
            return Err(CheckoutOutcome::CouponRejected { code, reason });
        }

        if !quote.breakdown.is_chargeable() {
            return Err(ValidationError::NothingToCharge.into());
        }

        let amount = u64::try_from(quote.breakdown.final_total.to_minor_units())
            .map_err(|error| ValidationError::Pricing(error.to_string()))?;

        let metadata = IntentMetadata {
            checkout_key: key.to_string(),
            customer_name: request.customer_name.clone(),
            customer_email: request.address.email.clone(),
        };

        let session = self
            .sessions
            .open(key, amount, self.settings.currency.iso_alpha_code, metadata)
            .await
            .map_err(|error| {
                warn!(checkout_key = %key, %error, "payment session could not be opened");

                CheckoutOutcome::GatewayUnavailable
            })?;

        self.pending().insert(
            key.clone(),
            PendingCheckout {
                customer_name: request.customer_name,
                address: request.address,
                cart: request.cart,
                coupon_code: quote.coupon.clone(),
                opened_at: Timestamp::now(),
            },
        );

        Ok(OpenedSession {
            intent_id: session.intent_id,
            client_secret: session.client_secret,
            breakdown: quote.breakdown,
            coupon: quote.coupon,
        })
    }

    /// Confirm the payment session for `key`.
    ///
    /// `secret` must belong to the session currently open for `key`.
    #[tracing::instrument(
        name = "checkout.workflow.confirm",
        skip(self, secret, return_url, payment_method),
        fields(checkout_key = %key)
    )]
    pub async fn confirm(
        &self,
        key: &CheckoutKey,
        secret: &ClientSecret,
        return_url: String,
        payment_method: Option<String>,
    ) -> CheckoutOutcome {
        let session = match self.sessions.verify(key, secret) {
            Ok(session) => session,
            Err(SessionError::Missing | SessionError::Stale) => {
                return CheckoutOutcome::StaleSession;
            }
        };

        let pending = self.pending().get(key).cloned();

        let Some(pending) = pending else {
            return CheckoutOutcome::StaleSession;
        };

        let continuation = CheckoutContinuation {
            key: key.clone(),
            intent_id: session.intent_id.clone(),
            customer_name: pending.customer_name,
            address: pending.address,
            cart: pending.cart,
            coupon_code: pending.coupon_code,
            total: session.amount,
            currency: session.currency.clone(),
            created_at: Timestamp::now(),
        };

        let outcome = self
            .confirmation
            .confirm(
                key,
                &session,
                continuation,
                Confirmation {
                    return_url,
                    payment_method,
                },
            )
            .await;

        self.settle(key, &outcome);

        outcome
    }

    /// Check a page load for a returning gateway reference and finish the checkout.
    #[tracing::instrument(
        name = "checkout.workflow.resume",
        skip(self, reference),
        fields(checkout_key = %key)
    )]
    pub async fn resume(&self, key: &CheckoutKey, reference: &ReturnReference) -> CheckoutOutcome {
        let outcome = self.confirmation.resume(key, reference).await;

        self.settle(key, &outcome);

        outcome
    }

    /// Abandon the checkout for `key`: its continuation, session and pending context are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the continuation could not be removed.
    #[tracing::instrument(
        name = "checkout.workflow.abandon",
        skip(self),
        fields(checkout_key = %key),
        err
    )]
    pub async fn abandon(&self, key: &CheckoutKey) -> Result<(), ContinuationStoreError> {
        self.sessions.discard(key);
        self.pending().remove(key);
        self.confirmation.reset(key);

        self.continuations.clear(key).await?;

        info!(checkout_key = %key, "checkout abandoned");

        Ok(())
    }

    /// Forget sessions, pending context and redirect phases older than the session maximum age
    /// at `now`. Checkouts the customer walked away from are removed this way.
    pub fn expire(&self, now: Timestamp) {
        let max_age = self.settings.session_max_age;

        self.sessions.expire(now);
        self.confirmation.expire(now);
        self.pending()
            .retain(|_, pending| now.duration_since(pending.opened_at) <= max_age);
    }

    /// Once payment is captured the session and pending context are spent.
    fn settle(&self, key: &CheckoutKey, outcome: &CheckoutOutcome) {
        if outcome.is_captured() {
            self.sessions.discard(key);
            self.pending().remove(key);
        }
    }

    fn pending(&self) -> MutexGuard<'_, FxHashMap<CheckoutKey, PendingCheckout>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
