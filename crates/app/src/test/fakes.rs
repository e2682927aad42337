//! In-memory collaborators for checkout scenario tests.
//!
//! Unlike the generated mocks these keep state between calls, so a whole checkout can run
//! against them and the result can be inspected afterwards.

use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::{
    domain::{
        checkout::CheckoutKey,
        continuations::{ContinuationStore, ContinuationStoreError, models::CheckoutContinuation},
        coupons::{
            CouponsService, CouponsServiceError,
            models::{Coupon, NewCoupon},
        },
        notifications::{InvoiceEmail, Mailer, MailerError},
        orders::{
            OrdersService, OrdersServiceError,
            models::{
                FulfillmentException, FulfillmentExceptionKind, FulfillmentExceptionUuid,
                Materialized, NewOrder, OrderNumber, OrderUuid, PaymentReference, PlacedOrder,
                StockOutcome,
            },
        },
        payments::{
            GatewayError, PaymentGateway,
            models::{ClientSecret, Confirmation, IntentId, IntentStatus, NewIntent, PaymentIntent},
        },
        products::models::{ProductUuid, StockDecrement},
    },
    test::fixtures,
};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A payment gateway that captures immediately unless told otherwise.
#[derive(Debug)]
pub(crate) struct FakeGateway {
    intents: Mutex<FxHashMap<IntentId, PaymentIntent>>,

    /// Status an intent moves to when confirmed
    on_confirm: Mutex<Result<IntentStatus, GatewayError>>,
    created: AtomicUsize,
    confirmed: AtomicUsize,
    retrieved: AtomicUsize,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self {
            intents: Mutex::new(FxHashMap::default()),
            on_confirm: Mutex::new(Ok(IntentStatus::Succeeded)),
            created: AtomicUsize::new(0),
            confirmed: AtomicUsize::new(0),
            retrieved: AtomicUsize::new(0),
        }
    }

    /// Confirmed intents move to `status`.
    pub(crate) fn confirm_with(&self, status: IntentStatus) {
        *locked(&self.on_confirm) = Ok(status);
    }

    /// Confirmations fail with `error` and leave the intent untouched.
    pub(crate) fn fail_confirm_with(&self, error: GatewayError) {
        *locked(&self.on_confirm) = Err(error);
    }

    /// The customer completed authentication at the gateway.
    pub(crate) fn authenticate(&self, id: &IntentId) {
        if let Some(intent) = locked(&self.intents).get_mut(id) {
            intent.status = IntentStatus::Succeeded;
            intent.redirect_url = None;
        }
    }

    pub(crate) fn intent(&self, id: &IntentId) -> Option<PaymentIntent> {
        locked(&self.intents).get(id).cloned()
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn confirmed(&self) -> usize {
        self.confirmed.load(Ordering::SeqCst)
    }

    pub(crate) fn retrieved(&self) -> usize {
        self.retrieved.load(Ordering::SeqCst)
    }

    fn find(&self, secret: &ClientSecret) -> Result<PaymentIntent, GatewayError> {
        let intents = locked(&self.intents);

        secret
            .intent_id()
            .and_then(|id| intents.get(&id))
            .filter(|intent| intent.client_secret == *secret)
            .cloned()
            .ok_or_else(|| GatewayError::UnexpectedResponse("no such payment intent".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, intent: NewIntent) -> Result<PaymentIntent, GatewayError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_fake{n}");

        let created = PaymentIntent {
            id: IntentId::new(id.clone()),
            client_secret: ClientSecret::new(format!("{id}_secret_fake")),
            amount: intent.amount,
            currency: intent.currency,
            status: IntentStatus::RequiresAction,
            metadata: intent.metadata,
            redirect_url: None,
            failure_message: None,
        };

        locked(&self.intents).insert(created.id.clone(), created.clone());

        Ok(created)
    }

    async fn confirm_intent(
        &self,
        secret: &ClientSecret,
        _confirmation: Confirmation,
    ) -> Result<PaymentIntent, GatewayError> {
        self.confirmed.fetch_add(1, Ordering::SeqCst);

        let status = locked(&self.on_confirm).clone()?;
        let mut intent = self.find(secret)?;

        intent.status = status;

        match status {
            IntentStatus::RequiresAction => {
                intent.redirect_url = Some(format!("https://gateway.example/3ds/{}", intent.id));
            }
            IntentStatus::Failed => {
                intent.failure_message = Some("Your card was declined.".to_string());
            }
            IntentStatus::Processing | IntentStatus::Succeeded => {}
        }

        locked(&self.intents).insert(intent.id.clone(), intent.clone());

        Ok(intent)
    }

    async fn retrieve_intent(&self, secret: &ClientSecret) -> Result<PaymentIntent, GatewayError> {
        self.retrieved.fetch_add(1, Ordering::SeqCst);

        self.find(secret)
    }
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryContinuations {
    saved: Mutex<FxHashMap<CheckoutKey, CheckoutContinuation>>,
}

impl InMemoryContinuations {
    pub(crate) fn get(&self, key: &CheckoutKey) -> Option<CheckoutContinuation> {
        locked(&self.saved).get(key).cloned()
    }

    /// Simulate the continuation being lost, e.g. expired or on another host.
    pub(crate) fn lose(&self, key: &CheckoutKey) {
        locked(&self.saved).remove(key);
    }
}

#[async_trait]
impl ContinuationStore for InMemoryContinuations {
    async fn save(&self, continuation: &CheckoutContinuation) -> Result<(), ContinuationStoreError> {
        locked(&self.saved).insert(continuation.key.clone(), continuation.clone());

        Ok(())
    }

    async fn load(
        &self,
        key: &CheckoutKey,
    ) -> Result<Option<CheckoutContinuation>, ContinuationStoreError> {
        Ok(self.get(key))
    }

    async fn clear(&self, key: &CheckoutKey) -> Result<(), ContinuationStoreError> {
        self.lose(key);

        Ok(())
    }
}

#[derive(Debug, Default)]
struct OrdersState {
    orders: Vec<PlacedOrder>,
    stock: FxHashMap<ProductUuid, u32>,
    exceptions: Vec<FulfillmentException>,
}

/// Orders kept in memory, unique per payment reference, with a stock level per product.
#[derive(Debug, Default)]
pub(crate) struct InMemoryOrders {
    state: Mutex<OrdersState>,
}

impl InMemoryOrders {
    pub(crate) fn stock(&self, product: ProductUuid, quantity: u32) {
        locked(&self.state).stock.insert(product, quantity);
    }

    pub(crate) fn stock_of(&self, product: ProductUuid) -> Option<u32> {
        locked(&self.state).stock.get(&product).copied()
    }

    pub(crate) fn orders(&self) -> Vec<PlacedOrder> {
        locked(&self.state).orders.clone()
    }
}

#[async_trait]
impl OrdersService for InMemoryOrders {
    async fn create_order(&self, order: NewOrder) -> Result<Materialized, OrdersServiceError> {
        let mut state = locked(&self.state);

        if let Some(existing) = state
            .orders
            .iter()
            .find(|placed| placed.order.payment_reference == order.payment_reference)
        {
            return Ok(Materialized {
                order: existing.clone(),
                created: false,
                stock: Vec::new(),
            });
        }

        let placed = fixtures::placed_from(&order);
        let mut stock = Vec::with_capacity(order.lines.len());

        for line in &order.lines {
            let result = match state.stock.get_mut(&line.product) {
                Some(level) if *level >= line.quantity => {
                    *level -= line.quantity;

                    StockDecrement::Decremented { remaining: *level }
                }
                Some(level) => StockDecrement::Insufficient { available: *level },
                None => StockDecrement::UnknownProduct,
            };

            let exception = match result {
                StockDecrement::Decremented { .. } => None,
                StockDecrement::Insufficient { available } => {
                    Some((FulfillmentExceptionKind::InsufficientStock, Some(available)))
                }
                StockDecrement::UnknownProduct => {
                    Some((FulfillmentExceptionKind::UnknownProduct, None))
                }
            };

            if let Some((kind, available)) = exception {
                state.exceptions.push(FulfillmentException {
                    uuid: FulfillmentExceptionUuid::new(),
                    order_uuid: placed.order.uuid,
                    product: line.product,
                    kind,
                    requested: line.quantity,
                    available,
                    created_at: Timestamp::now(),
                });
            }

            stock.push(StockOutcome {
                product: line.product,
                requested: line.quantity,
                result,
            });
        }

        state.orders.push(placed.clone());

        Ok(Materialized {
            order: placed,
            created: true,
            stock,
        })
    }

    async fn find_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<PlacedOrder>, OrdersServiceError> {
        Ok(locked(&self.state)
            .orders
            .iter()
            .find(|placed| placed.order.payment_reference == *reference)
            .cloned())
    }

    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<PlacedOrder>, OrdersServiceError> {
        Ok(locked(&self.state)
            .orders
            .iter()
            .find(|placed| placed.order.number == *number)
            .cloned())
    }

    async fn list_fulfillment_exceptions(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<FulfillmentException>, OrdersServiceError> {
        Ok(locked(&self.state)
            .exceptions
            .iter()
            .filter(|exception| exception.order_uuid == order)
            .cloned()
            .collect())
    }
}

/// Records every email it is asked to send. Can be switched to refuse them.
#[derive(Debug, Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<InvoiceEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub(crate) fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<InvoiceEmail> {
        locked(&self.sent).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_invoice_email(&self, email: InvoiceEmail) -> Result<(), MailerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailerError::Transport("connection refused".to_string()));
        }

        locked(&self.sent).push(email);

        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryCoupons {
    coupons: Mutex<Vec<Coupon>>,
}

#[async_trait]
impl CouponsService for InMemoryCoupons {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, CouponsServiceError> {
        Ok(locked(&self.coupons)
            .iter()
            .find(|coupon| coupon.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponsServiceError> {
        let mut coupons = locked(&self.coupons);

        if coupons
            .iter()
            .any(|existing| existing.code.eq_ignore_ascii_case(&coupon.code))
        {
            return Err(CouponsServiceError::AlreadyExists);
        }

        let now = Timestamp::now();

        let created = Coupon {
            uuid: coupon.uuid,
            code: coupon.code,
            percent_off: coupon.percent_off,
            amount_off: coupon.amount_off,
            active: coupon.active,
            created_at: now,
            updated_at: now,
        };

        coupons.push(created.clone());

        Ok(created)
    }
}
