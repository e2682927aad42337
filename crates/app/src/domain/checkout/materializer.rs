//! Order Materializer
//!
//! Converts a confirmed payment into an order. Safe to run more than once for the same payment:
//! the payment reference is unique at the datastore, so a repeat returns the existing order.

use std::sync::Arc;

use rusty_money::{
    Money,
    iso::{self, Currency},
};
use storefront::pricing::{PricingError, TaxRate, tax_inclusive};
use thiserror::Error;
use tracing::{error, info};

use crate::domain::{
    carts::{Cart, CartError},
    continuations::models::CheckoutContinuation,
    orders::{
        OrdersService, OrdersServiceError,
        models::{Materialized, NewOrder, NewOrderLine, OrderStatus, PaymentReference},
    },
    payments::models::PaymentIntent,
};

/// Payment was captured but no order could be written.
#[derive(Debug, Error)]
pub enum MaterializationError {
    #[error("unknown currency {0}")]
    UnknownCurrency(String),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("line price could not be calculated")]
    Pricing(#[from] PricingError),

    #[error("order could not be written")]
    Orders(#[from] OrdersServiceError),
}

#[derive(Clone)]
pub struct OrderMaterializer {
    orders: Arc<dyn OrdersService>,
    tax_rate: TaxRate,
}

impl std::fmt::Debug for OrderMaterializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderMaterializer")
            .field("tax_rate", &self.tax_rate)
            .finish_non_exhaustive()
    }
}

impl OrderMaterializer {
    pub fn new(orders: Arc<dyn OrdersService>, tax_rate: TaxRate) -> Self {
        Self { orders, tax_rate }
    }

    /// Create the order described by `continuation`, paid with the intent it was written for.
    ///
    /// Each line records the tax-inclusive unit price charged.
    ///
    /// # Errors
    ///
    /// Returns a [`MaterializationError`] when the order could not be written. The failure is
    /// logged with the payment reference, cart and address for reconciliation.
    #[tracing::instrument(
        name = "checkout.materializer.materialize",
        skip(self, continuation),
        fields(checkout_key = %continuation.key, payment_reference = %continuation.intent_id),
        err
    )]
    pub async fn materialize(
        &self,
        continuation: &CheckoutContinuation,
    ) -> Result<Materialized, MaterializationError> {
        let reference = PaymentReference::from(&continuation.intent_id);

        let created = async {
            let lines = self.order_lines(&continuation.cart, &continuation.currency)?;

            let order = NewOrder {
                payment_reference: reference.clone(),
                customer_name: continuation.customer_name.clone(),
                customer_email: Some(continuation.address.email.clone()),
                shipping_address: Some(continuation.address.clone()),
                total: continuation.total,
                currency: continuation.currency.clone(),
                status: OrderStatus::Paid,
                lines,
            };

            Ok::<_, MaterializationError>(self.orders.create_order(order).await?)
        }
        .await;

        match created {
            Ok(materialized) => {
                log_materialized(&materialized);

                Ok(materialized)
            }
            Err(err) => {
                error!(
                    payment_reference = %reference,
                    cart = %serde_json::to_string(&continuation.cart).unwrap_or_default(),
                    address = %serde_json::to_string(&continuation.address).unwrap_or_default(),
                    total = continuation.total,
                    currency = %continuation.currency,
                    error = %err,
                    "payment captured but order could not be created"
                );

                Err(err)
            }
        }
    }

    /// Create an order from the payment alone, when the checkout context was lost.
    ///
    /// The order has no lines and is left `Pending` for staff to complete from the gateway
    /// record. Customer details come from the intent metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`MaterializationError`] when the order could not be written.
    #[tracing::instrument(
        name = "checkout.materializer.materialize_degraded",
        skip(self, intent),
        fields(payment_reference = %intent.id),
        err
    )]
    pub async fn materialize_degraded(
        &self,
        intent: &PaymentIntent,
    ) -> Result<Materialized, MaterializationError> {
        let reference = PaymentReference::from(&intent.id);
        let email = Some(intent.metadata.customer_email.clone()).filter(|e| !e.is_empty());

        let order = NewOrder {
            payment_reference: reference.clone(),
            customer_name: intent.metadata.customer_name.clone(),
            customer_email: email,
            shipping_address: None,
            total: intent.amount,
            currency: intent.currency.clone(),
            status: OrderStatus::Pending,
            lines: Vec::new(),
        };

        match self.orders.create_order(order).await {
            Ok(materialized) => {
                log_materialized(&materialized);

                Ok(materialized)
            }
            Err(err) => {
                error!(
                    payment_reference = %reference,
                    checkout_key = %intent.metadata.checkout_key,
                    total = intent.amount,
                    currency = %intent.currency,
                    error = %err,
                    "payment captured but degraded order could not be created"
                );

                Err(err.into())
            }
        }
    }

    fn order_lines(
        &self,
        cart: &Cart,
        currency: &str,
    ) -> Result<Vec<NewOrderLine>, MaterializationError> {
        let currency: &'static Currency = iso::find(currency)
            .ok_or_else(|| MaterializationError::UnknownCurrency(currency.to_string()))?;

        cart.lines
            .iter()
            .map(|line| -> Result<NewOrderLine, MaterializationError> {
                let out_of_range = || CartError::PriceOutOfRange {
                    product: line.product,
                };

                let unit = Money::from_minor(
                    i64::try_from(line.unit_price).map_err(|_err| out_of_range())?,
                    currency,
                );

                let gross = tax_inclusive(&unit, &self.tax_rate)?;

                let price_at_purchase =
                    u64::try_from(gross.to_minor_units()).map_err(|_err| out_of_range())?;

                Ok(NewOrderLine {
                    product: line.product,
                    name: line.name.clone(),
                    quantity: line.quantity,
                    price_at_purchase,
                    variant: line.variant.clone(),
                })
            })
            .collect()
    }
}

fn log_materialized(materialized: &Materialized) {
    let oversold = materialized.oversold().count();

    info!(
        order_number = %materialized.order.order.number,
        created = materialized.created,
        oversold,
        "materialized order"
    );
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use mockall::predicate::function;
    use testresult::TestResult;

    use crate::{
        domain::{
            orders::MockOrdersService,
            payments::models::{ClientSecret, IntentId, IntentMetadata, IntentStatus},
        },
        test::fixtures,
    };

    use super::*;

    fn echo_created(order: NewOrder) -> Result<Materialized, OrdersServiceError> {
        Ok(Materialized {
            order: fixtures::placed_from(&order),
            created: true,
            stock: Vec::new(),
        })
    }

    #[tokio::test]
    async fn materialize_records_tax_inclusive_line_prices() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .with(function(|order: &NewOrder| {
                order.status == OrderStatus::Paid
                    && order.total == 60_00
                    && order.payment_reference.as_str() == "pi_1"
                    && order.lines.len() == 1
                    && order.lines[0].price_at_purchase == 30_00
                    && order.lines[0].quantity == 2
            }))
            .times(1)
            .returning(echo_created);

        let materializer = OrderMaterializer::new(Arc::new(orders), TaxRate::default());

        let materialized = materializer
            .materialize(&fixtures::continuation("chk_1", "pi_1"))
            .await?;

        assert!(materialized.created, "order should be created");

        Ok(())
    }

    #[tokio::test]
    async fn materialize_degraded_uses_intent_details() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .with(function(|order: &NewOrder| {
                order.status == OrderStatus::Pending
                    && order.lines.is_empty()
                    && order.total == 60_00
                    && order.customer_email.as_deref() == Some("ada@example.com")
                    && order.shipping_address.is_none()
            }))
            .times(1)
            .returning(echo_created);

        let materializer = OrderMaterializer::new(Arc::new(orders), TaxRate::default());

        let intent = PaymentIntent {
            id: IntentId::new("pi_1"),
            client_secret: ClientSecret::new("pi_1_secret_x"),
            amount: 60_00,
            currency: "GBP".to_string(),
            status: IntentStatus::Succeeded,
            metadata: IntentMetadata {
                checkout_key: "chk_1".to_string(),
                customer_name: "Ada Lovelace".to_string(),
                customer_email: "ada@example.com".to_string(),
            },
            redirect_url: None,
            failure_message: None,
        };

        let materialized = materializer.materialize_degraded(&intent).await?;

        assert_eq!(materialized.order.order.status, OrderStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn materialize_failure_is_reported() {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .times(1)
            .returning(|_| Err(OrdersServiceError::InvalidData));

        let materializer = OrderMaterializer::new(Arc::new(orders), TaxRate::default());

        let result = materializer
            .materialize(&fixtures::continuation("chk_1", "pi_1"))
            .await;

        assert!(
            matches!(
                result,
                Err(MaterializationError::Orders(OrdersServiceError::InvalidData))
            ),
            "expected orders error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn materialize_unknown_currency_never_writes() {
        let mut orders = MockOrdersService::new();

        orders.expect_create_order().never();

        let materializer = OrderMaterializer::new(Arc::new(orders), TaxRate::default());

        let mut continuation = fixtures::continuation("chk_1", "pi_1");
        continuation.currency = "ZZZ".to_string();
        continuation.created_at = Timestamp::now();

        let result = materializer.materialize(&continuation).await;

        assert!(
            matches!(result, Err(MaterializationError::UnknownCurrency(_))),
            "expected UnknownCurrency, got {result:?}"
        );
    }
}
