//! Orders service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            models::{
                FulfillmentException, FulfillmentExceptionKind, Materialized, NewOrder, Order,
                OrderNumber, OrderUuid, PaymentReference, PlacedOrder, StockOutcome,
            },
            repository::PgOrdersRepository,
        },
        products::{PgProductsRepository, models::StockDecrement},
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
    products: PgProductsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
            products: PgProductsRepository::new(),
        }
    }

    async fn load_placed(
        &self,
        order: Option<Order>,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<PlacedOrder>, OrdersServiceError> {
        let Some(order) = order else {
            return Ok(None);
        };

        let lines = self.repository.list_order_items(tx, order.uuid).await?;

        Ok(Some(PlacedOrder { order, lines }))
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            payment_reference = %order.payment_reference,
            order_number = tracing::field::Empty,
            created = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<Materialized, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let uuid = OrderUuid::new();
        let number = OrderNumber::generate(Timestamp::now());

        let Some(created) = self
            .repository
            .insert_order(&mut tx, uuid, &number, &order)
            .await?
        else {
            tx.rollback().await?;

            let existing = self
                .find_by_payment_reference(&order.payment_reference)
                .await?
                .ok_or(OrdersServiceError::NotFound)?;

            Span::current()
                .record("order_number", existing.order.number.as_str())
                .record("created", false);

            info!(
                order_number = %existing.order.number,
                payment_reference = %order.payment_reference,
                "order already exists for payment"
            );

            return Ok(Materialized {
                order: existing,
                created: false,
                stock: Vec::new(),
            });
        };

        let mut lines = Vec::with_capacity(order.lines.len());
        let mut stock = Vec::with_capacity(order.lines.len());

        for (position, line) in order.lines.iter().enumerate() {
            lines.push(
                self.repository
                    .insert_order_item(&mut tx, created.uuid, position, line)
                    .await?,
            );

            let result = self
                .products
                .decrement_stock(&mut tx, line.product, line.quantity)
                .await?;

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
                warn!(
                    order_number = %created.number,
                    product_uuid = %line.product,
                    requested = line.quantity,
                    ?available,
                    kind = kind.as_str(),
                    "order line could not be fulfilled from stock"
                );

                self.repository
                    .insert_fulfillment_exception(
                        &mut tx,
                        created.uuid,
                        line.product,
                        kind,
                        line.quantity,
                        available,
                    )
                    .await?;
            }

            stock.push(StockOutcome {
                product: line.product,
                requested: line.quantity,
                result,
            });
        }

        tx.commit().await?;

        Span::current()
            .record("order_number", created.number.as_str())
            .record("created", true);

        info!(
            order_number = %created.number,
            status = created.status.as_str(),
            total = created.total,
            lines = lines.len(),
            "created order"
        );

        Ok(Materialized {
            order: PlacedOrder {
                order: created,
                lines,
            },
            created: true,
            stock,
        })
    }

    async fn find_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<PlacedOrder>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self
            .repository
            .find_order_by_payment_reference(&mut tx, reference)
            .await?;

        let placed = self.load_placed(order, &mut tx).await?;

        tx.commit().await?;

        Ok(placed)
    }

    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<PlacedOrder>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self.repository.find_order_by_number(&mut tx, number).await?;
        let placed = self.load_placed(order, &mut tx).await?;

        tx.commit().await?;

        Ok(placed)
    }

    async fn list_fulfillment_exceptions(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<FulfillmentException>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let exceptions = self
            .repository
            .list_fulfillment_exceptions(&mut tx, order)
            .await?;

        tx.commit().await?;

        Ok(exceptions)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Create an order with its lines and take stock for each line, all in one transaction.
    ///
    /// At most one order exists per payment reference: when one already does, it is returned
    /// with `created` set to `false` and nothing else is written. Lines that cannot be fulfilled
    /// from stock are recorded as fulfillment exceptions rather than failing the order.
    async fn create_order(&self, order: NewOrder) -> Result<Materialized, OrdersServiceError>;

    async fn find_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<PlacedOrder>, OrdersServiceError>;

    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<PlacedOrder>, OrdersServiceError>;

    /// Oversold or unknown-product lines awaiting staff review.
    async fn list_fulfillment_exceptions(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<FulfillmentException>, OrdersServiceError>;
}
