//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::domain::{
    addresses::Address,
    orders::models::{
        FulfillmentException, FulfillmentExceptionKind, FulfillmentExceptionUuid, NewOrder,
        NewOrderLine, Order, OrderLineItem, OrderLineItemUuid, OrderNumber, OrderUuid,
        PaymentReference,
    },
    products::models::ProductUuid,
};

const INSERT_ORDER_SQL: &str = include_str!("sql/insert_order.sql");
const INSERT_ORDER_ITEM_SQL: &str = include_str!("sql/insert_order_item.sql");
const INSERT_FULFILLMENT_EXCEPTION_SQL: &str = include_str!("sql/insert_fulfillment_exception.sql");
const FIND_ORDER_BY_PAYMENT_REFERENCE_SQL: &str =
    include_str!("sql/find_order_by_payment_reference.sql");
const FIND_ORDER_BY_NUMBER_SQL: &str = include_str!("sql/find_order_by_number.sql");
const LIST_ORDER_ITEMS_SQL: &str = include_str!("sql/list_order_items.sql");
const LIST_FULFILLMENT_EXCEPTIONS_SQL: &str = include_str!("sql/list_fulfillment_exceptions.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert the order row. Returns `None` when an order already exists for the payment
    /// reference; the caller must not insert lines in that case.
    pub(crate) async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OrderUuid,
        number: &OrderNumber,
        order: &NewOrder,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(INSERT_ORDER_SQL)
            .bind(uuid.into_uuid())
            .bind(number.as_str())
            .bind(order.payment_reference.as_str())
            .bind(&order.customer_name)
            .bind(order.customer_email.as_deref())
            .bind(order.shipping_address.as_ref().map(Json))
            .bind(to_i64(order.total, "total")?)
            .bind(&order.currency)
            .bind(order.status.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn insert_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        position: usize,
        line: &NewOrderLine,
    ) -> Result<OrderLineItem, sqlx::Error> {
        let position = i32::try_from(position).map_err(|e| sqlx::Error::ColumnDecode {
            index: "position".to_string(),
            source: Box::new(e),
        })?;

        query_as::<Postgres, OrderLineItem>(INSERT_ORDER_ITEM_SQL)
            .bind(OrderLineItemUuid::new().into_uuid())
            .bind(order.into_uuid())
            .bind(position)
            .bind(line.product.into_uuid())
            .bind(&line.name)
            .bind(to_i32(line.quantity, "quantity")?)
            .bind(to_i64(line.price_at_purchase, "price_at_purchase")?)
            .bind(line.variant.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn insert_fulfillment_exception(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        product: ProductUuid,
        kind: FulfillmentExceptionKind,
        requested: u32,
        available: Option<u32>,
    ) -> Result<(), sqlx::Error> {
        let available = available
            .map(|available| to_i32(available, "available"))
            .transpose()?;

        query(INSERT_FULFILLMENT_EXCEPTION_SQL)
            .bind(FulfillmentExceptionUuid::new().into_uuid())
            .bind(order.into_uuid())
            .bind(product.into_uuid())
            .bind(kind.as_str())
            .bind(to_i32(requested, "requested")?)
            .bind(available)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn find_order_by_payment_reference(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(FIND_ORDER_BY_PAYMENT_REFERENCE_SQL)
            .bind(reference.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_order_by_number(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        number: &OrderNumber,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(FIND_ORDER_BY_NUMBER_SQL)
            .bind(number.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderLineItem>, sqlx::Error> {
        query_as::<Postgres, OrderLineItem>(LIST_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_fulfillment_exceptions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<FulfillmentException>, sqlx::Error> {
        query_as::<Postgres, FulfillmentException>(LIST_FULFILLMENT_EXCEPTIONS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

fn to_i64(value: u64, column: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn to_i32(value: u32, column: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_get_u64(row: &PgRow, column: &str) -> Result<u64, sqlx::Error> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_get_u32(row: &PgRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i32 = row.try_get(column)?;

    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status.parse().map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: Box::new(e),
        })?;

        let shipping_address: Option<Json<Address>> = row.try_get("shipping_address")?;
        let currency: String = row.try_get("currency")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            number: OrderNumber::new(row.try_get::<String, _>("number")?),
            payment_reference: PaymentReference::new(
                row.try_get::<String, _>("payment_reference")?,
            ),
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            shipping_address: shipping_address.map(|address| address.0),
            total: try_get_u64(row, "total")?,
            currency: currency.trim_end().to_string(),
            status,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderLineItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderLineItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            name: row.try_get("name")?,
            quantity: try_get_u32(row, "quantity")?,
            price_at_purchase: try_get_u64(row, "price_at_purchase")?,
            variant: row.try_get("variant")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for FulfillmentException {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind = match row.try_get::<&str, _>("kind")? {
            "insufficient_stock" => FulfillmentExceptionKind::InsufficientStock,
            "unknown_product" => FulfillmentExceptionKind::UnknownProduct,
            other => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "kind".to_string(),
                    source: format!("unknown fulfillment exception kind {other}").into(),
                });
            }
        };

        let available = row
            .try_get::<Option<i32>, _>("available")?
            .map(u32::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "available".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: FulfillmentExceptionUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            kind,
            requested: try_get_u32(row, "requested")?,
            available,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
