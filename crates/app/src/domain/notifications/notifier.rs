//! Fulfillment notifier.
//!
//! Runs after an order exists. Nothing here can undo the purchase: a failed send is reported as
//! [`NotificationOutcome::Failed`] so it can be logged and resent by an operator.

use std::sync::Arc;

use jiff::Timestamp;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use storefront::{
    invoice::{Invoice, InvoiceLine},
    items::LineItem,
};
use tracing::{error, info};

use crate::domain::{
    notifications::{
        errors::NotificationError,
        mailer::{InvoiceEmail, Mailer},
    },
    orders::models::{OrderLineItem, PlacedOrder},
};

#[derive(Debug)]
pub enum NotificationOutcome {
    Delivered,
    Failed(NotificationError),
}

impl NotificationOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotificationOutcome::Delivered)
    }
}

#[derive(Clone)]
pub struct FulfillmentNotifier {
    mailer: Arc<dyn Mailer>,
}

impl std::fmt::Debug for FulfillmentNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentNotifier").finish_non_exhaustive()
    }
}

impl FulfillmentNotifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Render the invoice for `placed` and send it to the customer.
    #[tracing::instrument(
        name = "notifications.notifier.notify",
        skip(self, placed),
        fields(order_number = %placed.order.number)
    )]
    pub async fn notify(&self, placed: &PlacedOrder) -> NotificationOutcome {
        let sent = async {
            let email = invoice_email(placed, Timestamp::now())?;

            self.mailer.send_invoice_email(email).await?;

            Ok::<_, NotificationError>(())
        }
        .await;

        match sent {
            Ok(()) => {
                info!(order_number = %placed.order.number, "invoice sent");

                NotificationOutcome::Delivered
            }
            Err(error) => {
                error!(
                    order_number = %placed.order.number,
                    error = %error,
                    "invoice could not be sent; order stands, resend required"
                );

                NotificationOutcome::Failed(error)
            }
        }
    }
}

/// Build the invoice email for an order.
///
/// # Errors
///
/// Fails when the order has no email address, uses an unknown currency, or the invoice cannot
/// be rendered.
pub fn invoice_email(
    placed: &PlacedOrder,
    issued_at: Timestamp,
) -> Result<InvoiceEmail, NotificationError> {
    let order = &placed.order;

    let to = order
        .customer_email
        .clone()
        .ok_or_else(|| NotificationError::NoRecipient(order.number.clone()))?;

    let currency = iso::find(&order.currency)
        .ok_or_else(|| NotificationError::UnknownCurrency(order.currency.clone()))?;

    let total = money(order.total, currency)?;

    let lines = placed
        .lines
        .iter()
        .map(|line| invoice_line(line, currency))
        .collect::<Result<Vec<_>, _>>()?;

    let invoice = Invoice::new(
        order.number.as_str(),
        order.customer_name.as_str(),
        issued_at,
        lines,
        total,
    );

    let mut attachment = Vec::new();

    invoice
        .write_to(&mut attachment)
        .map_err(NotificationError::Render)?;

    Ok(InvoiceEmail {
        to,
        subject: format!("Your order {}", order.number),
        summary: format!(
            "Thank you for your order, {}.\n\nOrder number: {}\nTotal charged: {total}\n\nYour invoice is attached.\n",
            order.customer_name, order.number
        ),
        attachment_name: format!("invoice-{}.txt", order.number),
        attachment,
    })
}

fn invoice_line(
    line: &OrderLineItem,
    currency: &'static Currency,
) -> Result<InvoiceLine<'static>, NotificationError> {
    let unit_price = money(line.price_at_purchase, currency)?;

    let line_total = LineItem::new(unit_price, line.quantity)
        .line_total()
        .ok_or(NotificationError::OutOfRange)?;

    let description = match &line.variant {
        Some(variant) => format!("{} ({variant})", line.name),
        None => line.name.clone(),
    };

    Ok(InvoiceLine {
        description,
        quantity: line.quantity,
        unit_price,
        line_total,
    })
}

fn money(
    minor: u64,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, NotificationError> {
    let minor = i64::try_from(minor).map_err(|_err| NotificationError::OutOfRange)?;

    Ok(Money::from_minor(minor, currency))
}
