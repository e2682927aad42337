//! Checkout outcomes

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::domain::{
    addresses::InvalidAddress,
    carts::CartError,
    checkout::coupons::CouponRejection,
    orders::models::{OrderNumber, PaymentReference},
};

/// Input problems found before any payment is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Address(#[from] InvalidAddress),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("there is nothing to charge after the discount")]
    NothingToCharge,

    #[error("cart could not be priced: {0}")]
    Pricing(String),
}

/// Final status of a checkout step, as reported to the checkout UI.
///
/// Outcomes before payment capture are recoverable by the customer. From
/// [`CheckoutOutcome::Success`] onwards the payment has been taken and the purchase stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    ValidationError(ValidationError),

    /// The coupon was not applied; pricing is otherwise unaffected.
    CouponRejected {
        code: String,
        reason: CouponRejection,
    },

    /// No funds were captured. The cart is intact.
    PaymentDeclined { message: String },

    /// The gateway could not be reached or did not confirm in time. No funds were captured;
    /// resubmitting is safe.
    GatewayUnavailable,

    /// The customer must complete payment at `redirect_url` and will come back through the
    /// return URL.
    AwaitingRedirect { redirect_url: String },

    /// Another confirmation or resumption for the same checkout is running, or the gateway is
    /// still processing the payment. The customer must not pay again.
    InProgress,

    /// The client secret or returning reference does not belong to the current payment session.
    StaleSession,

    Success { order_number: OrderNumber },

    /// The order exists but the invoice could not be sent.
    SuccessWithNotificationPending { order_number: OrderNumber },

    /// Payment was captured but the order could not be written. Needs reconciliation; resuming
    /// again retries the order without charging.
    PaymentCapturedOrderPending { payment_reference: PaymentReference },
}

impl CheckoutOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutOutcome::ValidationError(_) => "validation_error",
            CheckoutOutcome::CouponRejected { .. } => "coupon_rejected",
            CheckoutOutcome::PaymentDeclined { .. } => "payment_declined",
            CheckoutOutcome::GatewayUnavailable => "gateway_unavailable",
            CheckoutOutcome::AwaitingRedirect { .. } => "awaiting_redirect",
            CheckoutOutcome::InProgress => "in_progress",
            CheckoutOutcome::StaleSession => "stale_session",
            CheckoutOutcome::Success { .. } => "success",
            CheckoutOutcome::SuccessWithNotificationPending { .. } => {
                "success_with_notification_pending"
            }
            CheckoutOutcome::PaymentCapturedOrderPending { .. } => {
                "payment_captured_order_pending"
            }
        }
    }

    /// Whether payment has been captured, so the customer must not be asked to pay again.
    pub fn is_captured(&self) -> bool {
        matches!(
            self,
            CheckoutOutcome::Success { .. }
                | CheckoutOutcome::SuccessWithNotificationPending { .. }
                | CheckoutOutcome::PaymentCapturedOrderPending { .. }
        )
    }

    /// The order number, once an order exists.
    pub fn order_number(&self) -> Option<&OrderNumber> {
        match self {
            CheckoutOutcome::Success { order_number }
            | CheckoutOutcome::SuccessWithNotificationPending { order_number } => {
                Some(order_number)
            }
            _ => None,
        }
    }

    /// Message suitable for showing to the customer.
    pub fn message(&self) -> String {
        match self {
            CheckoutOutcome::ValidationError(error) => error.to_string(),
            CheckoutOutcome::CouponRejected { code, reason } => {
                format!("Coupon {code} was not applied: {}", reason.message())
            }
            CheckoutOutcome::PaymentDeclined { message } => {
                format!("Your payment was declined: {message}")
            }
            CheckoutOutcome::GatewayUnavailable => {
                "We could not reach the payment provider. You have not been charged; please try again."
                    .to_string()
            }
            CheckoutOutcome::AwaitingRedirect { .. } => {
                "Please complete your payment with your card issuer.".to_string()
            }
            CheckoutOutcome::InProgress => "Your payment is already being processed.".to_string(),
            CheckoutOutcome::StaleSession => {
                "Your basket changed since payment started. Please review and pay again."
                    .to_string()
            }
            CheckoutOutcome::Success { order_number } => {
                format!("Thank you! Your order number is {order_number}.")
            }
            CheckoutOutcome::SuccessWithNotificationPending { order_number } => format!(
                "Thank you! Your order number is {order_number}. Your receipt will follow shortly."
            ),
            CheckoutOutcome::PaymentCapturedOrderPending { .. } => {
                "Your payment was successful. We are finalising your order and will be in touch."
                    .to_string()
            }
        }
    }
}

impl Display for CheckoutOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Outcomes are returned as errors by the steps before confirmation.
impl std::error::Error for CheckoutOutcome {}

impl From<ValidationError> for CheckoutOutcome {
    fn from(error: ValidationError) -> Self {
        CheckoutOutcome::ValidationError(error)
    }
}
