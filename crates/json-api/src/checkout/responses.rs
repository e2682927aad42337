//! Checkout responses
//!
//! Every checkout endpoint answers with a [`CheckoutResponse`] whose `status` names the outcome.

use salvo::{http::StatusCode, oapi::ToSchema};
use serde::{Deserialize, Serialize};

use storefront::pricing::PriceBreakdown;
use storefront_app::domain::checkout::{
    CheckoutOutcome, CouponRejection, OpenedSession, Quote, ValidationError,
};

use crate::observability::observe_checkout_outcome;

/// Totals in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct TotalsResponse {
    pub currency: String,
    pub subtotal: i64,
    pub tax: i64,
    pub gross_total: i64,
    pub discount: i64,
    pub final_total: i64,
}

impl From<&PriceBreakdown<'_>> for TotalsResponse {
    fn from(breakdown: &PriceBreakdown<'_>) -> Self {
        Self {
            currency: breakdown.final_total.currency().iso_alpha_code.to_string(),
            subtotal: breakdown.subtotal.to_minor_units(),
            tax: breakdown.tax.to_minor_units(),
            gross_total: breakdown.gross_total.to_minor_units(),
            discount: breakdown.discount.to_minor_units(),
            final_total: breakdown.final_total.to_minor_units(),
        }
    }
}

/// Coupon that was given but not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponRejectionResponse {
    pub code: String,
    pub reason: String,
    pub message: String,
}

impl CouponRejectionResponse {
    fn new(code: String, reason: CouponRejection) -> Self {
        Self {
            code,
            reason: reason.as_str().to_string(),
            message: reason.message().to_string(),
        }
    }
}

/// Invalid input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct ViolationResponse {
    pub field: String,
    pub message: String,
}

/// Checkout Response
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutResponse {
    /// Outcome, e.g. `success` or `payment_declined`
    pub status: String,

    /// Message suitable for showing to the customer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<TotalsResponse>,

    /// Code of the applied coupon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_rejection: Option<CouponRejectionResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<ViolationResponse>,
}

impl CheckoutResponse {
    pub(crate) fn quoted(quote: &Quote) -> Self {
        Self {
            status: "quoted".to_string(),
            totals: Some(TotalsResponse::from(&quote.breakdown)),
            coupon_code: quote.coupon.clone(),
            coupon_rejection: quote
                .rejection
                .clone()
                .map(|(code, reason)| CouponRejectionResponse::new(code, reason)),
            ..Self::default()
        }
    }

    pub(crate) fn session_opened(opened: &OpenedSession) -> Self {
        Self {
            status: "session_opened".to_string(),
            totals: Some(TotalsResponse::from(&opened.breakdown)),
            coupon_code: opened.coupon.clone(),
            intent_id: Some(opened.intent_id.to_string()),
            client_secret: Some(opened.client_secret.as_str().to_string()),
            ..Self::default()
        }
    }
}

impl From<&CheckoutOutcome> for CheckoutResponse {
    fn from(outcome: &CheckoutOutcome) -> Self {
        let mut response = Self {
            status: outcome.as_str().to_string(),
            message: Some(outcome.message()),
            order_number: outcome.order_number().map(ToString::to_string),
            ..Self::default()
        };

        match outcome {
            CheckoutOutcome::ValidationError(ValidationError::Address(invalid)) => {
                response.violations = invalid
                    .violations
                    .iter()
                    .map(|violation| ViolationResponse {
                        field: violation.field.to_string(),
                        message: violation.message.to_string(),
                    })
                    .collect();
            }
            CheckoutOutcome::CouponRejected { code, reason } => {
                response.coupon_rejection =
                    Some(CouponRejectionResponse::new(code.clone(), *reason));
            }
            CheckoutOutcome::AwaitingRedirect { redirect_url } => {
                response.redirect_url = Some(redirect_url.clone());
            }
            CheckoutOutcome::PaymentCapturedOrderPending { payment_reference } => {
                response.payment_reference = Some(payment_reference.to_string());
            }
            _ => {}
        }

        response
    }
}

/// HTTP status reported for `outcome`.
pub(crate) fn status_code(outcome: &CheckoutOutcome) -> StatusCode {
    match outcome {
        CheckoutOutcome::Success { .. } | CheckoutOutcome::SuccessWithNotificationPending { .. } => {
            StatusCode::OK
        }
        CheckoutOutcome::AwaitingRedirect { .. }
        | CheckoutOutcome::PaymentCapturedOrderPending { .. } => StatusCode::ACCEPTED,
        CheckoutOutcome::ValidationError(_) | CheckoutOutcome::CouponRejected { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CheckoutOutcome::PaymentDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
        CheckoutOutcome::GatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        CheckoutOutcome::InProgress | CheckoutOutcome::StaleSession => StatusCode::CONFLICT,
    }
}

/// Record `outcome` and turn it into a status code and body.
pub(crate) fn render(outcome: &CheckoutOutcome) -> (StatusCode, CheckoutResponse) {
    observe_checkout_outcome(outcome.as_str());

    (status_code(outcome), CheckoutResponse::from(outcome))
}
