//! Test helpers.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use rusty_money::iso;
use salvo::{affix_state::inject, prelude::*};
use serde_json::{Value, json};
use uuid::Uuid;

use storefront::pricing::TaxRate;
use storefront_app::{
    context::AppContext,
    domain::{
        checkout::{CheckoutServices, CheckoutSettings},
        continuations::MockContinuationStore,
        coupons::MockCouponsService,
        notifications::MockMailer,
        orders::{
            Materialized, MockOrdersService, Order, OrderNumber, OrderStatus, OrderUuid,
            PaymentReference, PlacedOrder,
        },
        payments::{
            MockPaymentGateway,
            models::{ClientSecret, IntentId, IntentMetadata, IntentStatus, PaymentIntent},
        },
    },
};

use crate::state::State;

pub(crate) const TEST_PRODUCT_UUID: Uuid = Uuid::nil();

/// Collaborators behind the checkout workflow. A mock without an expectation for a call panics
/// when it is made.
pub(crate) struct Mocks {
    pub coupons: MockCouponsService,
    pub gateway: MockPaymentGateway,
    pub continuations: MockContinuationStore,
    pub orders: MockOrdersService,
    pub mailer: MockMailer,
}

impl Default for Mocks {
    fn default() -> Self {
        Self {
            coupons: MockCouponsService::new(),
            gateway: MockPaymentGateway::new(),
            continuations: MockContinuationStore::new(),
            orders: MockOrdersService::new(),
            mailer: MockMailer::new(),
        }
    }
}

#[expect(clippy::panic, reason = "test setup cannot continue without a workflow")]
pub(crate) fn state_with(mocks: Mocks) -> Arc<State> {
    let settings = CheckoutSettings {
        currency: iso::GBP,
        tax_rate: TaxRate::default(),
        session_max_age: SignedDuration::from_hours(24),
    };

    let services = CheckoutServices {
        coupons: Arc::new(mocks.coupons),
        gateway: Arc::new(mocks.gateway),
        continuations: Arc::new(mocks.continuations),
        orders: Arc::new(mocks.orders),
        mailer: Arc::new(mocks.mailer),
    };

    match AppContext::from_services(settings, services) {
        Ok(app) => State::from_app_context(app),
        Err(error) => panic!("failed to build test app context: {error}"),
    }
}

pub(crate) fn checkout_service(mocks: Mocks, route: Router) -> Service {
    Service::new(Router::new().hoop(inject(state_with(mocks))).push(route))
}

/// Two blue teapots at 25.00: 50.00 subtotal, 10.00 tax, 60.00 total.
pub(crate) fn cart_lines() -> Value {
    json!([{
        "product": TEST_PRODUCT_UUID,
        "name": "Teapot",
        "unit_price": 2500,
        "quantity": 2,
        "stock_limit": 5,
        "variant": "Blue",
    }])
}

pub(crate) fn address() -> Value {
    json!({
        "name": "Ada Lovelace",
        "line1": "10 Downing Street",
        "city": "London",
        "postcode": "SW1A 2AA",
        "country": "GB",
        "phone": "07700 900123",
        "email": "ada@example.com",
    })
}

pub(crate) fn session_request() -> Value {
    json!({
        "customer_name": "Ada Lovelace",
        "address": address(),
        "lines": cart_lines(),
    })
}

pub(crate) fn intent(id: &str, status: IntentStatus) -> PaymentIntent {
    PaymentIntent {
        id: IntentId::new(id),
        client_secret: ClientSecret::new(format!("{id}_secret_test")),
        amount: 60_00,
        currency: "GBP".to_string(),
        status,
        metadata: IntentMetadata {
            checkout_key: "chk_1".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            customer_email: "ada@example.com".to_string(),
        },
        redirect_url: None,
        failure_message: None,
    }
}

/// An order that already existed for `reference`, so no invoice is sent for it.
pub(crate) fn existing_order(reference: &str, number: &str) -> Materialized {
    Materialized {
        order: PlacedOrder {
            order: Order {
                uuid: OrderUuid::new(),
                number: OrderNumber::new(number),
                payment_reference: PaymentReference::new(reference),
                customer_name: "Ada Lovelace".to_string(),
                customer_email: Some("ada@example.com".to_string()),
                shipping_address: None,
                total: 60_00,
                currency: "GBP".to_string(),
                status: OrderStatus::Paid,
                created_at: Timestamp::UNIX_EPOCH,
            },
            lines: Vec::new(),
        },
        created: false,
        stock: Vec::new(),
    }
}
