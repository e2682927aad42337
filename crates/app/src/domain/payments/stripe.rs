//! Stripe-compatible payment gateway client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use crate::domain::payments::{
    errors::GatewayError,
    gateway::PaymentGateway,
    models::{
        ClientSecret, Confirmation, IntentId, IntentMetadata, IntentStatus, NewIntent,
        PaymentIntent,
    },
};

/// Configuration for connecting to the gateway.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// API base address, e.g. `"https://api.stripe.com"`.
    pub api_base: String,

    /// Secret API key.
    pub secret_key: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP client for the payment intents API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    config: StripeConfig,
    http: Client,
}

impl StripeGateway {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(
        name = "payments.stripe.create_intent",
        skip(self, intent),
        fields(amount = intent.amount, currency = %intent.currency),
        err
    )]
    async fn create_intent(&self, intent: NewIntent) -> Result<PaymentIntent, GatewayError> {
        let form = [
            ("amount", intent.amount.to_string()),
            ("currency", intent.currency.to_ascii_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[checkout_key]", intent.metadata.checkout_key),
            ("metadata[customer_name]", intent.metadata.customer_name),
            ("metadata[customer_email]", intent.metadata.customer_email),
        ];

        let response = self
            .http
            .post(self.url("/v1/payment_intents"))
            .bearer_auth(&self.config.secret_key)
            .header("Idempotency-Key", &intent.idempotency_key)
            .form(&form)
            .send()
            .await?;

        read_intent(response).await
    }

    #[tracing::instrument(
        name = "payments.stripe.confirm_intent",
        skip(self, secret, confirmation),
        fields(intent_id = tracing::field::Empty),
        err
    )]
    async fn confirm_intent(
        &self,
        secret: &ClientSecret,
        confirmation: Confirmation,
    ) -> Result<PaymentIntent, GatewayError> {
        let intent_id = intent_id_from(secret)?;

        tracing::Span::current().record("intent_id", tracing::field::display(&intent_id));

        let mut form = vec![("return_url", confirmation.return_url)];

        if let Some(payment_method) = confirmation.payment_method {
            form.push(("payment_method", payment_method));
        }

        let response = self
            .http
            .post(self.url(&format!("/v1/payment_intents/{intent_id}/confirm")))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await?;

        read_intent(response).await
    }

    #[tracing::instrument(
        name = "payments.stripe.retrieve_intent",
        skip(self, secret),
        fields(intent_id = tracing::field::Empty),
        err
    )]
    async fn retrieve_intent(&self, secret: &ClientSecret) -> Result<PaymentIntent, GatewayError> {
        let intent_id = intent_id_from(secret)?;

        tracing::Span::current().record("intent_id", tracing::field::display(&intent_id));

        let response = self
            .http
            .get(self.url(&format!("/v1/payment_intents/{intent_id}")))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        let intent = read_intent(response).await?;

        if intent.client_secret != *secret {
            return Err(GatewayError::UnexpectedResponse(
                "client secret does not belong to the retrieved intent".to_string(),
            ));
        }

        Ok(intent)
    }
}

fn intent_id_from(secret: &ClientSecret) -> Result<IntentId, GatewayError> {
    secret.intent_id().ok_or_else(|| {
        GatewayError::UnexpectedResponse("client secret is not in the expected format".to_string())
    })
}

async fn read_intent(response: Response) -> Result<PaymentIntent, GatewayError> {
    let status = response.status();

    if status.is_success() {
        let intent: StripeIntent = response.json().await?;

        return intent.into_payment_intent();
    }

    let text = response.text().await.unwrap_or_default();

    debug!(%status, body = %text, "payment gateway returned an error");

    let error = serde_json::from_str::<StripeErrorBody>(&text)
        .ok()
        .map(|body| body.error);

    let is_card_error = error
        .as_ref()
        .is_some_and(|error| error.error_type.as_deref() == Some("card_error"));

    if status == StatusCode::PAYMENT_REQUIRED || is_card_error {
        return Err(GatewayError::Declined {
            message: error
                .and_then(|error| error.message)
                .unwrap_or_else(|| "your card was declined".to_string()),
        });
    }

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(GatewayError::Unavailable(format!(
            "gateway responded with status {status}"
        )));
    }

    Err(GatewayError::UnexpectedResponse(format!(
        "request failed with status {status}: {text}"
    )))
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    #[serde(default)]
    metadata: FxHashMap<String, String>,
    next_action: Option<StripeNextAction>,
    last_payment_error: Option<StripeError>,
}

impl StripeIntent {
    fn into_payment_intent(mut self) -> Result<PaymentIntent, GatewayError> {
        let status = match self.status.as_str() {
            "succeeded" => IntentStatus::Succeeded,
            "requires_action" | "requires_confirmation" => IntentStatus::RequiresAction,
            "processing" => IntentStatus::Processing,
            "requires_payment_method" | "canceled" => IntentStatus::Failed,
            other => {
                return Err(GatewayError::UnexpectedResponse(format!(
                    "unknown intent status {other}"
                )));
            }
        };

        let amount = u64::try_from(self.amount).map_err(|_err| {
            GatewayError::UnexpectedResponse(format!("negative intent amount {}", self.amount))
        })?;

        let client_secret = self.client_secret.ok_or_else(|| {
            GatewayError::UnexpectedResponse("intent has no client secret".to_string())
        })?;

        let metadata = IntentMetadata {
            checkout_key: self.metadata.remove("checkout_key").unwrap_or_default(),
            customer_name: self.metadata.remove("customer_name").unwrap_or_default(),
            customer_email: self.metadata.remove("customer_email").unwrap_or_default(),
        };

        Ok(PaymentIntent {
            id: IntentId::new(self.id),
            client_secret: ClientSecret::new(client_secret),
            amount,
            currency: self.currency.to_ascii_uppercase(),
            status,
            metadata,
            redirect_url: self
                .next_action
                .and_then(|action| action.redirect_to_url)
                .map(|redirect| redirect.url),
            failure_message: self.last_payment_error.and_then(|error| error.message),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StripeNextAction {
    redirect_to_url: Option<StripeRedirect>,
}

#[derive(Debug, Deserialize)]
struct StripeRedirect {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header, method, path},
    };

    use super::*;

    const SECRET: &str = "pi_123_secret_abc";

    fn gateway(server: &MockServer) -> TestResult<StripeGateway> {
        Ok(StripeGateway::new(StripeConfig {
            api_base: server.uri(),
            secret_key: "sk_test_key".to_string(),
            timeout: Duration::from_secs(5),
        })?)
    }

    fn intent_body(status: &str) -> serde_json::Value {
        json!({
            "id": "pi_123",
            "client_secret": SECRET,
            "amount": 6000,
            "currency": "gbp",
            "status": status,
            "metadata": {
                "checkout_key": "chk_1",
                "customer_name": "Ada Lovelace",
                "customer_email": "ada@example.com"
            }
        })
    }

    fn new_intent() -> NewIntent {
        NewIntent {
            amount: 60_00,
            currency: "GBP".to_string(),
            idempotency_key: "chk_1-attempt".to_string(),
            metadata: IntentMetadata {
                checkout_key: "chk_1".to_string(),
                customer_name: "Ada Lovelace".to_string(),
                customer_email: "ada@example.com".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn create_intent_posts_amount_and_idempotency_key() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Idempotency-Key", "chk_1-attempt"))
            .and(header("Authorization", "Bearer sk_test_key"))
            .and(body_string_contains("amount=6000"))
            .and(body_string_contains("currency=gbp"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(intent_body("requires_payment_method")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let intent = gateway(&server)?.create_intent(new_intent()).await?;

        assert_eq!(intent.id, IntentId::new("pi_123"));
        assert_eq!(intent.amount, 60_00);
        assert_eq!(intent.currency, "GBP");
        assert_eq!(intent.metadata.customer_email, "ada@example.com");

        Ok(())
    }

    #[tokio::test]
    async fn confirm_intent_reports_redirect() -> TestResult {
        let server = MockServer::start().await;

        let mut body = intent_body("requires_action");
        body["next_action"] = json!({
            "type": "redirect_to_url",
            "redirect_to_url": { "url": "https://hooks.example.com/3ds" }
        });

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_123/confirm"))
            .and(body_string_contains("return_url="))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let intent = gateway(&server)?
            .confirm_intent(
                &ClientSecret::new(SECRET),
                Confirmation {
                    return_url: "https://shop.example.com/checkout/return".to_string(),
                    payment_method: Some("pm_card_visa".to_string()),
                },
            )
            .await?;

        assert_eq!(intent.status, IntentStatus::RequiresAction);
        assert_eq!(
            intent.redirect_url.as_deref(),
            Some("https://hooks.example.com/3ds")
        );

        Ok(())
    }

    #[tokio::test]
    async fn card_error_is_declined() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_123/confirm"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": { "type": "card_error", "message": "Your card has insufficient funds." }
            })))
            .mount(&server)
            .await;

        let result = gateway(&server)?
            .confirm_intent(
                &ClientSecret::new(SECRET),
                Confirmation {
                    return_url: "https://shop.example.com/return".to_string(),
                    payment_method: None,
                },
            )
            .await;

        assert_eq!(
            result,
            Err(GatewayError::Declined {
                message: "Your card has insufficient funds.".to_string()
            })
        );

        Ok(())
    }

    #[tokio::test]
    async fn server_error_is_unavailable() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_123"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = gateway(&server)?
            .retrieve_intent(&ClientSecret::new(SECRET))
            .await;

        assert!(
            matches!(result, Err(GatewayError::Unavailable(_))),
            "expected Unavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn slow_gateway_times_out() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(intent_body("succeeded"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(StripeConfig {
            api_base: server.uri(),
            secret_key: "sk_test_key".to_string(),
            timeout: Duration::from_millis(50),
        })?;

        let result = gateway.retrieve_intent(&ClientSecret::new(SECRET)).await;

        assert_eq!(result, Err(GatewayError::Timeout));

        Ok(())
    }

    #[tokio::test]
    async fn retrieve_rejects_secret_for_other_intent() -> TestResult {
        let server = MockServer::start().await;

        let mut body = intent_body("succeeded");
        body["client_secret"] = json!("pi_123_secret_other");

        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let result = gateway(&server)?
            .retrieve_intent(&ClientSecret::new(SECRET))
            .await;

        assert!(
            matches!(result, Err(GatewayError::UnexpectedResponse(_))),
            "expected UnexpectedResponse, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn malformed_secret_never_reaches_gateway() -> TestResult {
        let server = MockServer::start().await;

        let result = gateway(&server)?
            .retrieve_intent(&ClientSecret::new("not-a-secret"))
            .await;

        assert!(
            matches!(result, Err(GatewayError::UnexpectedResponse(_))),
            "expected UnexpectedResponse, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn status_mapping() -> TestResult {
        let status = |raw: &str| -> Result<IntentStatus, GatewayError> {
            let intent: StripeIntent = serde_json::from_value(intent_body(raw))
                .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))?;

            Ok(intent.into_payment_intent()?.status)
        };

        assert_eq!(status("succeeded")?, IntentStatus::Succeeded);
        assert_eq!(status("processing")?, IntentStatus::Processing);
        assert_eq!(status("requires_action")?, IntentStatus::RequiresAction);
        assert_eq!(status("requires_payment_method")?, IntentStatus::Failed);
        assert_eq!(status("canceled")?, IntentStatus::Failed);
        assert!(status("mystery").is_err());

        Ok(())
    }
}
