use crate::client::{ApiError, ApiResult, FundApi};
use crate::envelope::{unwrap_item, unwrap_list};
use log::info;
use serde_json::{Value, json};

impl FundApi {
    /// Raw payment records; run them through [`crate::normalize`] for display.
    pub async fn list_payments(&self) -> ApiResult<Vec<Value>> {
        let body = self.get("/payments", &[]).await?;
        Ok(unwrap_list(body, "payments"))
    }

    /// Refund through `/payments/{id}/refund`; deployments without that route
    /// (404) take the provider-level `/payment/refund` instead.
    pub async fn refund_payment(&self, id: &str) -> ApiResult<Value> {
        match self.post(&format!("/payments/{id}/refund"), &json!({})).await {
            Err(ApiError::Api { status: 404, .. }) => {
                info!("payment refund route missing, using /payment/refund for {id}");
                let body = self.post("/payment/refund", &json!({ "paymentId": id })).await?;
                Ok(unwrap_item(body, "payment"))
            }
            other => other.map(|body| unwrap_item(body, "payment")),
        }
    }

    /// `POST /payment/stripe/create-intent` with the amount in minor units.
    pub async fn create_stripe_intent(&self, amount_minor: u64, currency: &str) -> ApiResult<Value> {
        let body = self
            .post(
                "/payment/stripe/create-intent",
                &json!({ "amount": amount_minor, "currency": currency }),
            )
            .await?;
        Ok(unwrap_item(body, "data"))
    }

    /// `POST /payment/paypal/create-order` with a two-decimal amount string.
    pub async fn create_paypal_order(&self, amount: &str, currency: &str) -> ApiResult<Value> {
        let body = self
            .post(
                "/payment/paypal/create-order",
                &json!({ "amount": amount, "currency": currency }),
            )
            .await?;
        Ok(unwrap_item(body, "data"))
    }
}
