use serde_json::json;

use geosat_core::{Endpoint, PaymentConfirmation, PaymentOrder, Result};

use crate::client::{to_body, ApiClient};

impl ApiClient {
    /// Open a checkout order for the advance leg of a new request
    pub async fn create_advance_payment(&self, request_id: &str) -> Result<PaymentOrder> {
        let order: PaymentOrder = self
            .data(
                Endpoint::CreateAdvancePayment,
                Some(json!({ "request_id": request_id })),
            )
            .await?;
        tracing::info!(request_id, order_id = %order.order_id, amount = order.amount, "Advance order created");
        Ok(order)
    }

    /// Submit a checkout receipt for server-side verification
    pub async fn verify_advance_payment(&self, confirmation: &PaymentConfirmation) -> Result<()> {
        self.expect_success(
            Endpoint::VerifyAdvancePayment,
            to_body(confirmation)?,
            "Payment verification failed",
        )
        .await
    }

    pub async fn create_final_payment(&self, payment_id: &str) -> Result<PaymentOrder> {
        let order: PaymentOrder = self
            .data(
                Endpoint::CreateFinalPayment,
                Some(json!({ "payment_id": payment_id })),
            )
            .await?;
        tracing::info!(payment_id, order_id = %order.order_id, amount = order.amount, "Final order created");
        Ok(order)
    }

    pub async fn verify_final_payment(&self, confirmation: &PaymentConfirmation) -> Result<()> {
        self.expect_success(
            Endpoint::VerifyFinalPayment,
            to_body(confirmation)?,
            "Payment verification failed",
        )
        .await
    }
}
