use serde_json::Value;

use geosat_core::model::CreatedRequest;
use geosat_core::{
    Endpoint, Envelope, ImageRequest, ImageRequestForm, PaymentHistoryEntry, PaymentStatus, Result,
    SatelliteImage, Validate,
};

use crate::client::{to_body, ApiClient};

impl ApiClient {
    /// Submit a new image request; the returned id is needed for the advance payment
    pub async fn request_satellite_image(&self, form: &ImageRequestForm) -> Result<ImageRequest> {
        form.validate()?;

        let created: CreatedRequest = self
            .data(Endpoint::RequestSatelliteImage, to_body(form)?)
            .await?;
        tracing::info!(
            request_id = %created.request_id,
            plan = form.plan_type.as_str(),
            "Satellite image requested"
        );
        Ok(ImageRequest::from_form(created.request_id, form))
    }

    /// Status of the user's active request, or `None` when there is none
    pub async fn payment_status(&self) -> Result<Option<PaymentStatus>> {
        let envelope: Envelope<Value> = self.call(Endpoint::PaymentStatus, None).await?;
        if !envelope.is_success() {
            tracing::debug!(message = ?envelope.message, "No active request");
            return Ok(None);
        }
        match envelope.data {
            Some(data) if describes_request(&data) => Ok(Some(serde_json::from_value(data)?)),
            _ => Ok(None),
        }
    }

    pub async fn satellite_images(&self) -> Result<SatelliteImage> {
        self.data(Endpoint::SatelliteImages, None).await
    }

    pub async fn payment_history(&self) -> Result<Vec<PaymentHistoryEntry>> {
        self.data(Endpoint::PaymentHistory, None).await
    }
}

/// An empty object or one without the request keys means no active request
fn describes_request(data: &Value) -> bool {
    ["payment_id", "image_status"]
        .iter()
        .all(|key| data.get(key).is_some_and(|v| !v.is_null()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use geosat_core::{ClientConfig, ClientError, ImageStatus, NullPresenter, PlanType};

    use super::*;
    use crate::mock::MockTransport;
    use crate::session::Session;

    fn client() -> (ApiClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let client = ApiClient::with_transport(
            &ClientConfig::default(),
            Arc::new(Session::in_memory()),
            transport.clone(),
            Arc::new(NullPresenter),
        )
        .unwrap();
        (client, transport)
    }

    #[tokio::test]
    async fn test_request_satellite_image() {
        let (client, transport) = client();
        transport.respond_ok(Endpoint::RequestSatelliteImage, json!({"request_id": 42}));

        let form = ImageRequestForm::new(12.97, 77.59).with_plan(PlanType::Monthly);
        let request = client.request_satellite_image(&form).await.unwrap();
        assert_eq!(request.request_id, "42");
        assert_eq!(request.plan_type, PlanType::Monthly);

        let body = transport.requests_to(Endpoint::RequestSatelliteImage)[0].body.clone().unwrap();
        assert_eq!(body["plan_type"], "monthly");
        assert_eq!(body["resolution"], "high");
        assert_eq!(body["coverage_area"], "5km");
    }

    #[tokio::test]
    async fn test_out_of_range_coordinates_are_not_sent() {
        let (client, transport) = client();
        let err = client
            .request_satellite_image(&ImageRequestForm::new(95.0, 77.59))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(transport.count(Endpoint::RequestSatelliteImage), 0);
    }

    #[tokio::test]
    async fn test_payment_status_none_when_no_request() {
        let (client, transport) = client();
        transport.respond(
            Endpoint::PaymentStatus,
            200,
            json!({"status": "error", "message": "No active request"}),
        );
        assert!(client.payment_status().await.unwrap().is_none());

        transport.respond_ok(Endpoint::PaymentStatus, Value::Null);
        assert!(client.payment_status().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payment_status_none_for_empty_data() {
        let (client, transport) = client();
        transport
            .respond_ok(Endpoint::PaymentStatus, json!({}))
            .respond_ok(Endpoint::PaymentStatus, json!({"payment_status": "pending"}))
            .respond_ok(Endpoint::PaymentStatus, json!({"payment_id": null, "image_status": "ready"}));

        for _ in 0..3 {
            assert!(client.payment_status().await.unwrap().is_none());
        }
        assert_eq!(transport.count(Endpoint::PaymentStatus), 3);
    }

    #[tokio::test]
    async fn test_payment_status_ready() {
        let (client, transport) = client();
        transport.respond_ok(
            Endpoint::PaymentStatus,
            json!({
                "payment_id": 7,
                "image_status": "ready",
                "payment_status": "advance_paid",
                "pending_amount": "2500",
                "latitude": "12.97",
                "longitude": 77.59
            }),
        );

        let status = client.payment_status().await.unwrap().unwrap();
        assert_eq!(status.payment_id, "7");
        assert_eq!(status.image_status, ImageStatus::Ready);
        assert_eq!(status.pending_amount, Some(Decimal::from(2500)));
        assert_eq!(status.latitude, Some(12.97));
    }

    #[tokio::test]
    async fn test_payment_history_labels() {
        let (client, transport) = client();
        transport.respond_ok(
            Endpoint::PaymentHistory,
            json!([{
                "payment_id": "p1",
                "plan_type": "per_image",
                "payment_status": "completed",
                "coordinates": {"latitude": 12.0, "longitude": "77.5"},
                "image_status": "ready",
                "total_amount": 5000
            }]),
        );

        let history = client.payment_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].plan_label(), "One-time Satview");
        assert!(history[0].payment_status.is_completed());
    }
}
