//! Payment Orchestration
//!
//! Runs one payment leg end to end:
//!
//! ```text
//! create order ──▶ load widget ──▶ open widget ──▶ verify receipt ──▶ alert + redirect
//!                                       │
//!                                       └── dismissed: stop, nothing verified
//! ```
//!
//! A payment only counts as done when the backend's verify endpoint accepts
//! the receipt; the client never marks anything complete on its own.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use geosat_client::ApiClient;
use geosat_core::{ClientConfig, ClientError, PaymentConfirmation, Presenter};

use crate::checkout::{CheckoutOptions, CheckoutOutcome, Leg};
use crate::error::{PaymentError, Result};
use crate::loader::CheckoutLoader;

/// How a leg ended without error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegOutcome {
    /// Backend accepted the receipt
    Verified,
    /// User closed the widget
    Dismissed,
}

pub struct PaymentService {
    client: Arc<ApiClient>,
    loader: Arc<CheckoutLoader>,
    presenter: Arc<dyn Presenter>,
    config: ClientConfig,
    in_flight: Mutex<HashSet<(Leg, String)>>,

    /// Cancelled when the owning screen goes away
    lifecycle: CancellationToken,
}

impl PaymentService {
    /// Reports through the client's presenter
    pub fn new(client: Arc<ApiClient>, loader: Arc<CheckoutLoader>, config: ClientConfig) -> Self {
        let presenter = Arc::clone(client.presenter());
        Self {
            client,
            loader,
            presenter,
            config,
            in_flight: Mutex::new(HashSet::new()),
            lifecycle: CancellationToken::new(),
        }
    }

    pub fn lifecycle(&self) -> &CancellationToken {
        &self.lifecycle
    }

    /// Stop any pending redirect; payments already submitted still complete
    pub fn shutdown(&self) {
        self.lifecycle.cancel();
    }

    pub async fn initiate_advance_payment(&self, request_id: &str) -> Result<LegOutcome> {
        self.run_leg(Leg::Advance, request_id).await
    }

    pub async fn initiate_final_payment(&self, payment_id: &str) -> Result<LegOutcome> {
        self.run_leg(Leg::Final, payment_id).await
    }

    async fn run_leg(&self, leg: Leg, id: &str) -> Result<LegOutcome> {
        let _claim = self.claim(leg, id)?;
        tracing::info!(%leg, id, "Starting payment");

        let order = match leg {
            Leg::Advance => self.client.create_advance_payment(id).await,
            Leg::Final => self.client.create_final_payment(id).await,
        }
        .map_err(|e| self.fail(leg, PaymentError::CreateOrder(e)))?;

        let options = CheckoutOptions::for_order(&order, leg, &self.config);
        let widget = self.loader.load().await.map_err(|e| self.fail(leg, e))?;

        let confirmation = match widget.open(&options).await.map_err(|e| self.fail(leg, e))? {
            CheckoutOutcome::Completed(confirmation) => confirmation,
            CheckoutOutcome::Dismissed => {
                tracing::info!(%leg, id, order_id = %order.order_id, "Checkout dismissed");
                return Ok(LegOutcome::Dismissed);
            }
        };

        self.verify(leg, &confirmation)
            .await
            .map_err(|e| self.fail(leg, e))?;
        tracing::info!(
            %leg,
            id,
            order_id = %confirmation.razorpay_order_id,
            payment_id = %confirmation.razorpay_payment_id,
            "Payment verified"
        );

        self.presenter.alert(leg.success_message());
        self.redirect(leg).await;
        Ok(LegOutcome::Verified)
    }

    async fn verify(&self, leg: Leg, confirmation: &PaymentConfirmation) -> Result<()> {
        let result = match leg {
            Leg::Advance => self.client.verify_advance_payment(confirmation).await,
            Leg::Final => self.client.verify_final_payment(confirmation).await,
        };
        result.map_err(|e| match e {
            ClientError::Rejected(message) => PaymentError::VerificationRejected(message),
            other => PaymentError::Verification(other),
        })
    }

    async fn redirect(&self, leg: Leg) {
        tokio::select! {
            biased;
            () = self.lifecycle.cancelled() => {
                tracing::debug!(%leg, "Service shut down, skipping redirect");
            }
            () = tokio::time::sleep(self.config.redirect_delay) => {
                self.presenter.navigate(leg.success_route());
            }
        }
    }

    fn fail(&self, leg: Leg, error: PaymentError) -> PaymentError {
        tracing::warn!(%leg, error = %error, "Payment failed");
        self.presenter.error(leg.failure_message());
        error
    }

    fn claim(&self, leg: Leg, id: &str) -> Result<InFlight<'_>> {
        let key = (leg, id.to_string());
        let mut running = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(key.clone()) {
            tracing::debug!(%leg, id, "Payment already in progress");
            return Err(PaymentError::LegInFlight {
                leg,
                id: id.to_string(),
            });
        }
        Ok(InFlight {
            running: &self.in_flight,
            key,
        })
    }
}

/// Releases the in-flight claim when the leg ends, however it ends
struct InFlight<'a> {
    running: &'a Mutex<HashSet<(Leg, String)>>,
    key: (Leg, String),
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Notify;

    use geosat_client::{MockTransport, Session};
    use geosat_core::{Endpoint, RecordingPresenter, Route, UiEvent};

    use super::*;
    use crate::checkout::CheckoutWidget;
    use crate::sandbox::{verify_signature, SandboxCheckout, SandboxHost};

    const SECRET: &[u8] = b"sandbox-secret";

    struct Harness {
        service: PaymentService,
        transport: Arc<MockTransport>,
        presenter: Arc<RecordingPresenter>,
        host: Arc<SandboxHost>,
    }

    fn harness(widget: Arc<dyn CheckoutWidget>) -> Harness {
        let config = ClientConfig::default();
        let transport = Arc::new(MockTransport::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let client = ApiClient::with_transport(
            &config,
            Arc::new(Session::in_memory()),
            transport.clone(),
            presenter.clone(),
        )
        .unwrap();
        let host = Arc::new(SandboxHost::new(widget));
        let loader = CheckoutLoader::from_config(host.clone(), &config);
        Harness {
            service: PaymentService::new(Arc::new(client), Arc::new(loader), config),
            transport,
            presenter,
            host,
        }
    }

    fn order(id: &str) -> Value {
        json!({"order_id": id, "key": "rzp_test", "amount": 250_000})
    }

    fn sent_confirmation(transport: &MockTransport, endpoint: Endpoint) -> PaymentConfirmation {
        let body = transport.requests_to(endpoint)[0].body.clone().unwrap();
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_advance_leg_verifies_then_redirects() {
        let checkout = Arc::new(SandboxCheckout::new(SECRET.to_vec()));
        let h = harness(checkout.clone());
        h.transport
            .respond_ok(Endpoint::CreateAdvancePayment, order("order_1"))
            .respond_ok(Endpoint::VerifyAdvancePayment, Value::Null);

        let start = tokio::time::Instant::now();
        let outcome = h.service.initiate_advance_payment("42").await.unwrap();
        assert_eq!(outcome, LegOutcome::Verified);
        assert_eq!(start.elapsed(), Duration::from_millis(2000));

        let confirmation = sent_confirmation(&h.transport, Endpoint::VerifyAdvancePayment);
        assert_eq!(confirmation.razorpay_order_id, "order_1");
        assert!(verify_signature(SECRET, &confirmation));
        assert_eq!(checkout.opened()[0].description, "Advance Payment for Satellite Image");

        assert_eq!(
            h.presenter.events(),
            vec![
                UiEvent::Alert("Payment successful! Redirecting to processing page...".into()),
                UiEvent::Navigate(Route::ProcessImage),
            ]
        );
    }

    #[tokio::test]
    async fn test_dismissed_checkout_is_not_verified() {
        let checkout = Arc::new(SandboxCheckout::new(SECRET.to_vec()));
        checkout.dismiss_all(true);
        let h = harness(checkout);
        h.transport.respond_ok(Endpoint::CreateFinalPayment, order("order_2"));

        let outcome = h.service.initiate_final_payment("p1").await.unwrap();
        assert_eq!(outcome, LegOutcome::Dismissed);
        assert_eq!(h.transport.count(Endpoint::VerifyFinalPayment), 0);
        assert!(h.presenter.events().is_empty());
    }

    /// Widget that records whether verification had already been attempted when it opened
    struct ObservingWidget {
        transport: Arc<MockTransport>,
        inner: SandboxCheckout,
        verify_calls_at_open: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl CheckoutWidget for ObservingWidget {
        async fn open(&self, options: &CheckoutOptions) -> Result<CheckoutOutcome> {
            *self.verify_calls_at_open.lock().unwrap() =
                Some(self.transport.count(Endpoint::VerifyFinalPayment));
            self.inner.open(options).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_leg_verifies_only_after_completion() {
        let transport = Arc::new(MockTransport::new());
        let widget = Arc::new(ObservingWidget {
            transport: transport.clone(),
            inner: SandboxCheckout::new(SECRET.to_vec()),
            verify_calls_at_open: Mutex::new(None),
        });

        let config = ClientConfig::default();
        let presenter = Arc::new(RecordingPresenter::new());
        let client = ApiClient::with_transport(
            &config,
            Arc::new(Session::in_memory()),
            transport.clone(),
            presenter.clone(),
        )
        .unwrap();
        let loader = CheckoutLoader::from_config(Arc::new(SandboxHost::new(widget.clone())), &config);
        let service = PaymentService::new(Arc::new(client), Arc::new(loader), config);

        transport
            .respond_ok(Endpoint::CreateFinalPayment, order("order_3"))
            .respond_ok(Endpoint::VerifyFinalPayment, Value::Null);

        service.initiate_final_payment("p1").await.unwrap();

        assert_eq!(*widget.verify_calls_at_open.lock().unwrap(), Some(0));
        assert_eq!(transport.count(Endpoint::VerifyFinalPayment), 1);
        assert_eq!(
            transport.requests_to(Endpoint::CreateFinalPayment)[0].body,
            Some(json!({"payment_id": "p1"}))
        );
        assert_eq!(presenter.routes(), vec![Route::SatelliteMap]);
    }

    #[tokio::test]
    async fn test_order_failure_reports_leg_message() {
        let checkout = Arc::new(SandboxCheckout::new(SECRET.to_vec()));
        let h = harness(checkout.clone());
        h.transport.respond(
            Endpoint::CreateAdvancePayment,
            500,
            json!({"status": "error", "message": "Internal error"}),
        );

        let err = h.service.initiate_advance_payment("42").await.unwrap_err();
        assert!(matches!(err, PaymentError::CreateOrder(_)));
        assert!(err.is_retryable());
        assert_eq!(h.presenter.errors(), vec!["Failed to process payment".to_string()]);
        assert!(checkout.opened().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_final_verification() {
        let h = harness(Arc::new(SandboxCheckout::new(SECRET.to_vec())));
        h.transport
            .respond_ok(Endpoint::CreateFinalPayment, order("order_4"))
            .respond(
                Endpoint::VerifyFinalPayment,
                200,
                json!({"status": "failed", "message": "Signature mismatch"}),
            );

        let err = h.service.initiate_final_payment("p1").await.unwrap_err();
        assert!(matches!(err, PaymentError::VerificationRejected(ref m) if m == "Signature mismatch"));
        assert_eq!(
            h.presenter.errors(),
            vec!["Final payment failed. Please try again.".to_string()]
        );
        assert!(h.presenter.routes().is_empty());
    }

    #[tokio::test]
    async fn test_widget_load_failure_stops_leg() {
        let checkout = Arc::new(SandboxCheckout::new(SECRET.to_vec()));
        let h = harness(checkout.clone());
        h.host.fail_next_injections(1);
        h.transport
            .respond_ok(Endpoint::CreateAdvancePayment, order("order_8"))
            .respond_ok(Endpoint::VerifyAdvancePayment, Value::Null);

        let err = h.service.initiate_advance_payment("42").await.unwrap_err();
        assert!(matches!(err, PaymentError::WidgetLoad(_)));
        assert_eq!(h.presenter.errors(), vec!["Failed to process payment".to_string()]);
        assert!(checkout.opened().is_empty());
        assert_eq!(h.transport.count(Endpoint::VerifyAdvancePayment), 0);
    }

    #[tokio::test]
    async fn test_verify_server_error() {
        let h = harness(Arc::new(SandboxCheckout::new(SECRET.to_vec())));
        h.transport
            .respond_ok(Endpoint::CreateAdvancePayment, order("order_9"))
            .respond(
                Endpoint::VerifyAdvancePayment,
                500,
                json!({"status": "error", "message": "Internal error"}),
            );

        let err = h.service.initiate_advance_payment("42").await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::Verification(ClientError::Api { status: 500, .. })
        ));
        assert_eq!(h.transport.count(Endpoint::VerifyAdvancePayment), 1);
        assert_eq!(h.presenter.errors(), vec!["Failed to process payment".to_string()]);
        assert!(h.presenter.routes().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_skips_redirect() {
        let h = harness(Arc::new(SandboxCheckout::new(SECRET.to_vec())));
        h.transport
            .respond_ok(Endpoint::CreateAdvancePayment, order("order_5"))
            .respond_ok(Endpoint::VerifyAdvancePayment, Value::Null);

        h.service.shutdown();
        let outcome = h.service.initiate_advance_payment("42").await.unwrap();

        assert_eq!(outcome, LegOutcome::Verified);
        assert_eq!(h.transport.count(Endpoint::VerifyAdvancePayment), 1);
        assert!(h.presenter.routes().is_empty());
    }

    /// Widget that blocks until released
    struct GatedWidget {
        gate: Notify,
        inner: SandboxCheckout,
    }

    #[async_trait]
    impl CheckoutWidget for GatedWidget {
        async fn open(&self, options: &CheckoutOptions) -> Result<CheckoutOutcome> {
            self.gate.notified().await;
            self.inner.open(options).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_leg_cannot_run_twice() {
        let widget = Arc::new(GatedWidget {
            gate: Notify::new(),
            inner: SandboxCheckout::new(SECRET.to_vec()),
        });
        let h = harness(widget.clone());
        h.transport
            .respond_ok(Endpoint::CreateAdvancePayment, order("order_6"))
            .respond_ok(Endpoint::VerifyAdvancePayment, Value::Null);

        let (first, second, ()) = futures::join!(
            h.service.initiate_advance_payment("42"),
            h.service.initiate_advance_payment("42"),
            async {
                tokio::task::yield_now().await;
                widget.gate.notify_one();
            }
        );

        assert_eq!(first.unwrap(), LegOutcome::Verified);
        assert!(matches!(
            second,
            Err(PaymentError::LegInFlight { leg: Leg::Advance, ref id }) if id == "42"
        ));
        assert_eq!(h.transport.count(Endpoint::CreateAdvancePayment), 1);

        // claim released once the first leg finished
        h.transport
            .respond_ok(Endpoint::CreateAdvancePayment, order("order_7"))
            .respond_ok(Endpoint::VerifyAdvancePayment, Value::Null);
        widget.gate.notify_one();
        assert_eq!(
            h.service.initiate_advance_payment("42").await.unwrap(),
            LegOutcome::Verified
        );
    }
}
