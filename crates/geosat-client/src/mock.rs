//! Mock Transport
//!
//! Scripted backend for tests and demos. Responses are matched by endpoint;
//! queued responses are used first, then the sticky default for that endpoint.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use geosat_core::{Endpoint, Result};

use crate::transport::{ApiRequest, ApiResponse, Transport};

#[derive(Default)]
struct Script {
    queued: HashMap<Endpoint, VecDeque<ApiResponse>>,
    sticky: HashMap<Endpoint, ApiResponse>,
    requests: Vec<(Endpoint, ApiRequest)>,
}

/// Transport that answers from a script and records every request
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<Script>,
}

const ALL_ENDPOINTS: [Endpoint; 17] = [
    Endpoint::Login,
    Endpoint::Signup,
    Endpoint::ForgotPassword,
    Endpoint::VerifyOtp,
    Endpoint::RefreshToken,
    Endpoint::RequestSatelliteImage,
    Endpoint::GetUser,
    Endpoint::UpdateProfile,
    Endpoint::ChangePassword,
    Endpoint::CreateAdvancePayment,
    Endpoint::VerifyAdvancePayment,
    Endpoint::CreateFinalPayment,
    Endpoint::VerifyFinalPayment,
    Endpoint::PaymentStatus,
    Endpoint::SatelliteImages,
    Endpoint::SubmitFeedback,
    Endpoint::PaymentHistory,
];

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response for `endpoint`
    pub fn respond(&self, endpoint: Endpoint, status: u16, body: Value) -> &Self {
        self.lock()
            .queued
            .entry(endpoint)
            .or_default()
            .push_back(ApiResponse::new(status, body));
        self
    }

    /// Queue a `{status: success, data}` response
    pub fn respond_ok(&self, endpoint: Endpoint, data: Value) -> &Self {
        self.respond(endpoint, 200, json!({"status": "success", "data": data}))
    }

    /// Answer every otherwise unscripted call to `endpoint` with this response
    pub fn always(&self, endpoint: Endpoint, status: u16, body: Value) -> &Self {
        self.lock()
            .sticky
            .insert(endpoint, ApiResponse::new(status, body));
        self
    }

    /// All requests sent so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn requests_to(&self, endpoint: Endpoint) -> Vec<ApiRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.lock().requests.iter().filter(|(e, _)| *e == endpoint).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let path = request.url.path();
        let Some(endpoint) = ALL_ENDPOINTS
            .into_iter()
            .find(|e| path.ends_with(&format!("/{}", e.path())))
        else {
            return Ok(ApiResponse::new(
                404,
                json!({"status": "error", "message": format!("no route for {}", path)}),
            ));
        };

        let mut script = self.lock();
        script.requests.push((endpoint, request.clone()));

        let queued = script.queued.get_mut(&endpoint).and_then(VecDeque::pop_front);
        let response = queued
            .or_else(|| script.sticky.get(&endpoint).cloned())
            .unwrap_or_else(|| {
                ApiResponse::new(
                    404,
                    json!({"status": "error", "message": format!("no scripted response for {}", endpoint.path())}),
                )
            });
        Ok(response)
    }
}
