//! Authenticated API Client
//!
//! Wraps every request with the session's bearer token. A 401 on an
//! authenticated endpoint triggers one token refresh and exactly one retry;
//! if the refresh fails the session is cleared and the user is sent to login.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use geosat_core::model::{RefreshedTokens, TokenPayload};
use geosat_core::{
    ClientConfig, ClientError, Endpoint, Endpoints, Envelope, HttpMethod, Presenter, Result, Route,
};

use crate::session::Session;
use crate::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

/// Backend client bound to one session
pub struct ApiClient {
    endpoints: Endpoints,
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    presenter: Arc<dyn Presenter>,

    /// Serialises token refreshes
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Create a client using the reqwest transport
    pub fn new(
        config: &ClientConfig,
        session: Arc<Session>,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        Self::with_transport(config, session, transport, presenter)
    }

    pub fn with_transport(
        config: &ClientConfig,
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self> {
        Ok(Self {
            endpoints: config.endpoints()?,
            session,
            transport,
            presenter,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn presenter(&self) -> &Arc<dyn Presenter> {
        &self.presenter
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request through the auth interceptor and return the raw response
    pub async fn send(&self, endpoint: Endpoint, body: Option<Value>) -> Result<ApiResponse> {
        let authenticated = endpoint.requires_auth();
        let token = if authenticated {
            self.session.access_token().await?
        } else {
            None
        };

        let request = ApiRequest {
            method: endpoint.method(),
            url: self.endpoints.url(endpoint)?,
            bearer: token.clone(),
            body,
        };

        tracing::debug!(endpoint = endpoint.path(), method = ?request.method, "Sending request");
        let response = self.transport.send(&request).await?;

        if !(authenticated && response.is_unauthorized()) {
            return Ok(response);
        }

        tracing::debug!(endpoint = endpoint.path(), "Got 401, refreshing access token");
        let fresh = self.refresh_access_token(token.as_deref()).await?;

        let retry = ApiRequest {
            bearer: Some(fresh),
            ..request
        };
        let response = self.transport.send(&retry).await?;
        if response.is_unauthorized() {
            tracing::warn!(endpoint = endpoint.path(), "Still unauthorized after token refresh");
            return Err(ClientError::Unauthorized);
        }
        Ok(response)
    }

    /// Send and decode the response envelope
    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<Envelope<T>> {
        self.send(endpoint, body).await?.into_envelope()
    }

    /// Send and unwrap `data` from a successful envelope
    pub async fn data<T: DeserializeOwned>(&self, endpoint: Endpoint, body: Option<Value>) -> Result<T> {
        self.call(endpoint, body).await?.into_data()
    }

    /// Send and require a `success` envelope, ignoring `data`
    pub async fn expect_success(&self, endpoint: Endpoint, body: Option<Value>, fallback: &str) -> Result<()> {
        let envelope: Envelope<Value> = self.call(endpoint, body).await?;
        if envelope.is_success() {
            Ok(())
        } else {
            Err(ClientError::Rejected(envelope.message_or(fallback)))
        }
    }

    /// Obtain a usable access token after `stale` was rejected.
    ///
    /// Runs at most one refresh at a time; a caller that waited while another
    /// request rotated the token reuses the new token instead of refreshing again.
    /// If that other refresh failed, the waiter gets `SessionExpired` and the
    /// presenter is not told twice.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        match (self.session.access_token().await?, stale) {
            (Some(current), _) if Some(current.as_str()) != stale => {
                tracing::debug!("Access token already rotated by a concurrent refresh");
                return Ok(current);
            }
            (None, Some(_)) => {
                tracing::debug!("Session already ended by a concurrent refresh");
                return Err(ClientError::SessionExpired(
                    "session ended while waiting for token refresh".into(),
                ));
            }
            _ => {}
        }

        match self.exchange_refresh_token().await {
            Ok(access) => {
                self.session.set_access_token(&access).await?;
                tracing::info!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                self.session.logout().await?;
                self.presenter.navigate(Route::Login);
                Err(ClientError::SessionExpired(e.to_string()))
            }
        }
    }

    async fn exchange_refresh_token(&self) -> Result<String> {
        let refresh = self
            .session
            .refresh_token()
            .await?
            .ok_or_else(|| ClientError::SessionExpired("no refresh token stored".into()))?;

        let request = ApiRequest {
            method: HttpMethod::Post,
            url: self.endpoints.url(Endpoint::RefreshToken)?,
            bearer: None,
            body: Some(json!({ "refresh_token": refresh })),
        };

        let tokens = self
            .transport
            .send(&request)
            .await?
            .into_envelope::<TokenPayload<RefreshedTokens>>()?
            .into_data()?
            .tokens;

        if let Some(rotated) = tokens.refresh.as_deref() {
            self.session.set_refresh_token(rotated).await?;
        }
        Ok(tokens.access)
    }
}

/// Serialize a request body
pub(crate) fn to_body<S: Serialize>(value: &S) -> Result<Option<Value>> {
    Ok(Some(serde_json::to_value(value)?))
}
