use serde_json::Value;

use geosat_core::forms::{ForgotPasswordForm, GoogleSignup, LoginForm, ResetPasswordForm, SignupForm};
use geosat_core::model::TokenPayload;
use geosat_core::{AuthTokens, ClientError, Endpoint, Envelope, Result, Validate};

use crate::client::{to_body, ApiClient};

impl ApiClient {
    /// Log in and store the issued token pair in the session
    pub async fn login(&self, form: &LoginForm) -> Result<AuthTokens> {
        form.validate()?;

        let envelope: Envelope<TokenPayload<AuthTokens>> = self
            .send(Endpoint::Login, to_body(form)?)
            .await?
            .into_envelope()
            .map_err(|e| match e {
                ClientError::Api { message, .. } => ClientError::Rejected(message),
                other => other,
            })?;
        if !envelope.is_success() {
            return Err(ClientError::Rejected(envelope.message_or("Invalid credentials")));
        }
        let tokens = envelope
            .data
            .ok_or_else(|| ClientError::Decode("login response has no tokens".into()))?
            .tokens;

        self.session().login(&tokens).await?;
        tracing::info!("Logged in");
        Ok(tokens)
    }

    /// Register a new account. The user logs in separately afterwards.
    pub async fn signup(&self, form: &SignupForm) -> Result<()> {
        form.validate()?;
        self.expect_success(Endpoint::Signup, to_body(form)?, "Registration failed")
            .await?;
        tracing::info!("Account registered");
        Ok(())
    }

    /// Register with a third-party identity token.
    ///
    /// If the backend answers with a token pair the session is logged in.
    pub async fn signup_with_google(&self, id_token: &str, platform: &str) -> Result<bool> {
        if id_token.is_empty() {
            return Err(ClientError::Rejected("No ID token received".into()));
        }
        let body = GoogleSignup {
            google_token: id_token.to_string(),
            platform: platform.to_string(),
        };

        let envelope: Envelope<Value> = self.call(Endpoint::Signup, to_body(&body)?).await?;
        if !envelope.is_success() {
            return Err(ClientError::Rejected(envelope.message_or("Google signup failed")));
        }

        let tokens = envelope
            .data
            .and_then(|data| serde_json::from_value::<TokenPayload<AuthTokens>>(data).ok());
        match tokens {
            Some(payload) => {
                self.session().login(&payload.tokens).await?;
                tracing::info!(platform, "Signed up with identity token and logged in");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Ask the backend to send a password reset OTP
    pub async fn forgot_password(&self, form: &ForgotPasswordForm) -> Result<()> {
        form.validate()?;
        self.expect_success(Endpoint::ForgotPassword, to_body(form)?, "Failed to send OTP")
            .await
    }

    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<()> {
        form.validate()?;
        self.expect_success(Endpoint::VerifyOtp, to_body(form)?, "Failed to reset password")
            .await
    }

    /// Forget the stored tokens. The backend keeps no server-side session.
    pub async fn logout(&self) -> Result<()> {
        self.session().logout().await?;
        tracing::info!("Logged out");
        Ok(())
    }
}
