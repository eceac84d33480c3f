use geosat_core::forms::{ChangePasswordForm, FeedbackForm, ProfileUpdate};
use geosat_core::model::UserPayload;
use geosat_core::{Endpoint, Result, UserProfile, Validate};

use crate::client::{to_body, ApiClient};

impl ApiClient {
    pub async fn get_user(&self) -> Result<UserProfile> {
        let payload: UserPayload = self.data(Endpoint::GetUser, None).await?;
        Ok(payload.user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        update.validate()?;
        self.expect_success(Endpoint::UpdateProfile, to_body(update)?, "Failed to update profile")
            .await?;
        tracing::info!("Profile updated");
        Ok(())
    }

    pub async fn change_password(&self, form: &ChangePasswordForm) -> Result<()> {
        form.validate()?;
        self.expect_success(Endpoint::ChangePassword, to_body(form)?, "Failed to change password")
            .await?;
        tracing::info!("Password changed");
        Ok(())
    }

    pub async fn submit_feedback(&self, form: &FeedbackForm) -> Result<()> {
        form.validate()?;
        self.expect_success(Endpoint::SubmitFeedback, to_body(form)?, "Failed to submit feedback")
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use geosat_core::{ClientConfig, ClientError, HttpMethod, NullPresenter};

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
    async fn test_get_user() {
        let (client, transport) = client();
        transport.respond_ok(
            Endpoint::GetUser,
            json!({"user": {"first_name": "Ana", "last_name": "Rao", "email": "ana@example.com"}}),
        );

        let user = client.get_user().await.unwrap();
        assert_eq!(user.first_name, "Ana");
        assert!(user.phone.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_uses_put() {
        let (client, transport) = client();
        transport.respond_ok(Endpoint::UpdateProfile, Value::Null);

        let update = ProfileUpdate {
            fname: "Ana".into(),
            lname: "Rao".into(),
            phone: "9999999999".into(),
        };
        client.update_profile(&update).await.unwrap();

        let sent = &transport.requests_to(Endpoint::UpdateProfile)[0];
        assert_eq!(sent.method, HttpMethod::Put);
        assert_eq!(
            sent.body,
            Some(json!({"fname": "Ana", "lname": "Rao", "phone": "9999999999"}))
        );
    }

    #[tokio::test]
    async fn test_feedback_comment_is_trimmed() {
        let (client, transport) = client();
        transport.respond_ok(Endpoint::SubmitFeedback, Value::Null);

        client
            .submit_feedback(&FeedbackForm::new(4, "  sharp imagery \n"))
            .await
            .unwrap();

        let body = transport.requests_to(Endpoint::SubmitFeedback)[0].body.clone();
        assert_eq!(body, Some(json!({"rating": 4, "comment": "sharp imagery"})));
    }

    #[tokio::test]
    async fn test_rejected_change_password() {
        let (client, transport) = client();
        transport.respond(
            Endpoint::ChangePassword,
            200,
            json!({"status": "error", "message": "Current password is incorrect"}),
        );

        let err = client
            .change_password(&ChangePasswordForm {
                current_password: "oldpassword".into(),
                new_password: "newpassword".into(),
                confirm_password: "newpassword".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rejected(ref m) if m == "Current password is incorrect"));
    }
}
