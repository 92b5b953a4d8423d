use async_trait::async_trait;
use caldera_core::mailer::{EmailMessage, EmailSender};
use caldera_core::{CoreError, CoreResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Sends transactional email through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendEmailSender {
    http: Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendEmailSender {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, from_address: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> CoreResult<String> {
        let body = SendEmailBody {
            from: message.from.as_deref().unwrap_or(&self.from_address),
            to: [message.to.inner().as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .http
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "email provider unreachable");
                CoreError::ExternalError(format!("email provider unreachable: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, detail = %detail, "email provider rejected message");
            return Err(CoreError::ExternalError(format!(
                "email provider returned {status}"
            )));
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| CoreError::ExternalError(format!("unexpected email provider response: {e}")))?;

        info!(message_id = %sent.id, to = %message.to.redacted_email(), "email accepted by provider");
        Ok(sent.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldera_shared::Masked;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(from: Option<&str>) -> EmailMessage {
        EmailMessage {
            to: Masked::new("jane@example.com".to_string()),
            subject: "Your booking".to_string(),
            html: "<p>Hello</p>".to_string(),
            from: from.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_send_posts_to_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({
                "from": "noreply@caldera.travel",
                "to": ["jane@example.com"],
                "subject": "Your booking",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "msg_123" })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = ResendEmailSender::new(server.uri(), "re_test", "noreply@caldera.travel");
        let id = sender.send(&message(None)).await.unwrap();
        assert_eq!(id, "msg_123");
    }

    #[tokio::test]
    async fn test_send_uses_override_sender() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "from": "concierge@caldera.travel" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "msg_456" })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = ResendEmailSender::new(format!("{}/", server.uri()), "re_test", "noreply@caldera.travel");
        let id = sender.send(&message(Some("concierge@caldera.travel"))).await.unwrap();
        assert_eq!(id, "msg_456");
    }

    #[tokio::test]
    async fn test_provider_error_is_external() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let sender = ResendEmailSender::new(server.uri(), "re_test", "noreply@caldera.travel");
        let err = sender.send(&message(None)).await.unwrap_err();
        assert!(matches!(err, CoreError::ExternalError(_)));
    }
}
