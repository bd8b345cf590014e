//! Mailjet HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::message::{Email, Mailbox};
use super::notifier::{MailTransport, NotifierError};

/// Mailjet v3.1 send endpoint
pub const DEFAULT_API_URL: &str = "https://api.mailjet.com/v3.1/send";

/// Sends email through the Mailjet send API
#[derive(Debug, Clone)]
pub struct MailjetTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    #[serde(rename = "Messages")]
    messages: Vec<SendMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    #[serde(rename = "From")]
    from: &'a Mailbox,
    #[serde(rename = "To")]
    to: &'a [Mailbox],
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "TextPart")]
    text_part: &'a str,
}

impl MailjetTransport {
    /// Create a transport for the default Mailjet endpoint
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::with_api_url(api_key, api_secret, DEFAULT_API_URL)
    }

    /// Point the transport at a different endpoint
    pub fn with_api_url(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Get the send endpoint
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// JSON body for a send request
    pub fn payload(email: &Email) -> Result<serde_json::Value, NotifierError> {
        let request = SendRequest {
            messages: vec![SendMessage {
                from: &email.from,
                to: &email.to,
                subject: &email.subject,
                text_part: &email.text,
            }],
        };

        serde_json::to_value(&request).map_err(|e| NotifierError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for MailjetTransport {
    async fn deliver(&self, email: &Email) -> Result<(), NotifierError> {
        let payload = Self::payload(email)?;

        let response = self
            .client
            .post(&self.api_url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::Transport(format!("Failed to send email: {}", e)))?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(status = %status, error = %e, "Failed to read mail provider response");
                format!("<unreadable response body: {}>", e)
            }
        };

        if !status.is_success() {
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(status = %status, "Email sent");
        tracing::debug!(response = %body, "Mail provider response");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one request, reply with `response` verbatim, then close
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // The JSON payload ends the request
            while !request.ends_with(b"}]}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/send", addr)
    }

    fn email() -> Email {
        Email {
            from: Mailbox::named("monitor@example.com", "Sam"),
            to: vec![Mailbox::new("one@example.com")],
            subject: "Host down".to_string(),
            text: "Hi".to_string(),
        }
    }

    #[test]
    fn test_payload_shape() {
        let payload = MailjetTransport::payload(&email()).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "Messages": [{
                    "From": { "Email": "monitor@example.com", "Name": "Sam" },
                    "To": [{ "Email": "one@example.com" }],
                    "Subject": "Host down",
                    "TextPart": "Hi"
                }]
            })
        );
    }

    #[test]
    fn test_default_endpoint() {
        let transport = MailjetTransport::new("key", "secret");
        assert_eq!(transport.api_url(), DEFAULT_API_URL);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Nothing listens on port 9 of localhost
        let transport = MailjetTransport::with_api_url("key", "secret", "http://127.0.0.1:9/send");
        let err = transport.deliver(&email()).await.unwrap_err();
        assert!(matches!(err, NotifierError::Transport(_)));
    }

    #[tokio::test]
    async fn test_rejected_status_carries_body() {
        let url = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 12\r\nConnection: close\r\n\r\nbad api key!",
        )
        .await;
        let transport = MailjetTransport::with_api_url("key", "secret", url);

        let err = transport.deliver(&email()).await.unwrap_err();
        match err {
            NotifierError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad api key!");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncated_body_is_reported() {
        // Promises 100 bytes, sends 5
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\noops!",
        )
        .await;
        let transport = MailjetTransport::with_api_url("key", "secret", url);

        let err = transport.deliver(&email()).await.unwrap_err();
        match err {
            NotifierError::Rejected { status, body } => {
                assert_eq!(status, 500);
                assert!(body.starts_with("<unreadable response body"), "body was {:?}", body);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_status_is_ok() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        )
        .await;
        let transport = MailjetTransport::with_api_url("key", "secret", url);

        assert!(transport.deliver(&email()).await.is_ok());
    }
}
