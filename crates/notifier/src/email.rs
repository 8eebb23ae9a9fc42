//! Outbound email delivery over an HTTP API.

use crate::error::{NotifierError, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Client for the email delivery HTTP API.
#[derive(Debug, Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl EmailClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }

    /// Send one email.
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        let email = OutboundEmail {
            from: &self.from,
            to,
            subject,
            text,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifierError::EmailApi {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        debug!("Sent email to {}", to);
        Ok(())
    }
}
