//! HTTP adapters for the three workflow triggers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::capabilities::{
    CapabilityError, EmailExistenceCheck, FormSubmit, FormSubmitError, NotifyApplicant,
};
use super::domain::SubmissionRecord;
use crate::config::WebhookEndpoint;

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmailExistsResponse {
    #[serde(rename = "emailExists", default)]
    email_exists: bool,
}

/// A manually triggered workflow reachable with a signed JSON `POST`.
#[derive(Debug, Clone)]
pub struct WebhookTrigger {
    http: Client,
    endpoint: WebhookEndpoint,
}

impl WebhookTrigger {
    pub fn new(http: Client, endpoint: WebhookEndpoint) -> Self {
        Self { http, endpoint }
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        body: &T,
    ) -> Result<reqwest::Response, CapabilityError> {
        let response = self
            .http
            .post(self.endpoint.trigger_url())
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Duplicate-registration lookup.
#[derive(Debug, Clone)]
pub struct EmailCheckWebhook(pub WebhookTrigger);

impl EmailCheckWebhook {
    async fn lookup(&self, email: &str) -> Result<bool, CapabilityError> {
        let response = self.0.post_json(&EmailPayload { email }).await?;
        if !response.status().is_success() {
            return Err(CapabilityError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let parsed: EmailExistsResponse = response.json().await?;
        Ok(parsed.email_exists)
    }
}

#[async_trait]
impl EmailExistenceCheck for EmailCheckWebhook {
    async fn email_exists(&self, email: &str) -> bool {
        match self.lookup(email).await {
            Ok(exists) => exists,
            Err(err) => {
                warn!(error = %err, "email check failed, treating address as new");
                false
            }
        }
    }
}

/// Form submission trigger.
#[derive(Debug, Clone)]
pub struct FormSubmitWebhook(pub WebhookTrigger);

#[async_trait]
impl FormSubmit for FormSubmitWebhook {
    async fn submit_form(&self, record: &SubmissionRecord) -> Result<(), FormSubmitError> {
        let response = self.0.post_json(record).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|err| FormSubmitError::Unavailable(err.into()))?;
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        };
        Err(FormSubmitError::Rejected(message))
    }
}

/// QR-code confirmation email trigger.
#[derive(Debug, Clone)]
pub struct QrEmailWebhook(pub WebhookTrigger);

#[async_trait]
impl NotifyApplicant for QrEmailWebhook {
    async fn notify(&self, email: &str) -> Result<(), CapabilityError> {
        let response = self.0.post_json(&EmailPayload { email }).await?;
        let status = response.status();
        if status.is_success() {
            info!("QR code email dispatched");
            Ok(())
        } else {
            Err(CapabilityError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}
