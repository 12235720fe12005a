//! Store notifications
//!
//! Supports:
//! - In-app notifications stored per store
//! - Optional signed webhook delivery of the same payload
//!
//! `notify` is fire-and-forget: delivery runs on a spawned task and failures
//! are only logged.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying base64(HMAC-SHA256(secret, body))
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Notification severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Notification about to be sent
#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub business_id: Uuid,
    pub store_id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub data: Option<Value>,
}

/// Stored notification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoreNotification {
    pub id: Uuid,
    pub business_id: Uuid,
    pub store_id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: String,
    pub data: Option<Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Query for listing a store's notifications
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// Outbound webhook client
#[derive(Clone)]
pub struct WebhookClient {
    url: String,
    secret: String,
    http_client: reqwest::Client,
}

impl WebhookClient {
    pub fn new(url: String, secret: String) -> Self {
        Self {
            url,
            secret,
            http_client: reqwest::Client::new(),
        }
    }

    /// Present only when both url and secret are configured
    pub fn from_config(config: &NotificationConfig) -> Option<Self> {
        match (&config.webhook_url, &config.webhook_secret) {
            (Some(url), Some(secret)) if !url.is_empty() && !secret.is_empty() => {
                Some(Self::new(url.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    pub fn sign(&self, body: &[u8]) -> Result<String, String> {
        sign_payload(&self.secret, body)
    }

    /// POST the notification as JSON with its signature
    pub async fn deliver(&self, notification: &NewNotification) -> Result<(), String> {
        let body = serde_json::to_vec(notification)
            .map_err(|e| format!("Failed to encode notification: {}", e))?;
        let signature = self.sign(&body)?;

        let response = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| format!("Failed to reach webhook: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Webhook responded with {}", response.status()))
        }
    }
}

/// base64(HMAC-SHA256(secret, body))
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("Invalid webhook secret: {}", e))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    webhook: Option<WebhookClient>,
}

impl NotificationService {
    pub fn new(db: PgPool, webhook: Option<WebhookClient>) -> Self {
        Self { db, webhook }
    }

    /// Store and forward in the background
    pub fn notify(&self, notification: NewNotification) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.deliver(&notification).await {
                tracing::warn!(
                    store_id = %notification.store_id,
                    title = %notification.title,
                    error = %e,
                    "Failed to deliver notification"
                );
            }
        });
    }

    async fn deliver(&self, notification: &NewNotification) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO store_notifications (business_id, store_id, title, message, severity, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(notification.business_id)
        .bind(notification.store_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.severity.as_str())
        .bind(&notification.data)
        .execute(&self.db)
        .await?;

        if let Some(webhook) = &self.webhook {
            webhook.deliver(notification).await.map_err(AppError::Internal)?;
        }

        Ok(())
    }

    /// Newest first
    pub async fn list_for_store(
        &self,
        business_id: Uuid,
        store_id: Uuid,
        unread_only: bool,
    ) -> AppResult<Vec<StoreNotification>> {
        let notifications = sqlx::query_as::<_, StoreNotification>(
            r#"
            SELECT id, business_id, store_id, title, message, severity, data, is_read, created_at
            FROM store_notifications
            WHERE business_id = $1 AND store_id = $2 AND (NOT $3 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        )
        .bind(business_id)
        .bind(store_id)
        .bind(unread_only)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_stable_base64() {
        let a = sign_payload("secret", b"{\"title\":\"x\"}").unwrap();
        let b = sign_payload("secret", b"{\"title\":\"x\"}").unwrap();
        assert_eq!(a, b);
        // 32-byte digest encodes to 44 base64 chars
        assert_eq!(a.len(), 44);
        assert_ne!(a, sign_payload("other", b"{\"title\":\"x\"}").unwrap());
    }

    #[test]
    fn test_webhook_requires_url_and_secret() {
        let mut config = NotificationConfig::default();
        assert!(WebhookClient::from_config(&config).is_none());
        config.webhook_url = Some("http://localhost/hook".to_string());
        assert!(WebhookClient::from_config(&config).is_none());
        config.webhook_secret = Some("k".to_string());
        assert!(WebhookClient::from_config(&config).is_some());
    }
}
