//! Member notifications.
//!
//! Every issue and return stores a notification row inside the same database
//! transaction. Outbound delivery to the member's WhatsApp number happens
//! after commit and is best effort: a failed send is logged and dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

use crate::error::{LibraryError, Result};
use crate::ledger::receipt_id;
use crate::library::Library;
use crate::policy;
use crate::types::{Nid, Notification, Role, Uid};

pub const WHATSAPP_API_BASE: &str = "https://graph.facebook.com/v17.0";

#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("provider rejected message ({status}): {body}")]
	Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
	pub token: String,
	pub phone_id: String,
	pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct WhatsApp {
	http: reqwest::Client,
	config: WhatsAppConfig,
}

impl WhatsApp {
	pub fn new(config: WhatsAppConfig) -> std::result::Result<Self, NotifyError> {
		let http = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
		Ok(WhatsApp { http, config })
	}

	fn endpoint(&self) -> String {
		format!("{}/{}/messages", self.config.api_base.trim_end_matches('/'), self.config.phone_id)
	}

	pub async fn send(&self, to: &str, message: &str) -> std::result::Result<(), NotifyError> {
		let body = json!({
			"messaging_product": "whatsapp",
			"to": to,
			"type": "text",
			"text": { "body": message },
		});
		let response = self
			.http
			.post(self.endpoint())
			.bearer_auth(&self.config.token)
			.json(&body)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(NotifyError::Rejected { status: status.as_u16(), body });
		}
		Ok(())
	}
}

/// Outbound channel for member alerts.
#[derive(Debug, Clone)]
pub enum Notifier {
	/// No provider configured; messages only reach the log.
	Log,
	WhatsApp(WhatsApp),
}

impl Notifier {
	/// Never fails. Errors are logged.
	pub async fn deliver(&self, to: Option<&str>, message: &str) {
		let Some(to) = to.filter(|to| !to.trim().is_empty()) else {
			tracing::debug!("no contact on file, skipping outbound alert");
			return;
		};
		match self {
			Notifier::Log => {
				tracing::info!(to, message, "alert");
			}
			Notifier::WhatsApp(client) => match client.send(to, message).await {
				Ok(()) => tracing::info!(to, "whatsapp alert sent"),
				Err(err) => tracing::warn!(to, error = %err, "whatsapp alert failed"),
			},
		}
	}
}

pub fn issue_message(
	name: &str,
	role: Role,
	title: &str,
	author: &str,
	due: DateTime<Utc>,
) -> String {
	format!(
		"Library Issue Confirmed!\n\n\
		Hello {name},\n\n\
		You have issued:\n\
		{title} by {author}\n\n\
		Due date: {}\n\n\
		Please return the book on time to avoid fines ({}/day).",
		due.format("%Y-%m-%d"),
		policy::daily_rate(role),
	)
}

pub fn return_message(title: &str, fine: i64, tx_hash: Option<&str>) -> String {
	let mut message = format!("Library Return Confirmed!\n\nYou have returned: {title}\nFine applied: {fine}");
	if let Some(hash) = tx_hash {
		message.push_str(&format!("\nReceipt ID: {}...", receipt_id(hash)));
	}
	message
}

impl Library {
	/// Newest first.
	pub async fn notifications(&self, uid: Uid) -> Result<Vec<Notification>> {
		let rows = sqlx::query_as::<_, Notification>(
			r#"
SELECT id, user_id, message, read, created_at
FROM notifications
WHERE user_id = ?
ORDER BY created_at DESC, id DESC
			"#,
		)
		.bind(uid)
		.fetch_all(&self.db)
		.await?;
		Ok(rows)
	}

	pub async fn mark_read(&self, id: Nid) -> Result<()> {
		let done = sqlx::query("UPDATE notifications SET read = true WHERE id = ?")
			.bind(id)
			.execute(&self.db)
			.await?;
		if done.rows_affected() == 0 {
			return Err(LibraryError::NotFound("Notification not found".into()));
		}
		Ok(())
	}
}
