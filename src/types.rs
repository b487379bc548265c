use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

use crate::ledger::ExternalRef;

pub type Uid = i64;
pub type Bid = i64;
pub type Tid = i64;
pub type Nid = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
	Student,
	Faculty,
	Librarian,
}

#[derive(Debug, Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Role::Student => "Student",
			Role::Faculty => "Faculty",
			Role::Librarian => "Librarian",
		}
	}
}

impl std::fmt::Display for Role {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Role {
	type Err = UnknownRole;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.trim().to_lowercase().as_str() {
			"student" => Role::Student,
			"faculty" => Role::Faculty,
			"librarian" => Role::Librarian,
			_ => return Err(UnknownRole(s.to_string())),
		})
	}
}

impl TryFrom<String> for Role {
	type Error = UnknownRole;
	fn try_from(s: String) -> Result<Self, Self::Error> {
		s.parse()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxKind {
	Issue,
	Return,
}

#[derive(Debug, Error)]
#[error("unknown transaction kind `{0}`")]
pub struct UnknownTxKind(pub String);

impl TxKind {
	pub fn as_str(self) -> &'static str {
		match self {
			TxKind::Issue => "ISSUE",
			TxKind::Return => "RETURN",
		}
	}
}

impl TryFrom<String> for TxKind {
	type Error = UnknownTxKind;
	fn try_from(s: String) -> Result<Self, Self::Error> {
		match s.as_str() {
			"ISSUE" => Ok(TxKind::Issue),
			"RETURN" => Ok(TxKind::Return),
			_ => Err(UnknownTxKind(s)),
		}
	}
}

/// A registered library member or librarian.
///
/// The password hash never leaves the server: it is skipped on serialization.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
	#[sqlx(rename = "id")]
	#[serde(rename = "id")]
	pub uid: Uid,
	pub name: String,
	pub email: String,
	#[serde(skip_serializing)]
	pub pass_hash: String,
	#[sqlx(try_from = "String")]
	pub role: Role,
	pub contact: Option<String>,
	pub joined_date: DateTime<Utc>,
	pub leave_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
	#[sqlx(rename = "id")]
	#[serde(rename = "id")]
	pub bid: Bid,
	pub title: String,
	pub author: String,
	pub category: String,
	pub total_copies: i64,
	pub available_copies: i64,
	pub image_url: Option<String>,
}

/// One row of the transaction log.
///
/// An ISSUE row with no `return_date` is an open loan. A RETURN row repeats
/// the issue date of the loan it closes.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	pub id: Tid,
	pub user_id: Uid,
	pub book_id: Bid,
	#[sqlx(try_from = "String")]
	pub kind: TxKind,
	pub issue_date: DateTime<Utc>,
	pub due_date: Option<DateTime<Utc>>,
	pub return_date: Option<DateTime<Utc>>,
	pub fine_amount: i64,
	pub tx_hash: Option<String>,
	pub block_number: Option<i64>,
	pub gas_used: Option<i64>,
}

impl Transaction {
	pub fn is_open(&self) -> bool {
		self.kind == TxKind::Issue && self.return_date.is_none()
	}

	pub fn external_ref(&self) -> Option<ExternalRef> {
		self.tx_hash.as_ref().map(|hash| ExternalRef {
			tx_hash: hash.clone(),
			block_number: self.block_number,
			gas_used: self.gas_used,
		})
	}
}

/// A transaction joined with the display fields of its book and user.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
	#[sqlx(flatten)]
	#[serde(flatten)]
	pub tx: Transaction,
	pub title: String,
	pub author: String,
	pub user_name: String,
	#[sqlx(try_from = "String")]
	pub user_role: Role,
	// filled in after the query, against the clock
	#[sqlx(default)]
	pub overdue: bool,
	#[sqlx(default)]
	pub accrued_fine: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	pub id: Nid,
	pub user_id: Uid,
	pub message: String,
	pub read: bool,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
	pub eligible: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
	pub total_books: i64,
	pub total_stock: i64,
	pub active_issues: i64,
	pub total_fines: i64,
	pub total_users: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFailure {
	pub book_id: Bid,
	pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReport {
	pub issued: Vec<Transaction>,
	pub failed: Vec<CheckoutFailure>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormRegister {
	pub name: Option<String>,
	pub email: Option<String>,
	pub password: Option<String>,
	pub role: Option<String>,
	pub contact: Option<String>,
	pub leave_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct FormLogin {
	pub email: String,
	pub password: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
	pub title: Option<String>,
	pub author: Option<String>,
	pub category: Option<String>,
	pub total_copies: Option<i64>,
	pub available_copies: Option<i64>,
	pub image_url: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchQuery {
	pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FormIssue {
	pub user_id: Uid,
	pub book_id: Bid,
	pub external_ref: Option<ExternalRef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FormReturn {
	pub user_id: Uid,
	pub book_id: Bid,
	pub fine_override: Option<i64>,
	pub external_ref: Option<ExternalRef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FormCartItem {
	pub book_id: Bid,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormCheckout {
	pub external_ref: Option<ExternalRef>,
}
