//! Error types for the lending service.

use axum::{
	extract::rejection::{JsonRejection, PathRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum LibraryError {
	/// Missing or malformed input
	#[error("{0}")]
	Validation(String),

	/// Unknown user, book, loan or notification
	#[error("{0}")]
	NotFound(String),

	/// Borrow limit reached, no copies left, book still referenced
	#[error("{0}")]
	Conflict(String),

	/// Unique constraint violation
	#[error("{0}")]
	Integrity(String),

	#[error("{0}")]
	Unauthorized(String),

	#[error("{0}")]
	Forbidden(String),

	#[error("database error: {0}")]
	Database(sqlx::Error),

	#[error("password hashing failed: {0}")]
	PasswordHash(String),
}

impl From<sqlx::Error> for LibraryError {
	fn from(err: sqlx::Error) -> Self {
		match &err {
			sqlx::Error::Database(db) if db.is_unique_violation() => {
				LibraryError::Integrity("Unique constraint violated".into())
			}
			_ => LibraryError::Database(err),
		}
	}
}

impl From<JsonRejection> for LibraryError {
	fn from(rejection: JsonRejection) -> Self {
		tracing::debug!(%rejection, "unreadable request body");
		let message = match rejection {
			JsonRejection::JsonDataError(_) => "Missing required fields".to_string(),
			JsonRejection::JsonSyntaxError(_) => "Malformed JSON body".to_string(),
			JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body".to_string(),
			other => other.body_text(),
		};
		LibraryError::Validation(message)
	}
}

impl From<PathRejection> for LibraryError {
	fn from(rejection: PathRejection) -> Self {
		LibraryError::Validation(rejection.body_text())
	}
}

impl LibraryError {
	pub fn status(&self) -> StatusCode {
		match self {
			LibraryError::Validation(_) | LibraryError::Integrity(_) => StatusCode::BAD_REQUEST,
			LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
			LibraryError::Conflict(_) => StatusCode::CONFLICT,
			LibraryError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			LibraryError::Forbidden(_) => StatusCode::FORBIDDEN,
			LibraryError::Database(_) | LibraryError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for LibraryError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, %status, "request rejected");
		}
		(status, Json(json!({ "error": self.to_string() }))).into_response()
	}
}
