use std::sync::Arc;

use sqlx::SqlitePool;

use crate::clock::{Clock, SystemClock};
use crate::error::{LibraryError, Result};
use crate::notify::Notifier;
use crate::types::{Account, Bid, Book, Uid};

/// The lending service: catalog, accounts, loans, cart and notifications
/// over one SQLite pool.
///
/// Methods are spread over the modules that own each concern; this type only
/// holds the shared handles.
#[derive(Clone)]
pub struct Library {
	pub(crate) db: SqlitePool,
	pub(crate) clock: Arc<dyn Clock>,
	pub(crate) notifier: Notifier,
}

pub type SharedState = Arc<Library>;

impl Library {
	pub fn new(db: SqlitePool, notifier: Notifier) -> Self {
		Library { db, clock: Arc::new(SystemClock), notifier }
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn db(&self) -> &SqlitePool {
		&self.db
	}

	pub(crate) async fn find_account(&self, uid: Uid) -> Result<Account> {
		sqlx::query_as::<_, Account>(
			"SELECT id, name, email, pass_hash, role, contact, joined_date, leave_date FROM users WHERE id = ?",
		)
		.bind(uid)
		.fetch_optional(&self.db)
		.await?
		.ok_or_else(|| LibraryError::NotFound("User not found".into()))
	}

	pub(crate) async fn find_book(&self, bid: Bid) -> Result<Book> {
		sqlx::query_as::<_, Book>(
			"SELECT id, title, author, category, total_copies, available_copies, image_url FROM books WHERE id = ?",
		)
		.bind(bid)
		.fetch_optional(&self.db)
		.await?
		.ok_or_else(|| LibraryError::NotFound("Book not found".into()))
	}
}
