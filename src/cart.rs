//! Server-side borrowing cart, one per user.

use crate::error::{LibraryError, Result};
use crate::ledger::ExternalRef;
use crate::library::Library;
use crate::types::{Bid, Book, CheckoutFailure, CheckoutReport, Uid};

impl Library {
	/// Adding a book already in the cart does nothing.
	pub async fn cart_add(&self, uid: Uid, bid: Bid) -> Result<()> {
		self.find_account(uid).await?;
		self.find_book(bid).await?;
		sqlx::query("INSERT OR IGNORE INTO cart_items (user_id, book_id, added_at) VALUES (?, ?, ?)")
			.bind(uid)
			.bind(bid)
			.bind(self.clock.now())
			.execute(&self.db)
			.await?;
		Ok(())
	}

	pub async fn cart_remove(&self, uid: Uid, bid: Bid) -> Result<()> {
		let done = sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND book_id = ?")
			.bind(uid)
			.bind(bid)
			.execute(&self.db)
			.await?;
		if done.rows_affected() == 0 {
			return Err(LibraryError::NotFound("Book is not in the cart".into()));
		}
		Ok(())
	}

	/// Books in the order they were added.
	pub async fn cart(&self, uid: Uid) -> Result<Vec<Book>> {
		let books = sqlx::query_as::<_, Book>(
			r#"
SELECT b.id, b.title, b.author, b.category, b.total_copies, b.available_copies, b.image_url
FROM cart_items c
JOIN books b ON c.book_id = b.id
WHERE c.user_id = ?
ORDER BY c.added_at, c.rowid
			"#,
		)
		.bind(uid)
		.fetch_all(&self.db)
		.await?;
		Ok(books)
	}

	/// Issues every book in the cart. Issued books leave the cart; refused ones
	/// stay and are reported with the reason.
	pub async fn checkout(&self, uid: Uid, external: Option<ExternalRef>) -> Result<CheckoutReport> {
		self.find_account(uid).await?;
		let mut report = CheckoutReport::default();
		for book in self.cart(uid).await? {
			match self.issue(uid, book.bid, external.clone()).await {
				Ok(issued) => {
					self.cart_remove(uid, book.bid).await?;
					report.issued.push(issued);
				}
				Err(err @ (LibraryError::Database(_) | LibraryError::PasswordHash(_))) => return Err(err),
				Err(err) => {
					tracing::debug!(uid, bid = book.bid, error = %err, "checkout item refused");
					report.failed.push(CheckoutFailure { book_id: book.bid, error: err.to_string() });
				}
			}
		}
		tracing::info!(uid, issued = report.issued.len(), failed = report.failed.len(), "checkout");
		Ok(report)
	}
}
