//! Issue and return.
//!
//! The only code that moves `available_copies` or writes transaction and
//! notification rows. A loan goes `NONE -> ISSUED -> RETURNED`: an open
//! ISSUE row is the ISSUED state, and returning closes that row and appends a
//! RETURN row carrying the same issue date. Overdue is never stored.
//!
//! Each operation runs in one database transaction whose first statement is a
//! write, so SQLite hands it the write lock before anything is read. Two
//! requests for the last copy cannot both pass the guarded decrement.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection};

use crate::error::{LibraryError, Result};
use crate::ledger::{self, ExternalRef};
use crate::library::Library;
use crate::notify;
use crate::policy;
use crate::types::{Analytics, Bid, Eligibility, Transaction, TransactionView, TxKind, Uid};

const TX_COLUMNS: &str =
	"id, user_id, book_id, kind, issue_date, due_date, return_date, fine_amount, tx_hash, block_number, gas_used";

const VIEW_SELECT: &str = r#"
SELECT
	t.id, t.user_id, t.book_id, t.kind, t.issue_date, t.due_date, t.return_date,
	t.fine_amount, t.tx_hash, t.block_number, t.gas_used,
	b.title, b.author, u.name AS user_name, u.role AS user_role
FROM transactions t
JOIN books b ON t.book_id = b.id
JOIN users u ON t.user_id = u.id
"#;

async fn count_open<'e, E>(db: E, uid: Uid) -> Result<i64>
where
	E: sqlx::Executor<'e, Database = Sqlite>,
{
	let open: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM transactions WHERE user_id = ? AND kind = 'ISSUE' AND return_date IS NULL",
	)
	.bind(uid)
	.fetch_one(db)
	.await?;
	Ok(open)
}

async fn holds_copy<'e, E>(db: E, uid: Uid, bid: Bid) -> Result<bool>
where
	E: sqlx::Executor<'e, Database = Sqlite>,
{
	let open: i64 = sqlx::query_scalar(
		r#"
SELECT COUNT(*) FROM transactions
WHERE user_id = ? AND book_id = ? AND kind = 'ISSUE' AND return_date IS NULL
		"#,
	)
	.bind(uid)
	.bind(bid)
	.fetch_one(db)
	.await?;
	Ok(open > 0)
}

async fn store_notification(
	conn: &mut SqliteConnection,
	uid: Uid,
	message: &str,
	now: DateTime<Utc>,
) -> Result<()> {
	sqlx::query("INSERT INTO notifications (user_id, message, read, created_at) VALUES (?, ?, false, ?)")
		.bind(uid)
		.bind(message)
		.bind(now)
		.execute(conn)
		.await?;
	Ok(())
}

async fn insert_row(
	conn: &mut SqliteConnection,
	row: NewRow<'_>,
) -> Result<Transaction> {
	let inserted = sqlx::query_as::<_, Transaction>(&format!(
		r#"
INSERT INTO transactions
	(user_id, book_id, kind, issue_date, due_date, return_date, fine_amount, tx_hash, block_number, gas_used)
VALUES
	(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
RETURNING {TX_COLUMNS}
		"#
	))
	.bind(row.uid)
	.bind(row.bid)
	.bind(row.kind.as_str())
	.bind(row.issue_date)
	.bind(row.due_date)
	.bind(row.return_date)
	.bind(row.fine)
	.bind(row.external.map(|e| e.tx_hash.as_str()))
	.bind(row.external.and_then(|e| e.block_number))
	.bind(row.external.and_then(|e| e.gas_used))
	.fetch_one(conn)
	.await?;
	Ok(inserted)
}

struct NewRow<'a> {
	uid: Uid,
	bid: Bid,
	kind: TxKind,
	issue_date: DateTime<Utc>,
	due_date: Option<DateTime<Utc>>,
	return_date: Option<DateTime<Utc>>,
	fine: i64,
	external: Option<&'a ExternalRef>,
}

impl Library {
	pub async fn check_eligibility(&self, uid: Uid, bid: Bid) -> Result<Eligibility> {
		let account = self.find_account(uid).await?;
		let open = count_open(&self.db, uid).await?;
		if !policy::is_eligible(account.role, open) {
			return Ok(Eligibility { eligible: false, message: Some(policy::limit_message(account.role)) });
		}
		if holds_copy(&self.db, uid, bid).await? {
			return Ok(Eligibility {
				eligible: false,
				message: Some("You already have this book issued.".into()),
			});
		}
		Ok(Eligibility { eligible: true, message: None })
	}

	pub async fn issue(&self, uid: Uid, bid: Bid, external: Option<ExternalRef>) -> Result<Transaction> {
		let external = ledger::normalize(external)?;
		let account = self.find_account(uid).await?;

		// early refusal with the policy's wording; re-checked under the lock below
		let eligibility = self.check_eligibility(uid, bid).await?;
		if !eligibility.eligible {
			return Err(LibraryError::Conflict(eligibility.message.unwrap_or_default()));
		}

		let now = self.clock.now();
		let due = policy::due_date(account.role, now);
		let mut tx = self.db.begin().await?;

		let taken = sqlx::query(
			"UPDATE books SET available_copies = available_copies - 1 WHERE id = ? AND available_copies > 0",
		)
		.bind(bid)
		.execute(&mut *tx)
		.await?;
		if taken.rows_affected() == 0 {
			let known: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?")
				.bind(bid)
				.fetch_optional(&mut *tx)
				.await?;
			return Err(match known {
				None => LibraryError::NotFound("Book not found".into()),
				Some(_) => LibraryError::Conflict("No copies available".into()),
			});
		}

		if !policy::is_eligible(account.role, count_open(&mut *tx, uid).await?) {
			return Err(LibraryError::Conflict(policy::limit_message(account.role)));
		}
		if holds_copy(&mut *tx, uid, bid).await? {
			return Err(LibraryError::Conflict("You already have this book issued.".into()));
		}

		let (title, author): (String, String) = sqlx::query_as("SELECT title, author FROM books WHERE id = ?")
			.bind(bid)
			.fetch_one(&mut *tx)
			.await?;

		let issued = insert_row(
			&mut tx,
			NewRow {
				uid,
				bid,
				kind: TxKind::Issue,
				issue_date: now,
				due_date: Some(due),
				return_date: None,
				fine: 0,
				external: external.as_ref(),
			},
		)
		.await?;

		let message = notify::issue_message(&account.name, account.role, &title, &author, due);
		store_notification(&mut tx, uid, &message, now).await?;
		tx.commit().await?;

		tracing::info!(tid = issued.id, uid, bid, due = %due, "book issued");
		self.notifier.deliver(account.contact.as_deref(), &message).await;
		Ok(issued)
	}

	/// Closes the user's most recent open loan of the book.
	///
	/// `fine_override` replaces the computed fine, for when payment was
	/// already collected elsewhere.
	pub async fn return_book(
		&self,
		uid: Uid,
		bid: Bid,
		fine_override: Option<i64>,
		external: Option<ExternalRef>,
	) -> Result<Transaction> {
		if fine_override.is_some_and(|f| f < 0) {
			return Err(LibraryError::Validation("Fine must not be negative".into()));
		}
		let external = ledger::normalize(external)?;
		let account = self.find_account(uid).await?;
		let now = self.clock.now();
		let mut tx = self.db.begin().await?;

		let closed = sqlx::query_as::<_, Transaction>(&format!(
			r#"
UPDATE transactions SET return_date = ?
WHERE id = (
	SELECT id FROM transactions
	WHERE user_id = ? AND book_id = ? AND kind = 'ISSUE' AND return_date IS NULL
	ORDER BY issue_date DESC, id DESC
	LIMIT 1
)
RETURNING {TX_COLUMNS}
			"#
		))
		.bind(now)
		.bind(uid)
		.bind(bid)
		.fetch_optional(&mut *tx)
		.await?
		.ok_or_else(|| LibraryError::NotFound("No active issue record found".into()))?;

		let fine = fine_override.unwrap_or_else(|| {
			closed
				.due_date
				.map(|due| policy::compute_fine(account.role, due, now))
				.unwrap_or(0)
		});

		let restocked = sqlx::query(
			"UPDATE books SET available_copies = available_copies + 1 WHERE id = ? AND available_copies < total_copies",
		)
		.bind(bid)
		.execute(&mut *tx)
		.await?;
		if restocked.rows_affected() == 0 {
			tracing::warn!(bid, "returned copy not restocked, book already at total copies");
		}

		let returned = insert_row(
			&mut tx,
			NewRow {
				uid,
				bid,
				kind: TxKind::Return,
				issue_date: closed.issue_date,
				due_date: closed.due_date,
				return_date: Some(now),
				fine,
				external: external.as_ref(),
			},
		)
		.await?;

		let title: String = sqlx::query_scalar("SELECT title FROM books WHERE id = ?")
			.bind(bid)
			.fetch_one(&mut *tx)
			.await?;
		let message = notify::return_message(&title, fine, external.as_ref().map(|e| e.tx_hash.as_str()));
		store_notification(&mut tx, uid, &message, now).await?;
		tx.commit().await?;

		tracing::info!(tid = returned.id, uid, bid, fine, "book returned");
		self.notifier.deliver(account.contact.as_deref(), &message).await;
		Ok(returned)
	}

	/// Most recent issue date first.
	pub async fn history(&self, uid: Uid) -> Result<Vec<TransactionView>> {
		let rows = sqlx::query_as::<_, TransactionView>(&format!(
			"{VIEW_SELECT} WHERE t.user_id = ? ORDER BY t.issue_date DESC, t.id DESC"
		))
		.bind(uid)
		.fetch_all(&self.db)
		.await?;
		Ok(self.annotate(rows))
	}

	pub async fn all_transactions(&self) -> Result<Vec<TransactionView>> {
		let rows = sqlx::query_as::<_, TransactionView>(&format!(
			"{VIEW_SELECT} ORDER BY t.issue_date DESC, t.id DESC"
		))
		.fetch_all(&self.db)
		.await?;
		Ok(self.annotate(rows))
	}

	/// Open loans, soonest due first, with the fine accrued so far.
	pub async fn open_loans(&self, uid: Uid) -> Result<Vec<TransactionView>> {
		let rows = sqlx::query_as::<_, TransactionView>(&format!(
			"{VIEW_SELECT} WHERE t.user_id = ? AND t.kind = 'ISSUE' AND t.return_date IS NULL ORDER BY t.due_date, t.id"
		))
		.bind(uid)
		.fetch_all(&self.db)
		.await?;
		Ok(self.annotate(rows))
	}

	fn annotate(&self, mut rows: Vec<TransactionView>) -> Vec<TransactionView> {
		let now = self.clock.now();
		for row in rows.iter_mut().filter(|row| row.tx.is_open()) {
			if let Some(due) = row.tx.due_date {
				row.overdue = policy::is_overdue(due, now);
				row.accrued_fine = policy::compute_fine(row.user_role, due, now);
			}
		}
		rows
	}

	pub async fn analytics(&self) -> Result<Analytics> {
		let (total_books, total_stock, active_issues, total_fines, total_users): (i64, i64, i64, i64, i64) =
			sqlx::query_as(
				r#"
SELECT
	(SELECT COUNT(*) FROM books),
	(SELECT COALESCE(SUM(total_copies), 0) FROM books),
	(SELECT COUNT(*) FROM transactions WHERE kind = 'ISSUE' AND return_date IS NULL),
	(SELECT COALESCE(SUM(fine_amount), 0) FROM transactions),
	(SELECT COUNT(*) FROM users WHERE role != 'Librarian')
				"#,
			)
			.fetch_one(&self.db)
			.await?;
		Ok(Analytics { total_books, total_stock, active_issues, total_fines, total_users })
	}
}
