use crate::error::{LibraryError, Result};
use crate::library::Library;
use crate::types::{Bid, Book, BookDraft};

const BOOK_COLUMNS: &str = "id, title, author, category, total_copies, available_copies, image_url";

/// `LIKE` pattern matching `text` anywhere, with wildcards in `text` escaped.
pub fn like_pattern(text: &str) -> String {
	let mut pattern = String::with_capacity(text.len() + 2);
	pattern.push('%');
	for c in text.chars() {
		if matches!(c, '%' | '_' | '\\') {
			pattern.push('\\');
		}
		pattern.push(c);
	}
	pattern.push('%');
	pattern
}

fn non_blank(field: &Option<String>, what: &str) -> Result<()> {
	match field {
		Some(s) if s.trim().is_empty() => Err(LibraryError::Validation(format!("{what} must not be blank"))),
		_ => Ok(()),
	}
}

fn copies_error(err: sqlx::Error) -> LibraryError {
	match &err {
		sqlx::Error::Database(db) if db.is_check_violation() => {
			LibraryError::Validation("Available copies must be between 0 and total copies".into())
		}
		_ => err.into(),
	}
}

impl Library {
	/// Case-insensitive substring search over title, author and category.
	pub async fn search_books(&self, text: Option<&str>) -> Result<Vec<Book>> {
		let text = text.map(str::trim).filter(|t| !t.is_empty());
		let books = match text {
			None => {
				sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))
					.fetch_all(&self.db)
					.await?
			}
			Some(text) => {
				let pattern = like_pattern(text);
				sqlx::query_as::<_, Book>(&format!(
					r#"
SELECT {BOOK_COLUMNS}
FROM books
WHERE title LIKE ?1 ESCAPE '\'
	OR author LIKE ?1 ESCAPE '\'
	OR category LIKE ?1 ESCAPE '\'
ORDER BY id
					"#
				))
				.bind(pattern)
				.fetch_all(&self.db)
				.await?
			}
		};
		Ok(books)
	}

	pub async fn book(&self, bid: Bid) -> Result<Book> {
		self.find_book(bid).await
	}

	/// New books start with every copy on the shelf; `available_copies` in the
	/// draft is ignored.
	pub async fn add_book(&self, draft: BookDraft) -> Result<Bid> {
		let title = draft.title.as_deref().map(str::trim).unwrap_or_default();
		let author = draft.author.as_deref().map(str::trim).unwrap_or_default();
		if title.is_empty() || author.is_empty() {
			return Err(LibraryError::Validation("Title and Author are required".into()));
		}
		let Some(total) = draft.total_copies else {
			return Err(LibraryError::Validation("Total copies are required".into()));
		};
		if total < 0 {
			return Err(LibraryError::Validation("Total copies must not be negative".into()));
		}

		let inserted = sqlx::query(
			r#"
INSERT INTO books
	(title, author, category, total_copies, available_copies, image_url)
VALUES
	(?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(title)
		.bind(author)
		.bind(draft.category.as_deref().map(str::trim).unwrap_or_default())
		.bind(total)
		.bind(total)
		.bind(&draft.image_url)
		.execute(&self.db)
		.await?;

		let bid = inserted.last_insert_rowid();
		tracing::info!(bid, title, total, "book added");
		Ok(bid)
	}

	/// Replaces the given fields. When only the total changes, the available
	/// count moves by the same amount.
	pub async fn update_book(&self, bid: Bid, draft: BookDraft) -> Result<()> {
		non_blank(&draft.title, "Title")?;
		non_blank(&draft.author, "Author")?;
		if draft.total_copies.is_some_and(|t| t < 0) {
			return Err(LibraryError::Validation("Total copies must not be negative".into()));
		}

		// single statement so the copy arithmetic sees the row as it is now
		let done = sqlx::query(
			r#"
UPDATE books SET
	title = COALESCE(?, title),
	author = COALESCE(?, author),
	category = COALESCE(?, category),
	image_url = COALESCE(?, image_url),
	available_copies = COALESCE(?, available_copies + (COALESCE(?, total_copies) - total_copies)),
	total_copies = COALESCE(?, total_copies)
WHERE id = ?
			"#,
		)
		.bind(draft.title.as_deref().map(str::trim))
		.bind(draft.author.as_deref().map(str::trim))
		.bind(draft.category.as_deref().map(str::trim))
		.bind(&draft.image_url)
		.bind(draft.available_copies)
		.bind(draft.total_copies)
		.bind(draft.total_copies)
		.bind(bid)
		.execute(&self.db)
		.await
		.map_err(copies_error)?;

		if done.rows_affected() == 0 {
			return Err(LibraryError::NotFound("Book not found".into()));
		}
		tracing::info!(bid, "book updated");
		Ok(())
	}

	/// Books with any lending history stay, so the transaction log keeps its references.
	pub async fn delete_book(&self, bid: Bid) -> Result<()> {
		let (open, history): (i64, i64) = sqlx::query_as(
			r#"
SELECT
	COALESCE(SUM(kind = 'ISSUE' AND return_date IS NULL), 0),
	COUNT(*)
FROM transactions
WHERE book_id = ?
			"#,
		)
		.bind(bid)
		.fetch_one(&self.db)
		.await?;
		if open > 0 {
			return Err(LibraryError::Conflict("Book has copies on loan".into()));
		}
		if history > 0 {
			return Err(LibraryError::Conflict("Book has lending history and cannot be deleted".into()));
		}

		let done = sqlx::query("DELETE FROM books WHERE id = ?")
			.bind(bid)
			.execute(&self.db)
			.await
			.map_err(|err| match &err {
				sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
					LibraryError::Conflict("Book has lending history and cannot be deleted".into())
				}
				_ => err.into(),
			})?;
		if done.rows_affected() == 0 {
			return Err(LibraryError::NotFound("Book not found".into()));
		}
		tracing::info!(bid, "book deleted");
		Ok(())
	}
}
