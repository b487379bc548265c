use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::password::hash_password_blocking;
use crate::types::Role;

/*
DROP TABLE IF EXISTS cart_items;
DROP TABLE IF EXISTS notifications;
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS books;
DROP TABLE IF EXISTS users;
*/

pub const TABLE_SCHEMA: &str = r#"

CREATE TABLE IF NOT EXISTS users (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,
	email TEXT NOT NULL UNIQUE COLLATE NOCASE,
	pass_hash TEXT NOT NULL,
	role TEXT NOT NULL CHECK(role IN ('Student', 'Faculty', 'Librarian')),
	contact TEXT DEFAULT NULL,
	joined_date TEXT NOT NULL,
	leave_date TEXT DEFAULT NULL
);

CREATE TABLE IF NOT EXISTS books (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL,
	author TEXT NOT NULL,
	category TEXT NOT NULL DEFAULT '',
	total_copies INTEGER NOT NULL,
	available_copies INTEGER NOT NULL,
	image_url TEXT DEFAULT NULL,
	CHECK(available_copies >= 0),
	CHECK(available_copies <= total_copies)
);

CREATE TABLE IF NOT EXISTS transactions (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	user_id INTEGER NOT NULL,
	book_id INTEGER NOT NULL,
	kind TEXT NOT NULL CHECK(kind IN ('ISSUE', 'RETURN')),
	issue_date TEXT NOT NULL,
	due_date TEXT DEFAULT NULL,
	return_date TEXT DEFAULT NULL,
	fine_amount INTEGER NOT NULL DEFAULT 0,
	FOREIGN KEY(user_id) REFERENCES users(id),
	FOREIGN KEY(book_id) REFERENCES books(id)
);

CREATE INDEX IF NOT EXISTS transactions_open
	ON transactions(user_id, book_id) WHERE kind = 'ISSUE' AND return_date IS NULL;

CREATE TABLE IF NOT EXISTS notifications (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	user_id INTEGER NOT NULL,
	message TEXT NOT NULL,
	read BOOL NOT NULL DEFAULT false,
	created_at TEXT NOT NULL,
	FOREIGN KEY(user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS cart_items (
	user_id INTEGER NOT NULL,
	book_id INTEGER NOT NULL,
	added_at TEXT NOT NULL,
	UNIQUE(user_id, book_id),
	FOREIGN KEY(user_id) REFERENCES users(id),
	FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE
);

"#;

/// Columns added after the first release; added on boot when missing.
const LEDGER_COLUMNS: [(&str, &str); 3] = [
	("tx_hash", "TEXT DEFAULT NULL"),
	("block_number", "INTEGER DEFAULT NULL"),
	("gas_used", "INTEGER DEFAULT NULL"),
];

pub async fn open(url: &str, max_connections: u32) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(url)?
		.create_if_missing(true)
		.foreign_keys(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(max_connections)
		.acquire_timeout(Duration::from_secs(3))
		.connect_with(options)
		.await?;
	Ok(pool)
}

/// Private in-memory database. One connection, kept alive for the pool's lifetime.
pub async fn open_in_memory() -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.min_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.acquire_timeout(Duration::from_secs(10))
		.connect_with(options)
		.await?;
	Ok(pool)
}

pub async fn migrate(db: &SqlitePool) -> Result<()> {
	for statement in TABLE_SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
		sqlx::query(statement).execute(db).await?;
	}

	let existing: Vec<String> = sqlx::query("PRAGMA table_info(transactions)")
		.fetch_all(db)
		.await?
		.iter()
		.map(|row| row.get::<String, _>("name"))
		.collect();

	for (column, decl) in LEDGER_COLUMNS {
		if existing.iter().any(|c| c == column) {
			continue;
		}
		tracing::info!(column, "adding ledger column to transactions");
		sqlx::query(&format!("ALTER TABLE transactions ADD COLUMN {column} {decl}"))
			.execute(db)
			.await?;
	}
	Ok(())
}

struct SeedAccount {
	name: &'static str,
	email: &'static str,
	pass: &'static str,
	role: Role,
	contact: &'static str,
	years_until_leave: u32,
}

const SEED_ACCOUNTS: [SeedAccount; 3] = [
	SeedAccount {
		name: "Librarian 1",
		email: "admin@library.com",
		pass: "admin123",
		role: Role::Librarian,
		contact: "+910000000000",
		years_until_leave: 50,
	},
	SeedAccount {
		name: "Librarian 2",
		email: "librarian2@library.com",
		pass: "lib123",
		role: Role::Librarian,
		contact: "+910000000001",
		years_until_leave: 50,
	},
	SeedAccount {
		name: "Student User",
		email: "student@library.com",
		pass: "password",
		role: Role::Student,
		contact: "+910000000000",
		years_until_leave: 4,
	},
];

pub const SEED_BOOK_COUNT: i64 = 140;
const SEED_COPIES: i64 = 5;

const SEED_CATEGORIES: [&str; 5] = ["Fiction", "Technology", "Science", "History", "Philosophy"];

const SEED_AUTHORS: [&str; 10] = [
	"Robert C. Martin", "J.K. Rowling", "Stephen Hawking", "George Orwell", "Yuval Noah Harari",
	"Carl Sagan", "William Shakespeare", "Agatha Christie", "Isaac Asimov", "Neil deGrasse Tyson",
];

const SEED_TITLES: [&str; 50] = [
	"Clean Code", "Harry Potter", "A Brief History of Time", "1984", "Sapiens",
	"Cosmos", "Hamlet", "Murder on the Orient Express", "Foundation", "Astrophysics for People in a Hurry",
	"Designing Data-Intensive Applications", "The Pragmatic Programmer", "Introduction to Algorithms",
	"The Art of Computer Programming", "Code Complete", "Refactoring",
	"Structure and Interpretation of Computer Programs", "Cracking the Coding Interview",
	"The Selfish Gene", "The Elegant Universe",
	"The Great Gatsby", "To Kill a Mockingbird", "The Hobbit", "Fahrenheit 451", "Brave New World",
	"The Alchemist", "The Catcher in the Rye", "Animal Farm", "The Little Prince", "The Da Vinci Code",
	"Pride and Prejudice", "Sense and Sensibility", "Wuthering Heights", "Jane Eyre", "Great Expectations",
	"Oliver Twist", "The Adventures of Huckleberry Finn", "Moby-Dick", "War and Peace", "Crime and Punishment",
	"The Odyssey", "The Iliad", "The Republic", "The Prince", "The Wealth of Nations",
	"Capital", "Thus Spoke Zarathustra", "Beyond Good and Evil", "The Stranger", "The Myth of Sisyphus",
];

const SEED_COVERS: [&str; 5] = [
	"https://covers.openlibrary.org/b/id/7222246-L.jpg",
	"https://covers.openlibrary.org/b/id/8394982-L.jpg",
	"https://covers.openlibrary.org/b/id/8225261-L.jpg",
	"https://covers.openlibrary.org/b/id/8254332-L.jpg",
	"https://covers.openlibrary.org/b/id/10543226-L.jpg",
];

/// The n-th catalog entry, 1-based: (title, author, category, cover).
pub fn seed_book(n: usize) -> (String, &'static str, &'static str, &'static str) {
	(
		format!("{} (Vol. {n})", SEED_TITLES[n % SEED_TITLES.len()]),
		SEED_AUTHORS[n % SEED_AUTHORS.len()],
		SEED_CATEGORIES[n % SEED_CATEGORIES.len()],
		SEED_COVERS[n % SEED_COVERS.len()],
	)
}

/// Bootstrap accounts and catalog. Safe to run on every start.
pub async fn seed(db: &SqlitePool, now: DateTime<Utc>) -> Result<()> {
	for account in SEED_ACCOUNTS {
		let known: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
			.bind(account.email)
			.fetch_optional(db)
			.await?;
		if known.is_some() {
			continue;
		}
		let pass_hash = hash_password_blocking(account.pass.to_string()).await?;
		let leave = now.checked_add_months(Months::new(12 * account.years_until_leave));
		sqlx::query(
			r#"
INSERT OR IGNORE INTO users
	(name, email, pass_hash, role, contact, joined_date, leave_date)
VALUES
	(?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(account.name)
		.bind(account.email)
		.bind(pass_hash)
		.bind(account.role.as_str())
		.bind(account.contact)
		.bind(now)
		.bind(leave)
		.execute(db)
		.await?;
		tracing::info!(email = account.email, role = %account.role, "seeded account");
	}

	let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books").fetch_one(db).await?;
	if count == 0 {
		tracing::info!(books = SEED_BOOK_COUNT, "seeding catalog");
		let mut tx = db.begin().await?;
		for n in 1..=SEED_BOOK_COUNT as usize {
			let (title, author, category, cover) = seed_book(n);
			sqlx::query(
				r#"
INSERT INTO books
	(title, author, category, total_copies, available_copies, image_url)
VALUES
	(?, ?, ?, ?, ?, ?)
				"#,
			)
			.bind(title)
			.bind(author)
			.bind(category)
			.bind(SEED_COPIES)
			.bind(SEED_COPIES)
			.bind(cover)
			.execute(&mut *tx)
			.await?;
		}
		tx.commit().await?;
	}
	Ok(())
}
