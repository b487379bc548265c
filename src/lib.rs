//! # lsys
//!
//! Lending backend for a university library: a catalog of books with copy
//! counts, Student/Faculty/Librarian accounts, issue and return with
//! role-based limits and fines, member notifications and a server-side cart.
//! State lives in SQLite behind [`Library`]; [`routes::app`] exposes it as JSON.
//!
//! ```no_run
//! # async fn run() -> lsys::Result<()> {
//! use lsys::{notify::Notifier, sql, Library};
//!
//! let db = sql::open_in_memory().await?;
//! sql::migrate(&db).await?;
//! let library = Library::new(db, Notifier::Log);
//! let books = library.search_books(Some("orwell")).await?;
//! # Ok(()) }
//! ```

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lending;
mod library;
pub mod notify;
pub mod password;
pub mod policy;
pub mod routes;
pub mod sql;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{LibraryError, Result};
pub use ledger::ExternalRef;
pub use library::{Library, SharedState};
pub use types::{Account, Book, Role, Transaction, TransactionView, TxKind};
