//! Shared fixtures: an empty in-memory library on a manual clock.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lsys::notify::Notifier;
use lsys::types::{BookDraft, FormRegister};
use lsys::{sql, Library, ManualClock};

pub fn start() -> DateTime<Utc> {
	DateTime::from_timestamp(1_735_689_600, 0).unwrap() // 2025-01-01T00:00:00Z
}

pub async fn library() -> (Arc<Library>, Arc<ManualClock>) {
	let db = sql::open_in_memory().await.unwrap();
	sql::migrate(&db).await.unwrap();
	let clock = Arc::new(ManualClock::new(start()));
	let library = Library::new(db, Notifier::Log).with_clock(clock.clone());
	(Arc::new(library), clock)
}

pub fn registration(name: &str, email: &str, role: &str) -> FormRegister {
	FormRegister {
		name: Some(name.into()),
		email: Some(email.into()),
		password: Some("hunter22".into()),
		role: Some(role.into()),
		contact: Some("+910000000123".into()),
		leave_date: None,
	}
}

pub async fn student(library: &Library, name: &str) -> i64 {
	let email = format!("{}@uni.edu", name.to_lowercase());
	library.register(registration(name, &email, "Student")).await.unwrap().uid
}

pub async fn faculty(library: &Library, name: &str) -> i64 {
	let email = format!("{}@uni.edu", name.to_lowercase());
	library.register(registration(name, &email, "Faculty")).await.unwrap().uid
}

pub fn draft(title: &str, author: &str, copies: i64) -> BookDraft {
	BookDraft {
		title: Some(title.into()),
		author: Some(author.into()),
		category: Some("Fiction".into()),
		total_copies: Some(copies),
		available_copies: None,
		image_url: None,
	}
}

pub async fn book(library: &Library, title: &str, copies: i64) -> i64 {
	library.add_book(draft(title, "Some Author", copies)).await.unwrap()
}

/// A migrated library in a fresh database file, so several connections can
/// contend for the SQLite write lock. Remove the returned path when done.
pub async fn file_library(tag: &str, connections: u32) -> (Arc<Library>, std::path::PathBuf) {
	let dir = std::env::temp_dir().join(format!("lsys-{tag}-{}", std::process::id()));
	let _ = std::fs::remove_dir_all(&dir);
	std::fs::create_dir_all(&dir).unwrap();
	let url = format!("sqlite://{}", dir.join("library.db").display());

	let db = sql::open(&url, connections).await.unwrap();
	sql::migrate(&db).await.unwrap();
	(Arc::new(Library::new(db, Notifier::Log)), dir)
}
