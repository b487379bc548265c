mod common;

use lsys::types::BookDraft;
use lsys::LibraryError;

use common::{book, draft, library, student};

#[tokio::test]
async fn search_matches_title_author_or_category() {
	let (lib, _clock) = library().await;
	lib.add_book(draft("Nineteen Eighty-Four", "George Orwell", 2)).await.unwrap();
	lib.add_book(BookDraft { category: Some("Science".into()), ..draft("Cosmos", "Carl Sagan", 1) })
		.await
		.unwrap();
	lib.add_book(draft("Animal Farm", "George Orwell", 1)).await.unwrap();

	let orwell = lib.search_books(Some("orwell")).await.unwrap();
	assert_eq!(orwell.len(), 2);
	assert!(orwell.iter().all(|b| b.author == "George Orwell"));

	let science = lib.search_books(Some("SCIENCE")).await.unwrap();
	assert_eq!(science.len(), 1);
	assert_eq!(science[0].title, "Cosmos");

	assert_eq!(lib.search_books(Some("farm")).await.unwrap().len(), 1);
	assert_eq!(lib.search_books(None).await.unwrap().len(), 3);
	assert_eq!(lib.search_books(Some("   ")).await.unwrap().len(), 3);
	assert!(lib.search_books(Some("%")).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_requires_title_and_author() {
	let (lib, _clock) = library().await;
	let missing_author = BookDraft { author: None, ..draft("Untitled", "x", 1) };
	assert!(matches!(lib.add_book(missing_author).await, Err(LibraryError::Validation(_))));
	let blank_title = draft("  ", "Someone", 1);
	assert!(matches!(lib.add_book(blank_title).await, Err(LibraryError::Validation(_))));
	assert!(matches!(lib.add_book(draft("Negative", "Someone", -1)).await, Err(LibraryError::Validation(_))));
}

#[tokio::test]
async fn new_books_start_fully_available() {
	let (lib, _clock) = library().await;
	let bid = book(&lib, "Refactoring", 4).await;
	let stored = lib.book(bid).await.unwrap();
	assert_eq!(stored.total_copies, 4);
	assert_eq!(stored.available_copies, 4);
	assert_eq!(stored.category, "Fiction");
}

#[tokio::test]
async fn raising_total_raises_available() {
	let (lib, _clock) = library().await;
	let ada = student(&lib, "Ada").await;
	let bid = book(&lib, "Code Complete", 2).await;
	lib.issue(ada, bid, None).await.unwrap();

	lib.update_book(bid, BookDraft { total_copies: Some(5), ..Default::default() }).await.unwrap();
	let stored = lib.book(bid).await.unwrap();
	assert_eq!(stored.total_copies, 5);
	assert_eq!(stored.available_copies, 4);
	assert_eq!(stored.title, "Code Complete");

	// cannot shrink below the copies on loan
	let err = lib.update_book(bid, BookDraft { total_copies: Some(0), ..Default::default() }).await.unwrap_err();
	assert!(matches!(err, LibraryError::Validation(_)));
	assert_eq!(lib.book(bid).await.unwrap().total_copies, 5);
}

#[tokio::test]
async fn explicit_available_must_fit_total() {
	let (lib, _clock) = library().await;
	let bid = book(&lib, "Jane Eyre", 2).await;

	let too_many = BookDraft { available_copies: Some(3), ..Default::default() };
	assert!(matches!(lib.update_book(bid, too_many).await, Err(LibraryError::Validation(_))));

	let renamed = BookDraft { title: Some("Jane Eyre (2nd ed.)".into()), available_copies: Some(1), ..Default::default() };
	lib.update_book(bid, renamed).await.unwrap();
	let stored = lib.book(bid).await.unwrap();
	assert_eq!(stored.title, "Jane Eyre (2nd ed.)");
	assert_eq!(stored.available_copies, 1);

	let blank = BookDraft { author: Some(" ".into()), ..Default::default() };
	assert!(matches!(lib.update_book(bid, blank).await, Err(LibraryError::Validation(_))));
	assert!(matches!(
		lib.update_book(404, BookDraft::default()).await,
		Err(LibraryError::NotFound(_))
	));
}

#[tokio::test]
async fn delete_refuses_books_with_history() {
	let (lib, _clock) = library().await;
	let ada = student(&lib, "Ada").await;
	let lent = book(&lib, "Hamlet", 1).await;
	let unused = book(&lib, "Beyond Good and Evil", 1).await;

	lib.issue(ada, lent, None).await.unwrap();
	assert!(matches!(lib.delete_book(lent).await, Err(LibraryError::Conflict(ref m)) if m == "Book has copies on loan"));
	lib.return_book(ada, lent, None, None).await.unwrap();
	assert!(matches!(lib.delete_book(lent).await, Err(LibraryError::Conflict(_))));

	lib.delete_book(unused).await.unwrap();
	assert!(matches!(lib.book(unused).await, Err(LibraryError::NotFound(_))));
	assert!(matches!(lib.delete_book(unused).await, Err(LibraryError::NotFound(_))));
}

#[tokio::test]
async fn add_needs_a_total_and_shelves_every_copy() {
	let (lib, _clock) = library().await;
	let no_total = BookDraft { total_copies: None, ..draft("Dune", "Frank Herbert", 1) };
	let err = lib.add_book(no_total).await.unwrap_err();
	assert!(matches!(err, LibraryError::Validation(ref m) if m == "Total copies are required"));

	let short_shelf = BookDraft { available_copies: Some(1), ..draft("Dune", "Frank Herbert", 3) };
	let bid = lib.add_book(short_shelf).await.unwrap();
	let stored = lib.book(bid).await.unwrap();
	assert_eq!(stored.total_copies, 3);
	assert_eq!(stored.available_copies, 3);

	let empty = lib.add_book(draft("Out of Print", "Nobody", 0)).await.unwrap();
	assert_eq!(lib.book(empty).await.unwrap().available_copies, 0);
}
