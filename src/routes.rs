//! JSON routes, mounted under `/api`.

use axum::{
	extract::{FromRequest, FromRequestParts, Path, Query, State},
	http::StatusCode,
	routing::{delete, get, post, put},
	Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::error::{LibraryError, Result};
use crate::library::SharedState;
use crate::types::{
	Account, Analytics, Bid, Book, BookDraft, CheckoutReport, Eligibility, FormCartItem, FormCheckout,
	FormIssue, FormLogin, FormRegister, FormReturn, Nid, Notification, SearchQuery, TransactionView, Uid,
};

pub fn app(state: SharedState) -> Router {
	let api = Router::new()
		.route("/auth/register", post(register))
		.route("/auth/login", post(login))
		.route("/auth/users", get(members))
		.route("/books", get(search_books).post(add_book))
		.route("/books/:id", get(book).put(update_book).delete(delete_book))
		.route("/transactions/check-eligibility/:uid/:bid", get(check_eligibility))
		.route("/transactions/issue", post(issue))
		.route("/transactions/return", post(return_book))
		.route("/transactions/history/:uid", get(history))
		.route("/transactions/open/:uid", get(open_loans))
		.route("/transactions/all", get(all_transactions))
		.route("/transactions/analytics", get(analytics))
		.route("/notifications/:uid", get(notifications))
		.route("/notifications/read/:id", put(mark_read))
		.route("/cart/:uid", get(cart).post(cart_add))
		.route("/cart/:uid/:bid", delete(cart_remove))
		.route("/cart/:uid/checkout", post(checkout))
		.route("/health", get(|| async { "ok" }));

	Router::new()
		.nest("/api", api)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// JSON body whose rejections answer as [`LibraryError::Validation`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(LibraryError))]
struct JsonBody<T>(T);

/// Path parameters, rejected the same way.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(LibraryError))]
struct Param<T>(T);

fn message(text: &str) -> Json<Value> {
	Json(json!({ "message": text }))
}

async fn register(
	State(lib): State<SharedState>,
	JsonBody(form): JsonBody<FormRegister>,
) -> Result<(StatusCode, Json<Value>)> {
	let account = lib.register(form).await?;
	Ok((
		StatusCode::CREATED,
		Json(json!({
			"message": "User registered successfully",
			"userId": account.uid,
			"user": account,
		})),
	))
}

async fn login(State(lib): State<SharedState>, JsonBody(form): JsonBody<FormLogin>) -> Result<Json<Value>> {
	let account = lib.login(form).await?;
	Ok(Json(json!({ "message": "Login successful", "user": account })))
}

async fn members(State(lib): State<SharedState>) -> Result<Json<Vec<Account>>> {
	Ok(Json(lib.members().await?))
}

async fn search_books(
	State(lib): State<SharedState>,
	Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Book>>> {
	Ok(Json(lib.search_books(query.search.as_deref()).await?))
}

async fn book(State(lib): State<SharedState>, Param(bid): Param<Bid>) -> Result<Json<Book>> {
	Ok(Json(lib.book(bid).await?))
}

async fn add_book(
	State(lib): State<SharedState>,
	JsonBody(draft): JsonBody<BookDraft>,
) -> Result<(StatusCode, Json<Value>)> {
	let bid = lib.add_book(draft).await?;
	Ok((StatusCode::CREATED, Json(json!({ "message": "Book added successfully", "bookId": bid }))))
}

async fn update_book(
	State(lib): State<SharedState>,
	Param(bid): Param<Bid>,
	JsonBody(draft): JsonBody<BookDraft>,
) -> Result<Json<Value>> {
	lib.update_book(bid, draft).await?;
	Ok(message("Book updated successfully"))
}

async fn delete_book(State(lib): State<SharedState>, Param(bid): Param<Bid>) -> Result<Json<Value>> {
	lib.delete_book(bid).await?;
	Ok(message("Book deleted successfully"))
}

async fn check_eligibility(
	State(lib): State<SharedState>,
	Param((uid, bid)): Param<(Uid, Bid)>,
) -> Result<Json<Eligibility>> {
	Ok(Json(lib.check_eligibility(uid, bid).await?))
}

async fn issue(State(lib): State<SharedState>, JsonBody(form): JsonBody<FormIssue>) -> Result<Json<Value>> {
	let issued = lib.issue(form.user_id, form.book_id, form.external_ref).await?;
	Ok(Json(json!({
		"message": "Issue recorded successfully",
		"transactionId": issued.id,
		"dueDate": issued.due_date,
	})))
}

async fn return_book(State(lib): State<SharedState>, JsonBody(form): JsonBody<FormReturn>) -> Result<Json<Value>> {
	let returned = lib
		.return_book(form.user_id, form.book_id, form.fine_override, form.external_ref)
		.await?;
	Ok(Json(json!({
		"message": "Return recorded successfully",
		"transactionId": returned.id,
		"fineAmount": returned.fine_amount,
	})))
}

async fn history(State(lib): State<SharedState>, Param(uid): Param<Uid>) -> Result<Json<Vec<TransactionView>>> {
	Ok(Json(lib.history(uid).await?))
}

async fn open_loans(State(lib): State<SharedState>, Param(uid): Param<Uid>) -> Result<Json<Vec<TransactionView>>> {
	Ok(Json(lib.open_loans(uid).await?))
}

async fn all_transactions(State(lib): State<SharedState>) -> Result<Json<Vec<TransactionView>>> {
	Ok(Json(lib.all_transactions().await?))
}

async fn analytics(State(lib): State<SharedState>) -> Result<Json<Analytics>> {
	Ok(Json(lib.analytics().await?))
}

async fn notifications(
	State(lib): State<SharedState>,
	Param(uid): Param<Uid>,
) -> Result<Json<Vec<Notification>>> {
	Ok(Json(lib.notifications(uid).await?))
}

async fn mark_read(State(lib): State<SharedState>, Param(id): Param<Nid>) -> Result<Json<Value>> {
	lib.mark_read(id).await?;
	Ok(message("Marked as read"))
}

async fn cart(State(lib): State<SharedState>, Param(uid): Param<Uid>) -> Result<Json<Vec<Book>>> {
	Ok(Json(lib.cart(uid).await?))
}

async fn cart_add(
	State(lib): State<SharedState>,
	Param(uid): Param<Uid>,
	JsonBody(form): JsonBody<FormCartItem>,
) -> Result<Json<Value>> {
	lib.cart_add(uid, form.book_id).await?;
	Ok(message("Added to cart"))
}

async fn cart_remove(State(lib): State<SharedState>, Param((uid, bid)): Param<(Uid, Bid)>) -> Result<Json<Value>> {
	lib.cart_remove(uid, bid).await?;
	Ok(message("Removed from cart"))
}

async fn checkout(
	State(lib): State<SharedState>,
	Param(uid): Param<Uid>,
	form: Option<Json<FormCheckout>>,
) -> Result<Json<CheckoutReport>> {
	let external = form.and_then(|Json(form)| form.external_ref);
	Ok(Json(lib.checkout(uid, external).await?))
}
