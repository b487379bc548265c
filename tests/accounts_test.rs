mod common;

use chrono::Months;
use lsys::types::{FormLogin, FormRegister};
use lsys::{LibraryError, Role};

use common::{library, registration, start};

fn login(email: &str, password: &str) -> FormLogin {
	FormLogin { email: email.into(), password: password.into() }
}

#[tokio::test]
async fn register_then_login() {
	let (lib, _clock) = library().await;
	let created = lib.register(registration("Ada", " Ada@Uni.EDU ", "Student")).await.unwrap();
	assert_eq!(created.email, "ada@uni.edu");
	assert_eq!(created.role, Role::Student);
	assert_eq!(created.joined_date, start());
	assert_eq!(created.leave_date, start().checked_add_months(Months::new(48)));
	assert!(created.pass_hash.starts_with("$argon2"));

	let account = lib.login(login("ADA@uni.edu", "hunter22")).await.unwrap();
	assert_eq!(account.uid, created.uid);
	assert_eq!(account.name, "Ada");
	assert_eq!(account.contact.as_deref(), Some("+910000000123"));
}

#[tokio::test]
async fn passwords_are_not_stored_in_plaintext() {
	let (lib, _clock) = library().await;
	lib.register(registration("Ada", "ada@uni.edu", "Student")).await.unwrap();
	let stored: String = sqlx::query_scalar("SELECT pass_hash FROM users WHERE email = 'ada@uni.edu'")
		.fetch_one(lib.db())
		.await
		.unwrap();
	assert_ne!(stored, "hunter22");
	assert!(!stored.contains("hunter22"));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
	let (lib, _clock) = library().await;
	lib.register(registration("Ada", "ada@uni.edu", "Faculty")).await.unwrap();

	let wrong = lib.login(login("ada@uni.edu", "hunter23")).await.unwrap_err();
	let unknown = lib.login(login("nobody@uni.edu", "hunter22")).await.unwrap_err();
	assert!(matches!(wrong, LibraryError::Unauthorized(_)));
	assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
	let (lib, _clock) = library().await;
	lib.register(registration("Ada", "ada@uni.edu", "Student")).await.unwrap();
	let err = lib.register(registration("Ada Again", "ADA@uni.edu", "Faculty")).await.unwrap_err();
	assert!(matches!(err, LibraryError::Integrity(ref m) if m == "Email already exists"));
}

#[tokio::test]
async fn librarians_cannot_self_register() {
	let (lib, _clock) = library().await;
	let err = lib.register(registration("Eve", "eve@uni.edu", "Librarian")).await.unwrap_err();
	assert!(matches!(err, LibraryError::Forbidden(_)));
}

#[tokio::test]
async fn missing_or_unknown_fields() {
	let (lib, _clock) = library().await;
	let no_password = FormRegister { password: None, ..registration("Ada", "ada@uni.edu", "Student") };
	assert!(matches!(lib.register(no_password).await, Err(LibraryError::Validation(_))));

	let blank_name = FormRegister { name: Some("  ".into()), ..registration("x", "ada@uni.edu", "Student") };
	assert!(matches!(lib.register(blank_name).await, Err(LibraryError::Validation(_))));

	let bad_role = registration("Ada", "ada@uni.edu", "Janitor");
	assert!(matches!(lib.register(bad_role).await, Err(LibraryError::Validation(_))));

	let bad_email = registration("Ada", "not-an-email", "Student");
	assert!(matches!(lib.register(bad_email).await, Err(LibraryError::Validation(_))));
}

#[tokio::test]
async fn members_exclude_librarians() {
	let (lib, _clock) = library().await;
	lsys::sql::seed(lib.db(), start()).await.unwrap();
	lib.register(registration("Grace", "grace@uni.edu", "Faculty")).await.unwrap();

	let members = lib.members().await.unwrap();
	assert_eq!(members.len(), 2);
	assert!(members.iter().all(|m| m.role != Role::Librarian));
	assert_eq!(members[0].email, "student@library.com");

	let admin = lib.login(login("admin@library.com", "admin123")).await.unwrap();
	assert_eq!(admin.role, Role::Librarian);
	assert_eq!(lib.account(admin.uid).await.unwrap().name, "Librarian 1");
}
