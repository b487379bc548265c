use chrono::Months;

use crate::error::{LibraryError, Result};
use crate::library::Library;
use crate::password::{hash_password_blocking, verify_password_blocking};
use crate::types::{Account, FormLogin, FormRegister, Role, Uid};

/// Default membership span when no leave date is given.
const DEFAULT_MEMBERSHIP_YEARS: u32 = 4;

fn required(field: Option<String>) -> Option<String> {
	field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

impl Library {
	/// Self-registration for students and faculty.
	pub async fn register(&self, form: FormRegister) -> Result<Account> {
		let (Some(name), Some(email), Some(pass), Some(role)) = (
			required(form.name),
			required(form.email),
			required(form.password),
			required(form.role),
		) else {
			return Err(LibraryError::Validation("Missing required fields".into()));
		};

		let role = role
			.parse::<Role>()
			.map_err(|e| LibraryError::Validation(e.to_string()))?;
		if role == Role::Librarian {
			return Err(LibraryError::Forbidden(
				"New librarian registrations are not allowed. Please use pre-seeded accounts.".into(),
			));
		}

		let email = normalize_email(&email);
		if !email.contains('@') {
			return Err(LibraryError::Validation("Invalid email address".into()));
		}

		let now = self.clock.now();
		let leave_date = form
			.leave_date
			.or_else(|| now.checked_add_months(Months::new(12 * DEFAULT_MEMBERSHIP_YEARS)));
		let contact = required(form.contact);
		let pass_hash = hash_password_blocking(pass).await?;

		let inserted = sqlx::query(
			r#"
INSERT INTO users
	(name, email, pass_hash, role, contact, joined_date, leave_date)
VALUES
	(?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&name)
		.bind(&email)
		.bind(&pass_hash)
		.bind(role.as_str())
		.bind(&contact)
		.bind(now)
		.bind(leave_date)
		.execute(&self.db)
		.await
		.map_err(LibraryError::from)
		.map_err(|e| match e {
			LibraryError::Integrity(_) => LibraryError::Integrity("Email already exists".into()),
			other => other,
		})?;

		let uid = inserted.last_insert_rowid();
		tracing::info!(uid, %role, "registered account");
		Ok(Account { uid, name, email, pass_hash, role, contact, joined_date: now, leave_date })
	}

	/// Unknown email and wrong password are indistinguishable to the caller.
	pub async fn login(&self, form: FormLogin) -> Result<Account> {
		let email = normalize_email(&form.email);
		let account = sqlx::query_as::<_, Account>(
			"SELECT id, name, email, pass_hash, role, contact, joined_date, leave_date FROM users WHERE email = ?",
		)
		.bind(&email)
		.fetch_optional(&self.db)
		.await?;

		let Some(account) = account else {
			return Err(LibraryError::Unauthorized("Invalid credentials".into()));
		};
		let pass = form.password.trim().to_string();
		if !verify_password_blocking(pass, account.pass_hash.clone()).await? {
			return Err(LibraryError::Unauthorized("Invalid credentials".into()));
		}
		tracing::debug!(uid = account.uid, "login");
		Ok(account)
	}

	/// Every non-librarian account, for librarian review.
	pub async fn members(&self) -> Result<Vec<Account>> {
		let rows = sqlx::query_as::<_, Account>(
			r#"
SELECT id, name, email, pass_hash, role, contact, joined_date, leave_date
FROM users
WHERE role != 'Librarian'
ORDER BY id
			"#,
		)
		.fetch_all(&self.db)
		.await?;
		Ok(rows)
	}

	pub async fn account(&self, uid: Uid) -> Result<Account> {
		self.find_account(uid).await
	}
}
