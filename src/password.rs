//! Salted argon2id password hashes in PHC string form.

use argon2::{
	password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};

use crate::error::{LibraryError, Result};

pub fn hash_password(password: &str) -> Result<String> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| LibraryError::PasswordHash(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
	let parsed = PasswordHash::new(hash).map_err(|e| LibraryError::PasswordHash(e.to_string()))?;
	Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Runs hashing on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String> {
	tokio::task::spawn_blocking(move || hash_password(&password))
		.await
		.map_err(|e| LibraryError::PasswordHash(e.to_string()))?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
	tokio::task::spawn_blocking(move || verify_password(&password, &hash))
		.await
		.map_err(|e| LibraryError::PasswordHash(e.to_string()))?
}
