//! Receipts from the on-chain ledger mirror.
//!
//! The smart contract keeps its own record of registrations and loans and is
//! called by clients directly. Its receipts reach this service only as opaque
//! metadata attached to an issue or return, for audit display. Nothing here
//! talks to a chain, and divergence between the two records is not reconciled.

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Longest accepted hash: `0x` plus 64 hex digits.
pub const MAX_HASH_LEN: usize = 66;

const RECEIPT_ID_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRef {
	pub tx_hash: String,
	pub block_number: Option<i64>,
	pub gas_used: Option<i64>,
}

impl ExternalRef {
	/// Checks shape only. The hash is trimmed, the numbers must not be negative.
	pub fn normalized(self) -> Result<Self, LibraryError> {
		let tx_hash = self.tx_hash.trim().to_string();
		if tx_hash.is_empty() {
			return Err(LibraryError::Validation("Ledger transaction hash is empty".into()));
		}
		if tx_hash.len() > MAX_HASH_LEN {
			return Err(LibraryError::Validation(format!(
				"Ledger transaction hash longer than {MAX_HASH_LEN} characters"
			)));
		}
		if self.block_number.is_some_and(|n| n < 0) || self.gas_used.is_some_and(|n| n < 0) {
			return Err(LibraryError::Validation("Ledger block number and gas used must not be negative".into()));
		}
		Ok(ExternalRef { tx_hash, ..self })
	}

	pub fn receipt_id(&self) -> &str {
		receipt_id(&self.tx_hash)
	}
}

/// Short display form of a ledger hash.
pub fn receipt_id(hash: &str) -> &str {
	match hash.char_indices().nth(RECEIPT_ID_LEN) {
		Some((end, _)) => &hash[..end],
		None => hash,
	}
}

/// Normalizes an optional receipt, passing `None` through.
pub fn normalize(external: Option<ExternalRef>) -> Result<Option<ExternalRef>, LibraryError> {
	external.map(ExternalRef::normalized).transpose()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn receipt(hash: &str) -> ExternalRef {
		ExternalRef { tx_hash: hash.into(), block_number: Some(12), gas_used: Some(21000) }
	}

	#[test]
	fn trims_hash() {
		let r = receipt("  0xabc  ").normalized().unwrap();
		assert_eq!(r.tx_hash, "0xabc");
		assert_eq!(r.block_number, Some(12));
	}

	#[test]
	fn rejects_bad_shapes() {
		assert!(receipt("   ").normalized().is_err());
		assert!(receipt(&format!("0x{}", "f".repeat(65))).normalized().is_err());
		let mut negative = receipt("0x1");
		negative.gas_used = Some(-1);
		assert!(negative.normalized().is_err());
	}

	#[test]
	fn receipt_id_is_prefix() {
		assert_eq!(receipt_id("0x1234567890abcdef"), "0x12345678");
		assert_eq!(receipt_id("0x12"), "0x12");
		assert_eq!(receipt("0xdeadbeefcafe").receipt_id(), "0xdeadbeef");
	}

	#[test]
	fn normalize_passes_none() {
		assert_eq!(normalize(None).unwrap(), None);
	}
}
