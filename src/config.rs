use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::notify::{WhatsAppConfig, WHATSAPP_API_BASE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("{key} is not a valid {expected}: `{value}`")]
	Invalid { key: &'static str, expected: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
	pub bind: SocketAddr,
	pub database_url: String,
	pub max_connections: u32,
	pub seed: bool,
	pub log_json: bool,
	pub whatsapp: Option<WhatsAppConfig>,
	/// Why `.env` was skipped, for logging once tracing is up.
	pub env_file_error: Option<String>,
}

impl Config {
	/// Reads `.env` if present, then the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		let env_file_error = env_file_problem(dotenvy::dotenv());
		let mut config = Self::from_vars(std::env::vars().collect())?;
		config.env_file_error = env_file_error;
		Ok(config)
	}

	pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
		let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

		let host = get("BIND_ADDR").unwrap_or("0.0.0.0");
		let port = parse::<u16>(get("PORT"), "PORT", "port number", 5001)?;
		let bind: SocketAddr = format!("{host}:{port}").parse().map_err(|_| ConfigError::Invalid {
			key: "BIND_ADDR",
			expected: "IP address",
			value: host.to_string(),
		})?;

		let whatsapp = match (get("WHATSAPP_TOKEN"), get("WHATSAPP_PHONE_ID")) {
			(Some(token), Some(phone_id)) => Some(WhatsAppConfig {
				token: token.to_string(),
				phone_id: phone_id.to_string(),
				api_base: get("WHATSAPP_API_BASE").unwrap_or(WHATSAPP_API_BASE).to_string(),
			}),
			_ => None,
		};

		Ok(Config {
			bind,
			database_url: get("DATABASE_URL").unwrap_or("sqlite://library.db").to_string(),
			max_connections: parse(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", "connection count", 5)?,
			seed: flag(get("SEED_DATA"), "SEED_DATA", true)?,
			log_json: flag(get("LOG_JSON"), "LOG_JSON", false)?,
			whatsapp,
			env_file_error: None,
		})
	}
}

/// A missing `.env` is normal; anything else is worth a warning.
fn env_file_problem<T>(loaded: dotenvy::Result<T>) -> Option<String> {
	match loaded {
		Err(err) if !err.not_found() => Some(err.to_string()),
		_ => None,
	}
}

fn parse<T: std::str::FromStr>(
	value: Option<&str>,
	key: &'static str,
	expected: &'static str,
	default: T,
) -> Result<T, ConfigError> {
	match value {
		None => Ok(default),
		Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, expected, value: v.to_string() }),
	}
}

fn flag(value: Option<&str>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
	match value {
		None => Ok(default),
		Some("1" | "true" | "TRUE" | "yes" | "YES") => Ok(true),
		Some("0" | "false" | "FALSE" | "no" | "NO") => Ok(false),
		Some(v) => Err(ConfigError::Invalid { key, expected: "boolean", value: v.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_unreadable_env_files_are_reported() {
		use std::io::{Error, ErrorKind};

		let missing: dotenvy::Result<()> = Err(dotenvy::Error::Io(Error::new(ErrorKind::NotFound, "gone")));
		assert_eq!(env_file_problem(missing), None);
		assert_eq!(env_file_problem(Ok(())), None);

		let denied: dotenvy::Result<()> =
			Err(dotenvy::Error::Io(Error::new(ErrorKind::PermissionDenied, "denied")));
		assert!(env_file_problem(denied).is_some());
		let garbled: dotenvy::Result<()> = Err(dotenvy::Error::LineParse("=oops".into(), 0));
		assert!(env_file_problem(garbled).is_some());
	}

	fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[test]
	fn defaults() {
		let config = Config::from_vars(HashMap::new()).unwrap();
		assert_eq!(config.bind, "0.0.0.0:5001".parse().unwrap());
		assert_eq!(config.database_url, "sqlite://library.db");
		assert_eq!(config.max_connections, 5);
		assert!(config.seed);
		assert!(!config.log_json);
		assert!(config.whatsapp.is_none());
	}

	#[test]
	fn whatsapp_needs_both_credentials() {
		let only_token = Config::from_vars(vars(&[("WHATSAPP_TOKEN", "t")])).unwrap();
		assert!(only_token.whatsapp.is_none());

		let both = Config::from_vars(vars(&[("WHATSAPP_TOKEN", "t"), ("WHATSAPP_PHONE_ID", "9")])).unwrap();
		let whatsapp = both.whatsapp.unwrap();
		assert_eq!(whatsapp.phone_id, "9");
		assert_eq!(whatsapp.api_base, WHATSAPP_API_BASE);
	}

	#[test]
	fn bad_values_are_errors() {
		assert_eq!(
			Config::from_vars(vars(&[("PORT", "eighty")])).unwrap_err(),
			ConfigError::Invalid { key: "PORT", expected: "port number", value: "eighty".into() }
		);
		assert!(Config::from_vars(vars(&[("SEED_DATA", "maybe")])).is_err());
		assert!(Config::from_vars(vars(&[("BIND_ADDR", "not an ip")])).is_err());
	}

	#[test]
	fn overrides() {
		let config = Config::from_vars(vars(&[
			("PORT", "8080"),
			("BIND_ADDR", "127.0.0.1"),
			("SEED_DATA", "0"),
			("LOG_JSON", "yes"),
			("DATABASE_URL", "sqlite::memory:"),
		]))
		.unwrap();
		assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
		assert!(!config.seed);
		assert!(config.log_json);
		assert_eq!(config.database_url, "sqlite::memory:");
	}
}
