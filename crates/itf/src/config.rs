//! Dispatch runtime configuration.
//!
//! Read from TOML; every key is optional:
//!
//! ```toml
//! duplicate_policy = "first_wins"
//! verify_tables = true
//! prime_caches = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the registry treats two distinct tokens declaring the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
	/// Panic with the conflicting names.
	Panic,
	/// Fail registration with [`RegistryError::DuplicateInterface`](crate::RegistryError::DuplicateInterface).
	#[default]
	Reject,
	/// Keep the token registered first and record a collision.
	FirstWins,
	/// Replace with the token registered last and record a collision.
	LastWins,
}

/// Settings consumed by [`RegistryBuilder`](crate::RegistryBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
	/// Handling of duplicate interface names.
	pub duplicate_policy: DuplicatePolicy,
	/// Check every registered descriptor chain against its interface chain.
	pub verify_tables: bool,
	/// Resolve each registered descriptor against its own interface at
	/// registration, so later casts never walk a chain.
	pub prime_caches: bool,
}

impl Default for DispatchConfig {
	fn default() -> Self {
		Self {
			duplicate_policy: DuplicatePolicy::default(),
			verify_tables: true,
			prime_caches: true,
		}
	}
}

/// Errors raised while loading a [`DispatchConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid dispatch config: {0}")]
	Parse(#[from] toml::de::Error),
}

impl DispatchConfig {
	/// Parses a TOML document.
	pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&src)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(DispatchConfig::from_toml_str("").unwrap(), DispatchConfig::default());
	}

	#[rstest]
	#[case("panic", DuplicatePolicy::Panic)]
	#[case("reject", DuplicatePolicy::Reject)]
	#[case("first_wins", DuplicatePolicy::FirstWins)]
	#[case("last_wins", DuplicatePolicy::LastWins)]
	fn parses_duplicate_policy(#[case] raw: &str, #[case] want: DuplicatePolicy) {
		let cfg = DispatchConfig::from_toml_str(&format!("duplicate_policy = \"{raw}\"")).unwrap();
		assert_eq!(cfg.duplicate_policy, want);
		assert!(cfg.verify_tables);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let err = DispatchConfig::from_toml_str("verify = false").unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
	}

	#[test]
	fn loads_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "prime_caches = false\nverify_tables = false").unwrap();
		let cfg = DispatchConfig::load(file.path()).unwrap();
		assert!(!cfg.prime_caches);
		assert!(!cfg.verify_tables);
		assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Reject);
	}

	#[test]
	fn missing_file_reports_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.toml");
		let err = DispatchConfig::load(&path).unwrap_err();
		assert!(err.to_string().contains("absent.toml"));
	}
}
