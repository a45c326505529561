//! Configuration for the integrity core

use serde::{Deserialize, Serialize};

use crate::digest::DIGEST_LEN;

/// Integrity core configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Merkle tree construction
    pub merkle: MerkleConfig,

    /// Digest rendering in logs
    pub display: DisplayConfig,
}

/// Merkle tree configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerkleConfig {
    /// Hash leaves on worker threads (needs the `parallel` feature)
    pub parallel_leaf_hashing: bool,

    /// Minimum leaf count before parallel hashing kicks in
    pub parallel_threshold: usize,

    /// Bytes per leaf when splitting a payload into chunks
    pub chunk_size: usize,
}

impl Default for MerkleConfig {
    fn default() -> Self {
        Self {
            parallel_leaf_hashing: true,
            parallel_threshold: 64,
            chunk_size: 100 * 1024, // 100 KiB
        }
    }
}

/// Digest display configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Leading digest bytes shown in abbreviated hex
    pub short_digest_bytes: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            short_digest_bytes: 4,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(value) = std::env::var("INTEGRITY_PARALLEL_LEAF_HASHING") {
            config.merkle.parallel_leaf_hashing = parse_env("INTEGRITY_PARALLEL_LEAF_HASHING", &value)?;
        }

        if let Ok(value) = std::env::var("INTEGRITY_PARALLEL_THRESHOLD") {
            config.merkle.parallel_threshold = parse_env("INTEGRITY_PARALLEL_THRESHOLD", &value)?;
        }

        if let Ok(value) = std::env::var("INTEGRITY_CHUNK_SIZE") {
            config.merkle.chunk_size = parse_env("INTEGRITY_CHUNK_SIZE", &value)?;
        }

        if let Ok(value) = std::env::var("INTEGRITY_SHORT_DIGEST_BYTES") {
            config.display.short_digest_bytes = parse_env("INTEGRITY_SHORT_DIGEST_BYTES", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values no build could use
    pub fn validate(&self) -> crate::Result<()> {
        if self.merkle.chunk_size == 0 {
            return Err(crate::Error::Config("merkle.chunk_size must be > 0".into()));
        }

        let short = self.display.short_digest_bytes;
        if short == 0 || short > DIGEST_LEN {
            return Err(crate::Error::Config(format!(
                "display.short_digest_bytes must be in 1..={}, got {}",
                DIGEST_LEN, short
            )));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| crate::Error::Config(format!("Invalid {}={:?}: {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.merkle.parallel_leaf_hashing);
        assert_eq!(config.merkle.chunk_size, 102_400);
        assert_eq!(config.display.short_digest_bytes, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[merkle]\nchunk_size = 4096\n").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.merkle.chunk_size, 4096);
        assert_eq!(config.merkle.parallel_threshold, 64);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_from_file_rejects_zero_chunk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[merkle]\nchunk_size = 0\n").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "merkle = 12 = 3").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::from_file("/nonexistent/integrity.toml").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_validate_short_digest_bounds() {
        let mut config = Config::default();
        config.display.short_digest_bytes = 33;
        assert!(config.validate().is_err());
        config.display.short_digest_bytes = 32;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env::<usize>("X", " 12 ").unwrap(), 12);
        assert!(parse_env::<bool>("X", "maybe").is_err());
    }
}
