use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;

/// Table parameters persisted as TOML.
///
/// Fields:
/// - prime_bits: width of the shared prime modulus
/// - key_bits: width of each participant's exponents
/// - deck_size: number of cards in the deck
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub prime_bits: u64,
    pub key_bits: u64,
    pub deck_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prime_bits: 256,
            key_bits: 32,
            deck_size: 52,
        }
    }
}

impl Config {
    /// Load configuration from `path`. If the file does not exist, create it
    /// with reasonable defaults and return the default config.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)
                .with_context(|| format!("reading config file '{}'", path.display()))?;
            let cfg: Config = toml::from_str(&s)
                .with_context(|| format!("parsing TOML config '{}'", path.display()))?;
            Ok(cfg)
        } else {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("creating config directory '{}'", parent.display())
                    })?;
                }
            }

            let cfg = Config::default();
            let toml_text = toml::to_string_pretty(&cfg)
                .with_context(|| "serializing default config to TOML")?;
            fs::write(path, toml_text)
                .with_context(|| format!("writing default config to '{}'", path.display()))?;
            Ok(cfg)
        }
    }

    /// Save the current config state back to the provided path (overwrites).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating config directory '{}'", parent.display()))?;
            }
        }
        let toml_text =
            toml::to_string_pretty(&self).with_context(|| "serializing config to TOML")?;
        fs::write(path, toml_text)
            .with_context(|| format!("writing config to '{}'", path.display()))?;
        Ok(())
    }

    /// Check the cryptographic parameter bounds.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.prime_bits >= 32,
            "prime width must be at least 32 bits, got {}",
            self.prime_bits
        );
        anyhow::ensure!(
            self.key_bits >= 16,
            "key width must be at least 16 bits, got {}",
            self.key_bits
        );
        anyhow::ensure!(
            self.key_bits < self.prime_bits,
            "key width ({}) must be smaller than the prime width ({})",
            self.key_bits,
            self.prime_bits
        );
        anyhow::ensure!(self.deck_size >= 2, "a deck needs at least 2 cards");
        // Plaintexts run up to deck_size + 1 and must stay below any prime
        // of the configured width, the smallest being 2^(prime_bits - 1).
        if self.prime_bits <= 64 {
            let floor = 1u128 << (self.prime_bits - 1);
            anyhow::ensure!(
                (self.deck_size as u128 + 1) < floor,
                "deck of {} cards does not fit under a {}-bit prime",
                self.deck_size,
                self.prime_bits
            );
        }
        Ok(())
    }
}
