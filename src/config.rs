//! Forum Configuration
//!
//! Loads configuration from environment variables. All settings have
//! working defaults so tests and embedded use can rely on `Config::default()`.

use anyhow::Result;
use std::env;

/// Forum-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum username length (default: 2)
    pub minimum_username_length: usize,

    /// Maximum username length (default: 16)
    pub maximum_username_length: usize,

    /// Maximum "about me" length (default: 1000)
    pub maximum_about_me_length: usize,

    /// Maximum signature length (default: 255)
    pub maximum_signature_length: usize,

    /// Minimum reputation required to edit the "about me" field
    pub min_rep_aboutme: i64,

    /// Minimum reputation required to edit the signature field
    pub min_rep_signature: i64,

    /// Disable all reputation checks (default: false)
    pub reputation_disabled: bool,

    /// Allow a user to wear more than one group badge (default: false)
    pub allow_multiple_badges: bool,

    /// Global post-queue toggle (default: off)
    pub post_queue: bool,

    /// Reputation at or above which the post queue is bypassed
    pub post_queue_reputation_threshold: i64,

    /// Seconds a user must wait between posts (default: 10)
    pub post_delay_seconds: i64,

    /// Minimum password length (default: 6)
    pub minimum_password_length: usize,

    /// Forbid non-admin password edits (default: false)
    pub password_disable_edit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minimum_username_length: 2,
            maximum_username_length: 16,
            maximum_about_me_length: 1000,
            maximum_signature_length: 255,
            min_rep_aboutme: 0,
            min_rep_signature: 0,
            reputation_disabled: false,
            allow_multiple_badges: false,
            post_queue: false,
            post_queue_reputation_threshold: 0,
            post_delay_seconds: 10,
            minimum_password_length: 6,
            password_disable_edit: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            minimum_username_length: env_parse(
                "LECTERN_MIN_USERNAME_LENGTH",
                defaults.minimum_username_length,
            ),
            maximum_username_length: env_parse(
                "LECTERN_MAX_USERNAME_LENGTH",
                defaults.maximum_username_length,
            ),
            maximum_about_me_length: env_parse(
                "LECTERN_MAX_ABOUT_ME_LENGTH",
                defaults.maximum_about_me_length,
            ),
            maximum_signature_length: env_parse(
                "LECTERN_MAX_SIGNATURE_LENGTH",
                defaults.maximum_signature_length,
            ),
            min_rep_aboutme: env_parse("LECTERN_MIN_REP_ABOUTME", defaults.min_rep_aboutme),
            min_rep_signature: env_parse("LECTERN_MIN_REP_SIGNATURE", defaults.min_rep_signature),
            reputation_disabled: env_flag("LECTERN_REPUTATION_DISABLED"),
            allow_multiple_badges: env_flag("LECTERN_ALLOW_MULTIPLE_BADGES"),
            post_queue: env_flag("LECTERN_POST_QUEUE"),
            post_queue_reputation_threshold: env_parse(
                "LECTERN_POST_QUEUE_REP_THRESHOLD",
                defaults.post_queue_reputation_threshold,
            ),
            post_delay_seconds: env_parse("LECTERN_POST_DELAY", defaults.post_delay_seconds),
            minimum_password_length: env_parse(
                "LECTERN_MIN_PASSWORD_LENGTH",
                defaults.minimum_password_length,
            ),
            password_disable_edit: env_flag("LECTERN_PASSWORD_DISABLE_EDIT"),
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.minimum_username_length, 2);
        assert_eq!(config.maximum_username_length, 16);
        assert!(!config.post_queue);
        assert!(!config.reputation_disabled);
    }

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.maximum_signature_length, 255);
    }
}
