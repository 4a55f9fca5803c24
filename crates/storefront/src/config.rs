//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults match the live storefront.
//!
//! - `FFTRADERS_CART_KEY` - Storage key holding the cart (default: `fftraders_cart`)
//! - `FFTRADERS_SHIPPING` - Flat shipping charge added to every order (default: 10.00)
//! - `FFTRADERS_ADD_COOLDOWN_MS` - Add-to-cart button cooldown (default: 900)
//! - `FFTRADERS_ADDED_TOAST_MS` - "Added to cart" toast duration (default: 2200)
//! - `FFTRADERS_TOAST_MS` - Default toast duration (default: 2000)
//! - `FFTRADERS_CONTACT_NOTICE_MS` - Contact success notice duration (default: 5000)
//! - `FFTRADERS_STORE_PATH` - File backing the key-value store (default: `.fftraders/storage.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

/// Default storage key for the cart.
pub const DEFAULT_CART_KEY: &str = "fftraders_cart";

/// Default flat shipping charge (10.00).
pub const DEFAULT_SHIPPING: Decimal = Decimal::from_parts(1000, 0, 0, false, 2);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Key under which the serialized cart is stored
    pub cart_key: String,
    /// Flat shipping charge added to the subtotal
    pub shipping: Decimal,
    /// How long the add-to-cart guard stays held after a click
    pub add_cooldown: Duration,
    /// Duration of the "added to cart" toast
    pub added_toast_duration: Duration,
    /// Duration of other toasts
    pub toast_duration: Duration,
    /// Duration of the contact form success notice
    pub contact_notice_duration: Duration,
    /// File backing the key-value store (CLI only)
    pub store_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            cart_key: DEFAULT_CART_KEY.to_string(),
            shipping: DEFAULT_SHIPPING,
            add_cooldown: Duration::from_millis(900),
            added_toast_duration: Duration::from_millis(2200),
            toast_duration: Duration::from_millis(2000),
            contact_notice_duration: Duration::from_millis(5000),
            store_path: PathBuf::from(".fftraders/storage.json"),
            sentry_dsn: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed,
    /// or if the shipping charge is negative.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cart_key = lookup("FFTRADERS_CART_KEY")
            .filter(|key| !key.trim().is_empty())
            .unwrap_or(defaults.cart_key);

        let shipping = match lookup("FFTRADERS_SHIPPING") {
            Some(raw) => parse_shipping(&raw)?,
            None => defaults.shipping,
        };

        Ok(Self {
            cart_key,
            shipping,
            add_cooldown: get_millis(&lookup, "FFTRADERS_ADD_COOLDOWN_MS", defaults.add_cooldown)?,
            added_toast_duration: get_millis(
                &lookup,
                "FFTRADERS_ADDED_TOAST_MS",
                defaults.added_toast_duration,
            )?,
            toast_duration: get_millis(&lookup, "FFTRADERS_TOAST_MS", defaults.toast_duration)?,
            contact_notice_duration: get_millis(
                &lookup,
                "FFTRADERS_CONTACT_NOTICE_MS",
                defaults.contact_notice_duration,
            )?,
            store_path: lookup("FFTRADERS_STORE_PATH")
                .map_or(defaults.store_path, PathBuf::from),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the flat shipping charge, rejecting negative amounts.
fn parse_shipping(raw: &str) -> Result<Decimal, ConfigError> {
    let shipping = raw.trim().parse::<Decimal>().map_err(|e| {
        ConfigError::InvalidEnvVar("FFTRADERS_SHIPPING".to_string(), e.to_string())
    })?;
    if shipping.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            "FFTRADERS_SHIPPING".to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(shipping)
}

/// Get a millisecond duration with a default value.
fn get_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
