//! Payment method selection.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PaymentMethod`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethodError {
    /// No method was selected.
    #[error("payment method cannot be empty")]
    Empty,
}

/// The payment option chosen at checkout (e.g. `cod`, `card`, `bank`).
///
/// The storefront does not process payments, so the value is the raw
/// option key from the form, trimmed. It is only echoed back in the
/// confirmation notice and the recorded order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Parse a payment method from a form value.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentMethodError::Empty`] for blank input.
    pub fn parse(value: &str) -> Result<Self, PaymentMethodError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PaymentMethodError::Empty);
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns the option key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercased label used in confirmation notices.
    #[must_use]
    pub fn label(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
