//! Core types for FF Traders.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod line_item;
pub mod payment;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use line_item::{LineItem, clamp_quantity, parse_quantity};
pub use payment::{PaymentMethod, PaymentMethodError};
pub use price::{CurrencyCode, Price, parse_amount, round_cents};
pub use status::*;
