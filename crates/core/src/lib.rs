//! FF Traders Core - Shared types library.
//!
//! This crate provides the types shared by the storefront cart library and
//! the command-line tools:
//! - `storefront` - Cart engine, rendering and checkout flow
//! - `cli` - Command-line driver over a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no storage,
//! no rendering. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product/order IDs, prices, emails,
//!   payment methods, line items and notification levels

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
