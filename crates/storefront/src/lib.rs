//! FF Traders storefront library.
//!
//! Client-side shopping cart, cart page rendering, checkout and contact
//! flows for the FF Traders store. The page is abstracted behind
//! [`page::Page`] and persistence behind [`storage::KeyValueStore`], so the
//! whole storefront runs and is tested without a browser.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod contact;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod notify;
pub mod page;
pub mod storage;
pub mod view;
