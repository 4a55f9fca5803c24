//! Subcommand implementations.
//!
//! Each invocation builds a fresh [`Dispatcher`] over the file-backed store
//! and an in-memory page, replays `Init` and then applies its own commands.
//! Whatever the storefront would have drawn is read back from the page and
//! printed.

use std::sync::Arc;

use fftraders_storefront::cart::CartService;
use fftraders_storefront::config::StorefrontConfig;
use fftraders_storefront::dispatch::{Command, Dispatcher};
use fftraders_storefront::events::LogEventSink;
use fftraders_storefront::notify::{Alert, PageNotifier};
use fftraders_storefront::page::{MemoryPage, Region};
use fftraders_storefront::storage::{CartStorage, FileStore};
use thiserror::Error;

pub mod cart;
pub mod checkout;
pub mod contact;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The storefront refused the action and showed this alert.
    #[error("{title}: {message}")]
    Rejected { title: String, message: String },

    /// The row is not in the cart.
    #[error("Product not in cart: {0}")]
    NotInCart(String),
}

impl From<Alert> for CommandError {
    fn from(alert: Alert) -> Self {
        Self::Rejected {
            title: alert.title,
            message: alert.message,
        }
    }
}

/// A storefront session over the configured store.
pub struct Session {
    pub page: MemoryPage,
    pub dispatcher: Dispatcher<FileStore, MemoryPage>,
}

impl Session {
    /// Open the store and draw the cart page.
    pub fn open(config: StorefrontConfig) -> Self {
        let page = MemoryPage::cart_page();
        let storage = CartStorage::new(
            FileStore::new(config.store_path.clone()),
            config.cart_key.clone(),
        );
        let mut dispatcher = Dispatcher::new(
            CartService::new(storage, page.clone()),
            Arc::new(PageNotifier::new(page.clone())),
            Arc::new(LogEventSink),
            config,
        );
        dispatcher.dispatch(Command::Init);
        Self { page, dispatcher }
    }

    /// Text of a page region, empty if unset.
    pub fn text(&self, region: Region) -> String {
        self.page.content(region).unwrap_or_default()
    }

    /// Print the toast if one is showing.
    #[allow(clippy::print_stdout)]
    pub fn print_toast(&self) {
        if self.page.is_visible(Region::Toast) {
            println!("{}", self.text(Region::Toast));
        }
    }
}
