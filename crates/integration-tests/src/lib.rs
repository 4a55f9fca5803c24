//! Integration tests for the FF Traders storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fftraders-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_flow` - End-to-end flows over a file-backed store
//! - `cart_properties` - Property tests for cart invariants

use std::sync::Arc;

use fftraders_storefront::cart::CartService;
use fftraders_storefront::config::StorefrontConfig;
use fftraders_storefront::dispatch::Dispatcher;
use fftraders_storefront::events::MemoryEventSink;
use fftraders_storefront::notify::PageNotifier;
use fftraders_storefront::page::MemoryPage;
use fftraders_storefront::storage::{CartStorage, FileStore};

/// A dispatcher over a file store, with handles for inspection.
pub struct TestStorefront {
    pub page: MemoryPage,
    pub sink: Arc<MemoryEventSink>,
    pub dispatcher: Dispatcher<FileStore, MemoryPage>,
}

impl TestStorefront {
    /// Open a storefront on `store` with a fresh cart page.
    #[must_use]
    pub fn open(store: FileStore) -> Self {
        Self::with_page(store, MemoryPage::cart_page())
    }

    /// Open a storefront on `store` rendering into `page`.
    #[must_use]
    pub fn with_page(store: FileStore, page: MemoryPage) -> Self {
        let config = StorefrontConfig::default();
        let sink = Arc::new(MemoryEventSink::new());
        let service = CartService::new(CartStorage::new(store, config.cart_key.clone()), page.clone());
        let dispatcher = Dispatcher::new(
            service,
            Arc::new(PageNotifier::new(page.clone())),
            sink.clone(),
            config,
        );
        Self {
            page,
            sink,
            dispatcher,
        }
    }
}
