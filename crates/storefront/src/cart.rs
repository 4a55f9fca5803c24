//! Cart engine.
//!
//! [`Cart`] is the pure in-memory model: an ordered list of line items with
//! at most one entry per product. [`CartService`] performs the
//! read-modify-write cycle against [`CartStorage`] for every operation and
//! refreshes the header badge afterwards.

use fftraders_core::{LineItem, ProductId, clamp_quantity};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::error::{AppError, add_breadcrumb};
use crate::page::{Page, Region};
use crate::storage::{CartStorage, KeyValueStore};

/// Ordered collection of line items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from stored items, merging repeated products.
    ///
    /// The first occurrence of a product keeps its position; later
    /// occurrences add their quantity to it.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add(item);
        }
        cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consume the cart, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products, not the sum of quantities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Look up the entry for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Add an item, or increase the quantity of the existing entry.
    pub fn add(&mut self, item: LineItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity.max(1));
        } else {
            let quantity = item.quantity.max(1);
            self.items.push(LineItem { quantity, ..item });
        }
    }

    /// Remove a product. Returns whether an entry was removed.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Set a product's quantity, clamped to at least one.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) -> bool {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .map(|item| item.quantity = quantity.max(1))
            .is_some()
    }

    /// Sum of quantities, shown on the badge.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of price times quantity, excluding shipping.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Subtotal plus the flat shipping charge.
    #[must_use]
    pub fn total(&self, shipping: Decimal) -> Decimal {
        self.subtotal() + shipping
    }
}

/// Cart operations backed by a store, with badge refresh.
///
/// Every operation re-reads the stored cart, applies the change, writes the
/// whole list back and updates the badge. Storage failures are reported and
/// absorbed; the returned cart reflects the change either way.
#[derive(Debug, Clone)]
pub struct CartService<S, P> {
    storage: CartStorage<S>,
    page: P,
}

impl<S: KeyValueStore, P: Page> CartService<S, P> {
    /// Service writing through `storage` and drawing the badge on `page`.
    pub const fn new(storage: CartStorage<S>, page: P) -> Self {
        Self { storage, page }
    }

    /// The underlying storage adapter.
    #[must_use]
    pub const fn storage(&self) -> &CartStorage<S> {
        &self.storage
    }

    /// The page the badge is written to.
    #[must_use]
    pub const fn page(&self) -> &P {
        &self.page
    }

    /// Read the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        Cart::from_items(self.storage.load())
    }

    /// Add an item, merging with an existing entry for the same product.
    #[instrument(skip(self, item), fields(product_id = %item.id, quantity = item.quantity))]
    pub fn add_item(&mut self, item: LineItem) -> Cart {
        let id = item.id.clone();
        let mut cart = self.cart();
        cart.add(item);
        debug!(items = cart.len(), "Item added");
        add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));
        self.commit(&cart);
        cart
    }

    /// Remove a product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_item(&mut self, id: &ProductId) -> Cart {
        let mut cart = self.cart();
        if cart.remove(id) {
            add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.as_str())]));
        } else {
            debug!("Product not in cart");
        }
        self.commit(&cart);
        cart
    }

    /// Set a product's quantity from a raw requested value.
    ///
    /// Non-finite or sub-1 requests become 1 and fractions floor. Unknown
    /// products leave the cart unchanged, though the badge is still redrawn.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn set_quantity(&mut self, id: &ProductId, requested: f64) -> Cart {
        let mut cart = self.cart();
        let quantity = clamp_quantity(requested);
        if !cart.set_quantity(id, quantity) {
            debug!("Product not in cart, quantity unchanged");
            self.refresh_badge_with(&cart);
            return cart;
        }
        self.commit(&cart);
        cart
    }

    /// Delete the stored cart and reset the badge.
    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        if let Err(e) = self.storage.clear() {
            AppError::from(e).report();
        }
        self.refresh_badge_with(&Cart::new());
    }

    /// Write the stored cart's count to the badge.
    pub fn refresh_badge(&self) {
        self.refresh_badge_with(&self.cart());
    }

    fn refresh_badge_with(&self, cart: &Cart) {
        if !self
            .page
            .set_text(Region::CartCount, &cart.total_count().to_string())
        {
            debug!("No cart badge on page");
        }
    }

    fn commit(&mut self, cart: &Cart) {
        if let Err(e) = self.storage.save(cart.items()) {
            AppError::from(e).report();
        }
        self.refresh_badge_with(cart);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;
    use crate::storage::MemoryStore;

    fn item(id: &str, price_cents: i64, quantity: u32) -> LineItem {
        LineItem::new(id, format!("Product {id}"), Decimal::new(price_cents, 2), quantity)
    }

    fn service() -> CartService<MemoryStore, MemoryPage> {
        CartService::new(
            CartStorage::new(MemoryStore::new(), "cart"),
            MemoryPage::product_page(),
        )
    }

    #[test]
    fn test_add_same_product_increments() {
        let mut cart = Cart::new();
        cart.add(item("A", 100, 1));
        cart.add(item("A", 100, 2));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut cart = Cart::new();
        cart.add(item("B", 100, 1));
        cart.add(item("A", 100, 1));
        cart.add(item("B", 100, 1));
        let ids: Vec<_> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["B", "A"]);
    }

    #[test]
    fn test_add_saturates() {
        let mut cart = Cart::new();
        cart.add(item("A", 100, u32::MAX));
        cart.add(item("A", 100, 5));
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::from_items(vec![item("A", 100, 1)]);
        let before = cart.clone();
        assert!(!cart.remove(&ProductId::new("Z")));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_from_items_merges_duplicates() {
        let cart = Cart::from_items(vec![item("A", 100, 1), item("B", 50, 1), item("A", 100, 4)]);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(&ProductId::new("A")).unwrap().quantity, 5);
    }

    #[test]
    fn test_totals() {
        let cart = Cart::from_items(vec![item("A", 1250, 2), item("B", 199, 3)]);
        assert_eq!(cart.total_count(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(3097, 2));
        assert_eq!(cart.total(Decimal::new(10, 0)), Decimal::new(4097, 2));
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = Cart::new();
        assert_eq!(cart.subtotal(), Decimal::ZERO);
        assert_eq!(cart.total(Decimal::new(10, 0)), Decimal::new(10, 0));
    }

    #[test]
    fn test_service_persists_and_updates_badge() {
        let mut service = service();
        service.add_item(item("A", 100, 1));
        service.add_item(item("A", 100, 2));
        service.add_item(item("B", 100, 1));

        let stored = service.storage().load();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].quantity, 3);
        assert_eq!(
            service.page().content(Region::CartCount).as_deref(),
            Some("4")
        );
    }

    #[test]
    fn test_service_set_quantity_clamps() {
        let mut service = service();
        service.add_item(item("A", 100, 5));
        let a = ProductId::new("A");

        for (requested, expected) in [(0.0, 1), (-5.0, 1), (2.7, 2), (f64::NAN, 1), (7.0, 7)] {
            let cart = service.set_quantity(&a, requested);
            assert_eq!(cart.get(&a).unwrap().quantity, expected, "requested {requested}");
        }
        assert_eq!(service.cart().get(&a).unwrap().quantity, 7);
    }

    #[test]
    fn test_service_set_quantity_unknown_is_noop() {
        let mut service = service();
        service.add_item(item("A", 100, 2));
        let cart = service.set_quantity(&ProductId::new("nope"), 9.0);
        assert_eq!(cart.total_count(), 2);
        assert_eq!(service.cart().total_count(), 2);
        assert_eq!(service.page().content(Region::CartCount).as_deref(), Some("2"));
    }

    #[test]
    fn test_service_set_quantity_on_fresh_page_draws_badge() {
        let mut service = service();
        assert_eq!(service.page().content(Region::CartCount).as_deref(), Some(""));

        let cart = service.set_quantity(&ProductId::new("0"), 0.0);
        assert!(cart.is_empty());
        assert_eq!(service.page().content(Region::CartCount).as_deref(), Some("0"));
        assert_eq!(service.storage().store().get("cart").unwrap(), None);
    }

    #[test]
    fn test_service_remove_and_clear() {
        let mut service = service();
        service.add_item(item("A", 100, 2));
        service.add_item(item("B", 100, 1));

        let cart = service.remove_item(&ProductId::new("A"));
        assert_eq!(cart.len(), 1);
        assert_eq!(service.page().content(Region::CartCount).as_deref(), Some("1"));

        service.clear();
        assert!(service.cart().is_empty());
        assert_eq!(service.storage().store().get("cart").unwrap(), None);
        assert_eq!(service.page().content(Region::CartCount).as_deref(), Some("0"));
    }

    #[test]
    fn test_service_without_badge_region() {
        let mut service = CartService::new(
            CartStorage::new(MemoryStore::new(), "cart"),
            MemoryPage::with_regions(&[]),
        );
        let cart = service.add_item(item("A", 100, 1));
        assert_eq!(cart.total_count(), 1);
    }
}
