//! Cart page rendering.
//!
//! Rows are produced by an auto-escaping askama template, so product names,
//! ids and image URLs cannot inject markup. Each render replaces the row
//! markup and the set of row controls wholesale; commands aimed at rows
//! from an earlier render are rejected as stale.

use askama::Template;
use fftraders_core::{LineItem, Price, ProductId};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::cart::Cart;
use crate::error::AppError;
use crate::page::{Page, Region};

/// Cart row display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub total: String,
    pub item_count: u64,
}

impl CartView {
    /// Build the display data for a cart with the given shipping charge.
    #[must_use]
    pub fn new(cart: &Cart, shipping: Decimal) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: Price::usd(cart.subtotal()).display(),
            total: Price::usd(cart.total(shipping)).display(),
            item_count: cart.total_count(),
        }
    }
}

impl From<&LineItem> for CartItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            price: item.unit_price().display(),
            line_total: Price::usd(item.line_total()).display(),
        }
    }
}

/// Cart rows fragment template.
#[derive(Template)]
#[template(path = "cart/items.html")]
pub struct CartItemsTemplate {
    pub rows: Vec<CartItemView>,
}

/// Kind of per-row control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Remove,
    Quantity,
}

/// A control bound to one rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowControl {
    pub kind: ControlKind,
    pub product_id: ProductId,
}

/// What a render did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The page has no cart table; nothing was touched.
    Skipped,
    /// The empty-cart placeholder is showing.
    Empty,
    /// The cart table shows this many rows.
    Populated { rows: usize },
}

/// Renders the cart into page regions and tracks row bindings.
#[derive(Debug, Default)]
pub struct CartRenderer {
    controls: Vec<RowControl>,
}

impl CartRenderer {
    /// A renderer with no rows bound yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls bound by the most recent render.
    #[must_use]
    pub fn controls(&self) -> &[RowControl] {
        &self.controls
    }

    /// Whether a control for this row exists in the current render.
    #[must_use]
    pub fn is_bound(&self, kind: ControlKind, product_id: &ProductId) -> bool {
        self.controls
            .iter()
            .any(|control| control.kind == kind && &control.product_id == product_id)
    }

    /// Render `cart` into `page`.
    ///
    /// Requires the item, subtotal and total regions; pages without them
    /// are left untouched.
    #[instrument(skip_all, fields(items = cart.len()))]
    pub fn render<P: Page>(&mut self, page: &P, cart: &Cart, shipping: Decimal) -> RenderOutcome {
        let required = [Region::CartItems, Region::CartSubtotal, Region::CartTotal];
        if !required.iter().all(|region| page.has(*region)) {
            debug!("Cart regions missing, skipping render");
            return RenderOutcome::Skipped;
        }

        self.controls.clear();

        if cart.is_empty() {
            page.set_html(Region::CartItems, "");
            page.set_visible(Region::EmptyCart, true);
            page.set_visible(Region::CartSection, false);
            page.set_visible(Region::CartTotals, false);
            return RenderOutcome::Empty;
        }

        let CartView {
            items,
            subtotal,
            total,
            ..
        } = CartView::new(cart, shipping);
        let rows = items.len();
        let html = match (CartItemsTemplate { rows: items }).render() {
            Ok(html) => html,
            Err(e) => {
                AppError::from(e).report();
                return RenderOutcome::Skipped;
            }
        };

        page.set_visible(Region::EmptyCart, false);
        page.set_visible(Region::CartSection, true);
        page.set_visible(Region::CartTotals, true);
        page.set_html(Region::CartItems, &html);
        page.set_text(Region::CartSubtotal, &subtotal);
        page.set_text(Region::CartTotal, &total);

        self.controls = cart
            .items()
            .iter()
            .flat_map(|item| {
                [ControlKind::Remove, ControlKind::Quantity].map(|kind| RowControl {
                    kind,
                    product_id: item.id.clone(),
                })
            })
            .collect();

        RenderOutcome::Populated { rows }
    }
}
