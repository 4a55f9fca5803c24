//! Rendering targets.
//!
//! The cart view, checkout flow and notifiers write into named page regions
//! without knowing what draws them. A [`Page`] may lack any region (a product
//! page has no cart table); writes to a missing region return `false` and
//! callers skip the update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A named element on the storefront page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Cart badge in the header.
    CartCount,
    /// Table body holding the cart rows.
    CartItems,
    CartSubtotal,
    CartTotal,
    /// Placeholder shown when the cart is empty.
    EmptyCart,
    /// Section wrapping the cart table.
    CartSection,
    /// Box with subtotal, shipping and total.
    CartTotals,
    CheckoutModal,
    CheckoutTotal,
    /// Contact form success notice.
    FormSuccess,
    Toast,
    AlertModal,
    AlertTitle,
    AlertMessage,
    AlertIcon,
}

impl Region {
    /// Every region, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::CartCount,
        Self::CartItems,
        Self::CartSubtotal,
        Self::CartTotal,
        Self::EmptyCart,
        Self::CartSection,
        Self::CartTotals,
        Self::CheckoutModal,
        Self::CheckoutTotal,
        Self::FormSuccess,
        Self::Toast,
        Self::AlertModal,
        Self::AlertTitle,
        Self::AlertMessage,
        Self::AlertIcon,
    ];

    /// Regions present on every storefront page (header badge and notifiers).
    pub const CHROME: [Self; 6] = [
        Self::CartCount,
        Self::Toast,
        Self::AlertModal,
        Self::AlertTitle,
        Self::AlertMessage,
        Self::AlertIcon,
    ];

    /// DOM selector for the region.
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::CartCount => ".cart-count",
            Self::CartItems => "#cart-items",
            Self::CartSubtotal => "#cart-subtotal",
            Self::CartTotal => "#cart-total",
            Self::EmptyCart => "#empty-cart",
            Self::CartSection => "#cart",
            Self::CartTotals => "#cart-totals",
            Self::CheckoutModal => "#checkout-modal",
            Self::CheckoutTotal => "#checkout-total",
            Self::FormSuccess => "#form-success",
            Self::Toast => "#add-toast",
            Self::AlertModal => "#custom-alert-modal",
            Self::AlertTitle => "#alert-title",
            Self::AlertMessage => "#alert-message",
            Self::AlertIcon => "#alert-icon",
        }
    }
}

/// A rendering surface addressed by [`Region`].
///
/// Handles are cheap clones sharing one surface, so timers can hold a copy
/// and update the page after the command that armed them has returned.
pub trait Page: Clone + Send + Sync + 'static {
    /// Whether the region exists on this page.
    fn has(&self, region: Region) -> bool;

    /// Replace the region's text content.
    fn set_text(&self, region: Region, text: &str) -> bool;

    /// Replace the region's markup. `html` must already be escaped.
    fn set_html(&self, region: Region, html: &str) -> bool;

    /// Show or hide the region.
    fn set_visible(&self, region: Region, visible: bool) -> bool;

    /// Replace the region's modifier class.
    fn set_class(&self, region: Region, class: &str) -> bool;
}

/// Snapshot of one region of a [`MemoryPage`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionState {
    pub content: String,
    pub visible: bool,
    pub class: String,
}

/// In-memory [`Page`] used by tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    regions: Arc<Mutex<HashMap<Region, RegionState>>>,
}

impl MemoryPage {
    /// A page with exactly the given regions, all hidden and empty.
    #[must_use]
    pub fn with_regions(regions: &[Region]) -> Self {
        let map = regions
            .iter()
            .map(|region| (*region, RegionState::default()))
            .collect();
        Self {
            regions: Arc::new(Mutex::new(map)),
        }
    }

    /// A page with every region, like the cart page of the live site.
    #[must_use]
    pub fn cart_page() -> Self {
        Self::with_regions(&Region::ALL)
    }

    /// A product listing page: badge and notifiers only.
    #[must_use]
    pub fn product_page() -> Self {
        Self::with_regions(&Region::CHROME)
    }

    /// Current state of a region, if present.
    #[must_use]
    pub fn region(&self, region: Region) -> Option<RegionState> {
        self.lock().get(&region).cloned()
    }

    /// Current content of a region, if present.
    #[must_use]
    pub fn content(&self, region: Region) -> Option<String> {
        self.region(region).map(|state| state.content)
    }

    /// Whether a region is present and visible.
    #[must_use]
    pub fn is_visible(&self, region: Region) -> bool {
        self.region(region).is_some_and(|state| state.visible)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Region, RegionState>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, region: Region, apply: impl FnOnce(&mut RegionState)) -> bool {
        self.lock().get_mut(&region).map(apply).is_some()
    }
}

impl Page for MemoryPage {
    fn has(&self, region: Region) -> bool {
        self.lock().contains_key(&region)
    }

    fn set_text(&self, region: Region, text: &str) -> bool {
        self.update(region, |state| text.clone_into(&mut state.content))
    }

    fn set_html(&self, region: Region, html: &str) -> bool {
        self.update(region, |state| html.clone_into(&mut state.content))
    }

    fn set_visible(&self, region: Region, visible: bool) -> bool {
        self.update(region, |state| state.visible = visible)
    }

    fn set_class(&self, region: Region, class: &str) -> bool {
        self.update(region, |state| class.clone_into(&mut state.class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_region_reports_false() {
        let page = MemoryPage::product_page();
        assert!(!page.has(Region::CartItems));
        assert!(!page.set_html(Region::CartItems, "<tr></tr>"));
        assert_eq!(page.content(Region::CartItems), None);
    }

    #[test]
    fn test_clones_share_state() {
        let page = MemoryPage::cart_page();
        let handle = page.clone();
        assert!(handle.set_text(Region::CartCount, "3"));
        assert!(handle.set_visible(Region::Toast, true));
        assert_eq!(page.content(Region::CartCount).as_deref(), Some("3"));
        assert!(page.is_visible(Region::Toast));
    }

    #[test]
    fn test_selectors_are_distinct() {
        let mut selectors: Vec<_> = Region::ALL.iter().map(|r| r.selector()).collect();
        selectors.sort_unstable();
        selectors.dedup();
        assert_eq!(selectors.len(), Region::ALL.len());
    }
}
