//! Checkout modal and order placement.
//!
//! The flow is a small state machine:
//!
//! ```text
//! Idle -> ModalOpen -> (validate) -> ModalOpen            on rejection
//!                                 -> AwaitingAcknowledgement -> Idle
//! ```
//!
//! No payment is taken. A placed order is handed to the [`EventSink`] and
//! the cart is cleared only once the user acknowledges the confirmation.

use chrono::{DateTime, Utc};
use fftraders_core::{LineItem, OrderId, PaymentMethod, Price, round_cents};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::cart::{Cart, CartService};
use crate::events::EventSink;
use crate::notify::Alert;
use crate::page::{Page, Region};
use crate::storage::KeyValueStore;

/// Reasons checkout cannot proceed, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutRejection {
    #[error("Your cart is empty! Please add items before checkout.")]
    EmptyCart,
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Please select a payment method")]
    MissingPaymentMethod,
    #[error("Please agree to the terms & conditions")]
    TermsNotAccepted,
}

impl CheckoutRejection {
    /// Alert title for the rejection.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::EmptyCart => "Empty Cart",
            Self::MissingFields => "Missing Fields",
            Self::MissingPaymentMethod => "Payment Method",
            Self::TermsNotAccepted => "Terms & Conditions",
        }
    }

    /// Alert icon for the rejection.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::EmptyCart => "🛒",
            Self::MissingFields => "⚠️",
            Self::MissingPaymentMethod => "💳",
            Self::TermsNotAccepted => "📋",
        }
    }

    /// The alert shown to the user.
    #[must_use]
    pub fn alert(self) -> Alert {
        Alert::new(self.title(), self.to_string(), self.icon())
    }
}

/// Checkout form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    /// Selected payment option, if any.
    pub payment_method: Option<String>,
    pub agreed_to_terms: bool,
}

/// Validated contact and shipping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingDetails {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Validate the form. The first failing rule wins.
    ///
    /// # Errors
    ///
    /// Returns the rejection for the first missing field group, payment
    /// method or terms agreement, in that order.
    pub fn validate(&self) -> Result<ShippingDetails, CheckoutRejection> {
        let full_name = self.full_name.trim();
        let phone = self.phone.trim();
        let address = self.address.trim();
        let city = self.city.trim();

        if [full_name, phone, address, city].iter().any(|f| f.is_empty()) {
            return Err(CheckoutRejection::MissingFields);
        }

        let payment_method = self
            .payment_method
            .as_deref()
            .and_then(|method| PaymentMethod::parse(method).ok())
            .ok_or(CheckoutRejection::MissingPaymentMethod)?;

        if !self.agreed_to_terms {
            return Err(CheckoutRejection::TermsNotAccepted);
        }

        Ok(ShippingDetails {
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
            city: city.to_string(),
            payment_method,
        })
    }
}

/// A placed order. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub details: ShippingDetails,
    pub items: Vec<LineItem>,
    /// Subtotal plus shipping, rounded to cents.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Snapshot `cart` into an order.
    #[must_use]
    pub fn new(
        details: ShippingDetails,
        cart: &Cart,
        shipping: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            details,
            items: cart.items().to_vec(),
            total: round_cents(cart.total(shipping)),
            created_at,
        }
    }

    /// The confirmation shown once the order is placed.
    #[must_use]
    pub fn confirmation(&self) -> Alert {
        Alert::new(
            "✓ Order Placed Successfully!",
            format!(
                "Payment Method: {}\n\nWe'll contact you at: {}",
                self.details.payment_method.label(),
                self.details.phone
            ),
            "✓",
        )
    }
}

/// Where the checkout flow is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    ModalOpen,
    /// Order placed; the cart is cleared once the user acknowledges.
    AwaitingAcknowledgement,
}

/// Result of a place-order attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOrder {
    /// The modal is not open; nothing happened.
    NotOpen,
    /// Validation failed; the modal stays open.
    Rejected(CheckoutRejection),
    /// The order was recorded and awaits acknowledgement.
    Placed(Box<Order>),
}

/// Checkout state machine.
#[derive(Debug, Default)]
pub struct CheckoutFlow {
    phase: CheckoutPhase,
}

impl CheckoutFlow {
    /// A flow in the idle phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Open the checkout modal and show the order total.
    ///
    /// Returns `Ok(None)` without touching the page while a placed order
    /// awaits acknowledgement; the modal cannot be reopened until the
    /// pending order has cleared the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutRejection::EmptyCart`] when there is nothing to
    /// check out; the flow stays idle.
    #[instrument(skip_all)]
    pub fn open<P: Page>(
        &mut self,
        page: &P,
        cart: &Cart,
        shipping: Decimal,
    ) -> Result<Option<Decimal>, CheckoutRejection> {
        if self.phase == CheckoutPhase::AwaitingAcknowledgement {
            debug!("Order awaiting acknowledgement, not reopening checkout");
            return Ok(None);
        }
        if cart.is_empty() {
            return Err(CheckoutRejection::EmptyCart);
        }

        let total = cart.total(shipping);
        page.set_visible(Region::CheckoutModal, true);
        page.set_text(Region::CheckoutTotal, &Price::usd(total).display());
        self.phase = CheckoutPhase::ModalOpen;
        Ok(Some(total))
    }

    /// Close the modal without placing an order.
    ///
    /// Ignored while a placed order awaits acknowledgement.
    pub fn close<P: Page>(&mut self, page: &P) {
        if self.phase == CheckoutPhase::ModalOpen {
            page.set_visible(Region::CheckoutModal, false);
            self.phase = CheckoutPhase::Idle;
        }
    }

    /// Validate the form and place the order.
    #[instrument(skip_all)]
    pub fn place_order(
        &mut self,
        form: &CheckoutForm,
        cart: &Cart,
        shipping: Decimal,
        sink: &dyn EventSink,
    ) -> PlaceOrder {
        if self.phase != CheckoutPhase::ModalOpen {
            return PlaceOrder::NotOpen;
        }

        let details = match form.validate() {
            Ok(details) => details,
            Err(rejection) => return PlaceOrder::Rejected(rejection),
        };
        if cart.is_empty() {
            return PlaceOrder::Rejected(CheckoutRejection::EmptyCart);
        }

        let order = Order::new(details, cart, shipping, Utc::now());
        info!(order_id = %order.id, total = %order.total, items = order.items.len(), "Order placed");
        sink.order_placed(&order);

        self.phase = CheckoutPhase::AwaitingAcknowledgement;
        PlaceOrder::Placed(Box::new(order))
    }

    /// Finish checkout after the confirmation is acknowledged.
    ///
    /// Clears the stored cart, resets the badge and hides the modal.
    /// Returns `false` if no order was awaiting acknowledgement.
    pub fn complete<S: KeyValueStore, P: Page>(&mut self, cart: &mut CartService<S, P>) -> bool {
        if self.phase != CheckoutPhase::AwaitingAcknowledgement {
            return false;
        }
        cart.clear();
        cart.page().set_visible(Region::CheckoutModal, false);
        self.phase = CheckoutPhase::Idle;
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::MemoryEventSink;
    use crate::page::MemoryPage;
    use crate::storage::{CartStorage, MemoryStore};

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            full_name: " Ayesha Khan ".to_string(),
            phone: "0300-1234567".to_string(),
            address: "12 Mall Road".to_string(),
            city: "Lahore".to_string(),
            payment_method: Some("cod".to_string()),
            agreed_to_terms: true,
        }
    }

    fn cart() -> Cart {
        Cart::from_items(vec![LineItem::new("tee", "Tee", Decimal::new(1250, 2), 2)])
    }

    #[test]
    fn test_blank_form_reports_missing_fields_first() {
        let form = CheckoutForm::default();
        assert_eq!(form.validate(), Err(CheckoutRejection::MissingFields));
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let form = CheckoutForm {
            city: "   ".to_string(),
            ..filled_form()
        };
        assert_eq!(form.validate(), Err(CheckoutRejection::MissingFields));
    }

    #[test]
    fn test_validation_order() {
        let form = CheckoutForm {
            payment_method: None,
            agreed_to_terms: false,
            ..filled_form()
        };
        assert_eq!(form.validate(), Err(CheckoutRejection::MissingPaymentMethod));

        let form = CheckoutForm {
            payment_method: Some(" ".to_string()),
            ..filled_form()
        };
        assert_eq!(form.validate(), Err(CheckoutRejection::MissingPaymentMethod));

        let form = CheckoutForm {
            agreed_to_terms: false,
            ..filled_form()
        };
        assert_eq!(form.validate(), Err(CheckoutRejection::TermsNotAccepted));
    }

    #[test]
    fn test_validate_trims() {
        let details = filled_form().validate().unwrap();
        assert_eq!(details.full_name, "Ayesha Khan");
        assert_eq!(details.payment_method.as_str(), "cod");
    }

    #[test]
    fn test_rejection_alerts() {
        let alert = CheckoutRejection::TermsNotAccepted.alert();
        assert_eq!(alert.title, "Terms & Conditions");
        assert_eq!(alert.message, "Please agree to the terms & conditions");
        assert_eq!(alert.icon, "📋");
    }

    #[test]
    fn test_open_blocks_empty_cart() {
        let page = MemoryPage::cart_page();
        let mut flow = CheckoutFlow::new();
        let result = flow.open(&page, &Cart::new(), Decimal::TEN);
        assert_eq!(result, Err(CheckoutRejection::EmptyCart));
        assert_eq!(flow.phase(), CheckoutPhase::Idle);
        assert!(!page.is_visible(Region::CheckoutModal));
    }

    #[test]
    fn test_open_shows_total() {
        let page = MemoryPage::cart_page();
        let mut flow = CheckoutFlow::new();
        let total = flow.open(&page, &cart(), Decimal::TEN).unwrap();
        assert_eq!(total, Some(Decimal::new(35, 0)));
        assert_eq!(flow.phase(), CheckoutPhase::ModalOpen);
        assert!(page.is_visible(Region::CheckoutModal));
        assert_eq!(page.content(Region::CheckoutTotal).as_deref(), Some("$35.00"));

        flow.close(&page);
        assert_eq!(flow.phase(), CheckoutPhase::Idle);
        assert!(!page.is_visible(Region::CheckoutModal));
    }

    #[test]
    fn test_place_order_requires_open_modal() {
        let sink = MemoryEventSink::new();
        let mut flow = CheckoutFlow::new();
        let outcome = flow.place_order(&filled_form(), &cart(), Decimal::TEN, &sink);
        assert_eq!(outcome, PlaceOrder::NotOpen);
        assert!(sink.orders().is_empty());
    }

    #[test]
    fn test_rejection_keeps_modal_open() {
        let page = MemoryPage::cart_page();
        let sink = MemoryEventSink::new();
        let mut flow = CheckoutFlow::new();
        flow.open(&page, &cart(), Decimal::TEN).unwrap();

        let outcome = flow.place_order(&CheckoutForm::default(), &cart(), Decimal::TEN, &sink);
        assert_eq!(outcome, PlaceOrder::Rejected(CheckoutRejection::MissingFields));
        assert_eq!(flow.phase(), CheckoutPhase::ModalOpen);
        assert!(sink.orders().is_empty());
    }

    #[test]
    fn test_place_then_complete_clears_cart() {
        let page = MemoryPage::cart_page();
        let sink = MemoryEventSink::new();
        let mut service = CartService::new(CartStorage::new(MemoryStore::new(), "cart"), page.clone());
        service.add_item(LineItem::new("tee", "Tee", Decimal::new(1250, 2), 2));

        let mut flow = CheckoutFlow::new();
        flow.open(&page, &service.cart(), Decimal::TEN).unwrap();

        let PlaceOrder::Placed(order) =
            flow.place_order(&filled_form(), &service.cart(), Decimal::TEN, &sink)
        else {
            panic!("order should be placed");
        };
        assert_eq!(order.total, Decimal::new(35, 0));
        assert_eq!(order.items.len(), 1);
        assert_eq!(sink.orders().len(), 1);
        assert_eq!(
            order.confirmation().message,
            "Payment Method: COD\n\nWe'll contact you at: 0300-1234567"
        );

        // Nothing is cleared until acknowledgement
        assert_eq!(flow.phase(), CheckoutPhase::AwaitingAcknowledgement);
        assert_eq!(service.cart().total_count(), 2);
        flow.close(&page);
        assert_eq!(flow.phase(), CheckoutPhase::AwaitingAcknowledgement);

        assert!(flow.complete(&mut service));
        assert!(service.cart().is_empty());
        assert_eq!(page.content(Region::CartCount).as_deref(), Some("0"));
        assert!(!page.is_visible(Region::CheckoutModal));
        assert_eq!(flow.phase(), CheckoutPhase::Idle);
        assert!(!flow.complete(&mut service));
    }

    #[test]
    fn test_open_refused_while_awaiting_acknowledgement() {
        let page = MemoryPage::cart_page();
        let sink = MemoryEventSink::new();
        let mut flow = CheckoutFlow::new();
        flow.open(&page, &cart(), Decimal::TEN).unwrap();
        flow.place_order(&filled_form(), &cart(), Decimal::TEN, &sink);

        page.set_text(Region::CheckoutTotal, "unchanged");
        assert_eq!(flow.open(&page, &cart(), Decimal::TEN), Ok(None));
        assert_eq!(flow.phase(), CheckoutPhase::AwaitingAcknowledgement);
        assert_eq!(page.content(Region::CheckoutTotal).as_deref(), Some("unchanged"));
    }

    #[test]
    fn test_order_total_rounds_half_cents_up() {
        let details = filled_form().validate().unwrap();
        let cart = Cart::from_items(vec![LineItem::new("gum", "Gum", Decimal::new(125, 3), 1)]);
        let order = Order::new(details, &cart, Decimal::ZERO, Utc::now());
        assert_eq!(order.total, Decimal::new(13, 2));
    }

    #[test]
    fn test_order_serializes_flat() {
        let details = filled_form().validate().unwrap();
        let order = Order::new(details, &cart(), Decimal::TEN, Utc::now());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["full_name"], "Ayesha Khan");
        assert_eq!(json["payment_method"], "cod");
        assert_eq!(json["total"], "35.00");
        assert_eq!(json["items"][0]["qty"], 2);
    }
}
