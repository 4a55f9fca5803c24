//! Command dispatch.
//!
//! Every user interaction is a [`Command`]. The [`Dispatcher`] owns the cart
//! service, renderer and flows, applies one command at a time and reports
//! what happened as an [`Outcome`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fftraders_core::{LineItem, ProductId, ToastLevel, parse_amount, parse_quantity};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::cart::CartService;
use crate::checkout::{CheckoutFlow, CheckoutForm, CheckoutPhase, Order, PlaceOrder};
use crate::config::StorefrontConfig;
use crate::contact::{ContactFlow, ContactForm, ContactSubmission};
use crate::error::add_breadcrumb;
use crate::events::EventSink;
use crate::notify::{Alert, Notifier, Toast};
use crate::page::Page;
use crate::storage::KeyValueStore;
use crate::view::{CartRenderer, ControlKind, RenderOutcome};

/// Name used when a product button carries none.
pub const DEFAULT_PRODUCT_NAME: &str = "Product";

/// Attributes of a clicked add-to-cart button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductButton {
    pub id: String,
    pub name: Option<String>,
    /// Raw price text, parsed leniently.
    pub price: String,
    pub image: Option<String>,
}

impl ProductButton {
    /// The line item a click adds: quantity one, lenient price.
    #[must_use]
    pub fn to_line_item(&self) -> LineItem {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PRODUCT_NAME);
        let item = LineItem::new(self.id.as_str(), name, parse_amount(&self.price), 1);
        match &self.image {
            Some(image) => item.with_image(image.as_str()),
            None => item,
        }
    }
}

/// A user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Page loaded: refresh the badge and draw the cart.
    Init,
    AddToCart(ProductButton),
    RemoveRow(ProductId),
    /// Quantity input edited; `value` is the raw input text.
    ChangeRowQuantity { id: ProductId, value: String },
    OpenCheckout,
    CloseCheckout,
    PlaceOrder(CheckoutForm),
    AcknowledgeAlert,
    DismissToast,
    /// Submit the contact form. On success the form is reset and handed
    /// back in [`Outcome::ContactSent`] so the caller can redraw it blank.
    SubmitContact(ContactForm),
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The cart view was drawn.
    Rendered(RenderOutcome),
    Applied,
    /// An add-to-cart is still cooling down; the click was dropped.
    Busy,
    /// Not applicable in the current state (stale row, closed modal).
    Ignored,
    /// Refused with the alert shown to the user.
    Rejected(Alert),
    OrderPlaced(Box<Order>),
    /// The order confirmation was acknowledged and the cart cleared.
    CheckoutCompleted,
    /// The contact message was recorded; `form` is the reset form.
    ContactSent {
        submission: Box<ContactSubmission>,
        form: ContactForm,
    },
}

/// Single-holder guard for add-to-cart clicks.
#[derive(Debug, Clone, Default)]
pub struct AddToCartGuard {
    busy: Arc<AtomicBool>,
}

/// Held while an add-to-cart is in progress; released on drop.
#[derive(Debug)]
pub struct AddPermit {
    busy: Arc<AtomicBool>,
}

impl AddToCartGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit, or `None` if it is already held.
    #[must_use]
    pub fn try_acquire(&self) -> Option<AddPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AddPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for AddPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Applies commands to the storefront.
pub struct Dispatcher<S, P> {
    cart: CartService<S, P>,
    renderer: CartRenderer,
    checkout: CheckoutFlow,
    contact: ContactFlow,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn EventSink>,
    config: StorefrontConfig,
    guard: AddToCartGuard,
    cooldown: Option<JoinHandle<()>>,
}

impl<S: KeyValueStore, P: Page> Dispatcher<S, P> {
    pub fn new(
        cart: CartService<S, P>,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn EventSink>,
        config: StorefrontConfig,
    ) -> Self {
        Self {
            cart,
            renderer: CartRenderer::new(),
            checkout: CheckoutFlow::new(),
            contact: ContactFlow::new(config.contact_notice_duration),
            notifier,
            sink,
            config,
            guard: AddToCartGuard::new(),
            cooldown: None,
        }
    }

    #[must_use]
    pub const fn cart_service(&self) -> &CartService<S, P> {
        &self.cart
    }

    #[must_use]
    pub const fn renderer(&self) -> &CartRenderer {
        &self.renderer
    }

    #[must_use]
    pub const fn checkout_phase(&self) -> CheckoutPhase {
        self.checkout.phase()
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Whether an add-to-cart is cooling down.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Show a toast with the default duration.
    pub fn notify(&self, message: impl Into<String>, level: ToastLevel) {
        self.notifier
            .toast(Toast::new(message, level, self.config.toast_duration));
    }

    /// Empty the cart and redraw it.
    pub fn clear_cart(&mut self) -> RenderOutcome {
        self.cart.clear();
        self.render()
    }

    /// Apply one command.
    #[instrument(skip_all, fields(command = command_name(&command)))]
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        match command {
            Command::Init => {
                self.cart.refresh_badge();
                Outcome::Rendered(self.render())
            }
            Command::AddToCart(button) => self.add_to_cart(&button),
            Command::RemoveRow(id) => {
                if !self.renderer.is_bound(ControlKind::Remove, &id) {
                    debug!(product_id = %id, "Remove control not bound, ignoring");
                    return Outcome::Ignored;
                }
                self.cart.remove_item(&id);
                self.render();
                Outcome::Applied
            }
            Command::ChangeRowQuantity { id, value } => {
                if !self.renderer.is_bound(ControlKind::Quantity, &id) {
                    debug!(product_id = %id, "Quantity control not bound, ignoring");
                    return Outcome::Ignored;
                }
                self.cart
                    .set_quantity(&id, f64::from(parse_quantity(&value)));
                self.render();
                Outcome::Applied
            }
            Command::OpenCheckout => {
                let cart = self.cart.cart();
                match self
                    .checkout
                    .open(self.cart.page(), &cart, self.config.shipping)
                {
                    Ok(Some(_)) => Outcome::Applied,
                    Ok(None) => Outcome::Ignored,
                    Err(rejection) => self.reject(rejection.alert()),
                }
            }
            Command::CloseCheckout => {
                if self.checkout.phase() != CheckoutPhase::ModalOpen {
                    return Outcome::Ignored;
                }
                self.checkout.close(self.cart.page());
                Outcome::Applied
            }
            Command::PlaceOrder(form) => self.place_order(&form),
            Command::AcknowledgeAlert => {
                self.notifier.close_alert();
                if self.checkout.complete(&mut self.cart) {
                    self.render();
                    Outcome::CheckoutCompleted
                } else {
                    Outcome::Applied
                }
            }
            Command::DismissToast => {
                self.notifier.dismiss_toast();
                Outcome::Applied
            }
            Command::SubmitContact(mut form) => {
                match self
                    .contact
                    .submit(&mut form, self.cart.page(), self.sink.as_ref())
                {
                    Ok(submission) => Outcome::ContactSent {
                        submission: Box::new(submission),
                        form,
                    },
                    Err(rejection) => self.reject(rejection.alert()),
                }
            }
        }
    }

    /// Wait for a pending add-to-cart cooldown to finish.
    pub async fn settle(&mut self) {
        let Some(handle) = self.cooldown.take() else {
            return;
        };
        if let Err(e) = handle.await {
            warn!(error = %e, "Add-to-cart cooldown task failed");
        }
    }

    fn render(&mut self) -> RenderOutcome {
        let cart = self.cart.cart();
        self.renderer
            .render(self.cart.page(), &cart, self.config.shipping)
    }

    fn reject(&self, alert: Alert) -> Outcome {
        self.notifier.alert(alert.clone());
        Outcome::Rejected(alert)
    }

    fn add_to_cart(&mut self, button: &ProductButton) -> Outcome {
        let Some(permit) = self.guard.try_acquire() else {
            debug!(product_id = %button.id, "Add-to-cart busy, dropping click");
            return Outcome::Busy;
        };

        let item = button.to_line_item();
        let toast = Toast::new(
            format!("{} added to cart", item.name),
            ToastLevel::Success,
            self.config.added_toast_duration,
        );
        add_breadcrumb("ui", "Add to cart clicked", Some(&[("product_id", button.id.as_str())]));
        self.cart.add_item(item);

        let Ok(runtime) = Handle::try_current() else {
            drop(permit);
            self.notifier.toast(toast);
            return Outcome::Applied;
        };

        let notifier = Arc::clone(&self.notifier);
        let cooldown = self.config.add_cooldown;
        self.cooldown = Some(runtime.spawn(async move {
            tokio::time::sleep(cooldown).await;
            drop(permit);
            notifier.toast(toast);
        }));
        Outcome::Applied
    }

    fn place_order(&mut self, form: &CheckoutForm) -> Outcome {
        let cart = self.cart.cart();
        match self
            .checkout
            .place_order(form, &cart, self.config.shipping, self.sink.as_ref())
        {
            PlaceOrder::NotOpen => Outcome::Ignored,
            PlaceOrder::Rejected(rejection) => self.reject(rejection.alert()),
            PlaceOrder::Placed(order) => {
                self.notifier.alert(order.confirmation());
                Outcome::OrderPlaced(order)
            }
        }
    }
}

const fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init => "init",
        Command::AddToCart(_) => "add_to_cart",
        Command::RemoveRow(_) => "remove_row",
        Command::ChangeRowQuantity { .. } => "change_row_quantity",
        Command::OpenCheckout => "open_checkout",
        Command::CloseCheckout => "close_checkout",
        Command::PlaceOrder(_) => "place_order",
        Command::AcknowledgeAlert => "acknowledge_alert",
        Command::DismissToast => "dismiss_toast",
        Command::SubmitContact(_) => "submit_contact",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;

    use super::*;
    use crate::events::MemoryEventSink;
    use crate::notify::PageNotifier;
    use crate::page::{MemoryPage, Region};
    use crate::storage::{CartStorage, MemoryStore};

    fn dispatcher(page: &MemoryPage) -> (Dispatcher<MemoryStore, MemoryPage>, Arc<MemoryEventSink>) {
        let sink = Arc::new(MemoryEventSink::new());
        let service = CartService::new(CartStorage::new(MemoryStore::new(), "cart"), page.clone());
        let dispatcher = Dispatcher::new(
            service,
            Arc::new(PageNotifier::new(page.clone())),
            Arc::clone(&sink) as Arc<dyn EventSink>,
            StorefrontConfig::default(),
        );
        (dispatcher, sink)
    }

    fn button(id: &str, price: &str) -> ProductButton {
        ProductButton {
            id: id.to_string(),
            name: Some(format!("Item {id}")),
            price: price.to_string(),
            image: None,
        }
    }

    fn checkout_form() -> CheckoutForm {
        CheckoutForm {
            full_name: "Ayesha".to_string(),
            phone: "0300".to_string(),
            address: "12 Mall Road".to_string(),
            city: "Lahore".to_string(),
            payment_method: Some("card".to_string()),
            agreed_to_terms: true,
        }
    }

    #[test]
    fn test_button_defaults() {
        let item = ProductButton {
            id: "x".to_string(),
            name: Some("  ".to_string()),
            price: "abc".to_string(),
            image: Some(String::new()),
        }
        .to_line_item();
        assert_eq!(item.name, "Product");
        assert_eq!(item.price, Decimal::ZERO);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.image, None);
    }

    #[test]
    fn test_guard_permit_released_on_drop() {
        let guard = AddToCartGuard::new();
        let permit = guard.try_acquire().unwrap();
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_clicks_are_dropped_during_cooldown() {
        let page = MemoryPage::cart_page();
        let (mut dispatcher, _) = dispatcher(&page);

        assert_eq!(dispatcher.dispatch(Command::AddToCart(button("A", "12.50"))), Outcome::Applied);
        assert_eq!(dispatcher.dispatch(Command::AddToCart(button("A", "12.50"))), Outcome::Busy);
        assert!(!page.is_visible(Region::Toast));

        dispatcher.settle().await;
        assert!(!dispatcher.is_busy());
        assert!(page.is_visible(Region::Toast));
        assert_eq!(page.content(Region::Toast).as_deref(), Some("Item A added to cart"));
        assert_eq!(dispatcher.cart_service().cart().total_count(), 1);

        assert_eq!(dispatcher.dispatch(Command::AddToCart(button("A", "12.50"))), Outcome::Applied);
        dispatcher.settle().await;
        assert_eq!(dispatcher.cart_service().cart().total_count(), 2);
        assert_eq!(page.content(Region::CartCount).as_deref(), Some("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_added_toast_hides_after_duration() {
        let page = MemoryPage::product_page();
        let (mut dispatcher, _) = dispatcher(&page);

        dispatcher.dispatch(Command::AddToCart(button("A", "5")));
        dispatcher.settle().await;
        assert!(page.is_visible(Region::Toast));

        tokio::time::sleep(Duration::from_millis(2201)).await;
        assert!(!page.is_visible(Region::Toast));
    }

    #[test]
    fn test_add_without_runtime_releases_immediately() {
        let page = MemoryPage::product_page();
        let (mut dispatcher, _) = dispatcher(&page);

        dispatcher.dispatch(Command::AddToCart(button("A", "5")));
        assert!(!dispatcher.is_busy());
        assert_eq!(dispatcher.dispatch(Command::AddToCart(button("A", "5"))), Outcome::Applied);
        assert_eq!(dispatcher.cart_service().cart().total_count(), 2);
    }

    #[test]
    fn test_row_commands_require_bound_rows() {
        let page = MemoryPage::cart_page();
        let (mut dispatcher, _) = dispatcher(&page);
        dispatcher.dispatch(Command::AddToCart(button("A", "5")));
        let a = ProductId::new("A");

        // Not rendered yet
        assert_eq!(dispatcher.dispatch(Command::RemoveRow(a.clone())), Outcome::Ignored);

        assert_eq!(
            dispatcher.dispatch(Command::Init),
            Outcome::Rendered(RenderOutcome::Populated { rows: 1 })
        );
        let outcome = dispatcher.dispatch(Command::ChangeRowQuantity {
            id: a.clone(),
            value: "3.9".to_string(),
        });
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(dispatcher.cart_service().cart().total_count(), 3);
        assert_eq!(page.content(Region::CartSubtotal).as_deref(), Some("$15.00"));

        assert_eq!(dispatcher.dispatch(Command::RemoveRow(a.clone())), Outcome::Applied);
        assert!(page.is_visible(Region::EmptyCart));
        assert_eq!(dispatcher.dispatch(Command::RemoveRow(a)), Outcome::Ignored);
    }

    #[test]
    fn test_checkout_empty_cart_alerts() {
        let page = MemoryPage::cart_page();
        let (mut dispatcher, _) = dispatcher(&page);

        let Outcome::Rejected(alert) = dispatcher.dispatch(Command::OpenCheckout) else {
            panic!("empty cart should be rejected");
        };
        assert_eq!(alert.title, "Empty Cart");
        assert!(page.is_visible(Region::AlertModal));
        assert!(!page.is_visible(Region::CheckoutModal));
    }

    #[test]
    fn test_checkout_round_trip() {
        let page = MemoryPage::cart_page();
        let (mut dispatcher, sink) = dispatcher(&page);
        dispatcher.dispatch(Command::AddToCart(button("A", "12.50")));
        dispatcher.dispatch(Command::Init);

        assert_eq!(dispatcher.dispatch(Command::OpenCheckout), Outcome::Applied);
        assert_eq!(page.content(Region::CheckoutTotal).as_deref(), Some("$22.50"));

        let rejected = dispatcher.dispatch(Command::PlaceOrder(CheckoutForm {
            agreed_to_terms: false,
            ..checkout_form()
        }));
        assert!(matches!(rejected, Outcome::Rejected(ref alert) if alert.title == "Terms & Conditions"));
        dispatcher.dispatch(Command::AcknowledgeAlert);
        assert_eq!(dispatcher.checkout_phase(), CheckoutPhase::ModalOpen);

        let Outcome::OrderPlaced(order) = dispatcher.dispatch(Command::PlaceOrder(checkout_form()))
        else {
            panic!("order should be placed");
        };
        assert_eq!(order.total, Decimal::new(2250, 2));
        assert_eq!(sink.orders().len(), 1);
        assert_eq!(
            page.content(Region::AlertTitle).as_deref(),
            Some("✓ Order Placed Successfully!")
        );
        assert_eq!(dispatcher.cart_service().cart().total_count(), 1);

        assert_eq!(dispatcher.dispatch(Command::AcknowledgeAlert), Outcome::CheckoutCompleted);
        assert!(dispatcher.cart_service().cart().is_empty());
        assert!(!page.is_visible(Region::AlertModal));
        assert!(!page.is_visible(Region::CheckoutModal));
        assert!(page.is_visible(Region::EmptyCart));
        assert_eq!(page.content(Region::CartCount).as_deref(), Some("0"));
    }

    #[test]
    fn test_reopen_while_awaiting_acknowledgement_is_ignored() {
        let page = MemoryPage::cart_page();
        let (mut dispatcher, sink) = dispatcher(&page);
        dispatcher.dispatch(Command::AddToCart(button("A", "12.50")));
        dispatcher.dispatch(Command::OpenCheckout);
        assert!(matches!(
            dispatcher.dispatch(Command::PlaceOrder(checkout_form())),
            Outcome::OrderPlaced(_)
        ));

        assert_eq!(dispatcher.dispatch(Command::OpenCheckout), Outcome::Ignored);
        assert_eq!(dispatcher.checkout_phase(), CheckoutPhase::AwaitingAcknowledgement);

        assert_eq!(dispatcher.dispatch(Command::AcknowledgeAlert), Outcome::CheckoutCompleted);
        assert!(dispatcher.cart_service().cart().is_empty());
        assert_eq!(page.content(Region::CartCount).as_deref(), Some("0"));

        // The same cart cannot be ordered twice
        assert_eq!(dispatcher.dispatch(Command::PlaceOrder(checkout_form())), Outcome::Ignored);
        assert!(matches!(dispatcher.dispatch(Command::OpenCheckout), Outcome::Rejected(_)));
        assert_eq!(sink.orders().len(), 1);
    }

    #[test]
    fn test_place_order_without_modal_is_ignored() {
        let page = MemoryPage::cart_page();
        let (mut dispatcher, sink) = dispatcher(&page);
        dispatcher.dispatch(Command::AddToCart(button("A", "1")));
        assert_eq!(dispatcher.dispatch(Command::PlaceOrder(checkout_form())), Outcome::Ignored);
        assert_eq!(dispatcher.dispatch(Command::CloseCheckout), Outcome::Ignored);
        assert!(sink.orders().is_empty());
    }

    #[test]
    fn test_contact_submission() {
        let page = MemoryPage::cart_page();
        let (mut dispatcher, sink) = dispatcher(&page);

        let Outcome::Rejected(alert) =
            dispatcher.dispatch(Command::SubmitContact(ContactForm::default()))
        else {
            panic!("blank form should be rejected");
        };
        assert_eq!(alert.title, "Missing Information");

        let form = ContactForm {
            name: "Bilal".to_string(),
            email: "bilal@example.com".to_string(),
            subject: "Stock".to_string(),
            message: "Hello".to_string(),
            ..ContactForm::default()
        };
        let Outcome::ContactSent { submission, form } =
            dispatcher.dispatch(Command::SubmitContact(form))
        else {
            panic!("filled form should be sent");
        };
        assert_eq!(submission.subject.as_deref(), Some("Stock"));
        assert_eq!(form, ContactForm::default());
        assert_eq!(sink.contacts().len(), 1);
        assert!(page.is_visible(Region::FormSuccess));
    }
}
