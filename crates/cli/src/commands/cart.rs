//! Cart commands.

use clap::Args;
use fftraders_core::{Price, ProductId, ToastLevel};
use fftraders_storefront::config::StorefrontConfig;
use fftraders_storefront::dispatch::{Command, Outcome, ProductButton};

use super::{CommandError, Session};

/// Attributes of the product being added.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Product ID
    #[arg(long)]
    pub id: String,

    /// Product name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Unit price, e.g. 12.50
    #[arg(short, long, default_value = "0")]
    pub price: String,

    /// Image URL
    #[arg(short, long)]
    pub image: Option<String>,
}

/// Add one unit of a product.
pub async fn add(config: StorefrontConfig, args: AddArgs) {
    let mut session = Session::open(config);
    let button = ProductButton {
        id: args.id,
        name: args.name,
        price: args.price,
        image: args.image,
    };

    let outcome = session.dispatcher.dispatch(Command::AddToCart(button));
    session.dispatcher.settle().await;
    tracing::debug!(?outcome, "Add to cart dispatched");

    session.print_toast();
    show_totals(&session);
}

/// Remove a product's row.
pub fn remove(config: StorefrontConfig, id: &str) -> Result<(), CommandError> {
    let mut session = Session::open(config);
    match session.dispatcher.dispatch(Command::RemoveRow(ProductId::new(id))) {
        Outcome::Applied => {
            show_totals(&session);
            Ok(())
        }
        _ => Err(CommandError::NotInCart(id.to_string())),
    }
}

/// Set a product's quantity from raw input.
pub fn set_quantity(config: StorefrontConfig, id: &str, value: String) -> Result<(), CommandError> {
    let mut session = Session::open(config);
    let command = Command::ChangeRowQuantity {
        id: ProductId::new(id),
        value,
    };
    match session.dispatcher.dispatch(command) {
        Outcome::Applied => {
            show_totals(&session);
            Ok(())
        }
        _ => Err(CommandError::NotInCart(id.to_string())),
    }
}

/// Print every row and the totals.
#[allow(clippy::print_stdout)]
pub fn show(config: StorefrontConfig) {
    let session = Session::open(config);
    let cart = session.dispatcher.cart_service().cart();

    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for item in cart.items() {
        println!(
            "{:>4} x {} ({})  {}  {}",
            item.quantity,
            item.name,
            item.id,
            item.unit_price(),
            Price::usd(item.line_total())
        );
    }
    println!(
        "Shipping: {}",
        Price::usd(session.dispatcher.config().shipping)
    );
    show_totals(&session);
}

/// Empty the cart.
pub fn clear(config: StorefrontConfig) {
    let mut session = Session::open(config);
    session.dispatcher.clear_cart();
    session.dispatcher.notify("Cart cleared", ToastLevel::Info);
    session.print_toast();
}

#[allow(clippy::print_stdout)]
fn show_totals(session: &Session) {
    let cart = session.dispatcher.cart_service().cart();
    let shipping = session.dispatcher.config().shipping;
    println!(
        "Items: {}  Subtotal: {}  Total: {}",
        cart.total_count(),
        Price::usd(cart.subtotal()),
        Price::usd(cart.total(shipping)),
    );
}
