//! Checkout command.
//!
//! Opens the checkout modal, places the order and acknowledges the
//! confirmation, which clears the stored cart.

use clap::Args;
use fftraders_storefront::checkout::CheckoutForm;
use fftraders_storefront::config::StorefrontConfig;
use fftraders_storefront::dispatch::{Command, Outcome};
use fftraders_storefront::page::Region;

use super::{CommandError, Session};

/// Shipping and payment details.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Full name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Phone number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Street address
    #[arg(short, long, default_value = "")]
    pub address: String,

    /// City
    #[arg(short, long, default_value = "")]
    pub city: String,

    /// Payment method, e.g. `cod` or `card`
    #[arg(long)]
    pub payment: Option<String>,

    /// Agree to the terms & conditions
    #[arg(long)]
    pub agree: bool,
}

impl From<CheckoutArgs> for CheckoutForm {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            full_name: args.name,
            phone: args.phone,
            address: args.address,
            city: args.city,
            payment_method: args.payment,
            agreed_to_terms: args.agree,
        }
    }
}

/// Place an order for the stored cart.
#[allow(clippy::print_stdout)]
pub fn run(config: StorefrontConfig, args: CheckoutArgs) -> Result<(), CommandError> {
    let mut session = Session::open(config);

    if let Outcome::Rejected(alert) = session.dispatcher.dispatch(Command::OpenCheckout) {
        return Err(alert.into());
    }
    println!("Order total: {}", session.text(Region::CheckoutTotal));

    let order = match session
        .dispatcher
        .dispatch(Command::PlaceOrder(args.into()))
    {
        Outcome::OrderPlaced(order) => order,
        Outcome::Rejected(alert) => return Err(alert.into()),
        other => {
            tracing::warn!(?other, "Unexpected checkout outcome");
            return Ok(());
        }
    };

    println!(
        "{} {}",
        session.text(Region::AlertIcon),
        session.text(Region::AlertTitle)
    );
    println!("{}", session.text(Region::AlertMessage));
    println!("Order ID: {}", order.id);

    session.dispatcher.dispatch(Command::AcknowledgeAlert);
    Ok(())
}
