//! Contact form command.

use clap::Args;
use fftraders_storefront::config::StorefrontConfig;
use fftraders_storefront::contact::ContactForm;
use fftraders_storefront::dispatch::{Command, Outcome};

use super::{CommandError, Session};

/// Contact form fields.
#[derive(Debug, Args)]
pub struct ContactArgs {
    /// Your name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Your email address
    #[arg(short, long, default_value = "")]
    pub email: String,

    /// Phone number
    #[arg(short, long, default_value = "")]
    pub phone: String,

    /// Subject
    #[arg(short, long, default_value = "")]
    pub subject: String,

    /// Message
    #[arg(short, long, default_value = "")]
    pub message: String,
}

/// Submit the contact form.
#[allow(clippy::print_stdout)]
pub fn run(config: StorefrontConfig, args: ContactArgs) -> Result<(), CommandError> {
    let mut session = Session::open(config);
    let form = ContactForm {
        name: args.name,
        email: args.email,
        phone: args.phone,
        subject: args.subject,
        message: args.message,
    };

    match session.dispatcher.dispatch(Command::SubmitContact(form)) {
        Outcome::ContactSent { submission, .. } => {
            println!("Thanks {}, we'll reply to {}", submission.name, submission.email);
            Ok(())
        }
        Outcome::Rejected(alert) => Err(alert.into()),
        other => {
            tracing::warn!(?other, "Unexpected contact outcome");
            Ok(())
        }
    }
}
