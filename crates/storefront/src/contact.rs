//! Contact form handling.
//!
//! Submissions are validated, handed to the [`EventSink`] and acknowledged
//! with a success notice that hides itself after a few seconds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use fftraders_core::Email;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::events::EventSink;
use crate::notify::{Alert, DismissTimer};
use crate::page::{Page, Region};

/// Contact form as typed by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

/// Why a contact submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactRejection {
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

impl ContactRejection {
    /// The alert shown to the user.
    #[must_use]
    pub fn alert(self) -> Alert {
        let title = match self {
            Self::MissingFields => "Missing Information",
            Self::InvalidEmail => "Invalid Email",
        };
        Alert::new(title, self.to_string(), "⚠️")
    }
}

/// A validated contact message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

impl ContactForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns [`ContactRejection::MissingFields`] if the name, email or
    /// message is blank, then [`ContactRejection::InvalidEmail`] if the
    /// email does not parse. The email check mirrors the browser's
    /// `type="email"` input validation, which the page runs before submit.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ContactSubmission, ContactRejection> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(ContactRejection::MissingFields);
        }
        let email = Email::parse(email).map_err(|_| ContactRejection::InvalidEmail)?;

        Ok(ContactSubmission {
            name: name.to_string(),
            email,
            phone: optional(&self.phone),
            subject: optional(&self.subject),
            message: message.to_string(),
            submitted_at: now,
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Contact form controller owning the success notice timer.
#[derive(Debug)]
pub struct ContactFlow {
    notice_duration: Duration,
    notice_timer: DismissTimer,
}

impl ContactFlow {
    #[must_use]
    pub fn new(notice_duration: Duration) -> Self {
        Self {
            notice_duration,
            notice_timer: DismissTimer::new(),
        }
    }

    /// Submit the form.
    ///
    /// On success the submission is recorded, the success notice is shown
    /// and scheduled to hide, and `form` is reset to blank. On rejection the
    /// form is left as typed.
    ///
    /// # Errors
    ///
    /// Returns the validation rejection.
    #[instrument(skip_all)]
    pub fn submit<P: Page>(
        &self,
        form: &mut ContactForm,
        page: &P,
        sink: &dyn EventSink,
    ) -> Result<ContactSubmission, ContactRejection> {
        let submission = form.validate(Utc::now())?;
        sink.contact_submitted(&submission);

        *form = ContactForm::default();

        if page.set_visible(Region::FormSuccess, true) {
            let page = page.clone();
            self.notice_timer.arm(self.notice_duration, move || {
                page.set_visible(Region::FormSuccess, false);
            });
        }

        Ok(submission)
    }
}
