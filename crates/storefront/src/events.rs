//! Recording of placed orders and contact submissions.
//!
//! The storefront has no backend; orders and contact messages are handed to
//! an [`EventSink`]. The default [`LogEventSink`] writes them as structured
//! log events, and [`MemoryEventSink`] keeps them for inspection in tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use crate::checkout::Order;
use crate::contact::ContactSubmission;

/// Receives storefront events that leave the page.
pub trait EventSink: Send + Sync {
    fn order_placed(&self, order: &Order);

    fn contact_submitted(&self, submission: &ContactSubmission);
}

/// Writes events as `info` log lines with a JSON payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    fn payload(value: &impl Serialize) -> String {
        serde_json::to_string(value).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to encode event payload");
            String::new()
        })
    }
}

impl EventSink for LogEventSink {
    fn order_placed(&self, order: &Order) {
        info!(
            order_id = %order.id,
            total = %order.total,
            payload = %Self::payload(order),
            "Order placed"
        );
    }

    fn contact_submitted(&self, submission: &ContactSubmission) {
        info!(
            email = %submission.email,
            payload = %Self::payload(submission),
            "Contact form submitted"
        );
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    orders: Mutex<Vec<Order>>,
    contacts: Mutex<Vec<ContactSubmission>>,
}

impl MemoryEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders recorded so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        lock(&self.orders).clone()
    }

    /// Contact submissions recorded so far.
    #[must_use]
    pub fn contacts(&self) -> Vec<ContactSubmission> {
        lock(&self.contacts).clone()
    }
}

impl EventSink for MemoryEventSink {
    fn order_placed(&self, order: &Order) {
        lock(&self.orders).push(order.clone());
    }

    fn contact_submitted(&self, submission: &ContactSubmission) {
        lock(&self.contacts).push(submission.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
