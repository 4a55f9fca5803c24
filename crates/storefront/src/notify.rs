//! Toasts, alerts and dismiss timers.
//!
//! Toasts are transient and hide themselves; alerts stay up until the user
//! acknowledges them. Both are presented through the [`Notifier`] trait so
//! flows can be tested without a page.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use fftraders_core::ToastLevel;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::page::{Page, Region};

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub duration: Duration,
}

impl Toast {
    /// A toast shown for `duration`.
    pub fn new(message: impl Into<String>, level: ToastLevel, duration: Duration) -> Self {
        Self {
            message: message.into(),
            level,
            duration,
        }
    }
}

/// A blocking notice that waits for acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub icon: String,
}

impl Alert {
    /// A modal alert with a title, body and leading icon.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            icon: icon.into(),
        }
    }
}

/// Presents notifications to the user.
pub trait Notifier: Send + Sync {
    /// Show a toast, replacing any toast already showing.
    fn toast(&self, toast: Toast);

    /// Hide the toast immediately.
    fn dismiss_toast(&self);

    /// Show an alert.
    fn alert(&self, alert: Alert);

    /// Hide the alert.
    fn close_alert(&self);
}

/// A single pending timer; arming it again cancels the previous one.
#[derive(Debug, Default)]
pub struct DismissTimer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DismissTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `after`, cancelling any pending action.
    ///
    /// Outside a Tokio runtime the timer cannot be armed; the action is
    /// dropped and whatever it would have hidden stays visible.
    pub fn arm<F>(&self, after: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime, dismiss timer not armed");
            return;
        };

        *slot = Some(runtime.spawn(async move {
            tokio::time::sleep(after).await;
            action();
        }));
    }

    /// Cancel the pending action, if any.
    pub fn cancel(&self) {
        let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
    }
}

/// [`Notifier`] that draws into page regions.
#[derive(Debug)]
pub struct PageNotifier<P> {
    page: P,
    toast_timer: DismissTimer,
}

impl<P: Page> PageNotifier<P> {
    pub fn new(page: P) -> Self {
        Self {
            page,
            toast_timer: DismissTimer::new(),
        }
    }
}

impl<P: Page> Notifier for PageNotifier<P> {
    fn toast(&self, toast: Toast) {
        if !self.page.has(Region::Toast) {
            debug!(message = %toast.message, "No toast region on page");
            return;
        }

        self.page.set_class(Region::Toast, toast.level.as_str());
        self.page.set_text(Region::Toast, &toast.message);
        self.page.set_visible(Region::Toast, true);

        let page = self.page.clone();
        self.toast_timer.arm(toast.duration, move || {
            page.set_visible(Region::Toast, false);
        });
    }

    fn dismiss_toast(&self) {
        self.toast_timer.cancel();
        self.page.set_visible(Region::Toast, false);
    }

    fn alert(&self, alert: Alert) {
        let regions = [
            Region::AlertModal,
            Region::AlertTitle,
            Region::AlertMessage,
            Region::AlertIcon,
        ];
        if !regions.iter().all(|region| self.page.has(*region)) {
            error!(title = %alert.title, "Alert modal elements not found");
            return;
        }

        self.page.set_text(Region::AlertTitle, &alert.title);
        self.page.set_text(Region::AlertMessage, &alert.message);
        self.page.set_text(Region::AlertIcon, &alert.icon);
        self.page.set_visible(Region::AlertModal, true);
    }

    fn close_alert(&self) {
        self.page.set_visible(Region::AlertModal, false);
    }
}
