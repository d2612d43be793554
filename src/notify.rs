//! Notification sink for user-visible toasts.
//!
//! The client only triggers emission; display and dismissal belong to the
//! sink implementation.

use std::time::Duration;

/// Visual severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Warning => "warning",
            ToastKind::Error => "error",
        }
    }
}

/// A transient, dismissible message.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    /// How long the sink should keep it on screen.
    pub auto_close: Duration,
}

/// Default on-screen time, matching the backend console's toasts.
pub const TOAST_AUTO_CLOSE: Duration = Duration::from_secs(5);

impl Toast {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
            auto_close: TOAST_AUTO_CLOSE,
        }
    }
}

/// Capability for emitting a toast to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: &Toast);
}

/// Writes toasts to stderr, for terminal use.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: &Toast) {
        eprintln!("[{}] {}", toast.kind.label(), toast.message);
    }
}

/// Routes toasts into the `log` facade, for headless embedding.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: &Toast) {
        match toast.kind {
            ToastKind::Error => log::error!("{}", toast.message),
            ToastKind::Warning => log::warn!("{}", toast.message),
            ToastKind::Info | ToastKind::Success => log::info!("{}", toast.message),
        }
    }
}
