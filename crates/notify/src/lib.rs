//! Notification channels for newly discovered job postings.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - Console, Telegram, and webhook notifier implementations
//! - Minijinja template rendering for batch messages
//! - Dispatcher that fans a batch out to every configured channel

pub mod console;
pub mod dispatcher;
pub mod telegram;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use console::ConsoleNotifier;
pub use dispatcher::Dispatcher;
pub use telegram::TelegramNotifier;
pub use templating::TemplateRenderer;
pub use traits::{DeliveryError, DispatchResult, Notifier};
pub use webhook::WebhookNotifier;
