//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod auth;
pub mod dispatcher;
pub mod notifier;
pub mod queries;
pub mod service;
pub mod session;

pub use auth::AuthBinder;
pub use dispatcher::TransactionDispatcher;
pub use notifier::{NotificationHandle, StatusNotifier, StatusTracker, TrackCanceller};
pub use queries::QueryFacade;
pub use service::BuzzClient;
pub use session::Session;
