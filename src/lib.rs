//! Typing-speed trainer core: word selection, the typing-session state
//! machine, WPM/accuracy scoring, rolling per-user statistics and the test
//! catalog. Presentation lives in the binary; persistence and notifications
//! are injected through the `DocumentStore` and `Notifier` traits.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod notify;
pub mod recorder;
pub mod session;
pub mod store;
pub mod trainer;

pub use error::CoreError;
