//! Centralized user-facing message handling.
//!
//! All text shown to users lives in the [`Message`] enum; the display
//! implementation holds the wording and the macros in [`macros`] handle
//! routing between plain console output and the tracing subscriber.

pub mod display;
pub mod macros;
pub mod types;

// Re-export the main Message type for convenient access
pub use types::Message;
