//! Foundational utilities shared across Forage crates.
//!
//! Provides atomic file-write helpers, unix-time helpers, and credential
//! masking used by the persistence stores, the runtime loops, and logging.

pub mod atomic_io;
pub mod masking;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use masking::mask_secret;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms};
