//! Core types and traits for namespaced key-value preferences.
//!
//! The crate is layered, leaves first:
//!
//! - [`Backend`]: the storage contract. Implementations live in their own
//!   crates (`prefs_backend_memory`, `prefs_backend_local`,
//!   `prefs_backend_redb`) and are chosen by whoever builds the facade.
//! - [`Preferences`]: the facade. Owns the active [`Namespace`] and exposes
//!   single-key, batch and whole-namespace operations over any backend.
//! - [`typed`]: string, number, boolean and JSON accessors built purely on
//!   the facade's `get`/`set`/`clear`/`contains`.
//!
//! All fallible operations return [`PrefsError`], whose
//! [`code`](PrefsError::code) is stable across releases.

pub mod backend;
pub mod error;
pub mod facade;
pub mod namespace;
pub mod typed;

// Test utilities (behind feature flag)
#[cfg(feature = "testutil")]
pub mod testutil;

pub use backend::{Backend, BackendFeatures, Entry};
pub use error::{PrefsError, PrefsResult};
pub use facade::Preferences;
pub use namespace::Namespace;
pub use typed::{
    BoolPreference, Codec, NumberPreference, ObjectPreference, Preference, StringPreference,
};
