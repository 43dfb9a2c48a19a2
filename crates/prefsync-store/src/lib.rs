//! Prefsync Store - the editing session's copy of the preference set
//!
//! Mutation is local and synchronous; the only I/O is [`PreferenceStore::load`].
//! Write-back is driven from outside (see the engine crate), which reports
//! outcomes through [`PreferenceStore::confirm`] and
//! [`PreferenceStore::revert_to_confirmed`].

#![warn(unreachable_pub)]

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::PreferenceStore;
