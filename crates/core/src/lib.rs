//! NexusKart Core - Shared types library.
//!
//! This crate provides common types used across all NexusKart components:
//! - `storefront` - REST client, session handling and the cart store
//! - `cli` - Command-line front end for shoppers and store admins
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
