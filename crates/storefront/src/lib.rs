//! NexusKart storefront client library.
//!
//! A typed client for the NexusKart REST backend plus the client-side cart
//! and checkout flow built on it. Front ends (the `nexuskart` CLI) hold an
//! [`state::AppState`] and an owned [`cart::CartStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod state;
