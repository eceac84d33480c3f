//! Backend Operations
//!
//! Typed wrappers over [`crate::ApiClient::send`]. Every operation validates
//! its input before touching the network.

mod account;
mod auth;
mod billing;
mod imagery;
