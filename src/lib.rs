//! Storefront client core
//!
//! Shared backend client with response normalization, order endpoints, and
//! the checkout payment-status poller.

pub mod api;
pub mod config;
pub mod payments;
pub mod services;
