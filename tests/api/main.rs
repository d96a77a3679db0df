//! Command transport integration tests.

#[path = "../support/mod.rs"]
mod support;

mod dispatch;

#[cfg(feature = "http")]
mod http;
