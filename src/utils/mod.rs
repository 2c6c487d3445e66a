//! The `utils` module holds shared plumbing used across the crate,
//! currently the tracing/logging setup.

pub mod logging;
