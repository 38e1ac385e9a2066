//! # Utility Modules
//!
//! Supporting utilities for compression and logging.
//!
//! ## Components
//! - **Compression**: zlib with a strict threshold and inflated-size checks
//! - **Logging**: `tracing` subscriber setup driven by `LoggingConfig`

pub mod compression;
pub mod logging;
