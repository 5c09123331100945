//! # fedsearch-api
//!
//! HTTP search endpoint for fedsearch.
//!
//! One route accepts a module list and an optional free-text term, runs the
//! query against the configured search engine as the administrative user,
//! and returns formatted records with the offset of the next page:
//!
//! ```text
//! request ─▶ AuthLayer ─▶ params::normalize ─▶ Dispatcher::dispatch
//!                                                   │
//! response ◀── next_offset ◀── format::format_results
//! ```
//!
//! The crate also hosts configuration loading and the `fedsearch` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod format;
pub mod params;
pub mod routes;
pub mod server;

pub use config::FedsearchConfig;
pub use error::{Error, Result};
pub use routes::{AppState, SearchResponse};
pub use server::{Server, router};
