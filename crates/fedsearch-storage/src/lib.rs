//! # fedsearch-storage
//!
//! In-memory implementations of the record store and identity resolver.
//!
//! This crate provides:
//! - [`Fixture`] - records and users loaded from a JSON file
//! - [`MemoryStore`] - `RecordStore` + `IdentityResolver` over a fixture
//!
//! Production deployments put their own storage behind the
//! `fedsearch_core` traits; this crate backs development and tests.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fixture;
pub mod memory;

pub use error::{Error, Result};
pub use fixture::Fixture;
pub use memory::MemoryStore;
