//! fedsearch Core: shared types, errors, and collaborator traits.
//!
//! This crate provides the foundational types used across all fedsearch
//! crates. It has no internal fedsearch dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`model`]: Query descriptor, raw hits, result sets, and records
//! - [`pagination`]: Next-offset cursor computation
//! - [`service`]: Traits for the identity resolver and record store

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod pagination;
pub mod service;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use model::{
    ActingIdentity, DEFAULT_LIMIT, DEFAULT_OFFSET, EmailAddressSet, FormattedRecord,
    QueryDescriptor, RawHit, Record, RecordRef, RequestContext, ResultSet, SortDirection,
    SortField,
};
pub use pagination::{NO_MORE_PAGES, next_offset};
pub use service::{IdentityResolver, RecordStore};
