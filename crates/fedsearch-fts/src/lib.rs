//! Search engine access for fedsearch.
//!
//! This crate owns everything between a validated [`QueryDescriptor`] and a
//! raw [`ResultSet`]: the backend abstraction, engine acquisition by scope,
//! and the dispatcher that classifies every failure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      fedsearch-fts                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Dispatcher                                                 │
//! │  ├── EngineProvider (scope → shared backend handle)         │
//! │  └── availability precheck, failure classification          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchBackend trait                                        │
//! │  ├── MemoryBackend (linear scan over fixture records)       │
//! │  └── ElasticBackend (Elasticsearch _search over HTTP)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EngineQuery (what a backend receives)                      │
//! │  SearchDocument (matching and highlighting for the scan)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fedsearch_fts::{Dispatcher, StaticEngineProvider, create_search_backend};
//!
//! let backend = create_search_backend(&config, records)?;
//! let provider = StaticEngineProvider::new().with_engine("GlobalSearch", backend);
//! let dispatcher = Dispatcher::new(Arc::new(provider), "GlobalSearch");
//!
//! let results = dispatcher.dispatch(&ctx, &descriptor).await?;
//! println!("{} hits", results.total_hits());
//! ```
//!
//! [`QueryDescriptor`]: fedsearch_core::QueryDescriptor
//! [`ResultSet`]: fedsearch_core::ResultSet

pub mod backend;
pub mod dispatcher;
pub mod document;
pub mod elastic;
pub mod memory;
pub mod types;

// Re-exports
pub use backend::{
    EngineProvider, EngineQuery, SearchBackend, StaticEngineProvider, create_search_backend,
};
pub use dispatcher::Dispatcher;
pub use document::SearchDocument;
pub use elastic::ElasticBackend;
pub use memory::MemoryBackend;
pub use types::{GLOBAL_SEARCH_SCOPE, SearchConfig};
