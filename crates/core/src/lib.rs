//! # skillroute core
//!
//! Domain types, traits, and error definitions for the skillroute agent
//! router. This crate performs no I/O: it defines the model that the catalog,
//! embedding, router, telemetry, and gateway crates implement against.
//!
//! ## Seams
//!
//! Every external collaborator is a trait here:
//! - [`Embedder`] turns text into a fixed-length vector
//! - [`VectorStore`] answers nearest-neighbour queries per [`Collection`]
//! - [`RouteObserver`] receives one [`RouteRecord`] per routed request

pub mod catalog;
pub mod embedding;
pub mod error;
pub mod observe;
pub mod routing;
pub mod store;
pub mod text;

// Re-export key types at crate root for ergonomics
pub use catalog::{AgentProfile, CatalogEntry, Collection, EntryKind, FragmentProfile};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use observe::{RouteObserver, RouteRecord};
pub use routing::{Outcome, RankedCandidate, Resolution, RouteSource};
pub use store::{ScoredId, VectorStore};
