//! Vector catalog adapter for skillroute.
//!
//! Loads agent, skill, and implant definitions from disk, expands imports,
//! embeds them, and answers nearest-neighbour queries per collection.

pub mod catalog;
pub mod file_store;
pub mod frontmatter;
pub mod imports;
pub mod in_memory;
pub mod lint;
pub mod loader;
pub mod vector;

pub use catalog::{Catalog, IndexMode, IndexSummary, embed_with_timeout, index_entries};
pub use file_store::FileVectorStore;
pub use in_memory::InMemoryVectorStore;
pub use lint::{LintReport, lint_catalog};
pub use loader::{LoadReport, load_all};
pub use vector::{cosine_distance, cosine_similarity};
