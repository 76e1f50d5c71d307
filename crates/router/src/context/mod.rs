//! Prompt enrichment: assembly and per-session memoisation.

pub mod assembler;
pub mod session_cache;

pub use assembler::{assemble, format_implants, format_skills, join_sections};
pub use session_cache::{Enrichment, EnrichmentScope, SessionPromptCache, session_key};
