//! Shared test doubles for router tests.

use crate::language::{LanguageClassifier, Verdict};
use crate::selector::{AgentSelector, Selection};
use async_trait::async_trait;
use skillroute_core::error::{EmbeddingError, ObserverError, StoreError};
use skillroute_core::{
    AgentProfile, CatalogEntry, Collection, Embedder, EntryKind, FragmentProfile, RouteObserver, RouteRecord,
    ScoredId, VectorStore,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn agent_entry(id: &str, keywords: &[&str], trigger: Option<&str>) -> CatalogEntry {
    CatalogEntry {
        id: id.into(),
        text: format!("You are {id}."),
        kind: EntryKind::Agent(AgentProfile {
            display_name: id.into(),
            domain_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            trigger_command: trigger.map(String::from),
            ..AgentProfile::default()
        }),
        source: None,
        embedding: None,
    }
}

/// A skill or implant whose body is `Body of <id>.`
pub fn fragment_entry(collection: Collection, id: &str, description: &str) -> CatalogEntry {
    let profile = FragmentProfile {
        description: description.into(),
        ..FragmentProfile::default()
    };
    CatalogEntry {
        id: id.into(),
        text: format!("Body of {id}."),
        kind: match collection {
            Collection::Implants => EntryKind::Implant(profile),
            _ => EntryKind::Skill(profile),
        },
        source: None,
        embedding: None,
    }
}

/// A store that is always down.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }
    async fn upsert(&self, _: Collection, _: &str, _: Vec<f32>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn query(&self, _: Collection, _: &[f32], _: usize) -> Result<Vec<ScoredId>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn count(&self, _: Collection) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Embeds every text as the same unit vector and counts calls.
pub struct CountingEmbedder {
    pub calls: AtomicUsize,
    fail: bool,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }
    fn dimensions(&self) -> usize {
        2
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::Network("unreachable".into()));
        }
        Ok(vec![1.0, 0.0])
    }
}

/// Always detects the same language.
pub struct FixedClassifier {
    code: String,
    name: String,
}

impl FixedClassifier {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl LanguageClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }
    fn classify(&self, _text: &str) -> Verdict {
        Verdict::Detected {
            code: self.code.clone(),
            name: self.name.clone(),
            confidence: 1.0,
        }
    }
}

/// Returns a fixed selection and counts calls.
pub struct ScriptedSelector {
    selection: Selection,
    calls: AtomicUsize,
}

impl ScriptedSelector {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AgentSelector for ScriptedSelector {
    fn name(&self) -> &str {
        "scripted"
    }
    fn select(&self, _: &str, _: Option<&[f32]>, _: &[CatalogEntry]) -> Selection {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.selection.clone()
    }
}

/// Keeps every record.
#[derive(Default)]
pub struct RecordingObserver {
    pub records: Mutex<Vec<RouteRecord>>,
}

impl RouteObserver for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }
    fn observe(&self, record: &RouteRecord) -> Result<(), ObserverError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Rejects every record.
pub struct FailingObserver;

impl RouteObserver for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }
    fn observe(&self, _: &RouteRecord) -> Result<(), ObserverError> {
        Err(ObserverError::Rejected {
            name: "failing".into(),
            reason: "sink offline".into(),
        })
    }
}
