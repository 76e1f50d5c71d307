//! Reasoning strategies: fixed implant bundles per task type.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Debugging,
    Analysis,
    Creative,
    Planning,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [Self::Debugging, Self::Analysis, Self::Creative, Self::Planning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debugging => "debugging",
            Self::Analysis => "analysis",
            Self::Creative => "creative",
            Self::Planning => "planning",
        }
    }

    /// Implant ids for this task type, in injection order.
    pub fn implant_ids(&self) -> &'static [&'static str] {
        match self {
            Self::Debugging => &["implant-chain-of-code", "implant-reflexion"],
            Self::Analysis => &["implant-step-back-prompting", "implant-chain-of-verification"],
            Self::Creative => &["implant-analogical-prompting", "implant-generated-knowledge"],
            Self::Planning => &["implant-plan-and-solve-plus", "implant-skeleton-of-thought"],
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| wanted.to_string())
    }
}

/// Result of a strategy lookup. An unknown task type is a value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyLookup {
    Found {
        task_type: TaskType,
        /// Implants present in the catalog
        implant_ids: Vec<String>,
        /// Rendered implants section
        content: String,
    },
    UnknownStrategy {
        task_type: String,
        known: Vec<String>,
    },
}

impl StrategyLookup {
    pub fn unknown(task_type: &str) -> Self {
        Self::UnknownStrategy {
            task_type: task_type.to_string(),
            known: TaskType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_fixed() {
        assert_eq!(
            TaskType::Debugging.implant_ids(),
            ["implant-chain-of-code", "implant-reflexion"]
        );
        assert_eq!(
            TaskType::Planning.implant_ids(),
            ["implant-plan-and-solve-plus", "implant-skeleton-of-thought"]
        );
        assert!(TaskType::ALL.iter().all(|t| t.implant_ids().len() == 2));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Debugging".parse::<TaskType>(), Ok(TaskType::Debugging));
        assert_eq!(" creative ".parse::<TaskType>(), Ok(TaskType::Creative));
        assert_eq!("gardening".parse::<TaskType>(), Err("gardening".to_string()));
    }

    #[test]
    fn unknown_lists_known_types() {
        let json = serde_json::to_value(StrategyLookup::unknown("gardening")).unwrap();
        assert_eq!(json["status"], "UNKNOWN_STRATEGY");
        assert_eq!(json["known"][0], "debugging");
    }
}
