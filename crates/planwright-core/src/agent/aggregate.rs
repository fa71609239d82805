//! Plan aggregation
//!
//! Folds the run's task results and the executive summary into the shape
//! that gets persisted. Failed sections are simply absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::runner::RunResults;

/// Lifecycle of a plan record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Generating,
    Complete,
    /// Reserved. Plans with failed sections are still stored as `Complete`.
    PartialFailure,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Generating => write!(f, "generating"),
            Self::Complete => write!(f, "complete"),
            Self::PartialFailure => write!(f, "partial_failure"),
        }
    }
}

impl std::str::FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "generating" => Ok(Self::Generating),
            "complete" => Ok(Self::Complete),
            "partial_failure" => Ok(Self::PartialFailure),
            _ => Err(format!("Unknown plan status: {}", s)),
        }
    }
}

/// Final plan content. `sections` and `confidence` always share one key set.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanAggregate {
    sections: BTreeMap<String, Map<String, Value>>,
    confidence: BTreeMap<String, f64>,
    executive_summary: String,
    status: PlanStatus,
}

impl PlanAggregate {
    pub fn sections(&self) -> &BTreeMap<String, Map<String, Value>> {
        &self.sections
    }

    pub fn section(&self, result_key: &str) -> Option<&Map<String, Value>> {
        self.sections.get(result_key)
    }

    pub fn confidence(&self) -> &BTreeMap<String, f64> {
        &self.confidence
    }

    pub fn executive_summary(&self) -> &str {
        &self.executive_summary
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }
}

/// Build the plan from settled results.
///
/// Status is `Complete` whenever this runs, even if some sections failed.
pub fn aggregate(results: &RunResults, executive_summary: String) -> PlanAggregate {
    let mut sections = BTreeMap::new();
    let mut confidence = BTreeMap::new();

    for result in results.successes() {
        if let (Some(data), Some(score)) = (result.data(), result.confidence()) {
            sections.insert(result.result_key.clone(), data.clone());
            confidence.insert(result.result_key.clone(), score);
        }
    }

    PlanAggregate {
        sections,
        confidence,
        executive_summary,
        status: PlanStatus::Complete,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::agent::catalog;
    use crate::agent::runner::{TaskError, TaskOutcome, TaskResult};
    use crate::agent::ExtractError;

    fn results_with_failures(failed: &[&str]) -> RunResults {
        RunResults::from_results(
            catalog::list()
                .iter()
                .map(|spec| {
                    let outcome = if failed.contains(&spec.result_key) {
                        TaskOutcome::Failure {
                            error: TaskError::Extraction(ExtractError::NoStructuredPayloadFound),
                        }
                    } else {
                        TaskOutcome::Success {
                            data: json!({"k": spec.name}).as_object().cloned().unwrap(),
                            confidence: 0.9,
                        }
                    };
                    TaskResult {
                        task_name: spec.name.to_string(),
                        result_key: spec.result_key.to_string(),
                        outcome,
                        started_at: Utc::now(),
                        duration_ms: 1,
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn key_sets_match_for_any_failure_mix() {
        let keys: Vec<_> = catalog::list().iter().map(|s| s.result_key).collect();
        // Every subset of the 8 keys as a failure set.
        for mask in 0u32..(1 << keys.len()) {
            let failed: Vec<_> = keys
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, k)| *k)
                .collect();
            let plan = aggregate(&results_with_failures(&failed), String::new());

            let section_keys: Vec<_> = plan.sections().keys().collect();
            let confidence_keys: Vec<_> = plan.confidence().keys().collect();
            assert_eq!(section_keys, confidence_keys);
            assert_eq!(section_keys.len(), keys.len() - failed.len());
            assert_eq!(plan.status(), PlanStatus::Complete);
        }
    }

    #[test]
    fn failed_sections_are_absent() {
        let plan = aggregate(
            &results_with_failures(&["operationsPlan"]),
            "Summary".to_string(),
        );
        assert!(plan.section("operationsPlan").is_none());
        assert!(!plan.confidence().contains_key("operationsPlan"));
        assert_eq!(plan.confidence()["marketAnalysis"], 0.9);
        assert_eq!(plan.executive_summary(), "Summary");
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            PlanStatus::Pending,
            PlanStatus::Generating,
            PlanStatus::Complete,
            PlanStatus::PartialFailure,
        ] {
            assert_eq!(status.to_string().parse::<PlanStatus>(), Ok(status));
        }
        assert!("done".parse::<PlanStatus>().is_err());
    }
}
