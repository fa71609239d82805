//! Request and response types for the API

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use planwright_core::agent::PlanStatus;
use planwright_core::storage::{AgentRunRecord, PlanSummary};

#[derive(Debug, Deserialize)]
pub struct ListPlansQuery {
    /// Maximum number of plans to return
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListResponse {
    pub plans: Vec<PlanSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunsResponse {
    pub plan_id: String,
    pub status: PlanStatus,
    pub runs: Vec<AgentRunRecord>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub features: HashMap<String, bool>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_query_limit_is_optional() {
        let query: ListPlansQuery = serde_json::from_value(json!({})).unwrap();
        assert!(query.limit.is_none());

        let query: ListPlansQuery = serde_json::from_value(json!({"limit": 10})).unwrap();
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn runs_response_uses_camel_case() {
        let response = AgentRunsResponse {
            plan_id: "p1".into(),
            status: PlanStatus::Generating,
            runs: vec![],
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"planId": "p1", "status": "generating", "runs": []})
        );
    }
}
