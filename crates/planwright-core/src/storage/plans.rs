//! Business plan storage
//!
//! One row per plan: the questionnaire answers, one JSON column per section,
//! the confidence map and the executive summary.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::database::Database;
use crate::agent::{PlanAggregate, PlanStatus};
use crate::questionnaire::QuestionnaireInput;

/// Section result key -> column holding its JSON.
pub const SECTION_COLUMNS: [(&str, &str); 8] = [
    ("marketAnalysis", "market_analysis"),
    ("competitiveAnalysis", "competitive_analysis"),
    ("customerAnalysis", "customer_analysis"),
    ("financialProjections", "financial_projections"),
    ("marketingStrategy", "marketing_strategy"),
    ("operationsPlan", "operations_plan"),
    ("riskAnalysis", "risk_analysis"),
    ("legalCompliance", "legal_compliance"),
];

/// A stored plan as read back from the database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: String,
    #[serde(flatten)]
    pub questionnaire: QuestionnaireInput,
    /// Present sections only
    pub sections: BTreeMap<String, Value>,
    pub confidence: BTreeMap<String, f64>,
    pub executive_summary: Option<String>,
    pub status: PlanStatus,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// Summary of a plan for listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: String,
    pub business_description: String,
    pub status: PlanStatus,
    pub section_count: usize,
    pub created_at: String,
}

/// SQLite-backed plan storage
pub struct PlanStore<'a> {
    db: &'a Database,
}

impl<'a> PlanStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new plan row for `input`. Returns the plan ID.
    pub fn create_plan(&self, input: &QuestionnaireInput, status: PlanStatus) -> Result<String> {
        let plan_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.db.conn().execute(
            "INSERT INTO business_plans (
                 id, business_description, business_model, target_market, location,
                 location_type, investment_level, timeline, unique_advantage,
                 status, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                plan_id,
                input.business_description,
                input.business_model,
                input.target_market,
                input.location,
                input.location_type,
                input.investment_level,
                input.timeline,
                input.unique_advantage,
                status.to_string(),
                now,
            ],
        )?;

        tracing::info!(plan_id = %plan_id, status = %status, "Created plan");
        Ok(plan_id)
    }

    /// Write the generated content and mark the plan finished.
    ///
    /// Sections missing from `plan` are stored as NULL.
    pub fn update_plan(&self, plan_id: &str, plan: &PlanAggregate) -> Result<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let summary = json!({ "content": plan.executive_summary() }).to_string();
        let confidence = serde_json::to_string(plan.confidence())?;

        let mut section_json = Vec::with_capacity(SECTION_COLUMNS.len());
        for (key, _) in SECTION_COLUMNS {
            let value = plan.section(key).map(serde_json::to_string).transpose()?;
            section_json.push(value);
        }

        let assignments: Vec<String> = SECTION_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, (_, column))| format!("{} = ?{}", column, i + 6))
            .collect();
        let sql = format!(
            "UPDATE business_plans
             SET executive_summary = ?2, confidence = ?3, status = ?4,
                 completed_at = ?5, updated_at = ?5, {}
             WHERE id = ?1",
            assignments.join(", ")
        );

        let mut values: Vec<Option<String>> = vec![
            Some(plan_id.to_string()),
            Some(summary),
            Some(confidence),
            Some(plan.status().to_string()),
            Some(now),
        ];
        values.extend(section_json);
        let rows = self.db.conn().execute(&sql, params_from_iter(values))?;

        if rows == 0 {
            return Err(anyhow!("plan {} not found", plan_id));
        }

        tracing::info!(
            plan_id = %plan_id,
            sections = plan.sections().len(),
            "Updated plan"
        );
        Ok(())
    }

    /// Get a plan by ID
    pub fn get_plan(&self, plan_id: &str) -> Result<Option<PlanRecord>> {
        let sql = format!(
            "SELECT id, business_description, business_model, target_market, location,
                    location_type, investment_level, timeline, unique_advantage,
                    executive_summary, confidence, status, created_at, updated_at,
                    completed_at, {}
             FROM business_plans WHERE id = ?1",
            section_column_list()
        );

        let row = self
            .db
            .conn()
            .query_row(&sql, [plan_id], read_plan_row)
            .optional()?;

        row.map(PlanRow::into_record).transpose()
    }

    /// Most recently created plans first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<PlanSummary>> {
        let sql = format!(
            "SELECT id, business_description, status, created_at, {}
             FROM business_plans
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1",
            section_column_list()
        );
        let mut stmt = self.db.conn().prepare(&sql)?;

        let plans = stmt.query_map([limit as i64], |row| {
            let mut section_count = 0;
            for (_, column) in SECTION_COLUMNS {
                if row.get::<_, Option<String>>(column)?.is_some() {
                    section_count += 1;
                }
            }
            Ok(PlanSummary {
                id: row.get("id")?,
                business_description: row.get("business_description")?,
                status: row
                    .get::<_, String>("status")?
                    .parse()
                    .unwrap_or(PlanStatus::Pending),
                section_count,
                created_at: row.get("created_at")?,
            })
        })?;

        plans.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn section_column_list() -> String {
    SECTION_COLUMNS
        .iter()
        .map(|(_, column)| *column)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Internal row type for plan queries
struct PlanRow {
    id: String,
    questionnaire: QuestionnaireInput,
    executive_summary: Option<String>,
    confidence: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
    sections: Vec<(&'static str, Option<String>)>,
}

fn read_plan_row(row: &Row<'_>) -> rusqlite::Result<PlanRow> {
    let mut sections = Vec::with_capacity(SECTION_COLUMNS.len());
    for (key, column) in SECTION_COLUMNS {
        sections.push((key, row.get::<_, Option<String>>(column)?));
    }

    Ok(PlanRow {
        id: row.get("id")?,
        questionnaire: QuestionnaireInput {
            business_description: row.get("business_description")?,
            business_model: row.get("business_model")?,
            target_market: row.get("target_market")?,
            location: row.get("location")?,
            location_type: row.get("location_type")?,
            investment_level: row.get("investment_level")?,
            timeline: row.get("timeline")?,
            unique_advantage: row.get("unique_advantage")?,
        },
        executive_summary: row.get("executive_summary")?,
        confidence: row.get("confidence")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
        sections,
    })
}

impl PlanRow {
    fn into_record(self) -> Result<PlanRecord> {
        let mut sections = BTreeMap::new();
        for (key, json) in self.sections {
            if let Some(json) = json {
                let value: Value = serde_json::from_str(&json)
                    .with_context(|| format!("corrupt {} section in plan {}", key, self.id))?;
                sections.insert(key.to_string(), value);
            }
        }

        let confidence = match self.confidence {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("corrupt confidence map in plan {}", self.id))?,
            None => BTreeMap::new(),
        };

        let executive_summary = self
            .executive_summary
            .map(|json| serde_json::from_str::<Map<String, Value>>(&json))
            .transpose()
            .with_context(|| format!("corrupt executive summary in plan {}", self.id))?
            .and_then(|summary| summary.get("content")?.as_str().map(str::to_string));

        let status = self
            .status
            .parse()
            .map_err(|e: String| anyhow!("plan {}: {}", self.id, e))?;

        Ok(PlanRecord {
            id: self.id,
            questionnaire: self.questionnaire,
            sections,
            confidence,
            executive_summary,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}
