//! `planwright inspect` - what is actually stored for recent plans

use anyhow::{bail, Result};

use planwright_core::agent::catalog::EXECUTIVE_SUMMARY_KEY;
use planwright_core::storage::{Database, PlanRecord, PlanStore, SECTION_COLUMNS};
use planwright_core::PlanwrightConfig;

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

pub fn run(config: &PlanwrightConfig, id: Option<&str>, limit: usize) -> Result<()> {
    let db = Database::new(&config.db_path)?;
    let store = PlanStore::new(&db);

    let plans: Vec<PlanRecord> = match id {
        Some(id) => match store.get_plan(id)? {
            Some(plan) => vec![plan],
            None => bail!("plan {} not found", id),
        },
        None => {
            let recent = store.list_recent(limit)?;
            println!("Recent plans: {}", recent.len());
            let mut plans = Vec::with_capacity(recent.len());
            for summary in recent {
                if let Some(plan) = store.get_plan(&summary.id)? {
                    plans.push(plan);
                }
            }
            plans
        }
    };

    for plan in &plans {
        print!("{}", render(plan));
    }
    Ok(())
}

fn render(plan: &PlanRecord) -> String {
    let mut out = String::new();
    let preview: String = plan
        .questionnaire
        .business_description
        .chars()
        .take(DESCRIPTION_PREVIEW_CHARS)
        .collect();

    out.push_str(&format!("\nPlan ID: {}\n", plan.id));
    out.push_str(&format!("Status: {}\n", plan.status));
    out.push_str(&format!("Business Description: {}\n", preview));
    out.push_str("\nSections status:\n");

    let summary_state = match plan.executive_summary.as_deref() {
        Some(s) if !s.is_empty() => "HAS DATA",
        _ => "EMPTY",
    };
    out.push_str(&format!("{}: {}\n", EXECUTIVE_SUMMARY_KEY, summary_state));

    for (key, _) in SECTION_COLUMNS {
        match plan.sections.get(key) {
            Some(section) => {
                out.push_str(&format!("{}: HAS DATA\n", key));
                if let Some(object) = section.as_object() {
                    let keys: Vec<_> = object.keys().map(String::as_str).collect();
                    out.push_str(&format!("  Keys: {}\n", keys.join(", ")));
                }
            }
            None => out.push_str(&format!("{}: EMPTY\n", key)),
        }
    }

    out.push_str("\nConfidence:\n");
    for (key, score) in &plan.confidence {
        out.push_str(&format!("  {}: {:.2}\n", key, score));
    }
    out
}
