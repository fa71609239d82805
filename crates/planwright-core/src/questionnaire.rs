//! Questionnaire input
//!
//! The caller-supplied answers every section prompt is built from. Immutable
//! once received; `validate` mirrors the questionnaire form's own rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DESCRIPTION_MIN_CHARS: usize = 20;
const DESCRIPTION_MAX_CHARS: usize = 500;
const TARGET_MARKET_MIN_CHARS: usize = 10;
const NOT_SPECIFIED: &str = "Not specified";

/// Answers collected from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireInput {
    pub business_description: String,
    pub business_model: String,
    pub target_market: String,
    /// City/region; only required when `location_type` is `local`.
    #[serde(default)]
    pub location: String,
    pub location_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_advantage: Option<String>,
}

/// A questionnaire answer that would not pass the form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("business description must be between {min} and {max} characters (got {actual})")]
    DescriptionLength {
        min: usize,
        max: usize,
        actual: usize,
    },
    #[error("business model is required")]
    MissingBusinessModel,
    #[error("target market must be at least {min} characters (got {actual})")]
    TargetMarketTooShort { min: usize, actual: usize },
    #[error("location type is required")]
    MissingLocationType,
    #[error("location is required for local businesses")]
    MissingLocation,
}

impl QuestionnaireInput {
    /// Check the same constraints the questionnaire form enforces.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let description_len = self.business_description.chars().count();
        if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&description_len) {
            return Err(ValidationError::DescriptionLength {
                min: DESCRIPTION_MIN_CHARS,
                max: DESCRIPTION_MAX_CHARS,
                actual: description_len,
            });
        }

        if self.business_model.trim().is_empty() {
            return Err(ValidationError::MissingBusinessModel);
        }

        let market_len = self.target_market.chars().count();
        if market_len < TARGET_MARKET_MIN_CHARS {
            return Err(ValidationError::TargetMarketTooShort {
                min: TARGET_MARKET_MIN_CHARS,
                actual: market_len,
            });
        }

        if self.location_type.trim().is_empty() {
            return Err(ValidationError::MissingLocationType);
        }

        if self.location_type == "local" && self.location.trim().is_empty() {
            return Err(ValidationError::MissingLocation);
        }

        Ok(())
    }

    /// `<locationType>` or `<locationType> - <location>`.
    pub fn location_line(&self) -> String {
        if self.location.is_empty() {
            self.location_type.clone()
        } else {
            format!("{} - {}", self.location_type, self.location)
        }
    }

    pub fn investment_level_or_default(&self) -> &str {
        or_not_specified(self.investment_level.as_deref())
    }

    pub fn timeline_or_default(&self) -> &str {
        or_not_specified(self.timeline.as_deref())
    }

    pub fn unique_advantage_or_default(&self) -> &str {
        or_not_specified(self.unique_advantage.as_deref())
    }
}

fn or_not_specified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NOT_SPECIFIED,
    }
}
