//! Application-wide constants

pub mod ai {
    /// Model used for every section and for the executive summary.
    pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
    pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";
    /// Output budget for one analysis section.
    pub const SECTION_MAX_TOKENS: usize = 4096;
    /// Output budget for the executive summary.
    pub const SUMMARY_MAX_TOKENS: usize = 2048;
    /// Per-request HTTP timeout. The run-level budget is enforced separately.
    pub const REQUEST_TIMEOUT_SECS: u64 = 110;
}

pub mod plan {
    /// Confidence recorded when the model does not report a numeric one.
    pub const DEFAULT_CONFIDENCE: f64 = 0.7;
    /// Characters of each section's JSON carried into the summary prompt.
    pub const SUMMARY_DIGEST_CHARS: usize = 500;
    /// Wall-clock budget for one generation request.
    pub const RUN_TIMEOUT_SECS: u64 = 120;
    /// Capacity of the progress channel between pipeline and consumer.
    pub const PROGRESS_CHANNEL_BUFFER: usize = 256;
    /// Plans shown by list endpoints when no limit is given.
    pub const DEFAULT_LIST_LIMIT: usize = 3;
}

pub mod ui {
    pub const CONFIG_DIR_NAME: &str = ".planwright";
    pub const CONFIG_FILE_NAME: &str = "config.toml";
    pub const DB_FILE_NAME: &str = "planwright.db";
}
