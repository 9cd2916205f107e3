//! Plan collection
//!
//! Runs an `EXPLAIN` probe for a captured statement and shapes the result
//! into a [`Plan`]. Only reads are probed: re-executing a write, even under
//! `EXPLAIN`, can have side effects on some databases.
//!
//! ## Eligibility
//!
//! A statement is probed only when all of these hold:
//! - plan capture is enabled and SQL recording is not `off`
//! - the query ran longer than `explain_threshold`
//! - the first keyword is `SELECT`
//! - the text was not truncated (a cut statement cannot be explained)
//! - the text holds a single statement

use slowsql_core::normalize::is_truncated;
use slowsql_core::{ExplainError, ExplainProbe, Observation, Plan, RecordSql, SamplerConfig};

/// Decides whether to probe and runs the probe
#[derive(Debug, Clone, Copy)]
pub struct PlanCollector {
    enabled: bool,
    threshold: f64,
}

impl PlanCollector {
    /// Collector honoring the plan settings of `config`
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            enabled: config.explain_enabled && config.record_sql != RecordSql::Off,
            threshold: config.explain_threshold,
        }
    }

    /// Whether any plan can be collected at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Collect the plan of `observation` through `db`
    ///
    /// Returns `Ok(None)` when the observation is not eligible. Probe
    /// failures are returned to the caller, which decides how to report them;
    /// they never carry a partial plan.
    pub fn collect_plan(
        &self,
        observation: &Observation,
        db: &dyn ExplainProbe,
    ) -> Result<Option<Plan>, ExplainError> {
        if !self.enabled
            || observation.cost() <= self.threshold
            || !is_plan_eligible(&observation.query_text)
        {
            return Ok(None);
        }

        let result = db.run_explain(&explain_statement(&observation.query_text))?;
        let width = result.columns.len();
        if let Some(row) = result.rows.iter().find(|row| row.len() != width) {
            return Err(ExplainError::Malformed(format!(
                "row has {} values for {} columns",
                row.len(),
                width
            )));
        }
        Ok(Some(Plan::new(result.columns, result.rows)))
    }
}

/// Probe statement for `sql`
pub fn explain_statement(sql: &str) -> String {
    format!("EXPLAIN {}", sql)
}

/// Whether `sql` is a single, complete read statement
pub fn is_plan_eligible(sql: &str) -> bool {
    if is_truncated(sql) {
        return false;
    }
    let trimmed = sql.trim();
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);
    if body.contains(';') {
        return false;
    }
    let keyword: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    keyword.eq_ignore_ascii_case("select")
}
