//! Generators: synthetic backends for `{gen}` directives.
//!
//! `{gen}/timeline/months?startDate=2019-12&endDate=now` produces year and month
//! markers spanning the range, ascending or descending depending on whether the
//! start date comes before the end date.

use crate::dates::{DateSettings, TimelineUnit};
use crate::error::QueryError;
use crate::query::Params;
use serde_json::Value;
use tracing::debug;

/// Timeline generator bound to a reference timezone and clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineGenerator {
    dates: DateSettings,
}

impl TimelineGenerator {
    pub fn new(dates: DateSettings) -> Self {
        Self { dates }
    }

    /// Generate timeline markers for `unit` (`year`, `years`, `month`, `months`).
    ///
    /// Params: `startDate` (default `now`), `endDate` (default `now`, relative
    /// offsets resolve against the start date), `shortMonth` (`true`/`1`).
    /// An unparseable date yields an empty timeline.
    pub fn timeline(&self, unit: &str, params: &Params) -> Result<Value, QueryError> {
        let unit = match unit.to_ascii_lowercase().as_str() {
            "year" | "years" => TimelineUnit::Year,
            "month" | "months" => TimelineUnit::Month,
            _ => return Err(QueryError::UnknownTimelineUnit(unit.to_string())),
        };
        let param = |name: &str| params.get(name).cloned().flatten();
        let start_expr = param("startDate").unwrap_or_else(|| "now".to_string());
        let end_expr = param("endDate").unwrap_or_else(|| "now".to_string());
        let short_month = matches!(param("shortMonth").as_deref(), Some("true") | Some("1"));

        let ctx = self.dates.context();
        let start = ctx.convert_date(&start_expr, None);
        let end = start.and_then(|start| ctx.convert_date(&end_expr, Some(start)));
        debug!(?unit, ?start, ?end, "Decoded timeline range");

        match (start, end) {
            (Some(start), Some(end)) => Ok(Value::Array(ctx.timeline(
                start,
                end,
                unit,
                short_month,
            ))),
            _ => Ok(Value::Array(Vec::new())),
        }
    }
}
