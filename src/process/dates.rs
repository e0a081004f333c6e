//! Date-driven transforms: calendar decomposition, relative labels, article
//! dates and year/month headings.
//!
//! The labelling transforms are order sensitive: a label is only written on a
//! record when it differs from the label computed for the previous record, so a
//! run of records sharing a day carries the label once.

use super::{
    expect_array, ArticleDateParams, DisplayDateParams, HeadingsParams, TimeAgoInDaysParams,
};
use crate::dates::{DateContext, DisplayOptions, FormatOptions, YearMode};
use crate::error::ProcessError;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Decompose `date` (or `TS`) into year, month, day and time. Year, month and
/// day are written only when they change from the previous record; time is
/// always written.
pub fn calendar_events(input: Value, ctx: &DateContext) -> Result<Value, ProcessError> {
    let mut events = expect_array("CalendarEvents", input)?;
    let mut previous: Option<(String, String, String)> = None;

    for event in events.iter_mut() {
        let Value::Object(record) = event else {
            continue;
        };
        let source = record.get("date").or_else(|| record.get("TS"));
        let Some(ts) = source.and_then(|v| ctx.parse_timestamp(v)) else {
            continue;
        };
        let parts = ctx.calendar_parts(ts);
        let (prev_year, prev_month, prev_day) = match &previous {
            Some((y, m, d)) => (Some(y), Some(m), Some(d)),
            None => (None, None, None),
        };
        if prev_year != Some(&parts.year) {
            record.insert("year".to_string(), json!(parts.year));
        }
        if prev_month != Some(&parts.month) {
            record.insert("month".to_string(), json!(parts.month));
        }
        if prev_day != Some(&parts.day) {
            record.insert("day".to_string(), json!(parts.day));
        }
        record.insert("time".to_string(), json!(parts.time));
        previous = Some((parts.year, parts.month, parts.day));
    }
    Ok(Value::Array(events))
}

fn out_of_range(action: &'static str) -> ProcessError {
    ProcessError::InvalidParams {
        action,
        reason: "hoursOffset moves a date out of the representable range".to_string(),
    }
}

/// Write `label(TS)` into `date`, skipping repeats of the previous label.
/// A `None` label means the params pushed a date out of range.
fn label_runs<F>(
    action: &'static str,
    input: Value,
    ctx: &DateContext,
    label: F,
) -> Result<Value, ProcessError>
where
    F: Fn(DateTime<Utc>) -> Option<String>,
{
    let mut events = expect_array(action, input)?;
    let mut previous: Option<String> = None;

    for event in events.iter_mut() {
        let Value::Object(record) = event else {
            continue;
        };
        let Some(ts) = record.get("TS").and_then(|v| ctx.parse_timestamp(v)) else {
            continue;
        };
        let current = label(ts).ok_or_else(|| out_of_range(action))?;
        if previous.as_ref() != Some(&current) {
            record.insert("date".to_string(), json!(current));
        }
        previous = Some(current);
    }
    Ok(Value::Array(events))
}

pub fn time_ago(input: Value, ctx: &DateContext) -> Result<Value, ProcessError> {
    label_runs("TimeAgo", input, ctx, |ts| Some(ctx.time_ago(ts)))
}

pub fn time_ago_in_days(
    input: Value,
    params: &TimeAgoInDaysParams,
    ctx: &DateContext,
) -> Result<Value, ProcessError> {
    label_runs("TimeAgoInDays", input, ctx, |ts| {
        ctx.time_ago_in_days(ts, params.hours_offset)
    })
}

pub fn display_date(
    input: Value,
    params: &DisplayDateParams,
    ctx: &DateContext,
) -> Result<Value, ProcessError> {
    let opts = DisplayOptions {
        relative_days: params.relative_days,
        hours_offset: params.hours_offset,
        year: params.year,
        short_month: params.short_month,
    };
    label_runs("DisplayDate", input, ctx, |ts| ctx.display_date(ts, &opts))
}

/// Add short and full formatted dates derived from the first present input
/// field. Accepts a single record or an array of records.
pub fn article_date(
    input: Value,
    params: &ArticleDateParams,
    ctx: &DateContext,
) -> Result<Value, ProcessError> {
    let short = FormatOptions {
        year: YearMode::Never,
        short_month: true,
        day_of_week: false,
    };
    let full = FormatOptions {
        year: YearMode::Always,
        short_month: false,
        day_of_week: true,
    };

    let annotate = |mut item: Value| -> Value {
        if let Value::Object(record) = &mut item {
            let present = params.input.iter().find_map(|field| record.get(field));
            if let Some(ts) = present.and_then(|v| ctx.parse_timestamp(v)) {
                record.insert(
                    params.short_date_field.clone(),
                    json!(ctx.formatted_date(ts, &short)),
                );
                record.insert(
                    params.full_date_field.clone(),
                    json!(ctx.formatted_date(ts, &full)),
                );
            }
        }
        item
    };

    Ok(match input {
        Value::Array(items) => Value::Array(items.into_iter().map(annotate).collect()),
        single => annotate(single),
    })
}

/// Representative timestamp: the record's own `TS`, else its first item's
fn representative_ts(event: &Value) -> Option<&Value> {
    event
        .get("TS")
        .filter(|ts| crate::value::is_truthy(Some(*ts)))
        .or_else(|| {
            event
                .get("items")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(|first| first.get("TS"))
        })
}

/// Insert year and month headings before the first record of each new year or
/// month. Records are never dropped or reordered.
pub fn add_year_month_headings(
    input: Value,
    params: &HeadingsParams,
    ctx: &DateContext,
) -> Result<Value, ProcessError> {
    const ACTION: &str = "AddYearMonthHeadings";
    let events = expect_array(ACTION, input)?;
    let current = ctx
        .current_year_month(params.hours_offset)
        .ok_or_else(|| out_of_range(ACTION))?;
    let mut updated = Vec::with_capacity(events.len());
    let mut last_year = None;
    let mut last_month = None;

    for event in events {
        let ts = representative_ts(&event).and_then(|v| ctx.parse_timestamp(v));
        if let Some(ts) = ts {
            let date = ctx
                .year_month(ts, params.hours_offset)
                .ok_or_else(|| out_of_range(ACTION))?;
            if last_year != Some(date.year) {
                let mut heading = json!({
                    "date": date.year.to_string(),
                    "ref": date.year.to_string(),
                    "type": "year",
                });
                if date.year == current.year {
                    heading["current"] = Value::Bool(true);
                }
                last_year = Some(date.year);
                updated.push(heading);
            }
            if last_month != Some(date) {
                let label = if params.show_year_in_month {
                    format!("{} {}", date.month_name(), date.year)
                } else {
                    date.month_name().to_string()
                };
                let mut heading = json!({
                    "date": label,
                    "ref": date.reference(),
                    "type": "month",
                });
                if date == current {
                    heading["current"] = Value::Bool(true);
                }
                last_month = Some(date);
                updated.push(heading);
            }
        }
        updated.push(event);
    }
    Ok(Value::Array(updated))
}
