//! Post-processing pipeline
//!
//! A directive's `_process` chain is a list of transform specs, each either a bare
//! action name (`"TimeAgo"`) or an object carrying the action and its parameters
//! (`{"action": "Limit", "size": 5}`). Specs decode into the closed [`Transform`]
//! set; each transform is a pure function of its input value and parameters.
//! Stages run strictly in declared order.

pub mod dates;
pub mod fields;
pub mod groups;
pub mod images;

use crate::dates::{DateContext, YearMode};
use crate::error::ProcessError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::trace;

/// A decoded post-processing action with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    CalendarEvents,
    TimeAgo,
    TimeAgoInDays(TimeAgoInDaysParams),
    DisplayDate(DisplayDateParams),
    ArticleDate(ArticleDateParams),
    GroupByDate,
    AddYearMonthHeadings(HeadingsParams),
    Limit(LimitParams),
    RemoveDuplicates(DedupParams),
    RemoveDuplicatesFromGroups(DedupParams),
    Sort(SortParams),
    SortEachGroup(SortParams),
    Project(ProjectParams),
    FirstItem(FirstItemParams),
    NormalizeImages(NormalizeImagesParams),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeAgoInDaysParams {
    #[serde(deserialize_with = "lenient::int")]
    pub hours_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayDateParams {
    #[serde(deserialize_with = "lenient::int")]
    pub relative_days: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub hours_offset: i64,
    pub year: YearMode,
    #[serde(deserialize_with = "lenient::boolean")]
    pub short_month: bool,
}

impl Default for DisplayDateParams {
    fn default() -> Self {
        Self {
            relative_days: 2,
            hours_offset: 0,
            year: YearMode::Default,
            short_month: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleDateParams {
    /// Candidate timestamp fields, in priority order
    #[serde(deserialize_with = "lenient::string_list")]
    pub input: Vec<String>,
    pub short_date_field: String,
    pub full_date_field: String,
}

impl Default for ArticleDateParams {
    fn default() -> Self {
        Self {
            input: vec!["date".into(), "publishUp".into(), "TS".into()],
            short_date_field: "shortDate".to_string(),
            full_date_field: "fullDate".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadingsParams {
    #[serde(deserialize_with = "lenient::int")]
    pub hours_offset: i64,
    #[serde(deserialize_with = "lenient::boolean")]
    pub show_year_in_month: bool,
}

impl Default for HeadingsParams {
    fn default() -> Self {
        Self {
            hours_offset: 0,
            show_year_in_month: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LimitParams {
    #[serde(deserialize_with = "lenient::size")]
    pub size: usize,
}

impl Default for LimitParams {
    fn default() -> Self {
        Self { size: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DedupParams {
    pub dedup_field: Option<String>,
    pub priority_field: Option<String>,
    #[serde(deserialize_with = "lenient::value_list")]
    pub priority_values: Vec<Value>,
}

/// Sort direction for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SortParams {
    #[serde(deserialize_with = "lenient::string_list")]
    pub fields: Vec<String>,
    #[serde(deserialize_with = "lenient::order_list")]
    pub orders: Vec<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectParams {
    #[serde(deserialize_with = "lenient::string_list")]
    pub fields: Vec<String>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub remove_empty: bool,
}

impl Default for ProjectParams {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            remove_empty: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FirstItemParams {
    pub default: Value,
}

impl Default for FirstItemParams {
    fn default() -> Self {
        Self {
            default: Value::Object(Map::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizeImagesParams {
    #[serde(deserialize_with = "lenient::string_list")]
    pub fields: Vec<String>,
}

impl Default for NormalizeImagesParams {
    fn default() -> Self {
        Self {
            fields: vec!["heroImage".into(), "heroLink".into(), "thumbImage".into()],
        }
    }
}

fn decode<P: DeserializeOwned>(
    action: &'static str,
    params: Map<String, Value>,
) -> Result<P, ProcessError> {
    serde_json::from_value(Value::Object(params)).map_err(|e| ProcessError::InvalidParams {
        action,
        reason: e.to_string(),
    })
}

impl Transform {
    /// Decode a transform spec: `"Name"` or `{"action": "Name", ...params}`
    pub fn from_spec(spec: &Value) -> Result<Self, ProcessError> {
        let (name, mut params) = match spec {
            Value::String(name) => (name.as_str(), Map::new()),
            Value::Object(map) => match map.get("action") {
                Some(Value::String(name)) => (name.as_str(), map.clone()),
                _ => return Err(ProcessError::InvalidSpec(spec.to_string())),
            },
            _ => return Err(ProcessError::InvalidSpec(spec.to_string())),
        };
        params.remove("action");

        Ok(match name {
            "CalendarEvents" => Transform::CalendarEvents,
            "TimeAgo" => Transform::TimeAgo,
            "TimeAgoInDays" => Transform::TimeAgoInDays(decode("TimeAgoInDays", params)?),
            "DisplayDate" => Transform::DisplayDate(decode("DisplayDate", params)?),
            "ArticleDate" => Transform::ArticleDate(decode("ArticleDate", params)?),
            "GroupByDate" => Transform::GroupByDate,
            "AddYearMonthHeadings" => {
                Transform::AddYearMonthHeadings(decode("AddYearMonthHeadings", params)?)
            }
            "Limit" => Transform::Limit(decode("Limit", params)?),
            "RemoveDuplicates" => Transform::RemoveDuplicates(decode("RemoveDuplicates", params)?),
            "RemoveDuplicatesFromGroups" => Transform::RemoveDuplicatesFromGroups(decode(
                "RemoveDuplicatesFromGroups",
                params,
            )?),
            "Sort" => Transform::Sort(decode("Sort", params)?),
            "SortEachGroup" => Transform::SortEachGroup(decode("SortEachGroup", params)?),
            "Project" => Transform::Project(decode("Project", params)?),
            "FirstItem" => Transform::FirstItem(decode("FirstItem", params)?),
            "NormalizeImages" => Transform::NormalizeImages(decode("NormalizeImages", params)?),
            other => return Err(ProcessError::UnknownAction(other.to_string())),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::CalendarEvents => "CalendarEvents",
            Transform::TimeAgo => "TimeAgo",
            Transform::TimeAgoInDays(_) => "TimeAgoInDays",
            Transform::DisplayDate(_) => "DisplayDate",
            Transform::ArticleDate(_) => "ArticleDate",
            Transform::GroupByDate => "GroupByDate",
            Transform::AddYearMonthHeadings(_) => "AddYearMonthHeadings",
            Transform::Limit(_) => "Limit",
            Transform::RemoveDuplicates(_) => "RemoveDuplicates",
            Transform::RemoveDuplicatesFromGroups(_) => "RemoveDuplicatesFromGroups",
            Transform::Sort(_) => "Sort",
            Transform::SortEachGroup(_) => "SortEachGroup",
            Transform::Project(_) => "Project",
            Transform::FirstItem(_) => "FirstItem",
            Transform::NormalizeImages(_) => "NormalizeImages",
        }
    }

    /// Apply this transform to a value
    pub fn apply(&self, input: Value, ctx: &DateContext) -> Result<Value, ProcessError> {
        trace!(action = self.name(), "Process result");
        match self {
            Transform::CalendarEvents => dates::calendar_events(input, ctx),
            Transform::TimeAgo => dates::time_ago(input, ctx),
            Transform::TimeAgoInDays(p) => dates::time_ago_in_days(input, p, ctx),
            Transform::DisplayDate(p) => dates::display_date(input, p, ctx),
            Transform::ArticleDate(p) => dates::article_date(input, p, ctx),
            Transform::GroupByDate => groups::group_by_date(input),
            Transform::AddYearMonthHeadings(p) => dates::add_year_month_headings(input, p, ctx),
            Transform::Limit(p) => groups::limit(input, p),
            Transform::RemoveDuplicates(p) => groups::remove_duplicates(input, p),
            Transform::RemoveDuplicatesFromGroups(p) => {
                groups::remove_duplicates_from_groups(input, p)
            }
            Transform::Sort(p) => groups::sort(input, p),
            Transform::SortEachGroup(p) => groups::sort_each_group(input, p),
            Transform::Project(p) => Ok(fields::project(input, p)),
            Transform::FirstItem(p) => Ok(fields::first_item(input, p)),
            Transform::NormalizeImages(p) => Ok(images::normalize_images(input, p)),
        }
    }
}

/// Decode and run a chain of transform specs in order
pub fn run_chain(specs: &[Value], input: Value, ctx: &DateContext) -> Result<Value, ProcessError> {
    specs.iter().try_fold(input, |value, spec| {
        Transform::from_spec(spec)?.apply(value, ctx)
    })
}

/// Require an array input
pub(crate) fn expect_array(
    action: &'static str,
    input: Value,
) -> Result<Vec<Value>, ProcessError> {
    match input {
        Value::Array(items) => Ok(items),
        other => Err(ProcessError::InvalidInput {
            action,
            expected: "an array",
            found: crate::value::type_name(&other),
        }),
    }
}

/// Deserializers that accept the loosely typed values templates tend to carry
/// (`"5"` for 5, `"true"` for true, a single string for a list).
mod lenient {
    use super::{Deserialize, Deserializer, SortOrder};
    use serde::de::Error;
    use serde_json::Value;

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| D::Error::custom("expected an integer")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected an integer, got {:?}", s))),
            Value::Null => Ok(0),
            other => Err(D::Error::custom(format!("expected an integer, got {}", other))),
        }
    }

    pub fn size<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
        let n = int(d)?;
        usize::try_from(n).map_err(|_| D::Error::custom("expected a non-negative size"))
    }

    pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::String(s) => s == "true" || s == "1",
            Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
            _ => false,
        })
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(vec![s]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(D::Error::custom(format!("expected a string, got {}", other))),
                })
                .collect(),
            other => Err(D::Error::custom(format!(
                "expected a string or a list of strings, got {}",
                other
            ))),
        }
    }

    pub fn value_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            other => vec![other],
        })
    }

    pub fn order_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<SortOrder>, D::Error> {
        string_list(d)?
            .iter()
            .map(|s| match s.to_ascii_lowercase().as_str() {
                "asc" => Ok(SortOrder::Asc),
                "desc" => Ok(SortOrder::Desc),
                other => Err(D::Error::custom(format!("unknown sort order {:?}", other))),
            })
            .collect()
    }
}
