//! Date utilities
//!
//! Timestamp parsing, calendar decomposition, relative labels and display
//! formatting. All calendar math happens in a fixed reference timezone held by a
//! [`DateContext`], together with the instant treated as "now", so every
//! function here is pure given its context.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, Offset, TimeZone,
    Utc,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Source of "now" for date computations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(now) => *now,
        }
    }
}

/// Reference timezone and clock; produces a [`DateContext`] per resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSettings {
    pub offset: FixedOffset,
    pub clock: Clock,
}

impl DateSettings {
    pub fn new(offset: FixedOffset, clock: Clock) -> Self {
        Self { offset, clock }
    }

    /// Snapshot "now" so every computation in one resolution agrees on it
    pub fn context(&self) -> DateContext {
        DateContext::new(self.offset, self.clock.now())
    }
}

impl Default for DateSettings {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            clock: Clock::System,
        }
    }
}

/// Reference timezone plus the instant considered "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateContext {
    offset: FixedOffset,
    now: DateTime<Utc>,
}

/// Calendar decomposition used by calendar-style listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarParts {
    /// e.g. "2017"
    pub year: String,
    /// e.g. "October"
    pub month: String,
    /// Two digits, e.g. "03"
    pub day: String,
    /// e.g. "5:00 PM"
    pub time: String,
}

/// Year and month of an instant, used for headings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based
    pub month: u32,
}

impl YearMonth {
    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }

    /// `YYYY-MM`
    pub fn reference(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_index(index: i64) -> Self {
        YearMonth {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

/// When to print the year in a display date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearMode {
    /// Only when the year differs from the current year
    #[default]
    Default,
    Always,
    Never,
}

/// Formatting switches for [`DateContext::formatted_date`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    pub year: YearMode,
    pub short_month: bool,
    pub day_of_week: bool,
}

/// Options for [`DateContext::display_date`]
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    /// Days (counting today as 0) that get a relative label
    pub relative_days: i64,
    pub hours_offset: i64,
    pub year: YearMode,
    pub short_month: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            relative_days: 2,
            hours_offset: 0,
            year: YearMode::Default,
            short_month: false,
        }
    }
}

/// Granularity of a generated timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineUnit {
    Year,
    Month,
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Full English month name for a 1-based month
pub fn month_name(month: u32) -> &'static str {
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

fn short_month_name(month: u32) -> &'static str {
    &month_name(month)[..3]
}

impl DateContext {
    pub fn new(offset: FixedOffset, now: DateTime<Utc>) -> Self {
        Self { offset, now }
    }

    /// Offset given in minutes east of UTC; `None` if out of range
    pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
        FixedOffset::east_opt(minutes.checked_mul(60)?)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn local(&self, ts: DateTime<Utc>) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.offset)
    }

    /// `ts` moved by `hours`; `None` when the result leaves chrono's range
    fn shift_hours(ts: DateTime<Utc>, hours: i64) -> Option<DateTime<Utc>> {
        Duration::try_hours(hours).and_then(|delta| ts.checked_add_signed(delta))
    }

    fn shifted_date(&self, ts: DateTime<Utc>, hours_offset: i64) -> Option<NaiveDate> {
        Some(self.local(Self::shift_hours(ts, hours_offset)?).date_naive())
    }

    fn local_year_month(&self, ts: DateTime<Utc>) -> YearMonth {
        let local = self.local(ts);
        YearMonth {
            year: local.year(),
            month: local.month(),
        }
    }

    /// Parse epoch milliseconds (number or numeric string), RFC 3339, or a
    /// local `YYYY-MM-DD[THH:MM[:SS]]` date in the reference timezone.
    pub fn parse_timestamp(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Number(n) => {
                let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
                Utc.timestamp_millis_opt(millis).single()
            }
            Value::String(s) => self.parse_str(s.trim()),
            _ => None,
        }
    }

    fn parse_str(&self, s: &str) -> Option<DateTime<Utc>> {
        if s.is_empty() {
            return None;
        }
        if let Ok(millis) = s.parse::<i64>() {
            if s.len() > 4 {
                return Utc.timestamp_millis_opt(millis).single();
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return self.local_to_utc(naive);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return self.local_to_utc(date.and_hms_opt(0, 0, 0)?);
        }
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
            return self.local_to_utc(date.and_hms_opt(0, 0, 0)?);
        }
        if s.len() == 4 {
            let year = s.parse::<i32>().ok()?;
            return self.local_to_utc(NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?);
        }
        None
    }

    fn local_to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Year, month name, two-digit day and 12-hour time
    pub fn calendar_parts(&self, ts: DateTime<Utc>) -> CalendarParts {
        let local = self.local(ts);
        CalendarParts {
            year: local.year().to_string(),
            month: month_name(local.month()).to_string(),
            day: format!("{:02}", local.day()),
            time: local.format("%-I:%M %p").to_string(),
        }
    }

    /// Local year and month after shifting by `hours_offset`; `None` when the
    /// shift leaves the representable range
    pub fn year_month(&self, ts: DateTime<Utc>, hours_offset: i64) -> Option<YearMonth> {
        Some(self.local_year_month(Self::shift_hours(ts, hours_offset)?))
    }

    pub fn current_year_month(&self, hours_offset: i64) -> Option<YearMonth> {
        self.year_month(self.now, hours_offset)
    }

    /// Whole calendar days between `ts` and now; positive for the past
    pub fn days_ago(&self, ts: DateTime<Utc>, hours_offset: i64) -> Option<i64> {
        let today = self.shifted_date(self.now, hours_offset)?;
        let day = self.shifted_date(ts, hours_offset)?;
        Some((today - day).num_days())
    }

    /// Humanized distance from now, e.g. "2 days ago" or "in an hour"
    pub fn time_ago(&self, ts: DateTime<Utc>) -> String {
        let diff = (self.now - ts).num_seconds();
        let phrase = humanize_seconds(diff.abs());
        if diff >= 0 {
            format!("{} ago", phrase)
        } else {
            format!("in {}", phrase)
        }
    }

    /// "Today", "Yesterday", "N days ago" by calendar day
    pub fn time_ago_in_days(&self, ts: DateTime<Utc>, hours_offset: i64) -> Option<String> {
        self.days_ago(ts, hours_offset).map(relative_day_label)
    }

    /// Relative label for recent days, formatted date otherwise
    pub fn display_date(&self, ts: DateTime<Utc>, opts: &DisplayOptions) -> Option<String> {
        let days = self.days_ago(ts, opts.hours_offset)?;
        if days >= 0 && days < opts.relative_days {
            return Some(relative_day_label(days));
        }
        Some(self.formatted_date(
            Self::shift_hours(ts, opts.hours_offset)?,
            &FormatOptions {
                year: opts.year,
                short_month: opts.short_month,
                day_of_week: false,
            },
        ))
    }

    /// e.g. "Aug 1" or "Saturday, August 1, 2020"
    pub fn formatted_date(&self, ts: DateTime<Utc>, opts: &FormatOptions) -> String {
        let local = self.local(ts);
        let month = if opts.short_month {
            short_month_name(local.month())
        } else {
            month_name(local.month())
        };
        let mut out = String::new();
        if opts.day_of_week {
            out.push_str(&local.format("%A, ").to_string());
        }
        out.push_str(&format!("{} {}", month, local.day()));
        let show_year = match opts.year {
            YearMode::Always => true,
            YearMode::Never => false,
            YearMode::Default => local.year() != self.local(self.now).year(),
        };
        if show_year {
            out.push_str(&format!(", {}", local.year()));
        }
        out
    }

    /// Resolve a date expression: `now`, an absolute date (see
    /// [`DateContext::parse_timestamp`]), or an offset such as `+3 months` /
    /// `-1 year` applied to `base` (or now when no base is given).
    pub fn convert_date(&self, expr: &str, base: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        let expr = expr.trim();
        if expr.eq_ignore_ascii_case("now") {
            return Some(self.now);
        }
        if let Some(rest) = expr.strip_prefix('+') {
            return self.shift(base.unwrap_or(self.now), rest, 1);
        }
        if let Some(rest) = expr.strip_prefix('-') {
            if rest.starts_with(|c: char| c.is_ascii_digit()) && rest.contains(' ') {
                return self.shift(base.unwrap_or(self.now), rest, -1);
            }
        }
        self.parse_str(expr)
    }

    fn shift(&self, base: DateTime<Utc>, spec: &str, sign: i64) -> Option<DateTime<Utc>> {
        let mut parts = spec.split_whitespace();
        let amount: u32 = parts.next()?.parse().ok()?;
        let unit = parts.next()?.to_ascii_lowercase();
        let unit = unit.trim_end_matches('s');
        let signed = sign * i64::from(amount);
        match unit {
            "day" => base.checked_add_signed(Duration::try_days(signed)?),
            "week" => base.checked_add_signed(Duration::try_weeks(signed)?),
            "month" | "year" => {
                let count = if unit == "year" { amount.checked_mul(12)? } else { amount };
                let months = Months::new(count);
                let local = self.local(base);
                let shifted = if sign > 0 {
                    local.checked_add_months(months)
                } else {
                    local.checked_sub_months(months)
                };
                shifted.map(|dt| dt.with_timezone(&Utc))
            }
            _ => None,
        }
    }

    /// Year/month markers spanning `start..=end` in either direction
    pub fn timeline(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        unit: TimelineUnit,
        short_month: bool,
    ) -> Vec<Value> {
        let current = self.local_year_month(self.now);
        let from = self.local_year_month(start);
        let to = self.local_year_month(end);
        let mut markers = Vec::new();

        match unit {
            TimelineUnit::Year => {
                let step = if from.year <= to.year { 1 } else { -1 };
                let mut year = from.year;
                loop {
                    markers.push(year_marker(year, year == current.year));
                    if year == to.year {
                        break;
                    }
                    year += step;
                }
            }
            TimelineUnit::Month => {
                let step = if from.index() <= to.index() { 1 } else { -1 };
                let mut index = from.index();
                let mut last_year = None;
                loop {
                    let ym = YearMonth::from_index(index);
                    if last_year != Some(ym.year) {
                        markers.push(year_marker(ym.year, ym.year == current.year));
                        last_year = Some(ym.year);
                    }
                    let name = if short_month {
                        short_month_name(ym.month)
                    } else {
                        ym.month_name()
                    };
                    let mut marker = json!({
                        "date": format!("{} {}", name, ym.year),
                        "ref": ym.reference(),
                        "type": "month",
                    });
                    if ym == current {
                        marker["current"] = Value::Bool(true);
                    }
                    markers.push(marker);
                    if index == to.index() {
                        break;
                    }
                    index += step;
                }
            }
        }
        markers
    }
}

fn year_marker(year: i32, current: bool) -> Value {
    let mut marker = json!({
        "date": year.to_string(),
        "ref": year.to_string(),
        "type": "year",
    });
    if current {
        marker["current"] = Value::Bool(true);
    }
    marker
}

/// "Today", "Yesterday", "Tomorrow", "N days ago", "in N days"
pub fn relative_day_label(days: i64) -> String {
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        -1 => "Tomorrow".to_string(),
        d if d > 1 => format!("{} days ago", d),
        d => format!("in {} days", -d),
    }
}

fn humanize_seconds(secs: i64) -> String {
    let round = |value: i64, unit: i64| (value + unit / 2) / unit;
    let minutes = round(secs, 60);
    let hours = round(secs, 3600);
    let days = round(secs, 86_400);

    if secs < 45 {
        "a few seconds".to_string()
    } else if secs < 90 {
        "a minute".to_string()
    } else if minutes < 45 {
        format!("{} minutes", minutes)
    } else if secs < 90 * 60 {
        "an hour".to_string()
    } else if hours < 22 {
        format!("{} hours", hours)
    } else if hours < 36 {
        "a day".to_string()
    } else if days < 26 {
        format!("{} days", days)
    } else if days < 45 {
        "a month".to_string()
    } else if days < 320 {
        format!("{} months", ((days as f64) / 30.44).round().max(2.0) as i64)
    } else if days < 548 {
        "a year".to_string()
    } else {
        format!("{} years", ((days as f64) / 365.25).round().max(2.0) as i64)
    }
}
