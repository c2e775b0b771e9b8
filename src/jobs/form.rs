use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::models::job::{JobCreateRequest, TriggerType};

/// Field name -> message. Empty when the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(field, msg)| format!("{field}: {msg}")).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Raw job-definition input, every field as typed by the operator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct JobForm {
    pub job_id: String,
    #[schema(example = "app.tasks:cleanup")]
    pub function: String,
    #[schema(example = "cron")]
    pub trigger_type: String,
    #[schema(example = "*/5 * * * *")]
    pub cron_expression: String,
    pub weeks: String,
    pub days: String,
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub run_date: String,
    pub start_date: String,
    pub end_date: String,
    /// JSON array
    #[schema(example = "[]")]
    pub args: String,
    /// JSON object
    #[schema(example = "{}")]
    pub kwargs: String,
    pub replace_existing: bool,
}

impl Default for JobForm {
    fn default() -> Self {
        Self {
            job_id: String::new(),
            function: String::new(),
            trigger_type: TriggerType::Cron.as_str().to_string(),
            cron_expression: String::new(),
            weeks: String::new(),
            days: String::new(),
            hours: String::new(),
            minutes: String::new(),
            seconds: String::new(),
            run_date: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            args: "[]".to_string(),
            kwargs: "{}".to_string(),
            replace_existing: false,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_count(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, "must be a non-negative whole number");
            None
        }
    }
}

fn parse_date(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(_) => {
            errors.add(field, "must be an RFC 3339 timestamp");
            None
        }
    }
}

fn parse_json(errors: &mut FieldErrors, field: &str, raw: &str, default: &str) -> Option<Value> {
    let raw = if raw.trim().is_empty() { default } else { raw };
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, "must be valid JSON");
            None
        }
    }
}

impl JobForm {
    /// Collects every field problem instead of stopping at the first.
    pub fn validate(&self) -> Result<JobCreateRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        let job_id = non_empty(&self.job_id);
        if job_id.is_none() {
            errors.add("job_id", "is required");
        }
        let function = non_empty(&self.function);
        if function.is_none() {
            errors.add("function", "is required");
        }

        let trigger_type = match self.trigger_type.parse::<TriggerType>() {
            Ok(trigger) => Some(trigger),
            Err(message) => {
                errors.add("trigger_type", message);
                None
            }
        };

        let weeks = parse_count(&mut errors, "weeks", &self.weeks);
        let days = parse_count(&mut errors, "days", &self.days);
        let hours = parse_count(&mut errors, "hours", &self.hours);
        let minutes = parse_count(&mut errors, "minutes", &self.minutes);
        let seconds = parse_count(&mut errors, "seconds", &self.seconds);

        let run_date = parse_date(&mut errors, "run_date", &self.run_date);
        let start_date = parse_date(&mut errors, "start_date", &self.start_date);
        let end_date = parse_date(&mut errors, "end_date", &self.end_date);
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add("end_date", "must not be before start_date");
            }
        }

        let cron_expression = non_empty(&self.cron_expression);
        match trigger_type {
            Some(TriggerType::Cron) if cron_expression.is_none() => {
                errors.add("cron_expression", "is required for cron triggers");
            }
            Some(TriggerType::Interval) => {
                let any_positive = [weeks, days, hours, minutes, seconds]
                    .iter()
                    .any(|part| part.unwrap_or(0) > 0);
                if !any_positive {
                    errors.add("interval", "set at least one of weeks, days, hours, minutes or seconds");
                }
            }
            Some(TriggerType::Date) if run_date.is_none() && !errors.contains("run_date") => {
                errors.add("run_date", "is required for date triggers");
            }
            _ => {}
        }

        let args = match parse_json(&mut errors, "args", &self.args, "[]") {
            Some(Value::Array(items)) => Some(items),
            Some(_) => {
                errors.add("args", "must be a JSON array");
                None
            }
            None => None,
        };
        let kwargs = match parse_json(&mut errors, "kwargs", &self.kwargs, "{}") {
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                errors.add("kwargs", "must be a JSON object");
                None
            }
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let trigger_type = trigger_type.unwrap_or_default();
        // only the fields of the chosen trigger are sent
        let (cron_expression, interval, run_date) = match trigger_type {
            TriggerType::Cron => (cron_expression, [None; 5], None),
            TriggerType::Interval => (None, [weeks, days, hours, minutes, seconds], None),
            TriggerType::Date => (None, [None; 5], run_date),
        };
        let [weeks, days, hours, minutes, seconds] = interval;

        Ok(JobCreateRequest {
            job_id: job_id.unwrap_or_default(),
            function: function.unwrap_or_default(),
            trigger_type,
            cron_expression,
            weeks,
            days,
            hours,
            minutes,
            seconds,
            run_date,
            start_date,
            end_date,
            args: args.unwrap_or_default(),
            kwargs: kwargs.unwrap_or_else(Map::new),
            replace_existing: self.replace_existing,
        })
    }
}
