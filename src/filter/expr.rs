use chrono::NaiveDate;
use serde_json::Value;

use crate::store::record::{is_record_id, Record};

/// Resolves linked-record ids to their display (primary field) values when
/// evaluating expressions in memory. Airtable does this implicitly: a linked
/// field inside `ARRAYJOIN` renders primary-field names, not record ids.
pub trait DisplayResolver {
    fn display(&self, record_id: &str) -> Option<String>;
}

/// Resolver that leaves record ids as-is. Suitable for tables without
/// linked fields in their filterable columns.
pub struct NoLinks;

impl DisplayResolver for NoLinks {
    fn display(&self, _record_id: &str) -> Option<String> {
        None
    }
}

/// Reference to a field inside a formula: either the bare field value or
/// its `ARRAYJOIN` rendering for multi-link fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    Plain(String),
    ArrayJoin(String),
}

/// Structured filter expression with two backends: `to_formula` renders an
/// Airtable `filterByFormula` string, `eval` applies the same semantics to
/// an in-memory record. Both must agree; the test suite leans on this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    True,
    False,
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Exact match: `{Field}='value'`
    Eq { field: String, value: String },
    /// Case-insensitive match: `LOWER({Field})='value'` (value pre-lowered)
    CaseEq { field: String, value: String },
    /// Substring match: `FIND('needle', LOWER(<ref>))` (needle pre-lowered)
    Contains { needle: String, field: FieldRef },
    /// `NOT(IS_BEFORE({Field}, 'YYYY-MM-DD'))`
    OnOrAfter { field: String, date: NaiveDate },
    /// `NOT(IS_AFTER({Field}, 'YYYY-MM-DD'))`
    OnOrBefore { field: String, date: NaiveDate },
    /// `OR(RECORD_ID()='a', ...)`; an empty id set renders `FALSE()`
    RecordIdIn(Vec<String>),
}

impl Expr {
    pub fn contains(needle: impl Into<String>, field: impl Into<String>) -> Self {
        Expr::Contains {
            needle: needle.into().to_lowercase(),
            field: FieldRef::Plain(field.into()),
        }
    }

    pub fn contains_in_links(needle: impl Into<String>, field: impl Into<String>) -> Self {
        Expr::Contains {
            needle: needle.into().to_lowercase(),
            field: FieldRef::ArrayJoin(field.into()),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Expr::Eq { field: field.into(), value: value.into() }
    }

    pub fn case_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Expr::CaseEq { field: field.into(), value: value.into().to_lowercase() }
    }

    /// AND that collapses: empty input is TRUE, a single clause stays bare.
    pub fn and(mut clauses: Vec<Expr>) -> Self {
        match clauses.len() {
            0 => Expr::True,
            1 => clauses.remove(0),
            _ => Expr::And(clauses),
        }
    }

    /// OR that collapses: empty input is FALSE, a single clause stays bare.
    pub fn or(mut clauses: Vec<Expr>) -> Self {
        match clauses.len() {
            0 => Expr::False,
            1 => clauses.remove(0),
            _ => Expr::Or(clauses),
        }
    }

    /// Render as an Airtable `filterByFormula` string.
    pub fn to_formula(&self) -> String {
        match self {
            Expr::True => "TRUE()".to_string(),
            Expr::False => "FALSE()".to_string(),
            Expr::And(clauses) => {
                let parts: Vec<String> = clauses.iter().map(Expr::to_formula).collect();
                format!("AND({})", parts.join(","))
            }
            Expr::Or(clauses) => {
                let parts: Vec<String> = clauses.iter().map(Expr::to_formula).collect();
                format!("OR({})", parts.join(","))
            }
            Expr::Not(inner) => format!("NOT({})", inner.to_formula()),
            Expr::Eq { field, value } => {
                format!("{{{}}}='{}'", field, escape(value))
            }
            Expr::CaseEq { field, value } => {
                format!("LOWER({{{}}})='{}'", field, escape(value))
            }
            Expr::Contains { needle, field } => {
                let haystack = match field {
                    FieldRef::Plain(f) => format!("LOWER({{{}}})", f),
                    FieldRef::ArrayJoin(f) => format!("LOWER(ARRAYJOIN({{{}}}))", f),
                };
                format!("FIND('{}',{})", escape(needle), haystack)
            }
            Expr::OnOrAfter { field, date } => {
                format!("NOT(IS_BEFORE({{{}}},'{}'))", field, date.format("%Y-%m-%d"))
            }
            Expr::OnOrBefore { field, date } => {
                format!("NOT(IS_AFTER({{{}}},'{}'))", field, date.format("%Y-%m-%d"))
            }
            Expr::RecordIdIn(ids) => {
                if ids.is_empty() {
                    return "FALSE()".to_string();
                }
                let parts: Vec<String> = ids
                    .iter()
                    .map(|id| format!("RECORD_ID()='{}'", escape(id)))
                    .collect();
                if parts.len() == 1 {
                    parts.into_iter().next().unwrap_or_default()
                } else {
                    format!("OR({})", parts.join(","))
                }
            }
        }
    }

    /// Evaluate against an in-memory record, resolving linked ids to display
    /// values through `links`.
    pub fn eval(&self, record: &Record, links: &dyn DisplayResolver) -> bool {
        match self {
            Expr::True => true,
            Expr::False => false,
            Expr::And(clauses) => clauses.iter().all(|c| c.eval(record, links)),
            Expr::Or(clauses) => clauses.iter().any(|c| c.eval(record, links)),
            Expr::Not(inner) => !inner.eval(record, links),
            Expr::Eq { field, value } => {
                scalar_text(record, field).is_some_and(|v| v == *value)
            }
            Expr::CaseEq { field, value } => {
                scalar_text(record, field).is_some_and(|v| v.to_lowercase() == *value)
            }
            Expr::Contains { needle, field } => {
                let name = match field {
                    FieldRef::Plain(f) | FieldRef::ArrayJoin(f) => f,
                };
                field_text(record, name, links).to_lowercase().contains(needle.as_str())
            }
            Expr::OnOrAfter { field, date } => {
                field_date(record, field).is_some_and(|d| d >= *date)
            }
            Expr::OnOrBefore { field, date } => {
                field_date(record, field).is_some_and(|d| d <= *date)
            }
            Expr::RecordIdIn(ids) => ids.iter().any(|id| *id == record.id),
        }
    }
}

/// Escape a string literal for inclusion in a formula.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn scalar_text(record: &Record, field: &str) -> Option<String> {
    match record.value(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text rendering of a field the way ARRAYJOIN sees it: arrays are joined
/// with ", " and linked record ids replaced by their display values.
fn field_text(record: &Record, field: &str, links: &dyn DisplayResolver) -> String {
    match record.value(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) if is_record_id(s) => {
                    Some(links.display(s).unwrap_or_else(|| s.clone()))
                }
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Date component of a field; accepts both `YYYY-MM-DD` and full ISO
/// datetimes by parsing the first ten characters.
fn field_date(record: &Record, field: &str) -> Option<NaiveDate> {
    let raw = record.str_field(field)?;
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
