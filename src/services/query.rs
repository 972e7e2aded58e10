//! PuppetDB AST query construction
//!
//! PuppetDB filters are nested JSON arrays of the form `["op", arg, ...]`.
//! [`Predicate`] models the subset this dashboard builds, carries anything
//! else a caller sends through untouched, and serializes to exactly the
//! array shape PuppetDB expects.

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::models::View;

/// Environment value meaning "every environment"
pub const ALL_ENVIRONMENTS: &str = "*";

/// Binary comparison operators other than equality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    /// `~`, regular expression match
    Regex,
    /// `null?`, compares field nullness against a boolean
    IsNull,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Regex => "~",
            Operator::IsNull => "null?",
        }
    }

    fn parse(op: &str) -> Option<Self> {
        match op {
            "<" => Some(Operator::LessThan),
            "<=" => Some(Operator::LessOrEqual),
            ">" => Some(Operator::GreaterThan),
            ">=" => Some(Operator::GreaterOrEqual),
            "~" => Some(Operator::Regex),
            "null?" => Some(Operator::IsNull),
            _ => None,
        }
    }
}

/// A PuppetDB filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `["=", field, value]`
    Equals(String, Value),
    /// `[op, field, value]`
    Compare(Operator, String, Value),
    /// `["and", p1, p2, ...]`
    And(Vec<Predicate>),
    /// `["or", p1, p2, ...]`
    Or(Vec<Predicate>),
    /// `["not", p]`
    Not(Box<Predicate>),
    /// Any other caller-supplied expression, passed through unchanged
    Raw(Value),
}

impl Predicate {
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Predicate::Equals(field.to_string(), value.into())
    }

    /// Convert to the wire array representation
    pub fn to_value(&self) -> Value {
        match self {
            Predicate::Equals(field, value) => {
                Value::Array(vec!["=".into(), field.as_str().into(), value.clone()])
            }
            Predicate::Compare(op, field, value) => {
                Value::Array(vec![op.as_str().into(), field.as_str().into(), value.clone()])
            }
            Predicate::And(children) => branch("and", children),
            Predicate::Or(children) => branch("or", children),
            Predicate::Not(child) => Value::Array(vec!["not".into(), child.to_value()]),
            Predicate::Raw(value) => value.clone(),
        }
    }
}

fn branch(op: &str, children: &[Predicate]) -> Value {
    let mut items = Vec::with_capacity(children.len() + 1);
    items.push(Value::from(op));
    items.extend(children.iter().map(Predicate::to_value));
    Value::Array(items)
}

/// Structural error in a caller-supplied predicate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid query: {0}")]
pub struct InvalidPredicate(String);

impl TryFrom<Value> for Predicate {
    type Error = InvalidPredicate;

    /// Decode a caller-supplied expression
    ///
    /// Only the structure is checked: every expression, and every child of
    /// `and`/`or`/`not`, must be a non-empty array headed by a string.
    /// Expressions outside the modeled subset (`in`, `extract`, subqueries,
    /// ...) are kept verbatim as [`Predicate::Raw`] for PuppetDB to judge.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut items = match value {
            Value::Array(items) => items,
            other => {
                return Err(InvalidPredicate(format!("expected an array, got {}", other)))
            }
        };
        let op = match items.first() {
            Some(Value::String(op)) => op.clone(),
            Some(other) => {
                return Err(InvalidPredicate(format!(
                    "operator must be a string, got {}",
                    other
                )))
            }
            None => return Err(InvalidPredicate("empty expression".to_string())),
        };

        match op.as_str() {
            "and" | "or" => {
                let children = items
                    .drain(1..)
                    .map(Predicate::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "and" {
                    Predicate::And(children)
                } else {
                    Predicate::Or(children)
                })
            }
            "not" if items.len() == 2 => {
                let child = items.pop().unwrap_or(Value::Null);
                Ok(Predicate::Not(Box::new(Predicate::try_from(child)?)))
            }
            _ if items.len() == 3 && items[1].is_string() => {
                let comparison = if op == "=" {
                    None
                } else {
                    match Operator::parse(&op) {
                        Some(operator) => Some(operator),
                        None => return Ok(Predicate::Raw(Value::Array(items))),
                    }
                };
                let value = items.pop().unwrap_or(Value::Null);
                let field = match items.pop() {
                    Some(Value::String(field)) => field,
                    _ => String::new(),
                };
                Ok(match comparison {
                    None => Predicate::Equals(field, value),
                    Some(operator) => Predicate::Compare(operator, field, value),
                })
            }
            _ => Ok(Predicate::Raw(Value::Array(items))),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_value() {
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            other => other.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Predicate::try_from(value).map_err(D::Error::custom)
    }
}

/// Body of a PuppetDB v4 entity query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdbQuery {
    /// Filter; `None` matches every entity and is left off the wire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarize_by: Option<String>,
}

impl PdbQuery {
    /// A query without any filter
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(predicate: Predicate) -> Self {
        Self {
            query: Some(predicate),
            summarize_by: None,
        }
    }
}

/// Filters of the node overview page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeOverviewFilter {
    /// Catalog environment; `*` or empty means all environments
    #[serde(default)]
    pub environment: Option<String>,
    /// Accepted latest report statuses; empty means any
    #[serde(default)]
    pub status: Vec<String>,
}

impl NodeOverviewFilter {
    /// The environment to filter on, if it is not the wildcard
    pub fn environment(&self) -> Option<&str> {
        self.environment
            .as_deref()
            .filter(|env| !env.is_empty() && *env != ALL_ENVIRONMENTS)
    }
}

/// Build the node listing query for the overview page
///
/// An environment contributes `["=", "catalog_environment", env]` and the
/// statuses contribute one `or` branch; both together are joined under `and`.
/// With neither, the query is unfiltered.
pub fn node_overview_query(filter: &NodeOverviewFilter) -> PdbQuery {
    let environment = filter
        .environment()
        .map(|env| Predicate::equals("catalog_environment", env));

    let statuses = (!filter.status.is_empty()).then(|| {
        Predicate::Or(
            filter
                .status
                .iter()
                .map(|status| Predicate::equals("latest_report_status", status.as_str()))
                .collect(),
        )
    });

    match (environment, statuses) {
        (Some(env), Some(statuses)) => PdbQuery::filtered(Predicate::And(vec![env, statuses])),
        (Some(env), None) => PdbQuery::filtered(Predicate::And(vec![env])),
        (None, Some(statuses)) => PdbQuery::filtered(statuses),
        (None, None) => PdbQuery::all(),
    }
}

/// Event counts of every node's latest report, one entry per certname
pub fn latest_report_event_counts_query() -> PdbQuery {
    PdbQuery {
        query: Some(Predicate::equals("latest_report?", true)),
        summarize_by: Some("certname".to_string()),
    }
}

/// Facts needed to render a view
///
/// Dotted fact paths request their top-level fact. Repeated roots are kept;
/// PuppetDB treats duplicate `or` clauses as one.
pub fn view_facts_query(view: &View) -> PdbQuery {
    let names = view
        .facts
        .iter()
        .map(|fact| Predicate::equals("name", fact.root_fact()))
        .collect();

    PdbQuery::filtered(Predicate::And(vec![Predicate::Or(names)]))
}
