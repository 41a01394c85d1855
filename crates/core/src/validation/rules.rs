//! Validation rule parsing.
//!
//! Rule strings are parsed once, when a [`RuleSet`] is built. Every rule is
//! resolved to a [`Check`] carrying its already-parsed parameters, so
//! evaluation never looks names up or re-parses numbers.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::formats;

/// Every rule name the engine understands.
pub const RULE_NAMES: &[&str] = &[
    "required",
    "confirmed",
    "accepted",
    "same",
    "different",
    "numeric",
    "integer",
    "size",
    "between",
    "min",
    "max",
    "in",
    "not_in",
    "unique",
    "exists",
    "ip",
    "email",
    "url",
    "active_url",
    "image",
    "alpha",
    "alpha_num",
    "alpha_dash",
    "match",
    "mimes",
    "before",
    "after",
];

/// Errors raised while building a rule set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Malformed rule '{rule}' on field '{field}': {reason}")]
    Parse {
        field: String,
        rule: String,
        reason: String,
    },

    #[error("Unknown validation rule '{rule}' on field '{field}'")]
    UnknownRule { field: String, rule: String },
}

/// A rule kind with its parsed parameters.
#[derive(Debug, Clone)]
pub enum Check {
    Required,
    Confirmed,
    Accepted,
    Same(String),
    Different(String),
    Numeric,
    Integer,
    Size(f64),
    Between {
        min: f64,
        max: f64,
    },
    Min(f64),
    Max(f64),
    In(Vec<String>),
    NotIn(Vec<String>),
    Unique {
        table: String,
        column: Option<String>,
        except: Option<String>,
        except_column: Option<String>,
    },
    Exists {
        table: String,
        column: Option<String>,
    },
    Ip,
    Email,
    Url,
    ActiveUrl,
    Image,
    Alpha,
    AlphaNum,
    AlphaDash,
    Match(Regex),
    Mimes(Vec<String>),
    Before(NaiveDateTime),
    After(NaiveDateTime),
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Confirmed => "confirmed",
            Self::Accepted => "accepted",
            Self::Same(_) => "same",
            Self::Different(_) => "different",
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Size(_) => "size",
            Self::Between { .. } => "between",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::In(_) => "in",
            Self::NotIn(_) => "not_in",
            Self::Unique { .. } => "unique",
            Self::Exists { .. } => "exists",
            Self::Ip => "ip",
            Self::Email => "email",
            Self::Url => "url",
            Self::ActiveUrl => "active_url",
            Self::Image => "image",
            Self::Alpha => "alpha",
            Self::AlphaNum => "alpha_num",
            Self::AlphaDash => "alpha_dash",
            Self::Match(_) => "match",
            Self::Mimes(_) => "mimes",
            Self::Before(_) => "before",
            Self::After(_) => "after",
        }
    }

    /// Implicit rules run even when the field is absent.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::Required | Self::Accepted)
    }

    /// Rules that switch size comparisons to numeric values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric | Self::Integer)
    }

    /// Rules whose message depends on how the size was measured.
    pub fn is_size_family(&self) -> bool {
        matches!(
            self,
            Self::Size(_) | Self::Between { .. } | Self::Min(_) | Self::Max(_)
        )
    }
}

/// One parsed rule: the check plus the raw parameters (kept for messages).
#[derive(Debug, Clone)]
pub struct Rule {
    check: Check,
    parameters: Vec<String>,
}

impl Rule {
    /// Parse a single rule such as `between:1,2` declared on `field`.
    pub fn parse(field: &str, raw: &str) -> Result<Self, RuleError> {
        let raw = raw.trim();
        let (name, params) = match raw.split_once(':') {
            Some((name, params)) => (name.trim(), Some(params)),
            None => (raw, None),
        };

        let malformed = |reason: &str| RuleError::Parse {
            field: field.to_string(),
            rule: raw.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(malformed("empty rule name"));
        }

        let parameters: Vec<String> = match params {
            None => Vec::new(),
            Some(p) if name == "match" => vec![p.trim().to_string()],
            Some(p) => p.split(',').map(|s| s.trim().to_string()).collect(),
        };
        if params.is_some() && parameters.iter().all(String::is_empty) {
            return Err(malformed("empty parameter list"));
        }

        let check = build_check(name, &parameters).map_err(|failure| match failure {
            BuildFailure::Unknown => RuleError::UnknownRule {
                field: field.to_string(),
                rule: name.to_string(),
            },
            BuildFailure::Malformed(reason) => malformed(&reason),
        })?;

        Ok(Self { check, parameters })
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub fn name(&self) -> &'static str {
        self.check.name()
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

/// Parse a pipe-delimited rule string (`"required|numeric|between:1,2"`).
///
/// A blank string yields no rules; an empty segment (`"a||b"`) is malformed.
pub fn parse_rules(field: &str, spec: &str) -> Result<Vec<Rule>, RuleError> {
    if spec.trim().is_empty() {
        return Ok(Vec::new());
    }
    spec.split('|').map(|raw| Rule::parse(field, raw)).collect()
}

enum BuildFailure {
    Unknown,
    Malformed(String),
}

fn build_check(name: &str, params: &[String]) -> Result<Check, BuildFailure> {
    let check = match name {
        "required" => no_params(params, Check::Required)?,
        "confirmed" => no_params(params, Check::Confirmed)?,
        "accepted" => no_params(params, Check::Accepted)?,
        "numeric" => no_params(params, Check::Numeric)?,
        "integer" => no_params(params, Check::Integer)?,
        "ip" => no_params(params, Check::Ip)?,
        "email" => no_params(params, Check::Email)?,
        "url" => no_params(params, Check::Url)?,
        "active_url" => no_params(params, Check::ActiveUrl)?,
        "image" => no_params(params, Check::Image)?,
        "alpha" => no_params(params, Check::Alpha)?,
        "alpha_num" => no_params(params, Check::AlphaNum)?,
        "alpha_dash" => no_params(params, Check::AlphaDash)?,
        "same" => {
            arity(params, 1, 1)?;
            Check::Same(params[0].clone())
        }
        "different" => {
            arity(params, 1, 1)?;
            Check::Different(params[0].clone())
        }
        "size" => {
            arity(params, 1, 1)?;
            Check::Size(bound(&params[0])?)
        }
        "min" => {
            arity(params, 1, 1)?;
            Check::Min(bound(&params[0])?)
        }
        "max" => {
            arity(params, 1, 1)?;
            Check::Max(bound(&params[0])?)
        }
        "between" => {
            arity(params, 2, 2)?;
            let (min, max) = (bound(&params[0])?, bound(&params[1])?);
            if min > max {
                return Err(BuildFailure::Malformed(format!(
                    "lower bound {min} exceeds upper bound {max}"
                )));
            }
            Check::Between { min, max }
        }
        "in" => Check::In(list(params)?),
        "not_in" => Check::NotIn(list(params)?),
        "mimes" => Check::Mimes(list(params)?),
        "unique" => {
            arity(params, 1, 4)?;
            Check::Unique {
                table: required_param(params, 0, "table")?,
                column: optional_param(params, 1),
                except: optional_param(params, 2),
                except_column: optional_param(params, 3),
            }
        }
        "exists" => {
            arity(params, 1, 2)?;
            Check::Exists {
                table: required_param(params, 0, "table")?,
                column: optional_param(params, 1),
            }
        }
        "match" => {
            arity(params, 1, 1)?;
            Check::Match(formats::compile_pattern(&params[0]).map_err(BuildFailure::Malformed)?)
        }
        "before" => {
            arity(params, 1, 1)?;
            Check::Before(date(&params[0])?)
        }
        "after" => {
            arity(params, 1, 1)?;
            Check::After(date(&params[0])?)
        }
        _ => return Err(BuildFailure::Unknown),
    };
    Ok(check)
}

fn no_params(params: &[String], check: Check) -> Result<Check, BuildFailure> {
    arity(params, 0, 0)?;
    Ok(check)
}

fn arity(params: &[String], min: usize, max: usize) -> Result<(), BuildFailure> {
    let count = params.len();
    if count < min || count > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(BuildFailure::Malformed(format!(
            "expected {expected} parameter(s), got {count}"
        )));
    }
    Ok(())
}

fn bound(raw: &str) -> Result<f64, BuildFailure> {
    formats::parse_numeric(raw)
        .ok_or_else(|| BuildFailure::Malformed(format!("'{raw}' is not a number")))
}

fn date(raw: &str) -> Result<NaiveDateTime, BuildFailure> {
    formats::parse_date(raw)
        .ok_or_else(|| BuildFailure::Malformed(format!("'{raw}' is not a date")))
}

fn list(params: &[String]) -> Result<Vec<String>, BuildFailure> {
    if params.is_empty() {
        return Err(BuildFailure::Malformed("expected at least one value".into()));
    }
    Ok(params.to_vec())
}

fn required_param(params: &[String], index: usize, what: &str) -> Result<String, BuildFailure> {
    match params.get(index) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(BuildFailure::Malformed(format!("missing {what}"))),
    }
}

fn optional_param(params: &[String], index: usize) -> Option<String> {
    params.get(index).filter(|value| !value.is_empty()).cloned()
}

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

/// Rules for one field, in declaration order.
#[derive(Debug, Clone)]
pub struct FieldRules {
    field: String,
    rules: Vec<Rule>,
}

impl FieldRules {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Whether `numeric` or `integer` appears anywhere in the list.
    pub fn has_numeric_rule(&self) -> bool {
        self.rules.iter().any(|rule| rule.check.is_numeric())
    }
}

/// How rules for a field are written: one pipe-delimited string, or one
/// rule per element (needed when a parameter contains `|`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Piped(String),
    Listed(Vec<String>),
}

impl RuleSpec {
    fn parse(&self, field: &str) -> Result<Vec<Rule>, RuleError> {
        match self {
            Self::Piped(spec) => parse_rules(field, spec),
            Self::Listed(rules) => rules.iter().map(|raw| Rule::parse(field, raw)).collect(),
        }
    }
}

/// Field name to ordered rules. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    /// Build from `(field, "rule|rule:param")` pairs.
    pub fn parse<I, K, V>(rules: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        rules
            .into_iter()
            .fold(Self::builder(), |builder, (field, spec)| {
                builder.field(field, spec.as_ref())
            })
            .build()
    }

    /// Build from deserialized specs, e.g. a JSON request body.
    pub fn from_specs(specs: &IndexMap<String, RuleSpec>) -> Result<Self, RuleError> {
        specs
            .iter()
            .fold(Self::builder(), |builder, (field, spec)| {
                builder.spec(field.clone(), spec.clone())
            })
            .build()
    }

    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldRules> {
        self.fields.iter()
    }

    pub fn get(&self, field: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|entry| entry.field == field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Collects raw rule specs; parsing happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RuleSetBuilder {
    specs: Vec<(String, RuleSpec)>,
}

impl RuleSetBuilder {
    /// Pipe-delimited rules for `field`.
    pub fn field(self, field: impl Into<String>, spec: &str) -> Self {
        self.spec(field, RuleSpec::Piped(spec.to_string()))
    }

    /// One rule per element for `field`.
    pub fn rules<I, S>(self, field: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec(
            field,
            RuleSpec::Listed(rules.into_iter().map(Into::into).collect()),
        )
    }

    pub fn spec(mut self, field: impl Into<String>, spec: RuleSpec) -> Self {
        self.specs.push((field.into(), spec));
        self
    }

    /// Parse every spec. Rules declared twice for a field are appended.
    pub fn build(self) -> Result<RuleSet, RuleError> {
        let mut fields: Vec<FieldRules> = Vec::new();
        for (field, spec) in self.specs {
            let rules = spec.parse(&field)?;
            match fields.iter_mut().find(|entry| entry.field == field) {
                Some(entry) => entry.rules.extend(rules),
                None => fields.push(FieldRules { field, rules }),
            }
        }
        Ok(RuleSet { fields })
    }
}
