//! Error message lookup and placeholder replacement.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::rules::{Check, Rule};

/// How a size-family rule measured the value; picks the message variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Numeric,
    File,
    String,
}

/// Built-in English line for a rule.
pub fn default_line(rule: &str, kind: SizeKind) -> &'static str {
    match (rule, kind) {
        ("size", SizeKind::Numeric) => "The :attribute must be :size.",
        ("size", SizeKind::File) => "The :attribute must be :size kilobytes.",
        ("size", SizeKind::String) => "The :attribute must be :size characters.",
        ("between", SizeKind::Numeric) => "The :attribute must be between :min - :max.",
        ("between", SizeKind::File) => "The :attribute must be between :min - :max kilobytes.",
        ("between", SizeKind::String) => "The :attribute must be between :min - :max characters.",
        ("min", SizeKind::Numeric) => "The :attribute must be at least :min.",
        ("min", SizeKind::File) => "The :attribute must be at least :min kilobytes.",
        ("min", SizeKind::String) => "The :attribute must be at least :min characters.",
        ("max", SizeKind::Numeric) => "The :attribute must be less than :max.",
        ("max", SizeKind::File) => "The :attribute must be less than :max kilobytes.",
        ("max", SizeKind::String) => "The :attribute must be less than :max characters.",
        ("required", _) => "The :attribute field is required.",
        ("confirmed", _) => "The :attribute confirmation does not match.",
        ("accepted", _) => "The :attribute must be accepted.",
        ("same", _) => "The :attribute and :other must match.",
        ("different", _) => "The :attribute and :other must be different.",
        ("numeric", _) => "The :attribute must be a number.",
        ("integer", _) => "The :attribute must be an integer.",
        ("in", _) => "The selected :attribute is invalid.",
        ("not_in", _) => "The selected :attribute is invalid.",
        ("unique", _) => "The :attribute has already been taken.",
        ("exists", _) => "The selected :attribute is invalid.",
        ("ip", _) => "The :attribute must be a valid IP address.",
        ("email", _) => "The :attribute format is invalid.",
        ("url", _) => "The :attribute format is invalid.",
        ("active_url", _) => "The :attribute is not a valid URL.",
        ("image", _) => "The :attribute must be an image.",
        ("alpha", _) => "The :attribute may only contain letters.",
        ("alpha_num", _) => "The :attribute may only contain letters and numbers.",
        ("alpha_dash", _) => "The :attribute may only contain letters, numbers, and dashes.",
        ("match", _) => "The :attribute format is invalid.",
        ("mimes", _) => "The :attribute must be a file of type: :values.",
        ("before", _) => "The :attribute must be a date before :date.",
        ("after", _) => "The :attribute must be a date after :date.",
        _ => "The :attribute is invalid.",
    }
}

/// Caller overrides for messages and attribute display names.
///
/// Message keys are `"<field>_<rule>"` (checked first) or `"<rule>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCatalog {
    #[serde(default)]
    pub messages: HashMap<String, String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, key: impl Into<String>, line: impl Into<String>) -> Self {
        self.messages.insert(key.into(), line.into());
        self
    }

    pub fn with_attribute(mut self, field: impl Into<String>, name: impl Into<String>) -> Self {
        self.attributes.insert(field.into(), name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.attributes.is_empty()
    }

    /// Display name for a field: the configured one, else the field name
    /// with underscores as spaces.
    pub fn attribute_name(&self, field: &str) -> String {
        self.attributes
            .get(field)
            .cloned()
            .unwrap_or_else(|| field.replace('_', " "))
    }

    /// Line for `rule` on `field` with every placeholder filled in.
    pub fn render(&self, field: &str, rule: &Rule, kind: SizeKind) -> String {
        let line = self
            .messages
            .get(&format!("{field}_{}", rule.name()))
            .or_else(|| self.messages.get(rule.name()))
            .map(String::as_str)
            .unwrap_or_else(|| default_line(rule.name(), kind));

        let mut message = line.replace(":attribute", &self.attribute_name(field));
        let params = rule.parameters();
        let first = params.first().map(String::as_str).unwrap_or_default();

        match rule.check() {
            Check::Same(other) | Check::Different(other) => {
                message = message.replace(":other", &self.attribute_name(other));
            }
            Check::Size(_) => message = message.replace(":size", first),
            Check::Min(_) => message = message.replace(":min", first),
            Check::Max(_) => message = message.replace(":max", first),
            Check::Between { .. } => {
                let second = params.get(1).map(String::as_str).unwrap_or_default();
                message = message.replace(":min", first).replace(":max", second);
            }
            Check::In(_) | Check::NotIn(_) | Check::Mimes(_) => {
                message = message.replace(":values", &params.join(", "));
            }
            Check::Before(_) | Check::After(_) => message = message.replace(":date", first),
            _ => {}
        }
        message
    }
}
