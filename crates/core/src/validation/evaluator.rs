//! Rule evaluator.
//!
//! Pure checks run inline; `unique`, `exists`, `active_url`, `image` and
//! `mimes` go through the injected capabilities or the file inspector.
//! Capability failures never abort a pass: the rule fails and a warning is
//! logged.

use std::sync::Arc;

use serde_json::Value;

use super::files;
use super::formats;
use super::input::{FieldValue, Input};
use super::lookup::{Exclusion, LookupError, PresenceQuery, PresenceVerifier};
use super::messages::{MessageCatalog, SizeKind};
use super::network::{DnsProbe, UrlProbe};
use super::result::ValidationResult;
use super::rules::{Check, Rule, RuleSet};
use crate::config::ValidatorConfig;

/// Values the `accepted` rule takes as consent.
const ACCEPTED_VALUES: &[&str] = &["yes", "on", "1", "true"];

/// Suffix of the companion field read by `confirmed`.
const CONFIRMATION_SUFFIX: &str = "_confirmation";

/// Shared, immutable validation engine.
#[derive(Clone)]
pub struct Validator {
    config: Arc<ValidatorConfig>,
    messages: MessageCatalog,
    presence: Option<Arc<dyn PresenceVerifier>>,
    url_probe: Arc<dyn UrlProbe>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("messages", &self.messages)
            .field("presence", &self.presence.is_some())
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Engine with a DNS-backed `active_url` probe and no presence verifier.
    pub fn new(config: ValidatorConfig) -> Self {
        let url_probe = Arc::new(DnsProbe::from_config(&config));
        Self {
            config: Arc::new(config),
            messages: MessageCatalog::default(),
            presence: None,
            url_probe,
        }
    }

    pub fn with_presence(mut self, presence: Arc<dyn PresenceVerifier>) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn with_url_probe(mut self, probe: Arc<dyn UrlProbe>) -> Self {
        self.url_probe = probe;
        self
    }

    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = messages;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    /// Run every rule in `rules` against `input` using the engine's messages.
    pub async fn validate(&self, input: &Input, rules: &RuleSet) -> ValidationResult {
        self.validate_with(input, rules, &self.messages).await
    }

    /// Run every rule in `rules` against `input`, rendering failures with
    /// `messages`.
    pub async fn validate_with(
        &self,
        input: &Input,
        rules: &RuleSet,
        messages: &MessageCatalog,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        for field_rules in rules.fields() {
            let field = field_rules.field();
            let value = input.classify(field);
            let numeric = field_rules.has_numeric_rule();

            for rule in field_rules.rules() {
                if !value.is_present() && !rule.check().is_implicit() {
                    continue;
                }

                match self.evaluate(field, value, rule, input, numeric).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(field, rule = rule.name(), "Validation rule failed");
                        let kind = size_kind(rule, value, numeric);
                        result.add(field, messages.render(field, rule, kind));
                    }
                    Err(err) => {
                        tracing::warn!(
                            field,
                            rule = rule.name(),
                            error = %err,
                            "Validation rule could not be evaluated"
                        );
                        let kind = size_kind(rule, value, numeric);
                        result.add(field, messages.render(field, rule, kind));
                    }
                }
            }
        }

        result
    }

    async fn evaluate(
        &self,
        field: &str,
        value: FieldValue<'_>,
        rule: &Rule,
        input: &Input,
        numeric: bool,
    ) -> Result<bool, LookupError> {
        let passed = match rule.check() {
            Check::Required => value.is_present(),
            Check::Accepted => evaluate_accepted(value),
            Check::Confirmed => {
                let confirmation = format!("{field}{CONFIRMATION_SUFFIX}");
                renders_equal(value, input.classify(&confirmation))
            }
            Check::Same(other) => renders_equal(value, input.classify(other)),
            Check::Different(other) => !renders_equal(value, input.classify(other)),
            Check::Numeric => matches!(value, FieldValue::Scalar(v) if formats::is_numeric(v)),
            Check::Integer => matches!(value, FieldValue::Scalar(v) if formats::is_integer(v)),
            Check::Size(size) => value.size(numeric).is_some_and(|actual| actual == *size),
            Check::Between { min, max } => value
                .size(numeric)
                .is_some_and(|actual| *min <= actual && actual <= *max),
            Check::Min(min) => value.size(numeric).is_some_and(|actual| actual >= *min),
            Check::Max(max) => value.size(numeric).is_some_and(|actual| actual <= *max),
            Check::In(allowed) => evaluate_membership(value, allowed, true),
            Check::NotIn(denied) => evaluate_membership(value, denied, false),
            Check::Ip => text_passes(value, formats::is_ip),
            Check::Email => text_passes(value, formats::is_email),
            Check::Url => text_passes(value, formats::is_url),
            Check::Alpha => text_passes(value, formats::is_alpha),
            Check::AlphaNum => text_passes(value, formats::is_alpha_num),
            Check::AlphaDash => text_passes(value, formats::is_alpha_dash),
            Check::Match(pattern) => text_passes(value, |text| pattern.is_match(text)),
            Check::Before(limit) => {
                text_passes(value, |text| formats::parse_date(text).is_some_and(|d| d < *limit))
            }
            Check::After(limit) => {
                text_passes(value, |text| formats::parse_date(text).is_some_and(|d| d > *limit))
            }
            Check::ActiveUrl => return self.evaluate_active_url(value).await,
            Check::Image => return evaluate_image(value).await,
            Check::Mimes(extensions) => return self.evaluate_mimes(value, extensions).await,
            Check::Unique {
                table,
                column,
                except,
                except_column,
            } => {
                return self
                    .evaluate_unique(
                        field,
                        value,
                        table,
                        column.as_deref(),
                        except.as_deref(),
                        except_column.as_deref(),
                    )
                    .await
            }
            Check::Exists { table, column } => {
                return self
                    .evaluate_exists(field, value, table, column.as_deref())
                    .await
            }
        };
        Ok(passed)
    }

    // -----------------------------------------------------------------------
    // Capability-backed rules
    // -----------------------------------------------------------------------

    async fn evaluate_active_url(&self, value: FieldValue<'_>) -> Result<bool, LookupError> {
        let Some(host) = value.as_text().and_then(|text| formats::url_host(&text)) else {
            return Ok(false);
        };
        self.url_probe.resolves(&host).await
    }

    async fn evaluate_mimes(
        &self,
        value: FieldValue<'_>,
        extensions: &[String],
    ) -> Result<bool, LookupError> {
        let Some(file) = value.as_file() else {
            return Ok(false);
        };
        let facts = files::inspect(&file.tmp_name).await?;
        Ok(self.config.mimes.accepts(extensions, facts.mime))
    }

    async fn evaluate_unique(
        &self,
        field: &str,
        value: FieldValue<'_>,
        table: &str,
        column: Option<&str>,
        except: Option<&str>,
        except_column: Option<&str>,
    ) -> Result<bool, LookupError> {
        let Some(text) = value.as_text() else {
            return Ok(false);
        };
        let verifier = self.presence_verifier()?;
        let column = column.unwrap_or(field);
        let query = PresenceQuery {
            table,
            column,
            value: &text,
            except: except.map(|value| Exclusion {
                column: except_column.unwrap_or(column),
                value,
            }),
        };
        Ok(!verifier.exists(&query).await?)
    }

    async fn evaluate_exists(
        &self,
        field: &str,
        value: FieldValue<'_>,
        table: &str,
        column: Option<&str>,
    ) -> Result<bool, LookupError> {
        let Some(elements) = value.texts() else {
            return Ok(false);
        };
        let verifier = self.presence_verifier()?;
        let column = column.unwrap_or(field);

        for element in &elements {
            let query = PresenceQuery {
                table,
                column,
                value: element,
                except: None,
            };
            if !verifier.exists(&query).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn presence_verifier(&self) -> Result<&dyn PresenceVerifier, LookupError> {
        self.presence
            .as_deref()
            .ok_or(LookupError::Unavailable("presence verifier"))
    }
}

async fn evaluate_image(value: FieldValue<'_>) -> Result<bool, LookupError> {
    let Some(file) = value.as_file() else {
        return Ok(false);
    };
    Ok(files::inspect(&file.tmp_name).await?.is_image)
}

fn evaluate_accepted(value: FieldValue<'_>) -> bool {
    match value {
        FieldValue::Scalar(Value::Bool(flag)) => *flag,
        FieldValue::Scalar(Value::Number(n)) => n.as_f64() == Some(1.0),
        FieldValue::Scalar(Value::String(s)) => {
            let s = s.trim().to_ascii_lowercase();
            ACCEPTED_VALUES.contains(&s.as_str())
        }
        _ => false,
    }
}

fn evaluate_membership(value: FieldValue<'_>, list: &[String], expected: bool) -> bool {
    value.texts().is_some_and(|elements| {
        elements
            .iter()
            .all(|element| list.iter().any(|item| item == element.as_ref()) == expected)
    })
}

/// Both fields render to the same text (element-wise for lists).
fn renders_equal(left: FieldValue<'_>, right: FieldValue<'_>) -> bool {
    match (left.texts(), right.texts()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn text_passes(value: FieldValue<'_>, check: impl Fn(&str) -> bool) -> bool {
    value.as_text().is_some_and(|text| check(&text))
}

fn size_kind(rule: &Rule, value: FieldValue<'_>, numeric: bool) -> SizeKind {
    if !rule.check().is_size_family() {
        return SizeKind::String;
    }
    match value {
        FieldValue::File(_) => SizeKind::File,
        _ if value.is_numeric_size(numeric) => SizeKind::Numeric,
        _ => SizeKind::String,
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use image::{ImageBuffer, Rgb};
    use serde_json::json;

    use super::*;
    use crate::validation::input::UploadedFile;
    use crate::validation::lookup::InMemoryPresence;
    use crate::validation::network::KnownHosts;

    fn validator() -> Validator {
        let store = InMemoryPresence::new()
            .with_row("validation_unique", [("id", "1"), ("code", "AR")])
            .with_row("validation_unique", [("id", "2"), ("code", "TX")])
            .with_row("validation_unique", [("id", "3"), ("code", "NY")]);
        Validator::new(ValidatorConfig::default())
            .with_presence(Arc::new(store))
            .with_url_probe(Arc::new(KnownHosts::new(["google.com", "www.google.com"])))
    }

    fn data(value: Value) -> Input {
        match value {
            Value::Object(map) => Input::new(map),
            _ => unreachable!("test input must be an object"),
        }
    }

    fn file(path: impl Into<PathBuf>, size: u64) -> Input {
        Input::default().with_file("photo", UploadedFile::new(path, size))
    }

    async fn passes(input: &Input, field: &str, spec: &str) -> bool {
        let rules = RuleSet::parse([(field, spec)]).unwrap();
        validator().validate(input, &rules).await.is_valid()
    }

    fn sample_jpeg(dir: &Path) -> PathBuf {
        let path = dir.join("desert.jpg");
        ImageBuffer::from_pixel(16, 16, Rgb([210u8, 180, 120]))
            .save(&path)
            .unwrap();
        path
    }

    fn sample_php(dir: &Path) -> PathBuf {
        let path = dir.join("routes.php");
        std::fs::write(&path, "<?php\n\nRoute::get('/', function() {\n\treturn 'home';\n});\n")
            .unwrap();
        path
    }

    #[tokio::test]
    async fn required_rule() {
        let input = data(json!({"name": "Taylor Otwell", "age": 25, "email": "example@gmail.com"}));
        assert!(passes(&input, "name", "required").await);
        assert!(!passes(&data(json!({"name": ""})), "name", "required").await);
        assert!(!passes(&data(json!({"name": "   "})), "name", "required").await);
        assert!(!passes(&data(json!({"age": 25})), "name", "required").await);

        let uploaded = Input::default().with_file("name", UploadedFile::new("foo", 0));
        assert!(passes(&uploaded, "name", "required").await);
        let failed = Input::default().with_file("name", UploadedFile::new("", 0));
        assert!(!passes(&failed, "name", "required").await);
    }

    #[tokio::test]
    async fn confirmed_rule() {
        let input = data(json!({"password": "foo", "password_confirmation": "foo"}));
        assert!(passes(&input, "password", "confirmed").await);

        let input = data(json!({"password": "foo", "password_confirmation": "foo_bar"}));
        assert!(!passes(&input, "password", "confirmed").await);

        let input = data(json!({"password": "foo"}));
        assert!(!passes(&input, "password", "confirmed").await);
    }

    #[tokio::test]
    async fn accepted_rule_is_implicit() {
        for accepted in [json!("1"), json!("yes"), json!("on"), json!(true), json!(1)] {
            assert!(passes(&data(json!({"terms": accepted})), "terms", "accepted").await);
        }
        assert!(!passes(&data(json!({"terms": "2"})), "terms", "accepted").await);
        assert!(!passes(&data(json!({"terms": false})), "terms", "accepted").await);
        assert!(!passes(&Input::default(), "terms", "accepted").await);
    }

    #[tokio::test]
    async fn numeric_rule() {
        for amount in [json!("1.21"), json!("1"), json!(1.2)] {
            assert!(passes(&data(json!({"amount": amount})), "amount", "numeric").await);
        }
        assert!(!passes(&data(json!({"amount": "1.2a"})), "amount", "numeric").await);
    }

    #[tokio::test]
    async fn integer_rule() {
        assert!(passes(&data(json!({"amount": "1"})), "amount", "integer").await);
        assert!(passes(&data(json!({"amount": "0"})), "amount", "integer").await);
        assert!(!passes(&data(json!({"amount": 1.2})), "amount", "integer").await);
        assert!(!passes(&data(json!({"amount": "1.2a"})), "amount", "integer").await);
    }

    #[tokio::test]
    async fn size_rule() {
        let amount = data(json!({"amount": "1.21"}));
        assert!(passes(&amount, "amount", "numeric|size:1.21").await);
        assert!(!passes(&amount, "amount", "numeric|size:1").await);
        // numeric rule after the size rule still switches to numeric comparison
        assert!(passes(&amount, "amount", "size:1.21|numeric").await);

        let text = data(json!({"amount": "111"}));
        assert!(passes(&text, "amount", "size:3").await);
        assert!(!passes(&text, "amount", "size:4").await);

        assert!(passes(&file("foo", 10_240), "photo", "size:10").await);
        assert!(!passes(&file("foo", 14_000), "photo", "size:10").await);
    }

    #[tokio::test]
    async fn between_rule() {
        let amount = data(json!({"amount": "1.21"}));
        assert!(passes(&amount, "amount", "numeric|between:1,2").await);
        assert!(!passes(&amount, "amount", "numeric|between:2,3").await);

        let text = data(json!({"amount": "111"}));
        assert!(passes(&text, "amount", "between:1,3").await);
        assert!(!passes(&text, "amount", "between:100,111").await);

        assert!(passes(&file("foo", 10_240), "photo", "between:9,11").await);
        assert!(!passes(&file("foo", 14_000), "photo", "between:9,11").await);
    }

    #[tokio::test]
    async fn min_rule() {
        let amount = data(json!({"amount": "1.21"}));
        assert!(passes(&amount, "amount", "numeric|min:1").await);
        assert!(!passes(&amount, "amount", "numeric|min:2").await);

        let text = data(json!({"amount": "01"}));
        assert!(passes(&text, "amount", "min:2").await);
        assert!(!passes(&text, "amount", "min:3").await);

        assert!(passes(&file("foo", 10_240), "photo", "min:9").await);
        assert!(!passes(&file("foo", 8_000), "photo", "min:9").await);
    }

    #[tokio::test]
    async fn max_rule() {
        let amount = data(json!({"amount": "1.21"}));
        assert!(passes(&amount, "amount", "numeric|max:2").await);
        assert!(!passes(&amount, "amount", "numeric|max:1").await);

        let text = data(json!({"amount": "01"}));
        assert!(passes(&text, "amount", "max:3").await);
        assert!(!passes(&text, "amount", "max:1").await);

        assert!(passes(&file("foo", 10_240), "photo", "max:11").await);
        assert!(!passes(&file("foo", 140_000), "photo", "max:11").await);
    }

    #[tokio::test]
    async fn size_is_exact_in_every_mode() {
        let number = data(json!({"n": "5"}));
        let text = data(json!({"t": "abcde"}));
        let upload = file("foo", 5 * 1024);
        for (input, field, numeric) in [(&number, "n", "numeric|"), (&text, "t", ""), (&upload, "photo", "")] {
            assert!(passes(input, field, &format!("{numeric}size:5")).await);
            assert!(!passes(input, field, &format!("{numeric}size:4")).await);
            assert!(!passes(input, field, &format!("{numeric}size:6")).await);
            assert!(passes(input, field, &format!("{numeric}between:5,5")).await);
        }
    }

    #[tokio::test]
    async fn fourteen_thousand_bytes_is_thirteen_kilobytes() {
        let upload = file("foo", 14_000);
        assert!(!passes(&upload, "photo", "size:10").await);
        assert!(!passes(&upload, "photo", "max:11").await);
        assert!(!passes(&upload, "photo", "between:9,11").await);
        assert!(passes(&upload, "photo", "min:9").await);
    }

    #[tokio::test]
    async fn in_and_not_in_are_complements() {
        for size in ["S", "M", "L", "XL", "s", ""] {
            let input = data(json!({ "size": size }));
            let is_in = passes(&input, "size", "required|in:S,M,L").await;
            let not_in = passes(&input, "size", "required|not_in:S,M,L").await;
            if size.is_empty() {
                assert!(!is_in && !not_in);
            } else {
                assert_ne!(is_in, not_in, "{size:?}");
            }
        }
    }

    #[tokio::test]
    async fn in_and_not_in_rules() {
        assert!(passes(&data(json!({"size": "L"})), "size", "in:S,M,L").await);
        assert!(!passes(&data(json!({"size": "XL"})), "size", "in:S,M,L").await);
        assert!(!passes(&data(json!({"size": "L"})), "size", "not_in:S,M,L").await);
        assert!(passes(&data(json!({"size": "XL"})), "size", "not_in:S,M,L").await);

        assert!(passes(&data(json!({"size": ["S", "M"]})), "size", "in:S,M,L").await);
        assert!(!passes(&data(json!({"size": ["S", "XL"]})), "size", "in:S,M,L").await);
    }

    #[tokio::test]
    async fn format_rules() {
        assert!(passes(&data(json!({"ip": "192.168.1.1"})), "ip", "ip").await);
        assert!(!passes(&data(json!({"ip": "192.111"})), "ip", "ip").await);

        assert!(passes(&data(json!({"email": "example@gmail.com"})), "email", "email").await);
        assert!(!passes(&data(json!({"email": "blas-asok"})), "email", "email").await);

        assert!(passes(&data(json!({"url": "http://www.google.com"})), "url", "url").await);
        assert!(!passes(&data(json!({"url": "blas-asok"})), "url", "url").await);
    }

    #[tokio::test]
    async fn active_url_rule() {
        assert!(passes(&data(json!({"url": "http://google.com"})), "url", "active_url").await);
        assert!(
            !passes(&data(json!({"url": "http://asdlk-aselkaiwels.com"})), "url", "active_url")
                .await
        );
    }

    #[tokio::test]
    async fn active_url_resolves_ip_literals() {
        // The default DNS probe answers IP literals without a lookup.
        let validator = Validator::new(ValidatorConfig::default());
        let rules = RuleSet::parse([("url", "active_url")]).unwrap();
        for url in ["http://[::1]/", "http://127.0.0.1/"] {
            let input = data(json!({ "url": url }));
            assert!(validator.validate(&input, &rules).await.is_valid(), "{url}");
        }
        let input = data(json!({"url": "http://"}));
        assert!(!validator.validate(&input, &rules).await.is_valid());
    }

    #[tokio::test]
    async fn alpha_rules() {
        assert!(passes(&data(json!({"name": "TaylorOtwell"})), "name", "alpha").await);
        assert!(!passes(&data(json!({"name": "Taylor Otwell"})), "name", "alpha").await);
        assert!(passes(&data(json!({"name": "TaylorOtwell1"})), "name", "alpha_num").await);
        assert!(!passes(&data(json!({"name": "Taylor Otwell"})), "name", "alpha_num").await);
        assert!(passes(&data(json!({"name": "Taylor-Otwell_1"})), "name", "alpha_dash").await);
        assert!(!passes(&data(json!({"name": "Taylor Otwell"})), "name", "alpha_dash").await);
    }

    #[tokio::test]
    async fn image_rule() {
        let dir = tempfile::tempdir().unwrap();
        assert!(passes(&file(sample_jpeg(dir.path()), 600), "photo", "image").await);
        assert!(!passes(&file(sample_php(dir.path()), 60), "photo", "image").await);
        assert!(!passes(&data(json!({"photo": "desert.jpg"})), "photo", "image").await);
    }

    #[tokio::test]
    async fn mimes_rule() {
        let dir = tempfile::tempdir().unwrap();
        let php = file(sample_php(dir.path()), 60);
        assert!(passes(&php, "photo", "mimes:php,txt").await);
        assert!(!passes(&php, "photo", "mimes:jpg,bmp").await);

        let jpeg = file(sample_jpeg(dir.path()), 600);
        assert!(passes(&jpeg, "photo", "mimes:jpg,bmp").await);
        assert!(!passes(&jpeg, "photo", "mimes:txt,bmp").await);
    }

    #[tokio::test]
    async fn mimes_reads_bm_prefixed_text_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "BMX race results\n1. Ana 00:41:12\n2. Joao 00:42:03\n").unwrap();

        let notes = file(path, 1);
        assert!(passes(&notes, "photo", "mimes:txt").await);
        assert!(!passes(&notes, "photo", "mimes:bmp").await);
        assert!(!passes(&notes, "photo", "image").await);
    }

    #[tokio::test]
    async fn unreadable_file_fails_the_rule() {
        let input = file("/definitely/not/here.jpg", 10);
        assert!(!passes(&input, "photo", "image").await);
        assert!(!passes(&input, "photo", "mimes:jpg").await);
    }

    #[tokio::test]
    async fn unique_rule() {
        assert!(passes(&data(json!({"code": "ZZ"})), "code", "unique:validation_unique").await);
        assert!(!passes(&data(json!({"code": "AR"})), "code", "unique:validation_unique").await);
        assert!(
            passes(&data(json!({"code": "AR"})), "code", "unique:validation_unique,code,AR").await
        );
        assert!(
            !passes(&data(json!({"code": "AR"})), "code", "unique:validation_unique,code,2,id")
                .await
        );
        assert!(
            passes(&data(json!({"code": "AR"})), "code", "unique:validation_unique,code,1,id")
                .await
        );
    }

    #[tokio::test]
    async fn exists_rule() {
        let rules = "exists:validation_unique";
        assert!(passes(&data(json!({"code": "TX"})), "code", rules).await);
        assert!(passes(&data(json!({"code": ["TX", "NY"]})), "code", rules).await);
        assert!(!passes(&data(json!({"code": ["TX", "XX"]})), "code", rules).await);
        assert!(!passes(&data(json!({"code": "XX"})), "code", rules).await);
    }

    #[tokio::test]
    async fn presence_rules_fail_without_verifier() {
        let rules = RuleSet::parse([("code", "exists:validation_unique")]).unwrap();
        let result = Validator::new(ValidatorConfig::default())
            .validate(&data(json!({"code": "TX"})), &rules)
            .await;
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn unknown_table_fails_the_rule() {
        assert!(!passes(&data(json!({"code": "ZZ"})), "code", "unique:missing_table").await);
    }

    #[tokio::test]
    async fn same_and_different_rules() {
        let input = data(json!({"a": "x", "b": "x", "c": "y"}));
        assert!(passes(&input, "a", "same:b").await);
        assert!(!passes(&input, "a", "same:c").await);
        assert!(passes(&input, "a", "different:c").await);
        assert!(!passes(&input, "a", "different:b").await);
        assert!(passes(&input, "a", "different:missing").await);
    }

    #[tokio::test]
    async fn match_before_after_rules() {
        let input = data(json!({"code": "ABC", "start": "2020-06-01"}));
        assert!(passes(&input, "code", "match:/^[a-z]+$/i").await);
        assert!(!passes(&input, "code", "match:/^[a-z]+$/").await);
        assert!(passes(&input, "start", "after:2020-01-01").await);
        assert!(!passes(&input, "start", "before:2020-01-01").await);
        assert!(!passes(&data(json!({"start": "someday"})), "start", "after:2020-01-01").await);
    }

    #[tokio::test]
    async fn absent_fields_skip_non_implicit_rules() {
        let input = data(json!({"blank": "  ", "none": null, "list": []}));
        for field in ["blank", "none", "list", "missing"] {
            assert!(passes(&input, field, "email|numeric|min:3|exists:validation_unique").await);
        }
        assert!(passes(&file("", 0), "photo", "image|mimes:jpg").await);
    }

    #[tokio::test]
    async fn every_failure_is_recorded_in_order() {
        let rules = RuleSet::parse([
            ("name", "required"),
            ("email", "email|min:20"),
            ("age", "integer"),
        ])
        .unwrap();
        let input = data(json!({"email": "nope", "age": 25}));
        let result = validator().validate(&input, &rules).await;

        assert_eq!(result.errors().keys().collect::<Vec<_>>(), ["name", "email"]);
        assert_eq!(result.first("name"), Some("The name field is required."));
        assert_eq!(
            result.get("email"),
            [
                "The email format is invalid.",
                "The email must be at least 20 characters."
            ]
        );
        assert_eq!(result.message_count(), 3);
    }

    #[tokio::test]
    async fn messages_pick_size_variant_and_overrides() {
        let rules = RuleSet::parse([("amount", "numeric|max:1"), ("photo", "max:1")]).unwrap();
        let input = data(json!({"amount": "5"})).with_file("photo", UploadedFile::new("x", 4096));
        let result = validator().validate(&input, &rules).await;
        assert_eq!(result.first("amount"), Some("The amount must be less than 1."));
        assert_eq!(result.first("photo"), Some("The photo must be less than 1 kilobytes."));

        let catalog = MessageCatalog::new()
            .with_message("amount_max", "Too much!")
            .with_attribute("photo", "profile photo");
        let result = validator().validate_with(&input, &rules, &catalog).await;
        assert_eq!(result.first("amount"), Some("Too much!"));
        assert_eq!(
            result.first("photo"),
            Some("The profile photo must be less than 1 kilobytes.")
        );
    }
}
