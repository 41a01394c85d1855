//! Input sources and field classification.
//!
//! An [`Input`] holds the two mappings an HTTP form submission produces:
//! regular key/value data and uploaded file descriptors. [`Input::classify`]
//! turns a field name into a [`FieldValue`], which decides presence and the
//! comparable size used by `size`, `between`, `min` and `max`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::formats;

/// Bytes per kilobyte when comparing file sizes.
pub const BYTES_PER_KILOBYTE: u64 = 1024;

/// An uploaded file as handed over by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Temporary path of the stored upload. Empty when nothing was uploaded.
    pub tmp_name: PathBuf,
    /// Upload size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Client-supplied original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UploadedFile {
    pub fn new(tmp_name: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            tmp_name: tmp_name.into(),
            size,
            name: None,
        }
    }

    /// Whether a file actually arrived (non-empty temporary path).
    pub fn is_uploaded(&self) -> bool {
        !self.tmp_name.as_os_str().is_empty()
    }

    /// Size in whole kilobytes, truncated.
    pub fn kilobytes(&self) -> u64 {
        self.size / BYTES_PER_KILOBYTE
    }
}

/// Submitted data for one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    files: BTreeMap<String, UploadedFile>,
}

impl Input {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            files: BTreeMap::new(),
        }
    }

    /// Input made of uploaded files only.
    pub fn from_files<I, K>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, UploadedFile)>,
        K: Into<String>,
    {
        Self {
            data: Map::new(),
            files: files.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        }
    }

    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn files(&self) -> &BTreeMap<String, UploadedFile> {
        &self.files
    }

    /// Classify a field. File uploads take precedence over data entries of
    /// the same name; `null` counts as missing.
    pub fn classify(&self, field: &str) -> FieldValue<'_> {
        if let Some(file) = self.files.get(field) {
            return FieldValue::File(file);
        }
        match self.data.get(field) {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::Array(items)) => FieldValue::List(items),
            Some(value) => FieldValue::Scalar(value),
        }
    }
}

impl From<Map<String, Value>> for Input {
    fn from(data: Map<String, Value>) -> Self {
        Self::new(data)
    }
}

/// A classified field, borrowed from the [`Input`] it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    /// A string, number or boolean (objects also land here and only satisfy
    /// presence checks).
    Scalar(&'a Value),
    List(&'a [Value]),
    File(&'a UploadedFile),
}

impl<'a> FieldValue<'a> {
    /// Presence as seen by `required`: whitespace-only strings, empty lists
    /// and files without a temporary path are absent.
    pub fn is_present(&self) -> bool {
        match *self {
            Self::Missing => false,
            Self::Scalar(Value::String(s)) => !s.trim().is_empty(),
            Self::Scalar(Value::Object(map)) => !map.is_empty(),
            Self::Scalar(_) => true,
            Self::List(items) => !items.is_empty(),
            Self::File(file) => file.is_uploaded(),
        }
    }

    /// String rendering of a scalar value.
    pub fn as_text(&self) -> Option<Cow<'a, str>> {
        match *self {
            Self::Scalar(value) => render_scalar(value),
            _ => None,
        }
    }

    /// Renderings of every element: one for a scalar, one per item for a
    /// list. `None` if any element is not a scalar.
    pub fn texts(&self) -> Option<Vec<Cow<'a, str>>> {
        match *self {
            Self::Scalar(value) => render_scalar(value).map(|text| vec![text]),
            Self::List(items) => items.iter().map(render_scalar).collect(),
            Self::Missing | Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&'a UploadedFile> {
        match *self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// The comparable magnitude used by the size-family rules.
    ///
    /// `numeric` is true when the field carries a `numeric` or `integer`
    /// rule; numeric scalars then compare by value. Files compare in
    /// kilobytes, lists by element count, everything else by character count
    /// of the trimmed rendering.
    pub fn size(&self, numeric: bool) -> Option<f64> {
        match *self {
            Self::Missing => None,
            Self::File(file) => Some(file.kilobytes() as f64),
            Self::List(items) => Some(items.len() as f64),
            Self::Scalar(value) => {
                if numeric {
                    if let Some(number) = formats::numeric_value(value) {
                        return Some(number);
                    }
                }
                render_scalar(value).map(|text| text.trim().chars().count() as f64)
            }
        }
    }

    /// Whether [`size`](Self::size) compares this value numerically.
    pub fn is_numeric_size(&self, numeric: bool) -> bool {
        numeric && matches!(self, Self::Scalar(value) if formats::is_numeric(value))
    }
}

/// Render a JSON scalar the way form submissions arrive: strings verbatim,
/// numbers in their shortest form, booleans as `1`/`0`.
pub(crate) fn render_scalar(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(true) => Some(Cow::Borrowed("1")),
        Value::Bool(false) => Some(Cow::Borrowed("0")),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
