//! Lookup results and their output encodings.

use std::fmt::{self, Write as _};

use serde::Serialize;
use serde_json::Value;

use super::config::OutputFormat;
use super::error::ErrorKind;
use crate::domain::ZipRecord;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const XML_ROOT: &str = "parser";

/// Outcome of a single lookup.
///
/// Built fresh for every call. When the code is unknown or the lookup
/// failed, every field except `zip_code` holds its default value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    #[serde(rename = "zipcode")]
    pub zip_code: u32,
    pub city: String,
    pub extra_digit: u8,
    pub commune: String,
    pub commune_id: u32,
    pub canton: String,
    pub east: f64,
    pub north: f64,
    pub valid_zip_code: bool,

    /// Failure message when errors are folded into the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure class matching `error`.
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl LookupResult {
    /// A positive result carrying every field of `record`.
    pub fn found(record: &ZipRecord) -> Self {
        Self {
            zip_code: u32::from(record.zip_code),
            city: record.city.clone(),
            extra_digit: record.extra_digit,
            commune: record.commune.clone(),
            commune_id: record.commune_id,
            canton: record.canton.clone(),
            east: record.east,
            north: record.north,
            valid_zip_code: true,
            error: None,
            error_kind: None,
        }
    }

    /// A negative result for a code absent from the dataset.
    ///
    /// The message is only attached when `with_message` is set.
    pub fn not_found(zip_code: u32, with_message: bool) -> Self {
        let mut result = Self::empty(zip_code);
        result.error_kind = Some(ErrorKind::NotFound);
        if with_message {
            result.error = Some(format!("Zip code {zip_code} was not found."));
        }
        result
    }

    /// A negative result for a lookup that could not be carried out.
    pub fn failed(zip_code: u32, kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut result = Self::empty(zip_code);
        result.error = Some(message.into());
        result.error_kind = Some(kind);
        result
    }

    fn empty(zip_code: u32) -> Self {
        Self {
            zip_code,
            city: String::new(),
            extra_digit: 0,
            commune: String::new(),
            commune_id: 0,
            canton: String::new(),
            east: 0.0,
            north: 0.0,
            valid_zip_code: false,
            error: None,
            error_kind: None,
        }
    }

    /// Field name/value pairs in output order.
    pub fn to_pairs(&self) -> Vec<(&'static str, Value)> {
        let mut pairs = vec![
            ("zipcode", Value::from(self.zip_code)),
            ("city", Value::from(self.city.as_str())),
            ("extraDigit", Value::from(self.extra_digit)),
            ("commune", Value::from(self.commune.as_str())),
            ("communeId", Value::from(self.commune_id)),
            ("canton", Value::from(self.canton.as_str())),
            ("east", Value::from(self.east)),
            ("north", Value::from(self.north)),
            ("validZipCode", Value::from(self.valid_zip_code)),
        ];
        if let Some(error) = &self.error {
            pairs.push(("error", Value::from(error.as_str())));
        }
        pairs
    }

    /// JSON object with keys in output order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// PHP `serialize()` notation of the field array.
    pub fn to_php_serialized(&self) -> String {
        let pairs = self.to_pairs();
        let mut out = format!("a:{}:{{", pairs.len());
        for (key, value) in &pairs {
            push_php_value(&mut out, &Value::from(*key));
            push_php_value(&mut out, value);
        }
        out.push('}');
        out
    }

    /// XML document with one child element per field.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push('\n');
        let _ = write!(out, "<{XML_ROOT}>");
        for (key, value) in self.to_pairs() {
            let text = match value {
                Value::String(s) => escape_xml(&s),
                other => other.to_string(),
            };
            let _ = write!(out, "<{key}>{text}</{key}>");
        }
        let _ = writeln!(out, "</{XML_ROOT}>");
        out
    }

    /// Encode in the requested shape.
    pub fn encode(self, format: OutputFormat) -> Result<Output, serde_json::Error> {
        Ok(match format {
            OutputFormat::Raw => Output::Raw(self),
            OutputFormat::Array => Output::Array(self.to_pairs()),
            OutputFormat::Json => Output::Json(self.to_json()?),
            OutputFormat::Serialize => Output::Serialize(self.to_php_serialized()),
            OutputFormat::Xml => Output::Xml(self.to_xml()),
        })
    }
}

/// A lookup result in the caller's selected output format.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Raw(LookupResult),
    Array(Vec<(&'static str, Value)>),
    Json(String),
    Serialize(String),
    Xml(String),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Raw(result) => write_pairs(f, &result.to_pairs()),
            Output::Array(pairs) => write_pairs(f, pairs),
            Output::Json(s) | Output::Serialize(s) | Output::Xml(s) => f.write_str(s.trim_end()),
        }
    }
}

fn write_pairs(f: &mut fmt::Formatter<'_>, pairs: &[(&'static str, Value)]) -> fmt::Result {
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        match value {
            Value::String(s) => write!(f, "{key}: {s}")?,
            other => write!(f, "{key}: {other}")?,
        }
    }
    Ok(())
}

fn push_php_value(out: &mut String, value: &Value) {
    // Writing to a String cannot fail.
    let _ = match value {
        Value::Null => write!(out, "N;"),
        Value::Bool(b) => write!(out, "b:{};", u8::from(*b)),
        Value::Number(n) if n.is_f64() => {
            write!(out, "d:{};", n.as_f64().unwrap_or_default())
        }
        Value::Number(n) => write!(out, "i:{n};"),
        Value::String(s) => write!(out, "s:{}:\"{}\";", s.len(), s),
        // Only scalars appear in result pairs.
        Value::Array(_) | Value::Object(_) => write!(out, "N;"),
    };
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
