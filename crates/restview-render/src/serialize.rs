//! Structured serialization of result objects.
//!
//! These back the built-in renderers: the result object is written straight
//! to JSON, YAML, XML or CSV without going through a template.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Root element used when a result object is written as XML.
pub const XML_ROOT: &str = "response";

/// Errors that can occur during serialization.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("XML serialization failed: {0}")]
    Xml(String),

    #[error("CSV serialization failed: {0}")]
    Csv(String),
}

/// The structured formats the process-wide renderer table ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuredFormat {
    Json,
    Yaml,
    Xml,
    Csv,
}

impl StructuredFormat {
    /// Every built-in format, in registration order.
    pub const ALL: [StructuredFormat; 4] = [
        StructuredFormat::Json,
        StructuredFormat::Yaml,
        StructuredFormat::Xml,
        StructuredFormat::Csv,
    ];

    /// The format key requests use to select this format (`format=json`).
    pub fn key(&self) -> &'static str {
        match self {
            StructuredFormat::Json => "json",
            StructuredFormat::Yaml => "yaml",
            StructuredFormat::Xml => "xml",
            StructuredFormat::Csv => "csv",
        }
    }

    /// Looks up a format by key. Keys are matched exactly.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Serializes `data` in this format.
    pub fn serialize<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, SerializeError> {
        match self {
            StructuredFormat::Json => to_json(data),
            StructuredFormat::Yaml => to_yaml(data),
            StructuredFormat::Xml => to_xml(data),
            StructuredFormat::Csv => to_csv(data),
        }
    }
}

/// Serializes data to pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Serializes data to YAML.
pub fn to_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, SerializeError> {
    Ok(serde_yaml::to_string(data)?)
}

/// Serializes data to XML under a [`XML_ROOT`] element.
pub fn to_xml<T: Serialize + ?Sized>(data: &T) -> Result<String, SerializeError> {
    quick_xml::se::to_string_with_root(XML_ROOT, data)
        .map_err(|e| SerializeError::Xml(e.to_string()))
}

/// Serializes data to CSV.
///
/// The data goes through JSON first and is then flattened: an array of objects
/// becomes one row per object, a single object becomes `key,value` rows and
/// anything else a one-column `value` table.
pub fn to_csv<T: Serialize + ?Sized>(data: &T) -> Result<String, SerializeError> {
    let value = serde_json::to_value(data)?;
    let mut wtr = csv::Writer::from_writer(vec![]);

    for record in csv_records(&value) {
        wtr.write_record(&record)
            .map_err(|e| SerializeError::Csv(e.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| SerializeError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SerializeError::Csv(e.to_string()))
}

fn csv_records(value: &Value) -> Vec<Vec<String>> {
    match value {
        Value::Array(items) => match items.first() {
            Some(Value::Object(first)) => {
                let headers: Vec<String> = first.keys().cloned().collect();
                let mut records = vec![headers.clone()];
                records.extend(items.iter().filter_map(Value::as_object).map(|obj| {
                    headers
                        .iter()
                        .map(|h| obj.get(h).map(cell).unwrap_or_default())
                        .collect()
                }));
                records
            }
            Some(_) => {
                let mut records = vec![vec!["value".to_string()]];
                records.extend(items.iter().map(|item| vec![cell(item)]));
                records
            }
            None => Vec::new(),
        },
        Value::Object(obj) => {
            let mut records = vec![vec!["key".to_string(), "value".to_string()]];
            records.extend(obj.iter().map(|(k, v)| vec![k.clone(), cell(v)]));
            records
        }
        scalar => vec![vec!["value".to_string()], vec![cell(scalar)]],
    }
}

fn cell(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
