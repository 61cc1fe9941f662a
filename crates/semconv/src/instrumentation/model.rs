use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::conventions::category::CategoryLabel;
use crate::errors::SemconvError;

const NAME_FIELD: &str = "name";
const SEMCONV_FIELD: &str = "semconv";

/// A parsed `instrumentation-list` dataset for one agent version.
///
/// Every record keeps the fields this crate does not interpret in `extra`,
/// so serializing an entry reproduces its input plus the `semconv`
/// annotations. Records of an unexpected shape are carried as raw values
/// instead of failing the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationList {
    /// Library name to one entry per instrumentation version.
    #[serde(default)]
    pub libraries: BTreeMap<String, Records<InstrumentationEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstrumentationList {
    pub fn from_yaml(contents: &str) -> Result<Self, SemconvError> {
        // an empty file parses as null
        let list: Option<InstrumentationList> = serde_yaml::from_str(contents)?;
        Ok(list.unwrap_or_default())
    }

    pub fn entry_count(&self) -> usize {
        self.libraries.values().map(Records::len).sum()
    }
}

/// A list valued field. A value that is not a list is kept as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Records<T> {
    List(Vec<Record<T>>),
    Other(Value),
}

/// One list item: either a record of the expected shape or whatever the
/// input held there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record<T> {
    Typed(T),
    Raw(Value),
}

impl<T> Records<T> {
    /// Number of items, typed or raw. Zero when the field is not a list.
    pub fn len(&self) -> usize {
        match self {
            Records::List(items) => items.len(),
            Records::Other(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The items that parsed as `T`.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let items: &[Record<T>] = match self {
            Records::List(items) => items,
            Records::Other(_) => &[],
        };
        items.iter().filter_map(Record::typed)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        let items: &mut [Record<T>] = match self {
            Records::List(items) => items,
            Records::Other(_) => Default::default(),
        };
        items.iter_mut().filter_map(Record::typed_mut)
    }
}

impl<T> From<Vec<T>> for Records<T> {
    fn from(items: Vec<T>) -> Self {
        Records::List(items.into_iter().map(Record::Typed).collect())
    }
}

impl<T> Record<T> {
    pub fn typed(&self) -> Option<&T> {
        match self {
            Record::Typed(record) => Some(record),
            Record::Raw(_) => None,
        }
    }

    pub fn typed_mut(&mut self) -> Option<&mut T> {
        match self {
            Record::Typed(record) => Some(record),
            Record::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationEntry {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Records<TelemetryBlock>>,
    /// Sorted, distinct convention categories matched by this entry. Whatever
    /// the input held here is replaced.
    #[serde(default, deserialize_with = "replaced")]
    pub semconv: Vec<CategoryLabel>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstrumentationEntry {
    pub fn name(&self) -> Option<&str> {
        string_field(&self.extra, NAME_FIELD)
    }
}

/// Metrics and spans emitted under one condition, e.g. `when: default`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBlock {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Records<MetricDef>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub spans: Option<Records<SpanDef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `name` and any input `semconv` value stay in `extra` untouched until the
/// metric is matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDef {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Records<AttributeUse>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MetricDef {
    /// Only a string `name` can match a convention.
    pub fn name(&self) -> Option<&str> {
        string_field(&self.extra, NAME_FIELD)
    }

    pub fn is_semconv(&self) -> bool {
        is_marked(&self.extra)
    }

    pub fn mark_semconv(&mut self) {
        mark(&mut self.extra)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanDef {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Records<AttributeUse>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeUse {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttributeUse {
    pub fn name(&self) -> Option<&str> {
        string_field(&self.extra, NAME_FIELD)
    }

    pub fn is_semconv(&self) -> bool {
        is_marked(&self.extra)
    }

    pub fn mark_semconv(&mut self) {
        mark(&mut self.extra)
    }
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn is_marked(fields: &Map<String, Value>) -> bool {
    fields.get(SEMCONV_FIELD) == Some(&Value::Bool(true))
}

fn mark(fields: &mut Map<String, Value>) {
    fields.insert(SEMCONV_FIELD.to_string(), Value::Bool(true));
}

// An explicit `null` becomes `Some`, so it is written back out.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn replaced<'de, D>(deserializer: D) -> Result<Vec<CategoryLabel>, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer)?;
    Ok(Vec::new())
}
