use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::errors::SemconvError;

/// A convention document as handed over by a source. `document` is `None`
/// when the file could not be fetched or parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConventionFile {
    pub name: String,
    pub document: Option<ConventionDocument>,
}

impl ConventionFile {
    pub fn new(name: impl Into<String>, document: Option<ConventionDocument>) -> Self {
        ConventionFile {
            name: name.into(),
            document,
        }
    }
}

/// One semantic-convention model file: a list of groups, each of which may
/// define a metric and/or a set of attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConventionDocument {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub groups: Option<Vec<Group>>,
}

impl ConventionDocument {
    pub fn from_yaml(contents: &str) -> Result<Self, SemconvError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn groups(&self) -> &[Group] {
        self.groups.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Metric,
    MetricGroup,
    AttributeGroup,
    Span,
    Event,
    Resource,
    Scope,
    Entity,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Group {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub group_type: Option<GroupType>,
    pub metric_name: Option<String>,
    pub prefix: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub attributes: Option<Vec<AttributeRef>>,
}

impl Group {
    /// The metric name this group defines, if it is a metric group.
    pub fn metric(&self) -> Option<&str> {
        match self.group_type {
            Some(GroupType::Metric) => self.metric_name.as_deref(),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &[AttributeRef] {
        self.attributes.as_deref().unwrap_or_default()
    }

    /// Fully-qualified attribute names defined or referenced by this group.
    pub fn attribute_names(&self) -> impl Iterator<Item = String> + '_ {
        let prefix = self.prefix.as_deref();
        self.attributes()
            .iter()
            .filter_map(move |attr| attr.resolve(prefix))
    }
}

/// An attribute entry inside a group. `id` is local to the group and joined
/// with the group prefix; `ref` is already fully qualified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AttributeRef {
    pub id: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

impl AttributeRef {
    pub fn resolve(&self, prefix: Option<&str>) -> Option<String> {
        let name = match (&self.id, &self.reference) {
            (Some(id), _) => match prefix {
                Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, id),
                _ => id.clone(),
            },
            (None, Some(reference)) => reference.clone(),
            (None, None) => return None,
        };

        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

// Items that fail to deserialize are dropped instead of failing the whole
// document; a sequence that is not a sequence still fails.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Vec<serde_yaml::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|items| {
        items
            .into_iter()
            .filter_map(|item| match serde_yaml::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!("skipping malformed convention entry: {}", e);
                    None
                }
            })
            .collect()
    }))
}
