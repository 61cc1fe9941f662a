use log::{debug, info, warn};
use std::collections::HashMap;

use super::category::{is_allowed_category, CategoryLabel};
use super::document::{ConventionDocument, ConventionFile};

/// Lookup tables from convention identifiers to the category that defines
/// them. Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    metrics: HashMap<String, CategoryLabel>,
    attributes: HashMap<String, CategoryLabel>,
}

impl MappingTable {
    pub fn metric_label(&self, name: &str) -> Option<&CategoryLabel> {
        self.metrics.get(name)
    }

    pub fn attribute_label(&self, name: &str) -> Option<&CategoryLabel> {
        self.attributes.get(name)
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.attributes.is_empty()
    }
}

/// Accumulates convention documents category by category.
///
/// Metric names are last-write-wins: a later category overwrites the label
/// of an earlier one. Attribute names are first-write-wins. Callers depend
/// on this asymmetry, keep it.
#[derive(Debug, Default)]
pub struct MappingBuilder {
    table: MappingTable,
    documents_used: usize,
    documents_skipped: usize,
}

impl MappingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category<I>(&mut self, category: &str, files: I)
    where
        I: IntoIterator<Item = ConventionFile>,
    {
        if !is_allowed_category(category) {
            warn!("ignoring convention category '{}': not in allow-list", category);
            return;
        }

        for file in files {
            match file.document {
                Some(ref document) => self.add_document(category, &file.name, document),
                None => {
                    debug!("skipping {}/{}: not fetched or not parsable", category, file.name);
                    self.documents_skipped += 1;
                }
            }
        }
    }

    fn add_document(
        &mut self,
        category: &str,
        document_name: &str,
        document: &ConventionDocument,
    ) {
        if document.groups.is_none() {
            debug!("skipping {}/{}: no groups", category, document_name);
            self.documents_skipped += 1;
            return;
        }

        let label = CategoryLabel::derive(category, document_name);
        if label.is_empty() {
            self.documents_skipped += 1;
            return;
        }
        debug!("reading {}/{} as {}", category, document_name, label);

        for group in document.groups() {
            if let Some(metric_name) = group.metric() {
                self.table
                    .metrics
                    .insert(metric_name.to_string(), label.clone());
            }

            for attribute_name in group.attribute_names() {
                self.table
                    .attributes
                    .entry(attribute_name)
                    .or_insert_with(|| label.clone());
            }
        }

        self.documents_used += 1;
    }

    pub fn build(self) -> MappingTable {
        info!(
            "built convention mappings: metrics={}, attributes={}, documents_used={}, documents_skipped={}",
            self.table.metric_count(),
            self.table.attribute_count(),
            self.documents_used,
            self.documents_skipped
        );
        self.table
    }
}

#[cfg(test)]
impl MappingTable {
    pub(crate) fn from_entries(metrics: &[(&str, &str)], attributes: &[(&str, &str)]) -> Self {
        let collect = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(name, label)| (name.to_string(), CategoryLabel::from(*label)))
                .collect()
        };
        MappingTable {
            metrics: collect(metrics),
            attributes: collect(attributes),
        }
    }
}
