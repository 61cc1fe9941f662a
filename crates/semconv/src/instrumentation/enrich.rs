use log::{debug, warn};
use std::collections::HashSet;

use super::model::{AttributeUse, InstrumentationEntry, InstrumentationList, Record, Records};
use crate::conventions::category::CategoryLabel;
use crate::conventions::mapping::MappingTable;

/// Annotates every entry of `list` against `mappings` and flattens the
/// library nesting into one sequence, libraries in lexical order. Items
/// that are not entries are passed through unchanged.
pub fn enrich_instrumentation(
    list: InstrumentationList,
    mappings: &MappingTable,
) -> Vec<Record<InstrumentationEntry>> {
    let mut enriched = Vec::with_capacity(list.entry_count());

    for (library, entries) in list.libraries {
        let Records::List(entries) = entries else {
            warn!("skipping library {}: entries are not a list", library);
            continue;
        };
        enriched.extend(entries.into_iter().map(|record| match record {
            Record::Typed(entry) => Record::Typed(enrich_entry(entry, mappings)),
            raw @ Record::Raw(_) => raw,
        }));
    }

    enriched
}

/// Marks matched metrics and attributes with `semconv: true` and sets the
/// entry level `semconv` to the sorted set of matched categories.
///
/// Matching is exact name equality. Span names are not looked up, only span
/// attributes.
pub fn enrich_entry(
    mut entry: InstrumentationEntry,
    mappings: &MappingTable,
) -> InstrumentationEntry {
    let mut matches: HashSet<CategoryLabel> = HashSet::new();

    for block in entry.telemetry.iter_mut().flat_map(Records::iter_mut) {
        for metric in block.metrics.iter_mut().flat_map(Records::iter_mut) {
            let label = metric.name().and_then(|name| mappings.metric_label(name));
            if let Some(label) = label {
                metric.mark_semconv();
                matches.insert(label.clone());
            }
            // attributes are checked whether or not the metric matched
            mark_attributes(&mut metric.attributes, mappings, &mut matches);
        }

        for span in block.spans.iter_mut().flat_map(Records::iter_mut) {
            mark_attributes(&mut span.attributes, mappings, &mut matches);
        }
    }

    let mut semconv: Vec<CategoryLabel> = matches.into_iter().collect();
    semconv.sort();

    debug!(
        "enriched {}: {} convention categories",
        entry.name().unwrap_or("<unnamed>"),
        semconv.len()
    );

    entry.semconv = semconv;
    entry
}

fn mark_attributes(
    attributes: &mut Option<Records<AttributeUse>>,
    mappings: &MappingTable,
    matches: &mut HashSet<CategoryLabel>,
) {
    for attribute in attributes.iter_mut().flat_map(Records::iter_mut) {
        let label = attribute.name().and_then(|name| mappings.attribute_label(name));
        if let Some(label) = label {
            attribute.mark_semconv();
            matches.insert(label.clone());
        }
    }
}
