//! semconv: classifies instrumentation telemetry against the OpenTelemetry
//! semantic conventions and produces a diff-stable artifact.

pub mod canonical;
pub mod conventions;
pub mod errors;
pub mod instrumentation;
pub mod source;

// Re-export important types and traits
pub use canonical::canonicalize;
pub use conventions::category::{CategoryLabel, ALLOWED_CATEGORIES};
pub use conventions::document::{AttributeRef, ConventionDocument, ConventionFile, Group};
pub use conventions::mapping::{MappingBuilder, MappingTable};
pub use errors::SemconvError;
pub use instrumentation::enrich::enrich_instrumentation;
pub use instrumentation::model::{InstrumentationEntry, InstrumentationList, Record, Records};
pub use source::{build_mappings, ConventionSource, DirectorySource};

#[cfg(feature = "github")]
pub use source::github::GitHubSource;
