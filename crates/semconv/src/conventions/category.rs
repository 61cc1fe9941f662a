use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Model directories of the semantic-conventions repository that are scanned,
/// in processing order. Order matters: attribute labels are first-write-wins.
pub const ALLOWED_CATEGORIES: &[&str] = &[
    "aws",
    "cassandra",
    "client",
    "cloud",
    "code",
    "container",
    "cpu",
    "database",
    "disk",
    "dns",
    "elasticsearch",
    "enduser",
    "error",
    "event",
    "file",
    "gen-ai",
    "graphql",
    "heroku",
    "host",
    "http",
    "jvm",
    "k8s",
    "linux",
    "log",
    "messaging",
    "network",
    "openai",
    "os",
    "peer",
    "process",
    "rpc",
    "server",
    "system",
    "telemetry",
    "thread",
    "tls",
    "url",
];

pub fn is_allowed_category(category: &str) -> bool {
    ALLOWED_CATEGORIES.contains(&category)
}

/// Human readable convention category, e.g. "HTTP Server".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryLabel(String);

impl CategoryLabel {
    pub fn new(label: impl Into<String>) -> Self {
        CategoryLabel(label.into())
    }

    /// Derives the label for a document from its category directory and file
    /// name. Never looks at document content.
    pub fn derive(category: &str, document_name: &str) -> Self {
        LABEL_RULES
            .iter()
            .find(|rule| rule.category == category && (rule.matches)(document_name))
            .map(|rule| CategoryLabel::new(rule.label))
            .unwrap_or_else(|| CategoryLabel(title_case(category)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CategoryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CategoryLabel {
    fn from(value: &str) -> Self {
        CategoryLabel::new(value)
    }
}

struct LabelRule {
    category: &'static str,
    matches: fn(&str) -> bool,
    label: &'static str,
}

// Evaluated in order before the generic title-case fallback.
const LABEL_RULES: &[LabelRule] = &[
    LabelRule {
        category: "database",
        matches: |_| true,
        label: "Database Client",
    },
    LabelRule {
        category: "http",
        matches: |name| name.contains("client"),
        label: "HTTP Client",
    },
    LabelRule {
        category: "http",
        matches: |name| name.contains("server"),
        label: "HTTP Server",
    },
    LabelRule {
        category: "http",
        matches: |_| true,
        label: "HTTP",
    },
];

/// `_` and `-` become spaces; a letter is upper-cased when it starts a word
/// (follows a non-letter), otherwise lower-cased.
fn title_case(category: &str) -> String {
    let mut titled = String::with_capacity(category.len());
    let mut previous_is_letter = false;

    for c in category.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if previous_is_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            titled.push(c);
            previous_is_letter = false;
        }
    }

    titled
}
