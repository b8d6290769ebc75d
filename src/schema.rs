//! The structured-report shape the LLM must produce.
//!
//! A report is a fixed `Title` plus an *ordered list* of `{key, text}`
//! paragraphs. A list rather than free-form extra top-level keys keeps the
//! model's section order intact and gives [`crate::pipeline::flatten`] a
//! deterministic input.
//!
//! ```json
//! {
//!   "Title": "Quarterly Maintenance Report",
//!   "paragraphs": [
//!     { "key": "Summary", "text": "All systems nominal." },
//!     { "key": "Findings", "text": "Pump 3 shows wear." }
//!   ]
//! }
//! ```

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

/// One named section of a generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Paragraph {
    /// Section heading, e.g. "Introduction".
    pub key: String,
    /// Section body text.
    pub text: String,
}

impl Paragraph {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// A report as returned by the model: title plus ordered paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StructuredReport {
    /// The title of the report.
    #[serde(rename = "Title")]
    pub title: String,
    /// Report sections in reading order.
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl StructuredReport {
    pub fn new(title: impl Into<String>, paragraphs: Vec<Paragraph>) -> Self {
        Self {
            title: title.into(),
            paragraphs,
        }
    }

    /// Parse a backend reply. Any deviation from the schema is an error;
    /// nothing is salvaged from a partially valid object.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// JSON schema of [`StructuredReport`], pretty-printed for embedding in a prompt.
pub fn report_schema_json() -> String {
    let schema = schema_for!(StructuredReport);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::from("{}"))
}
