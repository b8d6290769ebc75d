//! Prompts for schema-constrained report generation.
//!
//! All prompt text lives here so it can be inspected by unit tests without a
//! live model. Callers can replace the system instruction via
//! [`crate::config::PipelineConfig::system_prompt`]; the schema block is
//! always appended, so an override cannot drop the output contract.

use crate::schema::report_schema_json;

/// Default system instruction for the report writer.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert technical writer. \
Your task is to create a short, well-structured, and officially looking report \
in a professional, formal register.";

/// Output contract appended to every system prompt. `{schema}` is replaced
/// with the JSON schema of [`crate::schema::StructuredReport`].
const SCHEMA_CONTRACT: &str = r#"

OUTPUT FORMAT
- Respond with a single JSON object and nothing else.
- The object MUST validate against this JSON schema:

{schema}

- "Title" is the report title.
- "paragraphs" is the ordered list of report sections; each entry has a
  short heading in "key" and the section body in "text".
- Do NOT add any other top-level fields.
- Do NOT wrap the JSON in markdown fences or add commentary."#;

/// User instruction template. `{input_text}` is replaced with the caller's text.
pub const USER_PROMPT_TEMPLATE: &str = "Generate a structured report in JSON format with a fixed \
'Title' field and an ordered list of paragraphs. Your output must follow the JSON schema \
provided. Based on the following input: {input_text}";

/// Build the full system message: instruction followed by the schema contract.
pub fn system_message(instruction: &str) -> String {
    let contract = SCHEMA_CONTRACT.replace("{schema}", &report_schema_json());
    format!("{instruction}{contract}")
}

/// Build the user message embedding the input text.
pub fn user_message(input_text: &str) -> String {
    USER_PROMPT_TEMPLATE.replace("{input_text}", input_text)
}
