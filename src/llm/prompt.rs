//! Prompt construction for model requests.
//!
//! Renders the question and schema into a strict instruction template that
//! demands a bare JSON object back.

use crate::db::SchemaDescriptor;

/// Instruction template for SQL generation.
const PROMPT_TEMPLATE: &str = r#"You are an expert SQL generator for {dialect}. Use this schema:

Table: {table}
Columns:
{columns}

INSTRUCTIONS:
1) Output ONLY valid JSON with this exact shape:
   {
     "sql": "<SQL statement>",
     "explain": "<short explanation in one sentence (optional)>"
   }
2) SQL must be valid {dialect} syntax.
3) Use the table and column names exactly as provided.
4) Do NOT output any extra text outside the JSON.
5) If question is ambiguous, pick the most useful aggregation or sample (explain why in the explain field).
6) Avoid destructive statements (DROP/ALTER/TRUNCATE/DELETE), prefer SELECT.
7) For summary-like questions, return an aggregated summary query (counts/averages).
8) For "count duplicates" interpret as rows with identical values across all non-primary columns unless user specifies columns.

User question:
"{question}"
"#;

/// Directive appended for the single retry attempt.
const RETRY_DIRECTIVE: &str = "\nRETRY: Respond ONLY with a valid JSON object and nothing else.";

/// Builds prompts for one schema and dialect.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    schema: SchemaDescriptor,
}

impl PromptBuilder {
    /// Creates a builder for the given schema.
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self { schema }
    }

    /// Renders the primary prompt.
    pub fn build(&self, question: &str, dialect: &str) -> String {
        PROMPT_TEMPLATE
            .replace("{dialect}", dialect)
            .replace("{table}", &self.schema.table_name)
            .replace("{columns}", &self.schema.format_for_llm())
            .replace("{question}", question)
    }

    /// Renders the stricter prompt used for the one retry.
    pub fn build_retry(&self, question: &str, dialect: &str) -> String {
        let mut prompt = self.build(question, dialect);
        prompt.push_str(RETRY_DIRECTIVE);
        prompt
    }
}
