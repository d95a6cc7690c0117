//! Natural-language to SQL translation.
//!
//! Runs the degrade chain: model response parsed strictly then leniently,
//! one retry with a stricter prompt on unusable output, and the rule-based
//! generator as the backstop. Translation itself never fails.

use crate::config::Config;
use crate::db::{ExecutionTarget, SchemaDescriptor};
use crate::llm::{
    parse_response, FallbackGenerator, ParsedResponse, PromptBuilder, TextGenerator,
    TranslationRequest, TranslationResult, TranslationSource,
};

/// Translates questions into SQL for one schema.
pub struct Translator {
    generator: Option<Box<dyn TextGenerator>>,
    prompts: PromptBuilder,
    fallback: FallbackGenerator,
}

impl Translator {
    /// Creates a translator.
    ///
    /// With no generator every question goes straight to the rule-based fallback.
    pub fn new(
        generator: Option<Box<dyn TextGenerator>>,
        schema: SchemaDescriptor,
        fallback: FallbackGenerator,
    ) -> Self {
        Self {
            generator,
            prompts: PromptBuilder::new(schema),
            fallback,
        }
    }

    /// Creates a translator from the resolved configuration and an optional generator.
    pub fn from_config(config: &Config, generator: Option<Box<dyn TextGenerator>>) -> Self {
        let fallback = FallbackGenerator::new(config.schema.clone(), config.fallback.clone());
        Self::new(generator, config.schema.clone(), fallback)
    }

    /// Returns true if a hosted model is configured.
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Translates a question, writing SQL in the dialect of `target`.
    pub async fn translate(
        &self,
        request: &TranslationRequest,
        target: ExecutionTarget,
    ) -> TranslationResult {
        let question = request.question();

        let result = match &self.generator {
            Some(generator) => self.translate_with_model(generator.as_ref(), question, target).await,
            None => None,
        };

        let result = result.unwrap_or_else(|| {
            let result = self.fallback.generate(question);
            tracing::info!(source = %result.source, "Using rule-based translation");
            result
        });

        tracing::info!(source = %result.source, sql = %result.sql, "Generated SQL");
        result
    }

    /// Runs the model path. `None` means the fallback must take over.
    async fn translate_with_model(
        &self,
        generator: &dyn TextGenerator,
        question: &str,
        target: ExecutionTarget,
    ) -> Option<TranslationResult> {
        let dialect = target.dialect();

        let response = match generator.generate(&self.prompts.build(question, dialect)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Model gateway failed");
                return None;
            }
        };

        match parse_response(&response) {
            ParsedResponse::Sql { sql, explain } => {
                return Some(TranslationResult::new(sql, explain, TranslationSource::Model));
            }
            ParsedResponse::Malformed(reason) => {
                tracing::warn!(reason = %reason, "Malformed model response, retrying once");
            }
        }

        let retry = match generator
            .generate(&self.prompts.build_retry(question, dialect))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Model gateway failed on retry");
                return None;
            }
        };

        match parse_response(&retry) {
            ParsedResponse::Sql { sql, explain } => Some(TranslationResult::new(
                sql,
                explain,
                TranslationSource::ModelRetry,
            )),
            ParsedResponse::Malformed(reason) => {
                tracing::warn!(reason = %reason, "Malformed model response on retry");
                None
            }
        }
    }
}
