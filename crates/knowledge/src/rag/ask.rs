//! Question answering: retrieve, assemble context, generate.

use crate::labels::{labels, Labels};
use crate::rag::context::ContextAssembler;
use crate::rag::guard::ResponseGuard;
use crate::rag::types::{AnswerBundle, GuardReport, Stage};
use crate::retriever::{Retriever, DEFAULT_N_RESULTS};
use crate::types::{IndexStats, KnowledgeBaseConfig, SystemStats};
use medrag_core::{AppResult, Locale};
use medrag_llm::{LlmClient, LlmRequest};
use medrag_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Knobs for one assistant instance.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub locale: Locale,
    /// Generation model identifier passed to the LLM client
    pub model: String,
    pub institution: String,
    pub domain: String,
    pub n_results: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            locale: Locale::Hebrew,
            model: "gpt-4".to_string(),
            institution: "המרכז הרפואי".to_string(),
            domain: "אונקולוגיה".to_string(),
            n_results: DEFAULT_N_RESULTS,
            temperature: 0.3,
            max_tokens: 1500,
        }
    }
}

impl AssistantSettings {
    /// Take retrieval and generation limits from a collection config.
    pub fn with_collection(mut self, config: &KnowledgeBaseConfig) -> Self {
        self.n_results = config.n_results;
        self.temperature = config.temperature;
        self.max_tokens = config.max_tokens;
        self
    }
}

/// The answering pipeline.
///
/// Each `ask` walks `Idle → Retrieving → Assembling → Generating → Done`
/// once, with no retries. Failures are folded into the answer text; `ask`
/// itself never fails.
pub struct RagAssistant {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    assembler: ContextAssembler,
    guard: ResponseGuard,
    labels: &'static Labels,
    settings: AssistantSettings,
}

impl RagAssistant {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: AssistantSettings,
    ) -> AppResult<Self> {
        Ok(Self {
            retriever,
            llm,
            prompt,
            assembler: ContextAssembler::new(settings.locale),
            guard: ResponseGuard::new(settings.locale)?,
            labels: labels(settings.locale),
            settings,
        })
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Answer `query` from the indexed collection.
    ///
    /// With `debug_mode`, the bundle also carries the retrieved passages, the
    /// assembled context, any retrieval error and the guard findings.
    pub async fn ask(&self, query: &str, debug_mode: bool) -> AnswerBundle {
        let mut stage = Stage::Idle;
        tracing::info!(query_len = query.chars().count(), debug_mode, "Answering question");

        stage = self.advance(stage);
        let (retrieved, retrieval_error) =
            match self.retriever.retrieve(query, self.settings.n_results).await {
                Ok(results) => (results, None),
                Err(e) => {
                    tracing::error!(error = %e, "Retrieval failed, continuing without context");
                    (Vec::new(), Some(e.to_string()))
                }
            };

        stage = self.advance(stage);
        let (context, citations) = self.assembler.assemble(&retrieved);
        tracing::debug!(
            sources = retrieved.len(),
            context_chars = context.chars().count(),
            "Context assembled"
        );

        stage = self.advance(stage);
        let (response, guard) = match self.generate(query, &context).await {
            Ok(mut response) => {
                let report = self.guard.review(query, &mut response);
                (response, report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Generation failed");
                let apology = format!(
                    "{}: {}. {}",
                    self.labels.apology, e, self.labels.contact_staff
                );
                let report = GuardReport {
                    override_phrases: self.guard.inspect_query(query),
                    recommendation_appended: false,
                };
                (apology, report)
            }
        };

        stage = self.advance(stage);
        debug_assert_eq!(stage, Stage::Done);

        let sources_used = retrieved.len();
        let mut bundle = AnswerBundle {
            query: query.to_string(),
            response,
            sources_used,
            citations,
            retrieved_documents: None,
            context: None,
            retrieval_error: None,
            guard: None,
        };

        if debug_mode {
            bundle.retrieved_documents = Some(retrieved);
            bundle.context = Some(context);
            bundle.retrieval_error = retrieval_error;
            bundle.guard = Some(guard);
        }

        bundle
    }

    /// Collection size and readiness. An unreadable index counts as empty.
    pub fn get_system_stats(&self) -> SystemStats {
        match self.retriever.stats() {
            Ok(stats) => SystemStats::from(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read index stats");
                SystemStats::from(IndexStats {
                    total_documents: 0,
                    degraded_records: 0,
                    collection_name: String::new(),
                })
            }
        }
    }

    fn advance(&self, stage: Stage) -> Stage {
        let next = stage.next();
        tracing::debug!(from = %stage, to = %next, "Stage transition");
        next
    }

    async fn generate(&self, query: &str, context: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("query".to_string(), query.to_string());
        variables.insert("context".to_string(), context.to_string());
        variables.insert("institution".to_string(), self.settings.institution.clone());
        variables.insert("domain".to_string(), self.settings.domain.clone());

        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.settings.model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            provider = self.llm.provider_name(),
            model = %self.settings.model,
            "Generating answer"
        );

        let response = self.llm.complete(&request).await?;
        if !response.done {
            tracing::warn!("Answer was cut off at the token limit");
        }

        Ok(response.content)
    }
}
