//! End-to-end answering over a real index with offline providers.

use crate::chunker::{Chunker, ChunkerSettings};
use crate::embeddings::{EmbeddingClient, EmbeddingConfig};
use crate::index::{build_index, VectorIndex};
use crate::rag::{AssistantSettings, RagAssistant};
use crate::retriever::IndexRetriever;
use crate::tokenizer::WordTokenCounter;
use crate::types::{Document, IngestMode, SystemStatus};
use medrag_core::{AppResult, Locale};
use medrag_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use medrag_prompt::builtin_prompt;
use std::sync::Arc;
use tempfile::TempDir;

/// Cites document 1 when the prompt carries context, otherwise admits it
/// has nothing to go on.
struct CitingLlm;

#[async_trait::async_trait]
impl LlmClient for CitingLlm {
    fn provider_name(&self) -> &str {
        "citing"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = if request.prompt.contains("מסמך 1 (רלוונטיות") {
            "כימותרפיה היא טיפול תרופתי שמטרתו להרוס תאים סרטניים [מסמך 1]. \
             מומלץ להתייעץ עם הרופא המטפל."
        } else {
            "לא נמצא מידע מספיק במאגר."
        };

        Ok(LlmResponse {
            content: content.to_string(),
            model: request.model.clone(),
            usage: LlmUsage::new(100, 30),
            done: true,
        })
    }
}

fn chemo_document() -> Document {
    Document {
        title: "כימותרפיה".to_string(),
        url: "https://hospital.example/oncology/chemotherapy".to_string(),
        text: "כימותרפיה היא טיפול תרופתי שמטרתו להרוס תאים סרטניים. \
               הטיפול ניתן בדרך כלל במחזורים, עם הפסקות למנוחה והתאוששות. \
               תופעות הלוואי הנפוצות כוללות עייפות, בחילות ונשירת שיער."
            .to_string(),
    }
}

async fn assistant_over(dir: &TempDir, documents: &[Document]) -> RagAssistant {
    let embedder =
        Arc::new(EmbeddingClient::from_config(EmbeddingConfig::mock(256), None).unwrap());
    let index = Arc::new(
        VectorIndex::open(&dir.path().join("index.sqlite"), "oncology", embedder).unwrap(),
    );

    let chunker = Chunker::new(
        ChunkerSettings::default(),
        Locale::Hebrew,
        Arc::new(WordTokenCounter),
    )
    .unwrap();
    let chunks: Vec<_> = documents
        .iter()
        .flat_map(|d| chunker.chunk_document(d))
        .collect();
    build_index(&index, &chunks, IngestMode::Replace)
        .await
        .unwrap();

    RagAssistant::new(
        Arc::new(IndexRetriever::new(index)),
        Arc::new(CitingLlm),
        builtin_prompt("rag.answer.he").unwrap(),
        AssistantSettings::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn chemotherapy_question_cites_its_source() {
    let dir = TempDir::new().unwrap();
    let assistant = assistant_over(&dir, &[chemo_document()]).await;

    let bundle = assistant.ask("מה זה כימותרפיה?", true).await;

    assert_eq!(bundle.query, "מה זה כימותרפיה?");
    assert_eq!(bundle.sources_used, 1);
    assert_eq!(bundle.citations.len(), 1);
    assert_eq!(bundle.citations[0].number, 1);
    assert_eq!(bundle.citations[0].title, "כימותרפיה");
    assert!(bundle.response.contains("[מסמך 1]"));

    let context = bundle.context.unwrap();
    assert!(context.starts_with("מידע רלוונטי ממאגר המסמכים:"));
    assert!(context.contains("כותרת: כימותרפיה"));
    assert_eq!(bundle.retrieved_documents.unwrap().len(), 1);
    assert!(bundle.retrieval_error.is_none());

    let guard = bundle.guard.unwrap();
    assert!(!guard.override_attempt());
    assert!(!guard.recommendation_appended);
}

#[tokio::test]
async fn empty_index_answers_from_sentinel() {
    let dir = TempDir::new().unwrap();
    let assistant = assistant_over(&dir, &[]).await;

    let stats = assistant.get_system_stats();
    assert_eq!(stats.total_documents, 0);
    assert_eq!(stats.system_status, SystemStatus::NeedsData);

    let bundle = assistant.ask("מה זה כימותרפיה?", true).await;
    assert_eq!(bundle.sources_used, 0);
    assert!(bundle.citations.is_empty());
    assert_eq!(
        bundle.context.as_deref(),
        Some("לא נמצא מידע רלוונטי במאגר המסמכים.")
    );
    assert!(!bundle.response.contains("[מסמך"));
    assert!(bundle.guard.unwrap().recommendation_appended);
}

#[tokio::test]
async fn ready_after_ingestion() {
    let dir = TempDir::new().unwrap();
    let assistant = assistant_over(&dir, &[chemo_document()]).await;

    let stats = assistant.get_system_stats();
    assert_eq!(stats.total_documents, 1);
    assert_eq!(stats.collection_name, "oncology");
    assert_eq!(stats.system_status, SystemStatus::Ready);
}
