//! Ingestion and query pipelines.
//!
//! `Pipeline` owns the provider handles and drives both flows end to end:
//! upload validation, per-page chunking, embedding, and upsert on the
//! ingest side; embedding, top-k search, context composition, and chat
//! completion on the query side. All remote calls are sequential awaits.

use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{AskPdfError, Result};
use crate::providers::{
    ChatMessage, ChatModel, Embedder, RecordMetadata, VectorIndex, VectorMatch, VectorRecord,
};
use crate::{chunker, debug_event, log_event, pdf};

/// An uploaded file waiting to be ingested.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatModel>,
    chunk_size: usize,
    max_files: usize,
    top_k: usize,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        settings: &Settings,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            chunk_size: settings.ingest.chunk_size,
            max_files: settings.ingest.max_files,
            top_k: settings.query.top_k,
        }
    }

    /// Ingest a batch of uploaded PDFs.
    ///
    /// The whole batch is validated before any file is processed: the
    /// file-count cap and every filename's `.pdf` suffix (case
    /// sensitive). Files are then processed sequentially in request
    /// order; a failure aborts the batch but already-upserted records
    /// stay in the index.
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<()> {
        if files.len() > self.max_files {
            return Err(AskPdfError::InvalidRequest(format!(
                "Maximum of {} PDF files can be uploaded.",
                self.max_files
            )));
        }
        for file in files {
            if !file.filename.ends_with(".pdf") {
                return Err(AskPdfError::InvalidRequest(format!(
                    "File {} is not a PDF.",
                    file.filename
                )));
            }
        }

        for file in files {
            self.ingest_file(file).await?;
        }
        Ok(())
    }

    /// Extract, chunk, embed and upsert one file.
    ///
    /// Chunking is per page; a page that cleans to empty text yields no
    /// chunks. One embed call and one single-record upsert per chunk.
    async fn ingest_file(&self, file: &UploadedFile) -> Result<()> {
        let pages = pdf::extract_pages(&file.filename, &file.bytes)?;
        let mut chunk_count = 0usize;

        for page_text in &pages {
            let cleaned = chunker::clean(page_text);
            for chunk in chunker::split(&cleaned, self.chunk_size) {
                let embedding = self.embedder.embed(&chunk).await?;
                let chunk_id = Uuid::new_v4().to_string();
                let record = VectorRecord {
                    id: format!("{}_chunk_{chunk_id}", file.filename),
                    values: embedding,
                    metadata: RecordMetadata {
                        file_id: file.filename.clone(),
                        chunk_id,
                        text: chunk,
                    },
                };
                self.index.upsert(std::slice::from_ref(&record)).await?;
                chunk_count += 1;
            }
        }

        log_event!(
            "ingest",
            "file processed",
            "{} ({} pages, {chunk_count} chunks)",
            file.filename,
            pages.len()
        );
        Ok(())
    }

    /// Answer a query over the indexed documents.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let start = Instant::now();
        let embedding = self.embedder.embed(query).await?;
        let matches = self.index.query(&embedding, self.top_k).await?;
        debug_event!("query", "matches", "{}", matches.len());

        let messages = compose_messages(query, &matches);
        let reply = self.chat.complete(&messages).await?;
        log_event!(
            "query",
            "answered",
            "{} matches, {}ms",
            matches.len(),
            start.elapsed().as_millis()
        );
        Ok(reply)
    }
}

/// Build the chat conversation for a query over its matches.
///
/// The context is the match texts joined with a single space, in index
/// order, and rides in an assistant-role message after the user query.
fn compose_messages(query: &str, matches: &[VectorMatch]) -> Vec<ChatMessage> {
    let context = matches
        .iter()
        .filter_map(|m| m.metadata.as_ref().map(|meta| meta.text.as_str()))
        .collect::<Vec<_>>()
        .join(" ");

    vec![
        ChatMessage::new("system", "Keep answer in English language"),
        ChatMessage::new("user", query),
        ChatMessage::new("assistant", format!("follow only this context: {context}")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fakes::{FakeChat, FakeEmbedder, FakeIndex};

    fn test_pipeline() -> (Arc<FakeEmbedder>, Arc<FakeIndex>, Arc<FakeChat>, Pipeline) {
        let embedder = Arc::new(FakeEmbedder::new(16));
        let index = Arc::new(FakeIndex::new());
        let chat = Arc::new(FakeChat::new("a canned answer"));
        let pipeline = Pipeline::new(
            embedder.clone(),
            index.clone(),
            chat.clone(),
            &Settings::default(),
        );
        (embedder, index, chat, pipeline)
    }

    fn pdf_file(name: &str, text: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            bytes: pdf::one_page_pdf(text),
        }
    }

    #[tokio::test]
    async fn test_rejects_batch_over_max_files() {
        let (embedder, index, _, pipeline) = test_pipeline();
        let files: Vec<UploadedFile> = (0..101)
            .map(|i| UploadedFile {
                filename: format!("doc{i}.pdf"),
                bytes: Vec::new(),
            })
            .collect();

        let err = pipeline.ingest(&files).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Maximum of 100 PDF files can be uploaded."
        );
        assert!(err.is_client_error());
        // Nothing was processed
        assert_eq!(embedder.call_count(), 0);
        assert_eq!(index.upsert_call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_pdf_before_any_processing() {
        let (embedder, index, _, pipeline) = test_pipeline();
        let files = vec![
            pdf_file("good.pdf", "valid content"),
            UploadedFile {
                filename: "notes.txt".to_string(),
                bytes: b"plain text".to_vec(),
            },
        ];

        let err = pipeline.ingest(&files).await.unwrap_err();
        assert_eq!(err.to_string(), "File notes.txt is not a PDF.");
        // The valid first file was not processed either
        assert_eq!(embedder.call_count(), 0);
        assert_eq!(index.upsert_call_count(), 0);
    }

    #[tokio::test]
    async fn test_uppercase_suffix_is_rejected() {
        let (_, _, _, pipeline) = test_pipeline();
        let files = vec![UploadedFile {
            filename: "REPORT.PDF".to_string(),
            bytes: Vec::new(),
        }];
        let err = pipeline.ingest(&files).await.unwrap_err();
        assert_eq!(err.to_string(), "File REPORT.PDF is not a PDF.");
    }

    #[tokio::test]
    async fn test_one_chunk_pdf_embeds_and_upserts_once() {
        let (embedder, index, _, pipeline) = test_pipeline();
        let files = vec![pdf_file("doc.pdf", "a short page of text")];

        pipeline.ingest(&files).await.unwrap();

        assert_eq!(embedder.call_count(), 1);
        assert_eq!(index.upsert_call_count(), 1);

        let records = index.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.metadata.file_id, "doc.pdf");
        // Stored text is exactly the cleaned page text that was embedded
        let pages = pdf::extract_pages("doc.pdf", &files[0].bytes).unwrap();
        assert_eq!(record.metadata.text, chunker::clean(&pages[0]));
        assert!(record.metadata.text.contains("a short page of text"));
        assert_eq!(
            record.id,
            format!("doc.pdf_chunk_{}", record.metadata.chunk_id)
        );
    }

    #[tokio::test]
    async fn test_duplicate_uploads_get_distinct_ids() {
        let (_, index, _, pipeline) = test_pipeline();
        let files = vec![pdf_file("doc.pdf", "the same content")];

        pipeline.ingest(&files).await.unwrap();
        pipeline.ingest(&files).await.unwrap();

        let ids = index.record_ids();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        for id in &ids {
            assert!(id.starts_with("doc.pdf_chunk_"));
        }
    }

    #[tokio::test]
    async fn test_bad_pdf_bytes_abort_with_file_name() {
        let (_, index, _, pipeline) = test_pipeline();
        let files = vec![UploadedFile {
            filename: "broken.pdf".to_string(),
            bytes: b"garbage".to_vec(),
        }];

        let err = pipeline.ingest(&files).await.unwrap_err();
        match err {
            AskPdfError::Pdf { file, .. } => assert_eq!(file, "broken.pdf"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(index.upsert_call_count(), 0);
    }

    #[tokio::test]
    async fn test_query_composes_three_messages_in_order() {
        let (_, _, chat, pipeline) = test_pipeline();
        let files = vec![pdf_file("doc.pdf", "searchable content about rust")];
        pipeline.ingest(&files).await.unwrap();

        let reply = pipeline.answer("what is this about?").await.unwrap();
        assert_eq!(reply, "a canned answer");

        let messages = chat.last_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "Keep answer in English language");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "what is this about?");
        assert_eq!(messages[2].role, "assistant");
        assert!(
            messages[2]
                .content
                .starts_with("follow only this context: ")
        );
        assert!(messages[2].content.contains("searchable content"));
    }

    #[tokio::test]
    async fn test_query_over_empty_index_still_answers() {
        let (_, _, chat, pipeline) = test_pipeline();

        let reply = pipeline.answer("anything indexed?").await.unwrap();
        assert_eq!(reply, "a canned answer");

        let messages = chat.last_messages();
        assert_eq!(messages[2].content, "follow only this context: ");
    }

    #[tokio::test]
    async fn test_multi_page_pdf_chunks_per_page() {
        let (embedder, index, _, pipeline) = test_pipeline();
        let files = vec![UploadedFile {
            filename: "two.pdf".to_string(),
            bytes: pdf::pdf_with_pages(&["first page body", "second page body"]),
        }];

        pipeline.ingest(&files).await.unwrap();

        // One chunk per page, so one embed and one upsert each
        assert_eq!(embedder.call_count(), 2);
        assert_eq!(index.upsert_call_count(), 2);

        let records = index.records.lock().unwrap();
        assert!(records[0].metadata.text.contains("first page body"));
        assert!(records[1].metadata.text.contains("second page body"));
    }

    #[test]
    fn test_context_joins_match_texts_with_spaces() {
        let matches = vec![
            VectorMatch {
                id: "a".to_string(),
                score: 0.9,
                metadata: Some(RecordMetadata {
                    file_id: "f.pdf".to_string(),
                    chunk_id: "a".to_string(),
                    text: "first part".to_string(),
                }),
            },
            VectorMatch {
                id: "b".to_string(),
                score: 0.8,
                metadata: Some(RecordMetadata {
                    file_id: "f.pdf".to_string(),
                    chunk_id: "b".to_string(),
                    text: "second part".to_string(),
                }),
            },
        ];

        let messages = compose_messages("the question", &matches);
        assert_eq!(
            messages[2].content,
            "follow only this context: first part second part"
        );
    }
}
