use crate::cancel::Cancellation;
use crate::config::MAX_UPLOAD_BATCH;
use crate::embeddings::Embedder;
use crate::models::{
    BatchResult, Document, DocumentFailure, IngestionOptions, IngestionReport, RawDocument,
    CONTENT_VECTOR_FIELD, TITLE_VECTOR_FIELD,
};
use crate::traits::{EmbeddingClient, SearchIndex};
use crate::IngestError;
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PROGRESS_EVERY: usize = 10;

/// Summary of an offline embedding run over a documents file.
#[derive(Debug, Clone)]
pub struct EmbedFileReport {
    pub output: PathBuf,
    pub documents: usize,
    pub degraded_embeddings: usize,
}

/// Embeds documents through a bounded pool of in-flight requests and
/// uploads them in fixed-size batches. Batches are submitted strictly in
/// input order and a failed batch never stops the run.
pub struct IngestionPipeline<I, C>
where
    I: SearchIndex,
    C: EmbeddingClient,
{
    index: I,
    embedder: Embedder<C>,
    options: IngestionOptions,
}

impl<I, C> IngestionPipeline<I, C>
where
    I: SearchIndex,
    C: EmbeddingClient,
{
    pub fn new(index: I, embedder: Embedder<C>, options: IngestionOptions) -> Self {
        Self {
            index,
            embedder,
            options,
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    fn batch_size(&self) -> usize {
        self.options.batch_size.clamp(1, MAX_UPLOAD_BATCH)
    }

    fn concurrency(&self) -> usize {
        self.options.embed_concurrency.max(1)
    }

    /// Embeds `title` and `content` of every document, then upserts them.
    pub async fn ingest(
        &self,
        documents: Vec<RawDocument>,
        cancel: &Cancellation,
    ) -> Result<IngestionReport, IngestError> {
        validate_ids(documents.iter().map(|document| document.id.as_str()))?;

        let started_at = Utc::now();
        let degraded_before = self.embedder.degraded_count();
        let total = documents.len();
        info!(documents = total, batch_size = self.batch_size(), "ingestion started");

        let embedded = stream::iter(documents.into_iter().enumerate())
            .map(|(position, document)| async move {
                let embedded = self.embed_document(document, cancel).await;
                if position > 0 && position % PROGRESS_EVERY == 0 {
                    info!(processed = position, total, "embedding progress");
                }
                embedded
            })
            .buffered(self.concurrency())
            .chunks(self.batch_size());

        let (batches, cancelled) = self.submit_batches(embedded, cancel).await;

        let report = IngestionReport {
            batches,
            degraded_embeddings: self.embedder.degraded_count() - degraded_before,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            degraded = report.degraded_embeddings,
            cancelled,
            "ingestion finished"
        );
        Ok(report)
    }

    /// Uploads documents that already carry both vectors.
    pub async fn upload(
        &self,
        documents: Vec<Document>,
        cancel: &Cancellation,
    ) -> Result<IngestionReport, IngestError> {
        validate_ids(documents.iter().map(|document| document.id.as_str()))?;
        let expected = self.embedder.dimensions();
        for document in &documents {
            check_dimensions(document, TITLE_VECTOR_FIELD, &document.title_vector, expected)?;
            check_dimensions(document, CONTENT_VECTOR_FIELD, &document.content_vector, expected)?;
        }

        let started_at = Utc::now();
        let batch_size = self.batch_size();
        let mut batches = Vec::new();
        let mut remaining = documents.into_iter().peekable();
        while remaining.peek().is_some() {
            batches.push(remaining.by_ref().take(batch_size).collect::<Vec<_>>());
        }

        let (batches, cancelled) = self.submit_batches(stream::iter(batches), cancel).await;
        Ok(IngestionReport {
            batches,
            degraded_embeddings: 0,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Reads a JSON array of documents, embeds `title` and `content`, and
    /// writes the array with `titleVector`/`contentVector` added to
    /// `<stem>_with_embeddings.json` beside the input. Fields other than the
    /// two vectors are carried through untouched.
    pub async fn embed_file(&self, path: &Path) -> Result<EmbedFileReport, IngestError> {
        let bytes = tokio::fs::read(path).await?;
        let records: Vec<Map<String, Value>> = serde_json::from_slice(&bytes)?;
        let total = records.len();
        let degraded_before = self.embedder.degraded_count();
        let cancel = Cancellation::never();
        info!(path = %path.display(), documents = total, "embedding documents file");

        let embedded = stream::iter(records.into_iter().enumerate())
            .map(|(position, mut record)| {
                let cancel = &cancel;
                async move {
                    if position > 0 && position % PROGRESS_EVERY == 0 {
                        info!(processed = position, total, "embedding progress");
                    }
                    let title = text_field(&record, "title");
                    let content = text_field(&record, "content");
                    let (title_vector, content_vector) = tokio::join!(
                        self.embedder.embed_with(&title, cancel),
                        self.embedder.embed_with(&content, cancel)
                    );
                    record.insert(
                        TITLE_VECTOR_FIELD.to_string(),
                        vector_value(title_vector.vector),
                    );
                    record.insert(
                        CONTENT_VECTOR_FIELD.to_string(),
                        vector_value(content_vector.vector),
                    );
                    Value::Object(record)
                }
            })
            .buffered(self.concurrency())
            .collect::<Vec<_>>()
            .await;

        let output = with_embeddings_path(path);
        tokio::fs::write(&output, serde_json::to_vec_pretty(&embedded)?).await?;

        let report = EmbedFileReport {
            output,
            documents: total,
            degraded_embeddings: self.embedder.degraded_count() - degraded_before,
        };
        info!(
            output = %report.output.display(),
            documents = report.documents,
            degraded = report.degraded_embeddings,
            "documents with embeddings saved"
        );
        Ok(report)
    }

    /// Uploads a file produced by [`IngestionPipeline::embed_file`].
    pub async fn upload_file(
        &self,
        path: &Path,
        cancel: &Cancellation,
    ) -> Result<IngestionReport, IngestError> {
        let documents = read_embedded_documents(path).await?;
        self.upload(documents, cancel).await
    }

    async fn embed_document(&self, document: RawDocument, cancel: &Cancellation) -> Document {
        let (title_vector, content_vector) = tokio::join!(
            self.embedder.embed_with(&document.title, cancel),
            self.embedder.embed_with(&document.content, cancel)
        );
        if title_vector.is_degraded() || content_vector.is_degraded() {
            warn!(document_id = %document.id, "document indexed with degraded embedding");
        }
        Document::from_raw(document, title_vector.vector, content_vector.vector)
    }

    async fn submit_batches<S>(&self, batches: S, cancel: &Cancellation) -> (Vec<BatchResult>, bool)
    where
        S: Stream<Item = Vec<Document>>,
    {
        let mut batches = std::pin::pin!(batches);
        let mut results = Vec::new();
        let mut batch_index = 0;

        while let Some(batch) = batches.next().await {
            let result = self.submit_batch(batch_index, &batch, cancel).await;
            results.push(result);
            if cancel.is_cancelled() {
                warn!(batch_index, "ingestion cancelled; remaining batches skipped");
                return (results, true);
            }
            batch_index += 1;
        }

        (results, false)
    }

    async fn submit_batch(
        &self,
        batch_index: usize,
        batch: &[Document],
        cancel: &Cancellation,
    ) -> BatchResult {
        let ids = batch
            .iter()
            .map(|document| document.id.clone())
            .collect::<Vec<_>>();

        if cancel.is_cancelled() {
            return BatchResult::failed_whole(batch_index, &ids, "ingestion cancelled");
        }

        match cancel.run(self.index.upsert(batch)).await {
            None => BatchResult::failed_whole(batch_index, &ids, "ingestion cancelled"),
            Some(Err(error)) => {
                warn!(batch_index, attempted = ids.len(), error = %error, "batch upload failed");
                BatchResult::failed_whole(batch_index, &ids, &error.to_string())
            }
            Some(Ok(outcomes)) => {
                let result = collate_outcomes(batch_index, &ids, outcomes);
                info!(
                    batch_index,
                    attempted = result.attempted,
                    succeeded = result.succeeded,
                    "batch uploaded"
                );
                for failure in &result.failures {
                    warn!(
                        batch_index,
                        document_id = %failure.document_id,
                        error = %failure.error_message,
                        "document failed to index"
                    );
                }
                result
            }
        }
    }
}

fn collate_outcomes(
    batch_index: usize,
    ids: &[String],
    outcomes: Vec<crate::models::IndexingOutcome>,
) -> BatchResult {
    let mut reported = HashMap::with_capacity(outcomes.len());
    for outcome in outcomes {
        reported.insert(outcome.document_id.clone(), outcome);
    }

    let mut succeeded = 0;
    let mut failures = Vec::new();
    for id in ids {
        match reported.get(id) {
            Some(outcome) if outcome.succeeded => succeeded += 1,
            Some(outcome) => failures.push(DocumentFailure {
                document_id: id.clone(),
                error_message: outcome
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "indexing failed".to_string()),
            }),
            None => failures.push(DocumentFailure {
                document_id: id.clone(),
                error_message: "index reported no result for document".to_string(),
            }),
        }
    }

    BatchResult {
        batch_index,
        attempted: ids.len(),
        succeeded,
        failures,
    }
}

fn validate_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), IngestError> {
    for (position, id) in ids.enumerate() {
        if id.trim().is_empty() {
            return Err(IngestError::MissingField {
                position,
                field: "id",
            });
        }
    }
    Ok(())
}

fn check_dimensions(
    document: &Document,
    field: &'static str,
    vector: &[f32],
    expected: usize,
) -> Result<(), IngestError> {
    if vector.len() != expected {
        return Err(IngestError::DimensionMismatch {
            document_id: document.id.clone(),
            field,
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

fn text_field(record: &Map<String, Value>, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn vector_value(vector: Vec<f32>) -> Value {
    Value::Array(vector.into_iter().map(Value::from).collect())
}

/// `docs/documents.json` becomes `docs/documents_with_embeddings.json`.
pub fn with_embeddings_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("documents");
    path.with_file_name(format!("{stem}_with_embeddings.json"))
}

pub async fn read_raw_documents(path: &Path) -> Result<Vec<RawDocument>, IngestError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn read_embedded_documents(path: &Path) -> Result<Vec<Document>, IngestError> {
    let bytes = tokio::fs::read(path).await?;
    let records: Vec<Value> = serde_json::from_slice(&bytes)?;

    records
        .into_iter()
        .enumerate()
        .map(|(position, record)| -> Result<Document, IngestError> {
            let has_id = record
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| !id.trim().is_empty());
            if !has_id {
                return Err(IngestError::MissingField {
                    position,
                    field: "id",
                });
            }
            for field in [TITLE_VECTOR_FIELD, CONTENT_VECTOR_FIELD] {
                if record.get(field).is_none() {
                    return Err(IngestError::MissingField { position, field });
                }
            }
            Ok(serde_json::from_value(record)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{CharacterNgramEmbedder, Pacer};
    use crate::cancel::CancelHandle;
    use crate::models::{
        IndexSearchRequest, IndexingOutcome, SearchQuery, SearchResult, SearchStrategy,
    };
    use crate::orchestrator::SearchCoordinator;
    use crate::schema::IndexSchema;
    use crate::stores::InMemoryIndex;
    use crate::{EmbeddingError, RetrievalOptions, SearchError};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const DIMENSIONS: usize = 16;

    /// Records every upload; fails whole submissions listed in `fail_batches`
    /// and individual documents listed in `reject_ids`.
    #[derive(Default)]
    struct ScriptedIndex {
        uploads: Mutex<Vec<Vec<String>>>,
        fail_batches: Vec<usize>,
        reject_ids: Vec<String>,
    }

    #[async_trait]
    impl SearchIndex for ScriptedIndex {
        async fn search(
            &self,
            _request: &IndexSearchRequest,
        ) -> Result<Vec<SearchResult>, SearchError> {
            Ok(Vec::new())
        }

        async fn upsert(
            &self,
            documents: &[Document],
        ) -> Result<Vec<IndexingOutcome>, SearchError> {
            let call = {
                let mut uploads = self.uploads.lock().expect("uploads lock");
                uploads.push(documents.iter().map(|document| document.id.clone()).collect());
                uploads.len() - 1
            };
            if self.fail_batches.contains(&call) {
                return Err(SearchError::Request("connection reset".to_string()));
            }
            Ok(documents
                .iter()
                .map(|document| {
                    let rejected = self.reject_ids.contains(&document.id);
                    IndexingOutcome {
                        document_id: document.id.clone(),
                        succeeded: !rejected,
                        error_message: rejected.then(|| "document too large".to_string()),
                    }
                })
                .collect())
        }

        async fn create_or_update_index(&self, _schema: &IndexSchema) -> Result<(), SearchError> {
            Ok(())
        }
    }

    /// Accepts every upload except call number `stall_on`, which fires
    /// `handle` (when set) and never completes.
    struct StallingIndex {
        stall_on: usize,
        handle: Option<CancelHandle>,
        calls: Mutex<usize>,
    }

    impl StallingIndex {
        fn new(stall_on: usize, handle: Option<CancelHandle>) -> Self {
            Self {
                stall_on,
                handle,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchIndex for StallingIndex {
        async fn search(
            &self,
            _request: &IndexSearchRequest,
        ) -> Result<Vec<SearchResult>, SearchError> {
            Ok(Vec::new())
        }

        async fn upsert(
            &self,
            documents: &[Document],
        ) -> Result<Vec<IndexingOutcome>, SearchError> {
            let call = {
                let mut calls = self.calls.lock().expect("calls lock");
                *calls += 1;
                *calls - 1
            };
            if call == self.stall_on {
                if let Some(handle) = &self.handle {
                    handle.cancel();
                }
                std::future::pending::<()>().await;
            }
            Ok(documents
                .iter()
                .map(|document| IndexingOutcome {
                    document_id: document.id.clone(),
                    succeeded: true,
                    error_message: None,
                })
                .collect())
        }

        async fn create_or_update_index(&self, _schema: &IndexSchema) -> Result<(), SearchError> {
            Ok(())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl EmbeddingClient for FailingClient {
        fn model(&self) -> &str {
            "failing"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Provider {
                status: 503,
                details: "unavailable".to_string(),
            })
        }
    }

    fn raw(count: usize) -> Vec<RawDocument> {
        (0..count)
            .map(|index| RawDocument {
                id: format!("doc-{index}"),
                title: format!("Title {index}"),
                content: format!("Content for document {index}"),
                ..RawDocument::default()
            })
            .collect()
    }

    fn embedder<C: EmbeddingClient>(client: C) -> Embedder<C> {
        Embedder::new(client, DIMENSIONS).with_pacer(Arc::new(Pacer::unlimited()))
    }

    fn ngram() -> Embedder<CharacterNgramEmbedder> {
        embedder(CharacterNgramEmbedder {
            dimensions: DIMENSIONS,
        })
    }

    fn pipeline<I: SearchIndex>(index: I) -> IngestionPipeline<I, CharacterNgramEmbedder> {
        IngestionPipeline::new(index, ngram(), IngestionOptions::default())
    }

    #[tokio::test]
    async fn batches_follow_input_order_and_size() {
        let pipeline = pipeline(ScriptedIndex::default());
        let report = pipeline
            .ingest(raw(250), &Cancellation::never())
            .await
            .expect("ingest should succeed");

        let attempted = report.batches.iter().map(|batch| batch.attempted).collect::<Vec<_>>();
        assert_eq!(attempted, vec![100, 100, 50]);
        let indices = report.batches.iter().map(|batch| batch.batch_index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(report.succeeded(), 250);

        let uploads = pipeline.index().uploads.lock().expect("uploads lock");
        assert_eq!(uploads[0][0], "doc-0");
        assert_eq!(uploads[1][0], "doc-100");
        assert_eq!(uploads[2][49], "doc-249");
    }

    #[tokio::test]
    async fn failed_batch_does_not_stop_later_batches() {
        let index = ScriptedIndex {
            fail_batches: vec![1],
            ..ScriptedIndex::default()
        };
        let report = pipeline(index)
            .ingest(raw(250), &Cancellation::never())
            .await
            .expect("ingest should succeed");

        assert_eq!(report.batches.len(), 3);
        let failed = &report.batches[1];
        assert_eq!(failed.succeeded, 0);
        assert_eq!(failed.failures.len(), 100);
        assert!(failed.failures[0].error_message.contains("connection reset"));

        let last = &report.batches[2];
        assert_eq!(last.batch_index, 2);
        assert_eq!(last.attempted, 50);
        assert_eq!(last.succeeded, 50);
        assert!(last.failures.is_empty());
    }

    #[tokio::test]
    async fn per_document_failures_are_reported_individually() {
        let index = ScriptedIndex {
            reject_ids: vec!["doc-3".to_string()],
            ..ScriptedIndex::default()
        };
        let report = pipeline(index)
            .ingest(raw(5), &Cancellation::never())
            .await
            .expect("ingest should succeed");

        assert_eq!(report.batches.len(), 1);
        assert_eq!(report.batches[0].succeeded, 4);
        assert_eq!(
            report.batches[0].failures,
            vec![DocumentFailure {
                document_id: "doc-3".to_string(),
                error_message: "document too large".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn missing_id_is_rejected_before_any_work() {
        let mut documents = raw(3);
        documents[2].id = String::new();
        let pipeline = pipeline(ScriptedIndex::default());

        let result = pipeline.ingest(documents, &Cancellation::never()).await;
        assert!(matches!(
            result,
            Err(IngestError::MissingField { position: 2, field: "id" })
        ));
        assert!(pipeline.index().uploads.lock().expect("uploads lock").is_empty());
    }

    #[tokio::test]
    async fn degraded_embeddings_are_counted_and_still_uploaded() {
        let pipeline = IngestionPipeline::new(
            ScriptedIndex::default(),
            embedder(FailingClient),
            IngestionOptions::default(),
        );
        let report = pipeline
            .ingest(raw(3), &Cancellation::never())
            .await
            .expect("ingest should succeed");

        assert_eq!(report.degraded_embeddings, 6);
        assert_eq!(report.succeeded(), 3);
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_next_batch() {
        let (handle, token) = Cancellation::new();
        handle.cancel();
        let pipeline = pipeline(ScriptedIndex::default());

        let report = pipeline
            .ingest(raw(150), &token)
            .await
            .expect("ingest should succeed");

        assert!(report.cancelled);
        assert_eq!(report.batches.len(), 1);
        assert_eq!(report.batches[0].succeeded, 0);
        assert_eq!(report.batches[0].failures.len(), 100);
        assert!(pipeline.index().uploads.lock().expect("uploads lock").is_empty());
    }

    fn batch_summary(report: &IngestionReport) -> Vec<(usize, usize, usize, usize)> {
        report
            .batches
            .iter()
            .map(|batch| {
                (batch.batch_index, batch.attempted, batch.succeeded, batch.failures.len())
            })
            .collect()
    }

    #[tokio::test]
    async fn cancellation_mid_run_keeps_finished_batches() {
        let (handle, token) = Cancellation::new();
        let pipeline = pipeline(StallingIndex::new(1, Some(handle)));

        let report = pipeline
            .ingest(raw(250), &token)
            .await
            .expect("ingest should succeed");

        assert!(report.cancelled);
        assert_eq!(batch_summary(&report), vec![(0, 100, 100, 0), (1, 100, 0, 100)]);
        assert_eq!(report.batches[1].failures[0].document_id, "doc-100");
        assert_eq!(report.batches[1].failures[0].error_message, "ingestion cancelled");
        assert_eq!(*pipeline.index().calls.lock().expect("calls lock"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_during_upload_stops_ingestion() {
        let started = tokio::time::Instant::now();
        let token = Cancellation::never().with_deadline(started + Duration::from_secs(5));
        let pipeline = pipeline(StallingIndex::new(1, None));

        let report = pipeline
            .ingest(raw(250), &token)
            .await
            .expect("ingest should succeed");

        assert!(report.cancelled);
        assert_eq!(batch_summary(&report), vec![(0, 100, 100, 0), (1, 100, 0, 100)]);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(*pipeline.index().calls.lock().expect("calls lock"), 2);
    }

    #[tokio::test]
    async fn reingesting_an_id_replaces_searchable_content() {
        let index = Arc::new(InMemoryIndex::new(DIMENSIONS));
        let pipeline = pipeline(Arc::clone(&index));
        let first = RawDocument {
            id: "doc-1".to_string(),
            title: "Storage".to_string(),
            content: "original wording".to_string(),
            ..RawDocument::default()
        };
        pipeline
            .ingest(vec![first.clone()], &Cancellation::never())
            .await
            .expect("first ingest");

        let updated = RawDocument {
            content: "revised wording".to_string(),
            ..first
        };
        pipeline
            .ingest(vec![updated], &Cancellation::never())
            .await
            .expect("second ingest");

        let coordinator =
            SearchCoordinator::new(Arc::clone(&index), ngram(), RetrievalOptions::default());
        let results = coordinator
            .search(&SearchQuery::new("revised wording", SearchStrategy::Hybrid, 5))
            .await
            .expect("search should succeed");

        assert_eq!(index.len().await, 1);
        assert_eq!(results[0].document_id, "doc-1");
        assert_eq!(results[0].content, "revised wording");
    }

    #[tokio::test]
    async fn embed_file_writes_sibling_and_upload_file_reads_it(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("documents.json");
        tokio::fs::write(
            &input,
            r#"[{"id":"a","title":"Cloud","content":"Benefits","category":"intro","extra":42},
                {"id":"b","title":"","content":"Only content"}]"#,
        )
        .await?;

        let pipeline = pipeline(ScriptedIndex::default());
        let embedded = pipeline.embed_file(&input).await?;
        assert_eq!(embedded.output, dir.path().join("documents_with_embeddings.json"));
        assert_eq!(embedded.documents, 2);

        let written: Vec<Value> =
            serde_json::from_slice(&tokio::fs::read(&embedded.output).await?)?;
        assert_eq!(written[0]["extra"], 42);
        assert_eq!(written[0]["titleVector"].as_array().map(Vec::len), Some(DIMENSIONS));
        assert!(written[1]["titleVector"]
            .as_array()
            .is_some_and(|vector| vector.iter().all(|value| value.as_f64() == Some(0.0))));

        let report = pipeline.upload_file(&embedded.output, &Cancellation::never()).await?;
        assert_eq!(report.succeeded(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn upload_rejects_wrong_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("bad_with_embeddings.json");
        tokio::fs::write(
            &input,
            r#"[{"id":"a","title":"t","content":"c","titleVector":[1.0],"contentVector":[1.0]}]"#,
        )
        .await?;

        let result = pipeline(ScriptedIndex::default())
            .upload_file(&input, &Cancellation::never())
            .await;
        assert!(matches!(
            result,
            Err(IngestError::DimensionMismatch { field: "titleVector", .. })
        ));
        Ok(())
    }

    #[test]
    fn sibling_path_replaces_extension() {
        assert_eq!(
            with_embeddings_path(Path::new("/data/documents.json")),
            PathBuf::from("/data/documents_with_embeddings.json")
        );
    }
}
