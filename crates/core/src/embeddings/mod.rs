pub mod azure_openai;
pub mod ngram;
pub mod pacer;

pub use azure_openai::AzureOpenAiClient;
pub use ngram::CharacterNgramEmbedder;
pub use pacer::Pacer;

use crate::cancel::Cancellation;
use crate::models::{Embedding, EmbeddingStatus};
use crate::traits::EmbeddingClient;
use crate::EmbeddingError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const MAX_EMBEDDING_INPUT_CHARS: usize = 8_000;
pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps an [`EmbeddingClient`] with the input and failure policy every
/// caller relies on: blank text never reaches the provider, long text is cut
/// to [`MAX_EMBEDDING_INPUT_CHARS`], and any provider failure comes back as
/// a zero vector tagged [`EmbeddingStatus::Degraded`]. Every returned vector
/// has exactly `dimensions` elements.
pub struct Embedder<C> {
    client: C,
    dimensions: usize,
    timeout: Duration,
    pacer: Arc<Pacer>,
    degraded: AtomicUsize,
}

impl<C: EmbeddingClient> Embedder<C> {
    pub fn new(client: C, dimensions: usize) -> Self {
        Self {
            client,
            dimensions,
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
            pacer: Arc::new(Pacer::default()),
            degraded: AtomicUsize::new(0),
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Number of degraded embeddings produced so far.
    pub fn degraded_count(&self) -> usize {
        self.degraded.load(Ordering::Relaxed)
    }

    pub async fn embed(&self, text: &str) -> Embedding {
        self.embed_with(text, &Cancellation::never()).await
    }

    pub async fn embed_with(&self, text: &str, cancel: &Cancellation) -> Embedding {
        if text.trim().is_empty() {
            return Embedding::zeroed(self.dimensions, EmbeddingStatus::Empty);
        }

        let input = truncate_chars(text, MAX_EMBEDDING_INPUT_CHARS);
        let attempt = async {
            self.pacer.acquire().await;
            match tokio::time::timeout(self.timeout, self.client.embed(input)).await {
                Ok(result) => result,
                Err(_) => Err(EmbeddingError::Timeout(self.timeout)),
            }
        };

        let result = cancel
            .run(attempt)
            .await
            .unwrap_or(Err(EmbeddingError::Cancelled));

        match result {
            Ok(vector) if vector.len() == self.dimensions => Embedding {
                vector,
                status: EmbeddingStatus::Ok,
            },
            Ok(vector) => self.degrade(
                text,
                EmbeddingError::MalformedResponse(format!(
                    "expected {} dimensions, provider returned {}",
                    self.dimensions,
                    vector.len()
                )),
            ),
            Err(error) => self.degrade(text, error),
        }
    }

    /// Embeds texts one after another through the shared pacer.
    pub async fn embed_many(&self, texts: &[String]) -> Vec<Embedding> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await);
        }
        embeddings
    }

    fn degrade(&self, text: &str, error: EmbeddingError) -> Embedding {
        self.degraded.fetch_add(1, Ordering::Relaxed);
        warn!(
            model = self.client.model(),
            text_chars = text.chars().count(),
            error = %error,
            "embedding degraded to zero vector"
        );
        Embedding::zeroed(self.dimensions, EmbeddingStatus::Degraded)
    }
}

/// Returns at most `max_chars` code points of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
