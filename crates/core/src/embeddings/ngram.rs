use crate::models::DEFAULT_EMBEDDING_DIMENSIONS;
use crate::traits::EmbeddingClient;
use crate::EmbeddingError;
use async_trait::async_trait;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Hashes character trigrams of each word into a fixed number of buckets.
/// Deterministic and offline, so it stands in for the hosted model in tests
/// and `--offline` runs.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl CharacterNgramEmbedder {
    /// L2-normalised trigram histogram. Words are padded with a space on
    /// both sides so short words still produce trigrams.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let buckets = self.dimensions.max(1);
        let mut vector = vec![0f32; buckets];

        for word in text.split_whitespace() {
            let padded = std::iter::once(' ')
                .chain(word.chars().flat_map(char::to_lowercase))
                .chain(std::iter::once(' '))
                .collect::<Vec<_>>();
            for trigram in padded.windows(3) {
                vector[bucket(trigram, buckets)] += 1.0;
            }
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vector.iter_mut().for_each(|value| *value /= magnitude);
        }
        vector
    }
}

fn bucket(trigram: &[char], buckets: usize) -> usize {
    let mut utf8 = [0u8; 4];
    let hash = trigram.iter().fold(FNV_OFFSET, |hash, ch| {
        ch.encode_utf8(&mut utf8)
            .bytes()
            .fold(hash, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
    });
    (hash % buckets as u64) as usize
}

#[async_trait]
impl EmbeddingClient for CharacterNgramEmbedder {
    fn model(&self) -> &str {
        "character-trigram"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vectorize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::CharacterNgramEmbedder;
    use crate::stores::memory::cosine_similarity;

    #[test]
    fn same_text_same_vector() {
        let embedder = CharacterNgramEmbedder { dimensions: 64 };
        assert_eq!(
            embedder.vectorize("Vector search with managed indexes"),
            embedder.vectorize("vector SEARCH with managed indexes")
        );
        assert_eq!(embedder.vectorize("a").len(), 64);
    }

    #[test]
    fn overlapping_text_is_closer_than_unrelated_text() {
        let embedder = CharacterNgramEmbedder { dimensions: 256 };
        let query = embedder.vectorize("cloud storage pricing");
        let related = embedder.vectorize("pricing for cloud storage tiers");
        let unrelated = embedder.vectorize("hydraulic pump maintenance");

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }
}
