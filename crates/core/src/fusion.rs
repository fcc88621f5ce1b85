use std::collections::HashMap;

pub const RRF_K: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit {
    pub document_id: String,
    pub score: f64,
    /// Position of the best rank this id had in any input list.
    best_rank: usize,
}

/// Weighted reciprocal-rank fusion over ranked id lists. Ties keep the id
/// that ranked better in its strongest list first.
pub fn reciprocal_rank_fusion(lists: &[(&[String], f64)]) -> Vec<FusedHit> {
    let mut scored = HashMap::<&str, FusedHit>::new();

    for (ids, weight) in lists {
        for (position, id) in ids.iter().enumerate() {
            let rank_component = 1.0 / (RRF_K + (position as f64 + 1.0));
            let entry = scored.entry(id.as_str()).or_insert_with(|| FusedHit {
                document_id: id.clone(),
                score: 0.0,
                best_rank: position,
            });
            entry.score += weight * rank_component;
            entry.best_rank = entry.best_rank.min(position);
        }
    }

    let mut fused = scored.into_values().collect::<Vec<_>>();
    fused.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then(left.best_rank.cmp(&right.best_rank))
            .then_with(|| left.document_id.cmp(&right.document_id))
    });
    fused
}
