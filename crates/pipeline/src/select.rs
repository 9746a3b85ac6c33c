//! Candidate question deduplication and capping.

use crate::types::CandidateQuestion;
use std::collections::HashSet;

/// Drop exact duplicates and keep at most `max` questions.
///
/// Questions are compared on their trimmed text. The first occurrence wins,
/// including its page set, and first-seen order is preserved.
pub fn select(candidates: Vec<CandidateQuestion>, max: usize) -> Vec<CandidateQuestion> {
    let mut seen = HashSet::new();
    let mut selected = Vec::with_capacity(candidates.len().min(max));

    for mut candidate in candidates {
        if selected.len() >= max {
            break;
        }

        let key = candidate.text.trim().to_string();
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }

        candidate.text = key;
        selected.push(candidate);
    }

    tracing::debug!("Selected {} questions (cap {})", selected.len(), max);
    selected
}
