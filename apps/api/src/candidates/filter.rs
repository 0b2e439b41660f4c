use serde::{Deserialize, Serialize};

use crate::models::candidate::{Candidate, CandidateStatus};

/// Search parameters for a candidate listing. Both default to "match all".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl CandidateQuery {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.status.as_deref().map_or(true, str::is_empty)
    }
}

/// Returns the candidates matching `query`, in input order.
///
/// The search term is matched case-insensitively as a substring of first
/// name, last name, email or position. The status must equal the status name
/// exactly. The iterator is `Clone`, so a caller can walk it more than once.
pub fn filter_candidates<'a>(
    candidates: &'a [Candidate],
    query: &CandidateQuery,
) -> impl Iterator<Item = &'a Candidate> + Clone + 'a {
    let term = query.search.to_lowercase();
    let status = query.status.clone().filter(|s| !s.is_empty());

    candidates.iter().filter(move |candidate| {
        matches_search(candidate, &term)
            && status
                .as_deref()
                .map_or(true, |s| candidate.status.as_str() == s)
    })
}

fn matches_search(candidate: &Candidate, term: &str) -> bool {
    [
        &candidate.first_name,
        &candidate.last_name,
        &candidate.email,
        &candidate.position,
    ]
    .into_iter()
    .any(|field| field.to_lowercase().contains(term))
}

/// Per-status head counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub applied: usize,
    pub interviewing: usize,
    pub hired: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn tally<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> Self {
        candidates
            .into_iter()
            .fold(StatusCounts::default(), |mut counts, candidate| {
                counts.total += 1;
                match candidate.status {
                    CandidateStatus::Applied => counts.applied += 1,
                    CandidateStatus::Interviewing => counts.interviewing += 1,
                    CandidateStatus::Hired => counts.hired += 1,
                    CandidateStatus::Rejected => counts.rejected += 1,
                }
                counts
            })
    }
}
