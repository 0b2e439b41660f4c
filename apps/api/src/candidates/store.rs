//! Candidate Store — one trait, several persistence backends.
//!
//! Handlers only ever see `Arc<dyn CandidateStore>`; which backend sits behind
//! it is decided once at startup from `STORE_BACKEND`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::candidates::validation::CandidateDraft;
use crate::errors::AppError;
use crate::models::candidate::{Candidate, CandidateStatus};

/// Durable, validated persistence of candidate records.
///
/// Drafts reaching a store are already validated; the store itself enforces
/// identity, timestamps and email uniqueness.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// All candidates, newest first.
    async fn list(&self) -> Result<Vec<Candidate>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Candidate, AppError>;

    async fn create(&self, draft: CandidateDraft) -> Result<Candidate, AppError>;

    /// Replaces the required fields and any optional fields the draft carries.
    async fn update(&self, id: Uuid, draft: CandidateDraft) -> Result<Candidate, AppError>;

    async fn set_status(&self, id: Uuid, status: CandidateStatus) -> Result<Candidate, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

impl Candidate {
    /// Builds a fresh record from a draft.
    pub fn from_draft(id: Uuid, draft: CandidateDraft, now: DateTime<Utc>) -> Self {
        Candidate {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            position: draft.position,
            experience: draft.experience,
            skills: draft.skills.unwrap_or_default(),
            education: draft.education,
            status: draft.status.unwrap_or_default(),
            notes: draft.notes,
            resume_url: draft.resume_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges a draft over this record. `created_at` never moves.
    pub fn apply_draft(&mut self, draft: CandidateDraft, now: DateTime<Utc>) {
        self.first_name = draft.first_name;
        self.last_name = draft.last_name;
        self.email = draft.email;
        self.phone = draft.phone;
        self.position = draft.position;
        self.experience = draft.experience;
        self.education = draft.education;
        if let Some(skills) = draft.skills {
            self.skills = skills;
        }
        if let Some(status) = draft.status {
            self.status = status;
        }
        if draft.notes.is_some() {
            self.notes = draft.notes;
        }
        if draft.resume_url.is_some() {
            self.resume_url = draft.resume_url;
        }
        self.touch(now);
    }

    pub fn set_status(&mut self, status: CandidateStatus, now: DateTime<Utc>) {
        self.status = status;
        self.touch(now);
    }

    /// Refreshes `updated_at` without letting it fall behind either timestamp.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}

/// Newest-created first. The sort is stable, so callers that want
/// "most recently inserted first" on ties pass records in reverse insertion
/// order.
pub fn sort_newest_first(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
