use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::candidates::store::{sort_newest_first, CandidateStore};
use crate::candidates::validation::CandidateDraft;
use crate::errors::AppError;
use crate::models::candidate::{timestamp_now, Candidate, CandidateStatus};

/// Local candidate store: records live in memory and, when a snapshot path is
/// configured, are mirrored to a JSON file after every mutation.
///
/// Writers are serialised by the lock, including the snapshot write.
pub struct InMemoryCandidateStore {
    /// Insertion order.
    records: RwLock<Vec<Candidate>>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            snapshot_path: None,
        }
    }

    /// Opens a store backed by `path`, loading any snapshot already there.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Candidate>>(&bytes)
                .with_context(|| format!("Corrupt candidate snapshot at {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read candidate snapshot at {}", path.display())
                })
            }
        };
        info!(
            "Loaded {} candidate(s) from snapshot {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            records: RwLock::new(records),
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self, records: &[Candidate]) -> Result<(), AppError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        write_snapshot(path, records).await?;
        debug!("Wrote {} candidate(s) to {}", records.len(), path.display());
        Ok(())
    }
}

impl Default for InMemoryCandidateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write to a sibling temp file, then rename over the snapshot.
async fn write_snapshot(path: &Path, records: &[Candidate]) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

fn position_of(records: &[Candidate], id: Uuid) -> Result<usize, AppError> {
    records
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(AppError::candidate_not_found)
}

fn email_taken(records: &[Candidate], email: &str, except: Option<Uuid>) -> bool {
    records
        .iter()
        .any(|c| c.email == email && Some(c.id) != except)
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn list(&self) -> Result<Vec<Candidate>, AppError> {
        let records = self.records.read().await;
        let mut list: Vec<Candidate> = records.iter().rev().cloned().collect();
        sort_newest_first(&mut list);
        Ok(list)
    }

    async fn get(&self, id: Uuid) -> Result<Candidate, AppError> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(AppError::candidate_not_found)
    }

    async fn create(&self, draft: CandidateDraft) -> Result<Candidate, AppError> {
        let mut records = self.records.write().await;
        if email_taken(&records, &draft.email, None) {
            return Err(AppError::duplicate_email());
        }

        let candidate = Candidate::from_draft(Uuid::new_v4(), draft, timestamp_now());
        records.push(candidate.clone());
        if let Err(e) = self.persist(&records).await {
            records.pop();
            return Err(e);
        }
        Ok(candidate)
    }

    async fn update(&self, id: Uuid, draft: CandidateDraft) -> Result<Candidate, AppError> {
        let mut records = self.records.write().await;
        let idx = position_of(&records, id)?;
        if email_taken(&records, &draft.email, Some(id)) {
            return Err(AppError::duplicate_email());
        }

        let previous = records[idx].clone();
        records[idx].apply_draft(draft, timestamp_now());
        if let Err(e) = self.persist(&records).await {
            records[idx] = previous;
            return Err(e);
        }
        Ok(records[idx].clone())
    }

    async fn set_status(&self, id: Uuid, status: CandidateStatus) -> Result<Candidate, AppError> {
        let mut records = self.records.write().await;
        let idx = position_of(&records, id)?;

        let previous = records[idx].clone();
        records[idx].set_status(status, timestamp_now());
        if let Err(e) = self.persist(&records).await {
            records[idx] = previous;
            return Err(e);
        }
        Ok(records[idx].clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        let idx = position_of(&records, id)?;

        let removed = records.remove(idx);
        if let Err(e) = self.persist(&records).await {
            records.insert(idx, removed);
            return Err(e);
        }
        Ok(())
    }
}
