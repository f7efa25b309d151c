//! Membership reconciliation and the ingestion poll loop.
//!
//! Adding a document to an index only starts ingestion; the remote service moves
//! every member from in-progress to completed or failed on its own schedule.
//! [`poll_until_settled`] waits for that, reporting counts on every cycle.

use std::collections::HashSet;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::PollConfig;
use crate::contract::{IndexStore, Membership, MembershipStatus};
use crate::error::SyncError;

/// Add every document in `document_ids` that is not a member of the index yet.
/// Returns the ids that were added, in input order.
///
/// With `lenient_listing`, a failure to list the current members is logged and
/// treated as an empty index, which may re-add documents that are already members.
pub async fn reconcile_membership<I>(
    store: &I,
    index_id: &str,
    document_ids: &[String],
    lenient_listing: bool,
) -> Result<Vec<String>, SyncError>
where
    I: IndexStore + ?Sized,
{
    info!(index_id, "[SYNC][MEMBERS] Listing current index members");
    let members: HashSet<String> = match store.list_members(index_id).await {
        Ok(members) => members.into_iter().map(|m| m.document_id).collect(),
        Err(e) if lenient_listing => {
            warn!(index_id, error = %e, "[SYNC][MEMBERS] Failed to list members, assuming none");
            HashSet::new()
        }
        Err(source) => {
            error!(index_id, error = ?source, "[SYNC][ERROR][MEMBERS] Failed to list members");
            return Err(SyncError::Listing {
                what: "index members",
                source,
            });
        }
    };
    info!(index_id, count = members.len(), "[SYNC][MEMBERS] Found existing members");

    let mut seen = HashSet::new();
    let to_add: Vec<String> = document_ids
        .iter()
        .filter(|id| !members.contains(id.as_str()))
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect();

    if to_add.is_empty() {
        info!(index_id, "[SYNC][MEMBERS] All documents already in index");
        return Ok(Vec::new());
    }

    let mut added = Vec::with_capacity(to_add.len());
    for document_id in to_add {
        info!(index_id, document_id = %document_id, "[SYNC][MEMBERS] Adding document to index");
        store
            .add_member(index_id, &document_id)
            .await
            .map_err(|source| {
                error!(index_id, document_id = %document_id, error = ?source, "[SYNC][ERROR][MEMBERS] add_member failed");
                SyncError::AddMember {
                    index_id: index_id.to_string(),
                    document_id: document_id.clone(),
                    source,
                }
            })?;
        added.push(document_id);
    }
    Ok(added)
}

/// Member counts for a single poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollCounts {
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub total: usize,
}

impl PollCounts {
    pub fn from_members(members: &[Membership]) -> Self {
        let mut counts = PollCounts {
            total: members.len(),
            ..PollCounts::default()
        };
        for member in members {
            match member.status {
                MembershipStatus::Completed => counts.completed += 1,
                MembershipStatus::Failed => counts.failed += 1,
                MembershipStatus::InProgress => counts.in_progress += 1,
            }
        }
        counts
    }

    /// No member is left in a non-terminal state.
    pub fn is_settled(&self) -> bool {
        self.completed + self.failed == self.total
    }
}

/// Result of a poll loop that reached a settled state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollOutcome {
    /// Number of membership listings performed, including the final one.
    pub cycles: u32,
    pub counts: PollCounts,
    pub failed_ids: Vec<String>,
}

/// Poll the index until every member is completed or failed.
///
/// Failed members are reported but never stop the loop. When `config.max_wait`
/// elapses first, the last counts are returned inside [`SyncError::PollTimeout`].
pub async fn poll_until_settled<I>(
    store: &I,
    index_id: &str,
    config: &PollConfig,
) -> Result<PollOutcome, SyncError>
where
    I: IndexStore + ?Sized,
{
    info!(index_id, "[SYNC][POLL] Checking document processing status");
    let started = Instant::now();
    let mut interval = config.interval;
    let mut cycles = 0u32;

    loop {
        let members = store.list_members(index_id).await.map_err(|source| {
            error!(index_id, error = ?source, "[SYNC][ERROR][POLL] Failed to list members");
            SyncError::Listing {
                what: "index members",
                source,
            }
        })?;
        cycles += 1;

        let counts = PollCounts::from_members(&members);
        info!(
            cycle = cycles,
            completed = counts.completed,
            in_progress = counts.in_progress,
            failed = counts.failed,
            total = counts.total,
            "[SYNC][POLL] Processing status"
        );

        let failed_ids: Vec<String> = members
            .iter()
            .filter(|m| m.status == MembershipStatus::Failed)
            .map(|m| m.document_id.clone())
            .collect();
        if !failed_ids.is_empty() {
            warn!(index_id, failed = ?failed_ids, "[SYNC][POLL] Some documents failed processing");
        }

        if counts.is_settled() {
            info!(index_id, cycles, "[SYNC][POLL] All documents processed");
            return Ok(PollOutcome {
                cycles,
                counts,
                failed_ids,
            });
        }

        let waited = started.elapsed();
        let mut sleep_for = interval;
        if let Some(max_wait) = config.max_wait {
            if waited >= max_wait {
                error!(index_id, waited = ?waited, "[SYNC][ERROR][POLL] Gave up waiting for processing");
                return Err(SyncError::PollTimeout {
                    index_id: index_id.to_string(),
                    waited,
                    counts,
                });
            }
            // Never sleep past the deadline.
            sleep_for = sleep_for.min(max_wait - waited);
        }

        tokio::time::sleep(sleep_for).await;
        interval = config.next_interval(interval);
    }
}
