//! Optimistic vote reconciliation.
//!
//! | existing vote | requested | delta | record action |
//! |---------------|-----------|-------|---------------|
//! | none          | v         | +v    | insert        |
//! | v             | v         | -v    | delete        |
//! | -v            | v         | +2v   | update to v   |

use crate::backend::{to_document, DocPath, FieldUpdate, WriteBatch};
use crate::common::errors::BackendResult;
use crate::config::{post_votes_collection, POSTS_COLLECTION};
use crate::models::models::{Post, PostVote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn value(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl TryFrom<i64> for Vote {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Vote::Up),
            -1 => Ok(Vote::Down),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteAction {
    Insert(PostVote),
    Delete(PostVote),
    Update { previous: PostVote, updated: PostVote },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    /// The post's vote status after this vote.
    pub vote_status: i64,
    /// Signed amount to add to the persisted vote status.
    pub delta: i64,
    pub action: VoteAction,
    /// The user's vote records after this vote.
    pub votes: Vec<PostVote>,
}

/// Compute the local result of clicking `requested` on `post`.
///
/// `votes` is the user's current vote list; at most one entry may refer to
/// `post`. `new_vote_id` is only called when a record has to be created.
pub fn reconcile_vote(
    post: &Post,
    votes: &[PostVote],
    requested: Vote,
    new_vote_id: impl FnOnce() -> String,
) -> VoteOutcome {
    let vote = requested.value();
    let existing = votes.iter().find(|v| v.post_id == post.id);

    let (delta, action) = match existing {
        None => (
            vote,
            VoteAction::Insert(PostVote {
                id: new_vote_id(),
                post_id: post.id.clone(),
                community_id: post.community_id.clone(),
                vote_value: vote,
            }),
        ),
        Some(prev) if prev.vote_value == vote => (-vote, VoteAction::Delete(prev.clone())),
        Some(prev) => (
            2 * vote,
            VoteAction::Update {
                previous: prev.clone(),
                updated: PostVote { vote_value: vote, ..prev.clone() },
            },
        ),
    };

    let mut next = votes.to_vec();
    match &action {
        VoteAction::Insert(record) => next.push(record.clone()),
        VoteAction::Delete(record) => next.retain(|v| v.id != record.id),
        VoteAction::Update { updated, .. } => {
            if let Some(slot) = next.iter_mut().find(|v| v.id == updated.id) {
                *slot = updated.clone();
            }
        }
    }

    VoteOutcome {
        vote_status: post.vote_status + delta,
        delta,
        action,
        votes: next,
    }
}

impl VoteOutcome {
    /// The vote record for the post after this vote, if any.
    pub fn record(&self) -> Option<&PostVote> {
        match &self.action {
            VoteAction::Insert(record) => Some(record),
            VoteAction::Update { updated, .. } => Some(updated),
            VoteAction::Delete(_) => None,
        }
    }

    /// The vote record for the post before this vote, if any.
    pub fn previous(&self) -> Option<&PostVote> {
        match &self.action {
            VoteAction::Insert(_) => None,
            VoteAction::Delete(previous) | VoteAction::Update { previous, .. } => Some(previous),
        }
    }

    /// The backend mutation: the vote record change plus an atomic increment
    /// of the post's vote status.
    pub fn to_batch(&self, user_id: &str, post_id: &str) -> BackendResult<WriteBatch> {
        let votes = post_votes_collection(user_id);
        let mut batch = WriteBatch::new();

        match &self.action {
            VoteAction::Insert(record) => {
                batch.set(DocPath::new(votes, record.id.clone()), to_document(record)?);
            }
            VoteAction::Delete(record) => {
                batch.delete(DocPath::new(votes, record.id.clone()));
            }
            VoteAction::Update { updated, .. } => {
                batch.update(
                    DocPath::new(votes, updated.id.clone()),
                    vec![("voteValue".to_string(), FieldUpdate::Set(updated.vote_value.into()))],
                );
            }
        }
        batch.increment(DocPath::new(POSTS_COLLECTION, post_id), "voteStatus", self.delta);
        Ok(batch)
    }
}
