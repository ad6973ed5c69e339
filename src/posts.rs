use crate::backend::{BlobHandle, DocPath, Filter, OrderBy};
use crate::common::errors::AppError;
use crate::common::helpers::new_id;
use crate::config::{post_image_path, post_route, post_votes_collection, POSTS_COLLECTION};
use crate::context::AppContext;
use crate::models::models::{Post, PostVote};
use crate::state::PostState;
use crate::votes::{reconcile_vote, Vote, VoteOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum VoteResult {
    /// Local state updated and the batch committed.
    Applied(VoteOutcome),
    /// The batch failed; local state was restored.
    RolledBack,
    /// Nobody is signed in; the login modal was opened.
    AuthRequired,
    /// A vote on this post is still being written.
    InFlight,
}

/// Replace the voted post's entries in `state` with the given values.
fn apply_to_state(state: &mut PostState, post: &Post, previous: Option<&PostVote>, next: Option<&PostVote>) {
    if let Some(slot) = state.posts.iter_mut().find(|p| p.id == post.id) {
        slot.vote_status = post.vote_status;
    }
    if let Some(selected) = state.selected_post.as_mut().filter(|p| p.id == post.id) {
        selected.vote_status = post.vote_status;
    }

    match (previous, next) {
        (_, Some(record)) => {
            if let Some(slot) = state.post_votes.iter_mut().find(|v| v.id == record.id) {
                *slot = record.clone();
            } else {
                state.post_votes.push(record.clone());
            }
        }
        (Some(record), None) => state.post_votes.retain(|v| v.id != record.id),
        (None, None) => {}
    }
}

/// Vote on `post`: update local state first, then commit the vote record and
/// the vote status increment as one batch. A failed batch is reverted.
pub async fn on_vote(ctx: &AppContext, post: &Post, vote: Vote) -> VoteResult {
    let user = match ctx.require_user() {
        Some(user) => user,
        None => return VoteResult::AuthRequired,
    };

    let _guard = match ctx.posts.begin_write(&post.id) {
        Some(guard) => guard,
        None => {
            log::debug!("Vote on post {} ignored: write in flight", post.id);
            return VoteResult::InFlight;
        }
    };

    // Reconcile against the local mirror (list, then selected post) when it
    // has this post; the caller's copy may predate an earlier vote.
    let current = ctx.posts.get();
    let base = current
        .post(&post.id)
        .or_else(|| current.selected_post.as_ref().filter(|p| p.id == post.id))
        .cloned()
        .unwrap_or_else(|| post.clone());
    let outcome = reconcile_vote(&base, &current.post_votes, vote, new_id);

    let updated = Post { vote_status: outcome.vote_status, ..base.clone() };
    ctx.posts.update(|state| apply_to_state(state, &updated, outcome.previous(), outcome.record()));

    let committed = match outcome.to_batch(&user.uid, &post.id) {
        Ok(batch) => ctx.documents.commit(batch).await,
        Err(e) => Err(e),
    };

    match committed {
        Ok(()) => VoteResult::Applied(outcome),
        Err(e) => {
            log::error!("onVote error for post {}: {}", post.id, e);
            ctx.posts.update(|state| {
                let restored = state
                    .post(&post.id)
                    .or_else(|| state.selected_post.as_ref().filter(|p| p.id == post.id))
                    .map(|p| Post { vote_status: p.vote_status - outcome.delta, ..p.clone() })
                    .unwrap_or_else(|| base.clone());
                apply_to_state(state, &restored, outcome.record(), outcome.previous());
            });
            VoteResult::RolledBack
        }
    }
}

/// Mark `post` as selected and return the route to its page.
pub fn on_select_post(ctx: &AppContext, post: &Post) -> String {
    ctx.posts.update(|state| state.selected_post = Some(post.clone()));
    post_route(&post.community_id, &post.id)
}

/// Delete a post and its image. Returns `false` on any failure.
pub async fn on_delete_post(ctx: &AppContext, post: &Post) -> bool {
    match delete_post(ctx, post).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("onDeletePost error for post {}: {}", post.id, e);
            false
        }
    }
}

async fn delete_post(ctx: &AppContext, post: &Post) -> Result<(), AppError> {
    if post.image_url.is_some() {
        ctx.blobs.delete(&BlobHandle::new(post_image_path(&post.id))).await?;
    }

    ctx.documents.delete(&DocPath::new(POSTS_COLLECTION, post.id.clone())).await?;

    ctx.posts.update(|state| {
        state.posts.retain(|p| p.id != post.id);
        if state.selected_post.as_ref().is_some_and(|p| p.id == post.id) {
            state.selected_post = None;
        }
    });
    Ok(())
}

/// Load the signed-in user's votes for one community.
pub async fn get_community_post_votes(ctx: &AppContext, community_id: &str) -> Result<(), AppError> {
    let user = ctx.current_user().ok_or(AppError::AuthRequired)?;

    let docs = ctx
        .documents
        .query(
            &post_votes_collection(&user.uid),
            &[Filter::eq("communityId", community_id)],
            None,
        )
        .await?;
    let votes = docs
        .into_iter()
        .map(|doc| doc.into_typed::<PostVote>())
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Loaded {} votes for community {}", votes.len(), community_id);
    ctx.posts.update(|state| state.post_votes = votes);
    Ok(())
}

pub fn clear_post_votes(ctx: &AppContext) {
    ctx.posts.update(|state| state.post_votes.clear());
}

/// Load a community's posts, newest first.
pub async fn get_community_posts(ctx: &AppContext, community_id: &str) -> Result<Vec<Post>, AppError> {
    let docs = ctx
        .documents
        .query(
            POSTS_COLLECTION,
            &[Filter::eq("communityId", community_id)],
            Some(&OrderBy::desc("createdAt")),
        )
        .await?;
    let posts = docs
        .into_iter()
        .map(|doc| doc.into_typed::<Post>())
        .collect::<Result<Vec<_>, _>>()?;

    ctx.posts.update(|state| state.posts = posts.clone());
    Ok(posts)
}
