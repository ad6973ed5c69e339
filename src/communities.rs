use crate::backend::{to_document, DocPath, WriteBatch};
use crate::common::errors::AppError;
use crate::common::route::parse_route;
use crate::config::{snippets_collection, COMMUNITIES_COLLECTION};
use crate::context::AppContext;
use crate::models::models::{Community, CommunitySnippet, User};
use crate::posts::{clear_post_votes, get_community_post_votes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipResult {
    Joined,
    Left,
    /// Nobody is signed in; the login modal was opened.
    AuthRequired,
    /// The batch failed and local state was left as it was.
    Failed,
}

fn snippet_path(user: &User, community_id: &str) -> DocPath {
    DocPath::new(snippets_collection(&user.uid), community_id)
}

fn community_path(community_id: &str) -> DocPath {
    DocPath::new(COMMUNITIES_COLLECTION, community_id)
}

/// Bump the locally mirrored member count of the current community.
fn adjust_member_count(ctx: &AppContext, community_id: &str, by: i64) {
    ctx.communities.update(|state| {
        if let Some(current) = state.current_community.as_mut().filter(|c| c.id == community_id) {
            current.number_of_members += by;
        }
    });
}

pub async fn on_join_or_leave(ctx: &AppContext, community: &Community, is_joined: bool) -> MembershipResult {
    let user = match ctx.require_user() {
        Some(user) => user,
        None => return MembershipResult::AuthRequired,
    };

    let result = if is_joined {
        leave_community(ctx, &user, &community.id).await.map(|_| MembershipResult::Left)
    } else {
        join_community(ctx, &user, community).await.map(|_| MembershipResult::Joined)
    };

    result.unwrap_or_else(|e| {
        ctx.communities.update(|state| state.error = Some(e.to_string()));
        MembershipResult::Failed
    })
}

pub async fn join_community(ctx: &AppContext, user: &User, community: &Community) -> Result<(), AppError> {
    log::info!("Joining community {}", community.id);
    let snippet = CommunitySnippet {
        community_id: community.id.clone(),
        image_url: community.image_url.clone().unwrap_or_default(),
        is_moderator: (community.creator_id == user.uid).then_some(true),
    };

    let mut batch = WriteBatch::new();
    batch.set(snippet_path(user, &community.id), to_document(&snippet)?);
    batch.increment(community_path(&community.id), "numberOfMembers", 1);

    ctx.communities.update(|state| {
        state.loading = true;
        state.error = None;
    });
    let committed = ctx.documents.commit(batch).await;
    ctx.communities.update(|state| state.loading = false);
    if let Err(e) = committed {
        log::error!("joinCommunity error: {}", e);
        return Err(e.into());
    }

    ctx.communities.update(|state| {
        state.my_snippets.retain(|s| s.community_id != snippet.community_id);
        state.my_snippets.push(snippet);
    });
    adjust_member_count(ctx, &community.id, 1);
    Ok(())
}

pub async fn leave_community(ctx: &AppContext, user: &User, community_id: &str) -> Result<(), AppError> {
    log::info!("Leaving community {}", community_id);
    ctx.communities.update(|state| {
        state.loading = true;
        state.error = None;
    });

    let mut batch = WriteBatch::new();
    batch.delete(snippet_path(user, community_id));
    batch.increment(community_path(community_id), "numberOfMembers", -1);

    let committed = ctx.documents.commit(batch).await;
    ctx.communities.update(|state| state.loading = false);
    if let Err(e) = committed {
        log::error!("leaveCommunity error: {}", e);
        return Err(e.into());
    }

    ctx.communities.update(|state| {
        state.my_snippets.retain(|s| s.community_id != community_id);
    });
    adjust_member_count(ctx, community_id, -1);
    Ok(())
}

/// Load the signed-in user's community snippets.
pub async fn get_my_snippets(ctx: &AppContext) -> Result<(), AppError> {
    let user = ctx.current_user().ok_or(AppError::AuthRequired)?;
    ctx.communities.update(|state| state.loading = true);

    let loaded = match ctx.documents.query(&snippets_collection(&user.uid), &[], None).await {
        Ok(docs) => docs
            .into_iter()
            .map(|doc| doc.into_typed::<CommunitySnippet>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::from),
        Err(e) => Err(e.into()),
    };

    ctx.communities.update(|state| {
        state.loading = false;
        match &loaded {
            Ok(snippets) => state.my_snippets = snippets.clone(),
            Err(e) => {
                log::error!("getMySnippets error: {}", e);
                state.error = Some(e.to_string());
            }
        }
    });
    loaded.map(|_| ())
}

pub fn clear_my_snippets(ctx: &AppContext) {
    ctx.communities.update(|state| state.my_snippets.clear());
}

/// Load one community into `current_community`. A missing community clears it.
pub async fn get_community_data(ctx: &AppContext, community_id: &str) -> Result<Option<Community>, AppError> {
    let community = match ctx.documents.get(&community_path(community_id)).await? {
        Some(snapshot) => Some(snapshot.into_typed::<Community>()?),
        None => None,
    };
    ctx.communities.update(|state| state.current_community = community.clone());
    Ok(community)
}

/// React to a session change: load or clear everything tied to the user.
pub async fn sync_session(ctx: &AppContext) -> Result<(), AppError> {
    if ctx.current_user().is_none() {
        clear_my_snippets(ctx);
        clear_post_votes(ctx);
        return Ok(());
    }

    get_my_snippets(ctx).await?;
    if let Some(community_id) = ctx.communities.current_community_id() {
        get_community_post_votes(ctx, &community_id).await?;
    }
    Ok(())
}

/// React to navigation. Community data and the user's votes for it are only
/// reloaded when the path names a different community than the current one.
pub async fn on_route_change(ctx: &AppContext, path: &str) -> Result<(), AppError> {
    let route = parse_route(path);
    let community_id = match route.community_id() {
        Some(id) => id,
        None => return Ok(()),
    };
    if ctx.communities.current_community_id().as_deref() == Some(community_id) {
        return Ok(());
    }

    log::debug!("Route changed to community {}", community_id);
    if get_community_data(ctx, community_id).await?.is_some() && ctx.current_user().is_some() {
        get_community_post_votes(ctx, community_id).await?;
    }
    Ok(())
}
