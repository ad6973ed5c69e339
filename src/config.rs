pub const POSTS_COLLECTION: &str = "posts";
pub const COMMUNITIES_COLLECTION: &str = "communities";

pub const MAX_TITLE_LENGTH: usize = 300;
pub const MAX_BODY_LENGTH: usize = 5000;
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const BLOB_ROUTE_PREFIX: &str = "/blobs/";

pub fn kv_store_label() -> String {
    std::env::var("BORDIT_KV_STORE").unwrap_or_else(|_| "default".to_string())
}

/// Base URL prepended to blob download links. Empty means links are
/// relative to the component's own origin.
pub fn public_base_url() -> String {
    std::env::var("BORDIT_PUBLIC_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_default()
}

pub fn snippets_collection(user_id: &str) -> String {
    format!("users/{}/communitySnippets", user_id)
}

pub fn post_votes_collection(user_id: &str) -> String {
    format!("users/{}/postVotes", user_id)
}

pub fn post_image_path(post_id: &str) -> String {
    format!("posts/{}/image", post_id)
}

pub fn post_route(community_id: &str, post_id: &str) -> String {
    format!("/r/{}/comments/{}", community_id, post_id)
}
