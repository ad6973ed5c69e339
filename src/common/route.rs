use std::borrow::Cow;

/// Where the client currently is, as far as data loading cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Community { community_id: String },
    Submit { community_id: String },
    Post { community_id: String, post_id: String },
    Other,
}

impl Route {
    pub fn community_id(&self) -> Option<&str> {
        match self {
            Route::Community { community_id }
            | Route::Submit { community_id }
            | Route::Post { community_id, .. } => Some(community_id),
            Route::Home | Route::Other => None,
        }
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .unwrap_or(Cow::Borrowed(segment))
        .to_string()
}

/// Parse a client path such as `/r/rust/comments/abc?sort=new`.
///
/// Query strings and fragments are ignored, segments are percent-decoded.
pub fn parse_route(path: &str) -> Route {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => Route::Home,
        ["r", community] => Route::Community { community_id: decode(community) },
        ["r", community, "submit"] => Route::Submit { community_id: decode(community) },
        ["r", community, "comments", post, ..] => Route::Post {
            community_id: decode(community),
            post_id: decode(post),
        },
        _ => Route::Other,
    }
}
