#![allow(dead_code)]

use std::rc::Rc;

use bordit::backend::memory::{MemoryAuth, MemoryBlobStore, MemoryDocumentStore};
use bordit::backend::{to_document, DocPath};
use bordit::config::{COMMUNITIES_COLLECTION, POSTS_COLLECTION};
use bordit::context::AppContext;
use bordit::models::models::{Community, Post, PrivacyType, User};

pub struct Harness {
    pub ctx: AppContext,
    pub auth: Rc<MemoryAuth>,
    pub docs: Rc<MemoryDocumentStore>,
    pub blobs: Rc<MemoryBlobStore>,
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn harness() -> Harness {
    init_logging();
    let auth = Rc::new(MemoryAuth::new());
    let docs = Rc::new(MemoryDocumentStore::new());
    let blobs = Rc::new(MemoryBlobStore::new());
    let ctx = AppContext::new(auth.clone(), docs.clone(), blobs.clone());
    Harness { ctx, auth, docs, blobs }
}

pub fn user(name: &str) -> User {
    User {
        uid: format!("uid-{}", name),
        email: format!("{}@example.com", name),
    }
}

impl Harness {
    pub fn sign_in(&self, name: &str) -> User {
        let user = user(name);
        self.auth.set_current_user(Some(user.clone()));
        user
    }

    /// Store a post in the backend and in the local post list.
    pub fn seed_post(&self, id: &str, community_id: &str, vote_status: i64) -> Post {
        let post = Post {
            id: id.to_string(),
            community_id: community_id.to_string(),
            community_image_url: String::new(),
            creator_id: "uid-author".to_string(),
            creator_display_name: "author".to_string(),
            title: format!("Post {}", id),
            body: "Body text".to_string(),
            image_url: None,
            number_of_comments: 0,
            vote_status,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        };
        self.docs.insert(
            &DocPath::new(POSTS_COLLECTION, id),
            to_document(&post).unwrap(),
        );
        self.ctx.posts.update(|state| state.posts.push(post.clone()));
        post
    }

    pub fn seed_community(&self, id: &str, members: i64) -> Community {
        let community = Community {
            id: id.to_string(),
            creator_id: "uid-founder".to_string(),
            number_of_members: members,
            privacy_type: PrivacyType::Public,
            image_url: Some(format!("https://img.example.com/{}.png", id)),
            created_at: Some("2024-01-01T00:00:00+00:00".to_string()),
        };
        self.docs.insert(
            &DocPath::new(COMMUNITIES_COLLECTION, id),
            to_document(&community).unwrap(),
        );
        community
    }

    pub fn stored_vote_status(&self, post_id: &str) -> i64 {
        self.docs
            .peek(&DocPath::new(POSTS_COLLECTION, post_id))
            .and_then(|doc| doc.get("voteStatus").and_then(|v| v.as_i64()))
            .expect("post document should exist")
    }

    pub fn stored_members(&self, community_id: &str) -> i64 {
        self.docs
            .peek(&DocPath::new(COMMUNITIES_COLLECTION, community_id))
            .and_then(|doc| doc.get("numberOfMembers").and_then(|v| v.as_i64()))
            .expect("community document should exist")
    }
}
