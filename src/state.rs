//! Client-side state containers.
//!
//! Each store owns one slice of local state behind a `RefCell`. Readers take
//! a cloned snapshot; writers go through `update`, which hands out a mutable
//! borrow for the duration of a closure and never across an `.await`.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::models::models::{Community, CommunitySnippet, Post, PostVote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthView {
    #[default]
    Login,
    SignUp,
    ResetPassword,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthModalState {
    pub open: bool,
    pub view: AuthView,
}

#[derive(Debug, Default)]
pub struct AuthModalStore {
    state: RefCell<AuthModalState>,
}

impl AuthModalStore {
    pub fn get(&self) -> AuthModalState {
        self.state.borrow().clone()
    }

    pub fn open(&self, view: AuthView) {
        *self.state.borrow_mut() = AuthModalState { open: true, view };
    }

    pub fn set_view(&self, view: AuthView) {
        self.state.borrow_mut().view = view;
    }

    pub fn close(&self) {
        self.state.borrow_mut().open = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommunityState {
    pub my_snippets: Vec<CommunitySnippet>,
    pub current_community: Option<Community>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct CommunityStore {
    state: RefCell<CommunityState>,
}

impl CommunityStore {
    pub fn get(&self) -> CommunityState {
        self.state.borrow().clone()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut CommunityState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    pub fn is_joined(&self, community_id: &str) -> bool {
        self.state
            .borrow()
            .my_snippets
            .iter()
            .any(|s| s.community_id == community_id)
    }

    pub fn current_community_id(&self) -> Option<String> {
        self.state
            .borrow()
            .current_community
            .as_ref()
            .map(|c| c.id.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostState {
    pub selected_post: Option<Post>,
    pub posts: Vec<Post>,
    pub post_votes: Vec<PostVote>,
}

impl PostState {
    pub fn post(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }
}

#[derive(Debug, Default)]
pub struct PostStore {
    state: RefCell<PostState>,
    in_flight: RefCell<HashSet<String>>,
}

impl PostStore {
    pub fn get(&self) -> PostState {
        self.state.borrow().clone()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut PostState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    /// Claim the write slot for `post_id`. Returns `None` while another
    /// write for the same post is pending.
    pub fn begin_write(&self, post_id: &str) -> Option<WriteGuard<'_>> {
        if !self.in_flight.borrow_mut().insert(post_id.to_string()) {
            return None;
        }
        Some(WriteGuard { store: self, post_id: post_id.to_string() })
    }

    pub fn is_writing(&self, post_id: &str) -> bool {
        self.in_flight.borrow().contains(post_id)
    }
}

/// Releases the per-post write slot on drop.
pub struct WriteGuard<'a> {
    store: &'a PostStore,
    post_id: String,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.store.in_flight.borrow_mut().remove(&self.post_id);
    }
}
