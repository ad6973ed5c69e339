use std::rc::Rc;

use crate::backend::{AuthProvider, BlobStore, DocumentStore};
use crate::models::models::User;
use crate::state::{AuthModalStore, CommunityStore, PostStore};

/// Everything a client operation needs: the three hosted services and the
/// local state containers. Passed by reference to every operation.
pub struct AppContext {
    pub auth: Rc<dyn AuthProvider>,
    pub documents: Rc<dyn DocumentStore>,
    pub blobs: Rc<dyn BlobStore>,
    pub auth_modal: AuthModalStore,
    pub communities: CommunityStore,
    pub posts: PostStore,
}

impl AppContext {
    pub fn new(
        auth: Rc<dyn AuthProvider>,
        documents: Rc<dyn DocumentStore>,
        blobs: Rc<dyn BlobStore>,
    ) -> Self {
        AppContext {
            auth,
            documents,
            blobs,
            auth_modal: AuthModalStore::default(),
            communities: CommunityStore::default(),
            posts: PostStore::default(),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.auth.current_user()
    }

    /// Current user, or open the login modal and return `None`.
    pub fn require_user(&self) -> Option<User> {
        let user = self.current_user();
        if user.is_none() {
            self.auth_modal.open(crate::state::AuthView::Login);
        }
        user
    }
}
