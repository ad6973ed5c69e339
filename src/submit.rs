use serde_json::Value;

use crate::backend::{to_document, BlobHandle, DocPath, FieldUpdate, Snapshot};
use crate::common::data_url::DataUrl;
use crate::common::errors::{AppError, BackendError};
use crate::common::helpers::{new_id, now_iso, sanitize_body, sanitize_text};
use crate::config::{post_image_path, MAX_BODY_LENGTH, MAX_TITLE_LENGTH, POSTS_COLLECTION};
use crate::context::AppContext;
use crate::models::models::{Post, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Title,
    Body,
}

/// Draft state of the new-post form.
///
/// The draft's post id is fixed when the form is created, so submitting the
/// same draft twice writes the same document.
#[derive(Debug, Clone)]
pub struct NewPostForm {
    post_id: String,
    pub title: String,
    pub body: String,
    pub selected_file: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for NewPostForm {
    fn default() -> Self {
        Self::new()
    }
}

impl NewPostForm {
    pub fn new() -> Self {
        NewPostForm {
            post_id: new_id(),
            title: String::new(),
            body: String::new(),
            selected_file: None,
            loading: false,
            error: None,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn on_text_change(&mut self, field: PostField, value: &str) {
        match field {
            PostField::Title => self.title = value.to_string(),
            PostField::Body => self.body = value.to_string(),
        }
    }

    /// Attach an image given as a data URL. Non-image payloads are refused.
    pub fn select_file(&mut self, data_url: &str) -> Result<(), AppError> {
        let parsed = DataUrl::parse(data_url)?;
        if !parsed.is_image() {
            return Err(AppError::Validation(format!(
                "Unsupported file type {}",
                parsed.content_type
            )));
        }
        self.selected_file = Some(data_url.to_string());
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.selected_file = None;
    }

    fn validate(&self) -> Result<(), AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(AppError::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if self.body.chars().count() > MAX_BODY_LENGTH {
            return Err(AppError::Validation(format!(
                "Body must be at most {} characters",
                MAX_BODY_LENGTH
            )));
        }
        Ok(())
    }

    fn build_post(&self, user: &User, community_id: &str, community_image_url: Option<&str>) -> Post {
        Post {
            id: self.post_id.clone(),
            community_id: community_id.to_string(),
            community_image_url: community_image_url.unwrap_or_default().to_string(),
            creator_id: user.uid.clone(),
            creator_display_name: user.display_name().to_string(),
            title: sanitize_text(self.title.trim()),
            body: sanitize_body(&self.body),
            image_url: None,
            number_of_comments: 0,
            vote_status: 0,
            created_at: now_iso(),
        }
    }

    /// Create the post, then upload its image if one is attached. If the
    /// image step fails, the uploaded image and the post document are removed
    /// again, or the previously published post is written back, and the
    /// error is reported.
    pub async fn submit(
        &mut self,
        ctx: &AppContext,
        community_id: &str,
        community_image_url: Option<&str>,
    ) -> Result<Post, AppError> {
        let user = ctx.require_user().ok_or(AppError::AuthRequired)?;
        self.error = None;
        if let Err(e) = self.validate() {
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.loading = true;
        let result = self.create(ctx, &user, community_id, community_image_url).await;
        self.loading = false;

        match result {
            Ok(post) => {
                log::info!("Created post {} in {}", post.id, community_id);
                Ok(post)
            }
            Err(e) => {
                log::error!("handleCreatePost error: {}", e);
                self.error = Some("Error creating post".to_string());
                Err(e)
            }
        }
    }

    async fn create(
        &self,
        ctx: &AppContext,
        user: &User,
        community_id: &str,
        community_image_url: Option<&str>,
    ) -> Result<Post, AppError> {
        let mut post = self.build_post(user, community_id, community_image_url);
        let path = DocPath::new(POSTS_COLLECTION, post.id.clone());
        // A resubmitted draft may already be published; keep that copy so a
        // failed image step can put it back instead of deleting it.
        let published = ctx.documents.get(&path).await?;
        ctx.documents.set(&path, to_document(&post)?).await?;

        let data_url = match &self.selected_file {
            Some(data_url) => data_url,
            None => return Ok(post),
        };

        let handle = BlobHandle::new(post_image_path(&post.id));
        match attach_image(ctx, &path, &handle, data_url).await {
            Ok(url) => {
                post.image_url = Some(url);
                Ok(post)
            }
            Err(e) => {
                match published {
                    Some(snapshot) => restore_post(ctx, snapshot, &handle).await,
                    None => discard_post(ctx, &path, &handle).await,
                }
                Err(e.into())
            }
        }
    }
}

async fn attach_image(
    ctx: &AppContext,
    path: &DocPath,
    handle: &BlobHandle,
    data_url: &str,
) -> Result<String, BackendError> {
    let uploaded = ctx.blobs.upload_data_url(&handle.path, data_url).await?;
    let url = ctx.blobs.download_url(&uploaded).await?;
    ctx.documents
        .update(path, vec![("imageURL".to_string(), FieldUpdate::Set(Value::String(url.clone())))])
        .await?;
    Ok(url)
}

/// Compensate a half-finished first submission. Cleanup failures are only
/// logged.
async fn discard_post(ctx: &AppContext, path: &DocPath, handle: &BlobHandle) {
    match ctx.blobs.delete(handle).await {
        Ok(()) | Err(BackendError::NotFound(_)) => {}
        Err(e) => log::warn!("Failed to remove image {}: {}", handle.path, e),
    }
    if let Err(e) = ctx.documents.delete(path).await {
        log::warn!("Failed to remove post {}: {}", path, e);
    }
}

/// Compensate a failed resubmission: write back the published document. Its
/// image is only removed when the published post had none.
async fn restore_post(ctx: &AppContext, published: Snapshot, handle: &BlobHandle) {
    if !published.data.contains_key("imageURL") {
        match ctx.blobs.delete(handle).await {
            Ok(()) | Err(BackendError::NotFound(_)) => {}
            Err(e) => log::warn!("Failed to remove image {}: {}", handle.path, e),
        }
    }
    if let Err(e) = ctx.documents.set(&published.path, published.data).await {
        log::error!("Failed to restore post {}: {}", published.path, e);
    }
}
