use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub email: String,
}

impl User {
    /// Name shown on posts: the part of the email before `@`.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyType {
    #[default]
    Public,
    Restricted,
    Private,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: String,
    pub creator_id: String,
    pub number_of_members: i64,
    #[serde(default)]
    pub privacy_type: PrivacyType,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySnippet {
    pub community_id: String,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_moderator: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub community_id: String,
    #[serde(rename = "communityImageURL", default)]
    pub community_image_url: String,
    pub creator_id: String,
    pub creator_display_name: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub number_of_comments: i64,
    pub vote_status: i64,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostVote {
    pub id: String,
    pub post_id: String,
    pub community_id: String,
    pub vote_value: i64,
}
