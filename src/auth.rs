use crate::common::errors::AuthError;
use crate::communities::sync_session;
use crate::context::AppContext;
use crate::models::models::User;

/// User-facing messages for auth provider error codes.
pub const AUTH_ERRORS: &[(&str, &str)] = &[
    ("auth/email-already-in-use", "A user with that email already exists"),
    ("auth/user-not-found", "Invalid email or password"),
    ("auth/wrong-password", "Invalid email or password"),
    ("auth/invalid-email", "Please enter a valid email"),
    ("auth/weak-password", "Password should be at least 6 characters"),
];

pub fn auth_error_message(code: &str) -> Option<&'static str> {
    AUTH_ERRORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, message)| *message)
}

fn describe(error: &AuthError) -> String {
    auth_error_message(error.code())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub loading: bool,
    pub error: Option<String>,
}

/// After a successful sign-in: close the modal and load per-user data.
async fn on_signed_in(ctx: &AppContext, user: &User) {
    ctx.auth_modal.close();
    if let Err(e) = sync_session(ctx).await {
        log::error!("Failed to load data for user {}: {}", user.uid, e);
    }
}

impl SignUpForm {
    pub async fn submit(&mut self, ctx: &AppContext) -> Option<User> {
        self.error = None;
        if self.password != self.confirm_password {
            self.error = Some("Passwords do not match".to_string());
            return None;
        }

        self.loading = true;
        let result = ctx.auth.sign_up(&self.email, &self.password).await;
        self.loading = false;

        match result {
            Ok(user) => {
                log::info!("Signed up user {}", user.uid);
                on_signed_in(ctx, &user).await;
                Some(user)
            }
            Err(e) => {
                log::debug!("Sign up failed: {}", e);
                self.error = Some(describe(&e));
                None
            }
        }
    }
}

impl LoginForm {
    pub async fn submit(&mut self, ctx: &AppContext) -> Option<User> {
        self.error = None;

        self.loading = true;
        let result = ctx.auth.sign_in(&self.email, &self.password).await;
        self.loading = false;

        match result {
            Ok(user) => {
                on_signed_in(ctx, &user).await;
                Some(user)
            }
            Err(e) => {
                log::debug!("Login failed: {}", e);
                self.error = Some(describe(&e));
                None
            }
        }
    }
}

/// Sign out and drop everything tied to the previous user.
pub async fn logout(ctx: &AppContext) -> Result<(), AuthError> {
    ctx.auth.sign_out().await?;
    if let Err(e) = sync_session(ctx).await {
        log::error!("Failed to clear session data: {}", e);
    }
    Ok(())
}
