mod common;

use bordit::auth::{auth_error_message, logout, LoginForm, SignUpForm};
use bordit::backend::AuthProvider;
use bordit::communities::on_join_or_leave;
use bordit::state::AuthView;
use common::harness;

fn sign_up_form(email: &str, password: &str, confirm: &str) -> SignUpForm {
    SignUpForm {
        email: email.to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_password_mismatch_never_reaches_provider() {
    let h = harness();
    let mut form = sign_up_form("alice@example.com", "secret123", "secret124");

    assert!(form.submit(&h.ctx).await.is_none());
    assert_eq!(form.error.as_deref(), Some("Passwords do not match"));
    assert!(h.ctx.current_user().is_none());

    // No account was created
    let err = h.auth.sign_in("alice@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.code(), "auth/user-not-found");
}

#[tokio::test]
async fn test_sign_up_closes_modal_and_signs_in() {
    let h = harness();
    h.ctx.auth_modal.open(AuthView::SignUp);
    let mut form = sign_up_form("Alice@Example.com", "secret123", "secret123");

    let user = form.submit(&h.ctx).await.expect("sign up should succeed");

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.display_name(), "alice");
    assert!(form.error.is_none());
    assert!(!h.ctx.auth_modal.get().open);
    assert_eq!(h.ctx.current_user(), Some(user));
}

#[tokio::test]
async fn test_provider_errors_map_to_messages() {
    let h = harness();
    let mut first = sign_up_form("bob@example.com", "secret123", "secret123");
    first.submit(&h.ctx).await.unwrap();

    // 1. Duplicate email
    let mut duplicate = sign_up_form("bob@example.com", "secret123", "secret123");
    assert!(duplicate.submit(&h.ctx).await.is_none());
    assert_eq!(duplicate.error.as_deref(), Some("A user with that email already exists"));

    // 2. Weak password
    let mut weak = sign_up_form("carol@example.com", "abc", "abc");
    assert!(weak.submit(&h.ctx).await.is_none());
    assert_eq!(weak.error.as_deref(), Some("Password should be at least 6 characters"));

    // 3. Wrong password on login
    let mut login = LoginForm {
        email: "bob@example.com".to_string(),
        password: "nope-nope".to_string(),
        ..Default::default()
    };
    assert!(login.submit(&h.ctx).await.is_none());
    assert_eq!(login.error.as_deref(), Some("Invalid email or password"));

    // 4. Correct password
    login.password = "secret123".to_string();
    assert!(login.submit(&h.ctx).await.is_some());
    assert!(login.error.is_none());
}

#[tokio::test]
async fn test_provider_outage_falls_back_to_raw_error() {
    let h = harness();
    h.auth.set_offline(true);
    let mut login = LoginForm {
        email: "dave@example.com".to_string(),
        password: "secret123".to_string(),
        ..Default::default()
    };

    assert!(login.submit(&h.ctx).await.is_none());
    assert_eq!(
        login.error.as_deref(),
        Some("Auth provider unavailable: auth provider is offline")
    );
}

#[tokio::test]
async fn test_logout_clears_user_state() {
    let h = harness();
    h.sign_in("alice");
    let community = h.seed_community("rust", 4);
    on_join_or_leave(&h.ctx, &community, false).await;
    assert!(h.ctx.communities.is_joined("rust"));

    logout(&h.ctx).await.unwrap();

    assert!(h.ctx.current_user().is_none());
    assert!(!h.ctx.communities.is_joined("rust"));
    assert!(h.ctx.posts.get().post_votes.is_empty());
}

#[test]
fn test_error_table_lookup() {
    assert_eq!(
        auth_error_message("auth/email-already-in-use"),
        Some("A user with that email already exists")
    );
    assert_eq!(auth_error_message("auth/user-not-found"), Some("Invalid email or password"));
    assert_eq!(auth_error_message("auth/wrong-password"), Some("Invalid email or password"));
    assert_eq!(auth_error_message("auth/unknown"), None);
}

#[test]
fn test_modal_views() {
    let h = harness();
    assert!(!h.ctx.auth_modal.get().open);

    h.ctx.auth_modal.open(AuthView::Login);
    h.ctx.auth_modal.set_view(AuthView::ResetPassword);
    let modal = h.ctx.auth_modal.get();
    assert!(modal.open);
    assert_eq!(modal.view, AuthView::ResetPassword);

    h.ctx.auth_modal.close();
    assert!(!h.ctx.auth_modal.get().open);
}
