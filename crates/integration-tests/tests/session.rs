//! End-to-end tests of login, logout and profile management.

use std::sync::Arc;

use rust_decimal::Decimal;
use souk_client::models::ProfileUpdate;
use souk_client::storage::{KeyValueStore, MemoryStore, keys};
use souk_client::{ApiError, Souk, SoukConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use souk_integration_tests::{TestContext, auth_response, cart_json, sample_user};

#[tokio::test]
async fn login_stores_tokens_and_user_atomically() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(serde_json::json!({
            "email": "amina@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("at-1", "rt-1")))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let user = ctx
        .souk
        .session()
        .login("amina@example.com", "correct-horse")
        .await
        .expect("login succeeds");

    assert_eq!(user.name, "Amina El Fassi");
    assert!(ctx.souk.session().is_authenticated());
    assert_eq!(ctx.souk.session().access_token().as_deref(), Some("at-1"));
    // Durable copies exist for the next process start.
    assert_eq!(ctx.store.get(keys::ACCESS_TOKEN).as_deref(), Some("at-1"));
    assert_eq!(ctx.store.get(keys::REFRESH_TOKEN).as_deref(), Some("rt-1"));
    assert!(ctx.store.get(keys::CURRENT_USER).is_some());
}

#[tokio::test]
async fn unreachable_auth_service_surfaces_connectivity_error() {
    // No server at all: port 9 is unroutable.
    let config = SoukConfig::new("http://127.0.0.1:9".parse().expect("valid url"));
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let souk = Souk::with_store(config, store).expect("client builds");

    let result = souk.session().login("amina@example.com", "pw").await;
    assert!(matches!(result, Err(ApiError::Unreachable)));
}

#[tokio::test]
async fn register_conflict_surfaces_backend_message() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": "An account with this email already exists"
        })))
        .mount(&ctx.server)
        .await;

    let result = ctx
        .souk
        .session()
        .register("Amina", "amina@example.com", "longenough")
        .await;
    match result {
        Err(ApiError::Rejected(message)) => {
            assert_eq!(message, "An account with this email already exists");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn logout_is_optimistic_and_resets_cart_state() {
    let ctx = TestContext::authenticated("at-1").await;

    // Load a cart so there is local state to reset.
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(10.0, 2, None)))
        .mount(&ctx.server)
        .await;
    ctx.souk.cart().fetch().await.expect("cart loads");
    assert_eq!(ctx.souk.cart_state().item_count(), 2);

    // Backend revocation is slow and failing; neither matters.
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(body_partial_json(serde_json::json!({ "refreshToken": "rt-seed" })))
        .respond_with(
            ResponseTemplate::new(500).set_delay(std::time::Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.souk.session().logout();

    // Local state is already gone, before the revocation resolves.
    assert!(!ctx.souk.session().is_authenticated());
    assert!(ctx.souk.session().current_user().is_none());
    assert_eq!(ctx.souk.cart_state().item_count(), 0);
    assert!(ctx.souk.cart_state().cart().is_none());

    // Let the fire-and-forget call reach the mock so expect(1) verifies.
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
}

#[tokio::test]
async fn profile_update_refreshes_cached_user() {
    let ctx = TestContext::authenticated("at-1").await;

    let mut updated = sample_user();
    updated["name"] = serde_json::json!("Amina B.");

    Mock::given(method("PUT"))
        .and(path("/api/auth/profile"))
        .and(header("Authorization", "Bearer at-1"))
        .and(body_partial_json(serde_json::json!({ "name": "Amina B." })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let user = ctx
        .souk
        .account()
        .update_profile(&ProfileUpdate {
            name: Some("Amina B.".to_owned()),
            ..ProfileUpdate::default()
        })
        .await
        .expect("profile update");

    assert_eq!(user.name, "Amina B.");
    // The session snapshot and its durable copy follow.
    assert_eq!(
        ctx.souk.session().current_user().expect("cached user").name,
        "Amina B."
    );
    let stored = ctx.store.get(keys::CURRENT_USER).expect("stored user");
    assert!(stored.contains("Amina B."));
}

#[tokio::test]
async fn session_survives_process_restart() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("at-1", "rt-1")))
        .mount(&ctx.server)
        .await;
    ctx.souk
        .session()
        .login("amina@example.com", "correct-horse")
        .await
        .expect("login succeeds");

    let reopened = ctx.restart();
    assert!(reopened.session().is_authenticated());
    assert_eq!(reopened.session().access_token().as_deref(), Some("at-1"));
    assert_eq!(
        reopened.session().current_user().expect("hydrated user").email,
        "amina@example.com"
    );
}

#[tokio::test]
async fn promo_rejection_surfaces_backend_message_verbatim() {
    let ctx = TestContext::authenticated("at-1").await;

    Mock::given(method("POST"))
        .and(path("/api/cart/promo"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Promo code expired"
        })))
        .mount(&ctx.server)
        .await;

    let result = ctx.souk.cart().apply_promo("OLD10").await;
    match result {
        Err(ApiError::Rejected(message)) => assert_eq!(message, "Promo code expired"),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn accepted_promo_updates_the_shared_snapshot() {
    let ctx = TestContext::authenticated("at-1").await;

    Mock::given(method("POST"))
        .and(path("/api/cart/promo"))
        .and(body_partial_json(serde_json::json!({ "promoCode": "EID10" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(30.0, 1, Some(3.0))))
        .mount(&ctx.server)
        .await;

    let cart = ctx.souk.cart().apply_promo("EID10").await.expect("promo ok");
    assert_eq!(cart.discount, Some(Decimal::new(3, 0)));

    let snapshot = ctx.souk.cart_state().cart().expect("published snapshot");
    assert_eq!(snapshot.promo_code.as_deref(), Some("EID10"));
}
