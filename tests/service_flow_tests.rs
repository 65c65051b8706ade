// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Posting, favoriting, account and user-search flows.

mod common;

use common::*;
use lumigram::auth::{MemoryAccounts, SessionContext};
use lumigram::config::Config;
use lumigram::db::{DocumentStore, FeedQuery, MemoryStore};
use lumigram::error::FeedError;
use lumigram::feed::{FeedScope, SyncMode};
use lumigram::models::{NewPost, UserProfile};
use lumigram::services::{AccountService, FavoriteService, PostService, UserService};
use lumigram::storage::MemoryBlobStore;
use lumigram::AppState;
use std::sync::Arc;

fn post_service(store: &MemoryStore, blobs: &MemoryBlobStore, session: &SessionContext) -> PostService {
    PostService::new(
        Arc::new(store.clone()),
        Arc::new(blobs.clone()),
        session.clone(),
    )
}

fn jpeg(caption: &str) -> NewPost {
    NewPost::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0], caption)
}

// ═══════════════════════════════════════════════════════════════════════════
// ADD POST
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_publish_uploads_then_creates_post() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    let posts = post_service(&store, &blobs, &signed_in());

    let item = posts.publish(jpeg("golden hour")).await.unwrap();

    assert_eq!(item.author_id, TEST_UID);
    assert_eq!(item.caption, "golden hour");

    let paths = blobs.paths();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].starts_with(&format!("posts/{}_", TEST_UID)));
    assert!(paths[0].ends_with(".jpg"));
    assert_eq!(item.image_url, format!("memory://{}", paths[0]));

    let stored = store.fetch_first_page(&FeedQuery::home(PAGE_SIZE)).await.unwrap();
    assert_eq!(stored, vec![item]);
}

#[tokio::test]
async fn test_publish_signed_out_requires_auth() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    let posts = post_service(&store, &blobs, &SessionContext::signed_out());

    let err = posts.publish(jpeg("nope")).await.unwrap_err();
    assert_eq!(err, FeedError::AuthRequired);
    assert_eq!(err.notice().title, "Not signed in");
    assert!(blobs.paths().is_empty());
}

#[tokio::test]
async fn test_publish_without_image_is_invalid() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    let posts = post_service(&store, &blobs, &signed_in());

    let err = posts
        .publish(NewPost::jpeg(Vec::new(), "no picture"))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Invalid(_)));
    assert!(!err.is_retryable());
    assert!(blobs.paths().is_empty());
}

#[tokio::test]
async fn test_publish_rejects_long_caption() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    let posts = post_service(&store, &blobs, &signed_in());

    let err = posts.publish(jpeg(&"x".repeat(2201))).await.unwrap_err();
    assert!(matches!(err, FeedError::Invalid(_)));
    assert!(blobs.paths().is_empty());
}

#[tokio::test]
async fn test_upload_failure_creates_no_post() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    blobs.set_failing(true);
    let session = signed_in();
    let posts = post_service(&store, &blobs, &session);
    let feed = feed(&store, &session, FeedScope::Home, SyncMode::Polled);
    feed.activate().await.unwrap();

    let err = posts.publish_into(jpeg("lost"), &feed).await.unwrap_err();
    assert!(matches!(err, FeedError::UploadFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(err.notice().title, "Upload failed");

    assert!(feed.view().items.is_empty());
    let stored = store.fetch_first_page(&FeedQuery::home(PAGE_SIZE)).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_document_failure_after_upload_is_upload_failed() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    let posts = post_service(&store, &blobs, &signed_in());

    store.set_offline(true);
    let err = posts.publish(jpeg("half done")).await.unwrap_err();
    assert!(matches!(err, FeedError::UploadFailed(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// FAVORITES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_favorites_feed_lists_my_favorites_newest_first() {
    let store = seeded_store(6);
    let session = signed_in();
    let favorites = FavoriteService::new(Arc::new(store.clone()), session.clone());
    let home = feed(&store, &session, FeedScope::Home, SyncMode::Polled);
    home.activate().await.unwrap();

    let posts = home.view().items;
    let first = favorites.favorite(&posts[3]).await.unwrap();
    let second = favorites.favorite(&posts[1]).await.unwrap();

    let feed = feed(&store, &session, FeedScope::Favorites, SyncMode::Polled);
    feed.activate().await.unwrap();
    let view = feed.view();

    assert_eq!(ids(&view), vec![second.id.clone(), first.id.clone()]);
    assert_eq!(view.items[0].image_url, posts[1].image_url);
    assert_eq!(view.items[0].author_id, posts[1].author_id);
    assert!(view.exhausted);
}

#[tokio::test]
async fn test_favorites_are_per_user() {
    let store = seeded_store(3);
    let mine = signed_in();
    let theirs = SessionContext::signed_in(lumigram::models::AuthUser::local("uid-other"));

    let post = store
        .fetch_first_page(&FeedQuery::home(PAGE_SIZE))
        .await
        .unwrap()
        .remove(0);
    FavoriteService::new(Arc::new(store.clone()), theirs)
        .favorite(&post)
        .await
        .unwrap();

    let feed = feed(&store, &mine, FeedScope::Favorites, SyncMode::Live);
    feed.activate().await.unwrap();
    assert!(feed.view().items.is_empty());
}

#[tokio::test]
async fn test_live_favorites_feed_sees_new_favorite() {
    let store = seeded_store(3);
    let session = signed_in();
    let feed = feed(&store, &session, FeedScope::Favorites, SyncMode::Live);
    let mut rx = feed.watch();
    feed.activate().await.unwrap();

    let post = store
        .fetch_first_page(&FeedQuery::home(PAGE_SIZE))
        .await
        .unwrap()
        .remove(0);
    let favorite = FavoriteService::new(Arc::new(store.clone()), session)
        .favorite(&post)
        .await
        .unwrap();

    let view = wait_for_view(&mut rx, |v| v.items.len() == 1).await;
    assert_eq!(view.items[0].id, favorite.id);
}

#[tokio::test]
async fn test_favorite_signed_out_requires_auth() {
    let store = seeded_store(1);
    let post = store
        .fetch_first_page(&FeedQuery::home(PAGE_SIZE))
        .await
        .unwrap()
        .remove(0);

    let err = FavoriteService::new(Arc::new(store.clone()), SessionContext::signed_out())
        .favorite(&post)
        .await
        .unwrap_err();
    assert_eq!(err, FeedError::AuthRequired);
}

// ═══════════════════════════════════════════════════════════════════════════
// USERS AND ACCOUNTS
// ═══════════════════════════════════════════════════════════════════════════

async fn seed_users(store: &MemoryStore) {
    for (id, username) in [("u1", "atlas-lumi"), ("u2", "Lumina"), ("u3", "bob")] {
        store
            .put_user(&UserProfile {
                id: id.to_string(),
                username: username.to_string(),
                avatar_url: None,
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_user_search_is_case_insensitive_substring() {
    let store = MemoryStore::new();
    seed_users(&store).await;
    let users = UserService::new(Arc::new(store.clone()), signed_in(), 200);

    let found: Vec<String> = users
        .search("LUMI")
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(found, vec!["atlas-lumi", "Lumina"]);

    assert_eq!(users.search("").await.unwrap().len(), 3);
    assert!(users.search("zed").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_search_offline_is_transient() {
    let store = MemoryStore::new();
    let users = UserService::new(Arc::new(store.clone()), signed_in(), 200);
    store.set_offline(true);

    let err = users.search("a").await.unwrap_err();
    assert!(matches!(err, FeedError::Transient(_)));
}

#[tokio::test]
async fn test_save_profile_validates_username() {
    let store = MemoryStore::new();
    let users = UserService::new(Arc::new(store.clone()), signed_in(), 200);

    let err = users.save_profile(&"n".repeat(31), None).await.unwrap_err();
    assert!(matches!(err, FeedError::Invalid(_)));

    let saved = users
        .save_profile(" atlas ", Some("https://img.example/a.jpg".to_string()))
        .await
        .unwrap();
    assert_eq!(saved.username, "atlas");
    assert_eq!(users.profile(TEST_UID).await.unwrap(), Some(saved));
}

#[tokio::test]
async fn test_register_sign_out_sign_in() {
    let store = MemoryStore::new();
    let session = SessionContext::signed_out();
    let accounts = AccountService::new(
        Arc::new(MemoryAccounts::new()),
        UserService::new(Arc::new(store.clone()), session.clone(), 200),
        session.clone(),
    );

    let user = accounts
        .register("lumi@example.com", "hunter22", "lumi")
        .await
        .unwrap();
    assert_eq!(session.current(), Some(user.clone()));

    let profile = store.get_user(&user.uid).await.unwrap().unwrap();
    assert_eq!(profile.username, "lumi");

    accounts.sign_out();
    assert!(session.current().is_none());

    let err = accounts
        .sign_in("lumi@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Invalid(_)));
    assert!(session.current().is_none());

    let again = accounts
        .sign_in("lumi@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(again.uid, user.uid);
    assert!(session.current().is_some());
}

#[tokio::test]
async fn test_register_rejects_bad_input_before_sign_up() {
    let session = SessionContext::signed_out();
    let backend = MemoryAccounts::new();
    let accounts = AccountService::new(
        Arc::new(backend.clone()),
        UserService::new(Arc::new(MemoryStore::new()), session.clone(), 200),
        session.clone(),
    );

    let err = accounts.register("", "pw", "name").await.unwrap_err();
    assert!(matches!(err, FeedError::Invalid(_)));

    let err = accounts
        .register("a@example.com", "pw", &"n".repeat(40))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Invalid(_)));
    assert!(session.current().is_none());

    // The address is still free.
    accounts
        .register("a@example.com", "pw", "ok")
        .await
        .unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// APP STATE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_offline_app_end_to_end() {
    let state = AppState::offline(Config::default());
    let accounts = state.account_service();
    accounts
        .register("lumi@example.com", "hunter22", "lumi")
        .await
        .unwrap();

    let home = state.home_feed();
    home.activate().await.unwrap();
    assert!(home.view().items.is_empty());

    let item = state
        .post_service()
        .publish_into(jpeg("first!"), &home)
        .await
        .unwrap();
    assert_eq!(home.view().items[0].id, item.id);

    state.favorite_service().favorite(&item).await.unwrap();
    let favorites = state.favorites_feed();
    favorites.activate().await.unwrap();
    assert_eq!(favorites.view().items.len(), 1);

    let uid = state.session.current().unwrap().uid;
    let profile = state.profile_feed(&uid);
    profile.activate().await.unwrap();
    assert_eq!(profile.view().items[0].id, item.id);

    let found = state.user_service().search("LU").await.unwrap();
    assert_eq!(found.len(), 1);
}
