//! End-to-end tests for the library read endpoints
//!
//! The mirror starts empty; content appears only after sync passes.

mod common;

use common::{
    music_auth_file_body, TestClient, TestServer, ALBUM_1_BROWSE_ID, ALBUM_1_TITLE,
    ARTIST_1_CHANNEL_ID, ARTIST_1_NAME, SONG_1_VIDEO_ID, SONG_2_VIDEO_ID,
};
use reqwest::StatusCode;

async fn synced_client(server: &TestServer) -> TestClient {
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let response = client.upload_music_auth(music_auth_file_body()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = client.sync_library().await;
    assert_eq!(response.status(), StatusCode::OK);
    client
}

#[tokio::test]
async fn test_empty_library_lists_no_artists() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.get_artists().await;
    assert_eq!(response.status(), StatusCode::OK);
    let artists: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(artists.is_empty());
}

#[tokio::test]
async fn test_unknown_entities_are_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    assert_eq!(
        client.get_artist("UC404").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.get_album("MPREb404").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.get_song("v404").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_get_artist_carries_discography_and_metadata() {
    let server = TestServer::spawn().await;
    let client = synced_client(&server).await;

    let response = client.get_artist(ARTIST_1_CHANNEL_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved: serde_json::Value = response.json().await.unwrap();

    assert_eq!(resolved["artist"]["name"].as_str(), Some(ARTIST_1_NAME));
    assert_eq!(
        resolved["artist"]["needs_discography"].as_bool(),
        Some(false)
    );
    let albums = resolved["albums"].as_array().unwrap();
    assert_eq!(albums.len(), 2);
    assert!(albums
        .iter()
        .any(|a| a["browse_id"].as_str() == Some(ALBUM_1_BROWSE_ID)));
}

#[tokio::test]
async fn test_resolved_album_orders_songs_by_position() {
    let server = TestServer::spawn().await;
    let client = synced_client(&server).await;
    client.sync_album(ALBUM_1_BROWSE_ID).await;

    let response = client.get_album(ALBUM_1_BROWSE_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved: serde_json::Value = response.json().await.unwrap();

    assert_eq!(resolved["album"]["title"].as_str(), Some(ALBUM_1_TITLE));
    assert_eq!(resolved["artists"].as_array().unwrap().len(), 1);

    let order: Vec<&str> = resolved["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["song"]["video_id"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec![SONG_1_VIDEO_ID, SONG_2_VIDEO_ID]);
}

#[tokio::test]
async fn test_album_before_track_sync_has_no_entries() {
    let server = TestServer::spawn().await;
    let client = synced_client(&server).await;

    let response = client.get_album(ALBUM_1_BROWSE_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved: serde_json::Value = response.json().await.unwrap();

    assert!(resolved["entries"].as_array().unwrap().is_empty());
    assert_eq!(resolved["album"]["needs_tracks"].as_bool(), Some(true));
}
