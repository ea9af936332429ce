//! Integration tests for the catalog clients against a mocked provider.
//!
//! Every test starts its own `MockServer` and points a client at it through
//! the loopback base-URL exception.

use std::sync::Arc;
use std::time::Duration;

use marquee::catalog::{
    ListingSource, MediaType, OmdbClient, ResponseCache, TimeWindow, Title, TmdbClient,
};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cache() -> Arc<ResponseCache> {
    Arc::new(ResponseCache::new(32, Duration::from_secs(300)))
}

fn tmdb(server: &MockServer) -> TmdbClient {
    TmdbClient::new(
        reqwest::Client::new(),
        Some(SecretString::from("test-key")),
        Some(&server.uri()),
        cache(),
    )
    .unwrap()
}

fn omdb(server: &MockServer) -> OmdbClient {
    OmdbClient::new(
        reqwest::Client::new(),
        Some(SecretString::from("omdb-key")),
        Some(&server.uri()),
        cache(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_search_skips_people() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/multi"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("query", "nolan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "total_pages": 3,
            "results": [
                { "id": 27205, "media_type": "movie", "title": "Inception", "release_date": "2010-07-16" },
                { "id": 525, "media_type": "person", "name": "Christopher Nolan" },
                { "id": 1399, "media_type": "tv", "name": "Game of Thrones", "first_air_date": "2011-04-17" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = tmdb(&server).search("  nolan ", 1).await;

    let names: Vec<_> = page.titles.iter().map(Title::display_title).collect();
    assert_eq!(names, vec!["Inception", "Game of Thrones"]);
    assert_eq!(page.titles[1].media_type(), MediaType::Tv);
    assert!(page.has_more());
}

#[tokio::test]
async fn test_blank_search_does_not_hit_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = tmdb(&server).search("   ", 1).await;
    assert!(page.titles.is_empty());
}

#[tokio::test]
async fn test_trending_live_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trending/all/week"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "total_pages": 1,
            "results": [
                { "id": 1396, "media_type": "tv", "name": "Breaking Bad", "vote_average": 8.9, "vote_count": 1000 },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = tmdb(&server);
    let first = client.trending(TimeWindow::Week, 1).await;
    let second = client.trending(TimeWindow::Week, 1).await;

    assert_eq!(first.source, ListingSource::Live);
    assert_eq!(first, second);
    assert_eq!(first.page.titles[0].rating(), Some(8.9));
}

#[tokio::test]
async fn test_trending_server_error_falls_back_to_samples() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trending/all/day"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let listing = tmdb(&server).trending(TimeWindow::Day, 1).await;

    assert_eq!(listing.source, ListingSource::Sample);
    assert!(!listing.page.titles.is_empty());
    assert!(!listing.page.has_more());
}

#[tokio::test]
async fn test_discover_uses_request_media_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/tv"))
        .and(query_param("with_genres", "18"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 2,
            "total_pages": 2,
            "results": [{ "id": 66732, "name": "Stranger Things" }],
        })))
        .mount(&server)
        .await;

    let page = tmdb(&server).discover(18, MediaType::Tv, 2).await;

    assert_eq!(page.titles.len(), 1);
    assert_eq!(page.titles[0].media_type(), MediaType::Tv);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_details_reads_appended_sections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/27205"))
        .and(query_param(
            "append_to_response",
            "credits,videos,recommendations,external_ids",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 27205,
            "title": "Inception",
            "tagline": "Your mind is the scene of the crime.",
            "runtime": 148,
            "genres": [{ "id": 28, "name": "Action" }],
            "external_ids": { "imdb_id": "tt1375666" },
            "credits": { "cast": [{ "name": "Leonardo DiCaprio", "character": "Cobb" }] },
            "videos": { "results": [
                { "key": "teaser1", "site": "YouTube", "type": "Teaser" },
                { "key": "YoHD9XEInc0", "site": "YouTube", "type": "Trailer" },
            ]},
            "recommendations": { "results": [{ "id": 157336, "title": "Interstellar" }] },
        })))
        .mount(&server)
        .await;

    let details = tmdb(&server)
        .details(27205, MediaType::Movie)
        .await
        .unwrap();

    assert_eq!(details.runtime, Some(148));
    assert_eq!(details.cast[0].name, "Leonardo DiCaprio");
    assert_eq!(
        details.trailer_url().as_deref(),
        Some("https://www.youtube.com/watch?v=YoHD9XEInc0")
    );
    assert_eq!(
        details.imdb_url().as_deref(),
        Some("https://www.imdb.com/title/tt1375666/")
    );
    assert_eq!(details.recommendations[0].display_title(), "Interstellar");
}

#[tokio::test]
async fn test_details_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tv/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(tmdb(&server).details(1, MediaType::Tv).await.is_none());
}

#[tokio::test]
async fn test_omdb_ratings_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("apikey", "omdb-key"))
        .and(query_param("t", "Inception"))
        .and(query_param("y", "2010"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": "True",
            "imdbRating": "8.8",
            "imdbVotes": "2,500,000",
            "Metascore": "74",
            "Rated": "PG-13",
            "Awards": "Won 4 Oscars.",
            "Ratings": [{ "Source": "Rotten Tomatoes", "Value": "87%" }],
        })))
        .mount(&server)
        .await;

    let ratings = omdb(&server).ratings("Inception", Some(2010)).await.unwrap();

    assert_eq!(ratings.imdb_score(), Some(8.8));
    assert_eq!(ratings.rotten_tomatoes.as_deref(), Some("87%"));
    assert_eq!(ratings.metascore.as_deref(), Some("74"));
}

#[tokio::test]
async fn test_omdb_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": "False",
            "Error": "Movie not found!",
        })))
        .mount(&server)
        .await;

    assert!(omdb(&server).ratings("Nonexistent", None).await.is_none());
}
