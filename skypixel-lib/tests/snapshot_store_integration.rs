//! Integration tests for the snapshot store against a mocked upstream

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use core::time::Duration;
use skypixel_lib::snapshots::normalize::NO_DESCRIPTION;
use skypixel_lib::snapshots::upstream::Endpoints;
use skypixel_lib::snapshots::{CacheStore, CatalogOrigin, EntryState, RepoKey, Role, StoreSettings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn days_ago(days: i64) -> String {
    (Utc::now() - ChronoDuration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn key(text: &str) -> RepoKey {
    text.parse().expect("valid repository key")
}

fn settings_for(server: &MockServer, owner: &str, creator: &str) -> StoreSettings {
    let mut settings = StoreSettings::new(owner, creator);
    settings.endpoints = Endpoints::new(server.uri(), server.uri());
    settings.request_timeout = Duration::from_secs(5);
    settings.social_previews = false;
    settings
}

async fn mount_release(server: &MockServer, repo: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{repo}/releases/latest")))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_release_versions_are_cached() {
    let mock_server = MockServer::start().await;

    mount_release(
        &mock_server,
        "skypixel/nebula-engine",
        ResponseTemplate::new(200).set_body_string(r#"{"tag_name": "v2.1.0", "name": "Spring"}"#),
        1,
    )
    .await;
    mount_release(&mock_server, "skypixel/pixel-forge", ResponseTemplate::new(404), 1).await;
    mount_release(&mock_server, "skypixel/secret", ResponseTemplate::new(403), 1).await;

    let mut settings = settings_for(&mock_server, "skypixel", "skypixel");
    settings.tracked_releases = vec![key("skypixel/nebula-engine"), key("skypixel/pixel-forge"), key("skypixel/secret")];
    let store = CacheStore::new(settings).unwrap();

    for _ in 0..3 {
        let releases = store.releases(false).await;
        assert_eq!(releases.len(), 3);
        assert_eq!(releases[&key("skypixel/nebula-engine")].as_deref(), Some("v2.1.0"));
        assert_eq!(releases[&key("skypixel/pixel-forge")], None);
        assert_eq!(releases[&key("skypixel/secret")], None);
    }
}

#[tokio::test]
async fn test_release_server_error_is_not_cached() {
    let mock_server = MockServer::start().await;
    mount_release(&mock_server, "skypixel/flaky", ResponseTemplate::new(500), 2).await;

    let store = CacheStore::new(settings_for(&mock_server, "skypixel", "skypixel")).unwrap();
    let repo = key("skypixel/flaky");

    assert_eq!(store.latest_release(&repo, false).await, None);
    assert_eq!(store.latest_release(&repo, false).await, None);
}

#[tokio::test]
async fn test_forced_release_refresh_picks_up_new_version() {
    let mock_server = MockServer::start().await;
    let repo = key("skypixel/nebula-engine");

    Mock::given(method("GET"))
        .and(path("/repos/skypixel/nebula-engine/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"tag_name": "v1.0.0"}"#))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_release(
        &mock_server,
        "skypixel/nebula-engine",
        ResponseTemplate::new(200).set_body_string(r#"{"tag_name": "v1.1.0"}"#),
        1,
    )
    .await;

    let store = CacheStore::new(settings_for(&mock_server, "skypixel", "skypixel")).unwrap();

    assert_eq!(store.latest_release(&repo, false).await.as_deref(), Some("v1.0.0"));
    assert_eq!(store.latest_release(&repo, false).await.as_deref(), Some("v1.0.0"));
    assert_eq!(store.latest_release(&repo, true).await.as_deref(), Some("v1.1.0"));
}

#[tokio::test]
async fn test_projects_from_api() {
    let mock_server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "id": 1, "name": "nebula-engine", "full_name": "skypixel/nebula-engine",
            "description": "Renderer", "html_url": "https://example.com/skypixel/nebula-engine",
            "language": "Rust", "stargazers_count": 120, "forks_count": 4,
            "pushed_at": days_ago(2), "topics": ["rust", "rust", "graphics"]
        },
        {
            "id": 2, "name": "pixel-forge", "full_name": "skypixel/pixel-forge",
            "description": null, "html_url": "https://example.com/skypixel/pixel-forge",
            "language": null, "stargazers_count": 10, "pushed_at": days_ago(5)
        },
        {
            "id": 3, "name": "tokio", "full_name": "skypixel/tokio", "fork": true,
            "stargazers_count": 9000, "pushed_at": days_ago(1)
        },
        {
            "id": 4, "name": "old-site", "full_name": "skypixel/old-site",
            "stargazers_count": 50, "pushed_at": days_ago(400)
        },
        {
            "id": 5, "name": "sketches", "full_name": "skypixel/sketches",
            "stargazers_count": 1, "pushed_at": days_ago(3)
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/users/skypixel/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/skypixel/nebula-engine"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<meta property="og:image" content="https://images.example/nebula.png">"#),
        )
        .mount(&mock_server)
        .await;

    let mut settings = settings_for(&mock_server, "skypixel", "skypixel");
    settings.social_previews = true;
    let store = CacheStore::new(settings).unwrap();

    let catalog = store.projects(false).await;
    assert_eq!(catalog.origin, CatalogOrigin::Api);

    let names: Vec<_> = catalog.repositories.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["nebula-engine", "pixel-forge", "old-site", "sketches"]);

    let engine = &catalog.repositories[0];
    assert_eq!(engine.image_url, "https://images.example/nebula.png");
    assert_eq!(engine.topics, ["rust", "graphics"]);

    // no preview page for this one, so the constructed preview url is used
    let forge = &catalog.repositories[1];
    assert_eq!(forge.description, NO_DESCRIPTION);
    assert_eq!(forge.image_url, "https://opengraph.githubassets.com/1/skypixel/pixel-forge");

    let popular: Vec<_> = catalog.categories.popular.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(popular, ["nebula-engine", "pixel-forge"]);

    let new_releases: Vec<_> = catalog.categories.new_releases.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(new_releases, ["sketches"]);

    let archived: Vec<_> = catalog.categories.archived.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(archived, ["old-site"]);

    // served from the cache
    let again = store.projects(false).await;
    assert_eq!(again.repositories.len(), 4);
}

#[tokio::test]
async fn test_projects_fall_back_to_listing_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/skypixel/repos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let listing = r#"
        <li itemprop="owns">
          <a href="/skypixel/nebula-engine" itemprop="name codeRepository">nebula-engine</a>
          <p itemprop="description">Renderer</p>
          <span itemprop="programmingLanguage">Rust</span>
          <a href="/skypixel/nebula-engine/stargazers"><svg></svg> 1,234</a>
          <relative-time datetime="2024-05-01T10:00:00Z">May 1</relative-time>
        </li>
        <li itemprop="owns">
          <a href="/skypixel/tokio" itemprop="name codeRepository">tokio</a>
          Forked from <a href="/tokio-rs/tokio">tokio-rs/tokio</a>
        </li>
    "#;

    Mock::given(method("GET"))
        .and(path("/skypixel"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = CacheStore::new(settings_for(&mock_server, "skypixel", "skypixel")).unwrap();
    let catalog = store.projects(false).await;

    assert_eq!(catalog.origin, CatalogOrigin::Html);
    assert_eq!(catalog.repositories.len(), 1);

    let engine = &catalog.repositories[0];
    assert_eq!(engine.name, "nebula-engine");
    assert_eq!(engine.stars, 1234);
    assert_eq!(engine.language, "Rust");
    assert_eq!(engine.html_url, format!("{}/skypixel/nebula-engine", mock_server.uri()));
}

#[tokio::test]
async fn test_projects_unavailable_yields_empty_catalog() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let store = CacheStore::new(settings_for(&mock_server, "skypixel", "skypixel")).unwrap();
    let catalog = store.projects(false).await;

    assert!(catalog.repositories.is_empty());
    assert_eq!(catalog.origin, CatalogOrigin::Unavailable);
    assert!(catalog.categories.popular.is_empty());
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_team_roster() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/skypixel/nebula-engine/graphs/contributors",
        r#"<a data-hovercard-type="user" href="/grace">Grace</a>
           <a data-hovercard-type="user" href="/Ada">Ada</a>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/skypixel/pixel-forge/graphs/contributors",
        r#"<a data-hovercard-type="user" href="/bob">Bob</a>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/ada",
        r#"<span itemprop="name">Ada Pixel</span><div class="user-profile-bio" data-bio-text="Founder and shader wizard"></div>"#,
    )
    .await;
    mount_page(&mock_server, "/grace", r#"<span itemprop="name">Grace</span>"#).await;

    Mock::given(method("GET"))
        .and(path("/bob"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut settings = settings_for(&mock_server, "skypixel", "ada");
    settings.team_repositories = vec![key("skypixel/nebula-engine"), key("skypixel/pixel-forge")];
    let store = CacheStore::new(settings).unwrap();

    let roster = store.team(false).await;
    let logins: Vec<_> = roster.members.iter().map(|m| m.login.as_str()).collect();
    assert_eq!(logins, ["ada", "bob", "grace"]);

    let creator = roster.creator().unwrap();
    assert_eq!(creator.role, Role::Creator);
    assert_eq!(creator.name, "Ada Pixel");
    assert_eq!(creator.description, "Founder and shader wizard");

    let bob = &roster.members[1];
    assert_eq!(bob.role, Role::Contributor);
    assert_eq!(bob.name, "bob");
    assert_eq!(bob.description, Role::Contributor.default_description());
    assert_eq!(bob.profile_url, format!("{}/bob", mock_server.uri()));

    assert_eq!(roster.contributors().count(), 2);
}

#[tokio::test]
async fn test_team_without_contributor_pages_is_creator_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut settings = settings_for(&mock_server, "skypixel", "ada");
    settings.team_repositories = vec![key("skypixel/nebula-engine")];
    let store = CacheStore::new(settings).unwrap();

    let roster = store.team(false).await;
    assert_eq!(roster.members.len(), 1);

    let creator = roster.creator().unwrap();
    assert_eq!(creator.login, "ada");
    assert_eq!(creator.description, Role::Creator.default_description());
}

#[tokio::test]
async fn test_warm_up_and_states() {
    let mock_server = MockServer::start().await;

    mount_release(
        &mock_server,
        "skypixel/nebula-engine",
        ResponseTemplate::new(200).set_body_string(r#"{"tag_name": "v3.0.0"}"#),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/users/skypixel/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut settings = settings_for(&mock_server, "skypixel", "skypixel");
    settings.tracked_releases = vec![key("skypixel/nebula-engine")];
    let store = CacheStore::new(settings).unwrap();

    let before = store.states();
    assert!(before.iter().all(|(_, state)| *state == EntryState::Empty), "{before:?}");

    let handles = store.start().await;
    assert!(handles.is_empty(), "background refresh is disabled by default");
    assert!(store.start().await.is_empty());

    let after = store.states();
    assert_eq!(after.len(), 3);
    assert!(after.iter().all(|(_, state)| *state == EntryState::Fresh), "{after:?}");
    assert_eq!(store.latest_release(&key("skypixel/nebula-engine"), false).await.as_deref(), Some("v3.0.0"));
}
