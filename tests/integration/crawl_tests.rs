//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for profile mirrors and run the
//! full fetch, archive, ledger, and export cycle end-to-end.

use followings_archiver::config::{Config, CrawlerConfig, MirrorConfig, PathsConfig};
use followings_archiver::crawler::{Coordinator, RunMode, RunOutcome};
use followings_archiver::images::{ImageArchiver, ImageKind};
use followings_archiver::ledger::{source_now, JsonlLedger, Ledger};
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing every file into `dir`
fn create_test_config(dir: &TempDir, mirrors: Vec<String>, retry_rounds: u32) -> Config {
    let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
    Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 2,
            connect_timeout_secs: 1,
            retry_rounds,
            retry_backoff_ms: 0,
            pause_min_ms: 0,
            pause_max_ms: 0,
        },
        mirrors: MirrorConfig {
            hosts: mirrors,
            profile_path: "/i/user/{id}".to_string(),
        },
        paths: PathsConfig {
            source: path("following.js"),
            ledger: path("logs/success.jsonl"),
            images: path("images"),
            export: path("output/cosense_followings.json"),
        },
        ..Config::default()
    }
}

/// Writes an account archive listing `ids` in order
fn write_source(config: &Config, ids: &[&str]) {
    let entries: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{"following":{{"accountId":"{}","userLink":"https://twitter.com/intent/user?user_id={}"}}}}"#,
                id, id
            )
        })
        .collect();
    let content = format!("window.YTD.following.part0 = [{}]", entries.join(","));
    std::fs::write(&config.paths.source, content).unwrap();
}

/// A mirror profile page with an avatar proxied through `/pic/`
fn profile_page(screen_name: &str, avatar_file: &str) -> String {
    format!(
        r#"<html><body><div class="profile-card">
<a class="profile-card-avatar"><img src="/pic/pbs.twimg.com%2Fprofile_images%2F1%2F{avatar}_normal.jpg"></a>
<a class="profile-card-fullname">{sn} name</a>
<a class="profile-card-username">@{sn}</a>
<div class="profile-bio"><p>bio of {sn}</p></div>
</div></body></html>"#,
        sn = screen_name,
        avatar = avatar_file
    )
}

async fn mount_profile(server: &MockServer, id: &str, screen_name: &str, avatar_file: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/i/user/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile_page(screen_name, avatar_file)))
        .mount(server)
        .await;
}

async fn mount_images(server: &MockServer, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path_regex("^/pic/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

fn ledger_lines(config: &Config) -> usize {
    std::fs::read_to_string(&config.paths.ledger)
        .map(|content| content.lines().count())
        .unwrap_or(0)
}

fn history_len(config: &Config, account_id: &str, kind: ImageKind) -> usize {
    let archiver = ImageArchiver::new(&config.paths.images);
    std::fs::read_dir(archiver.history_dir(account_id, kind))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_full_crawl_and_export() {
    let mock_server = MockServer::start().await;
    mount_profile(&mock_server, "1", "alice", "alice").await;
    mount_profile(&mock_server, "2", "bob", "bob").await;
    mount_images(&mock_server, b"jpeg-bytes").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);
    write_source(&config, &["1", "2"]);

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = match coordinator.run(RunMode::Normal).await.unwrap() {
        RunOutcome::Crawled(report) => report,
        other => panic!("unexpected outcome: {:?}", other),
    };

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.images_stored, 2);
    assert_eq!(report.exported_pages, Some(2));
    assert_eq!(ledger_lines(&config), 2);

    let images = Path::new(&config.paths.images);
    assert_eq!(std::fs::read(images.join("1/profile.jpg")).unwrap(), b"jpeg-bytes");
    assert!(images.join("2/profile.jpg").exists());
    assert_eq!(
        std::fs::read_to_string(images.join("1/profile.url")).unwrap().trim(),
        "https://pbs.twimg.com/profile_images/1/alice_400x400.jpg"
    );

    let export: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.paths.export).unwrap()).unwrap();
    assert_eq!(export["pages"][0]["title"], "@alice");
    assert_eq!(export["pages"][1]["title"], "@bob");
    assert_eq!(export["pages"][0]["lines"][5], "Bio: bio of alice");

    // A second run finds nothing pending
    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = match coordinator.run(RunMode::Normal).await.unwrap() {
        RunOutcome::Crawled(report) => report,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(report.skipped, 2);
    assert_eq!(report.attempted(), 0);
    assert_eq!(ledger_lines(&config), 2);
}

#[tokio::test]
async fn test_failover_to_next_mirror() {
    let failing = MockServer::start().await;
    let healthy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/i/user/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&failing)
        .await;
    mount_profile(&healthy, "1", "alice", "alice").await;
    mount_images(&healthy, b"img").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![failing.uri(), healthy.uri()], 1);

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator
        .crawl(RunMode::Normal, &["1".to_string()])
        .await
        .unwrap();
    assert_eq!(report.succeeded, 1);

    let latest = coordinator.ledger().replay_latest().unwrap();
    let record = latest.get("1").unwrap();
    assert_eq!(record.fetched_from, healthy.uri());
    assert_eq!(record.screen_name, "alice");
}

#[tokio::test]
async fn test_invalid_body_counts_as_mirror_failure() {
    let interstitial = MockServer::start().await;
    let healthy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/i/user/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Verifying your browser</html>"))
        .expect(1)
        .mount(&interstitial)
        .await;
    mount_profile(&healthy, "1", "alice", "alice").await;
    mount_images(&healthy, b"img").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![interstitial.uri(), healthy.uri()], 1);

    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator
        .crawl(RunMode::Normal, &["1".to_string()])
        .await
        .unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(
        coordinator.ledger().replay_latest().unwrap().get("1").unwrap().fetched_from,
        healthy.uri()
    );
}

#[tokio::test]
async fn test_retry_rounds_are_bounded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i/user/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 3);

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator
        .crawl(RunMode::Normal, &["1".to_string()])
        .await
        .unwrap();

    assert_eq!(report.fetch_failed, 1);
    assert_eq!(report.succeeded, 0);
    assert_eq!(ledger_lines(&config), 0);
}

#[tokio::test]
async fn test_unparseable_profile_is_not_ledgered() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i/user/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div class="profile-card"><p>suspended</p></div>"#),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator
        .crawl(RunMode::Normal, &["1".to_string()])
        .await
        .unwrap();

    assert_eq!(report.parse_failed, 1);
    assert_eq!(ledger_lines(&config), 0);
}

#[tokio::test]
async fn test_resume_fetches_only_missing_accounts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i/user/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile_page("alice", "alice")))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_profile(&mock_server, "2", "bob", "bob").await;
    mount_images(&mock_server, b"img").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);
    write_source(&config, &["1", "2"]);

    // Account 1 was finished by an earlier, interrupted run
    let mut ledger = JsonlLedger::new(&config.paths.ledger);
    let earlier = followings_archiver::ledger::ProfileRecord {
        account_id: "1".to_string(),
        screen_name: "alice".to_string(),
        name: None,
        bio: None,
        location: None,
        joined: None,
        profile_image_url: None,
        banner_image_url: None,
        profile_image_mirror_url: None,
        banner_image_mirror_url: None,
        fetched_at: source_now(),
        fetched_from: mock_server.uri(),
    };
    ledger.append(&earlier).unwrap();

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let accounts = vec!["1".to_string(), "2".to_string()];
    assert_eq!(
        coordinator.pending_accounts(RunMode::Resume, &accounts).unwrap(),
        vec!["2".to_string()]
    );

    let report = match coordinator.run(RunMode::Resume).await.unwrap() {
        RunOutcome::Crawled(report) => report,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(report.skipped, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(ledger_lines(&config), 2);
    assert_eq!(
        ledger.load().unwrap(),
        ["1", "2"]
            .iter()
            .map(|s| s.to_string())
            .collect::<HashSet<String>>()
    );
}

#[tokio::test]
async fn test_force_refetches_and_keeps_unchanged_images() {
    let mock_server = MockServer::start().await;
    mount_profile(&mock_server, "1", "alice", "alice").await;
    mount_images(&mock_server, b"img").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);
    let accounts = vec!["1".to_string()];

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.crawl(RunMode::Normal, &accounts).await.unwrap();
    let report = coordinator.crawl(RunMode::Force, &accounts).await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.images_stored, 0);
    assert_eq!(report.images_unchanged, 1);
    assert_eq!(ledger_lines(&config), 2);
    assert_eq!(history_len(&config, "1", ImageKind::Profile), 1);
}

#[tokio::test]
async fn test_known_image_url_is_not_downloaded() {
    let mock_server = MockServer::start().await;
    mount_profile(&mock_server, "1", "alice", "alice").await;
    Mock::given(method("GET"))
        .and(path_regex("^/pic/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);

    let archiver = ImageArchiver::new(&config.paths.images);
    archiver
        .store(
            "1",
            ImageKind::Profile,
            "https://pbs.twimg.com/profile_images/1/alice_400x400.jpg",
            b"old",
            source_now(),
        )
        .unwrap();

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator
        .crawl(RunMode::Normal, &["1".to_string()])
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.images_unchanged, 1);
    assert_eq!(report.images_stored, 0);
    assert_eq!(history_len(&config, "1", ImageKind::Profile), 1);
}

#[tokio::test]
async fn test_changed_image_adds_history_entry() {
    let mock_server = MockServer::start().await;
    mount_profile(&mock_server, "1", "alice", "first").await;
    mount_images(&mock_server, b"first-bytes").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);
    let accounts = vec!["1".to_string()];

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.crawl(RunMode::Normal, &accounts).await.unwrap();

    mock_server.reset().await;
    mount_profile(&mock_server, "1", "alice", "second").await;
    mount_images(&mock_server, b"second-bytes").await;

    let report = coordinator.crawl(RunMode::Force, &accounts).await.unwrap();
    assert_eq!(report.images_stored, 1);
    assert_eq!(history_len(&config, "1", ImageKind::Profile), 2);

    let alias = coordinator
        .archiver()
        .latest_alias("1", ImageKind::Profile)
        .unwrap();
    assert_eq!(std::fs::read(alias).unwrap(), b"second-bytes");
    assert_eq!(
        coordinator
            .archiver()
            .last_known_url("1", ImageKind::Profile)
            .as_deref(),
        Some("https://pbs.twimg.com/profile_images/1/second_400x400.jpg")
    );
}

#[tokio::test]
async fn test_failed_download_is_retried_next_run() {
    let mock_server = MockServer::start().await;
    mount_profile(&mock_server, "1", "alice", "alice").await;
    Mock::given(method("GET"))
        .and(path_regex("^/pic/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);
    let accounts = vec!["1".to_string()];

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator.crawl(RunMode::Normal, &accounts).await.unwrap();

    // The profile itself succeeded; only the image is missing
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.image_failures, 1);
    assert!(coordinator
        .archiver()
        .last_known_url("1", ImageKind::Profile)
        .is_none());

    mock_server.reset().await;
    mount_profile(&mock_server, "1", "alice", "alice").await;
    mount_images(&mock_server, b"img").await;

    let report = coordinator.crawl(RunMode::Force, &accounts).await.unwrap();
    assert_eq!(report.images_stored, 1);
    assert!(coordinator
        .archiver()
        .last_known_url("1", ImageKind::Profile)
        .is_some());
}

#[tokio::test]
async fn test_single_mode_does_not_export() {
    let mock_server = MockServer::start().await;
    mount_profile(&mock_server, "1", "alice", "alice").await;
    mount_images(&mock_server, b"img").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mock_server.uri()], 1);
    write_source(&config, &["1"]);

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let result = match coordinator.run(RunMode::Single).await.unwrap() {
        RunOutcome::Single(result) => result.unwrap(),
        other => panic!("unexpected outcome: {:?}", other),
    };

    assert_eq!(result.account_id, "1");
    assert_eq!(result.record.unwrap().screen_name, "alice");
    assert_eq!(ledger_lines(&config), 1);
    assert!(!Path::new(&config.paths.export).exists());
}

#[tokio::test]
async fn test_start_mirror_rotates_per_account() {
    let mirror_a = MockServer::start().await;
    let mirror_b = MockServer::start().await;
    for server in [&mirror_a, &mirror_b] {
        mount_profile(server, "1", "alice", "alice").await;
        mount_profile(server, "2", "bob", "bob").await;
        mount_images(server, b"img").await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![mirror_a.uri(), mirror_b.uri()], 1);

    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator
        .crawl(RunMode::Normal, &["1".to_string(), "2".to_string()])
        .await
        .unwrap();
    assert_eq!(report.succeeded, 2);

    let latest = coordinator.ledger().replay_latest().unwrap();
    assert_eq!(latest.get("1").unwrap().fetched_from, mirror_a.uri());
    assert_eq!(latest.get("2").unwrap().fetched_from, mirror_b.uri());
}
