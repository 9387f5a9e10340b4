// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the plugin manager.

use cadenza_core::types::TopListItem;
use cadenza_core::{
    CadenzaError, Capability, ClickBehavior, PluginState, PluginStateCode, play_from_list,
};
use cadenza_plugin::{PluginManager, ResolveAction};
use cadenza_test_utils::{MockQueue, PluginFixture, QueueCall, TestEnv};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn manager(env: &TestEnv) -> PluginManager {
    PluginManager::new(env.config()).await.unwrap()
}

fn sorted_names(m: &PluginManager) -> Vec<String> {
    m.sorted_plugins().iter().map(|p| p.name.clone()).collect()
}

fn stored_files(env: &TestEnv) -> usize {
    std::fs::read_dir(env.plugin_dir())
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "wat" || x == "wasm"))
        .count()
}

async fn serve(server: &MockServer, at: &str, fixture: &PluginFixture) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture.to_wat()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn installing_same_file_twice_is_idempotent() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.write_source("demo.wat", &PluginFixture::new("demo").version("1.0.0"));

    let first = m.install_plugin(&src).await.unwrap();
    let second = m.install_plugin(&src).await.unwrap();

    assert_eq!(first.action, ResolveAction::Install);
    assert_eq!(second.action, ResolveAction::Unchanged);
    assert_eq!(first.hash, second.hash);
    assert_eq!(m.sorted_plugins().len(), 1);
    assert_eq!(stored_files(&env), 1);

    let plugin = m.plugin(&first.hash).unwrap();
    assert_eq!(plugin.state, PluginState::Enabled);
    assert_eq!(plugin.state_code, PluginStateCode::Ok);
    assert!(plugin.path.starts_with(env.plugin_dir()));
}

#[tokio::test]
async fn concurrent_installs_of_same_content_converge() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.write_source("demo.wat", &PluginFixture::new("demo"));

    let (a, b) = tokio::join!(m.install_plugin(&src), m.install_plugin(&src));
    let mut actions = vec![a.unwrap().action, b.unwrap().action];
    actions.sort_by_key(|a| a.to_string());
    assert_eq!(actions, vec![ResolveAction::Install, ResolveAction::Unchanged]);
    assert_eq!(m.sorted_plugins().len(), 1);
}

#[tokio::test]
async fn local_install_requires_known_extension() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.write_source("demo.js", &PluginFixture::new("demo"));

    let err = m.install_plugin(&src).await.unwrap_err();
    assert!(matches!(err, CadenzaError::Fetch { .. }));
    assert!(m.sorted_plugins().is_empty());
}

#[tokio::test]
async fn trapping_plugin_is_rejected_without_side_effects() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let good = env.write_source("good.wat", &PluginFixture::new("good"));
    m.install_plugin(&good).await.unwrap();

    let bad = env.write_source("bad.wat", &PluginFixture::new("bad").trapping());
    let err = m.install_plugin(&bad).await.unwrap_err();

    assert_eq!(err.state_code(), Some(PluginStateCode::CannotParse));
    assert_eq!(sorted_names(&m), vec!["good"]);
    assert_eq!(stored_files(&env), 1);
}

#[tokio::test]
async fn incompatible_plugin_is_rejected() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.write_source("future.wat", &PluginFixture::new("future").app_version(">=99.0.0"));

    let err = m.install_plugin(&src).await.unwrap_err();
    assert_eq!(err.state_code(), Some(PluginStateCode::VersionNotMatch));
    assert!(m.sorted_plugins().is_empty());
}

#[tokio::test]
async fn update_replaces_in_place_and_keeps_order() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    for name in ["a", "b", "c"] {
        let src = env.write_source(&format!("{name}.wat"), &PluginFixture::new(name).version("1.0.0"));
        m.install_plugin(&src).await.unwrap();
    }
    let old = m.sorted_plugins()[1].clone();

    let v2 = env.write_source("b2.wat", &PluginFixture::new("b").version("1.1.0"));
    let outcome = m.install_plugin(&v2).await.unwrap();

    assert_eq!(
        outcome.action,
        ResolveAction::Update {
            replaces: old.hash.clone()
        }
    );
    assert_eq!(sorted_names(&m), vec!["a", "b", "c"]);
    assert_eq!(m.registry().snapshot()[1].hash, outcome.hash);
    assert_eq!(m.plugin(&outcome.hash).unwrap().version(), Some("1.1.0"));
    assert!(m.plugin(&old.hash).is_none());
    assert!(!old.path.exists());
    assert_eq!(stored_files(&env), 3);
}

#[tokio::test]
async fn older_version_is_refused() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let v2 = env.write_source("v2.wat", &PluginFixture::new("demo").version("2.0.0"));
    let v1 = env.write_source("v1.wat", &PluginFixture::new("demo").version("1.0.0"));
    m.install_plugin(&v2).await.unwrap();

    let err = m.install_plugin(&v1).await.unwrap_err();
    assert!(matches!(err, CadenzaError::NewerVersionInstalled { .. }));
    assert_eq!(m.sorted_plugins()[0].version(), Some("2.0.0"));
}

#[tokio::test]
async fn uninstall_leaves_others_and_keeps_name_order() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let mut hashes = Vec::new();
    for name in ["a", "b", "c"] {
        let src = env.write_source(&format!("{name}.wat"), &PluginFixture::new(name));
        hashes.push(m.install_plugin(&src).await.unwrap().hash);
    }
    m.reorder(&["c", "b", "a"]).await.unwrap();

    m.uninstall_plugin(&hashes[1]).await.unwrap();
    assert_eq!(sorted_names(&m), vec!["c", "a"]);
    assert_eq!(stored_files(&env), 2);
    assert_eq!(m.registry().meta().order_of("b"), Some(1));

    let b = env.write_source("b.wat", &PluginFixture::new("b"));
    m.install_plugin(&b).await.unwrap();
    assert_eq!(sorted_names(&m), vec!["c", "b", "a"]);

    let err = m.uninstall_plugin("not-a-hash").await.unwrap_err();
    assert!(matches!(err, CadenzaError::PluginNotFound { .. }));
}

#[tokio::test]
async fn uninstall_all_clears_files_and_metadata() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    for name in ["a", "b"] {
        let src = env.write_source(&format!("{name}.wat"), &PluginFixture::new(name));
        m.install_plugin(&src).await.unwrap();
    }

    m.uninstall_all_plugins().await.unwrap();
    assert!(m.sorted_plugins().is_empty());
    assert!(m.registry().meta().is_empty());
    assert_eq!(stored_files(&env), 0);
}

#[tokio::test]
async fn new_names_are_appended_after_ordered_ones() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    for name in ["a", "b"] {
        let src = env.write_source(&format!("{name}.wat"), &PluginFixture::new(name));
        m.install_plugin(&src).await.unwrap();
    }
    m.reorder(&["b", "a"]).await.unwrap();
    let c = env.write_source("c.wat", &PluginFixture::new("c"));
    m.install_plugin(&c).await.unwrap();

    assert_eq!(sorted_names(&m), vec!["b", "a", "c"]);
    assert_eq!(m.registry().meta().order_of("c"), Some(2));
}

#[tokio::test]
async fn order_and_error_entries_survive_restart() {
    let env = TestEnv::new();
    {
        let m = manager(&env).await;
        for name in ["a", "b", "c"] {
            let src = env.write_source(&format!("{name}.wat"), &PluginFixture::new(name));
            m.install_plugin(&src).await.unwrap();
        }
        m.reorder(&["c", "a", "b"]).await.unwrap();
    }
    std::fs::write(env.plugin_dir().join("broken.wasm"), b"garbage").unwrap();
    PluginFixture::new("future")
        .app_version(">=99")
        .write_wat(&env.plugin_dir(), "future.wat");

    let m = manager(&env).await;
    assert_eq!(m.load_installed().await.unwrap(), 5);
    let names = sorted_names(&m);
    assert_eq!(&names[..3], &["c", "a", "b"]);

    let broken = m.sorted_plugins().into_iter().find(|p| p.name == "broken").unwrap();
    assert_eq!(broken.state, PluginState::Error);
    assert_eq!(broken.state_code, PluginStateCode::CannotParse);
    assert!(broken.instance.is_none());

    let future = m.sorted_plugins().into_iter().find(|p| p.name == "future").unwrap();
    assert_eq!(future.state_code, PluginStateCode::VersionNotMatch);

    m.uninstall_plugin(&broken.hash).await.unwrap();
    assert!(!env.plugin_dir().join("broken.wasm").exists());
}

#[tokio::test]
async fn url_install_records_source_and_updates() {
    let server = MockServer::start().await;
    let v1 = PluginFixture::new("remote").version("1.0.0");
    let v2 = PluginFixture::new("remote").version("1.1.0");
    Mock::given(method("GET"))
        .and(path("/remote.wat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(v1.to_wat()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve(&server, "/remote.wat", &v2).await;

    let env = TestEnv::new();
    let m = manager(&env).await;
    let url = format!("{}/remote.wat", server.uri());

    let installed = m.install_plugin_from_url(&url).await.unwrap();
    let plugin = m.plugin(&installed.hash).unwrap();
    assert_eq!(plugin.src_url(), Some(url.as_str()));

    let updated = m.update_plugin(&installed.hash).await.unwrap();
    assert!(matches!(updated.action, ResolveAction::Update { .. }));
    assert_eq!(m.sorted_plugins().len(), 1);
    assert_eq!(m.sorted_plugins()[0].version(), Some("1.1.0"));
}

#[tokio::test]
async fn plugin_without_source_url_is_not_updatable() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.write_source("local.wat", &PluginFixture::new("local"));
    let outcome = m.install_plugin(&src).await.unwrap();

    let err = m.update_plugin(&outcome.hash).await.unwrap_err();
    assert!(matches!(err, CadenzaError::NotUpdatable { .. }));
}

#[tokio::test]
async fn subscription_reports_partial_failure() {
    let server = MockServer::start().await;
    for name in ["one", "two", "three"] {
        serve(&server, &format!("/{name}.wat"), &PluginFixture::new(name)).await;
    }
    let manifest = serde_json::json!({
        "plugins": [
            { "url": format!("{}/one.wat", server.uri()) },
            { "url": format!("{}/missing.wat", server.uri()) },
            { "version": "1.0" },
            { "url": format!("{}/two.wat", server.uri()) },
            { "url": format!("{}/three.wat", server.uri()) },
        ]
    });
    Mock::given(method("GET"))
        .and(path("/plugins.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest))
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let m = manager(&env).await;
    let err = m
        .install_from_subscription(&format!("{}/plugins.json", server.uri()))
        .await
        .unwrap_err();

    match err {
        CadenzaError::AggregateInstall { failures, total } => {
            assert_eq!(total, 4);
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("missing.wat"));
        }
        other => panic!("expected AggregateInstall, got {other:?}"),
    }
    assert_eq!(m.sorted_plugins().len(), 3);
}

#[tokio::test]
async fn subscription_success_is_repeatable() {
    let server = MockServer::start().await;
    for name in ["one", "two"] {
        serve(&server, &format!("/{name}.wat"), &PluginFixture::new(name)).await;
    }
    let urls = [
        format!("{}/two.wat", server.uri()),
        format!("{}/one.wat", server.uri()),
    ];
    Mock::given(method("GET"))
        .and(path("/plugins.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "plugins": [{ "url": urls[0] }, { "url": urls[1] }]
        })))
        .mount(&server)
        .await;

    let mut env = TestEnv::new();
    env.config_mut().plugin.subscribe_url = Some(format!("{}/plugins.json", server.uri()));
    let m = manager(&env).await;

    let report = m.sync_subscription().await.unwrap();
    let reported: Vec<&str> = report.entries.iter().map(|(u, _)| u.as_str()).collect();
    assert_eq!(reported, vec![urls[0].as_str(), urls[1].as_str()]);
    assert!(report.outcomes().all(|o| o.action == ResolveAction::Install));

    let again = m.sync_subscription().await.unwrap();
    assert_eq!(again.len(), 2);
    assert!(again.outcomes().all(|o| o.action == ResolveAction::Unchanged));
}

#[tokio::test]
async fn sync_without_subscription_is_a_config_error() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let err = m.sync_subscription().await.unwrap_err();
    assert!(matches!(err, CadenzaError::Config(_)));
}

#[tokio::test]
async fn watchers_see_every_mutation() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let mut rx = m.subscribe();
    let src = env.write_source("demo.wat", &PluginFixture::new("demo"));

    let outcome = m.install_plugin(&src).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    m.uninstall_plugin(&outcome.hash).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn absent_capabilities_return_empty() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.write_source("bare.wat", &PluginFixture::new("bare"));
    let outcome = m.install_plugin(&src).await.unwrap();
    let plugin = m.plugin(&outcome.hash).unwrap();

    assert!(plugin.capabilities().is_empty());
    assert!(plugin.methods.import_music_item("x").await.unwrap().is_none());
    assert!(plugin.methods.get_top_lists().await.unwrap().is_empty());
    let page = plugin.methods.search("q", 1, "music").await.unwrap();
    assert!(page.is_end && page.data.is_empty());
}

#[tokio::test]
async fn returned_items_are_claimed_by_the_plugin() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let fixture = PluginFixture::new("source-a")
        .with_capability(
            Capability::Search,
            r#"{"isEnd":false,"data":[{"id":"1","platform":"spoof","title":"T","artist":"A","album":"B","lyricId":"L"}]}"#,
        )
        .with_capability(
            Capability::GetTopListDetail,
            r#"{"topListItem":{"id":"chart","platform":"spoof"},"musicList":[{"id":"2","platform":"spoof"}]}"#,
        )
        .with_trapping_capability(Capability::GetTopLists);
    let src = env.write_source("a.wat", &fixture);
    let outcome = m.install_plugin(&src).await.unwrap();
    let plugin = m.plugin(&outcome.hash).unwrap();

    let page = plugin.methods.search("q", 1, "music").await.unwrap();
    assert!(!page.is_end);
    assert_eq!(page.data[0].platform, "source-a");
    assert_eq!(page.data[0].extra["lyricId"], "L");

    let chart = TopListItem {
        id: "chart".into(),
        platform: "source-a".into(),
        title: String::new(),
        description: None,
        cover_img: None,
    };
    let detail = plugin.methods.get_top_list_detail(&chart).await.unwrap().unwrap();
    assert_eq!(detail.top_list_item.platform, "source-a");
    assert_eq!(detail.music_list[0].platform, "source-a");

    let err = plugin.methods.get_top_lists().await.unwrap_err();
    assert!(matches!(err, CadenzaError::Plugin { plugin, .. } if plugin == "source-a"));
}

#[tokio::test]
async fn imports_follow_display_order() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let first = PluginFixture::new("first")
        .with_capability(Capability::ImportMusicItem, r#"{"id":"from-first"}"#)
        .with_capability(Capability::ImportMusicSheet, "[]");
    let second = PluginFixture::new("second")
        .with_capability(Capability::ImportMusicItem, r#"{"id":"from-second"}"#)
        .with_capability(Capability::ImportMusicSheet, r#"[{"id":"s1"},{"id":"s2"}]"#);
    m.install_plugin(env.write_source("first.wat", &first)).await.unwrap();
    m.install_plugin(env.write_source("second.wat", &second)).await.unwrap();

    let item = m.import_music_item("link").await.unwrap().unwrap();
    assert_eq!(item.id, "from-first");

    m.reorder(&["second", "first"]).await.unwrap();
    let item = m.import_music_item("link").await.unwrap().unwrap();
    assert_eq!((item.id.as_str(), item.platform.as_str()), ("from-second", "second"));

    // "first" answers with an empty sheet, so "second" wins regardless of order.
    m.reorder(&["first", "second"]).await.unwrap();
    let sheet = m.import_music_sheet("link").await.unwrap();
    assert_eq!(sheet.len(), 2);

    let queue = MockQueue::new();
    play_from_list(&queue, ClickBehavior::PlayAlbum, sheet[1].clone(), sheet.clone())
        .await
        .unwrap();
    assert_eq!(
        queue.calls().await,
        vec![QueueCall::ReplaceQueue {
            item: sheet[1].clone(),
            list: sheet
        }]
    );
}

#[tokio::test]
async fn import_error_surfaces_only_when_nobody_succeeds() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let broken = PluginFixture::new("broken").with_trapping_capability(Capability::ImportMusicItem);
    let empty = PluginFixture::new("empty").with_capability(Capability::ImportMusicItem, "null");
    m.install_plugin(env.write_source("broken.wat", &broken)).await.unwrap();
    m.install_plugin(env.write_source("empty.wat", &empty)).await.unwrap();

    let err = m.import_music_item("link").await.unwrap_err();
    assert!(matches!(err, CadenzaError::Plugin { plugin, .. } if plugin == "broken"));

    let good = PluginFixture::new("good").with_capability(Capability::ImportMusicItem, r#"{"id":"ok"}"#);
    m.install_plugin(env.write_source("good.wat", &good)).await.unwrap();
    let item = m.import_music_item("link").await.unwrap().unwrap();
    assert_eq!(item.id, "ok");
}

fn http_plugin_wat(url: &str) -> String {
    format!(
        r#"(module
  (import "cadenza" "set_output" (func $set (param i32 i32)))
  (import "cadenza" "http_get" (func $get (param i32 i32) (result i32)))
  (import "cadenza" "get_response_len" (func $rlen (result i32)))
  (import "cadenza" "get_response" (func $resp (param i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "{{\22name\22:\22net\22}}")
  (data (i32.const 1024) "{url}")
  (func (export "plugin_info") (call $set (i32.const 0) (i32.const 14)))
  (func (export "import_music_item")
    (local $n i32)
    (drop (call $get (i32.const 1024) (i32.const {len})))
    (local.set $n (call $rlen))
    (call $resp (i32.const 4096))
    (call $set (i32.const 4096) (local.get $n))))
"#,
        len = url.len()
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn plugins_reach_the_network_through_http_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/track/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"7","title":"Seven"}"#))
        .mount(&server)
        .await;
    let url = format!("{}/track/7", server.uri());

    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.root().join("sources").join("net.wat");
    std::fs::write(&src, http_plugin_wat(&url)).unwrap();
    m.install_plugin(&src).await.unwrap();

    let item = m.import_music_item("anything").await.unwrap().unwrap();
    assert_eq!(item.id, "7");
    assert_eq!(item.title, "Seven");
    assert_eq!(item.platform, "net");
}

#[tokio::test(flavor = "multi_thread")]
async fn private_hosts_are_blocked_by_default() {
    let mut env = TestEnv::new();
    env.config_mut().sandbox.allow_private_hosts = false;
    let m = manager(&env).await;
    let src = env.root().join("sources").join("net.wat");
    std::fs::write(&src, http_plugin_wat("http://127.0.0.1:9/x")).unwrap();
    m.install_plugin(&src).await.unwrap();

    let err = m.import_music_item("anything").await.unwrap_err();
    assert!(err.to_string().contains("not permitted"), "{err}");
}

#[tokio::test]
async fn update_replaces_the_record_even_when_renamed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p.wat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PluginFixture::new("old-name").to_wat()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve(&server, "/p.wat", &PluginFixture::new("new-name")).await;

    let env = TestEnv::new();
    let m = manager(&env).await;
    m.install_plugin(env.write_source("first.wat", &PluginFixture::new("first")))
        .await
        .unwrap();
    let old = m
        .install_plugin_from_url(&format!("{}/p.wat", server.uri()))
        .await
        .unwrap();
    m.reorder(&["old-name", "first"]).await.unwrap();

    let updated = m.update_plugin(&old.hash).await.unwrap();
    assert_eq!(
        updated.action,
        ResolveAction::Update {
            replaces: old.hash.clone()
        }
    );
    assert!(m.plugin(&old.hash).is_none());
    assert_eq!(sorted_names(&m), vec!["new-name", "first"]);
    assert_eq!(stored_files(&env), 2);

    let again = m.update_plugin(&updated.hash).await.unwrap();
    assert_eq!(again.action, ResolveAction::Unchanged);
}

#[tokio::test]
async fn incompatible_restored_plugin_can_be_updated() {
    let server = MockServer::start().await;
    let url = format!("{}/future.wat", server.uri());
    serve(
        &server,
        "/future.wat",
        &PluginFixture::new("future").version("2.0.0").src_url(&url),
    )
    .await;

    let env = TestEnv::new();
    {
        let _ = manager(&env).await;
    }
    PluginFixture::new("future")
        .version("1.0.0")
        .src_url(&url)
        .app_version(">=99")
        .write_wat(&env.plugin_dir(), "future.wat");

    let m = manager(&env).await;
    m.load_installed().await.unwrap();
    let stale = m.sorted_plugins()[0].clone();
    assert_eq!(stale.state_code, PluginStateCode::VersionNotMatch);
    assert_eq!(stale.version(), Some("1.0.0"));
    assert_eq!(stale.src_url(), Some(url.as_str()));
    assert!(stale.capabilities().is_empty());

    let updated = m.update_plugin(&stale.hash).await.unwrap();
    assert!(matches!(updated.action, ResolveAction::Update { .. }));
    let current = m.plugin(&updated.hash).unwrap();
    assert_eq!(current.state, PluginState::Enabled);
    assert_eq!(current.version(), Some("2.0.0"));
    assert!(!env.plugin_dir().join("future.wat").exists());
    assert_eq!(m.sorted_plugins().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reinstall_racing_uninstall_keeps_its_file() {
    let env = TestEnv::new();
    let m = manager(&env).await;
    let src = env.write_source("demo.wat", &PluginFixture::new("demo"));

    for _ in 0..10 {
        let hash = m.install_plugin(&src).await.unwrap().hash;
        let (removed, reinstalled) = tokio::join!(m.uninstall_plugin(&hash), m.install_plugin(&src));
        removed.unwrap();
        reinstalled.unwrap();

        match m.plugin(&hash) {
            Some(plugin) => assert!(plugin.path.exists(), "registry entry lost its file"),
            None => assert_eq!(stored_files(&env), 0),
        }
    }
}
