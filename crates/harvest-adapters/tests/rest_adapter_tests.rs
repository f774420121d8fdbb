//! REST adapter against a mock HTTP server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use harvest_adapters::{RestApiAdapter, MIN_POLL_INTERVAL};
use harvest_config::RestSettings;
use harvest_core::{AdminError, CrudManager, DatabaseAdapter, Document, WriteOutcome};
use parking_lot::Mutex;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn adapter(server: &MockServer) -> RestApiAdapter {
    RestApiAdapter::from_base_url(server.uri()).unwrap()
}

#[tokio::test]
async fn test_get_maps_status_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hero": {"title": "Hi"}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pages/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pages/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let db = adapter(&server);
    let main = db.get("pages", "main").await.unwrap().unwrap();
    assert_eq!(main["hero"]["title"], json!("Hi"));
    assert!(db.get("pages", "missing").await.unwrap().is_none());

    let err = db.get("pages", "broken").await.unwrap_err();
    assert!(matches!(err, AdminError::Transport(_)));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_writes_map_conflict_and_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/pages/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/pages/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let db = adapter(&server);
    assert!(db
        .create("pages", "main", Document::new())
        .await
        .unwrap_err()
        .is_already_exists());
    assert!(db
        .update("pages", "ghost", Document::new())
        .await
        .unwrap_err()
        .is_not_found());
    assert!(db.delete("pages", "ghost").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_create_sends_json_and_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pages/promo"))
        .and(header("authorization", "Bearer secret"))
        .and(header("x-site", "harvest"))
        .and(body_json(json!({"title1": "Promo"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = RestSettings::new(server.uri());
    settings.auth_token = Some("secret".to_string());
    settings
        .headers
        .insert("X-Site".to_string(), "harvest".to_string());
    let db = RestApiAdapter::new(&settings).unwrap();

    db.create("pages", "promo", doc(json!({"title1": "Promo"})))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_all_skips_non_objects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "main"}, 3, {"id": "footer"}])),
        )
        .mount(&server)
        .await;

    let all = adapter(&server).get_all("pages").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1]["id"], json!("footer"));
}

#[tokio::test]
async fn test_crud_fallback_over_rest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let crud = CrudManager::new(Arc::new(adapter(&server)));
    let outcome = crud
        .create_or_update("pages", "main", doc(json!({"hero": {}})))
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Updated);
}

#[tokio::test]
async fn test_subscription_polls_until_released() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 1})))
        .mount(&server)
        .await;

    let db = adapter(&server).with_poll_interval(Duration::from_millis(50));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let sub = db
        .subscribe(
            "pages",
            "main",
            Arc::new(move |snapshot: Option<Document>| sink.lock().push(snapshot)),
        )
        .unwrap();

    assert!(seen.lock().is_empty(), "first poll waits one interval");
    tokio::time::sleep(Duration::from_millis(400)).await;
    let polled = seen.lock().len();
    assert!(polled >= 2, "expected repeated polls, got {polled}");
    assert!(seen.lock().iter().all(|s| s.as_ref() == Some(&doc(json!({"v": 1})))));

    sub.unsubscribe();
    let after_release = seen.lock().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(seen.lock().len(), after_release);
}

#[tokio::test]
async fn test_subscription_survives_failed_polls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let db = adapter(&server).with_poll_interval(Duration::from_millis(40));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = db
        .subscribe(
            "pages",
            "main",
            Arc::new(move |snapshot: Option<Document>| sink.lock().push(snapshot)),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    let seen = seen.lock();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(Option::is_none));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_release_waits_for_running_callback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 1})))
        .mount(&server)
        .await;

    let db = adapter(&server).with_poll_interval(Duration::from_millis(20));
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let (s, f) = (started.clone(), finished.clone());
    let sub = db
        .subscribe(
            "pages",
            "main",
            Arc::new(move |_: Option<Document>| {
                s.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(100));
                f.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    for _ in 0..400 {
        if started.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(started.load(Ordering::SeqCst) > 0, "poller never emitted");

    sub.unsubscribe();
    let released_at = started.load(Ordering::SeqCst);
    assert_eq!(finished.load(Ordering::SeqCst), released_at);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(started.load(Ordering::SeqCst), released_at);
}

#[tokio::test]
async fn test_zero_poll_interval_still_emits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 1})))
        .mount(&server)
        .await;

    let db = adapter(&server).with_poll_interval(Duration::ZERO);
    assert_eq!(db.poll_interval(), MIN_POLL_INTERVAL);

    let seen = Arc::new(AtomicUsize::new(0));
    let sink = seen.clone();
    let sub = db
        .subscribe(
            "pages",
            "main",
            Arc::new(move |_: Option<Document>| {
                sink.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(seen.load(Ordering::SeqCst) > 0);
    sub.unsubscribe();
}
