//! Fleet launch against real sockets

use std::sync::Arc;
use std::time::Duration;

use super::fixtures::{client, nested_layout, test_config};
use dictfleet::discovery::{Bundle, BundleRegistry};
use dictfleet::engine::{LookupEngine, ResourceEngine};
use dictfleet::error::{Error, Result};
use dictfleet::fleet;
use dictfleet::http::CloseOutcome;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;

fn resource_factory(bundle: Arc<Bundle>, port: u16) -> Result<Arc<dyn LookupEngine>> {
    Ok(Arc::new(ResourceEngine::open(bundle, port)))
}

#[tokio::test]
async fn test_launch_assigns_sequential_ports() {
    let tmp = nested_layout(&["Collins", "Longman", "Oxford"]);
    let config = test_config(tmp.path(), 3);
    let base = config.server.base_port;

    let registry = BundleRegistry::discover(tmp.path()).unwrap();
    let fleet = fleet::launch(&registry, &config, &resource_factory)
        .await
        .unwrap();

    assert_eq!(fleet.len(), 3);
    assert_eq!(fleet.ports(), vec![base, base + 1, base + 2]);

    let descriptors = fleet.descriptors();
    let names: Vec<_> = descriptors.iter().map(|d| d["name"].clone()).collect();
    assert_eq!(names, vec!["Collins", "Longman", "Oxford"]);
    assert_eq!(descriptors[2]["port"], base + 2);
    assert_eq!(descriptors[2]["title"], "Oxford");

    let http = client();
    for (i, name) in ["Collins", "Longman", "Oxford"].iter().enumerate() {
        let url = format!("http://127.0.0.1:{}/", base + i as u16);
        let body: serde_json::Value = http.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["name"], *name);
    }

    let outcomes = fleet.close(Duration::from_secs(5)).await;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes
        .iter()
        .all(|(_, outcome)| *outcome == CloseOutcome::Closed));
    assert_eq!(outcomes[0].0, format!("Collins ({base})"));
}

#[tokio::test]
async fn test_member_serves_bundle_files_with_revalidation() {
    let tmp = nested_layout(&["Oxford"]);
    let config = test_config(tmp.path(), 1);
    let port = config.server.base_port;

    let registry = BundleRegistry::discover(tmp.path()).unwrap();
    let fleet = fleet::launch(&registry, &config, &resource_factory)
        .await
        .unwrap();

    let http = client();
    let url = format!("http://127.0.0.1:{port}/Oxford.css");

    let first = http.get(&url).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["content-type"], "text/css; charset=utf-8");
    let tag = first.headers()[ETAG].clone();
    assert!(tag.to_str().unwrap().starts_with("W/\""));
    assert_eq!(first.text().await.unwrap(), ".Oxford {}");

    let second = http
        .get(&url)
        .header(IF_NONE_MATCH, tag)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);

    let missing = http
        .get(format!("http://127.0.0.1:{port}/missing.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let word = http
        .get(format!("http://127.0.0.1:{port}/?word=cat"))
        .send()
        .await
        .unwrap();
    assert_eq!(word.status(), StatusCode::NOT_IMPLEMENTED);

    fleet.close(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_port_collision_leaves_nothing_running() {
    let tmp = nested_layout(&["a", "b", "c"]);
    let config = test_config(tmp.path(), 3);
    let base = config.server.base_port;

    let squatter = std::net::TcpListener::bind(("127.0.0.1", base + 1)).unwrap();

    let registry = BundleRegistry::discover(tmp.path()).unwrap();
    let result = fleet::launch(&registry, &config, &resource_factory).await;

    match result {
        Err(Error::Bind { addr, .. }) => assert_eq!(addr.port(), base + 1),
        Err(other) => panic!("expected bind error, got {other}"),
        Ok(_) => panic!("launch should fail on a taken port"),
    }

    drop(squatter);
    for port in [base, base + 1, base + 2] {
        std::net::TcpListener::bind(("127.0.0.1", port))
            .unwrap_or_else(|e| panic!("port {port} still held: {e}"));
    }
}

#[tokio::test]
async fn test_closed_member_refuses_connections() {
    let tmp = nested_layout(&["Oxford"]);
    let config = test_config(tmp.path(), 1);
    let port = config.server.base_port;

    let registry = BundleRegistry::discover(tmp.path()).unwrap();
    let fleet = fleet::launch(&registry, &config, &resource_factory)
        .await
        .unwrap();

    fleet.close(Duration::from_secs(5)).await;

    assert!(tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .is_err());
}

#[tokio::test]
async fn test_member_hides_archives_and_streams_large_files() {
    let tmp = nested_layout(&["Oxford"]);
    let dir = tmp.path().join("Oxford");
    let large = vec![1u8; 3 * 1024 * 1024];
    std::fs::write(dir.join("pron.mp3"), &large).unwrap();

    let config = test_config(tmp.path(), 1);
    let port = config.server.base_port;
    let registry = BundleRegistry::discover(tmp.path()).unwrap();
    let fleet = fleet::launch(&registry, &config, &resource_factory)
        .await
        .unwrap();

    let http = client();
    for file in ["Oxford.mdx", "Oxford.mdd"] {
        let response = http
            .get(format!("http://127.0.0.1:{port}/{file}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{file}");
    }

    let url = format!("http://127.0.0.1:{port}/pron.mp3");
    let first = http.get(&url).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["content-length"], large.len().to_string().as_str());
    let tag = first.headers()[ETAG].clone();
    assert_eq!(first.bytes().await.unwrap().len(), large.len());

    let second = http
        .get(&url)
        .header(IF_NONE_MATCH, tag)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);

    fleet.close(Duration::from_secs(5)).await;
}
