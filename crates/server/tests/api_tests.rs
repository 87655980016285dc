use signet_core::error::{CoreError, Result as CoreResult};
use signet_core::store::MemoryStore;
use signet_core::{Embedder, Item, Kernel};
use signet_server::api::create_router;
use signet_server::api::handlers::{AppState, SearchDefaults};
use std::sync::Arc;

const DIMS: usize = 8;

/// Deterministic offline embedder: hashes text into a value stream.
struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        DIMS
    }

    fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        if text.is_empty() {
            return Err(CoreError::InvalidArgument("empty text".into()));
        }
        let mut state = 0xCBF2_9CE4_8422_2325u64;
        for byte in text.bytes() {
            state = (state ^ u64::from(byte)).wrapping_mul(0x0100_0000_01B3);
        }
        let mut vector = Vec::with_capacity(DIMS);
        for _ in 0..DIMS {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            vector.push(((state >> 33) as f32 / (1u64 << 30) as f32) - 1.0);
        }
        Ok(vector)
    }
}

async fn spawn_app() -> String {
    let kernel = Arc::new(
        Kernel::new(Arc::new(MemoryStore::new()), Arc::new(HashEmbedder)).unwrap(),
    );
    kernel
        .save_items(vec![
            Item::new(1, "alpha".into(), "payload alpha".into()),
            Item::new(2, "beta".into(), "payload beta".into()),
            Item::new(3, "gamma".into(), "payload gamma".into()),
        ])
        .unwrap();

    let prometheus_handle =
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(_) => metrics_exporter_prometheus::PrometheusBuilder::new()
                .build_recorder()
                .handle(),
        };

    let state = AppState {
        kernel,
        defaults: SearchDefaults {
            reorder: true,
            overshoot: 30,
        },
        prometheus_handle,
        start_time: std::time::Instant::now(),
    };

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_health() {
    let base = spawn_app().await;
    let resp = client().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["items"], 3);
    assert_eq!(body["dimensions"], DIMS);
    assert_eq!(body["max_id"], 3);
}

#[tokio::test]
async fn test_text_search_finds_seeded_item() {
    let base = spawn_app().await;
    let resp = client()
        .post(format!("{base}/search"))
        .json(&serde_json::json!({ "query": "alpha", "k": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    // Query text equals item 1's semantic key, so its payload ranks first.
    assert_eq!(results[0], "payload alpha");
}

#[tokio::test]
async fn test_text_search_full_path() {
    let base = spawn_app().await;
    let resp = client()
        .post(format!("{base}/search"))
        .json(&serde_json::json!({ "query": "beta", "k": 1, "full": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0], "payload beta");
}

#[tokio::test]
async fn test_empty_query_rejected() {
    let base = spawn_app().await;
    let resp = client()
        .post(format!("{base}/search"))
        .json(&serde_json::json!({ "query": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_bad_k_rejected() {
    let base = spawn_app().await;
    for k in [0usize, 101] {
        let resp = client()
            .post(format!("{base}/search"))
            .json(&serde_json::json!({ "query": "alpha", "k": k }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "k={k} should be rejected");
    }
}

#[tokio::test]
async fn test_embedding_search() {
    let base = spawn_app().await;
    let embedding = HashEmbedder.embed("gamma").unwrap();
    let resp = client()
        .post(format!("{base}/search/embedding"))
        .json(&serde_json::json!({ "embedding": embedding, "k": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0], "payload gamma");
}

#[tokio::test]
async fn test_embedding_wrong_dimension_rejected() {
    let base = spawn_app().await;
    let resp = client()
        .post(format!("{base}/search/embedding"))
        .json(&serde_json::json!({ "embedding": [1.0, 2.0], "k": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_get_item_and_not_found() {
    let base = spawn_app().await;

    let resp = client().get(format!("{base}/items/2")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["id"], 2);
    assert_eq!(body["payload"], "payload beta");
    assert_eq!(body["embedding"].as_array().unwrap().len(), DIMS);

    let resp = client().get(format!("{base}/items/999")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_batch_lookup() {
    let base = spawn_app().await;
    let resp = client()
        .post(format!("{base}/items/batch"))
        .json(&serde_json::json!({ "ids": [1, 3, 999] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    // Absent ids are skipped, not errors.
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_batch_lookup_limit() {
    let base = spawn_app().await;
    let ids: Vec<i32> = (0..101).collect();
    let resp = client()
        .post(format!("{base}/items/batch"))
        .json(&serde_json::json!({ "ids": ids }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_stats_reports_stage_histograms() {
    let base = spawn_app().await;
    client()
        .post(format!("{base}/search"))
        .json(&serde_json::json!({ "query": "alpha" }))
        .send()
        .await
        .unwrap();

    let resp = client().get(format!("{base}/stats")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["binary_scan"]["count"].as_u64().unwrap() >= 1);
    assert!(body["embed"]["count"].as_u64().unwrap() >= 1);
    assert_eq!(body["density"]["count"], 3);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let base = spawn_app().await;
    let resp = client().get(format!("{base}/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}
