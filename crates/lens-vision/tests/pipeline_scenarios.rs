//! End-to-end pipeline runs with the Eden AI client against a mock server.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lens_models::{DetectionResult, DetectionStatus, RelevantTags};
use lens_vision::{CropPolicy, DetectorConfig, EdenAiClient, EdenAiConfig, SiteDetector};

fn write_photo(dir: &Path) -> PathBuf {
    let path = dir.join("paris.png");
    RgbImage::from_pixel(320, 240, Rgb([180, 160, 140]))
        .save(&path)
        .unwrap();
    path
}

fn site_detector(server: &MockServer, scratch_dir: &Path) -> SiteDetector {
    let client = Arc::new(
        EdenAiClient::new(EdenAiConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            max_retries: 0,
            ..Default::default()
        })
        .unwrap(),
    );

    SiteDetector::new(
        client.clone(),
        client,
        DetectorConfig {
            scratch_dir: scratch_dir.to_path_buf(),
            classifier_timeout: Duration::from_secs(5),
            deadline: Duration::from_secs(30),
            crop_policy: CropPolicy::FirstMatch,
            relevant_tags: Arc::new(RelevantTags::default()),
        },
    )
}

async fn mount_landmark(server: &MockServer, status: u16, description: Option<&str>) {
    let items = match description {
        Some(d) => json!([{"description": d, "confidence": 0.9}]),
        None => json!([]),
    };
    Mock::given(method("POST"))
        .and(path("/image/landmark_detection"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({"google": {"status": "success", "items": items}})),
        )
        .mount(server)
        .await;
}

async fn mount_objects(server: &MockServer, items: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/image/object_detection"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"clarifai": {"status": "success", "items": items}})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_landmark_service_down_yields_failure() {
    let server = MockServer::start().await;
    mount_landmark(&server, 500, None).await;
    mount_objects(&server, json!([])).await;

    let dir = TempDir::new().unwrap();
    let detector = site_detector(&server, &dir.path().join("scratch"));

    let result = detector.detect_site(&write_photo(dir.path())).await;
    assert_eq!(result, DetectionResult::failure());
}

#[tokio::test]
async fn test_irrelevant_objects_yield_assumption() {
    let server = MockServer::start().await;
    mount_landmark(&server, 200, Some("Eiffel Tower")).await;
    mount_objects(
        &server,
        json!([{"label": "Person", "confidence": 0.99,
                "x_min": 0.1, "x_max": 0.4, "y_min": 0.2, "y_max": 0.9}]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let detector = site_detector(&server, &dir.path().join("scratch"));

    let result = detector.detect_site(&write_photo(dir.path())).await;
    assert_eq!(result, DetectionResult::assumed("Eiffel Tower"));
}

#[tokio::test]
async fn test_relevant_object_is_cropped_and_confirmed() {
    let server = MockServer::start().await;
    mount_landmark(&server, 200, Some("Eiffel Tower")).await;
    mount_objects(
        &server,
        json!([
            {"label": "Person", "confidence": 0.99,
             "x_min": 0.0, "x_max": 0.2, "y_min": 0.5, "y_max": 1.0},
            {"label": "Tower", "confidence": 0.81,
             "x_min": 0.25, "x_max": 0.75, "y_min": 0.0, "y_max": 1.0}
        ]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let scratch = dir.path().join("scratch");
    let detector = site_detector(&server, &scratch);

    let result = detector.detect_site(&write_photo(dir.path())).await;
    assert_eq!(result.status, DetectionStatus::Success);

    let info = result.site_information.unwrap();
    assert_eq!(info.label, "Tower");
    assert_eq!(info.site_name, "Eiffel Tower");
    assert!((info.x - 0.5).abs() < 1e-9);
    assert!((info.y - 0.5).abs() < 1e-9);

    // full image + one crop
    let requests = server.received_requests().await.unwrap();
    let landmark_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/image/landmark_detection")
        .count();
    assert_eq!(landmark_calls, 2);

    let leftovers = std::fs::read_dir(&scratch).unwrap().count();
    assert_eq!(leftovers, 0);
}
