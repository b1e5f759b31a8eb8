use std::sync::Mutex;

use async_trait::async_trait;
use echo_core::api::{ConversionKind, PresentationController};
use echo_core::filter::{FilterState, ResourceFilter};
use echo_core::models::{CaptureEvent, Header};
use echo_core::transport::{
    decode_viewer_url, ClipboardTarget, GzipCompression, Surface, ViewerState,
};
use echo_core::{EchoConfig, EchoError};

#[derive(Default)]
struct RecordingSurface {
    urls: Mutex<Vec<String>>,
    clipboard: Mutex<Option<String>>,
}

#[async_trait]
impl ClipboardTarget for RecordingSurface {
    async fn focus(&self) -> Result<(), String> {
        Ok(())
    }

    async fn write_native(&self, _text: &str) -> Result<(), String> {
        Err("Document is not focused".to_string())
    }

    async fn write_legacy(&self, text: &str) -> Result<bool, String> {
        *self.clipboard.lock().unwrap() = Some(text.to_string());
        Ok(true)
    }
}

#[async_trait]
impl Surface for RecordingSurface {
    async fn open_url(&self, url: &str) -> Result<(), EchoError> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn open_document(&self, _html: &str) -> Result<(), EchoError> {
        Ok(())
    }
}

fn finished(method: &str, url: &str, status: u16, time_ms: f64) -> CaptureEvent {
    CaptureEvent {
        url: url.to_string(),
        method: method.to_string(),
        status,
        time_ms,
        request_headers: vec![Header::new("Accept", "application/json")],
        response_headers: vec![Header::new("Content-Type", "application/json")],
        resource_type: Some("xhr".to_string()),
        ..CaptureEvent::default()
    }
}

#[tokio::test]
async fn capture_filter_and_share() {
    let storage_dir = tempfile::tempdir().unwrap();
    let config = EchoConfig {
        storage_path: storage_dir.path().to_path_buf(),
        buffer_capacity: 3,
        ..EchoConfig::default()
    };
    let mut controller =
        PresentationController::new(&config, RecordingSurface::default(), GzipCompression);

    let mut ids = Vec::new();
    for (i, status) in [200, 500, 404, 200].into_iter().enumerate() {
        let id = controller
            .on_exchange_finished(finished(
                "GET",
                &format!("https://api.example.com/items/{}?page={}", i, i),
                status,
                (i as f64) * 800.0,
            ))
            .unwrap();
        ids.push(id);
    }

    // Capacity 3: the first exchange is gone and its late body is dropped
    assert_eq!(controller.session().len(), 3);
    assert!(!controller.on_body_received(&ids[0], Some("{}".into())));
    assert!(controller.on_body_received(&ids[2], Some(r#"{"error":"missing"}"#.into())));

    controller.on_filter_changed(FilterState::new(ResourceFilter::Failed, None, Some("  ITEMS/2 ")));
    let visible = controller.session().visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, ids[2]);
    assert!(visible[0].slow);

    controller.select(&ids[2]).unwrap();
    let toast = controller
        .on_convert_requested(ConversionKind::CopyJson, None)
        .await;
    assert!(!toast.is_error(), "{:?}", toast);
    let copied = controller
        .bridge()
        .surface()
        .clipboard
        .lock()
        .unwrap()
        .clone()
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&copied).unwrap();
    assert_eq!(json["response"]["body"]["error"], "missing");
    assert_eq!(json["request"]["headers"]["Accept"], "application/json");

    let toast = controller
        .on_convert_requested(ConversionKind::OpenLocalDashboard, Some(&ids[2]))
        .await;
    assert!(!toast.is_error(), "{:?}", toast);
    let url = controller.bridge().surface().urls.lock().unwrap()[0].clone();
    assert!(url.ends_with("&compressed=true"));
    match decode_viewer_url(&url).unwrap() {
        ViewerState::Single(exchange) => {
            assert_eq!(exchange["request"]["method"], "GET");
            assert_eq!(exchange["payload"], r#"{"page":"2"}"#);
            assert_eq!(exchange["response"]["body"], r#"{"error":"missing"}"#);
        }
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn multi_exchange_links_expose_selector() {
    let storage_dir = tempfile::tempdir().unwrap();
    let config = EchoConfig {
        storage_path: storage_dir.path().to_path_buf(),
        ..EchoConfig::default()
    };
    let mut controller =
        PresentationController::new(&config, RecordingSurface::default(), GzipCompression);
    controller.on_exchange_finished(finished("GET", "https://a.example.com/", 200, 10.0));
    controller.on_exchange_finished(finished("POST", "https://b.example.com/submit", 201, 10.0));

    let records = controller.session().snapshot();
    let url = controller.bridge().open_dashboard(&records, false).await.unwrap();
    let state = decode_viewer_url(&url).unwrap();
    assert_eq!(
        state.labels(),
        &[
            "GET https://a.example.com/ (200)".to_string(),
            "POST https://b.example.com/submit (201)".to_string(),
        ]
    );
}
