//! Command surface for the panel
//!
//! The panel reports events (`on_exchange_finished`, `on_filter_changed`,
//! ...) and asks for conversions with [`ConversionKind`]. Everything runs on
//! one event loop; the controller owns the session outright.

use super::render::{RenderFrame, RenderScheduler, RowView};
use super::session::CaptureSession;
use crate::config::EchoConfig;
use crate::convert::{
    create_schema_projection, export_har_to_path, generate_curl, generate_curl_script,
    generate_dashboard_format, generate_json_export, generate_postman_collection,
    DashboardLimits, DEFAULT_MAX_DEPTH,
};
use crate::error::EchoError;
use crate::filter::FilterState;
use crate::models::{CaptureEvent, ExchangeId, SharedRecord};
use crate::storage::{PreferenceStore, Preferences};
use crate::transport::{CompressionService, Surface, TransportBridge};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Context-menu and toolbar actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    CopyCurl,
    CopyJson,
    /// Copy the dashboard projection as pretty JSON
    CopyAll,
    /// Every captured exchange as a cURL script
    CopyAllCurl,
    OpenDashboard,
    OpenLocalDashboard,
    RunPostman,
    ExportHar,
    /// Copy the schema projection as pretty JSON
    SchemaPreview,
}

impl ConversionKind {
    /// Whether the action works on one exchange rather than the whole capture
    pub fn needs_exchange(&self) -> bool {
        !matches!(self, Self::CopyAllCurl | Self::ExportHar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient toast shown after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

pub struct PresentationController<S, C> {
    session: CaptureSession,
    bridge: TransportBridge<S, C>,
    preferences: Preferences,
    scheduler: RenderScheduler,
    store: Option<PreferenceStore>,
    export_dir: PathBuf,
    limits: DashboardLimits,
}

impl<S: Surface, C: CompressionService> PresentationController<S, C> {
    /// Controller without persistence
    pub fn new(config: &EchoConfig, surface: S, compression: C) -> Self {
        Self {
            session: CaptureSession::new(config.buffer_capacity),
            bridge: TransportBridge::new(surface, compression, config),
            preferences: Preferences::default(),
            scheduler: RenderScheduler::new(config.render_interval()),
            store: None,
            export_dir: config.storage_path.clone(),
            limits: config.dashboard,
        }
    }

    /// Controller backed by the preference store under `storage_path`
    pub async fn open(config: &EchoConfig, surface: S, compression: C) -> Result<Self, EchoError> {
        let store = PreferenceStore::open(&config.storage_path)?;
        let preferences = store.load_preferences().await?;
        let domains = store
            .load_domain_memory(Utc::now().timestamp_millis())
            .await?;

        let mut controller = Self::new(config, surface, compression);
        controller.session = controller.session.with_domain_memory(domains);
        controller
            .session
            .set_clear_on_navigate(preferences.clear_on_navigate);
        controller.preferences = preferences;
        controller.store = Some(store);
        tracing::info!(
            "Capture session ready, {} remembered domains",
            controller.session.domain_memory().len()
        );
        Ok(controller)
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn bridge(&self) -> &TransportBridge<S, C> {
        &self.bridge
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub async fn update_preferences(&mut self, preferences: Preferences) -> Result<(), EchoError> {
        self.session
            .set_clear_on_navigate(preferences.clear_on_navigate);
        if let Some(store) = &self.store {
            store.save_preferences(&preferences).await?;
        }
        self.preferences = preferences;
        self.scheduler.request_render();
        Ok(())
    }

    /// Write remembered domains back to the store
    pub async fn persist(&self) -> Result<(), EchoError> {
        if let Some(store) = &self.store {
            store.save_domain_memory(self.session.domain_memory()).await?;
        }
        Ok(())
    }

    pub fn on_exchange_finished(&mut self, event: CaptureEvent) -> Option<ExchangeId> {
        let id = self.session.on_exchange_finished(event)?;
        self.scheduler.request_render();
        Some(id)
    }

    pub fn on_body_received(&mut self, id: &ExchangeId, body: Option<String>) -> bool {
        self.session.on_body_received(id, body)
    }

    pub fn on_filter_changed(&mut self, state: FilterState) {
        self.session.on_filter_changed(state);
        self.scheduler.request_render();
    }

    pub fn on_navigated(&mut self) {
        let dropped = self.session.on_navigated();
        if dropped > 0 {
            tracing::debug!("Navigation cleared {} exchanges", dropped);
            self.scheduler.request_render();
        }
    }

    pub fn clear(&mut self) {
        self.session.clear();
        self.scheduler.request_render();
    }

    pub fn select(&mut self, id: &ExchangeId) -> Option<SharedRecord> {
        let record = self.session.select(id)?;
        self.scheduler.request_render();
        Some(record)
    }

    /// Run a conversion and report the outcome as a toast. Errors are
    /// logged and never retried.
    pub async fn on_convert_requested(
        &self,
        kind: ConversionKind,
        id: Option<&ExchangeId>,
    ) -> Notification {
        match self.try_convert(kind, id).await {
            Ok(notification) => notification,
            Err(err) => {
                tracing::error!("{:?} failed: {}", kind, err);
                Notification::error(err.user_message())
            }
        }
    }

    pub async fn try_convert(
        &self,
        kind: ConversionKind,
        id: Option<&ExchangeId>,
    ) -> Result<Notification, EchoError> {
        match kind {
            ConversionKind::ExportHar => {
                let records = self.session.snapshot();
                let path = export_har_to_path(&records, &self.export_dir).await?;
                Ok(Notification::success(format!(
                    "Exported {} requests to {}",
                    records.len(),
                    path.display()
                )))
            }
            ConversionKind::CopyAllCurl => {
                self.copy(&generate_curl_script(&self.session.snapshot()))
                    .await
            }
            ConversionKind::CopyCurl => {
                let record = self.resolve(id)?;
                self.copy(&generate_curl(&record)).await
            }
            ConversionKind::CopyJson => {
                let record = self.resolve(id)?;
                let json = serde_json::to_string_pretty(&generate_json_export(&record))?;
                self.copy(&json).await
            }
            ConversionKind::CopyAll => {
                let record = self.resolve(id)?;
                let projection = generate_dashboard_format(&record, &self.limits);
                self.copy(&serde_json::to_string_pretty(&projection)?).await
            }
            ConversionKind::SchemaPreview => {
                let record = self.resolve(id)?;
                let schema = create_schema_projection(&record, DEFAULT_MAX_DEPTH);
                self.copy(&serde_json::to_string_pretty(&schema)?).await
            }
            ConversionKind::OpenDashboard | ConversionKind::OpenLocalDashboard => {
                let record = self.resolve(id)?;
                let local = kind == ConversionKind::OpenLocalDashboard;
                self.bridge.open_dashboard(&[record], local).await?;
                Ok(Notification::success("Action completed successfully!"))
            }
            ConversionKind::RunPostman => {
                let record = self.resolve(id)?;
                self.bridge
                    .run_postman(&generate_postman_collection(&record))
                    .await?;
                Ok(Notification::success("Action completed successfully!"))
            }
        }
    }

    fn resolve(&self, id: Option<&ExchangeId>) -> Result<SharedRecord, EchoError> {
        match id {
            Some(id) => self
                .session
                .get(id)
                .ok_or_else(|| EchoError::NotFound(id.clone())),
            None => self.session.selected().ok_or(EchoError::NoSelection),
        }
    }

    async fn copy(&self, text: &str) -> Result<Notification, EchoError> {
        self.bridge.copy_to_clipboard(text).await?;
        Ok(Notification::success("Copied to clipboard!"))
    }

    /// Current list view
    pub fn render_frame(&self) -> RenderFrame {
        let selected = self.session.selected().map(|r| r.id.clone());
        let mode = self.preferences.url_display_mode;
        let rows = self
            .session
            .visible()
            .iter()
            .map(|record| RowView::new(record, mode, selected.as_ref()))
            .collect();
        RenderFrame {
            rows,
            count_label: self.session.request_count_label(),
            domain_tags: self.session.domain_tags(),
            selected,
        }
    }

    /// Wait for the pending frame and render it. `None` when nothing was
    /// requested or another render holds the slot.
    pub async fn flush_render(&self) -> Option<RenderFrame> {
        if !self.scheduler.wait_due().await {
            return None;
        }
        let _guard = self.scheduler.begin_render()?;
        Some(self.render_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ResourceFilter;
    use crate::models::test_support::event;
    use crate::models::UrlDisplayMode;
    use crate::transport::bridge::test_support::FakeSurface;
    use crate::transport::{decode_viewer_url, GzipCompression, ViewerState};
    use tempfile::tempdir;

    type TestController = PresentationController<FakeSurface, GzipCompression>;

    fn controller(dir: &std::path::Path) -> TestController {
        let config = EchoConfig {
            storage_path: dir.to_path_buf(),
            ..EchoConfig::default()
        };
        PresentationController::new(&config, FakeSurface::default(), GzipCompression)
    }

    #[tokio::test(start_paused = true)]
    async fn copy_curl_for_selection() {
        let dir = tempdir().expect("temp dir");
        let mut controller = controller(dir.path());
        let id = controller
            .on_exchange_finished(event("DELETE", "https://api.example.com/items/9", 204))
            .expect("captured");

        let toast = controller
            .on_convert_requested(ConversionKind::CopyCurl, None)
            .await;
        assert_eq!(toast, Notification::error("Select a request first"));

        controller.select(&id).expect("selectable");
        let toast = controller
            .on_convert_requested(ConversionKind::CopyCurl, None)
            .await;
        assert_eq!(toast, Notification::success("Copied to clipboard!"));
        assert_eq!(
            controller.bridge().surface().clipboard.written().as_deref(),
            Some("curl -X DELETE \\\n  'https://api.example.com/items/9'")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_id_reports_missing_request() {
        let dir = tempdir().expect("temp dir");
        let controller = controller(dir.path());
        let ghost = ExchangeId::from("gone");
        let err = controller
            .try_convert(ConversionKind::CopyJson, Some(&ghost))
            .await
            .unwrap_err();
        assert!(matches!(err, EchoError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn schema_preview_copies_shape() {
        let dir = tempdir().expect("temp dir");
        let mut controller = controller(dir.path());
        let id = controller
            .on_exchange_finished(event("GET", "https://api.example.com/list", 200))
            .expect("captured");
        controller.on_body_received(&id, Some(r#"{"a":[1,2,3]}"#.into()));

        let toast = controller
            .on_convert_requested(ConversionKind::SchemaPreview, Some(&id))
            .await;
        assert!(!toast.is_error());
        let copied = controller
            .bridge()
            .surface()
            .clipboard
            .written()
            .expect("copied");
        let schema: serde_json::Value = serde_json::from_str(&copied).expect("json");
        assert_eq!(schema["responseBody"], serde_json::json!({"a": [1, "... +2 more items"]}));
    }

    #[tokio::test]
    async fn open_dashboard_produces_decodable_link() {
        let dir = tempdir().expect("temp dir");
        let mut controller = controller(dir.path());
        let id = controller
            .on_exchange_finished(event("POST", "https://api.example.com/login", 401))
            .expect("captured");

        let toast = controller
            .on_convert_requested(ConversionKind::OpenDashboard, Some(&id))
            .await;
        assert!(!toast.is_error(), "{:?}", toast);

        let urls = controller.bridge().surface().opened_urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("http://localhost:8081/index2.html?data="));
        match decode_viewer_url(&urls[0]).expect("decodes") {
            ViewerState::Single(exchange) => assert_eq!(exchange["response"]["status"], 401),
            other => panic!("unexpected viewer state {:?}", other),
        }
    }

    #[tokio::test]
    async fn export_har_writes_whole_capture() {
        let dir = tempdir().expect("temp dir");
        let mut controller = controller(dir.path());
        controller.on_exchange_finished(event("GET", "https://a.example.com/", 200));
        controller.on_exchange_finished(event("GET", "https://b.example.com/", 500));
        controller.on_filter_changed(FilterState::new(ResourceFilter::Failed, None, None));

        let toast = controller
            .on_convert_requested(ConversionKind::ExportHar, None)
            .await;
        assert!(toast.message.starts_with("Exported 2 requests to "));
        let written = std::fs::read_dir(dir.path())
            .expect("listable")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".har"))
            .count();
        assert_eq!(written, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_renders_once() {
        let dir = tempdir().expect("temp dir");
        let mut controller = controller(dir.path());
        for i in 0..25 {
            controller.on_exchange_finished(event("GET", &format!("https://example.com/{}", i), 200));
        }

        let frame = controller.flush_render().await.expect("one frame");
        assert_eq!(frame.rows.len(), 25);
        assert_eq!(frame.count_label, "25 requests");
        assert_eq!(frame.domain_tags, vec![("example.com".to_string(), 25)]);
        assert!(controller.flush_render().await.is_none());
        assert_eq!(controller.scheduler().frames(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn domain_filter_chip_kept_after_navigation() {
        let dir = tempdir().expect("temp dir");
        let mut controller = controller(dir.path());
        controller.on_exchange_finished(event("GET", "https://api.example.com/users", 200));
        controller.on_filter_changed(FilterState::new(
            ResourceFilter::All,
            Some("api.example.com".to_string()),
            None,
        ));
        controller.on_navigated();

        let frame = controller.flush_render().await.expect("frame");
        assert!(frame.rows.is_empty());
        assert_eq!(frame.domain_tags, vec![("api.example.com".to_string(), 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn rows_use_display_mode_and_selection() {
        let dir = tempdir().expect("temp dir");
        let mut controller = controller(dir.path());
        let id = controller
            .on_exchange_finished(event("GET", "https://example.com/users/12345/posts", 200))
            .expect("captured");
        controller.select(&id);
        let mut preferences = Preferences::default();
        preferences.url_display_mode = UrlDisplayMode::SmartAbbreviated;
        controller
            .update_preferences(preferences)
            .await
            .expect("saved");

        let frame = controller.render_frame();
        assert_eq!(frame.rows[0].display_url, "/users/:id/posts");
        assert!(frame.rows[0].selected);
        assert_eq!(frame.selected, Some(id));
    }

    #[tokio::test]
    async fn preferences_survive_reopen() {
        let dir = tempdir().expect("temp dir");
        let config = EchoConfig {
            storage_path: dir.path().to_path_buf(),
            ..EchoConfig::default()
        };

        let mut first: TestController =
            PresentationController::open(&config, FakeSurface::default(), GzipCompression)
                .await
                .expect("opens");
        first.on_exchange_finished(event("GET", "https://api.example.com/", 200));
        let mut preferences = Preferences::default();
        preferences.clear_on_navigate = false;
        first
            .update_preferences(preferences)
            .await
            .expect("saved");
        first.persist().await.expect("persisted");
        drop(first);

        let mut second: TestController =
            PresentationController::open(&config, FakeSurface::default(), GzipCompression)
                .await
                .expect("reopens");
        assert!(!second.preferences().clear_on_navigate);
        assert!(second.session().domain_memory().contains("api.example.com"));

        second.on_exchange_finished(event("GET", "https://api.example.com/", 200));
        second.on_navigated();
        assert_eq!(second.session().len(), 1);
    }
}
