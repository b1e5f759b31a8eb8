//! Coalescing render scheduler
//!
//! Bursts of capture events collapse into one list render. A request marks a
//! single pending slot; the frame becomes due one interval after the first
//! request of the burst. A render that is already running suppresses nested
//! renders instead of re-entering.

use crate::models::{ExchangeId, ExchangeRecord, ResourceType, UrlDisplayMode};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct SchedulerState {
    pending: AtomicBool,
    rendering: AtomicBool,
    frames: AtomicU64,
    requested_at: Mutex<Option<Instant>>,
}

#[derive(Debug, Clone)]
pub struct RenderScheduler {
    state: Arc<SchedulerState>,
    interval: Duration,
}

impl RenderScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: Arc::new(SchedulerState::default()),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ask for a render. Idempotent while one is pending; returns true only
    /// for the request that opened the slot.
    pub fn request_render(&self) -> bool {
        if self.state.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Ok(mut requested_at) = self.state.requested_at.lock() {
            *requested_at = Some(Instant::now());
        }
        true
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending.load(Ordering::Acquire)
    }

    pub fn is_rendering(&self) -> bool {
        self.state.rendering.load(Ordering::Acquire)
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.state.frames.load(Ordering::Relaxed)
    }

    /// Sleep until the pending frame is due. Returns false when nothing is
    /// pending.
    pub async fn wait_due(&self) -> bool {
        if !self.is_pending() {
            return false;
        }
        let requested_at = self
            .state
            .requested_at
            .lock()
            .ok()
            .and_then(|r| *r)
            .unwrap_or_else(Instant::now);
        tokio::time::sleep_until(requested_at + self.interval).await;
        self.is_pending()
    }

    /// Claim the pending frame. `None` when nothing is pending or a render
    /// is already running.
    pub fn begin_render(&self) -> Option<RenderGuard> {
        if self.state.rendering.swap(true, Ordering::AcqRel) {
            tracing::trace!("Render in progress, nested render suppressed");
            return None;
        }
        if !self.state.pending.swap(false, Ordering::AcqRel) {
            self.state.rendering.store(false, Ordering::Release);
            return None;
        }
        Some(RenderGuard {
            state: Arc::clone(&self.state),
        })
    }
}

/// Held for the duration of one render
#[derive(Debug)]
pub struct RenderGuard {
    state: Arc<SchedulerState>,
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        self.state.frames.fetch_add(1, Ordering::Relaxed);
        self.state.rendering.store(false, Ordering::Release);
    }
}

/// One row of the exchange list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub id: ExchangeId,
    pub method: String,
    pub url: String,
    pub display_url: String,
    pub status: u16,
    pub status_class: &'static str,
    pub domain: String,
    pub resource_type: ResourceType,
    pub duration: String,
    pub size: String,
    pub selected: bool,
}

impl RowView {
    pub fn new(record: &ExchangeRecord, mode: UrlDisplayMode, selected: Option<&ExchangeId>) -> Self {
        Self {
            id: record.id.clone(),
            method: record.method.clone(),
            url: record.url.clone(),
            display_url: mode.render(&record.url),
            status: record.status,
            status_class: record.status_class(),
            domain: record.domain.clone(),
            resource_type: record.resource_type,
            duration: record.duration_str(),
            size: record.size_str(),
            selected: selected == Some(&record.id),
        }
    }
}

/// Everything the list view needs for one paint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub rows: Vec<RowView>,
    pub count_label: String,
    pub domain_tags: Vec<(String, usize)>,
    pub selected: Option<ExchangeId>,
}
