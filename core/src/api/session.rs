//! Capture session state
//!
//! One session per inspected page. It owns the capture buffer, the current
//! filter selection and the selected exchange; nothing here is global.

use crate::filter::{self, FilterState, DEFAULT_DOMAIN_TAGS};
use crate::models::{CaptureEvent, ExchangeId, ExchangeRecord, SharedRecord, UNKNOWN_DOMAIN};
use crate::storage::{CaptureBuffer, DomainMemory};
use chrono::Utc;

#[derive(Debug)]
pub struct CaptureSession {
    buffer: CaptureBuffer,
    filter: FilterState,
    selected: Option<ExchangeId>,
    domains: DomainMemory,
    clear_on_navigate: bool,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(crate::storage::DEFAULT_CAPACITY)
    }
}

impl CaptureSession {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: CaptureBuffer::new(capacity),
            filter: FilterState::default(),
            selected: None,
            domains: DomainMemory::default(),
            clear_on_navigate: true,
        }
    }

    pub fn with_domain_memory(mut self, domains: DomainMemory) -> Self {
        self.domains = domains;
        self
    }

    pub fn set_clear_on_navigate(&mut self, enabled: bool) {
        self.clear_on_navigate = enabled;
    }

    /// Record a finished exchange. Extension-internal and `data:` URLs are
    /// ignored and yield `None`.
    pub fn on_exchange_finished(&mut self, event: CaptureEvent) -> Option<ExchangeId> {
        if !event.is_capturable() {
            tracing::trace!("Skipping non-capturable URL {}", event.url);
            return None;
        }
        let record = ExchangeRecord::from_event(ExchangeId::generate(), event);
        let id = record.id.clone();
        if record.domain != UNKNOWN_DOMAIN {
            self.domains
                .remember(&record.domain, Utc::now().timestamp_millis());
        }
        self.buffer.append(record);
        Some(id)
    }

    /// Attach a body that resolved after the metadata. Returns false when the
    /// exchange was evicted in the meantime.
    pub fn on_body_received(&mut self, id: &ExchangeId, body: Option<String>) -> bool {
        let attached = self.buffer.attach_response_body(id, body);
        if !attached {
            tracing::debug!("Body arrived for evicted exchange {}", id);
        }
        attached
    }

    pub fn on_filter_changed(&mut self, state: FilterState) {
        self.filter = state;
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn filter_state_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    /// Page navigation. Clears the capture when the preference asks for it;
    /// filters survive either way. Returns the number of dropped exchanges.
    pub fn on_navigated(&mut self) -> usize {
        if self.clear_on_navigate {
            self.clear()
        } else {
            0
        }
    }

    pub fn clear(&mut self) -> usize {
        self.selected = None;
        self.buffer.clear()
    }

    /// Select an exchange for the details panel
    pub fn select(&mut self, id: &ExchangeId) -> Option<SharedRecord> {
        let record = self.buffer.get(id)?;
        self.selected = Some(id.clone());
        Some(record)
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Currently selected exchange, if it is still captured
    pub fn selected(&self) -> Option<SharedRecord> {
        self.selected.as_ref().and_then(|id| self.buffer.get(id))
    }

    pub fn get(&self, id: &ExchangeId) -> Option<SharedRecord> {
        self.buffer.get(id)
    }

    pub fn snapshot(&self) -> Vec<SharedRecord> {
        self.buffer.snapshot()
    }

    /// Exchanges passing the current filter, in capture order
    pub fn visible(&self) -> Vec<SharedRecord> {
        filter::filter(&self.buffer.snapshot(), &self.filter)
    }

    /// Busiest captured domains. Remembered domains fill free slots with a
    /// zero count and the active domain filter always keeps its chip, so a
    /// filter that outlived a clear can still be seen and toggled off.
    pub fn domain_tags(&self) -> Vec<(String, usize)> {
        let counted = filter::domain_tags(&self.buffer.snapshot(), usize::MAX);
        let mut tags: Vec<(String, usize)> =
            counted.iter().take(DEFAULT_DOMAIN_TAGS).cloned().collect();

        for domain in self.domains.domains() {
            if tags.len() >= DEFAULT_DOMAIN_TAGS {
                break;
            }
            if !tags.iter().any(|(d, _)| *d == domain) {
                tags.push((domain, 0));
            }
        }

        if let Some(active) = &self.filter.domain_filter {
            if !tags.iter().any(|(d, _)| d == active) {
                let count = counted
                    .iter()
                    .find(|(d, _)| d == active)
                    .map_or(0, |(_, n)| *n);
                if tags.len() >= DEFAULT_DOMAIN_TAGS {
                    tags.pop();
                }
                tags.push((active.clone(), count));
            }
        }
        tags
    }

    pub fn request_count_label(&self) -> String {
        format!("{} requests", self.visible().len())
    }

    pub fn domain_memory(&self) -> &DomainMemory {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
