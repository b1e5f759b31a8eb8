//! Session storage: the in-memory capture ring and persisted preferences

mod capture_buffer;
mod preferences;

pub use capture_buffer::{CaptureBuffer, DEFAULT_CAPACITY};
pub use preferences::{
    DomainMemory, DomainMemoryEntry, PreferenceStore, Preferences, DOMAIN_RETENTION_DAYS,
    MAX_REMEMBERED_DOMAINS, MIN_DETAILS_PANEL_WIDTH,
};
