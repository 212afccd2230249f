// Shared toilet/bath booking schedule over a live document store

pub mod booking;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod memory_store;
pub mod notify;
pub mod schedule;
pub mod store;
pub mod tracing_init;
pub mod validation;

// Re-export key types for convenience
pub use booking::{classify, window_end, Booking, BookingFields, BookingStatus, ResourceType, StatusTone};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ScheduleConfig};
pub use memory_store::InMemoryStore;
pub use notify::{Notification, Notifier, RecordingNotifier, Severity, TracingNotifier};
pub use schedule::{BookingView, LiveHandle, Schedule, ScheduleError, SweepReport};
pub use store::{Document, DocumentStore, Fields, StoreError, Subscription};
pub use validation::{BookingForm, ValidationError};
