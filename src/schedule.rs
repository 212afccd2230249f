// Booking component: validates and books, keeps the live view, sweeps expired
// bookings on every snapshot.
//
// The conflict check runs against this client's view and is not atomic with
// the write. Two clients whose views are stale can both book the same slot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{
    booking::{Booking, BookingStatus, ResourceType},
    clock::Clock,
    config::ScheduleConfig,
    conflict,
    notify::{Notification, Notifier},
    store::{Document, DocumentStore, StoreError},
    validation::{BookingForm, ValidationError},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("The {resource} is already booked at {start}")]
    Conflict {
        resource: ResourceType,
        start: DateTime<Utc>,
        existing_id: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// A booking together with its status at the time the view was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingView {
    pub booking: Booking,
    pub status: BookingStatus,
}

// Outcome of one sweep over a snapshot
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub swept: Vec<String>,
    pub failed: Vec<String>,
}

pub struct Schedule {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: ScheduleConfig,
    live: RwLock<Vec<Booking>>,
}

impl Schedule {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
            live: RwLock::new(vec![]),
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    // Validate, check for a clash with the live view, then write.
    // The form is reset only when the booking was stored.
    pub async fn submit(&self, form: &mut BookingForm) -> Result<String, ScheduleError> {
        let fields = match form.validate(self.config.max_duration_minutes) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!(error = %e, "submission dropped");
                if self.config.notify_validation_errors {
                    self.notifier
                        .notify(Notification::error(e.to_string(), self.config.auto_close()));
                }
                return Err(e.into());
            }
        };

        let clash = {
            let now = self.clock.now();
            let live = self.live.read();
            let current = live
                .iter()
                .filter(|b| b.status_at(now) != BookingStatus::Expired);
            conflict::find_conflict(&fields, current).map(|b| b.id.clone())
        };

        if let Some(existing_id) = clash {
            tracing::warn!(
                resource = %fields.resource,
                start = %fields.start,
                existing_id = %existing_id,
                "booking rejected: slot already taken"
            );
            self.notifier.notify(Notification::error(
                format!(
                    "The {} is already booked for this time. Please pick another slot.",
                    fields.resource
                ),
                self.config.auto_close(),
            ));
            return Err(ScheduleError::Conflict {
                resource: fields.resource,
                start: fields.start,
                existing_id,
            });
        }

        let doc = fields
            .to_fields()
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        let id = self.store.create(&self.config.collection, doc).await?;

        tracing::info!(
            id = %id,
            name = %fields.name,
            resource = %fields.resource,
            start = %fields.start,
            duration_minutes = fields.duration_minutes,
            "booking created"
        );
        self.notifier.notify(Notification::success(
            format!("Booked the {} for {}", fields.resource, fields.name),
            self.config.auto_close(),
        ));

        form.reset();
        Ok(id)
    }

    // Replace the live view with `docs`, then delete every expired booking
    pub async fn apply_snapshot(&self, docs: Vec<Document>) -> SweepReport {
        let bookings: Vec<Booking> = docs
            .iter()
            .filter_map(|doc| match Booking::from_document(doc) {
                Ok(booking) => Some(booking),
                Err(e) => {
                    tracing::warn!(id = %doc.id, error = %e, "skipping undecodable booking");
                    None
                }
            })
            .collect();

        let now = self.clock.now();
        let expired: Vec<String> = bookings
            .iter()
            .filter(|b| b.status_at(now) == BookingStatus::Expired)
            .map(|b| b.id.clone())
            .collect();

        tracing::debug!(
            total = bookings.len(),
            expired = expired.len(),
            "snapshot received"
        );
        *self.live.write() = bookings;

        if expired.is_empty() {
            return SweepReport::default();
        }

        let collection = self.config.collection.as_str();
        let results = join_all(
            expired
                .iter()
                .map(|id| async move { (id, self.store.delete(collection, id).await) }),
        )
        .await;

        let mut report = SweepReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.swept.push(id.clone()),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "failed to sweep expired booking");
                    report.failed.push(id.clone());
                }
            }
        }

        report
    }

    // Status-tagged bookings, earliest first
    pub fn bookings(&self) -> Vec<BookingView> {
        let now = self.clock.now();
        let mut views: Vec<BookingView> = self
            .live
            .read()
            .iter()
            .map(|b| BookingView {
                booking: b.clone(),
                status: b.status_at(now),
            })
            .collect();

        views.sort_by(|a, b| a.booking.start.cmp(&b.booking.start));
        views
    }

    // Subscribe to the collection and keep the view current until the
    // returned handle is stopped or dropped.
    pub async fn listen(self: Arc<Self>) -> Result<LiveHandle, ScheduleError> {
        let mut subscription = self.store.subscribe(&self.config.collection).await?;
        let collection = self.config.collection.clone();
        tracing::info!(collection = %collection, "listening for booking updates");

        let task = tokio::spawn(async move {
            while let Some(docs) = subscription.next().await {
                self.apply_snapshot(docs).await;
            }
            tracing::debug!(collection = %subscription.collection(), "snapshot feed ended");
        });

        Ok(LiveHandle {
            collection,
            task: Some(task),
        })
    }
}

// Keeps the listener alive; stopping or dropping it releases the subscription
#[derive(Debug)]
pub struct LiveHandle {
    collection: String,
    task: Option<JoinHandle<()>>,
}

impl LiveHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // the subscription is dropped with the aborted task
            let _ = task.await;
            tracing::info!(collection = %self.collection, "stopped listening");
        }
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
