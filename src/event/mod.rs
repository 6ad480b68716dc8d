//! Events: entity, repository, and the retry state machine.

mod entity;
mod repository;
mod service;

pub use entity::{events_table, Event, EventStatus, EVENT_STATUS_TYPE};
pub use repository::{EventRepository, EventStore};
pub use service::{CreateEvent, EventPatch, EventService, DEFAULT_MAX_RETRIES, MAX_RETRIES, MIN_RETRIES};
