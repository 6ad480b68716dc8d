//! Event lifecycle: creation, patching, and the bounded retry state machine.

use super::entity::{Event, EventStatus};
use super::repository::EventRepository;
use crate::criteria::Criteria;
use crate::either::Either;
use crate::emitter::EventEmitter;
use crate::error::{AppError, Resource, ServiceError};
use crate::response::PaginatedResult;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub const MIN_RETRIES: u32 = 1;
pub const MAX_RETRIES: u32 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 5;

const MAX_NAME_LEN: usize = 255;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub name: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Fields left `None` are not touched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub name: Option<String>,
    pub data: Option<Value>,
    pub status: Option<EventStatus>,
    pub error: Option<String>,
    pub cancellation_reason: Option<String>,
}

fn failed(operation: &'static str) -> impl FnOnce(AppError) -> ServiceError {
    move |e| ServiceError::from_app(operation, e)
}

fn check_name(name: &str) -> Result<(), ServiceError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(ServiceError::InvalidArgument(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn check_data(data: &Option<Value>) -> Result<(), ServiceError> {
    match data {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ServiceError::InvalidArgument("data must be an object".into())),
    }
}

pub struct EventService<R, E> {
    repository: R,
    emitter: E,
    default_max_retries: u32,
}

impl<R: EventRepository, E: EventEmitter> EventService<R, E> {
    pub fn new(repository: R, emitter: E) -> Self {
        EventService {
            repository,
            emitter,
            default_max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Budget used by `retry` when the caller passes none.
    pub fn with_default_max_retries(mut self, max_retries: u32) -> Self {
        self.default_max_retries = max_retries;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn create(&self, input: CreateEvent) -> Either<ServiceError, Event> {
        self.try_create(input).await.into()
    }

    async fn try_create(&self, input: CreateEvent) -> Result<Event, ServiceError> {
        check_name(&input.name)?;
        check_data(&input.data)?;
        let draft = self
            .repository
            .create(json!({
                "name": input.name,
                "data": input.data,
                "status": EventStatus::Pending,
                "retryCount": 0,
                "startTime": Utc::now(),
            }))
            .map_err(failed("create event"))?;
        let saved = self.repository.save(draft).await.map_err(failed("create event"))?;
        tracing::info!(event_id = ?saved.id, name = %saved.name, "event created");
        self.emitter.emit(&saved.name, &saved.payload());
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Either<ServiceError, Event> {
        self.load(id, "find event").await.into()
    }

    pub async fn find_many_by_criteria(&self, criteria: &Criteria) -> Either<ServiceError, PaginatedResult<Event>> {
        self.repository
            .find_many_by_criteria(criteria)
            .await
            .map_err(failed("fetch events"))
            .into()
    }

    pub async fn update(&self, id: Uuid, patch: EventPatch) -> Either<ServiceError, Event> {
        self.try_update(id, patch).await.into()
    }

    async fn try_update(&self, id: Uuid, patch: EventPatch) -> Result<Event, ServiceError> {
        let mut event = self.load(id, "update event").await?;
        if let Some(name) = patch.name {
            check_name(&name)?;
            event.name = name;
        }
        if patch.data.is_some() {
            check_data(&patch.data)?;
            event.data = patch.data;
        }
        if let Some(error) = patch.error {
            event.error = Some(error);
        }
        if let Some(reason) = patch.cancellation_reason {
            event.cancellation_reason = Some(reason);
        }
        if let Some(status) = patch.status {
            if status.is_terminal() && event.end_time.is_none() {
                event.end_time = Some(Utc::now());
            }
            event.status = status;
        }
        let saved = self.repository.save(event).await.map_err(failed("update event"))?;
        tracing::info!(event_id = %id, status = %saved.status, "event updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: Uuid) -> Either<ServiceError, ()> {
        self.try_delete(id).await.into()
    }

    async fn try_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let event = self.load(id, "delete event").await?;
        self.repository.delete(&event).await.map_err(failed("delete event"))?;
        tracing::info!(event_id = %id, "event deleted");
        Ok(())
    }

    /// Retry a pending or failed event. Once `retryCount` reaches the budget the
    /// event is cancelled and stored, then `RetryLimitExceeded` is returned.
    pub async fn retry(&self, id: Uuid, max_retries: Option<u32>) -> Either<ServiceError, Event> {
        self.try_retry(id, max_retries).await.into()
    }

    async fn try_retry(&self, id: Uuid, max_retries: Option<u32>) -> Result<Event, ServiceError> {
        let max_retries = max_retries.unwrap_or(self.default_max_retries);
        if !(MIN_RETRIES..=MAX_RETRIES).contains(&max_retries) {
            return Err(ServiceError::InvalidArgument(format!(
                "maxRetries must be between {} and {}",
                MIN_RETRIES, MAX_RETRIES
            )));
        }
        let mut event = self.load(id, "retry event").await?;
        match event.status {
            EventStatus::Success => {
                return Err(ServiceError::InvalidState("Cannot retry a successful event".into()))
            }
            EventStatus::Cancelled => {
                return Err(ServiceError::InvalidState("Cannot retry a cancelled event".into()))
            }
            EventStatus::Pending | EventStatus::Error => {}
        }

        if event.retry_count >= max_retries {
            event.status = EventStatus::Cancelled;
            event.cancellation_reason = Some(format!("Maximum retry attempts ({}) exceeded", max_retries));
            event.end_time = Some(Utc::now());
            self.repository.save(event).await.map_err(failed("retry event"))?;
            tracing::warn!(event_id = %id, max_retries, "retry budget exhausted, event cancelled");
            return Err(ServiceError::RetryLimitExceeded { max_retries });
        }

        event.retry_count += 1;
        event.status = EventStatus::Pending;
        event.start_time = Some(Utc::now());
        event.end_time = None;
        event.error = None;
        let saved = self.repository.save(event).await.map_err(failed("retry event"))?;
        tracing::info!(event_id = %id, retry_count = saved.retry_count, "event retried");
        self.emitter.emit(&saved.name, &saved.payload());
        Ok(saved)
    }

    /// Announce `name` to listeners without storing anything.
    pub fn execute_event(&self, name: &str, payload: &Value) {
        tracing::debug!(name, "execute event");
        self.emitter.emit(name, payload);
    }

    async fn load(&self, id: Uuid, operation: &'static str) -> Result<Event, ServiceError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(failed(operation))?
            .ok_or(ServiceError::NotFound(Resource::Event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::ListenerRegistry;
    use crate::event::EventStore;
    use crate::store::MemoryStore;
    use std::sync::{Arc, Mutex};

    type Service = EventService<EventStore<MemoryStore>, ListenerRegistry>;

    fn service() -> (Service, ListenerRegistry) {
        let emitter = ListenerRegistry::new();
        let service = EventService::new(EventStore::new(MemoryStore::new()), emitter.clone());
        (service, emitter)
    }

    fn record(emitter: &ListenerRegistry, name: &str) -> Arc<Mutex<Vec<Value>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        emitter.on(name, move |payload: &Value| sink.lock().unwrap().push(payload.clone()));
        seen
    }

    async fn created(service: &Service, name: &str) -> Event {
        service
            .create(CreateEvent {
                name: name.into(),
                data: Some(json!({ "orderId": 42 })),
            })
            .await
            .right()
            .unwrap()
    }

    #[tokio::test]
    async fn create_persists_pending_and_emits() {
        let (service, emitter) = service();
        let seen = record(&emitter, "order.shipped");
        let event = created(&service, "order.shipped").await;

        let found = service.find_by_id(event.id.unwrap()).await.right().unwrap();
        assert_eq!(found.status, EventStatus::Pending);
        assert_eq!(found.retry_count, 0);
        assert!(found.end_time.is_none());
        assert!(found.start_time.is_some());
        assert_eq!(*seen.lock().unwrap(), vec![json!({ "orderId": 42 })]);
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (service, _) = service();
        let empty = service.create(CreateEvent::default()).await;
        assert!(matches!(empty.left(), Some(ServiceError::InvalidArgument(_))));
        let long = service
            .create(CreateEvent {
                name: "x".repeat(256),
                data: None,
            })
            .await;
        assert!(long.is_left());
        let scalar = service
            .create(CreateEvent {
                name: "ok".into(),
                data: Some(json!("not an object")),
            })
            .await;
        assert!(scalar.is_left());
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let (service, _) = service();
        let id = Uuid::new_v4();
        let nf = Some(ServiceError::NotFound(Resource::Event));
        assert_eq!(service.find_by_id(id).await.left(), nf);
        assert_eq!(service.update(id, EventPatch::default()).await.left(), nf);
        assert_eq!(service.delete(id).await.left(), nf);
        assert_eq!(service.retry(id, None).await.left(), nf);
    }

    #[tokio::test]
    async fn terminal_update_stamps_end_time_once() {
        let (service, _) = service();
        let id = created(&service, "job").await.id.unwrap();
        let errored = service
            .update(
                id,
                EventPatch {
                    status: Some(EventStatus::Error),
                    error: Some("boom".into()),
                    ..Default::default()
                },
            )
            .await
            .right()
            .unwrap();
        let first_end = errored.end_time;
        assert!(first_end.is_some());
        assert_eq!(errored.error.as_deref(), Some("boom"));

        let again = service
            .update(
                id,
                EventPatch {
                    status: Some(EventStatus::Success),
                    ..Default::default()
                },
            )
            .await
            .right()
            .unwrap();
        assert_eq!(again.end_time, first_end);
        assert_eq!(again.status, EventStatus::Success);
    }

    #[tokio::test]
    async fn retry_counts_up_then_cancels() {
        let (service, emitter) = service();
        let seen = record(&emitter, "job");
        let id = created(&service, "job").await.id.unwrap();

        for expected in 1..=DEFAULT_MAX_RETRIES {
            let e = service.retry(id, None).await.right().unwrap();
            assert_eq!(e.retry_count, expected);
            assert_eq!(e.status, EventStatus::Pending);
        }
        let out = service.retry(id, None).await;
        assert_eq!(
            out.left(),
            Some(ServiceError::RetryLimitExceeded {
                max_retries: DEFAULT_MAX_RETRIES
            })
        );
        let stored = service.find_by_id(id).await.right().unwrap();
        assert_eq!(stored.status, EventStatus::Cancelled);
        assert_eq!(stored.cancellation_reason.as_deref(), Some("Maximum retry attempts (5) exceeded"));
        assert!(stored.end_time.is_some());
        // create plus one emission per successful retry
        assert_eq!(seen.lock().unwrap().len(), 1 + DEFAULT_MAX_RETRIES as usize);

        assert!(matches!(
            service.retry(id, None).await.left(),
            Some(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn retry_clears_error_and_end_time() {
        let (service, _) = service();
        let id = created(&service, "job").await.id.unwrap();
        service
            .update(
                id,
                EventPatch {
                    status: Some(EventStatus::Error),
                    error: Some("timeout".into()),
                    ..Default::default()
                },
            )
            .await
            .right()
            .unwrap();
        let retried = service.retry(id, Some(3)).await.right().unwrap();
        assert_eq!(retried.status, EventStatus::Pending);
        assert!(retried.error.is_none());
        assert!(retried.end_time.is_none());
    }

    #[tokio::test]
    async fn successful_events_cannot_retry() {
        let (service, _) = service();
        let id = created(&service, "job").await.id.unwrap();
        service
            .update(
                id,
                EventPatch {
                    status: Some(EventStatus::Success),
                    ..Default::default()
                },
            )
            .await
            .right()
            .unwrap();
        assert_eq!(
            service.retry(id, Some(10)).await.left(),
            Some(ServiceError::InvalidState("Cannot retry a successful event".into()))
        );
    }

    #[tokio::test]
    async fn retry_budget_must_be_in_range() {
        let (service, _) = service();
        let id = created(&service, "job").await.id.unwrap();
        for bad in [0, 11] {
            assert!(matches!(
                service.retry(id, Some(bad)).await.left(),
                Some(ServiceError::InvalidArgument(_))
            ));
        }
        let lenient = EventService::new(EventStore::new(MemoryStore::new()), ListenerRegistry::new())
            .with_default_max_retries(1);
        let id = lenient
            .create(CreateEvent {
                name: "once".into(),
                data: None,
            })
            .await
            .right()
            .unwrap()
            .id
            .unwrap();
        assert!(lenient.retry(id, None).await.is_right());
        assert!(lenient.retry(id, None).await.is_left());
    }

    #[tokio::test]
    async fn delete_then_gone() {
        let (service, _) = service();
        let id = created(&service, "job").await.id.unwrap();
        assert!(service.delete(id).await.is_right());
        assert!(service.find_by_id(id).await.is_left());
    }

    #[test]
    fn execute_event_only_emits() {
        let (service, emitter) = service();
        let seen = record(&emitter, "ping");
        service.execute_event("ping", &json!({ "n": 1 }));
        assert_eq!(*seen.lock().unwrap(), vec![json!({ "n": 1 })]);
    }
}
