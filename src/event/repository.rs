use super::entity::{Event, EventStatus};
use crate::error::AppError;
use crate::repository::{EntityRepository, Repository};
use crate::sql::{CompareOp, Predicate, QueryDescriptor};
use crate::store::Store;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait EventRepository: Repository<Event> {
    async fn find_by_status(&self, status: EventStatus) -> Result<Vec<Event>, AppError>;

    /// Events with at least `min_retry_count` retries.
    async fn find_by_retry_count(&self, min_retry_count: u32) -> Result<Vec<Event>, AppError>;

    async fn find_pending_events(&self) -> Result<Vec<Event>, AppError> {
        self.find_by_status(EventStatus::Pending).await
    }

    async fn find_failed_events(&self) -> Result<Vec<Event>, AppError> {
        self.find_by_status(EventStatus::Error).await
    }
}

pub type EventStore<S> = EntityRepository<Event, S>;

#[async_trait]
impl<S: Store> EventRepository for EntityRepository<Event, S> {
    async fn find_by_status(&self, status: EventStatus) -> Result<Vec<Event>, AppError> {
        self.find_by(&[("status", Value::from(status.as_str()))]).await
    }

    async fn find_by_retry_count(&self, min_retry_count: u32) -> Result<Vec<Event>, AppError> {
        let query = QueryDescriptor::matching(vec![Predicate::Compare {
            column: "retry_count".into(),
            op: CompareOp::Gte,
            value: Value::from(min_retry_count),
        }]);
        self.find_matching(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn seeded() -> EventStore<MemoryStore> {
        let repo = EventStore::new(MemoryStore::new());
        for (name, status, retries) in [
            ("a", "pending", 0),
            ("b", "error", 2),
            ("c", "error", 5),
            ("d", "success", 1),
        ] {
            let e = repo
                .create(json!({ "name": name, "status": status, "retryCount": retries }))
                .unwrap();
            repo.save(e).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn status_finders() {
        let repo = seeded().await;
        assert_eq!(repo.find_pending_events().await.unwrap().len(), 1);
        assert_eq!(repo.find_failed_events().await.unwrap().len(), 2);
        assert_eq!(repo.find_by_status(EventStatus::Cancelled).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn retry_count_is_a_lower_bound() {
        let repo = seeded().await;
        let mut names: Vec<_> = repo
            .find_by_retry_count(2)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, ["b", "c"]);
    }
}
