use super::entity::Example;
use crate::error::AppError;
use crate::repository::{EntityRepository, Repository};
use crate::store::Store;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ExampleRepository: Repository<Example> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Example>, AppError>;

    async fn find_active_examples(&self) -> Result<Vec<Example>, AppError>;
}

pub type ExampleStore<S> = EntityRepository<Example, S>;

#[async_trait]
impl<S: Store> ExampleRepository for EntityRepository<Example, S> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Example>, AppError> {
        self.find_one(&[("name", Value::from(name))]).await
    }

    async fn find_active_examples(&self) -> Result<Vec<Example>, AppError> {
        self.find_by(&[("active", Value::Bool(true))]).await
    }
}
