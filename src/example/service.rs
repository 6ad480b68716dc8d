use super::entity::Example;
use super::repository::ExampleRepository;
use crate::criteria::Criteria;
use crate::either::Either;
use crate::error::{AppError, Resource, ServiceError};
use crate::response::PaginatedResult;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateExample {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to active.
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateExample {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
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

fn check_description(description: &str) -> Result<(), ServiceError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ServiceError::InvalidArgument(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

/// Names are unique across examples; the check happens here, not in storage.
pub struct ExampleService<R> {
    repository: R,
}

impl<R: ExampleRepository> ExampleService<R> {
    pub fn new(repository: R) -> Self {
        ExampleService { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn create(&self, input: CreateExample) -> Either<ServiceError, Example> {
        self.try_create(input).await.into()
    }

    async fn try_create(&self, input: CreateExample) -> Result<Example, ServiceError> {
        check_name(&input.name)?;
        if let Some(d) = &input.description {
            check_description(d)?;
        }
        let taken = self
            .repository
            .find_by_name(&input.name)
            .await
            .map_err(failed("create example"))?;
        if taken.is_some() {
            return Err(ServiceError::AlreadyExists(Resource::Example));
        }
        let draft = self
            .repository
            .create(json!({
                "name": input.name,
                "description": input.description,
                "active": input.active.unwrap_or(true),
            }))
            .map_err(failed("create example"))?;
        let saved = self.repository.save(draft).await.map_err(failed("create example"))?;
        tracing::info!(example_id = ?saved.id, name = %saved.name, "example created");
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Either<ServiceError, Example> {
        self.load(id, "find example").await.into()
    }

    pub async fn find_many_by_criteria(&self, criteria: &Criteria) -> Either<ServiceError, PaginatedResult<Example>> {
        self.repository
            .find_many_by_criteria(criteria)
            .await
            .map_err(failed("fetch examples"))
            .into()
    }

    pub async fn update(&self, id: Uuid, patch: UpdateExample) -> Either<ServiceError, Example> {
        self.try_update(id, patch).await.into()
    }

    async fn try_update(&self, id: Uuid, patch: UpdateExample) -> Result<Example, ServiceError> {
        let mut example = self.load(id, "update example").await?;
        if let Some(name) = patch.name {
            check_name(&name)?;
            if name != example.name {
                let clash = self
                    .repository
                    .find_by_name(&name)
                    .await
                    .map_err(failed("update example"))?;
                if clash.is_some_and(|other| other.id != Some(id)) {
                    return Err(ServiceError::AlreadyExists(Resource::Example));
                }
            }
            example.name = name;
        }
        if let Some(description) = patch.description {
            check_description(&description)?;
            example.description = Some(description);
        }
        if let Some(active) = patch.active {
            example.active = active;
        }
        let saved = self.repository.save(example).await.map_err(failed("update example"))?;
        tracing::info!(example_id = %id, "example updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: Uuid) -> Either<ServiceError, ()> {
        self.try_delete(id).await.into()
    }

    async fn try_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let example = self.load(id, "delete example").await?;
        self.repository.delete(&example).await.map_err(failed("delete example"))?;
        tracing::info!(example_id = %id, "example deleted");
        Ok(())
    }

    /// Every active example as one page.
    pub async fn find_active_examples(&self) -> Either<ServiceError, PaginatedResult<Example>> {
        self.repository
            .find_active_examples()
            .await
            .map(PaginatedResult::single_page)
            .map_err(failed("fetch active examples"))
            .into()
    }

    async fn load(&self, id: Uuid, operation: &'static str) -> Result<Example, ServiceError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(failed(operation))?
            .ok_or(ServiceError::NotFound(Resource::Example))
    }
}
