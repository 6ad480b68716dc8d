//! Generic repository over any [`Entity`] backed by a [`Store`].
//!
//! Entities travel as JSON: serde produces camelCase fields, [`case`](crate::case)
//! renames them to columns, and the store sees plain rows.

use crate::case::{fields_to_row, row_to_fields};
use crate::criteria::{Criteria, Filter};
use crate::error::{AppError, Resource};
use crate::response::PaginatedResult;
use crate::sql::{CriteriaConverter, Predicate, QueryDescriptor};
use crate::store::{Row, Store};
use crate::table::{TableSpec, ID_COLUMN};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use uuid::Uuid;

/// A persisted record type: its table, how it is named in errors, and its id.
pub trait Entity: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    const RESOURCE: Resource;

    fn table() -> &'static TableSpec;

    /// `None` until first saved.
    fn id(&self) -> Option<Uuid>;
}

/// Field/value pairs matched with equality, AND-combined.
pub type Partial<'a> = [(&'a str, Value)];

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, AppError>;

    async fn find_one(&self, partial: &Partial<'_>) -> Result<Option<T>, AppError>;

    async fn find_by(&self, partial: &Partial<'_>) -> Result<Vec<T>, AppError>;

    /// One page of matches plus the total over the same filters.
    async fn find_many_by_criteria(&self, criteria: &Criteria) -> Result<PaginatedResult<T>, AppError>;

    async fn find_many(&self, partial: Option<&Partial<'_>>) -> Result<Vec<T>, AppError>;

    async fn find_all(&self) -> Result<Vec<T>, AppError>;

    /// Build an unsaved entity from a partial JSON object laid over `T::default()`.
    fn create(&self, partial: Value) -> Result<T, AppError>;

    /// Insert or update; returns the stored state with generated fields filled.
    async fn save(&self, entity: T) -> Result<T, AppError>;

    async fn save_many(&self, entities: Vec<T>) -> Result<Vec<T>, AppError>;

    async fn delete(&self, entity: &T) -> Result<(), AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

pub(crate) fn to_row<T: Entity>(entity: &T) -> Result<Row, AppError> {
    match serde_json::to_value(entity)? {
        Value::Object(fields) => Ok(fields_to_row(fields)),
        other => Err(AppError::InvalidInput(format!(
            "{} did not serialize to an object: {}",
            T::RESOURCE,
            other
        ))),
    }
}

pub(crate) fn from_row<T: Entity>(row: Row) -> Result<T, AppError> {
    Ok(serde_json::from_value(Value::Object(row_to_fields(row)))?)
}

pub struct EntityRepository<T, S> {
    store: S,
    converter: CriteriaConverter,
    _entity: PhantomData<fn() -> T>,
}

impl<T, S: Clone> Clone for EntityRepository<T, S> {
    fn clone(&self) -> Self {
        EntityRepository {
            store: self.store.clone(),
            converter: self.converter,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity, S: Store> EntityRepository<T, S> {
    pub fn new(store: S) -> Self {
        EntityRepository {
            store,
            converter: CriteriaConverter,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run an already-lowered query. Entity repositories build their finders on this.
    pub async fn find_matching(&self, query: &QueryDescriptor) -> Result<Vec<T>, AppError> {
        self.store
            .fetch(T::table(), query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    fn partial_conditions(&self, partial: &Partial<'_>) -> Result<Vec<Predicate>, AppError> {
        partial
            .iter()
            .map(|(field, value)| {
                self.converter
                    .lower_filter(&Filter::equal(*field, value.clone()))
                    .map_err(AppError::from)
            })
            .collect()
    }
}

#[async_trait]
impl<T: Entity, S: Store> Repository<T> for EntityRepository<T, S> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, AppError> {
        let query = QueryDescriptor::matching(vec![Predicate::eq(ID_COLUMN, Value::String(id.to_string()))]).limit(1);
        Ok(self.find_matching(&query).await?.into_iter().next())
    }

    async fn find_one(&self, partial: &Partial<'_>) -> Result<Option<T>, AppError> {
        let query = QueryDescriptor::matching(self.partial_conditions(partial)?).limit(1);
        Ok(self.find_matching(&query).await?.into_iter().next())
    }

    async fn find_by(&self, partial: &Partial<'_>) -> Result<Vec<T>, AppError> {
        let query = QueryDescriptor::matching(self.partial_conditions(partial)?);
        self.find_matching(&query).await
    }

    async fn find_many_by_criteria(&self, criteria: &Criteria) -> Result<PaginatedResult<T>, AppError> {
        let query = self.converter.convert(criteria)?;
        let data = self.find_matching(&query).await?;
        let total = self.store.count(T::table(), &query.conditions).await?;
        tracing::debug!(
            table = T::table().table_name,
            total,
            returned = data.len(),
            "criteria query"
        );
        Ok(PaginatedResult::new(data, total, &criteria.pagination))
    }

    async fn find_many(&self, partial: Option<&Partial<'_>>) -> Result<Vec<T>, AppError> {
        match partial {
            Some(p) => self.find_by(p).await,
            None => self.find_all().await,
        }
    }

    async fn find_all(&self) -> Result<Vec<T>, AppError> {
        self.find_matching(&QueryDescriptor::default()).await
    }

    fn create(&self, partial: Value) -> Result<T, AppError> {
        let Value::Object(fields) = partial else {
            return Err(AppError::InvalidInput(format!("{} fields must be an object", T::RESOURCE)));
        };
        let mut base = match serde_json::to_value(T::default())? {
            Value::Object(m) => m,
            _ => serde_json::Map::new(),
        };
        base.extend(fields);
        Ok(serde_json::from_value(Value::Object(base))?)
    }

    async fn save(&self, entity: T) -> Result<T, AppError> {
        let row = self.store.upsert(T::table(), to_row(&entity)?).await?;
        from_row(row)
    }

    async fn save_many(&self, entities: Vec<T>) -> Result<Vec<T>, AppError> {
        let rows = entities.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
        self.store
            .upsert_many(T::table(), rows)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    async fn delete(&self, entity: &T) -> Result<(), AppError> {
        if let Some(id) = entity.id() {
            let removed = self.store.delete(T::table(), &Value::String(id.to_string())).await?;
            if !removed {
                tracing::debug!(table = T::table().table_name, %id, "delete matched no row");
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.store.count(T::table(), &[]).await
    }
}
