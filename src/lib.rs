//! Nexus events: criteria-driven repositories over PostgreSQL and an event
//! lifecycle with bounded retries.

pub mod case;
pub mod config;
pub mod criteria;
pub mod either;
pub mod emitter;
pub mod error;
pub mod event;
pub mod example;
pub mod migration;
pub mod repository;
pub mod response;
pub mod sql;
pub mod store;
pub mod table;
pub mod telemetry;

pub use config::{DatabaseSettings, Settings};
pub use criteria::{Criteria, Filter, Operator, Pagination, Sort, SortDirection};
pub use either::{left, right, Either};
pub use emitter::{EventEmitter, ListenerRegistry};
pub use error::{AppError, ConfigError, CriteriaError, Resource, ServiceError};
pub use event::{CreateEvent, Event, EventPatch, EventRepository, EventService, EventStatus, EventStore};
pub use example::{CreateExample, Example, ExampleRepository, ExampleService, ExampleStore, UpdateExample};
pub use migration::{ensure_database_exists, ensure_schema, schema_ddl};
pub use repository::{Entity, EntityRepository, Repository};
pub use response::{PageMeta, PaginatedResult};
pub use sql::{CriteriaConverter, QueryDescriptor};
pub use store::{MemoryStore, PgStore, Store};
pub use telemetry::init_tracing;
