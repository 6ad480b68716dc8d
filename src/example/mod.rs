//! Example catalogue: named records with a uniqueness rule enforced by the service.

mod entity;
mod repository;
mod service;

pub use entity::{examples_table, Example};
pub use repository::{ExampleRepository, ExampleStore};
pub use service::{CreateExample, ExampleService, UpdateExample};
