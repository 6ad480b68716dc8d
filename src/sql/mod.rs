//! Query descriptors, criteria lowering, and safe SQL rendering.

mod builder;
mod converter;
mod descriptor;
pub mod params;

pub use builder::{count, delete, insert, select, update, QueryBuf};
pub(crate) use builder::{qualified_table, quoted};
pub use converter::CriteriaConverter;
pub use descriptor::{CompareOp, OrderBy, Predicate, QueryDescriptor};
pub use params::PgBindValue;
