//! Infrastructure layer.

pub mod catalog;
pub mod database;

pub use self::{catalog::Catalog, database::Database};
#[cfg(any(test, feature = "memory"))]
pub use self::database::{memory, Memory};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
