//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the constraint allowing a single active cart per user.
pub const ACTIVE_CART_CONSTRAINT: &str = "carts_user_id_active_key";

/// [`Database`] error.
///
/// Never retried on its own: the caller decides whether to retry an operation
/// via [`Error::is_transient()`].
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }

    /// Checks if the error is a transient store failure (lost connection,
    /// timeout or aborted transaction), so the whole operation may be retried
    /// by the caller as is.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(_) => false,
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_transient(),
        }
    }

    /// Checks if the error is caused by an operation timing out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(_) => false,
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => matches!(e, postgres::Error::Timeout(_)),
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{memory, Error};

    #[test]
    fn constraint_violations_are_not_transient() {
        let unique = Error::from(memory::Error::UniqueViolation("carts_pkey"));
        let fkey = Error::from(memory::Error::ForeignKeyViolation(
            "orders_cart_id_fkey",
        ));

        assert!(unique.is_unique_violation(None));
        assert!(!unique.is_transient());
        assert!(!fkey.is_unique_violation(None));
        assert!(!fkey.is_transient());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn timeout_is_transient() {
        use std::time::Duration;

        use super::postgres;

        let err = Error::from(postgres::Error::Timeout(Duration::from_secs(5)));

        assert!(err.is_transient());
        assert!(err.is_timeout());
        assert!(!err.is_unique_violation(None));
    }
}
