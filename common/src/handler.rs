//! [`Handler`] abstraction.
//!
//! Database operations, [`Service`] commands and queries are all expressed
//! as [`Handler`]s of their arguments, so a caller only states which
//! operations it needs in its `where` clause.
//!
//! [`Service`]: https://docs.rs/service

use std::future::Future;

/// Asynchronous handler of `Args`.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
