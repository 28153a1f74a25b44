//! Postgres database client definitions.

pub mod non_tx;
pub mod tx;

use std::{future::Future, time::Duration};

use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use self::{non_tx::NonTx, tx::Tx};

/// Awaits the provided database operation for no longer than `timeout`.
async fn timed<T>(
    timeout: Duration,
    op: impl Future<Output = Result<T, Traced<database::Error>>>,
) -> Result<T, Traced<database::Error>> {
    match tokio::time::timeout(timeout, op).await {
        Ok(res) => res.map_err(tracerr::wrap!()),
        Err(_) => Err(tracerr::map_from(tracerr::new!(
            postgres::Error::Timeout(timeout)
        ))),
    }
}
