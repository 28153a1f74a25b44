//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::{timed, NonTx};

/// Transactional Postgres database client.
///
/// Takes a [`Connection`] from the [`connection::Pool`] and starts a
/// transaction lazily, on the first executed statement. The transaction is
/// rolled back if the last clone of this client is dropped before
/// [`Tx::commit()`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client to take the [`Connection`] from.
    non_tx: NonTx,

    /// Lazily started [`connection::Tx`].
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            non_tx: client,
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns underlying [`Connection`] of this [`Tx`] client, starting the
    /// transaction if it's not started yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let connection = self.tx.read().await;
        let guard = if connection.is_none() {
            drop(connection);

            let mut connection = self.tx.write().await;
            if connection.is_none() {
                let conn = self
                    .non_tx
                    .connection()
                    .await
                    .map_err(tracerr::wrap!())?;
                *connection = Some(
                    connection::Tx::begin(conn)
                        .await
                        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                        .map_err(tracerr::map_from)?,
                );
            }

            connection.downgrade()
        } else {
            connection
        };

        Ok(RwLockReadGuard::map(guard, |conn| {
            conn.as_ref()
                .expect("transaction cannot be taken while guard is alive")
        }))
    }

    /// Commits this [`Tx`] client.
    ///
    /// Next time this [`Tx`] client is used, it will start a new transaction.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            // Nothing was executed, so nothing to commit.
            return Ok(());
        };
        timed(self.non_tx.timeout, async {
            tx.commit()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        })
        .await
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        timed(self.non_tx.timeout, async {
            self.connection()
                .await
                .map_err(tracerr::wrap!())?
                .transaction()
                .query(stmt, params)
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        })
        .await
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        timed(self.non_tx.timeout, async {
            self.connection()
                .await
                .map_err(tracerr::wrap!())?
                .transaction()
                .query_opt(stmt, params)
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        })
        .await
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        timed(self.non_tx.timeout, async {
            self.connection()
                .await
                .map_err(tracerr::wrap!())?
                .transaction()
                .execute(stmt, params)
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        })
        .await
    }
}
