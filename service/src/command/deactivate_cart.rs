//! [`Command`] for deactivating the [`cart::Active`] of a user.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{cart, user, Cart},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] retiring the [`cart::Active`] of a user as
/// [`cart::Status::Inactive`].
///
/// Returns the retired [`Cart`], or [`None`] if the user has no
/// [`cart::Active`].
#[derive(Clone, Copy, Debug, From)]
pub struct DeactivateCart {
    /// ID of the user whose [`Cart`] should be deactivated.
    pub user_id: user::Id,
}

impl<Db, Cat> Command<DeactivateCart> for Service<Db, Cat>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Cart, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<cart::Active>, user::Id>>,
            Ok = Option<cart::Active>,
            Err = Traced<database::Error>,
        > + Database<Update<Cart>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Option<Cart>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeactivateCart,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeactivateCart { user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon `Cart`s of the same user.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let Some(active) = tx
            .execute(Select(By::<Option<cart::Active>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        else {
            return Ok(None);
        };

        let cart = active.deactivate();
        tx.execute(Update(cart.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!("`Cart(id: {})` deactivated", cart.id);

        Ok(Some(cart))
    }
}

/// Error of [`DeactivateCart`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{CreateCart, FindOrCreateCart},
        domain::{cart, user},
        infra::{catalog::mock, Memory},
        query, Command as _, Service,
    };

    use super::DeactivateCart;

    #[tokio::test]
    async fn retires_active_cart() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());
        let user_id = user::Id::new();
        let active = svc.execute(FindOrCreateCart { user_id }).await.unwrap();

        let retired = svc
            .execute(DeactivateCart { user_id })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(retired.id, active.id);
        assert_eq!(retired.status, cart::Status::Inactive);
        assert!(retired.updated_at >= active.updated_at);
        let found = svc.execute(query::cart::Active::of(user_id)).await;
        assert!(found.unwrap().is_none());
    }

    #[tokio::test]
    async fn does_nothing_without_active_cart() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());
        let user_id = user::Id::new();

        let retired = svc.execute(DeactivateCart { user_id }).await.unwrap();

        assert!(retired.is_none());
        assert!(svc.database().carts_of(user_id).await.is_empty());
    }

    #[tokio::test]
    async fn allows_new_cart_afterwards() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());
        let user_id = user::Id::new();
        let first = svc.execute(CreateCart { user_id }).await.unwrap();
        _ = svc.execute(DeactivateCart { user_id }).await.unwrap();

        let second = svc.execute(CreateCart { user_id }).await.unwrap();

        assert_ne!(first.id, second.id);
        let stored = svc
            .execute(query::cart::ById::by(first.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, cart::Status::Inactive);
        assert_eq!(svc.database().active_carts_count(user_id).await, 1);
    }
}
