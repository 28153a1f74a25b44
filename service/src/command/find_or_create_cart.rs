//! [`Command`] for obtaining the [`cart::Active`] of a user.

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Product;
use crate::{
    domain::{cart, product, user, Cart},
    infra::{database, Catalog, Database},
    read::{self, cart::ResolveError},
    Service,
};

use super::Command;

/// [`Command`] returning the [`cart::Active`] of a user, creating a new empty
/// one if the user has none.
#[derive(Clone, Copy, Debug, From)]
pub struct FindOrCreateCart {
    /// ID of the user to find or create a [`Cart`] for.
    pub user_id: user::Id,
}

impl<Db, Cat> Command<FindOrCreateCart> for Service<Db, Cat>
where
    Cat: Catalog,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Cart, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<cart::Active>, user::Id>>,
            Ok = Option<cart::Active>,
            Err = Traced<database::Error>,
        > + Database<Insert<Cart>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = read::Cart;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: FindOrCreateCart,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let FindOrCreateCart { user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon `Cart`s of the same user.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let active = tx
            .execute(Select(By::<Option<cart::Active>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let cart = if let Some(active) = active {
            active.into_inner()
        } else {
            let cart = cart::Active::new(user_id).into_inner();
            tx.execute(Insert(cart.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            log::debug!(
                "`Cart(id: {})` created for `User(id: {user_id})`",
                cart.id,
            );
            cart
        };

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.resolve_cart(cart)
            .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Error of [`FindOrCreateCart`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Cart`] refers to a [`Product`] unknown to the [`Catalog`].
    #[display("`Cart` refers to unknown `Product(id: {_0})`")]
    #[from(ignore)]
    DataIntegrity(#[error(not(source))] product::Id),

    /// Total price of the [`Cart`] is too large to be represented.
    #[display("Total price of `Cart(id: {_0})` overflows")]
    #[from(ignore)]
    TotalOverflow(#[error(not(source))] cart::Id),
}

impl From<ResolveError> for ExecutionError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UnknownProduct(id) => Self::DataIntegrity(id),
            ResolveError::TotalOverflow(id) => Self::TotalOverflow(id),
        }
    }
}

#[cfg(test)]
mod spec {
    use futures::future;

    use crate::{
        command::ReplaceCartItems,
        domain::{cart, user},
        infra::{catalog::mock, Memory},
        Command as _, Service,
    };

    use super::FindOrCreateCart;

    #[tokio::test]
    async fn creates_cart_once() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());
        let user_id = user::Id::new();

        let first = svc.execute(FindOrCreateCart { user_id }).await.unwrap();
        let second = svc.execute(FindOrCreateCart { user_id }).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, cart::Status::Active);
        assert_eq!(svc.database().carts_of(user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn returns_existing_items() {
        let catalog = mock::Mutable::seeded();
        let svc = Service::new(Memory::new(), catalog.clone());
        let user_id = user::Id::new();
        let items = vec![cart::Item {
            product_id: catalog.ids()[0],
            count: cart::Count::new(3).unwrap(),
        }];
        let replaced = svc
            .execute(ReplaceCartItems { user_id, items })
            .await
            .unwrap();

        let found = svc.execute(FindOrCreateCart { user_id }).await.unwrap();

        assert_eq!(found, replaced);
    }

    #[tokio::test]
    async fn keeps_single_active_cart_under_concurrency() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());
        let user_id = user::Id::new();

        let carts = future::join_all(
            (0..16).map(|_| svc.execute(FindOrCreateCart { user_id })),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

        assert!(carts.iter().all(|c| c.id == carts[0].id));
        assert_eq!(svc.database().carts_of(user_id).await.len(), 1);
        assert_eq!(svc.database().active_carts_count(user_id).await, 1);
    }

    #[tokio::test]
    async fn reports_unknown_products() {
        let catalog = mock::Mutable::seeded();
        let svc = Service::new(Memory::new(), catalog.clone());
        let user_id = user::Id::new();
        let product_id = catalog.ids()[1];
        _ = svc
            .execute(ReplaceCartItems {
                user_id,
                items: vec![cart::Item {
                    product_id,
                    count: cart::Count::new(1).unwrap(),
                }],
            })
            .await
            .unwrap();
        catalog.remove(product_id);

        let err = svc
            .execute(FindOrCreateCart { user_id })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            super::ExecutionError::DataIntegrity(id) if *id == product_id,
        ));
    }
}
