//! [`Query`] collection related to [`Cart`]s.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Product;
use crate::{
    domain::{cart, product, user, Cart},
    infra::{database, Catalog, Database},
    read::{self, cart::ResolveError},
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Cart`] of any [`cart::Status`] by its [`cart::Id`], without
/// resolving its [`Product`]s.
pub type ById = DatabaseQuery<By<Option<Cart>, cart::Id>>;

/// Queries the [`cart::Active`] of a user with its [`Product`]s resolved.
#[derive(Clone, Copy, Debug)]
pub struct Active {
    /// ID of the user owning the [`cart::Active`].
    pub user_id: user::Id,
}

impl Active {
    /// Creates a new [`Active`] [`Query`] for the provided user.
    #[must_use]
    pub fn of(user_id: user::Id) -> Self {
        Self { user_id }
    }
}

impl<Db, Cat> Query<Active> for Service<Db, Cat>
where
    Cat: Catalog,
    Db: Database<
        Select<By<Option<cart::Active>, user::Id>>,
        Ok = Option<cart::Active>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<read::Cart>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Active) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Active { user_id } = query;

        let Some(active) = self
            .database()
            .execute(Select(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        else {
            return Ok(None);
        };

        self.resolve_cart(active.into_inner())
            .map(Some)
            .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Error of [`Active`] [`Query`] execution.
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
    use crate::{
        command::{FindOrCreateCart, ReplaceCartItems},
        domain::{cart, user},
        infra::{catalog::mock, Memory},
        Query as _, Service,
    };

    use super::{Active, ById, ExecutionError};

    #[tokio::test]
    async fn finds_nothing_without_cart() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());

        let found = svc.execute(Active::of(user::Id::new())).await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn finds_resolved_active_cart() {
        let catalog = mock::Mutable::seeded();
        let svc = Service::new(Memory::new(), catalog.clone());
        let user_id = user::Id::new();
        let replaced = svc
            .execute(ReplaceCartItems {
                user_id,
                items: vec![cart::Item {
                    product_id: catalog.ids()[1],
                    count: cart::Count::new(2).unwrap(),
                }],
            })
            .await
            .unwrap();

        let found = svc.execute(Active::of(user_id)).await.unwrap();

        assert_eq!(found, Some(replaced));
    }

    #[tokio::test]
    async fn fails_on_unknown_product() {
        let catalog = mock::Mutable::seeded();
        let svc = Service::new(Memory::new(), catalog.clone());
        let user_id = user::Id::new();
        let product_id = catalog.ids()[0];
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

        let err = svc.execute(Active::of(user_id)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::DataIntegrity(id) if *id == product_id,
        ));
    }

    #[tokio::test]
    async fn finds_any_cart_by_id() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());
        let user_id = user::Id::new();
        let created = svc.execute(FindOrCreateCart { user_id }).await.unwrap();

        let found = svc.execute(ById::by(created.id)).await.unwrap();
        let unknown = svc.execute(ById::by(cart::Id::new())).await.unwrap();

        let found = found.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.status, cart::Status::Active);
        assert!(unknown.is_none());
    }
}
