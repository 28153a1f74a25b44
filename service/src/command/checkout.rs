//! [`Command`] for placing an [`Order`] out of the [`cart::Active`] of a user.

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Product;
use crate::{
    domain::{cart, order, product, user, Cart, Order},
    infra::{database, Catalog, Database},
    read::cart::ResolveError,
    Service,
};

use super::Command;

/// [`Command`] placing an [`Order`] out of the [`cart::Active`] of a user.
///
/// Total of the [`Order`] is computed by the current [`Product`] prices and
/// never changes afterwards. The [`Cart`] becomes [`cart::Status::Ordered`]
/// along with the [`Order`] being stored.
#[derive(Clone, Debug)]
pub struct Checkout {
    /// ID of the user placing an [`Order`].
    pub user_id: user::Id,

    /// [`order::Payment`] details of the [`Order`].
    pub payment: order::Payment,

    /// [`order::Delivery`] details of the [`Order`].
    pub delivery: order::Delivery,

    /// [`order::Comments`] of the [`Order`].
    pub comments: order::Comments,
}

impl<Db, Cat> Command<Checkout> for Service<Db, Cat>
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
        > + Database<Insert<Order>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Cart>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: Checkout) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Checkout {
            user_id,
            payment,
            delivery,
            comments,
        } = cmd;

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
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NoActiveCart(user_id))
            .map_err(tracerr::wrap!())?;

        let total = self
            .resolve_cart(active.as_ref().clone())
            .map_err(tracerr::from_and_wrap!(=> E))?
            .total;

        let order = Order {
            id: order::Id::new(),
            user_id,
            cart_id: active.id,
            payment,
            delivery,
            comments,
            status: order::Status::Ordered,
            total,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Update(active.order()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Order(id: {})` placed by `User(id: {user_id})` out of \
             `Cart(id: {})` with total {}",
            order.id,
            order.cart_id,
            order.total,
        );

        Ok(order)
    }
}

/// Error of [`Checkout`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// User has no [`cart::Active`] to check out.
    #[display("`User(id: {_0})` has no active `Cart`")]
    #[from(ignore)]
    NoActiveCart(#[error(not(source))] user::Id),

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
