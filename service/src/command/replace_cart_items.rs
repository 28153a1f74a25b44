//! [`Command`] for replacing all the [`cart::Item`]s of a [`Cart`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
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

/// [`Command`] replacing all the [`cart::Item`]s of the [`cart::Active`] of a
/// user with the provided ones, creating the [`Cart`] if the user has none.
///
/// Items are never merged: the provided [`cart::Item`]s become the complete
/// new set, so repeating the [`Command`] has no further effect.
#[derive(Clone, Debug)]
pub struct ReplaceCartItems {
    /// ID of the user whose [`Cart`] should be updated.
    pub user_id: user::Id,

    /// New [`cart::Item`]s of the [`Cart`].
    pub items: Vec<cart::Item>,
}

impl<Db, Cat> Command<ReplaceCartItems> for Service<Db, Cat>
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
        + Database<Update<Cart>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = read::Cart;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ReplaceCartItems,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReplaceCartItems { user_id, items } = cmd;

        let unknown = items
            .iter()
            .map(|i| i.product_id)
            .filter(|id| self.catalog().product(id).is_none())
            .unique()
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            return Err(tracerr::new!(E::InvalidProducts(unknown)));
        }
        let duplicated = items
            .iter()
            .map(|i| i.product_id)
            .duplicates()
            .collect::<Vec<_>>();
        if !duplicated.is_empty() {
            return Err(tracerr::new!(E::DuplicateProducts(duplicated)));
        }

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
        let cart = if let Some(mut active) = active {
            active.replace_items(items);
            let cart = active.into_inner();
            tx.execute(Update(cart.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            cart
        } else {
            let mut active = cart::Active::new(user_id);
            active.replace_items(items);
            let cart = active.into_inner();
            tx.execute(Insert(cart.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            log::debug!(
                "`Cart(id: {})` created for `User(id: {user_id})`",
                cart.id,
            );
            cart
        };

        // Resolved before committing, so nothing is stored if it fails.
        let cart = self
            .resolve_cart(cart)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!(
            "`Cart(id: {})` items replaced with {} item(s)",
            cart.id,
            cart.items.len(),
        );

        Ok(cart)
    }
}

/// Error of [`ReplaceCartItems`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`cart::Item`]s refer to [`Product`]s unknown to the [`Catalog`].
    #[display("Unknown `Product`s: {}", _0.iter().join(", "))]
    #[from(ignore)]
    InvalidProducts(#[error(not(source))] Vec<product::Id>),

    /// Several [`cart::Item`]s refer to the same [`Product`]s.
    #[display("Duplicated `Product`s: {}", _0.iter().join(", "))]
    #[from(ignore)]
    DuplicateProducts(#[error(not(source))] Vec<product::Id>),

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
