//! [`Command`] for creating a new empty [`Cart`].

use common::operations::{Commit, Insert, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{cart, user, Cart},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new empty [`cart::Active`] of a user.
///
/// Doesn't look for an existing [`cart::Active`], so fails if the user has
/// one already. Use [`FindOrCreateCart`] to obtain a [`Cart`] to mutate.
///
/// [`FindOrCreateCart`]: super::FindOrCreateCart
#[derive(Clone, Copy, Debug, From)]
pub struct CreateCart {
    /// ID of the user to create a [`Cart`] for.
    pub user_id: user::Id,
}

impl<Db, Cat> Command<CreateCart> for Service<Db, Cat>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Insert<Cart>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Cart;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateCart) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCart { user_id } = cmd;

        let cart = cart::Active::new(user_id).into_inner();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let inserted = tx.execute(Insert(cart.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref()
                .is_unique_violation(Some(database::ACTIVE_CART_CONSTRAINT))
            {
                return Err(tracerr::new!(E::ActiveCartExists(user_id)));
            }
        }
        inserted.map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!(
            "`Cart(id: {})` created for `User(id: {user_id})`",
            cart.id,
        );

        Ok(cart)
    }
}

/// Error of [`CreateCart`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// User has a [`cart::Active`] already.
    #[display("`User(id: {_0})` has an active `Cart` already")]
    #[from(ignore)]
    ActiveCartExists(#[error(not(source))] user::Id),
}
