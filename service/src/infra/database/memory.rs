//! In-memory [`Database`] implementation.
//!
//! Transactions are serializable: a [`Tx`] holds the whole [`State`]
//! exclusively from its first operation until it's committed or dropped, and
//! works on a staged copy, so dropping it without committing discards every
//! change.

use std::{collections::HashMap, future::Future, sync::Arc};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{cart, order, user, Cart, Order},
    infra::{database, Database},
};

use super::ACTIVE_CART_CONSTRAINT;

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Data stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`Cart`]s.
    carts: HashMap<cart::Id, Cart>,

    /// Stored [`Order`]s in their insertion order.
    orders: Vec<Order>,
}

impl State {
    /// Inserts the provided [`Cart`], checking its ID uniqueness and the single
    /// active [`Cart`] per user constraint.
    fn insert_cart(&mut self, cart: Cart) -> Result<(), Error> {
        if self.carts.contains_key(&cart.id) {
            return Err(Error::UniqueViolation("carts_pkey"));
        }
        let conflicts = cart.is_active()
            && self
                .carts
                .values()
                .any(|c| c.is_active() && c.user_id == cart.user_id);
        if conflicts {
            return Err(Error::UniqueViolation(ACTIVE_CART_CONSTRAINT));
        }
        _ = self.carts.insert(cart.id, cart);
        Ok(())
    }

    /// Inserts the provided [`Order`], checking its ID uniqueness and that it
    /// refers to a stored [`Cart`].
    fn insert_order(&mut self, order: Order) -> Result<(), Error> {
        if self.orders.iter().any(|o| o.id == order.id) {
            return Err(Error::UniqueViolation("orders_pkey"));
        }
        if !self.carts.contains_key(&order.cart_id) {
            return Err(Error::ForeignKeyViolation("orders_cart_id_fkey"));
        }
        self.orders.push(order);
        Ok(())
    }
}

/// Access to the [`State`] of a [`Memory`] database.
pub trait Storage {
    /// Runs the provided function over the [`State`].
    fn with_state<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> impl Future<Output = R>;
}

/// Non-transactional [`Memory`] database client.
///
/// Every operation is applied to the [`State`] right away.
#[derive(Clone, Debug, Default)]
pub struct NonTx(Arc<Mutex<State>>);

impl Storage for NonTx {
    async fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut *self.0.lock().await)
    }
}

/// Transactional [`Memory`] database client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`State`] this [`Tx`] is started on.
    state: Arc<Mutex<State>>,

    /// [`Staged`] changes of this [`Tx`], once it's started.
    staged: Arc<Mutex<Option<Staged>>>,
}

/// Changes of a started [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusive access to the [`State`] held until commit or drop.
    guard: OwnedMutexGuard<State>,

    /// Copy of the [`State`] the changes are applied to.
    state: State,
}

impl Tx {
    /// Applies the [`Staged`] changes of this [`Tx`] to the [`State`].
    async fn commit(&self) {
        if let Some(Staged { mut guard, state }) =
            self.staged.lock().await.take()
        {
            *guard = state;
        }
    }
}

impl Storage for Tx {
    async fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut staged = self.staged.lock().await;
        let mut current = match staged.take() {
            Some(s) => s,
            None => {
                let guard = Arc::clone(&self.state).lock_owned().await;
                let state = guard.clone();
                Staged { guard, state }
            }
        };
        let res = f(&mut current.state);
        *staged = Some(current);
        res
    }
}

/// [`Memory`] database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Foreign key constraint is violated.
    #[display("Foreign key constraint `{_0}` is violated")]
    ForeignKeyViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
            Self::ForeignKeyViolation(_) => false,
        }
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx {
            state: Arc::clone(&self.0 .0),
            staged: Arc::default(),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await;
        Ok(())
    }
}

impl<S: Storage> Database<Lock<By<Cart, user::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Cart, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transactions are serialized already.
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Option<Cart>, cart::Id>>> for Memory<S> {
    type Ok = Option<Cart>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Cart>, cart::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.with_state(|s| s.carts.get(&id).cloned()).await)
    }
}

impl<S: Storage> Database<Select<By<Option<cart::Active>, user::Id>>>
    for Memory<S>
{
    type Ok = Option<cart::Active>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<cart::Active>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        Ok(self
            .0
            .with_state(|s| {
                s.carts
                    .values()
                    .find(|c| c.user_id == user_id && c.is_active())
                    .cloned()
            })
            .await
            .and_then(cart::Active::from_cart))
    }
}

impl<S: Storage> Database<Insert<Cart>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(cart): Insert<Cart>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with_state(|s| s.insert_cart(cart))
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl<S: Storage> Database<Update<Cart>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(cart): Update<Cart>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with_state(|s| {
                if let Some(c) = s.carts.get_mut(&cart.id) {
                    // Items of a retired `Cart` never change.
                    if cart.is_active() {
                        c.items = cart.items;
                    }
                    c.status = cart.status;
                    c.updated_at = cart.updated_at;
                }
            })
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Insert<Order>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with_state(|s| s.insert_order(order))
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl<S: Storage> Database<Select<By<Option<Order>, order::Id>>> for Memory<S> {
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .with_state(|s| s.orders.iter().find(|o| o.id == id).cloned())
            .await)
    }
}

impl<S: Storage> Database<Select<By<Vec<Order>, user::Id>>> for Memory<S> {
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        let mut orders = self
            .0
            .with_state(|s| {
                s.orders
                    .iter()
                    .rev()
                    .filter(|o| o.user_id == user_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        // Stable, so insertion order breaks ties.
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
impl Memory {
    /// Returns all the [`Cart`]s of the provided user.
    pub(crate) async fn carts_of(&self, user_id: user::Id) -> Vec<Cart> {
        self.0
            .with_state(|s| {
                s.carts
                    .values()
                    .filter(|c| c.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Returns the number of active [`Cart`]s of the provided user.
    pub(crate) async fn active_carts_count(&self, user_id: user::Id) -> usize {
        self.carts_of(user_id)
            .await
            .iter()
            .filter(|c| c.is_active())
            .count()
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Insert, Select, Transact, Update},
        DateTime, Money,
    };

    use crate::{
        domain::{cart, order, product, user, Cart, Order},
        infra::{database::ACTIVE_CART_CONSTRAINT, Database as _},
    };

    use super::Memory;

    #[tokio::test]
    async fn rejects_second_active_cart() {
        let db = Memory::new();
        let user_id = user::Id::new();

        db.execute(Insert(cart::Active::new(user_id).into_inner()))
            .await
            .unwrap();
        let err = db
            .execute(Insert(cart::Active::new(user_id).into_inner()))
            .await
            .unwrap_err();

        assert!(err.as_ref().is_unique_violation(Some(ACTIVE_CART_CONSTRAINT)));
        assert!(!err.as_ref().is_transient());
        assert_eq!(db.active_carts_count(user_id).await, 1);
    }

    #[tokio::test]
    async fn rejects_duplicated_cart_id() {
        let db = Memory::new();
        let retired = cart::Active::new(user::Id::new()).deactivate();

        db.execute(Insert(retired.clone())).await.unwrap();
        let err = db.execute(Insert(retired)).await.unwrap_err();

        assert!(err.as_ref().is_unique_violation(Some("carts_pkey")));
        assert!(
            !err.as_ref().is_unique_violation(Some(ACTIVE_CART_CONSTRAINT)),
        );
    }

    #[tokio::test]
    async fn reports_duplicated_active_cart_id_as_such() {
        let db = Memory::new();
        let cart = cart::Active::new(user::Id::new()).into_inner();

        db.execute(Insert(cart.clone())).await.unwrap();
        let err = db.execute(Insert(cart)).await.unwrap_err();

        assert!(err.as_ref().is_unique_violation(Some("carts_pkey")));
    }

    #[tokio::test]
    async fn rejects_order_of_unknown_cart() {
        let db = Memory::new();
        let user_id = user::Id::new();

        let err = db
            .execute(Insert(Order {
                id: order::Id::new(),
                user_id,
                cart_id: cart::Id::new(),
                payment: order::Payment {
                    method: order::PaymentMethod::new("card"),
                },
                delivery: order::Delivery {
                    address: order::Address::new("Main St. 1"),
                },
                comments: order::Comments::default(),
                status: order::Status::Ordered,
                total: Money::ZERO,
                created_at: DateTime::now().coerce(),
            }))
            .await
            .unwrap_err();

        assert!(!err.as_ref().is_unique_violation(None));
        assert!(!err.as_ref().is_transient());
    }

    #[tokio::test]
    async fn allows_active_cart_next_to_retired_ones() {
        let db = Memory::new();
        let user_id = user::Id::new();

        let retired = cart::Active::new(user_id).deactivate();
        db.execute(Insert(retired)).await.unwrap();
        db.execute(Insert(cart::Active::new(user_id).into_inner()))
            .await
            .unwrap();

        assert_eq!(db.carts_of(user_id).await.len(), 2);
        assert_eq!(db.active_carts_count(user_id).await, 1);
    }

    #[tokio::test]
    async fn keeps_items_of_retired_cart() {
        let db = Memory::new();
        let mut active = cart::Active::new(user::Id::new());
        active.replace_items(vec![cart::Item {
            product_id: product::Id::new(),
            count: cart::Count::new(2).unwrap(),
        }]);
        let stored = active.as_ref().clone();
        db.execute(Insert(stored.clone())).await.unwrap();

        let mut retired = active.deactivate();
        retired.items.clear();
        db.execute(Update(retired)).await.unwrap();

        let updated = db
            .execute(Select(By::<Option<Cart>, _>::new(stored.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, cart::Status::Inactive);
        assert_eq!(updated.items, stored.items);
    }

    #[tokio::test]
    async fn discards_uncommitted_changes() {
        let db = Memory::new();
        let cart = cart::Active::new(user::Id::new()).into_inner();
        let id = cart.id;

        {
            let tx = db.execute(Transact).await.unwrap();
            tx.execute(Insert(cart)).await.unwrap();
            let staged = tx
                .execute(Select(By::<Option<Cart>, _>::new(id)))
                .await
                .unwrap();
            assert!(staged.is_some());
        }

        let stored = db
            .execute(Select(By::<Option<Cart>, _>::new(id)))
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn applies_committed_changes() {
        let db = Memory::new();
        let cart = cart::Active::new(user::Id::new()).into_inner();
        let id = cart.id;

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(cart.clone())).await.unwrap();
        tx.execute(Commit).await.unwrap();

        let stored = db
            .execute(Select(By::<Option<Cart>, _>::new(id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(cart));
    }
}
