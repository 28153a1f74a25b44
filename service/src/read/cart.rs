//! [`Cart`] read model definitions.

use common::Money;
use derive_more::{Display, Error};
use serde::Serialize;

use crate::{
    domain::{self, cart, product, user, Product},
    infra::Catalog,
};

/// [`domain::Cart`] with its [`Product`]s resolved via a [`Catalog`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Cart {
    /// ID of this [`Cart`].
    pub id: cart::Id,

    /// ID of the user owning this [`Cart`].
    pub user_id: user::Id,

    /// [`cart::Status`] of this [`Cart`].
    pub status: cart::Status,

    /// Resolved [`Item`]s of this [`Cart`].
    pub items: Vec<Item>,

    /// Total price of this [`Cart`] by the current [`Product`] prices.
    pub total: Money,

    /// [`DateTime`] when this [`Cart`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: cart::CreationDateTime,

    /// [`DateTime`] when this [`Cart`] was modified the last time.
    ///
    /// [`DateTime`]: common::DateTime
    pub updated_at: cart::ModificationDateTime,
}

/// [`cart::Item`] with its [`Product`] resolved.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Item {
    /// [`Product`] of this [`Item`].
    pub product: Product,

    /// Number of [`Product`] units.
    pub count: cart::Count,
}

impl Item {
    /// Returns the price of this [`Item`] by the current [`Product`] price.
    ///
    /// Returns [`None`] if the price overflows.
    #[must_use]
    pub fn price(&self) -> Option<Money> {
        self.product.price.checked_mul(self.count.get())
    }
}

impl Cart {
    /// Resolves [`Product`]s of the provided [`domain::Cart`] via the given
    /// [`Catalog`].
    ///
    /// # Errors
    ///
    /// - [`ResolveError::UnknownProduct`] with the [`product::Id`] of the first
    ///   [`cart::Item`] the [`Catalog`] doesn't know.
    /// - [`ResolveError::TotalOverflow`] if the total price cannot be
    ///   represented.
    pub fn resolve<C: Catalog + ?Sized>(
        cart: domain::Cart,
        catalog: &C,
    ) -> Result<Self, ResolveError> {
        let domain::Cart {
            id,
            user_id,
            status,
            items,
            created_at,
            updated_at,
        } = cart;

        let items = items
            .into_iter()
            .map(|i| {
                let product = catalog
                    .product(&i.product_id)
                    .ok_or(ResolveError::UnknownProduct(i.product_id))?;
                Ok::<_, ResolveError>(Item {
                    product,
                    count: i.count,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let total = items
            .iter()
            .map(Item::price)
            .collect::<Option<Vec<_>>>()
            .and_then(Money::checked_sum)
            .ok_or(ResolveError::TotalOverflow(id))?;

        Ok(Self {
            id,
            user_id,
            status,
            total,
            items,
            created_at,
            updated_at,
        })
    }
}

/// Error of resolving a [`Cart`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ResolveError {
    /// [`cart::Item`] refers to a [`Product`] unknown to the [`Catalog`].
    #[display("`Cart` refers to unknown `Product(id: {_0})`")]
    UnknownProduct(#[error(not(source))] product::Id),

    /// Total price of the [`Cart`] is too large to be represented.
    #[display("Total price of `Cart(id: {_0})` overflows")]
    TotalOverflow(#[error(not(source))] cart::Id),
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Money;
    use rust_decimal::Decimal;

    use crate::{
        domain::{cart, product, user},
        infra::catalog::mock,
    };

    use super::{Cart, ResolveError};

    #[test]
    fn sums_prices_of_items() {
        let catalog = mock::Mutable::seeded();
        let ids = catalog.ids();
        let mut active = cart::Active::new(user::Id::new());
        active.replace_items(vec![
            cart::Item {
                product_id: ids[0],
                count: cart::Count::new(2).unwrap(),
            },
            cart::Item {
                product_id: ids[1],
                count: cart::Count::new(1).unwrap(),
            },
        ]);

        let cart = Cart::resolve(active.into_inner(), &catalog).unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].product.id, ids[0]);
        assert_eq!(cart.total, Money::from_str("41.97").unwrap());
    }

    #[test]
    fn empty_cart_costs_nothing() {
        let catalog = mock::Mutable::seeded();
        let active = cart::Active::new(user::Id::new());

        let cart = Cart::resolve(active.into_inner(), &catalog).unwrap();

        assert!(cart.items.is_empty());
        assert_eq!(cart.total, Money::ZERO);
    }

    #[test]
    fn reports_unknown_product() {
        let catalog = mock::Mutable::seeded();
        let unknown = product::Id::new();
        let mut active = cart::Active::new(user::Id::new());
        active.replace_items(vec![cart::Item {
            product_id: unknown,
            count: cart::Count::new(1).unwrap(),
        }]);

        assert_eq!(
            Cart::resolve(active.into_inner(), &catalog),
            Err(ResolveError::UnknownProduct(unknown)),
        );
    }

    #[test]
    fn reports_total_overflow() {
        let catalog = mock::Mutable::seeded();
        let ids = catalog.ids();
        catalog.set_price(ids[0], Money::new(Decimal::MAX).unwrap());
        let mut active = cart::Active::new(user::Id::new());
        active.replace_items(vec![cart::Item {
            product_id: ids[0],
            count: cart::Count::new(cart::Count::MAX).unwrap(),
        }]);
        let cart = active.into_inner();
        let cart_id = cart.id;

        assert_eq!(
            Cart::resolve(cart, &catalog),
            Err(ResolveError::TotalOverflow(cart_id)),
        );
    }

    #[test]
    fn reports_overflow_of_sum() {
        let catalog = mock::Mutable::seeded();
        let ids = catalog.ids();
        catalog.set_price(ids[0], Money::new(Decimal::MAX).unwrap());
        catalog.set_price(ids[1], Money::new(Decimal::MAX).unwrap());
        let mut active = cart::Active::new(user::Id::new());
        active.replace_items(
            ids.iter()
                .map(|&product_id| cart::Item {
                    product_id,
                    count: cart::Count::new(1).unwrap(),
                })
                .collect(),
        );

        assert!(matches!(
            Cart::resolve(active.into_inner(), &catalog),
            Err(ResolveError::TotalOverflow(_)),
        ));
    }
}
