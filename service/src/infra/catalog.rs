//! [`Catalog`] of [`Product`]s.

use std::{collections::HashMap, sync::Arc};

use common::Money;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{product, Product};

/// Read-only source of [`Product`] identity and price.
pub trait Catalog {
    /// Looks up the [`Product`] with the provided ID.
    fn product(&self, id: &product::Id) -> Option<Product>;
}

/// [`Catalog`] backed by a fixed list of [`Product`]s.
#[derive(Clone, Debug)]
pub struct Seeded {
    /// [`Product`]s of this [`Catalog`] indexed by their IDs.
    products: Arc<HashMap<product::Id, Product>>,
}

impl Seeded {
    /// Creates a new [`Seeded`] [`Catalog`] out of the provided
    /// [`Product`]s.
    ///
    /// The last [`Product`] wins if several of them share the same ID.
    #[must_use]
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: Arc::new(
                products.into_iter().map(|p| (p.id, p)).collect(),
            ),
        }
    }

    /// Returns all the [`Product`]s of this [`Catalog`] ordered by ID.
    #[must_use]
    pub fn products(&self) -> Vec<&Product> {
        let mut products = self.products.values().collect::<Vec<_>>();
        products.sort_by_key(|p| p.id);
        products
    }
}

impl Default for Seeded {
    #[expect(unsafe_code, reason = "constant titles are valid")]
    fn default() -> Self {
        Self::new([
            Product {
                id: Uuid::from_u128(1).into(),
                title: unsafe { product::Title::new_unchecked("Product 1") },
                description: product::Description::new(
                    "Product 1 description",
                ),
                price: Money::new(Decimal::new(1099, 2)).unwrap_or_default(),
            },
            Product {
                id: Uuid::from_u128(2).into(),
                title: unsafe { product::Title::new_unchecked("Product 2") },
                description: product::Description::new(
                    "Product 2 description",
                ),
                price: Money::new(Decimal::new(1999, 2)).unwrap_or_default(),
            },
        ])
    }
}

impl Catalog for Seeded {
    fn product(&self, id: &product::Id) -> Option<Product> {
        self.products.get(id).cloned()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Mutable [`Catalog`] for tests.

    use std::{
        collections::HashMap,
        sync::{Arc, RwLock},
    };

    use common::Money;

    use crate::domain::{product, Product};

    use super::{Catalog, Seeded};

    /// [`Catalog`] whose prices may be changed while in use.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Mutable(Arc<RwLock<HashMap<product::Id, Product>>>);

    impl Mutable {
        /// Creates a new [`Mutable`] [`Catalog`] with the [`Seeded`]
        /// [`Product`]s.
        pub(crate) fn seeded() -> Self {
            let products = Seeded::default()
                .products()
                .into_iter()
                .map(|p| (p.id, p.clone()))
                .collect();
            Self(Arc::new(RwLock::new(products)))
        }

        /// Returns IDs of all the [`Product`]s ordered by ID.
        pub(crate) fn ids(&self) -> Vec<product::Id> {
            let mut ids =
                self.0.read().unwrap().keys().copied().collect::<Vec<_>>();
            ids.sort();
            ids
        }

        /// Changes price of the [`Product`] with the provided ID.
        pub(crate) fn set_price(&self, id: product::Id, price: Money) {
            self.0.write().unwrap().get_mut(&id).unwrap().price = price;
        }

        /// Removes the [`Product`] with the provided ID.
        pub(crate) fn remove(&self, id: product::Id) {
            _ = self.0.write().unwrap().remove(&id);
        }
    }

    impl Catalog for Mutable {
        fn product(&self, id: &product::Id) -> Option<Product> {
            self.0.read().unwrap().get(id).cloned()
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Money;
    use uuid::Uuid;

    use crate::domain::product;

    use super::{Catalog as _, Seeded};

    #[test]
    fn seeded_with_two_products() {
        let catalog = Seeded::default();
        let products = catalog.products();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title.to_string(), "Product 1");
        assert_eq!(products[0].price, Money::from_str("10.99").unwrap());
        assert_eq!(products[1].title.to_string(), "Product 2");
        assert_eq!(products[1].price, Money::from_str("19.99").unwrap());
    }

    #[test]
    fn looks_up_by_id() {
        let catalog = Seeded::default();

        let found = catalog.product(&Uuid::from_u128(2).into()).unwrap();
        assert_eq!(found.id, Uuid::from_u128(2).into());
        assert!(catalog.product(&product::Id::new()).is_none());
    }
}
