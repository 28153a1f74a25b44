//! [`Cart`] definitions.

use std::num::NonZeroU32;

use common::{define_kind, unit, DateTimeOf};
#[cfg(doc)]
use common::DateTime;
use derive_more::{AsRef, Deref, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, user};
#[cfg(doc)]
use crate::domain::Product;

/// Shopping cart of a user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Cart {
    /// ID of this [`Cart`].
    pub id: Id,

    /// ID of the user owning this [`Cart`].
    pub user_id: user::Id,

    /// [`Status`] of this [`Cart`].
    pub status: Status,

    /// Line [`Item`]s of this [`Cart`].
    ///
    /// Every [`Product`] appears here at most once.
    pub items: Vec<Item>,

    /// [`DateTime`] when this [`Cart`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Cart`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Cart {
    /// Indicates whether this [`Cart`] is [`Status::Active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// ID of a [`Cart`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

define_kind! {
    #[doc = "Status of a [`Cart`]."]
    enum Status {
        #[doc = "[`Cart`] may be modified and checked out."]
        Active = "active",

        #[doc = "[`Cart`] was removed by its owner."]
        Inactive = "inactive",

        #[doc = "[`Cart`] was consumed by a checkout."]
        Ordered = "ordered",
    }
}

/// Line item of a [`Cart`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Item {
    /// ID of the [`Product`] in this [`Item`].
    pub product_id: product::Id,

    /// Number of [`Product`] units.
    pub count: Count,
}

/// Positive number of [`Product`] units in an [`Item`].
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
pub struct Count(NonZeroU32);

impl Count {
    /// Maximum allowed [`Count`], bounded by the storage representation.
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// Creates a new [`Count`] if the given `count` is positive and doesn't
    /// exceed [`Count::MAX`].
    #[must_use]
    pub fn new(count: u32) -> Option<Self> {
        if count > Self::MAX {
            return None;
        }
        NonZeroU32::new(count).map(Self)
    }

    /// Returns the number of units.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl FromStr for Count {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count = s.parse::<u32>().map_err(|_| "invalid `Count`")?;
        Self::new(count).ok_or("`Count` out of range")
    }
}

impl Serialize for Count {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.get())
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let count = u32::deserialize(deserializer)?;
        Self::new(count).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid `Count`: {count}"))
        })
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! Postgres representation of a [`Count`].

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };

    use super::Count;

    impl FromSql<'_> for Count {
        accepts!(INT4);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            let count = i32::from_sql(ty, raw)?;
            u32::try_from(count)
                .ok()
                .and_then(Count::new)
                .ok_or_else(|| format!("invalid `Count` value: {count}").into())
        }
    }

    impl ToSql for Count {
        accepts!(INT4);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            i32::try_from(self.get())?.to_sql(ty, w)
        }
    }
}

/// [`Cart`] guaranteed to be [`Status::Active`].
///
/// Only an [`Active`] cart may change, and every change consumes or borrows
/// it mutably, so retired [`Cart`]s stay immutable.
#[derive(AsRef, Clone, Debug, Deref, Eq, PartialEq)]
pub struct Active(Cart);

impl Active {
    /// Creates a new empty [`Active`] cart of the provided user.
    #[must_use]
    pub fn new(user_id: user::Id) -> Self {
        let now = CreationDateTime::now();
        Self(Cart {
            id: Id::new(),
            user_id,
            status: Status::Active,
            items: Vec::new(),
            created_at: now,
            updated_at: now.coerce(),
        })
    }

    /// Wraps the provided [`Cart`] if it's [`Status::Active`].
    #[must_use]
    pub fn from_cart(cart: Cart) -> Option<Self> {
        cart.is_active().then_some(Self(cart))
    }

    /// Replaces all the [`Item`]s of this [`Active`] cart.
    ///
    /// [`Item`]s are kept ordered by their [`Product`] IDs.
    pub fn replace_items(&mut self, mut items: Vec<Item>) {
        items.sort_by_key(|i| i.product_id);
        self.0.items = items;
        self.0.updated_at = ModificationDateTime::now();
    }

    /// Retires this [`Active`] cart as [`Status::Inactive`].
    #[must_use]
    pub fn deactivate(self) -> Cart {
        self.retire(Status::Inactive)
    }

    /// Retires this [`Active`] cart as [`Status::Ordered`].
    #[must_use]
    pub fn order(self) -> Cart {
        self.retire(Status::Ordered)
    }

    /// Returns the underlying [`Cart`].
    #[must_use]
    pub fn into_inner(self) -> Cart {
        self.0
    }

    /// Moves this [`Active`] cart into the provided terminal [`Status`].
    fn retire(self, status: Status) -> Cart {
        let mut cart = self.0;
        cart.status = status;
        cart.updated_at = ModificationDateTime::now();
        cart
    }
}

/// [`DateTime`] when a [`Cart`] was created.
pub type CreationDateTime = DateTimeOf<(Cart, unit::Creation)>;

/// [`DateTime`] when a [`Cart`] was modified the last time.
pub type ModificationDateTime = DateTimeOf<(Cart, unit::Modification)>;

#[cfg(test)]
mod spec {
    use crate::domain::{product, user};

    use super::{Active, Cart, Count, Item, ModificationDateTime, Status};

    fn item(count: u32) -> Item {
        Item {
            product_id: product::Id::new(),
            count: Count::new(count).unwrap(),
        }
    }

    #[test]
    fn new_cart_is_active_and_empty() {
        let user_id = user::Id::new();
        let cart = Active::new(user_id);

        assert_eq!(cart.user_id, user_id);
        assert_eq!(cart.status, Status::Active);
        assert!(cart.items.is_empty());
        let created_at: ModificationDateTime = cart.created_at.coerce();
        assert_eq!(created_at, cart.updated_at);
    }

    #[test]
    fn replaces_items_entirely() {
        let mut cart = Active::new(user::Id::new());
        cart.replace_items(vec![item(1), item(2)]);
        let items = vec![item(3)];

        cart.replace_items(items.clone());

        let created_at: ModificationDateTime = cart.created_at.coerce();
        assert_eq!(cart.items, items);
        assert!(cart.updated_at >= created_at);
    }

    #[test]
    fn keeps_items_ordered_by_product() {
        let mut cart = Active::new(user::Id::new());
        let (a, b, c) = (item(1), item(2), item(3));

        cart.replace_items(vec![b, c, a]);

        let mut expected = vec![a, b, c];
        expected.sort_by_key(|i| i.product_id);
        assert_eq!(cart.items, expected);
    }

    #[test]
    fn retires_into_terminal_statuses() {
        let deactivated = Active::new(user::Id::new()).deactivate();
        let ordered = Active::new(user::Id::new()).order();

        assert_eq!(deactivated.status, Status::Inactive);
        assert_eq!(ordered.status, Status::Ordered);
        assert!(Active::from_cart(deactivated).is_none());
        assert!(Active::from_cart(ordered).is_none());
    }

    #[test]
    fn wraps_only_active_carts() {
        let cart: Cart = Active::new(user::Id::new()).into_inner();

        assert!(Active::from_cart(cart).is_some());
    }

    #[test]
    fn count_bounds() {
        assert!(Count::new(0).is_none());
        assert_eq!(Count::new(1).unwrap().get(), 1);
        assert!(Count::new(Count::MAX).is_some());
        assert!(Count::new(Count::MAX + 1).is_none());

        assert_eq!("7".parse::<Count>().unwrap().get(), 7);
        assert!("0".parse::<Count>().is_err());
        assert!("-1".parse::<Count>().is_err());
    }

    #[test]
    fn status_strings() {
        assert_eq!(Status::Active.as_str(), "active");
        assert_eq!("inactive".parse::<Status>().unwrap(), Status::Inactive);
        assert_eq!(Status::Ordered.to_string(), "ordered");
    }
}
