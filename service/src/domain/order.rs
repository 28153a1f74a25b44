//! [`Order`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{cart, user};
#[cfg(doc)]
use crate::domain::{Cart, Product};

/// Order placed by checking out a [`Cart`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// ID of the user who placed this [`Order`].
    pub user_id: user::Id,

    /// ID of the [`Cart`] this [`Order`] was placed from.
    pub cart_id: cart::Id,

    /// [`Payment`] details of this [`Order`].
    pub payment: Payment,

    /// [`Delivery`] details of this [`Order`].
    pub delivery: Delivery,

    /// [`Comments`] left for this [`Order`].
    pub comments: Comments,

    /// [`Status`] of this [`Order`].
    pub status: Status,

    /// Total price of this [`Order`].
    ///
    /// Snapshot of [`Product`] prices at the moment of checkout.
    pub total: Money,

    /// [`DateTime`] when this [`Order`] was placed.
    pub created_at: CreationDateTime,
}

/// ID of an [`Order`].
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
    #[doc = "Status of an [`Order`]."]
    enum Status {
        #[doc = "[`Order`] is placed and awaits processing."]
        Ordered = "ordered",
    }
}

/// Payment details of an [`Order`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payment {
    /// [`PaymentMethod`] chosen by the user.
    pub method: PaymentMethod,
}

/// Payment method descriptor (e.g. `card`).
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq,
    Serialize,
)]
#[as_ref(forward)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Creates a new [`PaymentMethod`].
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self(method.into())
    }
}

/// Delivery details of an [`Order`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Delivery {
    /// [`Address`] to deliver the [`Order`] to.
    pub address: Address,
}

/// Delivery address descriptor.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq,
    Serialize,
)]
#[as_ref(forward)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`].
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
}

/// Free-form comments of an [`Order`].
#[derive(
    AsRef, Clone, Debug, Default, Deserialize, Display, Eq, From, Hash,
    PartialEq, Serialize,
)]
#[as_ref(forward)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Comments(String);

impl Comments {
    /// Creates new [`Comments`].
    #[must_use]
    pub fn new(comments: impl Into<String>) -> Self {
        Self(comments.into())
    }
}

/// [`DateTime`] when an [`Order`] was placed.
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;
