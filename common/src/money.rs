//! [`Money`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
use rust_decimal::Decimal;

/// Non-negative amount of money.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount of [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] if the provided `amount` is non-negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (amount >= Decimal::ZERO).then_some(Self(amount))
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub fn amount(self) -> Decimal {
        self.0
    }

    /// Adds the provided [`Money`] to this one.
    ///
    /// Returns [`None`] on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiplies this [`Money`] by the provided number of units.
    ///
    /// Returns [`None`] on overflow.
    #[must_use]
    pub fn checked_mul(self, units: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(units)).map(Self)
    }

    /// Sums up all the provided amounts of [`Money`].
    ///
    /// Returns [`None`] on overflow.
    #[must_use]
    pub fn checked_sum(
        amounts: impl IntoIterator<Item = Self>,
    ) -> Option<Self> {
        amounts.into_iter().try_fold(Self::ZERO, Self::checked_add)
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative amount")
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing integration with [`postgres_types`] crate.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };
    use rust_decimal::Decimal;

    use super::Money;

    impl FromSql<'_> for Money {
        accepts!(NUMERIC);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            let amount = Decimal::from_sql(ty, raw)?;
            Self::new(amount).ok_or_else(|| {
                format!("negative `Money` value: {amount}").into()
            })
        }
    }

    impl ToSql for Money {
        accepts!(NUMERIC);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            self.0.to_sql(ty, w)
        }
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use rust_decimal::Decimal;
    use serde::{
        de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
    };

    use super::Money;

    impl Serialize for Money {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(&self.0)
        }
    }

    impl<'de> Deserialize<'de> for Money {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
            Self::new(amount).ok_or_else(|| {
                D::Error::custom(format!("negative `Money` value: {amount}"))
            })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(money("10.99").amount(), Decimal::new(1099, 2));
        assert_eq!(money("0").amount(), Decimal::ZERO);
        assert_eq!(money(" 5 ").amount(), Decimal::from(5));

        assert!(Money::from_str("-0.01").is_err());
        assert!(Money::from_str("ten").is_err());
        assert!(Money::from_str("").is_err());
    }

    #[test]
    fn rejects_negative() {
        assert_eq!(Money::new(Decimal::new(-1, 0)), None);
        assert_eq!(Money::new(Decimal::ZERO), Some(Money::ZERO));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(money("10.99").checked_mul(2), Some(money("21.98")));
        assert_eq!(money("10.99").checked_mul(0), Some(Money::ZERO));
        assert_eq!(
            money("10.99").checked_add(money("19.99")),
            Some(money("30.98")),
        );
        assert_eq!(
            Money::checked_sum([money("1.10"), money("2.20"), money("3.30")]),
            Some(money("6.60")),
        );
        assert_eq!(Money::checked_sum([Money::ZERO; 0]), Some(Money::ZERO));
    }

    #[test]
    fn detects_overflow() {
        let max = Money::new(Decimal::MAX).unwrap();

        assert_eq!(max.checked_mul(2), None);
        assert_eq!(max.checked_add(money("1")), None);
        assert_eq!(Money::checked_sum([max, max]), None);
        assert_eq!(max.checked_mul(1), Some(max));
    }

    #[test]
    fn to_string() {
        assert_eq!(money("21.98").to_string(), "21.98");
        assert_eq!(money("7").to_string(), "7");
    }
}
