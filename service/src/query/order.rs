//! [`Query`] collection related to [`Order`]s.

use common::operations::By;

use crate::domain::{order, user, Order};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Order`] by its [`order::Id`].
pub type ById = DatabaseQuery<By<Option<Order>, order::Id>>;

/// Queries all the [`Order`]s of a user, the newest first.
pub type OfUser = DatabaseQuery<By<Vec<Order>, user::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        command::{Checkout, FindOrCreateCart},
        domain::{order, user},
        infra::{catalog::mock, Memory},
        Command as _, Service,
    };

    use super::{ById, OfUser};

    fn checkout(user_id: user::Id, comments: &str) -> Checkout {
        Checkout {
            user_id,
            payment: order::Payment {
                method: order::PaymentMethod::new("cash"),
            },
            delivery: order::Delivery {
                address: order::Address::new("Main St. 1"),
            },
            comments: order::Comments::new(comments),
        }
    }

    #[tokio::test]
    async fn lists_orders_of_user_newest_first() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());
        let user_id = user::Id::new();
        let other_id = user::Id::new();
        let mut placed = vec![];
        for (user_id, comments) in
            [(user_id, "first"), (other_id, "other"), (user_id, "second")]
        {
            _ = svc.execute(FindOrCreateCart { user_id }).await.unwrap();
            placed.push(
                svc.execute(checkout(user_id, comments)).await.unwrap(),
            );
        }

        let orders = svc.execute(OfUser::by(user_id)).await.unwrap();

        assert_eq!(orders, vec![placed[2].clone(), placed[0].clone()]);
    }

    #[tokio::test]
    async fn finds_nothing_for_unknown_id() {
        let svc = Service::new(Memory::new(), mock::Mutable::seeded());

        let found = svc.execute(ById::by(order::Id::new())).await.unwrap();

        assert!(found.is_none());
    }
}
