//! [`Order`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use postgres_types::Json;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{order, user, Order},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Order>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        let Order {
            id,
            user_id,
            cart_id,
            payment,
            delivery,
            comments,
            status,
            total,
            created_at,
        } = order;

        const SQL: &str = "\
            INSERT INTO orders (id, user_id, cart_id, \
                                payment, delivery, comments, \
                                status, total, created_at) \
            VALUES ($1::UUID, $2::UUID, $3::UUID, \
                    $4::JSONB, $5::JSONB, $6::TEXT, \
                    $7::VARCHAR, $8::NUMERIC, $9::TIMESTAMPTZ)";
        self.exec(
            SQL,
            &[
                &id,
                &user_id,
                &cart_id,
                &Json(&payment),
                &Json(&delivery),
                &comments,
                &status,
                &total,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Option<Order>, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, cart_id, \
                   payment, delivery, comments, \
                   status, total, created_at \
            FROM orders \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| order_from_row(&row)))
    }
}

impl<C> Database<Select<By<Vec<Order>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, cart_id, \
                   payment, delivery, comments, \
                   status, total, created_at \
            FROM orders \
            WHERE user_id = $1::UUID \
            ORDER BY created_at DESC, id";
        Ok(self
            .query(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(order_from_row)
            .collect())
    }
}

/// Builds an [`Order`] out of the provided `orders` table [`Row`].
fn order_from_row(row: &Row) -> Order {
    let Json(payment) = row.get("payment");
    let Json(delivery) = row.get("delivery");
    Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        cart_id: row.get("cart_id"),
        payment,
        delivery,
        comments: row.get("comments"),
        status: row.get("status"),
        total: row.get("total"),
        created_at: row.get("created_at"),
    }
}
