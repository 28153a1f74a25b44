//! [`Cart`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;
use xxhash_rust::xxh3;

use crate::{
    domain::{cart, user, Cart},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Seed of the advisory lock keys serializing [`Cart`] operations of a user.
const USER_CARTS_LOCK_SEED: u64 = 0x0063_6172_7473; // "carts"

impl<C> Database<Select<By<Vec<cart::Item>, cart::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<cart::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<cart::Item>, cart::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT product_id, count \
            FROM cart_items \
            WHERE cart_id = $1::UUID \
            ORDER BY product_id";
        Ok(self
            .query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| cart::Item {
                product_id: row.get("product_id"),
                count: row.get("count"),
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Cart>, cart::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Vec<cart::Item>, cart::Id>>,
        Ok = Vec<cart::Item>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Cart>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Cart>, cart::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, status, created_at, updated_at \
            FROM carts \
            WHERE id = $1::UUID";
        let Some(row) = self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let items = self
            .execute(Select(By::<Vec<cart::Item>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Some(cart_from_row(&row, items)))
    }
}

impl<C> Database<Select<By<Option<cart::Active>, user::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Vec<cart::Item>, cart::Id>>,
        Ok = Vec<cart::Item>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<cart::Active>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<cart::Active>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, status, created_at, updated_at \
            FROM carts \
            WHERE user_id = $1::UUID \
              AND status = $2::VARCHAR \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&user_id, &cart::Status::Active])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let items = self
            .execute(Select(By::<Vec<cart::Item>, _>::new(
                row.get::<_, cart::Id>("id"),
            )))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(cart::Active::from_cart(cart_from_row(&row, items)))
    }
}

impl<C> Database<Insert<Cart>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(cart): Insert<Cart>,
    ) -> Result<Self::Ok, Self::Err> {
        let Cart {
            id,
            user_id,
            status,
            items,
            created_at,
            updated_at,
        } = cart;

        const SQL: &str = "\
            INSERT INTO carts (id, user_id, status, created_at, updated_at) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &user_id, &status, &created_at, &updated_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        insert_items(&**self, id, &items)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Cart>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(cart): Update<Cart>,
    ) -> Result<Self::Ok, Self::Err> {
        let Cart {
            id,
            user_id: _,
            status,
            items,
            created_at: _,
            updated_at,
        } = cart;

        const UPDATE_SQL: &str = "\
            UPDATE carts \
            SET status = $2::VARCHAR, \
                updated_at = $3::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(UPDATE_SQL, &[&id, &status, &updated_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        // Items of a retired `Cart` never change.
        if status != cart::Status::Active {
            return Ok(());
        }

        const DELETE_SQL: &str = "\
            DELETE FROM cart_items \
            WHERE cart_id = $1::UUID";
        self.exec(DELETE_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        insert_items(&**self, id, &items)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<Cart, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Cart, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();

        let key = i64::from_ne_bytes(
            xxh3::xxh3_64_with_seed(
                user_id.uuid().as_bytes(),
                USER_CARTS_LOCK_SEED,
            )
            .to_ne_bytes(),
        );

        // Released automatically once the transaction ends.
        const SQL: &str = "SELECT pg_advisory_xact_lock($1::INT8)";
        self.query(SQL, &[&key])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Inserts the provided [`cart::Item`]s of the [`Cart`] with the provided ID.
async fn insert_items<C: Connection>(
    conn: &C,
    cart_id: cart::Id,
    items: &[cart::Item],
) -> Result<(), Traced<database::Error>> {
    if items.is_empty() {
        return Ok(());
    }

    let (product_ids, counts): (Vec<_>, Vec<_>) =
        items.iter().map(|i| (i.product_id, i.count)).unzip();

    const SQL: &str = "\
        INSERT INTO cart_items (cart_id, product_id, count) \
        SELECT $1::UUID, product_id, count \
        FROM unnest($2::UUID[], $3::INT4[]) AS i(product_id, count)";
    conn.exec(SQL, &[&cart_id, &product_ids, &counts])
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
}

/// Builds a [`Cart`] out of the provided `carts` table [`Row`] and its
/// [`cart::Item`]s.
fn cart_from_row(row: &Row, items: Vec<cart::Item>) -> Cart {
    Cart {
        id: row.get("id"),
        user_id: row.get("user_id"),
        status: row.get("status"),
        items,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
