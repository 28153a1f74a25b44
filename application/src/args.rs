//! [`Args`] definitions.

use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use service::domain::{cart, order, user};

/// Cart and order core of the shop.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Operation to perform.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Applies database migrations only.
    Migrate,

    /// Operates on the active cart of a user.
    #[command(subcommand)]
    Cart(Cart),

    /// Places an order out of the active cart of a user.
    Checkout {
        /// ID of the user placing the order.
        #[arg(long)]
        user: user::Id,

        /// Payment method of the order.
        #[arg(long)]
        payment_method: String,

        /// Delivery address of the order.
        #[arg(long)]
        address: String,

        /// Comments to the order.
        #[arg(long, default_value = "")]
        comments: String,
    },

    /// Reads placed orders.
    #[command(subcommand)]
    Order(Order),
}

/// Operation on the active cart of a user.
#[derive(Debug, Subcommand)]
pub enum Cart {
    /// Prints the active cart of the user, if any.
    Get {
        /// ID of the user owning the cart.
        #[arg(long)]
        user: user::Id,
    },

    /// Creates a new empty active cart of the user.
    Create {
        /// ID of the user to create the cart for.
        #[arg(long)]
        user: user::Id,
    },

    /// Prints the active cart of the user, creating it if none.
    FindOrCreate {
        /// ID of the user owning the cart.
        #[arg(long)]
        user: user::Id,
    },

    /// Replaces all the items of the active cart of the user.
    Replace {
        /// ID of the user owning the cart.
        #[arg(long)]
        user: user::Id,

        /// New item of the cart in `<product-id>=<count>` format.
        #[arg(long = "item", value_parser = parse_item)]
        items: Vec<cart::Item>,
    },

    /// Deactivates the active cart of the user, if any.
    Deactivate {
        /// ID of the user owning the cart.
        #[arg(long)]
        user: user::Id,
    },
}

/// Operation reading placed orders.
#[derive(Debug, Subcommand)]
pub enum Order {
    /// Prints the order with the provided ID, if any.
    Get {
        /// ID of the order.
        #[arg(long)]
        id: order::Id,
    },

    /// Prints all the orders of the user, the newest first.
    List {
        /// ID of the user who placed the orders.
        #[arg(long)]
        user: user::Id,
    },
}

/// Error of parsing a [`cart::Item`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseItemError {
    /// Input doesn't match `<product-id>=<count>` format.
    #[display("expected `<product-id>=<count>`")]
    Format,

    /// Product ID is not a valid UUID.
    #[display("invalid product ID")]
    ProductId,

    /// Count is not a positive 32-bit integer.
    #[display("count must be a positive integer")]
    Count,
}

/// Parses a [`cart::Item`] from the `<product-id>=<count>` format.
fn parse_item(s: &str) -> Result<cart::Item, ParseItemError> {
    let (id, count) = s.split_once('=').ok_or(ParseItemError::Format)?;
    Ok(cart::Item {
        product_id: id.trim().parse().map_err(|_| ParseItemError::ProductId)?,
        count: count.trim().parse().map_err(|_| ParseItemError::Count)?,
    })
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::{parse_item, Args, Cart, Command, ParseItemError};

    #[test]
    fn parses_items() {
        let item =
            parse_item("00000000-0000-0000-0000-000000000001=3").unwrap();

        assert_eq!(
            item.product_id.to_string(),
            "00000000-0000-0000-0000-000000000001",
        );
        assert_eq!(item.count.get(), 3);
    }

    #[test]
    fn rejects_malformed_items() {
        assert!(matches!(parse_item("3"), Err(ParseItemError::Format)));
        assert!(matches!(parse_item("x=3"), Err(ParseItemError::ProductId)));
        assert!(matches!(
            parse_item("00000000-0000-0000-0000-000000000001=0"),
            Err(ParseItemError::Count),
        ));
    }

    #[test]
    fn parses_replace_command() {
        let args = Args::try_parse_from([
            "shop",
            "cart",
            "replace",
            "--user",
            "7e1f2a56-0b8e-4b8e-9a57-1f0a3b5c6d7e",
            "--item",
            "00000000-0000-0000-0000-000000000001=1",
            "--item",
            "00000000-0000-0000-0000-000000000002=2",
        ])
        .unwrap();

        assert_eq!(args.config, "config.toml");
        assert!(matches!(
            args.command,
            Command::Cart(Cart::Replace { items, .. }) if items.len() == 2,
        ));
    }
}
