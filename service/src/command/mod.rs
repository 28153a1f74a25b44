//! [`Command`] definition.

pub mod checkout;
pub mod create_cart;
pub mod deactivate_cart;
pub mod find_or_create_cart;
pub mod replace_cart_items;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    checkout::Checkout, create_cart::CreateCart,
    deactivate_cart::DeactivateCart, find_or_create_cart::FindOrCreateCart,
    replace_cart_items::ReplaceCartItems,
};
