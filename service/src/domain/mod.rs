//! Domain definitions.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use self::{cart::Cart, order::Order, product::Product};
