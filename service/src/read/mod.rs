//! Read entities definitions.

pub mod cart;

pub use self::cart::Cart;
