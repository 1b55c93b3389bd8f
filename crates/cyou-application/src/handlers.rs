//! Request handlers.

pub mod applications;
pub mod health;

pub use applications::*;
pub use health::*;
