//! HTTP request handlers

pub mod acceptance;
pub mod distribution;
pub mod draft;
pub mod health;
pub mod notification;
pub mod returns;
pub mod stock;

pub use acceptance::*;
pub use distribution::*;
pub use draft::*;
pub use health::*;
pub use notification::*;
pub use returns::*;
pub use stock::*;
