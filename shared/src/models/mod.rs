//! Domain models for the distribution service

mod actor;
mod distribution;
mod draft;
mod returns;
mod stock;

pub use actor::*;
pub use distribution::*;
pub use draft::*;
pub use returns::*;
pub use stock::*;
