pub mod api;
pub mod bridge;
pub mod coerce;
pub mod directory;
mod error;
pub mod model;
pub mod processor;
pub mod settings;
pub mod sink;
pub mod sun;

pub use error::Error;
