pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::DbConfig;
pub use db::{ConnectionInfo, ConnectionProvider, ConnectionSource, PetRepository, DEFAULT_LIST_LIMIT};
pub use error::{PetRegistryError, Result};
pub use models::{Microchip, Pet};
