pub mod connection;
pub mod queries;
pub mod schema;

pub use connection::{ConnectionInfo, ConnectionProvider, ConnectionSource};
pub use queries::{PetRepository, DEFAULT_LIST_LIMIT};
