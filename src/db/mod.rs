pub mod connection;
pub mod scrapes;

pub use connection::{init_db, Database};
