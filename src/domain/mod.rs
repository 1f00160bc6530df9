pub mod aggregate;
pub mod construction;
pub mod listing;
pub mod logic;
pub mod market;
pub mod stats;
