pub mod chunks;
pub mod query;
pub mod stats;
