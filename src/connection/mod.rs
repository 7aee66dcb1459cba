mod core;
mod dml;
mod executor;
mod select;
mod tx;

pub use self::core::Connection;
pub use executor::BoundStatement;
pub use select::build_result_set;
