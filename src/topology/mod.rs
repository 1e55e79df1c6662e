pub mod compatibility;
pub mod validator;

pub use compatibility::{
    CompatibilityTables, CompatibilityTablesBuilder, ConnectionLimit, LimitRule, LimitScope,
};
pub use validator::{Rejection, check_connection, check_saved_connection, is_valid_connection};
