mod builder;
mod join;
mod query;
mod transaction_type;

pub use builder::*;
pub use join::*;
pub use query::*;
pub use transaction_type::*;
