mod as_value;
mod binder;
mod cache;
mod catalog;
mod checksum;
mod command;
mod config;
mod connection;
mod decode_type;
mod descriptor;
mod driver;
mod entity;
mod error;
mod executor;
mod expression;
mod parallel;
mod preload;
mod query;
mod row;
mod session;
mod transaction;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use binder::*;
pub use catalog::*;
pub use checksum::*;
pub use command::*;
pub use config::*;
pub use connection::*;
pub use decode_type::*;
pub use descriptor::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use expression::*;
pub use parallel::*;
pub use preload::*;
pub use query::*;
pub use row::*;
pub use session::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use writer::{
    CompactSqlWriter, Dialect, Fragment, GenericSqlWriter, JetSqlWriter, PAGED_LABEL,
    ROW_NUMBER_LABEL, SqlServerSqlWriter, SqlWriter,
};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
