mod connection;
mod driver;
mod sql_writer;
mod value;

pub use connection::*;
pub use driver::*;
pub use sql_writer::*;
pub(crate) use value::*;
