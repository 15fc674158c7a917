mod compact;
mod context;
mod dialect;
mod generic;
mod jet;
mod sql_server;
mod sql_writer;

pub use compact::*;
pub use context::*;
pub use dialect::*;
pub use generic::*;
pub use jet::*;
pub use sql_server::*;
pub use sql_writer::*;
