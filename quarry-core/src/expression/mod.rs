mod binary_op;
mod function;
mod op_precedence;
mod ordered;
mod property;
mod unary_op;

pub use binary_op::*;
pub use function::*;
pub use op_precedence::*;
pub use ordered::*;
pub use property::*;
pub use unary_op::*;
