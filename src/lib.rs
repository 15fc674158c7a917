//! Typed query expressions compiled to dialect SQL, executed through a [`Session`].
//!
//! ```ignore
//! use quarry::{Entity, Property, QueryExpression, Session};
//!
//! #[derive(Entity)]
//! #[quarry(schema = "Production")]
//! struct Product {
//!     #[quarry(name = "ProductID", identifier)]
//!     id: i32,
//!     #[quarry(name = "Name")]
//!     name: String,
//! }
//!
//! let query = QueryExpression::new()
//!     .from::<Product>()
//!     .filter(Product::id.equal(355))
//!     .build()?;
//! let products = session.select::<Product>(&query).await?;
//! ```

pub use quarry_core::*;
pub use quarry_macros::*;
