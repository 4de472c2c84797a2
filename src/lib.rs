//! A TOML v1.0.0 parser that produces a plain, owned value tree.
//!
//! The parser consumes a UTF-8 document and returns the root [`Table`] of
//! nested tables, arrays, strings, integers, floats, booleans, and
//! date/time values — or a single [`Error`] carrying the byte span and the
//! 1-based line and column of the problem. The tree owns all of its data;
//! nothing borrows from the input.
//!
//! # Quick start
//!
//! ```
//! # fn main() -> Result<(), toml_tree::Error> {
//! let table = toml_tree::parse(
//!     r#"
//! title = "example"
//!
//! [server]
//! host = "10.0.0.1"
//! ports = [8001, 8002]
//! "#,
//! )?;
//!
//! assert_eq!(table.get("title").and_then(|v| v.as_str()), Some("example"));
//! let server = table.get("server").and_then(|v| v.as_table()).unwrap();
//! assert_eq!(server.get("ports").and_then(|v| v.as_array()).unwrap().len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Byte input goes through [`parse_bytes`], which insists on valid UTF-8
//! without a byte-order mark.
//!
//! # Float representation
//!
//! Floats are [`f64`] by default. [`parse_with_float`] lets the caller
//! substitute another representation: the hook receives each float's exact
//! lexical form (underscores removed, sign preserved) and returns the
//! [`Value`] stored in the tree. Returning a table or an array is refused.
//!
//! ```
//! # fn main() -> Result<(), toml_tree::Error> {
//! use toml_tree::Value;
//!
//! let table = toml_tree::parse_with_float("ratio = 1.5", &|text| {
//!     Value::String(text.to_owned())
//! })?;
//! assert_eq!(table.get("ratio").and_then(|v| v.as_str()), Some("1.5"));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod array;
mod error;
mod parser;
mod span;
mod table;
mod time;
mod value;

pub use array::Array;
pub use error::{Error, ErrorKind};
pub use parser::{ParseFloat, default_parse_float, parse, parse_bytes, parse_with_float};
pub use span::Span;
pub use table::Table;
pub use time::{Date, LocalDateTime, OffsetDateTime, Time, TimeOffset};
pub use value::Value;

#[cfg(feature = "serde")]
pub mod impl_serde;
