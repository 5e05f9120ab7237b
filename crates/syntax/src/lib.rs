//! typeweave-syntax: the regex-like textual grammar front end.
//!
//! Turns a grammar expression string such as `a b? c* (d|e) #Last f`
//! into the identical node tree the programmatic builder API would
//! produce, by driving a [`typeweave_core::FluentBuilder`]:
//!
//! - a bare word is a call taken once; `?`, `*` and `+` make it
//!   optional, repeating, or one-or-more
//! - `( ... )` groups a sub-expression; `|` separates alternatives
//! - `#Name` names the next constructed node
//! - `tag(string)` references one specific overload by signature
//!
//! The core only ever consumes the resulting tree; this crate is a
//! front-end convenience layered on top of it.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::SyntaxError;
pub use parser::apply;
