//! Syntax: grammar-driven parsing of function files.
//!
//! The [`Parser`] walks the command tree of a [`CommandSpec`](crate::grammar::CommandSpec)
//! while reading a [`TokenStream`]. Literal nodes are matched by name;
//! argument nodes delegate to leaf parsers registered by parser name
//! (`brigadier:integer`, `minecraft:entity`, ...). Every command node in the
//! resulting tree is named after the prototype it matched.

pub mod error;
pub mod leaf;
pub mod nbt;
pub mod parser;
pub mod selector;
pub mod stream;

pub use error::{SyntaxError, PARSE_RULE};
pub use leaf::{ArgumentContext, LeafParser};
pub use parser::{ParseOptions, Parser};
pub use stream::{Checkpoint, TokenStream};
