//! Path matching.
//!
//! Patterns are `/`-separated. A segment starting with `:` captures one path
//! segment under that name; a segment starting with `*` captures the rest of
//! the path and must come last.

mod table;
mod trie;
mod tests;

pub use table::{extract_params, Params, RouteMatch, RouteTable};
pub use trie::{parse_pattern, Node, PARAM_MARKER, WILDCARD_MARKER};
