//! Request extractors.

mod list_query;
pub use list_query::{list_params_from_pairs, parse_query_value, ListQuery};
