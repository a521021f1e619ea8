//! HTML node matching and field extraction.

mod extract;
mod matcher;

pub use extract::{
    clean_text, extract_attr, extract_text, extract_url, format_search_url, normalize_url,
};
pub use matcher::{find_cascade, find_first, find_nodes, largest_text_block, NodeSelector};
