//! XML utilities.

mod utils;

pub use utils::{
    find_by_path, find_child, find_children, get_tag_name, get_text, qualified_name,
    string_value,
};
