//! 候选修复路径的打分：带状编辑距离及其前缀/后缀半全局变体。

pub mod edit;

pub use edit::{
    edit_distance, edit_distance_with_buf, prefix_edit_distance, suffix_edit_distance, EditBuffer,
    PrefixMatch, SuffixMatch,
};
