//! k-mer 图上的搜索：规范链查找、BFS 可达性、有界 DFS 路径枚举。
//!
//! 图是隐式的：节点为索引中的 k-mer，边为重叠 k-1 个碱基的相邻 k-mer。
//! 所有查找都经过 [`canonical::lookup`]，因此含 N 的窗口永远不会被当作节点。

pub mod canonical;
pub mod paths;
pub mod reach;

pub use canonical::{canonical, lookup, lookup_mut, lookup_pair, KmerPair};
pub use paths::{enumerate_extensions, enumerate_paths, Direction, Enumeration, MAX_EXTENSION_STEPS};
pub use reach::{shortest_path_len, ReachSearch};

use crate::error::KmerError;

/// 两个锚点之间允许的最大步数：`10 + 1.1 × (to - from)`，向下取整。
/// 多出来的余量用于容纳插入型错误。
#[inline]
pub fn max_steps_between(from: usize, to: usize) -> usize {
    (10.0 + 1.1 * to.saturating_sub(from) as f64) as usize
}

/// 取 `seq[pos..pos + k]`，越界时返回长度错误
pub(crate) fn window(seq: &[u8], pos: usize, k: usize) -> Result<&[u8], KmerError> {
    seq.get(pos..pos + k).ok_or(KmerError::LengthMismatch {
        expected: k,
        got: seq.len().saturating_sub(pos).min(k),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_budget_formula() {
        assert_eq!(max_steps_between(0, 0), 10);
        assert_eq!(max_steps_between(3, 13), 21);
        assert_eq!(max_steps_between(19, 31), 23);
        assert_eq!(max_steps_between(5, 2), 10);
    }

    #[test]
    fn window_bounds() {
        assert_eq!(window(b"ACGTAC", 1, 4).unwrap(), b"CGTA");
        assert!(window(b"ACGTAC", 3, 4).is_err());
    }
}
