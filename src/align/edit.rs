//! 带状编辑距离（Vishkin-Schieber 对角线形式）。
//!
//! 表格 `S(e, d)` 记录恰好用 `e` 次编辑时，在对角线 `d`（b 的位置减 a 的位置）上
//! a 能匹配到的最远位置。第 e 行有 2e+1 个单元，整体是一个金字塔，按
//! `e * (e + 1) + d` 平铺在一维缓冲区里。最大编辑数由输入长度决定，超出即停止。

const NEG: i32 = i32::MIN / 4;

/// 全局编辑距离允许 10% 的错误
#[inline]
pub fn global_max_errs(m: usize, n: usize) -> usize {
    (0.5 + 0.10 * m.max(n) as f64) as usize
}

/// 半全局（前缀/后缀）允许 15% + 3 的错误
#[inline]
pub fn semi_global_max_errs(m: usize, n: usize) -> usize {
    (3.5 + 0.15 * m.min(n) as f64) as usize
}

/// DP 工作缓冲区，可跨调用复用；只增长不收缩
#[derive(Debug, Default)]
pub struct EditBuffer {
    space: Vec<i32>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self { space: Vec::new() }
    }

    fn reserve_band(&mut self, max_errs: usize) -> &mut [i32] {
        let sz = (1 + max_errs) * (1 + max_errs);
        if self.space.len() < sz {
            self.space.resize(sz, NEG);
        }
        &mut self.space[..sz]
    }

    pub fn capacity(&self) -> usize {
        self.space.len()
    }
}

/// 前缀对齐结果：`a[..a_end]` 与 `b[..b_end]` 对齐，且至少一端到达串尾
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch {
    pub dist: usize,
    pub a_end: usize,
    pub b_end: usize,
}

/// 后缀对齐结果：`a[a_start..]` 与 `b[b_start..]` 对齐，且至少一端到达串首
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixMatch {
    pub dist: usize,
    pub a_start: usize,
    pub b_start: usize,
}

enum Band {
    Reached { errs: usize, i: usize, d: i32 },
    /// 预算用尽，返回最后一行中走得最远的单元
    Exhausted { furthest: usize, d: i32 },
}

#[inline]
fn cell(e: i32, d: i32) -> usize {
    (e * (e + 1) + d) as usize
}

/// 共享的对角线扩展核心。`eq(i, j)` 比较 a 的第 i 个与 b 的第 j 个字符（方向由调用方决定）；
/// `global` 为真时要求两串同时走完，否则任一串走完即可。
fn run_band<F>(space: &mut [i32], m: usize, n: usize, max_errs: usize, global: bool, eq: F) -> Band
where
    F: Fn(usize, usize) -> bool,
{
    let (mi, ni) = (m as i32, n as i32);
    let reached = |i: i32, d: i32| {
        if global {
            i == mi && i + d == ni
        } else {
            i == mi || i + d == ni
        }
    };

    let mut i = 0;
    while i < mi && i < ni && eq(i as usize, i as usize) {
        i += 1;
    }
    space[0] = i;
    if reached(i, 0) {
        return Band::Reached { errs: 0, i: i as usize, d: 0 };
    }

    let mut furthest = (0, 0);
    for e in 1..=max_errs as i32 {
        furthest = (0, 0);
        for d in -e..=e {
            let mut best = NEG;
            if -e < d && d < e {
                best = best.max(space[cell(e - 1, d)] + 1); // substitution
            }
            if -e < d - 1 {
                best = best.max(space[cell(e - 1, d - 1)]); // extra base in b
            }
            if d + 1 < e {
                best = best.max(space[cell(e - 1, d + 1)] + 1); // extra base in a
            }

            // 合法区间：0 <= i <= m 且 0 <= i + d <= n
            let lo = (-d).max(0);
            let hi = mi.min(ni - d);
            if best < lo || lo > hi {
                space[cell(e, d)] = NEG;
                continue;
            }

            let mut i = best.min(hi);
            while i < mi && i + d < ni && eq(i as usize, (i + d) as usize) {
                i += 1;
            }
            space[cell(e, d)] = i;
            if reached(i, d) {
                return Band::Reached { errs: e as usize, i: i as usize, d };
            }
            if furthest.0 < i {
                furthest = (i, d);
            }
        }
    }

    Band::Exhausted { furthest: furthest.0 as usize, d: furthest.1 }
}

/// 编辑距离（插入、删除、替换各计 1）。超出带宽时返回 `global_max_errs + 1`。
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    edit_distance_with_buf(a, b, &mut EditBuffer::new())
}

pub fn edit_distance_with_buf(a: &[u8], b: &[u8], buf: &mut EditBuffer) -> usize {
    if a == b {
        return 0;
    }
    let max_errs = global_max_errs(a.len(), b.len());
    let space = buf.reserve_band(max_errs);
    match run_band(space, a.len(), b.len(), max_errs, true, |i, j| a[i] == b[j]) {
        Band::Reached { errs, .. } => errs,
        Band::Exhausted { .. } => max_errs + 1,
    }
}

/// a 的前缀与 b 的前缀之间的最优对齐，匹配必须延伸到 a 或 b 的末尾。
/// 超出带宽时距离为 `semi_global_max_errs`，位置取最后一行走得最远的单元。
pub fn prefix_edit_distance(a: &[u8], b: &[u8], buf: &mut EditBuffer) -> PrefixMatch {
    let (m, n) = (a.len(), b.len());
    let max_errs = semi_global_max_errs(m, n);
    let space = buf.reserve_band(max_errs);
    match run_band(space, m, n, max_errs, false, |i, j| a[i] == b[j]) {
        Band::Reached { errs, i, d } => {
            PrefixMatch { dist: errs, a_end: i, b_end: (i as i32 + d) as usize }
        }
        Band::Exhausted { furthest, d } => PrefixMatch {
            dist: max_errs,
            a_end: furthest,
            b_end: (furthest as i32 + d) as usize,
        },
    }
}

/// 镜像版本：从两串右端向左对齐，匹配必须延伸到 a 或 b 的开头
pub fn suffix_edit_distance(a: &[u8], b: &[u8], buf: &mut EditBuffer) -> SuffixMatch {
    let (m, n) = (a.len(), b.len());
    let max_errs = semi_global_max_errs(m, n);
    let space = buf.reserve_band(max_errs);
    let eq = |i: usize, j: usize| a[m - 1 - i] == b[n - 1 - j];
    let (dist, i, d) = match run_band(space, m, n, max_errs, false, eq) {
        Band::Reached { errs, i, d } => (errs, i, d),
        Band::Exhausted { furthest, d } => (max_errs, furthest, d),
    };
    let b_used = (i as i32 + d) as usize;
    SuffixMatch { dist, a_start: m - i, b_start: n - b_used }
}
