use crate::error::KmerError;
use crate::index::KmerIndex;
use crate::search::canonical::{lookup_pair, KmerPair};
use crate::search::{max_steps_between, window};
use crate::util::dna;

/// 端部延伸的绝对步数上限
pub const MAX_EXTENSION_STEPS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// 路径枚举结果。超出路径预算时搜索立即中止，已找到的部分结果直接丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enumeration {
    Complete(Vec<Vec<u8>>),
    OverBudget { found: usize },
}

impl Enumeration {
    pub fn into_paths(self) -> Option<Vec<Vec<u8>>> {
        match self {
            Enumeration::Complete(paths) => Some(paths),
            Enumeration::OverBudget { .. } => None,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        matches!(self, Enumeration::OverBudget { .. })
    }
}

/// DFS 状态：`path` 是共享的路径缓冲区，递归返回时弹出末尾碱基完成回溯
struct Walker<'a, T> {
    index: &'a KmerIndex<T>,
    max_steps: usize,
    max_paths: usize,
    path: Vec<u8>,
    found: Vec<Vec<u8>>,
}

impl<'a, T> Walker<'a, T> {
    fn new(index: &'a KmerIndex<T>, max_steps: usize, max_paths: usize) -> Self {
        Self { index, max_steps, max_paths, path: Vec::new(), found: Vec::new() }
    }

    #[inline]
    fn within_budget(&self) -> bool {
        self.found.len() <= self.max_paths
    }

    /// `path` 的末尾 k 个碱基是当前 k-mer。返回 false 表示超出预算、需要整体中止。
    fn walk_to(&mut self, step: usize, target: &[u8]) -> Result<bool, KmerError> {
        let k = self.index.kmer_len();
        let cur = &self.path[self.path.len() - k..];
        if cur.eq_ignore_ascii_case(target) {
            let p = self.path.clone();
            self.found.push(p);
            return Ok(self.within_budget());
        }
        if step == self.max_steps {
            return Ok(true);
        }

        let mut next = KmerPair::new(cur);
        next.push_right(b'A');
        for &ch in &dna::ACGT {
            next.set_last(ch);
            // 与 BFS 一致：目标 k-mer 无需在索引中
            if !next.fwd().eq_ignore_ascii_case(target)
                && lookup_pair(self.index, &next)?.is_none()
            {
                continue;
            }
            self.path.push(ch);
            let ok = self.walk_to(step + 1, target)?;
            self.path.pop();
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// 无目标的向外延伸。`path` 按行走顺序记录新增碱基（向左时为逆序）。
    fn extend(&mut self, dir: Direction, step: usize, cur: &KmerPair) -> Result<bool, KmerError> {
        let mut extended = false;
        if step < self.max_steps {
            let mut next = cur.clone();
            match dir {
                Direction::Right => next.push_right(b'A'),
                Direction::Left => next.push_left(b'A'),
            }
            for &ch in &dna::ACGT {
                match dir {
                    Direction::Right => next.set_last(ch),
                    Direction::Left => next.set_first(ch),
                }
                if lookup_pair(self.index, &next)?.is_none() {
                    continue;
                }
                extended = true;
                self.path.push(ch);
                let ok = self.extend(dir, step + 1, &next)?;
                self.path.pop();
                if !ok {
                    return Ok(false);
                }
            }
        }

        // 无后继（或到达步数上限）即为一条极大路径；零长度路径不记录
        if !extended && step > 0 {
            let mut p = self.path.clone();
            if dir == Direction::Left {
                p.reverse();
            }
            self.found.push(p);
        }
        Ok(self.within_budget())
    }

    fn finish(self, ok: bool) -> Enumeration {
        if ok && self.within_budget() {
            Enumeration::Complete(self.found)
        } else {
            Enumeration::OverBudget { found: self.found.len() }
        }
    }
}

/// 枚举从 `seq[from..]` 处 k-mer 向右走到 `seq[to..]` 处 k-mer 的全部路径。
///
/// 每条路径是完整的碱基串（含起止 k-mer），最短路径步数为 L 时其长度为 L + k。
/// 步数上限为 [`max_steps_between`]；路径数超过 `max_paths` 时返回 `OverBudget`。
pub fn enumerate_paths<T>(
    index: &KmerIndex<T>,
    seq: &[u8],
    from: usize,
    to: usize,
    max_paths: usize,
) -> Result<Enumeration, KmerError> {
    let k = index.kmer_len();
    let start = window(seq, from, k)?;
    let target = window(seq, to, k)?;

    let mut walker = Walker::new(index, max_steps_between(from, to), max_paths);
    walker.path.extend_from_slice(start);
    let ok = walker.walk_to(0, target)?;
    Ok(walker.finish(ok))
}

/// 从锚点 k-mer 向左或向右延伸直到无后继或达到 `max_steps`（不超过 [`MAX_EXTENSION_STEPS`]）。
///
/// 返回的路径只包含锚点之外新增的碱基，按正链从左到右排列。
pub fn enumerate_extensions<T>(
    index: &KmerIndex<T>,
    dir: Direction,
    anchor: &[u8],
    max_steps: usize,
    max_paths: usize,
) -> Result<Enumeration, KmerError> {
    let k = index.kmer_len();
    if anchor.len() != k {
        return Err(KmerError::LengthMismatch { expected: k, got: anchor.len() });
    }

    let mut walker = Walker::new(index, max_steps.min(MAX_EXTENSION_STEPS), max_paths);
    let ok = walker.extend(dir, 0, &KmerPair::new(anchor))?;
    Ok(walker.finish(ok))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::reach::shortest_path_len;

    fn make_genome(len: usize, seed: u32) -> Vec<u8> {
        let mut x = seed;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                dna::ACGT[((x >> 16) & 3) as usize]
            })
            .collect()
    }

    fn index_of(seqs: &[&[u8]], k: usize) -> KmerIndex<()> {
        let mut idx = KmerIndex::new(k, 10).unwrap();
        for seq in seqs {
            for w in seq.windows(k) {
                let pair = KmerPair::new(w);
                idx.find_or_insert(pair.canonical(), ()).unwrap();
            }
        }
        idx
    }

    /// 在 pos 处做一个替换
    fn with_snp(g: &[u8], pos: usize) -> Vec<u8> {
        let mut v = g.to_vec();
        v[pos] = match v[pos] {
            b'A' => b'C',
            b'C' => b'G',
            b'G' => b'T',
            _ => b'A',
        };
        v
    }

    #[test]
    fn single_route_through_linear_genome() {
        let g = make_genome(60, 11);
        let idx = index_of(&[&g], 11);
        let paths = enumerate_paths(&idx, &g, 19, 31, 10).unwrap().into_paths().unwrap();
        assert_eq!(paths, vec![g[19..42].to_vec()]);
    }

    #[test]
    fn bubble_yields_both_alleles() {
        let g = make_genome(60, 11);
        let alt = with_snp(&g, 30);
        let idx = index_of(&[&g, &alt], 11);

        let mut paths = enumerate_paths(&idx, &g, 19, 31, 10).unwrap().into_paths().unwrap();
        paths.sort();
        let mut expected = vec![g[19..42].to_vec(), alt[19..42].to_vec()];
        expected.sort();
        assert_eq!(paths, expected);

        let res = enumerate_paths(&idx, &g, 19, 31, 1).unwrap();
        assert_eq!(res, Enumeration::OverBudget { found: 2 });
        assert!(res.into_paths().is_none());
    }

    #[test]
    fn bfs_and_dfs_agree() {
        let g = make_genome(60, 11);
        let alt = with_snp(&g, 30);
        let idx = index_of(&[&g, &alt], 11);
        let k = 11;

        for &(from, to) in &[(0usize, 0usize), (0, 5), (19, 31), (10, 45), (2, 49)] {
            let len = shortest_path_len(&idx, &g, from, to).unwrap();
            let paths = enumerate_paths(&idx, &g, from, to, 500).unwrap().into_paths().unwrap();
            let l = len.expect("genome anchors are connected");
            assert!(paths.iter().any(|p| p.len() == l + k), "from={} to={}", from, to);
            assert!(paths.iter().all(|p| p.len() >= l + k));
        }

        // 不可达：两边都为空
        let mut read = g[..11].to_vec();
        read.extend_from_slice(b"TTTTTTTTTTT");
        assert_eq!(shortest_path_len(&idx, &read, 0, 11).unwrap(), None);
        assert_eq!(
            enumerate_paths(&idx, &read, 0, 11, 500).unwrap(),
            Enumeration::Complete(Vec::new())
        );
    }

    #[test]
    fn extensions_stop_at_genome_ends() {
        let g = make_genome(60, 11);
        let idx = index_of(&[&g], 11);

        let right = enumerate_extensions(&idx, Direction::Right, &g[40..51], 100, 10).unwrap();
        assert_eq!(right, Enumeration::Complete(vec![g[51..60].to_vec()]));

        let left = enumerate_extensions(&idx, Direction::Left, &g[5..16], 100, 10).unwrap();
        assert_eq!(left, Enumeration::Complete(vec![g[0..5].to_vec()]));
    }

    #[test]
    fn extensions_record_partial_path_at_step_limit() {
        let g = make_genome(60, 11);
        let idx = index_of(&[&g], 11);
        let right = enumerate_extensions(&idx, Direction::Right, &g[10..21], 5, 10).unwrap();
        assert_eq!(right, Enumeration::Complete(vec![g[21..26].to_vec()]));
        let left = enumerate_extensions(&idx, Direction::Left, &g[30..41], 4, 10).unwrap();
        assert_eq!(left, Enumeration::Complete(vec![g[26..30].to_vec()]));
    }

    #[test]
    fn dead_end_anchor_has_no_extension() {
        let g = make_genome(60, 11);
        let idx = index_of(&[&g], 11);
        let res = enumerate_extensions(&idx, Direction::Right, &g[49..60], 50, 10).unwrap();
        assert_eq!(res, Enumeration::Complete(Vec::new()));
        assert!(enumerate_extensions(&idx, Direction::Left, &g[..5], 50, 10).is_err());
    }

    #[test]
    fn extension_budget_aborts() {
        let g = make_genome(60, 11);
        let alt = with_snp(&g, 30);
        let idx = index_of(&[&g, &alt], 11);
        let ok = enumerate_extensions(&idx, Direction::Right, &g[10..21], 100, 2).unwrap();
        assert_eq!(ok.into_paths().map(|p| p.len()), Some(2));
        let over = enumerate_extensions(&idx, Direction::Right, &g[10..21], 100, 1).unwrap();
        assert!(over.is_over_budget());
    }
}
