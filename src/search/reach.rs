use std::collections::VecDeque;

use crate::error::KmerError;
use crate::index::{KmerCodec, KmerIndex, PackedKmer};
use crate::search::canonical::{lookup_pair, KmerPair};
use crate::search::{max_steps_between, window};
use crate::util::dna;

/// BFS 可达性搜索。
///
/// visited 集合本身也是一个 [`KmerIndex`]，以正链方向的压缩 k-mer 为键（行走方向固定向右，
/// 同一 k-mer 的两条链是不同的状态）。结构可跨调用复用：每次搜索前清空，保留容量。
pub struct ReachSearch {
    visited: KmerIndex<()>,
    queue: VecDeque<(PackedKmer, usize)>,
    kmer: Vec<u8>,
}

impl ReachSearch {
    pub fn new(codec: KmerCodec) -> Self {
        Self {
            visited: KmerIndex::with_codec(codec),
            queue: VecDeque::new(),
            kmer: Vec::new(),
        }
    }

    pub fn for_index<T>(index: &KmerIndex<T>) -> Self {
        Self::new(index.codec().clone())
    }

    /// 从 `seq[from..]` 处的 k-mer 出发，只经过索引中的 k-mer 向右扩展，
    /// 求到达 `seq[to..]` 处 k-mer 的最短步数；不可达或超出步数上限时返回 `None`。
    ///
    /// 起止 k-mer 本身不要求在索引中；两者相同时步数为 0。
    pub fn shortest_path<T>(
        &mut self,
        index: &KmerIndex<T>,
        seq: &[u8],
        from: usize,
        to: usize,
    ) -> Result<Option<usize>, KmerError> {
        let k = index.kmer_len();
        let start = window(seq, from, k)?;
        let target = window(seq, to, k)?;
        if start.eq_ignore_ascii_case(target) {
            return Ok(Some(0));
        }

        if self.visited.codec() != index.codec() {
            self.visited = KmerIndex::with_codec(index.codec().clone());
        } else {
            self.visited.clear();
        }
        self.queue.clear();

        let codec = index.codec();
        let max_steps = max_steps_between(from, to);
        let start_bin = codec.encode(start)?;
        self.visited.insert_packed(start_bin, ());
        self.queue.push_back((start_bin, 0));

        let mut found = None;
        // FIFO 出队顺序即距离非降序（所有边权为 1）
        'bfs: while let Some((bin, dist)) = self.queue.pop_front() {
            let len = dist + 1;
            codec.decode_into(bin, true, &mut self.kmer);
            let mut next = KmerPair::new(&self.kmer);
            next.push_right(b'A');
            for &ch in &dna::ACGT {
                next.set_last(ch);
                if next.fwd().eq_ignore_ascii_case(target) {
                    found = Some(len);
                    break 'bfs;
                }
                if lookup_pair(index, &next)?.is_none() {
                    continue;
                }
                let next_bin = codec.shift_left(bin, ch)?;
                if len < max_steps && self.visited.find_packed(&next_bin).is_none() {
                    self.visited.insert_packed(next_bin, ());
                    self.queue.push_back((next_bin, len));
                }
            }
        }

        match found {
            Some(len) => log::trace!("shortest path {}..{}: len={}", from, to, len),
            None => log::trace!("no path {}..{} within {} steps", from, to, max_steps),
        }
        Ok(found)
    }
}

/// 一次性版本：内部新建 visited 表
pub fn shortest_path_len<T>(
    index: &KmerIndex<T>,
    seq: &[u8],
    from: usize,
    to: usize,
) -> Result<Option<usize>, KmerError> {
    ReachSearch::for_index(index).shortest_path(index, seq, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn linear_genome_distance() {
        let g = make_genome(60, 11);
        let idx = index_of(&[&g], 11);
        let mut bfs = ReachSearch::for_index(&idx);
        assert_eq!(bfs.shortest_path(&idx, &g, 0, 0).unwrap(), Some(0));
        assert_eq!(bfs.shortest_path(&idx, &g, 0, 1).unwrap(), Some(1));
        assert_eq!(bfs.shortest_path(&idx, &g, 19, 31).unwrap(), Some(12));
        // 复用同一个搜索器
        assert_eq!(bfs.shortest_path(&idx, &g, 3, 40).unwrap(), Some(37));
    }

    #[test]
    fn respects_step_budget() {
        let g = make_genome(60, 11);
        let idx = index_of(&[&g], 11);
        // 读段只含 G[0..11] 与 G[40..51]：图上的真实距离 40 超过 10 + 1.1 × 11 = 22
        let mut read = g[..11].to_vec();
        read.extend_from_slice(&g[40..51]);
        assert_eq!(shortest_path_len(&idx, &read, 0, 11).unwrap(), None);
    }

    #[test]
    fn unreachable_target() {
        let g = make_genome(60, 11);
        let idx = index_of(&[&g], 11);
        let mut read = g[..11].to_vec();
        read.extend_from_slice(b"TTTTTTTTTTT");
        assert_eq!(shortest_path_len(&idx, &read, 0, 11).unwrap(), None);
    }

    #[test]
    fn window_out_of_range_is_an_error() {
        let g = make_genome(30, 11);
        let idx = index_of(&[&g], 11);
        assert!(matches!(
            shortest_path_len(&idx, &g, 0, 25),
            Err(KmerError::LengthMismatch { .. })
        ));
    }
}
