//! 基于 k-mer 的序列修复。
//!
//! 沿序列滑动 k-mer 窗口，用规范链查找标出命中位置；相邻命中之间的空缺是"缺口"：
//!
//! - 开头缺口：从第一个命中向左延伸，用后缀编辑距离挑选候选
//! - 内部缺口：先 BFS 判断可达，再 DFS 枚举所有连接路径，用编辑距离挑选候选
//! - 末尾缺口：从最后一个命中向右延伸，用前缀编辑距离挑选候选
//!
//! 每个缺口独立处理，最多产生一个 [`Correction`]；修正按位置顺序拼接回原序列。
//! 路径过多、错误率过高或无路径时该缺口保持原样，不视为错误。

pub mod stats;

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::align::{edit_distance_with_buf, prefix_edit_distance, suffix_edit_distance, EditBuffer};
use crate::align::{PrefixMatch, SuffixMatch};
use crate::error::KmerError;
use crate::index::{KmerIndex, KmerInfo};
use crate::io::fasta::{write_record, FastaReader, LINE_WIDTH};
use crate::search::{
    enumerate_extensions, enumerate_paths, lookup_mut, lookup_pair, max_steps_between, Direction,
    Enumeration, KmerPair, ReachSearch, MAX_EXTENSION_STEPS,
};

pub use stats::{GapCounts, RepairStats, RunReport};

/// 修复参数
#[derive(Clone, Copy, Debug)]
pub struct RepairOpt {
    /// 超过该长度（未命中窗口数）的内部缺口不尝试修复
    pub max_gap: usize,
    /// 候选路径数上限，超出即放弃该缺口
    pub max_paths: usize,
    /// 端部延伸可接受的最大错误率
    pub max_extension_erate: f64,
    pub max_extension_steps: usize,
}

impl Default for RepairOpt {
    fn default() -> Self {
        Self {
            max_gap: 500,
            max_paths: 500,
            max_extension_erate: 0.12,
            max_extension_steps: MAX_EXTENSION_STEPS,
        }
    }
}

/// 原序列上的半开区间 `[lo, hi)` 替换为 `replacement`。
/// `lo == hi` 为纯插入；`replacement` 为空为纯删除。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub lo: usize,
    pub hi: usize,
    pub replacement: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapKind {
    Leading,
    Interior,
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapOutcome {
    Repaired,
    TooLong,
    NoPath,
    OverBudget,
    AboveErrorRate,
    NoCandidate,
    Inconsistent,
}

/// 一个缺口的处理记录；`start..end` 为未命中窗口的起始位置范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapReport {
    pub kind: GapKind,
    pub start: usize,
    pub end: usize,
    pub outcome: GapOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedSeq {
    pub seq: Vec<u8>,
    pub corrections: Vec<Correction>,
    pub gaps: Vec<GapReport>,
    /// 命中索引的窗口起始位置
    pub matches: Vec<usize>,
}

impl RepairedSeq {
    pub fn is_corrected(&self) -> bool {
        !self.corrections.is_empty()
    }
}

type Resolution = (GapOutcome, Option<Correction>);

/// 按顺序把修正拼接进原序列。与前一个修正重叠或越界的修正会被忽略。
pub fn apply_corrections(seq: &[u8], corrections: &[Correction]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    let mut prev = 0;
    for c in corrections {
        if c.lo < prev || c.hi < c.lo || c.hi > seq.len() {
            log::warn!(
                "ignoring out-of-order correction {}..{} (previous end {})",
                c.lo,
                c.hi,
                prev
            );
            continue;
        }
        out.extend_from_slice(&seq[prev..c.lo]);
        out.extend_from_slice(&c.replacement);
        prev = c.hi;
    }
    out.extend_from_slice(&seq[prev..]);
    out
}

/// 由读段上两锚点的间距与所选路径的间距推出内部缺口的修正。
///
/// `read_sep = to - (from + k)`，`path_sep = |path| - 2k`：
/// 两者都非负时直接替换；读段间距更小则插入；路径间距更小则删除。
/// 两者相等且为负时路径与读段完全一致，不应出现缺口，返回 `None`。
pub fn interior_correction(k: usize, from: usize, to: usize, path: &[u8]) -> Option<Correction> {
    let lo = from + k;
    let read_sep = to as isize - lo as isize;
    let path_sep = path.len() as isize - 2 * k as isize;

    if read_sep >= 0 && path_sep >= 0 {
        Some(Correction { lo, hi: to, replacement: path[k..k + path_sep as usize].to_vec() })
    } else if read_sep < path_sep {
        let n = (path_sep - read_sep) as usize;
        Some(Correction { lo, hi: lo, replacement: path.get(k..k + n)?.to_vec() })
    } else if path_sep < read_sep {
        Some(Correction { lo, hi: lo + (read_sep - path_sep) as usize, replacement: Vec::new() })
    } else {
        None
    }
}

#[inline]
fn error_rate(dist: usize, aligned: usize) -> f64 {
    if aligned > 0 {
        2.0 * dist as f64 / aligned as f64
    } else {
        2.0
    }
}

/// 对每条左延伸做后缀对齐，取错误率最低者（并列取第一个）
fn best_left_extension(
    read_prefix: &[u8],
    paths: &[Vec<u8>],
    buf: &mut EditBuffer,
) -> Option<(usize, SuffixMatch, f64)> {
    let mut best = None;
    let mut best_erate = 2.0;
    for (j, path) in paths.iter().enumerate() {
        let m = suffix_edit_distance(read_prefix, path, buf);
        let erate = error_rate(m.dist, (read_prefix.len() - m.a_start) + (path.len() - m.b_start));
        log::trace!(
            "left path {}: dist={} erate={:.4} a_start={} b_start={}",
            j,
            m.dist,
            erate,
            m.a_start,
            m.b_start
        );
        if erate < best_erate {
            best_erate = erate;
            best = Some((j, m));
        }
    }
    best.map(|(j, m)| (j, m, best_erate))
}

/// 对每条右延伸做前缀对齐；对齐必须到达读段尾部或路径尾部才算候选
fn best_right_extension(
    read_suffix: &[u8],
    paths: &[Vec<u8>],
    buf: &mut EditBuffer,
) -> Option<(usize, PrefixMatch, f64)> {
    let mut best = None;
    let mut best_erate = 2.0;
    for (j, path) in paths.iter().enumerate() {
        let m = prefix_edit_distance(read_suffix, path, buf);
        let erate = error_rate(m.dist, m.a_end + m.b_end);
        log::trace!(
            "right path {}: dist={} erate={:.4} a_end={} b_end={}",
            j,
            m.dist,
            erate,
            m.a_end,
            m.b_end
        );
        let reaches_end = m.a_end == read_suffix.len() || m.b_end == path.len();
        if reaches_end && erate < best_erate {
            best_erate = erate;
            best = Some((j, m));
        }
    }
    best.map(|(j, m)| (j, m, best_erate))
}

/// 与读段上的原始片段编辑距离最小的路径；必须严格小于片段长度
fn best_interior_path(
    reference: &[u8],
    paths: &[Vec<u8>],
    buf: &mut EditBuffer,
) -> Option<(usize, usize)> {
    let mut best = None;
    let mut dist = reference.len();
    for (j, path) in paths.iter().enumerate() {
        let d = edit_distance_with_buf(reference, path, buf);
        log::trace!("path {}: dist={}", j, d);
        if d < dist {
            dist = d;
            best = Some(j);
        }
    }
    best.map(|j| (j, dist))
}

/// 单线程修复器：持有索引的可变借用（只用于写入使用标记）以及可复用的搜索与对齐缓冲区。
pub struct Repairer<'a> {
    index: &'a mut KmerIndex<KmerInfo>,
    opt: RepairOpt,
    reach: ReachSearch,
    edit: EditBuffer,
    stats: RepairStats,
}

impl<'a> Repairer<'a> {
    pub fn new(index: &'a mut KmerIndex<KmerInfo>, opt: RepairOpt) -> Self {
        let reach = ReachSearch::for_index(&*index);
        Self { index, opt, reach, edit: EditBuffer::new(), stats: RepairStats::default() }
    }

    #[inline]
    pub fn kmer_len(&self) -> usize {
        self.index.kmer_len()
    }

    pub fn index(&self) -> &KmerIndex<KmerInfo> {
        &*self.index
    }

    pub fn stats(&self) -> &RepairStats {
        &self.stats
    }

    pub fn into_stats(self) -> RepairStats {
        self.stats
    }

    /// 返回所有命中索引的窗口起始位置。含非 ACGT 字符的窗口一律视为未命中。
    pub fn scan(&self, seq: &[u8]) -> Result<Vec<usize>, KmerError> {
        let k = self.kmer_len();
        let mut matches = Vec::new();
        if seq.len() < k {
            return Ok(matches);
        }

        let mut pair = KmerPair::new(&seq[..k]);
        for pos in 0..=seq.len() - k {
            if pos > 0 {
                pair.push_right(seq[pos + k - 1]);
            }
            let hit = if pair.has_ambiguous() { None } else { lookup_pair(&*self.index, &pair)? };
            match hit {
                Some(info) => {
                    let kmer = String::from_utf8_lossy(pair.fwd());
                    log::trace!("{:5}  {}  ct= {}", pos, kmer, info.freq());
                    matches.push(pos);
                }
                None => {
                    log::trace!("{:5}  {}  unmatched", pos, String::from_utf8_lossy(pair.fwd()))
                }
            }
        }
        Ok(matches)
    }

    /// 修复一条（已转大写的）序列。短于 k 的序列原样返回。
    pub fn repair(&mut self, seq: &[u8]) -> Result<RepairedSeq, KmerError> {
        let k = self.kmer_len();
        let matches = self.scan(seq)?;
        let mut corrections = Vec::new();
        let mut gaps = Vec::new();

        let mut prev: Option<usize> = None;
        for &p in &matches {
            let gap = match prev {
                None if p > 0 => Some((GapKind::Leading, 0, self.leading_gap(seq, p)?)),
                Some(p0) if p > p0 + 1 => {
                    Some((GapKind::Interior, p0 + 1, self.interior_gap(seq, p0, p)?))
                }
                _ => None,
            };
            if let Some((kind, start, (outcome, correction))) = gap {
                gaps.push(GapReport { kind, start, end: p, outcome });
                corrections.extend(correction);
            }
            prev = Some(p);
        }

        if let Some(last) = prev {
            if last + k < seq.len() {
                let (outcome, correction) = self.trailing_gap(seq, last)?;
                gaps.push(GapReport {
                    kind: GapKind::Trailing,
                    start: last + 1,
                    end: seq.len() - k + 1,
                    outcome,
                });
                corrections.extend(correction);
            }
        }

        for g in &gaps {
            self.stats.record_gap(g.kind, g.outcome);
        }
        let out = apply_corrections(seq, &corrections);
        self.stats.records_read += 1;
        self.stats.corrections += corrections.len();
        self.stats.bases_in += seq.len();
        self.stats.bases_out += out.len();
        if !corrections.is_empty() {
            self.stats.records_corrected += 1;
        }
        log::debug!("number of correction segments is {}", corrections.len());

        Ok(RepairedSeq { seq: out, corrections, gaps, matches })
    }

    fn leading_gap(&mut self, seq: &[u8], first: usize) -> Result<Resolution, KmerError> {
        let k = self.kmer_len();
        let anchor = &seq[first..first + k];
        let max_steps = max_steps_between(0, first).min(self.opt.max_extension_steps);
        let found = enumerate_extensions(
            &*self.index,
            Direction::Left,
            anchor,
            max_steps,
            self.opt.max_paths,
        )?;
        let paths = match found {
            Enumeration::Complete(paths) => paths,
            Enumeration::OverBudget { found } => {
                log::debug!(
                    "found more than {} left extensions ({}); ignoring",
                    self.opt.max_paths,
                    found
                );
                return Ok((GapOutcome::OverBudget, None));
            }
        };
        log::debug!("found {} left extensions for leading gap of {}", paths.len(), first);
        if paths.is_empty() {
            return Ok((GapOutcome::NoPath, None));
        }

        let Some((j, m, erate)) = best_left_extension(&seq[..first], &paths, &mut self.edit) else {
            return Ok((GapOutcome::NoCandidate, None));
        };
        log::debug!(
            "best left extension is path {} dist={} erate={:.2}%",
            j,
            m.dist,
            100.0 * erate
        );
        if erate > self.opt.max_extension_erate {
            log::debug!("  correction not made");
            return Ok((GapOutcome::AboveErrorRate, None));
        }
        if m.a_start != 0 && m.b_start != 0 {
            log::debug!("  alignment does not reach the start; correction not made");
            return Ok((GapOutcome::NoCandidate, None));
        }

        let path = &paths[j];
        let c = Correction { lo: m.a_start, hi: first, replacement: path[m.b_start..].to_vec() };
        log::debug!(
            "replace {}..{} {} with {}",
            c.lo,
            c.hi,
            String::from_utf8_lossy(&seq[c.lo..c.hi]),
            String::from_utf8_lossy(&c.replacement)
        );
        let mut walk = path.clone();
        walk.extend_from_slice(anchor);
        self.mark_used(&walk)?;
        Ok((GapOutcome::Repaired, Some(c)))
    }

    fn interior_gap(
        &mut self,
        seq: &[u8],
        from: usize,
        to: usize,
    ) -> Result<Resolution, KmerError> {
        let k = self.kmer_len();
        let gap = to - from - 1;
        log::debug!("unmatched gap of length {} between {} and {}", gap, from, to);
        if gap > self.opt.max_gap {
            log::debug!("  gap too long; skipping");
            return Ok((GapOutcome::TooLong, None));
        }

        // BFS 先排除无路可走的缺口，避免代价更高的枚举
        let Some(len) = self.reach.shortest_path(&*self.index, seq, from, to)? else {
            log::debug!("  no path");
            return Ok((GapOutcome::NoPath, None));
        };
        let paths = match enumerate_paths(&*self.index, seq, from, to, self.opt.max_paths)? {
            Enumeration::Complete(paths) => paths,
            Enumeration::OverBudget { found } => {
                log::debug!("  found more than {} paths ({}); ignoring", self.opt.max_paths, found);
                return Ok((GapOutcome::OverBudget, None));
            }
        };
        log::debug!("  shortest path {} steps, found {} paths", len, paths.len());
        if paths.is_empty() {
            return Ok((GapOutcome::NoPath, None));
        }

        let reference = &seq[from..to + k];
        let Some((j, dist)) = best_interior_path(reference, &paths, &mut self.edit) else {
            return Ok((GapOutcome::NoCandidate, None));
        };
        log::debug!("  best path {} score {}", j, dist);

        match interior_correction(k, from, to, &paths[j]) {
            Some(c) => {
                log::debug!(
                    "  replace {}..{} >{}< with >{}<",
                    c.lo,
                    c.hi,
                    String::from_utf8_lossy(&seq[c.lo..c.hi]),
                    String::from_utf8_lossy(&c.replacement)
                );
                self.mark_used(&paths[j])?;
                Ok((GapOutcome::Repaired, Some(c)))
            }
            None => {
                log::warn!(
                    "gap {}..{}: equal negative read and path separations (path length {}); skip",
                    from,
                    to,
                    paths[j].len()
                );
                Ok((GapOutcome::Inconsistent, None))
            }
        }
    }

    fn trailing_gap(&mut self, seq: &[u8], last: usize) -> Result<Resolution, KmerError> {
        let k = self.kmer_len();
        let unmatched = seq.len() - k - last;
        let max_steps = max_steps_between(0, unmatched).min(self.opt.max_extension_steps);
        log::debug!("try right extension from {} (max_steps={})", last, max_steps);

        let anchor = &seq[last..last + k];
        let found = enumerate_extensions(
            &*self.index,
            Direction::Right,
            anchor,
            max_steps,
            self.opt.max_paths,
        )?;
        let paths = match found {
            Enumeration::Complete(paths) => paths,
            Enumeration::OverBudget { found } => {
                log::debug!(
                    "found more than {} right extensions ({}); ignoring",
                    self.opt.max_paths,
                    found
                );
                return Ok((GapOutcome::OverBudget, None));
            }
        };
        log::debug!("found {} right extensions", paths.len());
        if paths.is_empty() {
            return Ok((GapOutcome::NoPath, None));
        }

        let tail = &seq[last + k..];
        let Some((j, m, erate)) = best_right_extension(tail, &paths, &mut self.edit) else {
            return Ok((GapOutcome::NoCandidate, None));
        };
        log::debug!(
            "best right extension is path {} dist={} erate={:.2}%",
            j,
            m.dist,
            100.0 * erate
        );
        if erate > self.opt.max_extension_erate {
            log::debug!("  correction not made");
            return Ok((GapOutcome::AboveErrorRate, None));
        }

        let path = &paths[j];
        let lo = last + k;
        let c = Correction { lo, hi: lo + m.a_end, replacement: path[..m.b_end].to_vec() };
        let mut walk = anchor.to_vec();
        walk.extend_from_slice(path);
        self.mark_used(&walk)?;
        Ok((GapOutcome::Repaired, Some(c)))
    }

    /// 给 `walk` 中每个在索引里的 k-mer 打上读取方向的使用标记，返回标记的个数
    fn mark_used(&mut self, walk: &[u8]) -> Result<usize, KmerError> {
        let k = self.kmer_len();
        if walk.len() < k {
            return Ok(0);
        }
        let mut pair = KmerPair::new(&walk[..k]);
        let mut marked = 0;
        for pos in 0..=walk.len() - k {
            if pos > 0 {
                pair.push_right(walk[pos + k - 1]);
            }
            if let Some(info) = lookup_mut(&mut *self.index, pair.fwd(), pair.rev())? {
                info.mark_used(pair.strand());
                marked += 1;
            }
        }
        Ok(marked)
    }
}

/// 读取多序列 FASTA，逐条修复后写出。短于 k 的序列跳过且不输出。
pub fn repair_fasta<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    repairer: &mut Repairer<'_>,
) -> Result<()> {
    let k = repairer.kmer_len();
    let mut fasta = FastaReader::new(reader);
    let mut n = 0usize;

    while let Some(rec) = fasta.next_record()? {
        n += 1;
        if rec.seq.len() < k {
            log::warn!(
                "skipping sequence {} with length {} shorter than kmer length {}",
                rec.id,
                rec.seq.len(),
                k
            );
            repairer.stats.records_read += 1;
            repairer.stats.records_skipped += 1;
            continue;
        }

        log::debug!("#{}  len={}", rec.header(), rec.seq.len());
        let fixed = repairer.repair(&rec.seq)?;
        let mut header = rec.header();
        if fixed.is_corrected() {
            header.push_str("  corrected");
        }
        write_record(out, &header, &fixed.seq, LINE_WIDTH)?;

        if n % 100_000 == 0 {
            log::info!("{} sequences processed", n);
        }
    }
    out.flush()?;

    let s = repairer.stats();
    log::info!(
        "{} sequences read, {} skipped, {} corrected with {} corrections",
        s.records_read,
        s.records_skipped,
        s.records_corrected,
        s.corrections
    );
    Ok(())
}
