use crate::error::KmerError;
use crate::index::{KmerIndex, Strand};
use crate::util::dna;

/// 双链 k-mer 窗口：同时维护正链序列与其反向互补，滑动时两者同步更新。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerPair {
    fwd: Vec<u8>,
    rev: Vec<u8>,
}

impl KmerPair {
    /// 窗口长度固定为 `kmer.len()`；空串没有首尾碱基可滑动，直接 panic。
    pub fn new(kmer: &[u8]) -> Self {
        assert!(!kmer.is_empty(), "KmerPair needs a non-empty kmer");
        Self { fwd: kmer.to_vec(), rev: dna::revcomp(kmer) }
    }

    #[inline]
    pub fn fwd(&self) -> &[u8] {
        &self.fwd
    }

    #[inline]
    pub fn rev(&self) -> &[u8] {
        &self.rev
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fwd.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fwd.is_empty()
    }

    /// 窗口右移一步：丢弃最左碱基，`ch` 追加到右端
    pub fn push_right(&mut self, ch: u8) {
        let k = self.fwd.len();
        self.fwd.copy_within(1.., 0);
        self.fwd[k - 1] = ch;
        self.rev.copy_within(..k - 1, 1);
        self.rev[0] = dna::complement(ch);
    }

    /// 窗口左移一步：丢弃最右碱基，`ch` 放到左端
    pub fn push_left(&mut self, ch: u8) {
        let k = self.fwd.len();
        self.fwd.copy_within(..k - 1, 1);
        self.fwd[0] = ch;
        self.rev.copy_within(1.., 0);
        self.rev[k - 1] = dna::complement(ch);
    }

    pub fn set_first(&mut self, ch: u8) {
        let k = self.fwd.len();
        self.fwd[0] = ch;
        self.rev[k - 1] = dna::complement(ch);
    }

    pub fn set_last(&mut self, ch: u8) {
        let k = self.fwd.len();
        self.fwd[k - 1] = ch;
        self.rev[0] = dna::complement(ch);
    }

    #[inline]
    pub fn canonical(&self) -> &[u8] {
        canonical(&self.fwd, &self.rev)
    }

    /// 规范串取自哪条链
    pub fn strand(&self) -> Strand {
        if self.fwd < self.rev { Strand::Forward } else { Strand::Reverse }
    }

    pub fn has_ambiguous(&self) -> bool {
        !dna::is_acgt(&self.fwd)
    }
}

/// 字典序较小者为规范串；回文时两者相同
#[inline]
pub fn canonical<'a>(fwd: &'a [u8], rev: &'a [u8]) -> &'a [u8] {
    if fwd < rev { fwd } else { rev }
}

/// 用规范串查索引。含非 ACGT 字符的窗口视为未命中；长度不符仍然报错。
pub fn lookup<'a, T>(
    index: &'a KmerIndex<T>,
    fwd: &[u8],
    rev: &[u8],
) -> Result<Option<&'a T>, KmerError> {
    match index.find(canonical(fwd, rev)) {
        Err(KmerError::InvalidBase { .. }) => Ok(None),
        other => other,
    }
}

pub fn lookup_mut<'a, T>(
    index: &'a mut KmerIndex<T>,
    fwd: &[u8],
    rev: &[u8],
) -> Result<Option<&'a mut T>, KmerError> {
    match index.find_mut(canonical(fwd, rev)) {
        Err(KmerError::InvalidBase { .. }) => Ok(None),
        other => other,
    }
}

#[inline]
pub fn lookup_pair<'a, T>(
    index: &'a KmerIndex<T>,
    pair: &KmerPair,
) -> Result<Option<&'a T>, KmerError> {
    lookup(index, pair.fwd(), pair.rev())
}
