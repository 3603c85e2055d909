use crate::error::KmerError;
use crate::index::codec::{KmerCodec, PackedKmer};

/// 单个前缀桶：后缀与信息两条平行数组，按插入顺序排列
#[derive(Debug, Clone)]
struct Bucket<T> {
    suffix: Vec<u128>,
    info: Vec<T>,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self { suffix: Vec::new(), info: Vec::new() }
    }
}

impl<T> Bucket<T> {
    #[inline]
    fn position(&self, suffix: u128) -> Option<usize> {
        self.suffix.iter().position(|&s| s == suffix)
    }
}

/// 以前缀直接寻址的 k-mer 表：
/// - 4^p 个桶，`prefix` 本身就是桶下标（恒等哈希，不扩容、不重哈希）
/// - 桶内线性扫描后缀，查找代价与桶大小成正比；p ≥ 10 时基因组前缀分布接近均匀
/// - 构造后 k / p 固定，`clear` 清空内容但保留已分配容量
#[derive(Debug, Clone)]
pub struct KmerIndex<T> {
    codec: KmerCodec,
    buckets: Vec<Bucket<T>>,
}

impl<T> KmerIndex<T> {
    pub fn new(k: usize, prefix_len: usize) -> Result<Self, KmerError> {
        Ok(Self::with_codec(KmerCodec::new(k, prefix_len)?))
    }

    pub fn with_codec(codec: KmerCodec) -> Self {
        let n = codec.num_buckets();
        let mut buckets = Vec::with_capacity(n);
        buckets.resize_with(n, Bucket::default);
        Self { codec, buckets }
    }

    #[inline]
    pub fn codec(&self) -> &KmerCodec {
        &self.codec
    }

    #[inline]
    pub fn kmer_len(&self) -> usize {
        self.codec.k()
    }

    #[inline]
    fn bucket(&self, bin: &PackedKmer) -> &Bucket<T> {
        &self.buckets[bin.prefix as usize]
    }

    #[inline]
    fn bucket_mut(&mut self, bin: &PackedKmer) -> &mut Bucket<T> {
        &mut self.buckets[bin.prefix as usize]
    }

    /// 无条件追加（调用方保证不重复）
    pub fn insert(&mut self, kmer: &[u8], info: T) -> Result<(), KmerError> {
        let bin = self.codec.encode(kmer)?;
        self.insert_packed(bin, info);
        Ok(())
    }

    pub fn insert_packed(&mut self, bin: PackedKmer, info: T) {
        let b = self.bucket_mut(&bin);
        b.suffix.push(bin.suffix);
        b.info.push(info);
    }

    /// 已存在则保持原信息不变；否则插入。返回表中该 k-mer 的信息。
    pub fn find_or_insert(&mut self, kmer: &[u8], info: T) -> Result<&mut T, KmerError> {
        let bin = self.codec.encode(kmer)?;
        Ok(self.find_or_insert_packed(bin, info))
    }

    pub fn find_or_insert_packed(&mut self, bin: PackedKmer, info: T) -> &mut T {
        let b = self.bucket_mut(&bin);
        let i = match b.position(bin.suffix) {
            Some(i) => i,
            None => {
                b.suffix.push(bin.suffix);
                b.info.push(info);
                b.info.len() - 1
            }
        };
        &mut b.info[i]
    }

    pub fn find(&self, kmer: &[u8]) -> Result<Option<&T>, KmerError> {
        let bin = self.codec.encode(kmer)?;
        Ok(self.find_packed(&bin))
    }

    pub fn find_mut(&mut self, kmer: &[u8]) -> Result<Option<&mut T>, KmerError> {
        let bin = self.codec.encode(kmer)?;
        Ok(self.find_packed_mut(&bin))
    }

    pub fn find_packed(&self, bin: &PackedKmer) -> Option<&T> {
        let b = self.bucket(bin);
        b.position(bin.suffix).map(|i| &b.info[i])
    }

    pub fn find_packed_mut(&mut self, bin: &PackedKmer) -> Option<&mut T> {
        let b = self.bucket_mut(bin);
        match b.position(bin.suffix) {
            Some(i) => Some(&mut b.info[i]),
            None => None,
        }
    }

    /// 收集所有匹配项（正常情况下至多一个）
    pub fn find_all(&self, kmer: &[u8]) -> Result<Vec<&T>, KmerError> {
        let bin = self.codec.encode(kmer)?;
        let b = self.bucket(&bin);
        Ok(b.suffix
            .iter()
            .zip(&b.info)
            .filter(|(s, _)| **s == bin.suffix)
            .map(|(_, info)| info)
            .collect())
    }

    pub fn count_all(&self) -> usize {
        self.buckets.iter().map(|b| b.suffix.len()).sum()
    }

    pub fn count_all_matching<F>(&self, select: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        self.buckets
            .iter()
            .map(|b| b.info.iter().filter(|&info| select(info)).count())
            .sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.suffix.is_empty())
    }

    pub fn clear(&mut self) {
        for b in &mut self.buckets {
            b.suffix.clear();
            b.info.clear();
        }
    }

    /// 按桶顺序遍历全部条目
    pub fn iter(&self) -> impl Iterator<Item = (PackedKmer, &T)> + '_ {
        self.buckets.iter().enumerate().flat_map(|(prefix, b)| {
            b.suffix.iter().zip(&b.info).map(move |(&suffix, info)| {
                (PackedKmer { prefix: prefix as u32, suffix }, info)
            })
        })
    }

    /// 解码每个条目并交给 `visitor`；过滤与格式化由调用方决定
    pub fn dump<F>(&self, uppercase: bool, mut visitor: F)
    where
        F: FnMut(&[u8], &T),
    {
        let mut kmer = Vec::with_capacity(self.codec.k());
        for (bin, info) in self.iter() {
            self.codec.decode_into(bin, uppercase, &mut kmer);
            visitor(&kmer, info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_find_and_count() {
        let mut idx: KmerIndex<u32> = KmerIndex::new(7, 3).unwrap();
        assert!(idx.is_empty());
        idx.insert(b"ACGTACG", 1).unwrap();
        idx.insert(b"ACGTTTT", 2).unwrap();
        idx.insert(b"TTTTTTT", 3).unwrap();
        assert_eq!(idx.count_all(), 3);
        assert_eq!(idx.find(b"ACGTACG").unwrap(), Some(&1));
        assert_eq!(idx.find(b"acgtttt").unwrap(), Some(&2));
        assert_eq!(idx.find(b"ACGTAAA").unwrap(), None);
        assert_eq!(idx.count_all_matching(|&v| v >= 2), 2);

        *idx.find_mut(b"TTTTTTT").unwrap().unwrap() += 10;
        assert_eq!(idx.find(b"TTTTTTT").unwrap(), Some(&13));
    }

    #[test]
    fn find_or_insert_is_idempotent() {
        let mut idx: KmerIndex<u32> = KmerIndex::new(6, 4).unwrap();
        idx.find_or_insert(b"GATTAC", 5).unwrap();
        assert_eq!(idx.count_all(), 1);
        let v = idx.find_or_insert(b"GATTAC", 99).unwrap();
        assert_eq!(*v, 5);
        assert_eq!(idx.count_all(), 1);
        assert_eq!(idx.find(b"GATTAC").unwrap(), Some(&5));
    }

    #[test]
    fn find_all_sees_duplicates() {
        let mut idx: KmerIndex<u32> = KmerIndex::new(5, 2).unwrap();
        idx.insert(b"AACCG", 1).unwrap();
        idx.insert(b"AACCG", 2).unwrap();
        idx.insert(b"AACCT", 3).unwrap();
        let all = idx.find_all(b"AACCG").unwrap();
        assert_eq!(all, vec![&1, &2]);
        // find 返回第一个（插入顺序）
        assert_eq!(idx.find(b"AACCG").unwrap(), Some(&1));
    }

    #[test]
    fn rejects_wrong_length_and_ambiguous() {
        let mut idx: KmerIndex<()> = KmerIndex::new(5, 2).unwrap();
        assert!(matches!(idx.insert(b"ACGT", ()), Err(KmerError::LengthMismatch { .. })));
        assert!(matches!(idx.insert(b"ACGNA", ()), Err(KmerError::InvalidBase { .. })));
        assert!(matches!(idx.find(b"ACGTAA"), Err(KmerError::LengthMismatch { .. })));
        assert_eq!(idx.count_all(), 0);
    }

    #[test]
    fn oversized_prefix_is_rejected_before_allocation() {
        assert!(matches!(
            KmerIndex::<()>::new(31, 16),
            Err(KmerError::PrefixTooLong { prefix_len: 16, .. })
        ));
        // 截断到 k-1 之后不超限即可
        assert_eq!(KmerIndex::<()>::new(8, 16).unwrap().codec().prefix_len(), 7);
    }

    #[test]
    fn clear_keeps_configuration() {
        let mut idx: KmerIndex<u8> = KmerIndex::new(8, 10).unwrap();
        idx.insert(b"ACGTACGT", 1).unwrap();
        idx.insert(b"TTGCAACG", 2).unwrap();
        idx.clear();
        assert_eq!(idx.count_all(), 0);
        assert_eq!(idx.find(b"ACGTACGT").unwrap(), None);
        idx.insert(b"ACGTACGT", 7).unwrap();
        assert_eq!(idx.find(b"ACGTACGT").unwrap(), Some(&7));
        assert_eq!(idx.kmer_len(), 8);
    }

    #[test]
    fn dump_visits_every_entry() {
        let mut idx: KmerIndex<u32> = KmerIndex::new(5, 3).unwrap();
        for (i, k) in [&b"TTTTT"[..], b"AAAAA", b"CAGTA"].iter().enumerate() {
            idx.insert(k, i as u32).unwrap();
        }
        let mut seen = Vec::new();
        idx.dump(true, |kmer, &v| {
            if v > 0 {
                seen.push((kmer.to_vec(), v));
            }
        });
        // 桶按前缀数值顺序遍历：AAA < CAG < TTT
        assert_eq!(seen, vec![(b"AAAAA".to_vec(), 1), (b"CAGTA".to_vec(), 2)]);
        assert_eq!(idx.iter().count(), 3);
    }
}
