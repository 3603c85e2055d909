use crate::error::KmerError;
use crate::util::dna;

/// 默认直接寻址的前缀长度（碱基数）
pub const DEFAULT_PREFIX_LEN: usize = 10;
/// 允许的最短 k-mer
pub const MIN_KMER_LEN: usize = 5;
/// 后缀以 2 bit/碱基存放在 u128 中
pub const MAX_SUFFIX_LEN: usize = 4 * std::mem::size_of::<u128>();
/// 前缀决定桶数 4^p，且桶表在构造时一次性分配；12 对应约 1600 万个桶
pub const MAX_PREFIX_LEN: usize = 12;

/// 2-bit 压缩的 k-mer：前 p 个碱基在 `prefix`，其余 k-p 个在 `suffix`。
/// 两部分都是高位在前（第一个碱基位于最高的 2 bit）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct PackedKmer {
    pub prefix: u32,
    pub suffix: u128,
}

/// 固定 k / p 的编码器，保存首尾碱基掩码以便 O(1) 滑动。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerCodec {
    k: usize,
    prefix_len: usize,
    suffix_len: usize,
    prefix_first_mask: u32,
    suffix_first_mask: u128,
}

impl KmerCodec {
    /// `prefix_len` 会被截断到 `[1, k-1]`，保证后缀至少一个碱基。
    pub fn new(k: usize, prefix_len: usize) -> Result<Self, KmerError> {
        if k < MIN_KMER_LEN {
            return Err(KmerError::KmerTooShort { k, min: MIN_KMER_LEN });
        }
        let p = prefix_len.clamp(1, k - 1);
        if p > MAX_PREFIX_LEN {
            return Err(KmerError::PrefixTooLong { prefix_len: p, max: MAX_PREFIX_LEN });
        }
        let s = k - p;
        if s > MAX_SUFFIX_LEN {
            return Err(KmerError::SuffixTooLong { suffix_len: s, max: MAX_SUFFIX_LEN });
        }
        Ok(Self {
            k,
            prefix_len: p,
            suffix_len: s,
            prefix_first_mask: 3u32 << (2 * (p - 1)),
            suffix_first_mask: 3u128 << (2 * (s - 1)),
        })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    #[inline]
    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// 前缀桶数量 4^p
    #[inline]
    pub fn num_buckets(&self) -> usize {
        1usize << (2 * self.prefix_len)
    }

    #[inline]
    fn code(ch: u8, pos: usize) -> Result<u8, KmerError> {
        dna::to_code(ch).ok_or(KmerError::InvalidBase { base: ch as char, pos })
    }

    pub fn encode(&self, kmer: &[u8]) -> Result<PackedKmer, KmerError> {
        if kmer.len() != self.k {
            return Err(KmerError::LengthMismatch { expected: self.k, got: kmer.len() });
        }
        let mut bin = PackedKmer::default();
        for (i, &ch) in kmer[..self.prefix_len].iter().enumerate() {
            bin.prefix = (bin.prefix << 2) | Self::code(ch, i)? as u32;
        }
        for (i, &ch) in kmer[self.prefix_len..].iter().enumerate() {
            bin.suffix = (bin.suffix << 2) | Self::code(ch, self.prefix_len + i)? as u128;
        }
        Ok(bin)
    }

    pub fn decode(&self, bin: PackedKmer, uppercase: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.k);
        self.decode_into(bin, uppercase, &mut out);
        out
    }

    /// 解码到复用的缓冲区（先清空）
    pub fn decode_into(&self, bin: PackedKmer, uppercase: bool, out: &mut Vec<u8>) {
        out.clear();
        for i in (0..self.prefix_len).rev() {
            out.push(dna::from_code(((bin.prefix >> (2 * i)) & 3) as u8, uppercase));
        }
        for i in (0..self.suffix_len).rev() {
            out.push(dna::from_code(((bin.suffix >> (2 * i)) & 3) as u8, uppercase));
        }
    }

    /// 丢弃最左碱基，其余左移一位，`ch` 追加到最右端（窗口右移一步）
    pub fn shift_left(&self, bin: PackedKmer, ch: u8) -> Result<PackedKmer, KmerError> {
        let c = Self::code(ch, self.k - 1)?;
        let carry = ((bin.suffix & self.suffix_first_mask) >> (2 * (self.suffix_len - 1))) as u32;
        let prefix = ((bin.prefix & !self.prefix_first_mask) << 2) | carry;
        let suffix = ((bin.suffix & !self.suffix_first_mask) << 2) | c as u128;
        Ok(PackedKmer { prefix, suffix })
    }

    /// 丢弃最右碱基，其余右移一位，`ch` 放到最左端（窗口左移一步）
    pub fn shift_right(&self, bin: PackedKmer, ch: u8) -> Result<PackedKmer, KmerError> {
        let c = Self::code(ch, 0)?;
        let carry = (bin.prefix & 3) as u128;
        let suffix = (bin.suffix >> 2) | (carry << (2 * (self.suffix_len - 1)));
        let prefix = (bin.prefix >> 2) | ((c as u32) << (2 * (self.prefix_len - 1)));
        Ok(PackedKmer { prefix, suffix })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_kmer(len: usize, seed: u32) -> Vec<u8> {
        let mut x = seed;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                dna::ACGT[((x >> 16) & 3) as usize]
            })
            .collect()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let codec = KmerCodec::new(31, DEFAULT_PREFIX_LEN).unwrap();
        for seed in 0..50 {
            let kmer = make_kmer(31, seed);
            let bin = codec.encode(&kmer).unwrap();
            assert_eq!(codec.decode(bin, true), kmer);
        }
        let bin = codec.encode(b"acgtacgtacgtacgtacgtacgtacgtacg").unwrap();
        assert_eq!(codec.decode(bin, false), b"acgtacgtacgtacgtacgtacgtacgtacg");
        assert_eq!(codec.decode(bin, true), b"ACGTACGTACGTACGTACGTACGTACGTACG");
    }

    #[test]
    fn encode_rejects_bad_input() {
        let codec = KmerCodec::new(7, 3).unwrap();
        assert_eq!(
            codec.encode(b"ACGTA"),
            Err(KmerError::LengthMismatch { expected: 7, got: 5 })
        );
        assert_eq!(
            codec.encode(b"ACGTNAC"),
            Err(KmerError::InvalidBase { base: 'N', pos: 4 })
        );
    }

    #[test]
    fn construction_limits() {
        assert!(matches!(KmerCodec::new(4, 2), Err(KmerError::KmerTooShort { .. })));
        // 10 + 64 正好放得下
        assert!(KmerCodec::new(74, 10).is_ok());
        assert!(KmerCodec::new(31, MAX_PREFIX_LEN).is_ok());
        assert_eq!(
            KmerCodec::new(31, 13),
            Err(KmerError::PrefixTooLong { prefix_len: 13, max: MAX_PREFIX_LEN })
        );
        assert_eq!(
            KmerCodec::new(75, 10),
            Err(KmerError::SuffixTooLong { suffix_len: 65, max: 64 })
        );
        let small = KmerCodec::new(5, DEFAULT_PREFIX_LEN).unwrap();
        assert_eq!(small.prefix_len(), 4);
        assert_eq!(small.suffix_len(), 1);
        assert_eq!(small.num_buckets(), 256);
    }

    #[test]
    fn shifts_match_reencoding() {
        let codec = KmerCodec::new(21, 10).unwrap();
        let seq = make_kmer(60, 7);
        let mut bin = codec.encode(&seq[..21]).unwrap();
        for i in 1..=(seq.len() - 21) {
            bin = codec.shift_left(bin, seq[i + 20]).unwrap();
            assert_eq!(bin, codec.encode(&seq[i..i + 21]).unwrap());
        }
        for i in (0..(seq.len() - 21)).rev() {
            bin = codec.shift_right(bin, seq[i]).unwrap();
            assert_eq!(bin, codec.encode(&seq[i..i + 21]).unwrap());
        }
        assert!(codec.shift_left(bin, b'N').is_err());
    }
}
