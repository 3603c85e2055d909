/// 频数字段位宽
pub const FREQ_BITS: u32 = 14;
/// 频数饱和上限（2^14 - 1）
pub const MAX_FREQ: u16 = (1 << FREQ_BITS) - 1;

const FWD_USED: u16 = 1 << FREQ_BITS;
const REV_USED: u16 = 1 << (FREQ_BITS + 1);

/// k-mer 被读取时所在的链方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// 每个 k-mer 的附带信息：14 bit 饱和频数 + 正/反链使用标记，打包在一个 u16 里。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KmerInfo {
    bits: u16,
}

impl KmerInfo {
    /// 超出上限的计数饱和到 `MAX_FREQ`
    pub fn with_count(count: u64) -> Self {
        Self { bits: count.min(MAX_FREQ as u64) as u16 }
    }

    #[inline]
    pub fn freq(&self) -> u16 {
        self.bits & MAX_FREQ
    }

    pub fn incr(&mut self) {
        if self.freq() < MAX_FREQ {
            self.bits += 1;
        }
    }

    /// 累加计数（同一 k-mer 的两条链分别出现在计数文件中时合并），同样饱和
    pub fn add_count(&mut self, count: u64) {
        let freq = (self.freq() as u64).saturating_add(count).min(MAX_FREQ as u64) as u16;
        self.bits = (self.bits & !MAX_FREQ) | freq;
    }

    pub fn mark_used(&mut self, strand: Strand) {
        self.bits |= match strand {
            Strand::Forward => FWD_USED,
            Strand::Reverse => REV_USED,
        };
    }

    pub fn is_used(&self, strand: Strand) -> bool {
        let flag = match strand {
            Strand::Forward => FWD_USED,
            Strand::Reverse => REV_USED,
        };
        self.bits & flag != 0
    }

    pub fn is_used_any(&self) -> bool {
        self.bits & (FWD_USED | REV_USED) != 0
    }
}
