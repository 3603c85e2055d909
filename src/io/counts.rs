use anyhow::Result;
use std::io::{BufRead, BufReader};

use crate::error::KmerError;
use crate::index::{KmerIndex, KmerInfo};
use crate::search::KmerPair;
use crate::util::dna;

const PROGRESS_EVERY: usize = 10_000_000;

/// 计数文件加载结果
#[derive(Debug)]
pub struct CountTable {
    pub index: KmerIndex<KmerInfo>,
    /// 成功解析的计数行（含因非 ACGT 被跳过的行）
    pub lines: usize,
    /// 含非 ACGT 字符而未入表的行
    pub skipped: usize,
}

/// 打开输入；`-` 表示标准输入
pub fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let fh = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open input '{}': {}", path, e))?;
    Ok(Box::new(BufReader::new(fh)))
}

/// 标准输入只能被一个输入占用
pub fn check_inputs(sequences: &str, counts: &str) -> Result<(), KmerError> {
    if sequences == "-" && counts == "-" {
        return Err(KmerError::BothInputsStdin);
    }
    Ok(())
}

/// 读取 `kmer count` 格式的计数文件（如 `jellyfish dump -c` 的输出）。
///
/// - 第一行的 k-mer 长度确定整个运行的 k
/// - k-mer 转大写后按规范链入表；同一规范 k-mer 出现多次时计数累加，超出 14 bit 时饱和
/// - 含非 ACGT 字符的行跳过
/// - 长度不符或计数无法解析的行结束读取，之前的内容保留
pub fn load_counts<R: BufRead>(mut reader: R, prefix_len: usize) -> Result<CountTable> {
    let mut index: Option<KmerIndex<KmerInfo>> = None;
    let mut lines = 0usize;
    let mut skipped = 0usize;
    let mut buf = String::new();

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        let mut fields = buf.split_whitespace();
        let Some(kmer) = fields.next() else {
            continue;
        };
        let count = match fields.next().map(str::parse::<u64>) {
            Some(Ok(c)) => c,
            _ => {
                log::warn!(
                    "malformed count line {}: {:?}; stop reading counts",
                    lines + 1,
                    buf.trim_end()
                );
                break;
            }
        };

        let kmer = dna::normalize_seq(kmer.as_bytes());
        let idx = match index.as_mut() {
            Some(idx) => idx,
            None => index.insert(KmerIndex::new(kmer.len(), prefix_len)?),
        };
        if kmer.len() != idx.kmer_len() {
            log::warn!(
                "count line {} has kmer length {} (expected {}); stop reading counts",
                lines + 1,
                kmer.len(),
                idx.kmer_len()
            );
            break;
        }

        lines += 1;
        if lines % PROGRESS_EVERY == 0 {
            log::info!("{:4} million counts read", lines / 1_000_000);
        }

        if !dna::is_acgt(&kmer) {
            skipped += 1;
            continue;
        }
        let pair = KmerPair::new(&kmer);
        idx.find_or_insert(pair.canonical(), KmerInfo::default())?.add_count(count);
    }

    let Some(index) = index else {
        anyhow::bail!("kmer count input contains no kmer counts");
    };
    log::info!(
        "total counts read = {} ({} distinct kmers, k={}, {} skipped)",
        lines,
        index.count_all(),
        index.kmer_len(),
        skipped
    );
    Ok(CountTable { index, lines, skipped })
}
