//! # kmer-repair
//!
//! 基于 k-mer 计数的 DNA 序列修复。
//!
//! 本 crate 用外部 k-mer 计数器（如 `jellyfish dump -c`）得到的 k-mer 集合作为"真值"，
//! 修复读段或组装序列中的测序错误：
//!
//! - **k-mer 索引**：2 bit/碱基压缩，前缀直接寻址、后缀在桶内线性查找
//! - **规范链查找**：k-mer 与其反向互补映射到同一条目
//! - **路径搜索**：BFS 求两个锚点 k-mer 之间的最短路径，有界 DFS 枚举全部候选路径或端部延伸
//! - **带状编辑距离**：全局、前缀、后缀三种变体，用于给候选路径打分
//! - **修复流程**：逐条扫描序列，对每个未命中缺口选出最佳候选并拼接修正
//!
//! ## 快速示例
//!
//! ```rust
//! use kmer_repair::index::{KmerIndex, KmerInfo};
//! use kmer_repair::repair::{RepairOpt, Repairer};
//! use kmer_repair::search::KmerPair;
//!
//! let truth = b"CATAAGTGCGCTATCCGACTCGCTTGGGAATGGGCCATCAGATGTGTTACCTAACAACCG";
//! let mut index = KmerIndex::new(11, 10).unwrap();
//! for w in truth.windows(11) {
//!     let pair = KmerPair::new(w);
//!     index.find_or_insert(pair.canonical(), KmerInfo::with_count(1)).unwrap();
//! }
//!
//! let mut read = truth.to_vec();
//! read[30] = b'A';
//! let mut repairer = Repairer::new(&mut index, RepairOpt::default());
//! let fixed = repairer.repair(&read).unwrap();
//! assert_eq!(fixed.seq, truth.to_vec());
//! ```
//!
//! ## 模块说明
//!
//! - [`index`] — k-mer 编码与前缀分桶索引
//! - [`search`] — 规范链查找、BFS 可达性、DFS 路径枚举
//! - [`align`] — 带状编辑距离
//! - [`repair`] — 修复流程与运行统计
//! - [`io`] — FASTA 读写、计数文件加载
//! - [`util`] — 碱基编码、互补、反向互补

pub mod align;
pub mod error;
pub mod index;
pub mod io;
pub mod repair;
pub mod search;
pub mod util;

pub use error::KmerError;
