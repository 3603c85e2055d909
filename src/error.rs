use thiserror::Error;

/// k-mer 索引与搜索层的错误类型。
///
/// 配置类错误（后缀过长、k 过小、两个输入同时为 `-`）是致命的；
/// `LengthMismatch` / `InvalidBase` 属于调用约定错误，以类型化错误返回而不是断言。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KmerError {
    #[error("kmer suffix length {suffix_len} is too long; maximum is {max}")]
    SuffixTooLong { suffix_len: usize, max: usize },

    #[error("kmer length {k} is too short; minimum is {min}")]
    KmerTooShort { k: usize, min: usize },

    #[error("prefix length {prefix_len} is too long; maximum is {max}")]
    PrefixTooLong { prefix_len: usize, max: usize },

    #[error("query length {got} does not match kmer length {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("invalid base '{base}' at position {pos}")]
    InvalidBase { base: char, pos: usize },

    #[error("sequence file and kmer count file cannot both be '-'")]
    BothInputsStdin,
}
