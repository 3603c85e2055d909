pub mod codec;
pub mod info;
pub mod kmer_hash;

pub use codec::{KmerCodec, PackedKmer, DEFAULT_PREFIX_LEN, MIN_KMER_LEN};
pub use info::{KmerInfo, Strand};
pub use kmer_hash::KmerIndex;
