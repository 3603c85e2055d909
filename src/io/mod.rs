pub mod counts;
pub mod fasta;

pub use counts::{check_inputs, load_counts, open_input, CountTable};
pub use fasta::{write_record, FastaReader, FastaRecord, LINE_WIDTH};
