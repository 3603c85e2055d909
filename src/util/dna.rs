/// 正链碱基顺序，下标即 2-bit 编码（A=0, C=1, G=2, T=3）
pub const ACGT: [u8; 4] = *b"ACGT";

const NO_CODE: u8 = 0xFF;

/// ASCII -> 2-bit 编码查找表；非 ACGT（含 N）为 0xFF
static BASE_CODE: [u8; 256] = {
    let mut t = [NO_CODE; 256];
    t[b'A' as usize] = 0;
    t[b'a' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'c' as usize] = 1;
    t[b'G' as usize] = 2;
    t[b'g' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b't' as usize] = 3;
    t
};

#[inline]
pub fn to_code(b: u8) -> Option<u8> {
    let c = BASE_CODE[b as usize];
    if c == NO_CODE { None } else { Some(c) }
}

#[inline]
pub fn from_code(c: u8, uppercase: bool) -> u8 {
    let b = ACGT[(c & 3) as usize];
    if uppercase { b } else { b.to_ascii_lowercase() }
}

#[inline]
pub fn is_acgt(seq: &[u8]) -> bool {
    seq.iter().all(|&b| to_code(b).is_some())
}

/// 仅做大写化，保留 N 等非 ACGT 字符（它们在查找时自然不会命中）
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(u8::to_ascii_uppercase).collect()
}

/// Watson-Crick 互补，IUPAC 兼并碱基按互补规则映射，大小写保持不变
#[inline]
pub fn complement(base: u8) -> u8 {
    let c = match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' => b'S',
        b'W' => b'W',
        _ => b'N',
    };
    if base.is_ascii_lowercase() { c.to_ascii_lowercase() } else { c }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_table_rejects_ambiguous() {
        assert_eq!(to_code(b'A'), Some(0));
        assert_eq!(to_code(b'c'), Some(1));
        assert_eq!(to_code(b'G'), Some(2));
        assert_eq!(to_code(b't'), Some(3));
        assert_eq!(to_code(b'N'), None);
        assert_eq!(to_code(b'n'), None);
        assert_eq!(to_code(b'-'), None);
        assert_eq!(from_code(2, true), b'G');
        assert_eq!(from_code(2, false), b'g');
    }

    #[test]
    fn revcomp_basic() {
        assert_eq!(revcomp(b"AACGTN"), b"NACGTT");
        assert_eq!(revcomp(b"acgR"), b"Ycgt");
        assert_eq!(revcomp(b"GATTACA"), b"TGTAATC");
    }

    #[test]
    fn normalize_keeps_n() {
        assert_eq!(normalize_seq(b"acgtNnx"), b"ACGTNNX");
        assert!(is_acgt(b"ACGTacgt"));
        assert!(!is_acgt(b"ACGN"));
    }
}
