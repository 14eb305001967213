pub const SIGMA: usize = 20; // A C D E F G H I K L M N P Q R S T V W Y

/// 20 种标准氨基酸，按单字母代码字母序排列；列索引即数组下标
pub const AMINO_ACIDS: [u8; SIGMA] = [
    b'A', b'C', b'D', b'E', b'F', b'G', b'H', b'I', b'K', b'L', b'M', b'N', b'P', b'Q', b'R', b'S',
    b'T', b'V', b'W', b'Y',
];

/// 标准氨基酸 -> 列索引。区分大小写，非标准符号（B/Z/J/X/U/O/*、小写）返回 None。
#[inline]
pub fn to_index(b: u8) -> Option<usize> {
    match b {
        b'A' => Some(0),
        b'C' => Some(1),
        b'D' => Some(2),
        b'E' => Some(3),
        b'F' => Some(4),
        b'G' => Some(5),
        b'H' => Some(6),
        b'I' => Some(7),
        b'K' => Some(8),
        b'L' => Some(9),
        b'M' => Some(10),
        b'N' => Some(11),
        b'P' => Some(12),
        b'Q' => Some(13),
        b'R' => Some(14),
        b'S' => Some(15),
        b'T' => Some(16),
        b'V' => Some(17),
        b'W' => Some(18),
        b'Y' => Some(19),
        _ => None,
    }
}

/// I/L 质量相同，比较肽段前统一替换为 L
pub fn normalize_il(seq: &str) -> String {
    seq.replace('I', "L")
}
