//! Decoders for the handful of ARM/Thumb encodings needed to follow a
//! pointer or call target. Pure functions; `None` means "not this
//! instruction" (including misaligned addresses), never an error.

pub mod arm;
pub mod thumb;

pub use arm::PcRelLoad;

pub(crate) const CONDITION_MNEMONICS: [&str; 16] = [
    "EQ", "NE", "CS", "CC", "MI", "PL", "VS", "VC", "HI", "LS", "GE", "LT", "GT", "LE", "", "??",
];

pub(crate) fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

pub(crate) fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

pub(crate) fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x7FF, 11), -1);
        assert_eq!(sign_extend(0x3FF, 11), 0x3FF);
        assert_eq!(sign_extend(0xFF, 8), -1);
        assert_eq!(sign_extend(0x7F, 8), 0x7F);
        assert_eq!(sign_extend(0xFFFFFA, 24), -6);
    }

    #[test]
    fn test_little_endian_reads() {
        assert_eq!(read_u16_le(&[0x34, 0x12]), 0x1234);
        assert_eq!(read_u32_le(&[0x78, 0x56, 0x34, 0x12]), 0x12345678);
    }
}
