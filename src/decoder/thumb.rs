use crate::decoder::{read_u16_le, sign_extend, CONDITION_MNEMONICS};

/// 16-bit Thumb B (unconditional or conditional). Returns the branch target.
pub fn decode_b(address: u32, window: &[u8]) -> Option<u32> {
    if address % 2 != 0 || window.len() < 2 {
        return None;
    }
    let instr = read_u16_le(window);

    if instr & 0xF800 == 0xE000 {
        let offset = sign_extend((instr & 0x7FF) as u32, 11) << 1;
        let target = address.wrapping_add(4).wrapping_add(offset as u32);
        log::debug!(
            "{:08X}: {:02X} {:02X}        B #0x{:08X}",
            address,
            window[0],
            window[1],
            target
        );
        return Some(target);
    }

    if instr & 0xF000 == 0xD000 {
        let offset = sign_extend((instr & 0xFF) as u32, 8) << 1;
        let target = address.wrapping_add(4).wrapping_add(offset as u32);
        let cond = ((instr >> 8) & 0xF) as usize;
        log::debug!(
            "{:08X}: {:02X} {:02X}        B{} #0x{:08X}",
            address,
            window[0],
            window[1],
            CONDITION_MNEMONICS[cond],
            target
        );
        return Some(target);
    }

    None
}

/// 32-bit Thumb BL/BLX pair. Returns the call target; BLX targets are
/// word-aligned per the encoding.
pub fn decode_bl(address: u32, window: &[u8]) -> Option<u32> {
    if address % 2 != 0 || window.len() < 4 {
        return None;
    }
    let hw1 = read_u16_le(&window[0..2]);
    let hw2 = read_u16_le(&window[2..4]);

    if hw1 & 0xF800 != 0xF000 {
        return None;
    }

    let high = sign_extend((hw1 & 0x7FF) as u32, 11) << 12;
    let low = ((hw2 & 0x7FF) as u32) << 1;
    let target = address
        .wrapping_add(4)
        .wrapping_add(high as u32)
        .wrapping_add(low);

    match hw2 & 0xF800 {
        0xE800 => {
            let target = target & 0xFFFF_FFFC;
            log::debug!(
                "{:08X}: {:02X} {:02X} {:02X} {:02X}  BLX #0x{:08X}",
                address,
                window[0],
                window[1],
                window[2],
                window[3],
                target
            );
            Some(target)
        }
        0xF800 => {
            log::debug!(
                "{:08X}: {:02X} {:02X} {:02X} {:02X}  BL #0x{:08X}",
                address,
                window[0],
                window[1],
                window[2],
                window[3],
                target
            );
            Some(target)
        }
        _ => None,
    }
}

/// 16-bit Thumb `LDR Rd, [PC, #imm8<<2]`. Returns the literal pool address.
pub fn decode_ldr(address: u32, window: &[u8]) -> Option<u32> {
    if address % 2 != 0 || window.len() < 2 {
        return None;
    }
    let instr = read_u16_le(window);

    if instr & 0xF800 != 0x4800 {
        return None;
    }

    let imm = ((instr & 0xFF) as u32) << 2;
    let rd = (instr >> 8) & 0x7;
    // PC reads as the instruction address plus 4, word-aligned.
    let target = (address & !3).wrapping_add(4).wrapping_add(imm);
    log::debug!(
        "{:08X}: {:02X} {:02X}        LDR R{}, [PC, #0x{:X}] ; 0x{:08X}",
        address,
        window[0],
        window[1],
        rd,
        imm,
        target
    );
    Some(target)
}

/// Thumb `PUSH {...}` opener, used to tag Thumb function entries.
pub fn is_push(window: &[u8]) -> bool {
    window.len() >= 2 && read_u16_le(window) & 0xFE00 == 0xB400
}
