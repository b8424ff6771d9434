use crate::decoder::{read_u32_le, sign_extend, CONDITION_MNEMONICS};

/// Decoded ARM PC-relative load. `writes_pc` marks `LDR PC, [PC, #imm]`,
/// the single-instruction trampoline used as a thunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcRelLoad {
    pub target: u32,
    pub writes_pc: bool,
}

/// 32-bit ARM B/BL/BLX immediate. Returns the branch target.
pub fn decode_branch(address: u32, window: &[u8]) -> Option<u32> {
    if address % 4 != 0 || window.len() < 4 {
        return None;
    }
    let instr = read_u32_le(window);

    // BLX has no condition field; its top byte is FA/FB with the extra
    // halfword bit folded in from bit 24.
    if instr & 0xFE00_0000 == 0xFA00_0000 {
        let offset = sign_extend(instr & 0xFF_FFFF, 24) << 2;
        let h = (instr >> 24) & 1;
        let target = address
            .wrapping_add(8)
            .wrapping_add(offset as u32)
            .wrapping_add(h << 1);
        log::debug!(
            "{:08X}: {:02X} {:02X} {:02X} {:02X}  BLX #0x{:08X}",
            address,
            window[0],
            window[1],
            window[2],
            window[3],
            target
        );
        return Some(target);
    }

    let op = instr & 0x0F00_0000;
    if op == 0x0A00_0000 || op == 0x0B00_0000 {
        let offset = sign_extend(instr & 0xFF_FFFF, 24) << 2;
        let target = address.wrapping_add(8).wrapping_add(offset as u32);
        let cond = (instr >> 28) as usize;
        let link = if op == 0x0B00_0000 { "L" } else { "" };
        log::debug!(
            "{:08X}: {:02X} {:02X} {:02X} {:02X}  B{}{} #0x{:08X}",
            address,
            window[0],
            window[1],
            window[2],
            window[3],
            link,
            CONDITION_MNEMONICS[cond],
            target
        );
        return Some(target);
    }

    None
}

/// 32-bit ARM `LDR Rd, [PC, #+/-imm12]`. Returns the literal pool address
/// and whether the destination register is PC.
pub fn decode_ldr(address: u32, window: &[u8]) -> Option<PcRelLoad> {
    if address % 4 != 0 || window.len() < 4 {
        return None;
    }
    let instr = read_u32_le(window);

    if instr & 0x0E0F_0000 != 0x040F_0000 {
        return None;
    }

    let up = instr & (1 << 23) != 0;
    let imm = instr & 0xFFF;
    let target = if up {
        address.wrapping_add(8).wrapping_add(imm)
    } else {
        address.wrapping_add(8).wrapping_sub(imm)
    };
    let rd = (instr >> 12) & 0xF;
    let cond = (instr >> 28) as usize;
    log::debug!(
        "{:08X}: {:02X} {:02X} {:02X} {:02X}  LDR{} R{}, [PC, #{}0x{:X}] ; 0x{:08X}",
        address,
        window[0],
        window[1],
        window[2],
        window[3],
        CONDITION_MNEMONICS[cond],
        rd,
        if up { '+' } else { '-' },
        imm,
        target
    );

    Some(PcRelLoad {
        target,
        writes_pc: rd == 15,
    })
}
