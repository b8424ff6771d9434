use crate::decoder::{arm, thumb};
use crate::engine::memory::MemoryView;
use crate::engine::result::SearchResult;
use crate::engine::trace::Trace;
use crate::pattern::{PatternExpr, PatternKind};

/// Thunk chains (`LDR PC, [PC, #imm]` hopping through pointer tables) are
/// followed at most this deep before we give up and keep the last address.
const MAX_THUNK_DEPTH: usize = 64;

/// Turn a raw match position into the reported result, honoring the
/// pattern's output mode and offsets. Returns `None` when the decode step
/// fails (pointer outside the view, no branch instruction at the match).
pub(crate) fn decode_result(
    expr: &PatternExpr,
    found: usize,
    memory: &MemoryView,
    trace: Trace,
) -> Option<SearchResult> {
    if let PatternKind::Static(value) = expr.kind {
        return Some(SearchResult {
            address: 0,
            offset: 0,
            value,
        });
    }

    let offset = (found as i64 + expr.input_offset as i64) as usize;
    let address = (memory.base() as i64 + offset as i64) as u32;

    let value = match expr.kind {
        PatternKind::Static(_) => unreachable!(),
        PatternKind::Offset => {
            // Functions starting with PUSH are Thumb entry points; report
            // them with the interworking bit set.
            let thumb_entry = memory
                .window(offset, 2)
                .is_some_and(thumb::is_push);
            if thumb_entry {
                address | 1
            } else {
                address
            }
        }
        PatternKind::Pointer => memory
            .read_u32(offset)?
            .wrapping_add(expr.output_offset as u32),
        PatternKind::Reference => resolve_reference(offset & !1, memory, trace)?
            .wrapping_add(expr.output_offset as u32),
        PatternKind::BranchReference => resolve_branch(offset, memory, trace)?
            .wrapping_add(expr.output_offset as u32),
    };

    Some(SearchResult {
        address,
        offset: offset as u32,
        value,
    })
}

/// Resolve `&(...)`: the match must sit on a PC-relative load; the reported
/// value is the word in its literal pool slot.
fn resolve_reference(offset: usize, memory: &MemoryView, trace: Trace) -> Option<u32> {
    let address = memory.address_of(offset);

    if let Some(window) = memory.window(offset, 4) {
        if let Some(load) = arm::decode_ldr(address, window) {
            return memory.deref(load.target);
        }
    }
    if let Some(window) = memory.window(offset, 2) {
        if let Some(pool) = thumb::decode_ldr(address, window) {
            return memory.deref(pool);
        }
    }

    if trace.enabled() {
        trace.line(format!("FAIL: no PC-relative load at {:08X}", address));
    }
    None
}

/// Resolve `&_BLF(...)`: the match must sit on a branch; the reported value
/// is the branch target.
fn resolve_branch(offset: usize, memory: &MemoryView, trace: Trace) -> Option<u32> {
    let address = memory.address_of(offset);

    if let Some(window) = memory.window(offset, 4) {
        if let Some(target) = thumb::decode_bl(address, window) {
            return Some(target);
        }
    }
    if let Some(window) = memory.window(offset, 2) {
        if let Some(target) = thumb::decode_b(address, window) {
            return Some(target);
        }
    }
    if let Some(window) = memory.window(offset, 4) {
        if let Some(target) = arm::decode_branch(address, window) {
            return Some(target);
        }
    }

    if trace.enabled() {
        trace.line(format!("FAIL: no branch instruction at {:08X}", address));
    }
    None
}

/// Follow `LDR PC, [PC, #imm]` thunks until the chain leaves the view,
/// stops looking like a thunk, or exceeds the depth cap.
pub fn resolve_thunks(addr: u32, memory: &MemoryView, trace: Trace) -> u32 {
    let mut addr = addr;
    for _ in 0..MAX_THUNK_DEPTH {
        let Some(offset) = memory.offset_of(addr & !1) else {
            return addr;
        };
        let Some(window) = memory.window(offset, 4) else {
            return addr;
        };
        let Some(load) = arm::decode_ldr(addr & !1, window) else {
            return addr;
        };
        if !load.writes_pc {
            return addr;
        }
        let Some(next) = memory.deref(load.target) else {
            return addr;
        };
        if !memory.contains(next & !1, 1) {
            return addr;
        }
        if trace.enabled() {
            trace.line(format!("Thunk {:08X} -> {:08X}", addr, next));
        }
        addr = next;
    }
    addr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse;

    fn mem(data: &[u8]) -> MemoryView<'_> {
        MemoryView::new(0xA0000000, data)
    }

    #[test]
    fn test_offset_result_with_input_offset() {
        let data = [0x00, 0xAB, 0xCD, 0x00];
        let expr = parse("AB CD + 1").unwrap();
        let result = decode_result(&expr, 1, &mem(&data), Trace::root()).unwrap();
        assert_eq!(result.address, 0xA0000002);
        assert_eq!(result.offset, 2);
        assert_eq!(result.value, 0xA0000002);
    }

    #[test]
    fn test_offset_result_thumb_push_sets_low_bit() {
        // PUSH {R4-R7, LR} = 0xB5F0
        let data = [0xF0, 0xB5, 0x00, 0x00];
        let expr = parse("F0 B5").unwrap();
        let result = decode_result(&expr, 0, &mem(&data), Trace::root()).unwrap();
        assert_eq!(result.value, 0xA0000001);
    }

    #[test]
    fn test_pointer_result() {
        let data = [0x34, 0x12, 0x00, 0xA0];
        let expr = parse("*(34 12)").unwrap();
        let result = decode_result(&expr, 0, &mem(&data), Trace::root()).unwrap();
        assert_eq!(result.value, 0xA0001234);
    }

    #[test]
    fn test_pointer_result_output_offset() {
        let data = [0x34, 0x12, 0x00, 0xA0];
        let expr = parse("*(34 12) - 4").unwrap();
        let result = decode_result(&expr, 0, &mem(&data), Trace::root()).unwrap();
        assert_eq!(result.value, 0xA0001230);
    }

    #[test]
    fn test_pointer_result_out_of_range() {
        let data = [0x34, 0x12];
        let expr = parse("*(34 12)").unwrap();
        assert!(decode_result(&expr, 0, &mem(&data), Trace::root()).is_none());
    }

    #[test]
    fn test_reference_result_thumb_ldr() {
        // 0xA0000000: LDR R1, [PC, #4] -> pool 0xA0000008 -> 0xCAFEBABE
        let mut data = vec![0u8; 0x10];
        data[0] = 0x01; // 0x4901
        data[1] = 0x49;
        data[0x08..0x0C].copy_from_slice(&[0xBE, 0xBA, 0xFE, 0xCA]);
        let expr = parse("&(01 49)").unwrap();
        let result = decode_result(&expr, 0, &mem(&data), Trace::root()).unwrap();
        assert_eq!(result.value, 0xCAFEBABE);
    }

    #[test]
    fn test_reference_result_arm_ldr() {
        // 0xA0000000: LDR R0, [PC, #0] -> pool 0xA0000008 -> 0x11223344
        let mut data = vec![0u8; 0x10];
        data[0..4].copy_from_slice(&[0x00, 0x00, 0x9F, 0xE5]);
        data[0x08..0x0C].copy_from_slice(&[0x44, 0x33, 0x22, 0x11]);
        let expr = parse("&(?? ?? 9F E5)").unwrap();
        let result = decode_result(&expr, 0, &mem(&data), Trace::root()).unwrap();
        assert_eq!(result.value, 0x11223344);
    }

    #[test]
    fn test_reference_result_not_a_load() {
        let data = [0x00, 0x00, 0x00, 0x00];
        let expr = parse("&(00 00)").unwrap();
        assert!(decode_result(&expr, 0, &mem(&data), Trace::root()).is_none());
    }

    #[test]
    fn test_branch_reference_result() {
        // ARM BL from 0xA0000010 to 0xA0000000.
        let mut data = vec![0u8; 0x20];
        data[0x10..0x14].copy_from_slice(&[0xFA, 0xFF, 0xFF, 0xEB]);
        let expr = parse("&_BLF(FA FF FF EB)").unwrap();
        let result = decode_result(&expr, 0x10, &mem(&data), Trace::root()).unwrap();
        assert_eq!(result.value, 0xA0000000);
    }

    #[test]
    fn test_static_result() {
        let expr = parse("<0xDEAD>").unwrap();
        let result = decode_result(&expr, 0, &mem(&[]), Trace::root()).unwrap();
        assert_eq!(result.address, 0);
        assert_eq!(result.offset, 0);
        assert_eq!(result.value, 0xDEAD);
    }

    #[test]
    fn test_resolve_thunks_chain() {
        // 0xA0000000: LDR PC, [PC, #0] -> pool 0xA0000008 -> 0xA0000010
        // 0xA0000010: LDR PC, [PC, #0] -> pool 0xA0000018 -> 0xA0000004
        let mut data = vec![0u8; 0x20];
        data[0x00..0x04].copy_from_slice(&[0x00, 0xF0, 0x9F, 0xE5]);
        data[0x08..0x0C].copy_from_slice(&[0x10, 0x00, 0x00, 0xA0]);
        data[0x10..0x14].copy_from_slice(&[0x00, 0xF0, 0x9F, 0xE5]);
        data[0x18..0x1C].copy_from_slice(&[0x04, 0x00, 0x00, 0xA0]);

        let out = resolve_thunks(0xA0000000, &mem(&data), Trace::root());
        assert_eq!(out, 0xA0000004);
    }

    #[test]
    fn test_resolve_thunks_non_thunk_is_identity() {
        let data = [0u8; 8];
        assert_eq!(
            resolve_thunks(0xA0000004, &mem(&data), Trace::root()),
            0xA0000004
        );
    }

    #[test]
    fn test_resolve_thunks_self_loop_terminates() {
        // Pool points back at the thunk itself.
        let mut data = vec![0u8; 0x10];
        data[0x00..0x04].copy_from_slice(&[0x00, 0xF0, 0x9F, 0xE5]);
        data[0x08..0x0C].copy_from_slice(&[0x00, 0x00, 0x00, 0xA0]);
        assert_eq!(
            resolve_thunks(0xA0000000, &mem(&data), Trace::root()),
            0xA0000000
        );
    }
}
