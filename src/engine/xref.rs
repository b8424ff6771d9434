use crate::decoder::{arm, thumb};
use crate::engine::memory::MemoryView;
use crate::engine::result::{XRefKind, XRefResult};

/// Scan the view for instructions referring to `address`: PC-relative loads
/// whose pool slot holds it (pointer) or is it (reference), and branches or
/// calls targeting it. `max_results` of zero means unbounded.
pub fn find_xrefs(address: u32, memory: &MemoryView, max_results: usize) -> Vec<XRefResult> {
    let mut results = Vec::new();
    let align = memory.align();
    let data = memory.data();

    let mut i = 0;
    while i < data.len() {
        let at = memory.address_of(i);
        if let Some(kind) = classify(address, at, memory, i) {
            results.push(XRefResult {
                kind,
                address: at,
                offset: i as u32,
            });
            if max_results != 0 && results.len() >= max_results {
                break;
            }
        }
        i += align;
    }

    results
}

fn classify(address: u32, at: u32, memory: &MemoryView, offset: usize) -> Option<XRefKind> {
    let pool = memory
        .window(offset, 4)
        .and_then(|w| arm::decode_ldr(at, w))
        .map(|load| load.target)
        .or_else(|| {
            memory
                .window(offset, 2)
                .and_then(|w| thumb::decode_ldr(at, w))
        });

    if let Some(pool) = pool {
        if memory.deref(pool) == Some(address) {
            return Some(XRefKind::Pointer);
        }
        if pool == address {
            return Some(XRefKind::Reference);
        }
    }

    let branch = memory
        .window(offset, 4)
        .and_then(|w| thumb::decode_bl(at, w))
        .or_else(|| memory.window(offset, 4).and_then(|w| arm::decode_branch(at, w)))
        .or_else(|| memory.window(offset, 2).and_then(|w| thumb::decode_b(at, w)));

    if branch == Some(address) {
        return Some(XRefKind::BranchCall);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_call_xref() {
        // 0xA0000000: Thumb BL forward to 0xA0000100.
        // offset = 0x100 - 4 = 0xFC -> hw1 = F000, hw2 = F87E
        let mut data = vec![0u8; 0x110];
        data[0..4].copy_from_slice(&[0x00, 0xF0, 0x7E, 0xF8]);
        let mem = MemoryView::new(0xA0000000, &data).with_align(2);
        let results = find_xrefs(0xA0000100, &mem, 0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, XRefKind::BranchCall);
        assert_eq!(results[0].offset, 0);
        assert_eq!(results[0].address, 0xA0000000);
    }

    #[test]
    fn test_pointer_and_reference_xrefs() {
        // 0xA0000004: LDR R0, [PC, #4] -> pool 0xA000000C -> 0xA0000100
        let mut data = vec![0u8; 0x110];
        data[0x04] = 0x01; // 0x4801
        data[0x05] = 0x48;
        data[0x0C..0x10].copy_from_slice(&[0x00, 0x01, 0x00, 0xA0]);
        let mem = MemoryView::new(0xA0000000, &data).with_align(2);

        // The load points at 0xA0000100 through its pool slot.
        let pointers = find_xrefs(0xA0000100, &mem, 0);
        assert_eq!(pointers.len(), 1);
        assert_eq!(pointers[0].kind, XRefKind::Pointer);
        assert_eq!(pointers[0].offset, 0x04);
        assert_eq!(pointers[0].address, 0xA0000004);

        // The same load references the pool slot address itself.
        let references = find_xrefs(0xA000000C, &mem, 0);
        assert!(references
            .iter()
            .any(|r| r.kind == XRefKind::Reference && r.offset == 0x04));
    }

    #[test]
    fn test_max_results_caps_scan() {
        // Two identical ARM branches to the same target.
        // BL from 0x00 to 0x20: offset24 = (0x20 - 0x8) >> 2 = 6
        // BL from 0x08 to 0x20: offset24 = (0x20 - 0x10) >> 2 = 4
        let mut data = vec![0u8; 0x30];
        data[0x00..0x04].copy_from_slice(&[0x06, 0x00, 0x00, 0xEB]);
        data[0x08..0x0C].copy_from_slice(&[0x04, 0x00, 0x00, 0xEB]);
        let mem = MemoryView::new(0xA0000000, &data).with_align(4);
        assert_eq!(find_xrefs(0xA0000020, &mem, 0).len(), 2);
        assert_eq!(find_xrefs(0xA0000020, &mem, 1).len(), 1);
    }

    #[test]
    fn test_each_hit_reports_its_own_instruction_address() {
        // Same two ARM BLs to one target; the hits must carry the address
        // of each call site, not the searched address.
        let mut data = vec![0u8; 0x30];
        data[0x00..0x04].copy_from_slice(&[0x06, 0x00, 0x00, 0xEB]);
        data[0x08..0x0C].copy_from_slice(&[0x04, 0x00, 0x00, 0xEB]);
        let mem = MemoryView::new(0xA0000000, &data).with_align(4);
        let results = find_xrefs(0xA0000020, &mem, 0);
        assert_eq!(
            results.iter().map(|r| r.address).collect::<Vec<_>>(),
            vec![0xA0000000, 0xA0000008]
        );
        assert_eq!(
            results.iter().map(|r| r.offset).collect::<Vec<_>>(),
            vec![0x00, 0x08]
        );
    }
}
