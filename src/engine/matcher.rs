use crate::decoder::{arm, thumb};
use crate::engine::decode::resolve_thunks;
use crate::engine::memory::MemoryView;
use crate::engine::trace::Trace;
use crate::pattern::{stringify, PatternExpr, PatternKind, SubPattern, SubPatternKind};

/// Byte-wise fuzzy comparison: a mask of 0x00 always matches, 0xFF compares
/// the whole byte, anything else compares only the masked bits.
pub fn fuzzy_match(bytes: &[u8], masks: &[u8], window: &[u8]) -> bool {
    if window.len() < bytes.len() {
        return false;
    }
    bytes
        .iter()
        .zip(masks.iter())
        .zip(window.iter())
        .all(|((&byte, &mask), &value)| match mask {
            0x00 => true,
            0xFF => byte == value,
            _ => byte & mask == value & mask,
        })
}

/// True iff the pattern's literal bytes match at `offset` and every
/// sub-pattern verifies recursively. Static-value patterns always succeed;
/// an empty byte pattern never does.
pub fn check(expr: &PatternExpr, offset: usize, memory: &MemoryView, trace: Trace) -> bool {
    if let PatternKind::Static(_) = expr.kind {
        return true;
    }

    let trace = trace.nested();
    if trace.enabled() {
        trace.line(format!(
            "Checking pattern '{}' at {:08X}",
            stringify(expr),
            memory.address_of(offset)
        ));
    }

    if expr.is_empty() {
        trace.line("FAIL: empty pattern");
        return false;
    }

    let Some(window) = memory.window(offset, expr.len()) else {
        trace.line("FAIL: address is out of range");
        return false;
    };

    if !fuzzy_match(&expr.bytes, &expr.masks, window) {
        trace.line("FAIL: bytes not matched");
        return false;
    }

    if !check_sub_patterns(expr, offset, memory, trace) {
        trace.line("FAIL: sub patterns not matched");
        return false;
    }

    trace.line("Pattern matched");
    true
}

/// Every sub-pattern anchored inside the matched region must verify.
pub(crate) fn check_sub_patterns(
    expr: &PatternExpr,
    offset: usize,
    memory: &MemoryView,
    trace: Trace,
) -> bool {
    if expr.sub_patterns.is_empty() {
        return true;
    }
    let trace = trace.nested();
    expr.sub_patterns
        .values()
        .all(|sub| verify_sub_pattern(sub, offset, memory, trace))
}

fn verify_sub_pattern(
    sub: &SubPattern,
    base_offset: usize,
    memory: &MemoryView,
    trace: Trace,
) -> bool {
    let at = base_offset + sub.offset;
    let address = memory.address_of(at);
    let Some(window) = memory.window(at, sub.size) else {
        trace.line("FAIL: sub pattern is out of range");
        return false;
    };

    match sub.kind {
        SubPatternKind::ShortBranch => {
            if trace.enabled() {
                trace.line(format!("Decoding THUMB B at {:08X}", address));
            }
            match thumb::decode_b(address, window) {
                Some(target) => check_child(sub, target, memory, trace),
                None => {
                    trace.line("FAIL: not an instruction");
                    false
                }
            }
        }

        SubPatternKind::LongBranch => {
            if trace.enabled() {
                trace.line(format!("Decoding THUMB BL/BLX at {:08X}", address));
            }
            if let Some(target) = thumb::decode_bl(address, window) {
                if check_child(sub, target, memory, trace) {
                    return true;
                }
            }

            if trace.enabled() {
                trace.line(format!("Decoding ARM B/BL/BLX at {:08X}", address));
            }
            if let Some(target) = arm::decode_branch(address, window) {
                if check_child(sub, target, memory, trace) {
                    return true;
                }
            }

            // A tail-call through `LDR PC, [PC, #imm]` also counts as a long
            // branch; follow the loaded pointer through any thunk chain.
            if let Some(load) = arm::decode_ldr(address, window) {
                if load.writes_pc {
                    if let Some(pointer) = memory.deref(load.target) {
                        let target = resolve_thunks(pointer, memory, trace);
                        if check_child(sub, target, memory, trace) {
                            return true;
                        }
                    }
                }
            }

            false
        }

        SubPatternKind::ShortLoad => {
            if trace.enabled() {
                trace.line(format!("Decoding THUMB LDR at {:08X}", address));
            }
            let Some(pool) = thumb::decode_ldr(address, window) else {
                trace.line("FAIL: not an instruction");
                return false;
            };
            match memory.deref(pool) {
                Some(value) => check_child(sub, value, memory, trace),
                None => {
                    trace.line("FAIL: literal pool is out of range");
                    false
                }
            }
        }

        SubPatternKind::LongLoad => {
            if trace.enabled() {
                trace.line(format!("Decoding ARM LDR at {:08X}", address));
            }
            let Some(load) = arm::decode_ldr(address, window) else {
                trace.line("FAIL: not an instruction");
                return false;
            };
            match memory.deref(load.target) {
                Some(value) => check_child(sub, value, memory, trace),
                None => {
                    trace.line("FAIL: literal pool is out of range");
                    false
                }
            }
        }

        SubPatternKind::AsciiString => {
            // The placeholder bytes themselves hold a pointer to the literal.
            let pointer = u32::from_le_bytes([window[0], window[1], window[2], window[3]]);
            check_child(sub, pointer, memory, trace)
        }
    }
}

/// Verify the child tree at the decoded target. The child's input offset
/// shifts the anchor back, mirroring how it shifts a reported match forward.
fn check_child(sub: &SubPattern, target: u32, memory: &MemoryView, trace: Trace) -> bool {
    if !memory.contains(target, 1) {
        if trace.enabled() {
            trace.line(format!("FAIL: target {:08X} is out of range", target));
        }
        return false;
    }
    let anchor = target.wrapping_sub(sub.pattern.input_offset as u32);
    let Some(offset) = memory.offset_of(anchor) else {
        if trace.enabled() {
            trace.line(format!("FAIL: anchor {:08X} is out of range", anchor));
        }
        return false;
    };
    check(&sub.pattern, offset, memory, trace)
}
