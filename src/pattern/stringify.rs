use crate::pattern::expr::{PatternExpr, PatternKind, SubPatternKind};

/// Render a pattern tree back to canonical text. Inverse of the parser for
/// the literal/mask/sub-pattern grammar; offsets round-trip semantically but
/// not necessarily with the source formatting.
pub fn stringify(expr: &PatternExpr) -> String {
    if let PatternKind::Static(value) = expr.kind {
        return format!("<0x{:08X}>", value);
    }

    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < expr.bytes.len() {
        if let Some(sub) = expr.sub_patterns.get(&i) {
            let child = stringify(&sub.pattern);
            parts.push(match sub.kind {
                SubPatternKind::ShortBranch => format!("[ {} ]", child),
                SubPatternKind::LongBranch => format!("{{ {} }}", child),
                SubPatternKind::ShortLoad => format!("LDR[ {} ]", child),
                SubPatternKind::LongLoad => format!("LDR{{ {} }}", child),
                SubPatternKind::AsciiString => {
                    format!("%{}%", String::from_utf8_lossy(&sub.pattern.bytes))
                }
            });
            i += sub.size;
            continue;
        }

        let mask = expr.masks[i];
        let byte = expr.bytes[i];
        parts.push(match mask {
            0x00 => "??".to_string(),
            0x0F => format!("?{:X}", byte & 0x0F),
            0xF0 => format!("{:X}?", (byte & 0xF0) >> 4),
            0xFF => format!("{:02X}", byte),
            _ => bin_mask(byte, mask),
        });
        i += 1;
    }

    if expr.input_offset != 0 {
        parts.push(format!(
            "{} {:X}",
            if expr.input_offset < 0 { '-' } else { '+' },
            expr.input_offset.unsigned_abs()
        ));
    }

    let body = parts.join(" ");
    let mut out = match expr.kind {
        PatternKind::Reference => format!("&({})", body),
        PatternKind::Pointer => format!("*({})", body),
        PatternKind::BranchReference => format!("&_BLF({})", body),
        PatternKind::Offset | PatternKind::Static(_) => body,
    };

    if expr.output_offset != 0 {
        out.push_str(&format!(
            " {} {:X}",
            if expr.output_offset < 0 { '-' } else { '+' },
            expr.output_offset.unsigned_abs()
        ));
    }

    out
}

fn bin_mask(byte: u8, mask: u8) -> String {
    let mut out = String::with_capacity(10);
    out.push('[');
    for i in 0..8 {
        let bit = 1 << (7 - i);
        if mask & bit == 0 {
            out.push('.');
        } else if byte & bit != 0 {
            out.push('1');
        } else {
            out.push('0');
        }
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse;

    fn roundtrip(text: &str) {
        let first = parse(text).unwrap();
        let rendered = stringify(&first);
        let second = parse(&rendered).unwrap_or_else(|e| {
            panic!("re-parse of {:?} (from {:?}) failed: {}", rendered, text, e)
        });
        assert_eq!(first, second, "round-trip mismatch for {:?} -> {:?}", text, rendered);
    }

    #[test]
    fn test_byte_forms() {
        assert_eq!(stringify(&parse("AB??").unwrap()), "AB ??");
        assert_eq!(stringify(&parse("?5 a?").unwrap()), "?5 A?");
        assert_eq!(stringify(&parse("[01..01.1]").unwrap()), "[01..01.1]");
    }

    #[test]
    fn test_wrappers_and_offsets() {
        assert_eq!(stringify(&parse("*( AB CD ) + 4").unwrap()), "*(AB CD) + 4");
        assert_eq!(stringify(&parse("&(AB CD - 2) - 4").unwrap()), "&(AB CD - 2) - 4");
        assert_eq!(stringify(&parse("&_BLF(AA)").unwrap()), "&_BLF(AA)");
        assert_eq!(stringify(&parse("<0x1234>").unwrap()), "<0x00001234>");
    }

    #[test]
    fn test_sub_pattern_forms() {
        assert_eq!(stringify(&parse("AA[BB]CC").unwrap()), "AA [ BB ] CC");
        assert_eq!(stringify(&parse("_blf(AA)").unwrap()), "{ AA }");
        assert_eq!(stringify(&parse("LDR[AA]").unwrap()), "LDR[ AA ]");
        assert_eq!(stringify(&parse("LDR{AA}").unwrap()), "LDR{ AA }");
        assert_eq!(stringify(&parse("%abc%").unwrap()), "%abc%");
    }

    #[test]
    fn test_placeholder_bytes_after_sub_pattern_are_not_dropped() {
        // The byte after a 4-byte placeholder must still render.
        assert_eq!(stringify(&parse("{ AA } BB").unwrap()), "{ AA } BB");
        assert_eq!(stringify(&parse("[ AA ] BB").unwrap()), "[ AA ] BB");
    }

    #[test]
    fn test_structural_roundtrip() {
        for text in [
            "",
            "AB ?? C? ?D",
            "[.1010101] FF",
            "AB CD + 1A",
            "AB CD - 0x20",
            "(AB CD) + 2",
            "*(AB ?? CD) + 4",
            "&( AB [ 01 02 ] ?? ) - 8",
            "&_BLF(AA BB CC DD) + 2",
            "00 { 11 [ 22 ] } 33",
            "LDR[ AA BB ] LDR{ CC }",
            "A0 %version% 00",
            "{ AB CD + 2 } EF",
            "<0xDEADBEEF>",
        ] {
            roundtrip(text);
        }
    }
}
