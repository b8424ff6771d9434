use std::collections::BTreeMap;

/// Output mode of a pattern: what value a match is decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `AB ?? CD` - report the match address itself.
    Offset,
    /// `*( ... )` - dereference a 4-byte pointer at the match.
    Pointer,
    /// `&( ... )` - decode a PC-relative LDR at the match and report the loaded word.
    Reference,
    /// `&_BLF( ... )` - decode a branch/call at the match and report its target.
    BranchReference,
    /// `< 0xHEX >` - no byte matching, always yields the stored constant.
    Static(u32),
}

impl PatternKind {
    pub fn tag(self) -> &'static str {
        match self {
            PatternKind::Offset => "offset",
            PatternKind::Pointer => "pointer",
            PatternKind::Reference => "reference",
            PatternKind::BranchReference => "branch",
            PatternKind::Static(_) => "static_value",
        }
    }
}

/// Instruction form a sub-pattern is verified through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPatternKind {
    /// `[ ... ]` - 2-byte Thumb B/Bcc.
    ShortBranch,
    /// `{ ... }` or `_BLF( ... )` - Thumb BL/BLX, ARM B/BL/BLX or an ARM thunk.
    LongBranch,
    /// `LDR[ ... ]` - 2-byte Thumb PC-relative LDR, then pointer dereference.
    ShortLoad,
    /// `LDR{ ... }` - 4-byte ARM PC-relative LDR, then pointer dereference.
    LongLoad,
    /// `%text%` - 4-byte pointer to a literal byte string.
    AsciiString,
}

impl SubPatternKind {
    /// Width of the fully-wildcard placeholder reserved in the parent pattern.
    pub fn placeholder_size(self) -> usize {
        match self {
            SubPatternKind::ShortBranch | SubPatternKind::ShortLoad => 2,
            SubPatternKind::LongBranch | SubPatternKind::LongLoad | SubPatternKind::AsciiString => 4,
        }
    }

    /// Scan alignment implied by the instruction encodings this kind decodes.
    pub fn implied_align(self) -> usize {
        match self {
            SubPatternKind::ShortBranch | SubPatternKind::LongBranch | SubPatternKind::ShortLoad => 2,
            SubPatternKind::LongLoad => 4,
            SubPatternKind::AsciiString => 1,
        }
    }
}

/// A nested pattern anchored at a fixed byte offset inside its parent,
/// standing in for bytes that encode a relative branch or load target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPattern {
    pub kind: SubPatternKind,
    pub pattern: Box<PatternExpr>,
    pub offset: usize,
    pub size: usize,
}

/// Parsed pattern tree. Built once by the parser, read-only afterwards;
/// safe to share across concurrent searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternExpr {
    pub kind: PatternKind,
    pub bytes: Vec<u8>,
    pub masks: Vec<u8>,
    pub input_offset: i32,
    pub output_offset: i32,
    pub sub_patterns: BTreeMap<usize, SubPattern>,
}

impl Default for PatternExpr {
    fn default() -> Self {
        Self {
            kind: PatternKind::Offset,
            bytes: Vec::new(),
            masks: Vec::new(),
            input_offset: 0,
            output_offset: 0,
            sub_patterns: BTreeMap::new(),
        }
    }
}

impl PatternExpr {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Index of the first byte with a non-wildcard mask, if any.
    pub fn first_significant(&self) -> Option<usize> {
        self.masks.iter().position(|&m| m != 0x00)
    }

    pub(crate) fn push_byte(&mut self, byte: u8, mask: u8) {
        self.bytes.push(byte);
        self.masks.push(mask);
    }

    pub(crate) fn push_placeholder(&mut self, size: usize) {
        for _ in 0..size {
            self.bytes.push(0);
            self.masks.push(0);
        }
    }

    pub(crate) fn attach_sub_pattern(&mut self, kind: SubPatternKind, child: PatternExpr) {
        let offset = self.bytes.len();
        let size = kind.placeholder_size();
        self.sub_patterns.insert(
            offset,
            SubPattern {
                kind,
                pattern: Box::new(child),
                offset,
                size,
            },
        );
        self.push_placeholder(size);
    }
}
