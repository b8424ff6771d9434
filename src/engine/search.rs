use crate::engine::decode::decode_result;
use crate::engine::error::SearchError;
use crate::engine::matcher::{check_sub_patterns, fuzzy_match};
use crate::engine::memory::MemoryView;
use crate::engine::result::SearchResult;
use crate::engine::trace::Trace;
use crate::pattern::{PatternExpr, PatternKind};

/// Scan the whole view for a pattern. `max_results` of zero means unbounded.
///
/// The scan anchors on the first significant byte: leading wildcards only
/// shift the reported position, they never force per-byte stepping.
pub fn find(
    expr: &PatternExpr,
    memory: &MemoryView,
    max_results: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    if let PatternKind::Static(value) = expr.kind {
        return Ok(vec![SearchResult {
            address: 0,
            offset: 0,
            value,
        }]);
    }
    if expr.is_empty() {
        return Err(SearchError::EmptyPattern);
    }
    let Some(first) = expr.first_significant() else {
        return Err(SearchError::AllWildcard);
    };

    let align = effective_align(expr, memory.align());
    let data = memory.data();
    let bytes = &expr.bytes[first..];
    let masks = &expr.masks[first..];
    let run = bytes.len();

    let mut results = Vec::new();
    if expr.len() > data.len() {
        return Ok(results);
    }

    let trace = Trace::root();
    let fast = run >= 4;
    let (mask32, value32) = if fast {
        let m = u32::from_le_bytes([masks[0], masks[1], masks[2], masks[3]]);
        let v = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) & m;
        (m, v)
    } else {
        (0, 0)
    };

    let mut i = first;
    while i + run <= data.len() {
        let matched = if fast {
            let word = u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
            word & mask32 == value32 && fuzzy_match(&bytes[4..], &masks[4..], &data[i + 4..])
        } else {
            fuzzy_match(bytes, masks, &data[i..])
        };

        if matched {
            let found = i - first;
            if check_sub_patterns(expr, found, memory, trace) {
                if let Some(result) = decode_result(expr, found, memory, trace) {
                    results.push(result);
                    if max_results != 0 && results.len() >= max_results {
                        break;
                    }
                    // Skip past the accepted run, keeping the anchor aligned.
                    let consumed = i + run - first;
                    i = first + next_aligned(consumed, align);
                    continue;
                }
            }
        }
        // Rejected candidates only step the cursor; overlapping positions
        // behind a failed sub-pattern are still examined.
        i += align;
    }

    Ok(results)
}

/// Search alignment: the caller's stride widened by whatever the top-level
/// sub-patterns demand (branches sit on halfwords, ARM loads on words).
pub(crate) fn effective_align(expr: &PatternExpr, align: usize) -> usize {
    expr.sub_patterns
        .values()
        .map(|sub| sub.kind.implied_align())
        .fold(align.max(1), usize::max)
}

fn next_aligned(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}
