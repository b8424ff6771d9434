use serde_json::{json, Value};

use crate::batch::BatchEntry;
use crate::engine::{SearchResult, XRefResult};
use crate::pattern::PatternKind;

fn result_json(kind: &PatternKind, result: &SearchResult) -> Value {
    json!({
        "address": result.address,
        "offset": result.offset,
        "value": result.value,
        "type": kind.tag(),
    })
}

/// JSON block for one searched pattern.
pub fn pattern_json(text: &str, kind: &PatternKind, results: &[SearchResult]) -> Value {
    json!({
        "pattern": text,
        "results": results.iter().map(|r| result_json(kind, r)).collect::<Vec<_>>(),
    })
}

/// JSON block for one batch entry, carrying its id and function name.
pub fn batch_json(entry: &BatchEntry, kind: &PatternKind, results: &[SearchResult]) -> Value {
    json!({
        "pattern": entry.pattern,
        "id": entry.id,
        "function": entry.name,
        "results": results.iter().map(|r| result_json(kind, r)).collect::<Vec<_>>(),
    })
}

pub fn xrefs_json(results: &[XRefResult]) -> Value {
    json!(results
        .iter()
        .map(|r| json!({
            "address": r.address,
            "offset": r.offset,
            "type": r.kind.tag(),
        }))
        .collect::<Vec<_>>())
}

/// Human-readable listing for one searched pattern.
pub fn render_pattern_results(
    text: &str,
    kind: &PatternKind,
    results: &[SearchResult],
) -> String {
    let mut out = format!("Pattern: '{}'\nFound {} matches:\n", text, results.len());
    for result in results {
        match kind {
            PatternKind::Static(_) => {
                out.push_str(&format!("  {:08X} (static value)\n", result.value));
            }
            _ => {
                out.push_str(&format!(
                    "  {:08X}: {:08X} ({})\n",
                    result.address,
                    result.value,
                    kind.tag()
                ));
            }
        }
    }
    out
}

pub fn render_xref_results(address: u32, results: &[XRefResult]) -> String {
    let mut out = format!(
        "Searching x-refs for {:08X}\nFound {} matches:\n",
        address,
        results.len()
    );
    for result in results {
        let label = match result.kind {
            crate::engine::XRefKind::Pointer => "pointer",
            crate::engine::XRefKind::Reference => "reference",
            crate::engine::XRefKind::BranchCall => "branch call",
        };
        out.push_str(&format!("  {:08X} ({})\n", result.address, label));
    }
    out
}

/// One line of the vkp-style batch listing. Found entries get the value in
/// the patch column; missing ones are commented out.
pub fn batch_line(entry: &BatchEntry, value: Option<u32>) -> String {
    match value {
        Some(value) => format!(
            "{:04X}: 0x{:08X}   ;{:4X}: {}",
            entry.id * 4,
            value,
            entry.id,
            entry.name
        ),
        None => format!(
            ";{:03X}:              ;{:4X}: {}",
            entry.id * 4,
            entry.id,
            entry.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{XRefKind, XRefResult};

    fn entry() -> BatchEntry {
        BatchEntry {
            id: 0x10,
            name: "GBS_SendMessage".into(),
            pattern: "F0 B5".into(),
        }
    }

    #[test]
    fn test_pattern_json_shape() {
        let results = [SearchResult {
            address: 0xA0000010,
            offset: 0x10,
            value: 0xA0000011,
        }];
        let v = pattern_json("F0 B5", &PatternKind::Offset, &results);
        assert_eq!(v["pattern"], "F0 B5");
        assert_eq!(v["results"][0]["type"], "offset");
        assert_eq!(v["results"][0]["value"], 0xA0000011u32);
    }

    #[test]
    fn test_batch_json_shape() {
        let v = batch_json(&entry(), &PatternKind::Offset, &[]);
        assert_eq!(v["id"], 0x10);
        assert_eq!(v["function"], "GBS_SendMessage");
        assert_eq!(v["results"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_xrefs_json_shape() {
        let results = [XRefResult {
            kind: XRefKind::BranchCall,
            address: 0xA0000100,
            offset: 4,
        }];
        let v = xrefs_json(&results);
        assert_eq!(v[0]["type"], "branch");
        assert_eq!(v[0]["offset"], 4);
    }

    #[test]
    fn test_batch_lines() {
        assert_eq!(
            batch_line(&entry(), Some(0xA0001235)),
            "0040: 0xA0001235   ;  10: GBS_SendMessage"
        );
        assert_eq!(
            batch_line(&entry(), None),
            ";040:              ;  10: GBS_SendMessage"
        );
    }

    #[test]
    fn test_render_pattern_results() {
        let results = [SearchResult {
            address: 0xA0000010,
            offset: 0x10,
            value: 0xA0000011,
        }];
        let text = render_pattern_results("F0 B5", &PatternKind::Offset, &results);
        assert!(text.contains("Found 1 matches:"));
        assert!(text.contains("  A0000010: A0000011 (offset)"));
    }
}
