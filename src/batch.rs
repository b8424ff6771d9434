use std::path::Path;

use regex::RegexBuilder;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to read batch file: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of a batch file: a hex id, a symbol name and its pattern text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub id: u32,
    pub name: String,
    pub pattern: String,
}

/// Parse the ini-like batch format. Each entry is `ID: NAME = PATTERN`;
/// `;`-comments and lines that do not match are skipped, as are entries
/// whose id does not parse as hex.
pub fn parse_entries(text: &str) -> Vec<BatchEntry> {
    let re = RegexBuilder::new(
        r"^[ \t]*([0-9a-f]+):[ \t]*([^=;\n]+?)(?:[ \t]*=[ \t]*([^;:\n]*))?$",
    )
    .case_insensitive(true)
    .multi_line(true)
    .build()
    .unwrap();

    re.captures_iter(text)
        .filter_map(|caps| {
            let id = u32::from_str_radix(&caps[1], 16).ok()?;
            let name = caps[2].trim().to_string();
            let pattern = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            Some(BatchEntry { id, name, pattern })
        })
        .collect()
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<BatchEntry>, BatchError> {
    Ok(parse_entries(&std::fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let text = "\
; functions.ini
10: GBS_SendMessage = B5 ?? 48 ?? + 4
14: GBS_RecMessage= F0 B5
18: NoPattern
; 1C: commented out = AB CD
";
        let entries = parse_entries(text);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            BatchEntry {
                id: 0x10,
                name: "GBS_SendMessage".into(),
                pattern: "B5 ?? 48 ?? + 4".into(),
            }
        );
        assert_eq!(entries[1].name, "GBS_RecMessage");
        assert_eq!(entries[1].pattern, "F0 B5");
        assert_eq!(entries[2].id, 0x18);
        assert_eq!(entries[2].pattern, "");
    }

    #[test]
    fn test_uppercase_ids_and_indent() {
        let entries = parse_entries("  1C:  Name  =  AB CD  \n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 0x1C);
        assert_eq!(entries[0].pattern, "AB CD");
    }

    #[test]
    fn test_garbage_lines_skipped() {
        let entries = parse_entries("not an entry\nZZZZZZZZZ: nope = AB\n");
        assert!(entries.is_empty());
    }
}
