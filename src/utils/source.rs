/// 1-based line/column of a byte offset in `text`.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in text.char_indices() {
        if i >= offset {
            return (line, col);
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Render a few lines of context around `line`/`column` with a caret marker,
/// for parser diagnostics.
pub fn code_frame(text: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let num_width = lines.len().to_string().len() + 1;
    let mut out = String::new();

    for (idx, raw) in lines.iter().enumerate() {
        let n = idx + 1;
        if n.abs_diff(line) > 3 {
            continue;
        }
        let marker = if n == line { '>' } else { ' ' };
        let expanded = expand_tabs(raw);
        out.push_str(&format!("{}{:>width$} | {}\n", marker, n, expanded, width = num_width));
        if n == line {
            let caret_pad = " ".repeat(column.saturating_sub(1));
            out.push_str(&format!("{} | {}^\n", " ".repeat(num_width + 1), caret_pad));
        }
    }

    out
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::new();
    let mut width = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = 4 - width % 4;
            for _ in 0..spaces {
                out.push(' ');
            }
            width += spaces;
        } else {
            out.push(c);
            width += 1;
        }
    }
    out
}
