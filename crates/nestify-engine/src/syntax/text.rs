//! Line and indentation helpers over raw source text.

use rustc_hash::FxHashSet;

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Leading whitespace of the line containing `offset`.
pub fn line_indent(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let rest = &text[start..];
    let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &rest[..width]
}

/// The full line preceding the line that starts at `line_start_offset`,
/// without its trailing newline.
pub fn previous_line(text: &str, line_start_offset: usize) -> Option<&str> {
    if line_start_offset == 0 {
        return None;
    }
    let end = line_start_offset - 1;
    let start = line_start(text, end);
    Some(&text[start..end])
}

fn leading_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Remove the common leading indentation of all non-blank lines. Lines listed
/// in `verbatim` are continuation lines of a string literal: they are left
/// untouched and do not count toward the common indentation. The line just
/// before one keeps its trailing whitespace.
pub fn dedent(block: &str, verbatim: &FxHashSet<usize>) -> String {
    let lines: Vec<&str> = block.lines().collect();
    let common = lines
        .iter()
        .enumerate()
        .filter(|(i, l)| !verbatim.contains(i) && !l.trim().is_empty())
        .map(|(_, l)| leading_width(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .enumerate()
        .map(|(i, &l)| {
            if verbatim.contains(&i) {
                return l;
            }
            let l = if verbatim.contains(&(i + 1)) { l } else { l.trim_end() };
            if leading_width(l) >= common {
                &l[common..]
            } else {
                l.trim_start()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefix every non-blank line with `indent`.
pub fn indent_lines(block: &str, indent: &str) -> String {
    indent_lines_except(block, indent, &FxHashSet::default())
}

/// Prefix every non-blank line with `indent`, copying lines in `verbatim` as is.
pub fn indent_lines_except(block: &str, indent: &str, verbatim: &FxHashSet<usize>) -> String {
    block
        .lines()
        .enumerate()
        .map(|(i, l)| {
            if verbatim.contains(&i) {
                l.to_string()
            } else if l.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inner statements of a `{ ... }` block, dedented, without the braces and
/// without leading/trailing blank lines. `verbatim` holds literal
/// continuation lines, indexed by line of `block`.
pub fn block_inner(block: &str, verbatim: &FxHashSet<usize>) -> String {
    let inner = block
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .unwrap_or(block);
    let lines: Vec<&str> = inner.lines().collect();
    let skipped = lines.iter().take_while(|l| l.trim().is_empty()).count();
    let trimmed = &lines[skipped..];
    let end = trimmed
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    let shifted: FxHashSet<usize> = verbatim
        .iter()
        .filter_map(|row| row.checked_sub(skipped))
        .collect();
    dedent(&trimmed[..end].join("\n"), &shifted)
}

/// Whether `s` is a plain JavaScript identifier.
pub fn is_js_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_helpers() {
        let text = "a\n    b\n\tc";
        assert_eq!(line_start(text, 6), 2);
        assert_eq!(line_indent(text, 6), "    ");
        assert_eq!(line_indent(text, 9), "\t");
        assert_eq!(previous_line(text, 8), Some("    b"));
        assert_eq!(previous_line(text, 0), None);
    }

    #[test]
    fn block_inner_dedents() {
        let block = "{\n    const a = 1\n    if (a) {\n      go()\n    }\n  }";
        let none = FxHashSet::default();
        assert_eq!(block_inner(block, &none), "const a = 1\nif (a) {\n  go()\n}");
        assert_eq!(block_inner("{}", &none), "");
    }

    #[test]
    fn indent_skips_blank_lines() {
        assert_eq!(indent_lines("a\n\nb", "  "), "  a\n\n  b");
    }

    #[test]
    fn literal_lines_survive_dedent_and_indent() {
        let block = "{\n    const q = `a  \nb\n      c`\n    run(q)  \n}";
        let verbatim: FxHashSet<usize> = [2, 3].into_iter().collect();
        let inner = block_inner(block, &verbatim);
        assert_eq!(inner, "const q = `a  \nb\n      c`\nrun(q)");

        let body_rows: FxHashSet<usize> = [1, 2].into_iter().collect();
        assert_eq!(
            indent_lines_except(&inner, "    ", &body_rows),
            "    const q = `a  \nb\n      c`\n    run(q)"
        );
    }
}
