//! Line-level diff of retained unit content.

/// One line of a rendered diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine<'a> {
    Added(&'a str),
    Removed(&'a str),
}

// LCS table is (n+1)*(m+1); larger inputs are not diffed.
const MAX_TABLE_CELLS: usize = 4_000_000;

/// Added and removed lines between two texts, in document order.
///
/// Returns `None` when the inputs are too large to diff.
pub fn diff_lines<'a>(old: &'a str, new: &'a str) -> Option<Vec<DiffLine<'a>>> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    let (n, m) = (a.len(), b.len());
    if (n + 1).saturating_mul(m + 1) > MAX_TABLE_CELLS {
        return None;
    }

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let width = m + 1;
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            out.push(DiffLine::Removed(a[i]));
            i += 1;
        } else {
            out.push(DiffLine::Added(b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|l| DiffLine::Removed(l)));
    out.extend(b[j..].iter().map(|l| DiffLine::Added(l)));
    Some(out)
}

/// Render at most `max_lines` diff lines as `+ `/`- ` prefixed text.
pub fn render_diff(old: &str, new: &str, max_lines: usize) -> String {
    let Some(lines) = diff_lines(old, new) else {
        return "(content too large to diff)".to_string();
    };

    let mut rendered: Vec<String> = lines
        .iter()
        .take(max_lines)
        .map(|line| match line {
            DiffLine::Added(text) => format!("+ {text}"),
            DiffLine::Removed(text) => format!("- {text}"),
        })
        .collect();
    if lines.len() > max_lines {
        rendered.push(format!("... and {} more lines", lines.len() - max_lines));
    }
    rendered.join("\n")
}
