/*!
format.rs

Human-output formatting for the `quish` CLI: boxed headers, aligned tables,
color roles and emoji tags.

Style decisions are taken once per command via `StyleOptions::detect()`:
  - NO_COLOR  (any value) disables ANSI color
  - NO_EMOJI  (any value) disables emoji tags
  - COLUMNS   terminal width hint, clamped to 40..=220 (default 100)

Public API:
  - StyleOptions::detect() -> StyleOptions
  - color(role, text, &StyleOptions) -> String
  - emoji(tag, &StyleOptions) -> &'static str
  - box_header(title, subtitle_opt, &StyleOptions) -> String
  - table(headers, rows, &StyleOptions) -> String
  - truncate_ellipsis(s, max_chars) -> String

JSON output paths do not use these helpers.
*/

use std::borrow::Cow;

/* -------------------------------------------------------------------------- */
/* Style Options                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);

        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
            term_width: width,
        }
    }

    /// No color, no emoji, fixed width.
    #[cfg(test)]
    pub fn plain(term_width: usize) -> Self {
        StyleOptions {
            use_color: false,
            use_emoji: false,
            term_width,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Color / Emoji                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Warning,
    Error,
    Dim,
    Bold,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",
        Role::Secondary => "38;5;250",
        Role::Accent => "38;5;213",
        Role::Success => "38;5;82",
        Role::Warning => "38;5;214",
        Role::Error => "38;5;196",
        Role::Dim => "2",
        Role::Bold => "1",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "success" => "✔",
        "error" => "✖",
        "warn" => "⚠",
        "info" => "ℹ",
        "run" => "🚀",
        "stop" => "⏹",
        "topic" => "📂",
        "command" => "🛠",
        "list" => "📜",
        "clock" => "⏱",
        "save" => "💾",
        "spark" => "✨",
        _ => "",
    }
}

/* -------------------------------------------------------------------------- */
/* Box Header                                                                 */
/* -------------------------------------------------------------------------- */

/// Single-line title (plus optional dim subtitle) inside a light box.
/// Content wider than the terminal is cut with an ellipsis.
pub fn box_header(
    title: impl AsRef<str>,
    subtitle: Option<impl AsRef<str>>,
    style: &StyleOptions,
) -> String {
    let max_inner = style.term_width.saturating_sub(4).max(16);

    let plain = match &subtitle {
        Some(s) => format!("{}  {}", title.as_ref(), s.as_ref()),
        None => title.as_ref().to_string(),
    };
    let fits = display_width(&plain) <= max_inner;

    let content = if fits {
        let t = color(Role::Primary, title.as_ref(), style);
        match &subtitle {
            Some(s) => format!("{t}  {}", color(Role::Secondary, s.as_ref(), style)),
            None => t,
        }
    } else {
        color(Role::Primary, truncate_ellipsis(&plain, max_inner), style)
    };

    let inner = display_width(&content);
    let bar = "─".repeat(inner + 2);
    format!("┌{bar}┐\n│ {content} │\n└{bar}┘")
}

/* -------------------------------------------------------------------------- */
/* Table Rendering                                                            */
/* -------------------------------------------------------------------------- */

/// Left-aligned columns separated by two spaces, with a dashed rule under the
/// header. Widest columns shrink first when the row exceeds the terminal.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let total: usize = widths.iter().sum::<usize>() + (cols - 1) * 2;
    if total > style.term_width {
        let mut overflow = total - style.term_width;
        let mut order: Vec<usize> = (0..cols).collect();
        order.sort_by(|a, b| widths[*b].cmp(&widths[*a]));
        for idx in order {
            if overflow == 0 {
                break;
            }
            let shrink = widths[idx].saturating_sub(4).min(overflow);
            widths[idx] -= shrink;
            overflow -= shrink;
        }
    }

    let mut lines: Vec<String> = Vec::with_capacity(rows.len() + 2);
    let header = headers
        .iter()
        .enumerate()
        .map(|(i, h)| color(Role::Accent, fit(h, widths[i]), style))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(header);
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(color(Role::Dim, rule, style));

    for row in rows {
        let line = (0..cols)
            .map(|c| fit(row.get(c).map(String::as_str).unwrap_or(""), widths[c]))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn fit(s: &str, width: usize) -> String {
    let cut = truncate_ellipsis(s, width);
    let len = display_width(&cut);
    format!("{cut}{}", " ".repeat(width.saturating_sub(len)))
}

/* -------------------------------------------------------------------------- */
/* Text Helpers                                                               */
/* -------------------------------------------------------------------------- */

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if display_width(s) <= max_chars {
        return s.to_string();
    }
    let mut out: String = strip_ansi(s).chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut buf = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for t in chars.by_ref() {
                if t.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        buf.push(c);
    }
    Cow::Owned(buf)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                      */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_header_wraps_title() {
        let style = StyleOptions::plain(80);
        let b = box_header("Files", Some("3 commands"), &style);
        let lines: Vec<&str> = b.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "│ Files  3 commands │");
        assert_eq!(lines[0].chars().count(), lines[1].chars().count());
    }

    #[test]
    fn box_header_truncates_when_narrow() {
        let style = StyleOptions::plain(40);
        let long = "x".repeat(100);
        let b = box_header(&long, None::<&str>, &style);
        assert!(b.contains('…'));
        assert!(b.lines().all(|l| l.chars().count() <= 40));
    }

    #[test]
    fn table_aligns_columns() {
        let style = StyleOptions::plain(100);
        let t = table(
            &["NAME", "TYPE"],
            &[
                vec!["Long".into(), "boolean".into()],
                vec!["Path".into(), "folder".into()],
            ],
            &style,
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "NAME  TYPE   ");
        assert_eq!(lines[1], "----  -------");
        assert_eq!(lines[2], "Long  boolean");
        assert_eq!(lines[3], "Path  folder");
    }

    #[test]
    fn table_shrinks_widest_column() {
        let style = StyleOptions::plain(40);
        let t = table(&["A", "B"], &[vec!["a".into(), "b".repeat(80)]], &style);
        assert!(t.lines().all(|l| l.chars().count() <= 40));
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_ellipsis("abc", 4), "abc");
    }

    #[test]
    fn strip_ansi_codes() {
        assert_eq!(strip_ansi("\x1b[31mRED\x1b[0m"), "RED");
        let style = StyleOptions {
            use_color: true,
            use_emoji: false,
            term_width: 80,
        };
        assert_eq!(display_width(&color(Role::Error, "abc", &style)), 3);
        assert_eq!(emoji("run", &style), "");
    }
}
