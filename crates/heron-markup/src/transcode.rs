//! Markdown → mrkdwn transcoding pipeline.
//!
//! An ordered list of pure passes over the text. Spans that must not be
//! re-matched by a later pass (fenced code, rendered tables, inline code,
//! converted bold/header delimiters) are swapped for placeholder tokens
//! and restored at the end. Fenced code is extracted before the table
//! pass runs, so a pipe table inside a fence is never rewritten.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]+`").expect("valid regex"));
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+)$").expect("valid regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").expect("valid regex"));
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| {
    // Non-space boundaries keep spaced asterisks in prose (arithmetic,
    // bullet art) out of the italic rule.
    Regex::new(r"\*([^\s*][^*\n]*?[^\s*]|[^\s*])\*").expect("valid regex")
});
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^( *)- (.*)$").expect("valid regex"));
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^( *)[0-9]+\. (.*)$").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").expect("valid regex"));
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}([0-9]+)\u{E001}").expect("valid regex"));

/// Shortcodes rewritten to their Slack equivalents; everything else passes
/// through untouched.
const EMOJI_MAP: &[(&str, &str)] = &[
    (":check:", ":white_check_mark:"),
    (":cross:", ":x:"),
    (":tick:", ":heavy_check_mark:"),
    (":idea:", ":bulb:"),
];

/// Display names for fence language tags; unknown tags pass through.
fn canonical_lang(tag: &str) -> &str {
    match tag {
        "py" | "python" => "Python",
        "js" | "javascript" => "JavaScript",
        "ts" | "typescript" => "TypeScript",
        "cpp" | "c++" => "C++",
        "cs" | "csharp" => "C#",
        "rb" | "ruby" => "Ruby",
        "rs" | "rust" => "Rust",
        "go" | "golang" => "Go",
        "sh" | "bash" | "shell" => "Bash",
        "yml" | "yaml" => "YAML",
        other => other,
    }
}

/// Convert markdown text to Slack mrkdwn. Total: never fails, unmatched
/// constructs pass through unchanged.
pub fn to_chat_markup(markdown: &str) -> String {
    let mut guard = Guard::default();

    // Input never legitimately contains the placeholder sentinels.
    let text: String = markdown
        .chars()
        .filter(|c| *c != '\u{E000}' && *c != '\u{E001}')
        .collect();

    let text = protect_fences(&text, &mut guard);
    let text = convert_tables(&text, &mut guard);
    let text = protect_inline_code(&text, &mut guard);
    let text = convert_headers(&text, &mut guard);
    let text = convert_bold(&text, &mut guard);
    let text = convert_italic(&text);
    let text = convert_lists(&text);
    let text = convert_quotes(&text);
    let text = convert_links(&text);
    let text = convert_emoji(&text);
    guard.restore(&text)
}

/// Holds spans that later passes must not touch, keyed by placeholder
/// tokens made of private-use sentinels (stripped from the input above,
/// so a token can only come from `protect`).
#[derive(Default)]
struct Guard {
    slots: Vec<String>,
}

impl Guard {
    fn protect(&mut self, content: String) -> String {
        let token = format!("\u{E000}{}\u{E001}", self.slots.len());
        self.slots.push(content);
        token
    }

    /// Swap every token back for its protected span. Slots never contain
    /// tokens themselves, so a single pass suffices.
    fn restore(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                let idx: usize = caps[1].parse().unwrap_or(usize::MAX);
                self.slots.get(idx).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}

/// Pass 1: extract fenced code blocks verbatim, canonicalizing the
/// language tag. Postcondition: no line of the returned text sits inside
/// a fence, so the table pass cannot false-positive on fenced content.
fn protect_fences(text: &str, guard: &mut Guard) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim_start();
        if let Some(tag) = trimmed.strip_prefix("```") {
            let display = canonical_lang(tag.trim());
            let mut body: Vec<&str> = Vec::new();
            let mut j = i + 1;
            let mut closed = false;
            while j < lines.len() {
                if lines[j].trim() == "```" {
                    closed = true;
                    break;
                }
                body.push(lines[j]);
                j += 1;
            }

            let mut block = format!("```{display}");
            for line in &body {
                block.push('\n');
                block.push_str(line);
            }
            if closed {
                block.push_str("\n```");
            }
            out.push(guard.protect(block));
            i = if closed { j + 1 } else { j };
        } else {
            out.push(lines[i].to_string());
            i += 1;
        }
    }

    out.join("\n")
}

/// Pass 2: render pipe tables: drop the separator row, bold header
/// cells, join cells with `" | "`, wrap the table in a fence. The result
/// is protected so the bolded header cells survive the italic pass.
fn convert_tables(text: &str, guard: &mut Guard) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let is_header = lines[i].contains('|')
            && !lines[i].trim().is_empty()
            && i + 1 < lines.len()
            && is_separator_row(lines[i + 1]);
        if is_header {
            let mut j = i + 2;
            let mut body: Vec<&str> = Vec::new();
            while j < lines.len() && lines[j].contains('|') && !lines[j].trim().is_empty() {
                body.push(lines[j]);
                j += 1;
            }
            out.push(guard.protect(render_table(lines[i], &body)));
            i = j;
        } else {
            out.push(lines[i].to_string());
            i += 1;
        }
    }

    out.join("\n")
}

/// A row of only pipes, dashes, colons and whitespace, with at least one
/// dash. That is the markdown header/body divider.
fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn render_table(header: &str, body: &[&str]) -> String {
    let header_cells: Vec<String> = row_cells(header)
        .into_iter()
        .map(|c| format!("*{c}*"))
        .collect();

    let mut rendered = format!("```\n{}", header_cells.join(" | "));
    for row in body {
        rendered.push('\n');
        rendered.push_str(&row_cells(row).join(" | "));
    }
    rendered.push_str("\n```");
    rendered
}

fn row_cells(row: &str) -> Vec<String> {
    row.trim()
        .trim_start_matches('|')
        .trim_end_matches('|')
        .split('|')
        .map(|c| c.trim().to_string())
        .collect()
}

/// Pass 3: inline code spans are protected and restored byte-identical:
/// single-backtick spans map to single-backtick spans in mrkdwn.
fn protect_inline_code(text: &str, guard: &mut Guard) -> String {
    INLINE_CODE
        .replace_all(text, |caps: &Captures| guard.protect(caps[0].to_string()))
        .into_owned()
}

/// Pass 4: `#`..`######` headers become a bold-delimiter run capped at
/// 3 (levels 4-6 collapse to the level-3 styling). The delimiter runs are
/// protected; the heading text stays visible to later passes.
fn convert_headers(text: &str, guard: &mut Guard) -> String {
    HEADER
        .replace_all(text, |caps: &Captures| {
            let run = "*".repeat(caps[1].len().min(3));
            format!(
                "{}{}{}",
                guard.protect(run.clone()),
                &caps[2],
                guard.protect(run)
            )
        })
        .into_owned()
}

/// Pass 5: `**text**` → `*text*`. The single-asterisk delimiters are
/// protected so the italic pass cannot re-match inside converted bold.
fn convert_bold(text: &str, guard: &mut Guard) -> String {
    BOLD.replace_all(text, |caps: &Captures| {
        format!(
            "{}{}{}",
            guard.protect("*".to_string()),
            &caps[1],
            guard.protect("*".to_string())
        )
    })
    .into_owned()
}

/// Pass 6: single-asterisk italic → `_text_`. Underscore italic is
/// already the target form and needs no rewrite.
fn convert_italic(text: &str) -> String {
    // Braced form: `$1_` would be read as a capture group named `1_`.
    ITALIC_STAR.replace_all(text, "_${1}_").into_owned()
}

/// Pass 7: list markers become a bullet glyph; nesting depth is the
/// leading-space count halved (2 source spaces = 1 level), re-emitted as
/// double-space indents. Depths between granularity steps round down.
fn convert_lists(text: &str) -> String {
    let bullet = |caps: &Captures| {
        let levels = caps[1].len() / 2;
        format!("{}• {}", "  ".repeat(levels), &caps[2])
    };
    let text = BULLET_ITEM.replace_all(text, bullet).into_owned();
    NUMBERED_ITEM.replace_all(&text, bullet).into_owned()
}

/// Pass 8: `> text` → `>>> text`; bare `>` lines are dropped entirely.
/// Lines already carrying the `>>>` marker are left alone.
fn convert_quotes(text: &str) -> String {
    let lines: Vec<String> = text
        .split('\n')
        .filter(|line| line.trim() != ">")
        .map(|line| {
            if line.starts_with(">>>") {
                line.to_string()
            } else if let Some(rest) = line.strip_prefix("> ") {
                format!(">>> {rest}")
            } else if let Some(rest) = line.strip_prefix('>') {
                format!(">>> {rest}")
            } else {
                line.to_string()
            }
        })
        .collect();
    lines.join("\n")
}

/// Pass 9: `[label](url)` → `<url|label>`.
fn convert_links(text: &str) -> String {
    LINK.replace_all(text, "<$2|$1>").into_owned()
}

/// Pass 10: fixed shortcode substitutions; unmapped shortcodes pass
/// through unchanged.
fn convert_emoji(text: &str) -> String {
    let mut out = text.to_string();
    for (from, to) in EMOJI_MAP {
        out = out.replace(from, to);
    }
    out
}
