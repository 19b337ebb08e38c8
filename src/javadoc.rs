//! Javadoc comment extraction.
//!
//! Turns a raw `/** ... */` block into a [`Document`]. Extraction is a pure
//! function of the input text and never fails: malformed tags simply produce
//! empty fields.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{DocParam, DocThrows, Document};

static TAG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@([A-Za-z][\w-]*)(?:\s+(.*))?$").expect("tag regex is valid"));

static PRE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<pre>(.*?)</pre>").expect("pre regex is valid"));

/// Parse a comment block, returning `None` when it carries no text at all.
pub fn parse_javadoc(raw: &str) -> Option<Document> {
    if raw.trim().is_empty() {
        return None;
    }
    let doc = extract(raw);
    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

/// Extract a structured document from raw comment text.
pub fn extract(raw: &str) -> Document {
    let lines = strip_comment_markers(raw);

    let mut free_text: Vec<&str> = Vec::new();
    let mut blocks: Vec<TagBlock> = Vec::new();
    let mut verbatim = VerbatimState::default();

    for line in &lines {
        let trimmed = line.trim_start();
        let tag = if verbatim.is_open() {
            None
        } else {
            TAG_LINE.captures(trimmed)
        };
        verbatim.advance(line);

        if let Some(caps) = tag {
            blocks.push(TagBlock {
                name: caps[1].to_string(),
                lines: vec![caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string()],
            });
        } else if let Some(current) = blocks.last_mut() {
            current.lines.push(line.to_string());
        } else {
            free_text.push(line);
        }
    }

    let free_text = free_text.join("\n");
    let (summary, description) = split_summary(free_text.trim());

    let mut doc = Document {
        summary,
        description,
        ..Document::default()
    };

    for block in blocks {
        apply_tag(&mut doc, block);
    }

    for caps in PRE_BLOCK.captures_iter(&free_text) {
        let example = caps[1].trim();
        if !example.is_empty() {
            doc.examples.push(example.to_string());
        }
    }

    doc
}

/// Open `<pre>` blocks and `{@code ...}` spans carried across lines. Lines
/// inside them are never block tags, so `@Override` in an example stays text.
#[derive(Default)]
struct VerbatimState {
    pre_depth: usize,
    code_depth: usize,
}

impl VerbatimState {
    fn is_open(&self) -> bool {
        self.pre_depth > 0 || self.code_depth > 0
    }

    fn advance(&mut self, line: &str) {
        let lower = line.to_ascii_lowercase();
        let opened = lower.matches("<pre").count();
        let closed = lower.matches("</pre").count();
        self.pre_depth = (self.pre_depth + opened).saturating_sub(closed);

        let mut rest = line;
        while !rest.is_empty() {
            if self.code_depth == 0 {
                match rest.find("{@code") {
                    Some(start) => {
                        self.code_depth = 1;
                        rest = &rest[start + "{@code".len()..];
                    }
                    None => break,
                }
            } else {
                match rest.find(|c| c == '{' || c == '}') {
                    Some(pos) => {
                        if rest.as_bytes()[pos] == b'{' {
                            self.code_depth += 1;
                        } else {
                            self.code_depth -= 1;
                        }
                        rest = &rest[pos + 1..];
                    }
                    None => break,
                }
            }
        }
    }
}

struct TagBlock {
    name: String,
    lines: Vec<String>,
}

impl TagBlock {
    fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn verbatim(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}

fn apply_tag(doc: &mut Document, block: TagBlock) {
    match block.name.as_str() {
        "param" => {
            let (name, description) = split_name(&block.text());
            doc.params.push(DocParam { name, description });
        }
        "throws" | "exception" => {
            let (exception, description) = split_name(&block.text());
            doc.throws.push(DocThrows {
                exception,
                description,
            });
        }
        "return" | "returns" => {
            if doc.returns.is_none() {
                doc.returns = Some(block.text());
            }
        }
        "example" => {
            let example = block.verbatim();
            if !example.is_empty() {
                doc.examples.push(example);
            }
        }
        other => {
            let text = block.text();
            doc.tags
                .entry(other.to_string())
                .and_modify(|existing| {
                    existing.push('\n');
                    existing.push_str(&text);
                })
                .or_insert(text);
        }
    }
}

/// First token is the name, the rest the description. Both may be empty.
fn split_name(text: &str) -> (String, String) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_string(), rest.trim().to_string()),
        None => (text.to_string(), String::new()),
    }
}

fn strip_comment_markers(raw: &str) -> Vec<String> {
    let body = raw.trim();
    let body = body
        .strip_prefix("/**")
        .or_else(|| body.strip_prefix("/*"))
        .unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);

    body.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let without_gutter = match trimmed.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => trimmed,
            };
            without_gutter.trim_end().to_string()
        })
        .collect()
}

/// Split free text into (summary, description).
fn split_summary(text: &str) -> (String, String) {
    if text.is_empty() {
        return (String::new(), String::new());
    }

    let (first_paragraph, remaining) = match find_blank_line(text) {
        Some((end, resume)) => (&text[..end], text[resume..].trim()),
        None => (text, ""),
    };

    match sentence_end(first_paragraph) {
        Some(end) => {
            let summary = collapse_whitespace(&first_paragraph[..end]);
            let rest = first_paragraph[end..].trim();
            let description = [rest, remaining]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("\n\n");
            (summary, description)
        }
        None => (collapse_whitespace(first_paragraph), remaining.to_string()),
    }
}

/// Byte range of the first blank line: (end of paragraph, start of the rest).
fn find_blank_line(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut paragraph_end = None;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if paragraph_end.is_none() {
                paragraph_end = Some(offset);
            }
        } else if let Some(end) = paragraph_end {
            return Some((end, offset));
        }
        offset += line.len();
    }
    paragraph_end.map(|end| (end, text.len()))
}

/// Index just past the first `.` that is followed by whitespace or the end.
fn sentence_end(paragraph: &str) -> Option<usize> {
    let mut chars = paragraph.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '.' {
            match chars.peek() {
                None => return Some(idx + 1),
                Some((_, next)) if next.is_whitespace() => return Some(idx + 1),
                _ => {}
            }
        }
    }
    None
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
