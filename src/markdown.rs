//! Markdown-lite rendering for model replies
//!
//! Only three constructs are recognised: fenced code blocks, `**bold**`
//! spans and `` `inline code` `` spans. Everything else is plain text.
//! Unmatched markers are kept as literal characters and no input text is
//! ever dropped, apart from blank lines between paragraphs.

use colored::Colorize;
use regex::Regex;
use std::sync::OnceLock;

/// A fenced code block extracted from a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language named on the opening fence, empty when absent
    pub language: String,
    pub code: String,
}

/// An inline span inside a paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(String),
    Code(String),
}

/// A block-level element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Span>),
    Code(CodeBlock),
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(.*?)```").expect("static regex"))
}

fn inline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^\n]+?)\*\*|`([^`\n]+)`").expect("static regex"))
}

fn parse_fence(inner: &str) -> CodeBlock {
    match inner.find('\n') {
        Some(pos) => {
            let code = &inner[pos + 1..];
            CodeBlock {
                language: inner[..pos].trim().to_string(),
                code: code.strip_suffix('\n').unwrap_or(code).to_string(),
            }
        }
        None => CodeBlock {
            language: String::new(),
            code: inner.to_string(),
        },
    }
}

fn parse_spans(paragraph: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in inline_re().captures_iter(paragraph) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::Text(paragraph[last..whole.start()].to_string()));
        }
        if let Some(bold) = caps.get(1) {
            spans.push(Span::Bold(bold.as_str().to_string()));
        } else if let Some(code) = caps.get(2) {
            spans.push(Span::Code(code.as_str().to_string()));
        }
        last = whole.end();
    }
    if last < paragraph.len() {
        spans.push(Span::Text(paragraph[last..].to_string()));
    }
    spans
}

fn push_paragraphs(blocks: &mut Vec<Block>, segment: &str) {
    for paragraph in segment.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }
        blocks.push(Block::Paragraph(parse_spans(paragraph.trim_matches('\n'))));
    }
}

/// Split text into paragraphs and code blocks
///
/// ```
/// use arduino_mentor::markdown::{parse, Block};
///
/// let blocks = parse("Upload this:\n\n```cpp\nvoid setup() {}\n```");
/// assert_eq!(blocks.len(), 2);
/// assert!(matches!(&blocks[1], Block::Code(c) if c.language == "cpp"));
/// ```
pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut last = 0;
    for caps in fence_re().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_paragraphs(&mut blocks, &text[last..whole.start()]);
        blocks.push(Block::Code(parse_fence(inner.as_str())));
        last = whole.end();
    }
    push_paragraphs(&mut blocks, &text[last..]);
    blocks
}

/// All code blocks in order of appearance
pub fn code_blocks(text: &str) -> Vec<CodeBlock> {
    parse(text)
        .into_iter()
        .filter_map(|block| match block {
            Block::Code(code) => Some(code),
            Block::Paragraph(_) => None,
        })
        .collect()
}

fn code_header(index: usize, block: &CodeBlock) -> String {
    let language = if block.language.is_empty() {
        "code"
    } else {
        block.language.as_str()
    };
    format!("[{}] {}", index, language)
}

/// Render for a color terminal
///
/// Code blocks are numbered from 1 so they can be referenced later.
pub fn render_terminal(text: &str) -> String {
    let mut out = Vec::new();
    let mut index = 0;
    for block in parse(text) {
        match block {
            Block::Paragraph(spans) => {
                let line: String = spans
                    .into_iter()
                    .map(|span| match span {
                        Span::Text(t) => t,
                        Span::Bold(b) => b.bold().to_string(),
                        Span::Code(c) => c.red().to_string(),
                    })
                    .collect();
                out.push(line);
            }
            Block::Code(block) => {
                index += 1;
                let mut rendered = format!("{}\n", code_header(index, &block).dimmed());
                for line in block.code.lines() {
                    rendered.push_str(&format!("  {}\n", line.cyan()));
                }
                out.push(rendered.trim_end().to_string());
            }
        }
    }
    out.join("\n\n")
}

/// Render without styling
pub fn render_plain(text: &str) -> String {
    let mut out = Vec::new();
    let mut index = 0;
    for block in parse(text) {
        match block {
            Block::Paragraph(spans) => out.push(
                spans
                    .into_iter()
                    .map(|span| match span {
                        Span::Text(t) | Span::Bold(t) | Span::Code(t) => t,
                    })
                    .collect::<String>(),
            ),
            Block::Code(block) => {
                index += 1;
                let mut rendered = code_header(index, &block);
                for line in block.code.lines() {
                    rendered.push_str(&format!("\n  {}", line));
                }
                out.push(rendered);
            }
        }
    }
    out.join("\n\n")
}
