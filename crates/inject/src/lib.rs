//! typeweave-inject: named region splicing for generated source text.
//!
//! The compiler produces one opaque block of source text and has no
//! awareness of where it goes. This crate is the surrounding engine: it
//! locates a named marker-delimited region in an existing file,
//!
//! ```text
//! // typeweave:begin order-chain
//! ...replaced on every generation...
//! // typeweave:end order-chain
//! ```
//!
//! replaces the region body with the generated text re-indented to the
//! begin marker's leading whitespace, and reports whether the content
//! changed. Files are only rewritten when the content actually changed,
//! so build tools watching timestamps stay quiet on no-op runs.

use std::fs;
use std::path::Path;

use thiserror::Error;

pub const BEGIN_MARK: &str = "// typeweave:begin";
pub const END_MARK: &str = "// typeweave:end";

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("region '{0}' not found")]
    RegionNotFound(String),

    #[error("region '{0}' has no end marker")]
    UnterminatedRegion(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of a pure splice: the new content and whether it differs from
/// the old one.
#[derive(Debug, Clone)]
pub struct Splice {
    pub content: String,
    pub changed: bool,
}

fn is_marker(line: &str, mark: &str, region: &str) -> bool {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix(mark) {
        Some(rest) => rest.trim() == region,
        None => false,
    }
}

/// Replace the body of the named region with `replacement`, keeping both
/// marker lines and re-indenting the replacement to the begin marker.
pub fn splice_region(
    content: &str,
    region: &str,
    replacement: &str,
) -> Result<Splice, InjectError> {
    let lines: Vec<&str> = content.lines().collect();
    let begin = lines
        .iter()
        .position(|l| is_marker(l, BEGIN_MARK, region))
        .ok_or_else(|| InjectError::RegionNotFound(region.to_string()))?;
    let end = lines[begin + 1..]
        .iter()
        .position(|l| is_marker(l, END_MARK, region))
        .map(|offset| begin + 1 + offset)
        .ok_or_else(|| InjectError::UnterminatedRegion(region.to_string()))?;

    let indent: String = lines[begin]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();

    let mut out: Vec<String> = Vec::new();
    out.extend(lines[..=begin].iter().map(|l| l.to_string()));
    for line in replacement.lines() {
        if line.is_empty() {
            out.push(String::new());
        } else {
            out.push(format!("{}{}", indent, line));
        }
    }
    out.extend(lines[end..].iter().map(|l| l.to_string()));

    let mut new_content = out.join("\n");
    if content.ends_with('\n') {
        new_content.push('\n');
    }
    let changed = new_content != content;
    Ok(Splice {
        content: new_content,
        changed,
    })
}

/// Splice the region inside the file and rewrite it only when the
/// content changed. Returns whether the file was rewritten.
pub fn inject_file(path: &Path, region: &str, replacement: &str) -> Result<bool, InjectError> {
    let content = fs::read_to_string(path)?;
    let splice = splice_region(&content, region, replacement)?;
    if splice.changed {
        fs::write(path, splice.content)?;
    }
    Ok(splice.changed)
}

/// True when the file's region already holds exactly the given text.
pub fn is_up_to_date(path: &Path, region: &str, replacement: &str) -> Result<bool, InjectError> {
    let content = fs::read_to_string(path)?;
    let splice = splice_region(&content, region, replacement)?;
    Ok(!splice.changed)
}
