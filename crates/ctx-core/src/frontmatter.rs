//! Frontmatter handling for component definition files.
//!
//! Every component definition is a markdown file with an optional leading
//! YAML block bounded by `---` lines:
//!
//! ```markdown
//! ---
//! name: api-designer
//! version: 1.2.0
//! ---
//!
//! # API Designer
//! ...
//! ```
//!
//! Unknown keys are preserved on read (via `#[serde(flatten)]` maps on the
//! typed specs) and round-tripped on write, so user annotations survive
//! activation moves and rewrites.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// The fixed frontmatter delimiter line.
pub const DELIMITER: &str = "---";

/// Error produced when a frontmatter block cannot be split or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterError(pub String);

impl std::fmt::Display for FrontmatterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FrontmatterError {}

/// Split a document into its raw YAML frontmatter and markdown body.
///
/// Returns `(None, body)` when the document has no frontmatter block. A
/// document that opens a block but never closes it is rejected.
pub fn split(content: &str) -> Result<(Option<&str>, &str), FrontmatterError> {
    let trimmed = content.trim_start_matches('\u{feff}');
    let mut lines = trimmed.lines();
    match lines.next() {
        Some(line) if line.trim_end() == DELIMITER => {}
        _ => return Ok((None, trimmed)),
    }

    // Byte offset of the line following the opening delimiter.
    let after_open = match trimmed.find('\n') {
        Some(idx) => idx + 1,
        None => return Err(FrontmatterError("unterminated frontmatter block".into())),
    };

    let rest = &trimmed[after_open..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = rest[offset + line.len()..].trim_start_matches('\n');
            return Ok((Some(yaml), body));
        }
        offset += line.len();
    }
    Err(FrontmatterError("unterminated frontmatter block".into()))
}

/// Parse a raw YAML frontmatter block into a typed spec.
pub fn parse<T: DeserializeOwned>(yaml: &str) -> Result<T, FrontmatterError> {
    serde_yaml::from_str(yaml).map_err(|err| FrontmatterError(err.to_string()))
}

/// Parse a whole document into `(spec, body)`.
///
/// A missing frontmatter block parses as the empty mapping so specs whose
/// fields are all optional still load.
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
) -> Result<(T, String), FrontmatterError> {
    let (yaml, body) = split(content)?;
    let spec = parse(yaml.unwrap_or("{}"))?;
    Ok((spec, body.to_string()))
}

/// Reassemble a document from a typed spec and body.
///
/// The spec serializes with its preserved unknown keys, so
/// `render(parse_document(doc))` keeps user annotations.
pub fn render<T: Serialize>(spec: &T, body: &str) -> Result<String, FrontmatterError> {
    let yaml = serde_yaml::to_string(spec).map_err(|err| FrontmatterError(err.to_string()))?;
    let mut out = String::with_capacity(yaml.len() + body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(yaml.trim_end());
    out.push('\n');
    out.push_str(DELIMITER);
    out.push('\n');
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}
