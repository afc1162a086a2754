//! Source map v3 generation.
//!
//! Segments are added line by line in output order and encoded as base64 VLQ deltas.

use indexmap::IndexMap;
use serde::Serialize;

const VERSION: u32 = 3;
const JS_B64_PREFIX: &str = "# sourceMappingURL=data:application/json;base64,";
const B64_DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone)]
struct Segment {
    col0: u32,
    source: Option<SourceLocation>,
}

#[derive(Debug, Clone, Copy)]
struct SourceLocation {
    index: usize,
    line0: u32,
    col0: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "sourceRoot")]
    pub source_root: String,
    pub sources: Vec<String>,
    #[serde(rename = "sourcesContent")]
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// `//# sourceMappingURL=data:...` comment embedding this map.
    pub fn to_js_comment(&self) -> Result<String, serde_json::Error> {
        Ok(format!("//{}{}", JS_B64_PREFIX, to_base64_string(&self.to_json()?)))
    }
}

#[derive(Debug)]
pub struct SourceMapGenerator {
    file: Option<String>,
    sources_content: IndexMap<String, Option<String>>,
    lines: Vec<Vec<Segment>>,
    last_col0: u32,
    has_mappings: bool,
}

impl SourceMapGenerator {
    pub fn new(file: Option<String>) -> Self {
        SourceMapGenerator {
            file,
            sources_content: IndexMap::new(),
            lines: Vec::new(),
            last_col0: 0,
            has_mappings: false,
        }
    }

    /// The content is `None` when the content is expected to be loaded using the URL
    pub fn add_source(&mut self, url: impl Into<String>, content: Option<String>) -> &mut Self {
        self.sources_content.entry(url.into()).or_insert(content);
        self
    }

    pub fn add_line(&mut self) -> &mut Self {
        self.lines.push(Vec::new());
        self.last_col0 = 0;
        self
    }

    pub fn add_mapping(
        &mut self,
        col0: u32,
        source_url: &str,
        source_line0: u32,
        source_col0: u32,
    ) -> Result<&mut Self, String> {
        let index = self
            .sources_content
            .get_index_of(source_url)
            .ok_or_else(|| format!("Unknown source file \"{}\"", source_url))?;
        if col0 < self.last_col0 {
            return Err("Mapping should be added in output order".to_string());
        }
        let line = self
            .lines
            .last_mut()
            .ok_or_else(|| "A line must be added before mappings can be added".to_string())?;
        line.push(Segment {
            col0,
            source: Some(SourceLocation {
                index,
                line0: source_line0,
                col0: source_col0,
            }),
        });
        self.has_mappings = true;
        self.last_col0 = col0;
        Ok(self)
    }

    pub fn to_json(&self) -> Option<SourceMap> {
        if !self.has_mappings {
            return None;
        }

        let mut mappings = String::new();
        let mut last_source_index = 0i64;
        let mut last_source_line0 = 0i64;
        let mut last_source_col0 = 0i64;

        for (line_index, segments) in self.lines.iter().enumerate() {
            if line_index > 0 {
                mappings.push(';');
            }
            let mut last_col0 = 0i64;
            for (segment_index, segment) in segments.iter().enumerate() {
                if segment_index > 0 {
                    mappings.push(',');
                }
                // zero-based starting column of the line in the generated code
                push_base64_vlq(&mut mappings, i64::from(segment.col0) - last_col0);
                last_col0 = i64::from(segment.col0);

                if let Some(source) = segment.source {
                    push_base64_vlq(&mut mappings, source.index as i64 - last_source_index);
                    last_source_index = source.index as i64;
                    push_base64_vlq(&mut mappings, i64::from(source.line0) - last_source_line0);
                    last_source_line0 = i64::from(source.line0);
                    push_base64_vlq(&mut mappings, i64::from(source.col0) - last_source_col0);
                    last_source_col0 = i64::from(source.col0);
                }
            }
        }

        Some(SourceMap {
            version: VERSION,
            file: self.file.clone(),
            source_root: String::new(),
            sources: self.sources_content.keys().cloned().collect(),
            sources_content: self.sources_content.values().cloned().collect(),
            names: Vec::new(),
            mappings,
        })
    }
}

pub fn to_base64_string(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut b64 = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let i1 = chunk[0];
        let i2 = chunk.get(1).copied();
        let i3 = chunk.get(2).copied();
        b64.push(to_base64_digit(i1 >> 2));
        b64.push(to_base64_digit(((i1 & 3) << 4) | (i2.unwrap_or(0) >> 4)));
        b64.push(match i2 {
            Some(i2) => to_base64_digit(((i2 & 15) << 2) | (i3.unwrap_or(0) >> 6)),
            None => '=',
        });
        b64.push(match (i2, i3) {
            (Some(_), Some(i3)) => to_base64_digit(i3 & 63),
            _ => '=',
        });
    }
    b64
}

fn push_base64_vlq(out: &mut String, value: i64) {
    let mut value = if value < 0 {
        ((-value) << 1) + 1
    } else {
        value << 1
    };

    loop {
        let mut digit = (value & 31) as u8;
        value >>= 5;
        if value > 0 {
            digit |= 32;
        }
        out.push(to_base64_digit(digit));
        if value == 0 {
            break;
        }
    }
}

fn to_base64_vlq(value: i64) -> String {
    let mut out = String::new();
    push_base64_vlq(&mut out, value);
    out
}

fn to_base64_digit(value: u8) -> char {
    debug_assert!(value < 64, "Can only encode value in the range [0, 63]");
    B64_DIGITS[usize::from(value & 63)] as char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_vlq_values() {
        assert_eq!(to_base64_vlq(0), "A");
        assert_eq!(to_base64_vlq(1), "C");
        assert_eq!(to_base64_vlq(-1), "D");
        assert_eq!(to_base64_vlq(16), "gB");
        assert_eq!(to_base64_vlq(-2147483648), "hgggggE");
    }

    #[test]
    fn encodes_base64_with_padding() {
        assert_eq!(to_base64_string("a"), "YQ==");
        assert_eq!(to_base64_string("ab"), "YWI=");
        assert_eq!(to_base64_string("abc"), "YWJj");
    }
}
