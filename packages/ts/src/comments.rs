//! Comment ranges and leading-comment lookup.

/// A comment in the source text. `pos` points at the opening `//` or `/*` and `end` is
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRange {
    pub pos: u32,
    pub end: u32,
    pub is_multi_line: bool,
}

impl CommentRange {
    pub fn new(pos: u32, end: u32, is_multi_line: bool) -> Self {
        CommentRange {
            pos,
            end,
            is_multi_line,
        }
    }

    /// Builds a range from a span that may or may not include the comment delimiters.
    /// Returns `None` when no comment delimiter is found at or just before `start`.
    pub fn from_span(source: &str, start: u32, end: u32) -> Option<Self> {
        let bytes = source.as_bytes();
        let opens_at = |at: usize| -> Option<bool> {
            match bytes.get(at..at + 2) {
                Some(b"//") => Some(false),
                Some(b"/*") => Some(true),
                _ => None,
            }
        };
        let (start, end) = (start as usize, end as usize);
        if let Some(is_multi_line) = opens_at(start) {
            return Some(CommentRange::new(start as u32, end as u32, is_multi_line));
        }
        let start = start.checked_sub(2)?;
        let is_multi_line = opens_at(start)?;
        let end = if is_multi_line && !source.get(..end).is_some_and(|text| text.ends_with("*/")) {
            (end + 2).min(source.len())
        } else {
            end
        };
        Some(CommentRange::new(start as u32, end as u32, is_multi_line))
    }

    pub fn get_text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.pos as usize..self.end as usize)
            .unwrap_or("")
    }
}

/// Leading comments of the token at `pos`: the run of comments that precede it with
/// nothing but whitespace in between. `comments` must be sorted by position.
pub fn get_leading_comments_from_cache(
    comments: &[CommentRange],
    pos: u32,
    source: &str,
) -> Vec<CommentRange> {
    let mut idx = comments.partition_point(|c| c.end <= pos);
    let mut result = Vec::new();
    let mut check_pos = pos as usize;

    while idx > 0 {
        let comment = comments[idx - 1];
        let between = source.get(comment.end as usize..check_pos).unwrap_or("x");
        if !between.chars().all(char::is_whitespace) {
            break;
        }
        result.push(comment);
        check_pos = comment.pos as usize;
        idx -= 1;
    }

    result.reverse();
    result
}
