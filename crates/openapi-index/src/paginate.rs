//! Chunking of long rendered text
//!
//! Offsets are character (Unicode scalar) positions, so a chunk boundary
//! never falls inside a multi-byte character.

use serde::{Deserialize, Serialize};

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 8000;

/// How far past the naive end a smart break may reach
const LOOKAHEAD: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginateOptions {
    pub start_index: usize,
    pub chunk_size: usize,
    /// Prefer ending a chunk at a structural boundary near the naive end
    pub smart_breaks: bool,
}

impl Default for PaginateOptions {
    fn default() -> Self {
        Self {
            start_index: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            smart_breaks: true,
        }
    }
}

/// One chunk of a longer text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult {
    pub content: String,
    pub start_index: usize,
    pub end_index: usize,
    pub total_length: usize,
    pub has_more: bool,
    pub has_previous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_index: Option<usize>,
    /// Human-readable position summary with navigation hints
    pub footer: String,
}

/// Cut `text` into the chunk starting at `options.start_index`
pub fn paginate(text: &str, options: &PaginateOptions) -> PaginatedResult {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let chunk_size = options.chunk_size.max(1);

    if total <= chunk_size {
        return PaginatedResult {
            content: text.to_string(),
            start_index: 0,
            end_index: total,
            total_length: total,
            has_more: false,
            has_previous: false,
            next_index: None,
            prev_index: None,
            footer: format!("[Complete: {} characters]", total),
        };
    }

    let start = options.start_index;
    if start >= total {
        let prev = total.saturating_sub(chunk_size);
        return PaginatedResult {
            content: String::new(),
            start_index: start,
            end_index: start,
            total_length: total,
            has_more: false,
            has_previous: true,
            next_index: None,
            prev_index: Some(prev),
            footer: format!(
                "[No content at startIndex={}: text is {} characters. Use startIndex={} for the last chunk.]",
                start, total, prev
            ),
        };
    }

    let naive_end = (start + chunk_size).min(total);
    let end = if options.smart_breaks && naive_end < total {
        find_break(&chars, start, naive_end, chunk_size).unwrap_or(naive_end)
    } else {
        naive_end
    };

    let has_more = end < total;
    let has_previous = start > 0;
    let next_index = has_more.then_some(end);
    let prev_index = has_previous.then(|| start.saturating_sub(chunk_size));

    let mut footer = format!("[Showing characters {}-{} of {}", start, end, total);
    if let Some(prev) = prev_index {
        footer.push_str(&format!(". Use startIndex={} for previous content", prev));
    }
    if let Some(next) = next_index {
        footer.push_str(&format!(". Use startIndex={} to continue", next));
    }
    footer.push(']');

    PaginatedResult {
        content: chars[start..end].iter().collect(),
        start_index: start,
        end_index: end,
        total_length: total,
        has_more,
        has_previous,
        next_index,
        prev_index,
        footer,
    }
}

/// Break point categories, most preferred first. Each returns the position
/// just past the break when one starts at `i`.
const BREAKS: [fn(&[char], usize) -> Option<usize>; 5] = [
    |c, i| (c.get(i) == Some(&'}') && c.get(i + 1) == Some(&',')).then_some(i + 2),
    |c, i| (c.get(i) == Some(&']') && c.get(i + 1) == Some(&',')).then_some(i + 2),
    end_of_property,
    |c, i| (c.get(i) == Some(&'\n') && c.get(i + 1) == Some(&'\n')).then_some(i + 2),
    |c, i| (c.get(i) == Some(&'\n')).then_some(i + 1),
];

/// `,\n` followed by optional indentation and a quote
fn end_of_property(chars: &[char], i: usize) -> Option<usize> {
    if chars.get(i) != Some(&',') || chars.get(i + 1) != Some(&'\n') {
        return None;
    }
    let mut j = i + 2;
    while matches!(chars.get(j), Some(' ') | Some('\t')) {
        j += 1;
    }
    (chars.get(j) == Some(&'"')).then_some(i + 2)
}

/// Closest break to `naive_end` in the first category that has one at all
fn find_break(chars: &[char], start: usize, naive_end: usize, chunk_size: usize) -> Option<usize> {
    let reach_back = chunk_size * 4 / 5;
    let window_start = naive_end.saturating_sub(reach_back).max(start + 1);
    let window_end = (naive_end + LOOKAHEAD).min(chars.len());

    BREAKS.iter().find_map(|category| {
        (window_start.saturating_sub(2)..window_end)
            .filter_map(|i| category(chars, i))
            .filter(|pos| (window_start..=window_end).contains(pos))
            .min_by_key(|pos| pos.abs_diff(naive_end))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(start_index: usize, chunk_size: usize, smart_breaks: bool) -> PaginateOptions {
        PaginateOptions {
            start_index,
            chunk_size,
            smart_breaks,
        }
    }

    /// Follow `next_index` from the start and glue the chunks back together
    fn reassemble(text: &str, chunk_size: usize, smart_breaks: bool) -> String {
        let mut out = String::new();
        let mut start = 0;
        loop {
            let page = paginate(text, &options(start, chunk_size, smart_breaks));
            out.push_str(&page.content);
            match page.next_index {
                Some(next) => {
                    assert!(next > start);
                    start = next;
                }
                None => return out,
            }
        }
    }

    #[test]
    fn test_short_text_is_returned_whole() {
        let page = paginate("hello", &PaginateOptions::default());
        assert_eq!(page.content, "hello");
        assert!(!page.has_more);
        assert!(!page.has_previous);
        assert_eq!(page.footer, "[Complete: 5 characters]");
    }

    #[test]
    fn test_chunks_cover_text_without_smart_breaks() {
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        assert_eq!(reassemble(&text, 64, false), text);

        let page = paginate(&text, &options(64, 64, false));
        assert_eq!(page.start_index, 64);
        assert_eq!(page.end_index, 128);
        assert_eq!(page.prev_index, Some(0));
        assert_eq!(page.next_index, Some(128));
        assert!(page.footer.contains("startIndex=128"));
    }

    #[test]
    fn test_chunks_cover_json_with_smart_breaks() {
        let items: Vec<_> = (0..200)
            .map(|i| json!({"id": i, "name": format!("item {}", i), "tags": ["a", "b"]}))
            .collect();
        let text = serde_json::to_string_pretty(&json!({ "items": items })).unwrap();
        assert_eq!(reassemble(&text, 500, true), text);
    }

    #[test]
    fn test_earlier_category_beats_closer_break() {
        let text = "0123456789},abcdefghij\nklmnopqrstuvwxyz";
        let page = paginate(text, &options(0, 20, true));
        assert_eq!(page.content, "0123456789},");
        assert_eq!(page.next_index, Some(12));
    }

    #[test]
    fn test_closest_break_within_category() {
        let text = "ab\ncdefgh\nijklmnopqr\nstuvwxyz0123456789";
        let page = paginate(text, &options(0, 12, true));
        assert_eq!(page.content, "ab\ncdefgh\n");
    }

    #[test]
    fn test_offsets_count_characters() {
        let text = "é".repeat(10);
        let page = paginate(&text, &options(0, 4, false));
        assert_eq!(page.content, "éééé");
        assert_eq!(page.total_length, 10);
        assert_eq!(page.next_index, Some(4));
    }

    #[test]
    fn test_start_past_end_is_empty() {
        let text = "x".repeat(30);
        let page = paginate(&text, &options(50, 10, true));
        assert!(page.content.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.total_length, 30);
        assert!(page.footer.contains("startIndex=20"));
    }
}
