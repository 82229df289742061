//! Splitting normalized text into entry blocks.

use tracing::debug;

use super::rules::library::PatternLibrary;
use super::rules::patterns::ENTRY_HEADER_WORD;

/// A contiguous text fragment believed to hold one shift record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryBlock {
    /// Byte offset of the block in the segmented text.
    pub offset: usize,
    pub text: String,
}

/// Entry blocks plus the text that precedes the first of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Text before the first date; never an entry on its own.
    pub preamble: Option<String>,
    pub blocks: Vec<EntryBlock>,
}

/// Split text into entry blocks.
///
/// The first date pattern (library order) with any match wins; each of its
/// matches starts a block running to the next match. Text before the first
/// date is the preamble. Without dates, lines mentioning a driver or name
/// start blocks. Text with neither is one block.
pub fn segment(text: &str, library: &PatternLibrary) -> Segmentation {
    if text.trim().is_empty() {
        return Segmentation::default();
    }

    for pattern in &library.dates {
        let starts: Vec<usize> = pattern.regex.find_iter(text).map(|m| m.start()).collect();
        if starts.is_empty() {
            continue;
        }

        debug!("Segmenting on {:?} dates: {} blocks", pattern.layout, starts.len());
        let blocks = starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(text.len());
                EntryBlock {
                    offset: start,
                    text: text[start..end].trim().to_string(),
                }
            })
            .collect();

        return Segmentation {
            preamble: non_empty(&text[..starts[0]]),
            blocks,
        };
    }

    let by_lines = segment_lines(text, library);
    if !by_lines.blocks.is_empty() {
        debug!("Segmenting on entry header lines: {} blocks", by_lines.blocks.len());
        return by_lines;
    }

    debug!("No entry boundaries found, using whole text as one block");
    Segmentation {
        preamble: None,
        blocks: vec![EntryBlock {
            offset: 0,
            text: text.trim().to_string(),
        }],
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Group lines: a header line opens a block, following lines join it.
///
/// Lines before the first header line form a block of their own. Returns no
/// blocks when no line is a header.
fn segment_lines(text: &str, library: &PatternLibrary) -> Segmentation {
    let mut blocks: Vec<(usize, Vec<&str>)> = Vec::new();
    let mut headers = 0;
    let mut offset = 0;

    for raw_line in text.split('\n') {
        let line_offset = offset;
        offset += raw_line.len() + 1;

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let opens_block = ENTRY_HEADER_WORD.is_match(line)
            || library.dates.iter().any(|p| p.regex.is_match(line));
        if opens_block {
            headers += 1;
        } else if let Some((_, lines)) = blocks.last_mut() {
            lines.push(line);
            continue;
        }
        blocks.push((line_offset, vec![line]));
    }

    if headers == 0 {
        return Segmentation::default();
    }

    Segmentation {
        preamble: None,
        blocks: blocks
            .into_iter()
            .map(|(offset, lines)| EntryBlock {
                offset,
                text: lines.join(" "),
            })
            .collect(),
    }
}
