use regex::Regex;

pub const HEADER: &str = "#EXTM3U";
const METADATA_MARKER: &str = "#EXTINF:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub display_name: String,
    /// Original metadata line, kept verbatim for lossless re-emission.
    pub metadata_line: String,
    pub category: Option<String>,
    pub address: String,
}

#[derive(Debug, Default)]
pub struct ParsedPlaylist {
    pub entries: Vec<ChannelEntry>,
    /// Metadata lines that never got an address line.
    pub dropped: usize,
}

pub fn parse(body: &str) -> ParsedPlaylist {
    let category_re = Regex::new(r#"group-title="([^"]*)""#).unwrap();

    let mut entries = Vec::new();
    let mut dropped = 0usize;
    let mut pending: Option<(String, String, Option<String>)> = None;

    for line in body.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(METADATA_MARKER) {
            if pending.take().is_some() {
                dropped += 1;
            }

            let display_name = split_display_name(rest)
                .filter(|name| !name.is_empty())
                .unwrap_or(line)
                .to_string();
            let category = category_re
                .captures(line)
                .map(|caps| caps[1].to_string())
                .filter(|value| !value.is_empty());

            pending = Some((display_name, line.to_string(), category));
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((display_name, metadata_line, category)) = pending.take() {
            entries.push(ChannelEntry {
                display_name,
                metadata_line,
                category,
                address: line.to_string(),
            });
        }
    }

    if pending.is_some() {
        dropped += 1;
    }

    ParsedPlaylist { entries, dropped }
}

/// Everything after the first comma outside quotes; attribute values may
/// contain commas.
fn split_display_name(rest: &str) -> Option<&str> {
    let mut in_quotes = false;

    for (idx, ch) in rest.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some(rest[idx + 1..].trim()),
            _ => {}
        }
    }

    None
}

pub fn render(entries: &[ChannelEntry]) -> String {
    let mut out = String::with_capacity(
        header_len() + entries.iter().map(entry_len).sum::<usize>(),
    );
    out.push_str(HEADER);
    out.push('\n');

    for entry in entries {
        out.push_str(&entry.metadata_line);
        out.push('\n');
        out.push_str(&entry.address);
        out.push('\n');
    }

    out
}

pub fn header_len() -> usize {
    HEADER.len() + 1
}

/// Serialized byte cost of one entry, line terminators included.
pub fn entry_len(entry: &ChannelEntry) -> usize {
    entry.metadata_line.len() + entry.address.len() + 2
}
