use crate::types::Frontmatter;
use serde_json::Value;
use std::collections::HashMap;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub metadata: Frontmatter,
    pub title: Option<String>,
    pub body: String,
}

/// A malformed front matter block is logged and yields empty metadata. The first
/// heading is reported as the title but stays in the body.
pub fn extract(raw: &str) -> Extracted {
    let normalized = raw.replace("\r\n", "\n");
    let text = normalized.trim();

    let (metadata, body) = match split_fence(text) {
        Some((block, rest)) => (decode(block), rest.trim().to_string()),
        None => (Frontmatter::default(), text.to_string()),
    };

    let title = heading_title(&body).or_else(|| metadata.get_string("title"));

    Extracted {
        metadata,
        title,
        body,
    }
}

fn split_fence(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let block_start = first.len();
    let mut position = block_start;

    for line in lines {
        if line.trim_end() == DELIMITER {
            let block = &text[block_start..position];
            let rest = &text[position + line.len()..];
            return Some((block, rest));
        }
        position += line.len();
    }

    None
}

fn decode(block: &str) -> Frontmatter {
    if block.trim().is_empty() {
        return Frontmatter::default();
    }

    match serde_yaml::from_str::<HashMap<String, Value>>(block) {
        Ok(raw) => Frontmatter { raw },
        Err(error) => {
            log::warn!("Ignoring malformed front matter: {error}");
            Frontmatter::default()
        }
    }
}

fn heading_title(body: &str) -> Option<String> {
    let first_line = body.lines().next()?;
    let text = first_line.trim_start_matches('#');
    if text.len() == first_line.len() || !text.starts_with([' ', '\t']) {
        return None;
    }

    let title = text.trim().trim_end_matches('#').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
