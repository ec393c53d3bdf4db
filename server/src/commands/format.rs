//! Reply formatting.

use warden_common::Member;

use crate::permissions::MarkedMember;
use crate::settings::AuthConfig;

pub(super) fn member_line(marked: &MarkedMember) -> String {
    format!("  + {} for {}", marked.name, marked.remaining)
}

/// Owner's display name if they are in the roster, else the raw ID.
pub(super) fn owner_label(config: &AuthConfig, roster: &[Member]) -> String {
    roster
        .iter()
        .find(|member| member.id == config.owner)
        .map_or_else(|| config.owner.to_string(), |member| member.name.clone())
}

/// Join reply lines into as few messages as possible, none longer than
/// `limit` characters. A line longer than `limit` is split.
#[must_use]
pub fn pack_into_messages(lines: &[String], limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        for piece in split_line(line, limit) {
            let piece_len = piece.chars().count();
            let needed = if current.is_empty() { piece_len } else { current_len + 1 + piece_len };
            if needed > limit && !current.is_empty() {
                messages.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

fn split_line(line: &str, limit: usize) -> Vec<&str> {
    if line.chars().count() <= limit {
        return vec![line];
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (index, _) in line.char_indices() {
        if count == limit {
            pieces.push(&line[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&line[start..]);
    pieces
}
