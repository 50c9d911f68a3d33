//! Normalization of free-text `hello` fields.
//!
//! The room layer assumes its inputs are already clean; these helpers are
//! what makes that true. They never fail: bad input degrades to a default.

use crate::types::{CapacityValue, RoomMeta};

/// Longest lobby name kept, in characters.
pub const MAX_LOBBY_NAME_CHARS: usize = 60;

/// Smallest advertised capacity.
pub const MIN_CAPACITY: u32 = 1;

/// Largest advertised capacity.
pub const MAX_CAPACITY: u32 = 16;

/// Trims and truncates a lobby name.
///
/// Returns `None` for a missing or blank name, meaning "keep whatever
/// name the room has now".
pub fn lobby_name(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_LOBBY_NAME_CHARS).collect())
}

/// Turns a client-supplied capacity into an advertised one.
///
/// Takes the integer part of a number, or the leading integer of a
/// string (`"12 players"` → 12), and clamps it to
/// [`MIN_CAPACITY`]`..=`[`MAX_CAPACITY`]. Anything unparseable becomes
/// [`RoomMeta::DEFAULT_CAPACITY`].
pub fn capacity(raw: &CapacityValue) -> u32 {
    let parsed = match raw {
        CapacityValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        CapacityValue::Number(_) => None,
        CapacityValue::Text(s) => leading_integer(s),
        CapacityValue::Other(_) => None,
    };
    match parsed {
        Some(n) => n.clamp(MIN_CAPACITY as i64, MAX_CAPACITY as i64) as u32,
        None => RoomMeta::DEFAULT_CAPACITY,
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate absurdly long digit runs; they clamp to the max anyway.
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
