//! UTF-8-safe clipping for rendered notification blocks.
//!
//! Byte-indexed slicing panics when the cut lands inside a multi-byte
//! character, and every clip length in this layer is a byte budget. These
//! helpers snap the cut back to the nearest char boundary.

/// Clip `s` to at most `max_bytes` bytes without splitting a character.
#[inline]
#[must_use]
pub fn clip(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Clip `s` to `max_bytes` and mark the cut with `...` when anything was
/// dropped. The result never exceeds `max_bytes` bytes.
#[must_use]
pub fn clip_with_ellipsis(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let budget = max_bytes.saturating_sub(3);
    format!("{}...", clip(s, budget))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
