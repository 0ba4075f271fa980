use std::num::NonZeroU64;

/// How many occurrences a `SEARCH` replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    All,
    /// At most this many occurrences. Values beyond `u64` saturate.
    Limit(NonZeroU64),
}

impl Count {
    /// Parse a `count` attribute value: `all`, or ASCII digits denoting a
    /// value greater than zero. Signs, decimal points and whitespace are
    /// rejected.
    pub fn parse(value: &str) -> Option<Count> {
        if value == "all" {
            return Some(Count::All);
        }
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let limit = value
            .bytes()
            .fold(0u64, |acc, b| acc.saturating_mul(10).saturating_add(u64::from(b - b'0')));
        NonZeroU64::new(limit).map(Count::Limit)
    }
}
