//! Single-range `Range` header resolution.
//!
//! Only `bytes=<start>-<end>` with a mandatory start is honored. Anything
//! else, including suffix ranges (`bytes=-N`) and multi-range lists, is
//! treated as if no header had been sent and the whole object is served.
//! The only request that fails is a well-formed range starting at or past
//! the end of the object.

use axum::http::StatusCode;

/// Body of the 416 response.
pub const RANGE_NOT_SATISFIABLE_MESSAGE: &str = "Requested Range Not Satisfiable";

/// Contiguous byte window of an object, `end` inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl Window {
    /// The whole object. For an empty object the window is empty.
    pub fn whole(total: u64) -> Self {
        Self {
            start: 0,
            end: total.saturating_sub(1),
            total,
        }
    }

    /// Number of bytes in the window.
    pub fn len(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Content-Range` header value: `bytes <start>-<end>/<total>`.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// How a request's `Range` header resolved against an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable range: serve everything with 200.
    Whole(Window),
    /// Serve the window with 206.
    Partial(Window),
    /// The range starts at or beyond the end: 416.
    Unsatisfiable { total: u64 },
}

impl RangeOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Whole(_) => StatusCode::OK,
            Self::Partial(_) => StatusCode::PARTIAL_CONTENT,
            Self::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }

    /// The window to serve, `None` when unsatisfiable.
    pub fn window(&self) -> Option<Window> {
        match self {
            Self::Whole(w) | Self::Partial(w) => Some(*w),
            Self::Unsatisfiable { .. } => None,
        }
    }
}

/// Resolve a raw `Range` header value against an object of `total` bytes.
pub fn resolve(header: Option<&str>, total: u64) -> RangeOutcome {
    let Some((start, end)) = header.and_then(parse_single_range) else {
        return RangeOutcome::Whole(Window::whole(total));
    };
    if start >= total {
        return RangeOutcome::Unsatisfiable { total };
    }

    let last = total - 1;
    let end = match end {
        Some(end) if end >= start => end.min(last),
        // An end before the start is ignored rather than rejected.
        _ => last,
    };
    RangeOutcome::Partial(Window { start, end, total })
}

/// Parse `bytes=<start>-<end>` where `end` may be empty.
fn parse_single_range(value: &str) -> Option<(u64, Option<u64>)> {
    let ranges = value.trim().strip_prefix("bytes=")?;
    let (start, end) = ranges.split_once('-')?;
    let start = parse_digits(start)?;
    let end = if end.is_empty() {
        None
    } else {
        Some(parse_digits(end)?)
    };
    Some((start, end))
}

/// All-digit input always parses; values past `u64::MAX` saturate.
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u64::MAX))
}
