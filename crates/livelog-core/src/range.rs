//! Byte-range parsing for GET requests.

use thiserror::Error;

/// The end of an observer's range: either a fixed exclusive offset, or
/// open-ended (tail to the stream's eventual close).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// Deliver up to (but not including) this absolute offset.
    Bounded(u64),
    /// Deliver until the stream closes.
    Open,
}

impl Stop {
    /// Resolves against a known length, clamping a bounded stop to it.
    pub(crate) fn clamp(self, length: u64) -> u64 {
        match self {
            Stop::Bounded(stop) => stop.min(length),
            Stop::Open => length,
        }
    }
}

/// Why a `Range` header could not be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The header was present but not valid `bytes=...` syntax.
    #[error("malformed range header")]
    Malformed,
    /// More than one range was requested; only a single range is supported.
    #[error("multiple ranges are not supported")]
    MultiRange,
    /// `a-b` with `a > b`.
    #[error("range start must not exceed range end")]
    StartAfterEnd,
    /// `bytes=-n` (suffix length) is not resolvable against a live stream.
    #[error("suffix-length ranges are not supported")]
    SuffixUnsupported,
}

/// Parses a `Range` header value into `(start, stop)`.
///
/// A missing header means the whole stream: `(0, Stop::Open)`.
pub fn parse_range(header: Option<&str>) -> Result<(u64, Stop), RangeError> {
    let Some(raw) = header else {
        return Ok((0, Stop::Open));
    };
    let raw = raw.trim();
    let Some(spec) = raw.strip_prefix("bytes=") else {
        return Err(RangeError::Malformed);
    };
    if spec.is_empty() {
        return Err(RangeError::Malformed);
    }
    if spec.contains(',') {
        return Err(RangeError::MultiRange);
    }
    let Some((a, b)) = spec.split_once('-') else {
        return Err(RangeError::Malformed);
    };

    if a.is_empty() {
        if b.is_empty() {
            return Err(RangeError::Malformed);
        }
        let n: u64 = b.parse().map_err(|_| RangeError::Malformed)?;
        if n == 0 {
            return Err(RangeError::Malformed);
        }
        // Resolvable only against a closed stream's final length, which is
        // out of scope for this parser (see Design Notes); reject instead.
        return Err(RangeError::SuffixUnsupported);
    }

    let start: u64 = a.parse().map_err(|_| RangeError::Malformed)?;
    if b.is_empty() {
        return Ok((start, Stop::Open));
    }
    let end: u64 = b.parse().map_err(|_| RangeError::Malformed)?;
    if start > end {
        return Err(RangeError::StartAfterEnd);
    }
    Ok((start, Stop::Bounded(end + 1)))
}
