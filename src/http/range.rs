//! HTTP Range request parsing module
//!
//! Single byte-range parsing for partial downloads (RFC 7233).

/// Inclusive byte range resolved against a known file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[inline]
    pub const fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this range
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{file_size}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Serve only this slice with 206
    Satisfiable(ByteRange),
    /// Syntactically valid but outside the file, answer 416
    NotSatisfiable,
    /// Absent, malformed, multi-range or non-byte unit: serve the whole file
    Ignored,
}

/// Parse a `Range` header value against `file_size`
///
/// Accepts `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::Ignored;
    };

    if spec.contains(',') {
        return RangeParseResult::Ignored;
    }

    let Some((first, last)) = spec.split_once('-') else {
        return RangeParseResult::Ignored;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        suffix_range(last, file_size)
    } else {
        bounded_range(first, last, file_size)
    }
}

/// `-N`: the final N bytes
fn suffix_range(suffix: &str, file_size: u64) -> RangeParseResult {
    let Ok(suffix) = suffix.parse::<u64>() else {
        return RangeParseResult::Ignored;
    };
    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Satisfiable(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// `S-` or `S-E`, with E clamped to the last byte
fn bounded_range(first: &str, last: &str, file_size: u64) -> RangeParseResult {
    let Ok(start) = first.parse::<u64>() else {
        return RangeParseResult::Ignored;
    };
    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if last.is_empty() {
        file_size - 1
    } else {
        let Ok(end) = last.parse::<u64>() else {
            return RangeParseResult::Ignored;
        };
        end.min(file_size - 1)
    };

    if start > end {
        return RangeParseResult::NotSatisfiable;
    }
    RangeParseResult::Satisfiable(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfiable(header: &str, size: u64) -> ByteRange {
        match parse_range_header(Some(header), size) {
            RangeParseResult::Satisfiable(r) => r,
            other => panic!("expected satisfiable range for {header}, got {other:?}"),
        }
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeParseResult::Ignored);
    }

    #[test]
    fn test_bounded_range() {
        let r = satisfiable("bytes=0-9", 100);
        assert_eq!((r.start, r.end, r.length()), (0, 9, 10));
        assert_eq!(r.content_range(100), "bytes 0-9/100");
    }

    #[test]
    fn test_open_range() {
        let r = satisfiable("bytes=50-", 100);
        assert_eq!((r.start, r.end, r.length()), (50, 99, 50));
    }

    #[test]
    fn test_end_is_clamped() {
        let r = satisfiable("bytes=90-500", 100);
        assert_eq!((r.start, r.end), (90, 99));
    }

    #[test]
    fn test_suffix_range() {
        let r = satisfiable("bytes=-20", 100);
        assert_eq!((r.start, r.end), (80, 99));

        let r = satisfiable("bytes=-500", 100);
        assert_eq!((r.start, r.end), (0, 99));
    }

    #[test]
    fn test_not_satisfiable() {
        for header in ["bytes=200-", "bytes=100-100", "bytes=9-3", "bytes=-0"] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                RangeParseResult::NotSatisfiable,
                "{header}"
            );
        }
        assert_eq!(
            parse_range_header(Some("bytes=-5"), 0),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_ignored_forms() {
        for header in ["bytes=a-b", "bytes=0-9,20-29", "items=0-9", "bytes=5"] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                RangeParseResult::Ignored,
                "{header}"
            );
        }
    }
}
