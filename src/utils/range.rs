/// Outcome of parsing a `Range` request header against a known blob size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No (or malformed) Range header: serve the whole blob.
    Full,
    /// A single satisfiable range, inclusive byte offsets.
    Partial { start: u64, end: u64 },
    /// Syntactically valid but outside the blob: respond 416.
    Unsatisfiable,
}

/// Parse a single-range `bytes=` header. Multi-range requests fall back to
/// the full representation, which HTTP permits.
pub fn parse_range(header: Option<&str>, total_size: u64) -> ByteRange {
    let Some(header) = header else {
        return ByteRange::Full;
    };
    let Some(spec) = header.strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    if total_size == 0 {
        return ByteRange::Unsatisfiable;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return ByteRange::Full;
    };

    match (start_str.is_empty(), end_str.is_empty()) {
        // "bytes=-500": final N bytes
        (true, false) => match end_str.parse::<u64>() {
            Ok(0) | Err(_) => ByteRange::Unsatisfiable,
            Ok(suffix) => {
                let start = total_size.saturating_sub(suffix);
                ByteRange::Partial {
                    start,
                    end: total_size - 1,
                }
            }
        },
        // "bytes=500-": from offset to the end
        (false, true) => match start_str.parse::<u64>() {
            Ok(start) if start < total_size => ByteRange::Partial {
                start,
                end: total_size - 1,
            },
            _ => ByteRange::Unsatisfiable,
        },
        // "bytes=500-999"
        (false, false) => match (start_str.parse::<u64>(), end_str.parse::<u64>()) {
            (Ok(start), Ok(end)) if start <= end && start < total_size => ByteRange::Partial {
                start,
                end: end.min(total_size - 1),
            },
            (Ok(_), Ok(_)) => ByteRange::Unsatisfiable,
            _ => ByteRange::Full,
        },
        (true, true) => ByteRange::Full,
    }
}
