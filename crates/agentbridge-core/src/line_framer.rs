// SPDX-License-Identifier: MIT
//! Incremental LF-delimited line splitter for a byte stream decoded as UTF-8.

/// Splits successive byte chunks on `\n`, retaining a trailing partial line
/// across calls. Empty lines (after trimming) are discarded silently.
/// `\r\n` is handled only incidentally, via trimming the trailing `\r`.
#[derive(Debug, Default)]
pub struct LineFramer {
    remainder: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, lossily decoded as UTF-8. Returns the complete
    /// trimmed non-empty lines found, in order. Any trailing partial line is
    /// retained for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.remainder.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(pos) = self.remainder.find('\n') {
            let line: String = self.remainder.drain(..=pos).collect();
            let trimmed = line.trim_end_matches(['\n', '\r']).trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        lines
    }

    /// Flush the outstanding remainder, if it forms a non-empty line. Call
    /// once at EOF; the returned line (if any) should be treated the same as
    /// one returned from `push`.
    pub fn flush(&mut self) -> Option<String> {
        let trimmed = self.remainder.trim().to_string();
        self.remainder.clear();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let mut f = LineFramer::new();
        let lines = f.push(b"one\ntwo\nthree\n");
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn retains_partial_line_across_calls() {
        let mut f = LineFramer::new();
        assert!(f.push(b"partial").is_empty());
        let lines = f.push(b" line\n");
        assert_eq!(lines, vec!["partial line"]);
    }

    #[test]
    fn discards_empty_lines() {
        let mut f = LineFramer::new();
        let lines = f.push(b"one\n\n\ntwo\n");
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn handles_crlf_via_trim() {
        let mut f = LineFramer::new();
        let lines = f.push(b"one\r\ntwo\r\n");
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn chunk_split_mid_line_reassembles() {
        let mut f = LineFramer::new();
        assert!(f.push(b"hel").is_empty());
        assert!(f.push(b"lo wor").is_empty());
        let lines = f.push(b"ld\n");
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn flush_returns_outstanding_remainder() {
        let mut f = LineFramer::new();
        f.push(b"no newline at end");
        assert_eq!(f.flush().as_deref(), Some("no newline at end"));
        assert_eq!(f.flush(), None);
    }

    #[test]
    fn flush_on_empty_remainder_is_none() {
        let mut f = LineFramer::new();
        f.push(b"complete\n");
        assert_eq!(f.flush(), None);
    }
}
