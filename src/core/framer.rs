// Framer module - splits the inbound byte stream into delimiter-terminated lines

use memchr::memmem;

/// Accumulates raw inbound bytes and hands out complete lines in arrival order.
///
/// The delimiter is independent of the EOL used for outbound commands. A `\r`
/// left in front of a `\n` delimiter is kept here and removed when the line is
/// rendered.
#[derive(Debug, Clone)]
pub struct LineFramer {
    buffer: Vec<u8>,
    delimiter: Vec<u8>,
}

impl LineFramer {
    pub fn new(delimiter: &[u8]) -> Self {
        assert!(!delimiter.is_empty(), "line delimiter must not be empty");
        Self {
            buffer: Vec::new(),
            delimiter: delimiter.to_vec(),
        }
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn has_complete_line(&self) -> bool {
        memmem::find(&self.buffer, &self.delimiter).is_some()
    }

    /// Remove and return the bytes before the first delimiter, consuming the
    /// delimiter as well.
    pub fn extract_line(&mut self) -> Option<Vec<u8>> {
        let pos = memmem::find(&self.buffer, &self.delimiter)?;
        let line = self.buffer[..pos].to_vec();
        self.buffer.drain(..pos + self.delimiter.len());
        Some(line)
    }

    /// Bytes received but not yet terminated by a delimiter.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extracts_lines_in_order() {
        let mut framer = LineFramer::default();
        framer.feed(b"hello\r\nworld\npart");

        assert!(framer.has_complete_line());
        assert_eq!(framer.extract_line().as_deref(), Some(&b"hello\r"[..]));
        assert_eq!(framer.extract_line().as_deref(), Some(&b"world"[..]));
        assert_eq!(framer.extract_line(), None);
        assert!(!framer.has_complete_line());
        assert_eq!(framer.pending(), b"part");
    }

    #[test]
    fn test_line_split_across_feeds() {
        let mut framer = LineFramer::default();
        framer.feed(b"abc");
        assert_eq!(framer.extract_line(), None);
        framer.feed(b"def\n");
        assert_eq!(framer.extract_line().as_deref(), Some(&b"abcdef"[..]));
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn test_multi_byte_delimiter_split_across_feeds() {
        let mut framer = LineFramer::new(b"\r\n");
        framer.feed(b"ok\r");
        assert!(!framer.has_complete_line());
        framer.feed(b"\nnext\n");
        assert_eq!(framer.extract_line().as_deref(), Some(&b"ok"[..]));
        assert_eq!(framer.extract_line(), None);
        assert_eq!(framer.pending(), b"next\n");
    }

    #[test]
    fn test_empty_lines_are_yielded() {
        let mut framer = LineFramer::new(b"\r");
        framer.feed(b"\r\rx\r");
        assert_eq!(framer.extract_line().as_deref(), Some(&b""[..]));
        assert_eq!(framer.extract_line().as_deref(), Some(&b""[..]));
        assert_eq!(framer.extract_line().as_deref(), Some(&b"x"[..]));
        assert_eq!(framer.extract_line(), None);
    }

    proptest! {
        #[test]
        fn prop_framing_round_trips(
            chunks in proptest::collection::vec(
                proptest::collection::vec(prop_oneof![Just(b'\n'), Just(b'\r'), any::<u8>()], 0..32),
                0..8,
            )
        ) {
            let original: Vec<u8> = chunks.concat();
            let delimiter_count = original.iter().filter(|b| **b == b'\n').count();

            let mut framer = LineFramer::default();
            let mut lines = Vec::new();
            for chunk in &chunks {
                framer.feed(chunk);
                while let Some(line) = framer.extract_line() {
                    lines.push(line);
                }
            }

            prop_assert_eq!(lines.len(), delimiter_count);
            let mut rebuilt = Vec::new();
            for line in &lines {
                rebuilt.extend_from_slice(line);
                rebuilt.push(b'\n');
            }
            rebuilt.extend_from_slice(framer.pending());
            prop_assert_eq!(rebuilt, original);
        }
    }
}
