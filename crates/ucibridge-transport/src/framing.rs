//! Stream-to-line reassembly
//!
//! Output arrives in chunks of arbitrary size with no line alignment. The
//! framer keeps the unterminated tail of the stream between chunks and
//! emits each completed line trimmed of surrounding whitespace. Blank lines
//! carry no meaning in the protocol and are never emitted.

/// Carry-over line framer
#[derive(Debug, Default)]
pub struct LineFramer {
    carry: Vec<u8>,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.carry[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            if let Some(line) = Self::complete(&self.carry[consumed..end]) {
                lines.push(line);
            }
            consumed = end + 1;
        }
        self.carry.drain(..consumed);

        lines
    }

    /// Flush the unterminated tail once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.carry);
        Self::complete(&tail)
    }

    /// Bytes currently held back waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.carry.len()
    }

    fn complete(segment: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(segment);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame_chunks(chunks: &[&str]) -> Vec<String> {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(framer.push(chunk.as_bytes()));
        }
        lines.extend(framer.finish());
        lines
    }

    #[test]
    fn test_single_chunk() {
        assert_eq!(frame_chunks(&["a\nb\nc\n"]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        assert_eq!(frame_chunks(&["\n\nfoo\n\n"]), vec!["foo"]);
    }

    #[test]
    fn test_carry_over_between_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"best").is_empty());
        assert_eq!(framer.pending_len(), 4);
        assert_eq!(framer.push(b"move e2e4\ninfo"), vec!["bestmove e2e4"]);
        assert_eq!(framer.pending_len(), 4);
        assert_eq!(framer.finish(), Some("info".to_string()));
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_crlf_and_surrounding_whitespace() {
        assert_eq!(
            frame_chunks(&["  id name X \r\n", "uciok\r", "\n"]),
            vec!["id name X", "uciok"]
        );
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let bytes = "id author Bj\u{f6}rn\n".as_bytes();
        let split = bytes.len() - 4;
        let mut framer = LineFramer::new();
        assert!(framer.push(&bytes[..split]).is_empty());
        assert_eq!(framer.push(&bytes[split..]), vec!["id author Bj\u{f6}rn"]);
    }

    #[test]
    fn test_whitespace_only_tail_is_dropped() {
        let mut framer = LineFramer::new();
        framer.push(b"uciok\n   ");
        assert_eq!(framer.finish(), None);
    }

    proptest! {
        /// Property: chunk boundaries never change the emitted lines
        #[test]
        fn prop_chunking_is_invisible(cuts in proptest::collection::vec(0usize..=6, 0..6)) {
            let input = b"a\nb\nc\n";
            let mut cuts = cuts;
            cuts.sort_unstable();

            let mut framer = LineFramer::new();
            let mut lines = Vec::new();
            let mut last = 0;
            for cut in cuts {
                lines.extend(framer.push(&input[last..cut]));
                last = cut;
            }
            lines.extend(framer.push(&input[last..]));

            prop_assert_eq!(lines, vec!["a", "b", "c"]);
            prop_assert_eq!(framer.pending_len(), 0);
        }

        /// Property: arbitrary non-blank lines survive arbitrary chunking
        #[test]
        fn prop_lines_roundtrip_through_chunks(
            lines in proptest::collection::vec("[a-z0-9][a-z0-9 ]{0,20}[a-z0-9]", 1..10),
            chunk_size in 1usize..16,
        ) {
            let joined = lines.join("\n") + "\n";
            let mut framer = LineFramer::new();
            let mut framed = Vec::new();
            for chunk in joined.as_bytes().chunks(chunk_size) {
                framed.extend(framer.push(chunk));
            }
            prop_assert_eq!(framed, lines);
        }
    }
}
