//! Protocol line classification
//!
//! Every line the engine emits is classified once into a [`LineKind`] and
//! then routed. Observers match on the variant instead of re-inspecting the
//! raw text.

use crate::config::ProtocolConfig;

/// Payload of a terminal search line such as `bestmove e2e4 ponder e7e5`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// The answer token (second field), if the line carried one
    pub best: Option<String>,

    /// The token following a `ponder` keyword, if present
    pub ponder: Option<String>,

    /// The full line as received
    pub raw: String,
}

/// What a single protocol line means to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// The handshake has completed
    HandshakeTerminator,

    /// A search finished
    SearchAnswer(Answer),

    /// Any other output (id lines, info lines, option listings...)
    Other(String),
}

impl LineKind {
    /// Classify one line using the configured tokens
    pub fn classify(line: &str, protocol: &ProtocolConfig) -> Self {
        let line = line.trim();
        if line == protocol.ready_terminator {
            return Self::HandshakeTerminator;
        }

        let mut tokens = line.split_whitespace();
        if tokens.next() == Some(protocol.answer_prefix.as_str()) {
            let best = tokens.next().map(str::to_string);
            let ponder = tokens
                .skip_while(|token| *token != "ponder")
                .nth(1)
                .map(str::to_string);
            return Self::SearchAnswer(Answer {
                best,
                ponder,
                raw: line.to_string(),
            });
        }

        Self::Other(line.to_string())
    }

    /// Whether this line ends the handshake
    pub fn is_handshake_terminator(&self) -> bool {
        matches!(self, Self::HandshakeTerminator)
    }

    /// Whether this line ends a search
    pub fn is_search_answer(&self) -> bool {
        matches!(self, Self::SearchAnswer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn answer(best: Option<&str>, ponder: Option<&str>, raw: &str) -> LineKind {
        LineKind::SearchAnswer(Answer {
            best: best.map(str::to_string),
            ponder: ponder.map(str::to_string),
            raw: raw.to_string(),
        })
    }

    #[rstest]
    #[case("uciok", LineKind::HandshakeTerminator)]
    #[case("  uciok\r", LineKind::HandshakeTerminator)]
    #[case("bestmove e2e4", answer(Some("e2e4"), None, "bestmove e2e4"))]
    #[case(
        "bestmove g1f3 ponder d7d5",
        answer(Some("g1f3"), Some("d7d5"), "bestmove g1f3 ponder d7d5")
    )]
    #[case("bestmove", answer(None, None, "bestmove"))]
    #[case("bestmove (none)", answer(Some("(none)"), None, "bestmove (none)"))]
    #[case("bestmoves e2e4", LineKind::Other("bestmoves e2e4".to_string()))]
    #[case("info depth 2 pv e2e4", LineKind::Other("info depth 2 pv e2e4".to_string()))]
    #[case("id name Blunder", LineKind::Other("id name Blunder".to_string()))]
    fn test_classify_uci(#[case] line: &str, #[case] expected: LineKind) {
        assert_eq!(LineKind::classify(line, &ProtocolConfig::default()), expected);
    }

    #[test]
    fn test_classify_custom_tokens() {
        let protocol = ProtocolConfig::default()
            .with_handshake("usi", "usiok")
            .with_answer_prefix("answer");

        assert!(LineKind::classify("usiok", &protocol).is_handshake_terminator());
        assert!(!LineKind::classify("uciok", &protocol).is_handshake_terminator());
        assert!(LineKind::classify("answer 7g7f", &protocol).is_search_answer());
        assert!(!LineKind::classify("bestmove 7g7f", &protocol).is_search_answer());
    }
}
