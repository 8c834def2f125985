use serde::Serialize;

/// Accumulated answer text for one session.
///
/// Upstream tokens are chunked without separators, so a space is restored
/// between two chunks only when both sides of the seam are ASCII
/// alphanumeric. The first chunk of a session is preceded by a newline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnswerText {
    text: String,
    #[serde(skip)]
    last_char: Option<char>,
}

impl AnswerText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a streamed chunk and return exactly what was added to the text.
    ///
    /// An empty chunk leaves no last character behind, so the chunk after it
    /// starts on a new line again.
    pub fn push_chunk(&mut self, chunk: &str) -> String {
        let first = chunk.chars().next();

        let addition = match (self.last_char, first) {
            (None, _) => format!("\n{chunk}"),
            (Some(last), Some(first))
                if last.is_ascii_alphanumeric() && first.is_ascii_alphanumeric() =>
            {
                format!(" {chunk}")
            }
            (Some(_), _) => chunk.to_string(),
        };

        self.text.push_str(&addition);
        self.last_char = chunk.chars().last();
        addition
    }

    /// Append text that is not a streamed chunk (markers, separators).
    pub fn push_raw(&mut self, raw: &str) {
        self.text.push_str(raw);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.last_char = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(chunks: &[&str]) -> String {
        let mut answer = AnswerText::new();
        for chunk in chunks {
            answer.push_chunk(chunk);
        }
        answer.as_str().to_string()
    }

    #[test]
    fn first_chunk_gets_leading_newline() {
        assert_eq!(fold(&["Hello"]), "\nHello");
        assert_eq!(fold(&[", world"]), "\n, world");
    }

    #[test]
    fn alphanumeric_seam_gets_one_space() {
        assert_eq!(fold(&["Hello", "world"]), "\nHello world");
        assert_eq!(fold(&["abc1", "2def"]), "\nabc1 2def");
    }

    #[test]
    fn punctuation_or_whitespace_seam_gets_nothing() {
        assert_eq!(fold(&["Hello", ", world"]), "\nHello, world");
        assert_eq!(fold(&["Hello.", "Next"]), "\nHello.Next");
        assert_eq!(fold(&["Hello ", "world"]), "\nHello world");
        assert_eq!(fold(&["<p>", "text", "</p>"]), "\n<p>text</p>");
    }

    #[test]
    fn non_ascii_letters_do_not_count_as_alphanumeric() {
        assert_eq!(fold(&["café", "au"]), "\ncaféau");
        assert_eq!(fold(&["voce", "é"]), "\nvoceé");
    }

    #[test]
    fn empty_chunk_restarts_the_seam() {
        let mut answer = AnswerText::new();
        answer.push_chunk("a");
        assert_eq!(answer.push_chunk(""), "");
        assert_eq!(answer.push_chunk("b"), "\nb");
        assert_eq!(answer.as_str(), "\na\nb");
    }

    #[test]
    fn empty_first_chunk_still_gets_newline() {
        let mut answer = AnswerText::new();
        assert_eq!(answer.push_chunk(""), "\n");
        assert_eq!(answer.as_str(), "\n");
        assert_eq!(fold(&["", "x"]), "\n\nx");
    }

    #[test]
    fn raw_text_does_not_affect_the_seam() {
        let mut answer = AnswerText::new();
        answer.push_chunk("word");
        answer.push_raw("\n\n");
        assert_eq!(answer.push_chunk("next"), " next");
    }

    #[test]
    fn clear_restarts_the_session() {
        let mut answer = AnswerText::new();
        answer.push_chunk("one");
        answer.clear();
        assert_eq!(answer.push_chunk("two"), "\ntwo");
    }
}
