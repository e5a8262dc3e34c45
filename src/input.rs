/// Tokens split from the shared input field.
///
/// Splitting happens on the single space character only, so empty tokens from leading,
/// trailing or repeated spaces are kept and `join` reproduces the original text exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence(Vec<String>);

impl TokenSequence {
    /// Never fails. Empty input yields a single empty token.
    pub fn parse(raw: &str) -> Self {
        Self(raw.split(' ').map(str::to_string).collect())
    }

    pub fn join(&self) -> String {
        self.0.join(" ")
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for TokenSequence {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl<'a> FromIterator<&'a str> for TokenSequence {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_single_spaces() {
        let tokens = TokenSequence::parse("3 1 2");
        assert_eq!(tokens.tokens(), ["3", "1", "2"]);
        assert_eq!(tokens.join(), "3 1 2");
    }

    #[test]
    fn empty_input_is_one_empty_token() {
        let tokens = TokenSequence::parse("");
        assert_eq!(tokens.tokens(), [""]);
        assert_eq!(tokens.len(), 1);
        assert!(!tokens.is_empty());
        assert_eq!(tokens.join(), "");
    }

    #[test]
    fn keeps_empty_tokens_from_edge_and_repeated_spaces() {
        assert_eq!(TokenSequence::parse(" 1 2").tokens(), ["", "1", "2"]);
        assert_eq!(TokenSequence::parse("1  2 ").tokens(), ["1", "", "2", ""]);
        assert_eq!(TokenSequence::parse(" 1 2").join(), " 1 2");
        assert_eq!(TokenSequence::parse("1  2 ").join(), "1  2 ");
    }

    #[test]
    fn other_whitespace_is_not_a_delimiter() {
        assert_eq!(TokenSequence::parse("a\tb\nc").tokens(), ["a\tb\nc"]);
    }

    #[test]
    fn collects_from_str_iterators() {
        let tokens: TokenSequence = ["c", "b", "a"].into_iter().collect();
        assert_eq!(tokens.into_vec(), vec!["c", "b", "a"]);
    }
}
