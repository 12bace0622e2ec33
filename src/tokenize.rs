/// Tokenization policy applied to each corpus line.
///
/// Stored as a plain function pointer on the loader so callers can swap in
/// their own policy without trait machinery.
pub type TokenizerFn = fn(&str) -> Vec<String>;

/// Default tokenizer: Unicode lowercase, then whitespace split.
///
/// Punctuation stripping is a corpus-preparation concern and happens before
/// files reach the loader, so none is done here.
pub fn default_tokenizer(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(default_tokenizer("good movie"), vec!["good", "movie"]);
    }

    #[test]
    fn lowercases() {
        assert_eq!(default_tokenizer("Good MOVIE"), vec!["good", "movie"]);
    }

    #[test]
    fn collapses_runs_of_whitespace() {
        assert_eq!(
            default_tokenizer("  ok \t film  "),
            vec!["ok", "film"]
        );
    }

    #[test]
    fn empty_line_yields_no_tokens() {
        assert!(default_tokenizer("").is_empty());
        assert!(default_tokenizer("   ").is_empty());
    }

    #[test]
    fn non_ascii_lowercase() {
        assert_eq!(default_tokenizer("TRÈS Bon"), vec!["très", "bon"]);
    }
}
