use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizationError {
    #[error("Tokenizer unavailable: {0}")]
    Unavailable(String),
    #[error("Tokenizer rejected input: {0}")]
    Rejected(String),
}

/// Exact, model-specific tokenization supplied by the caller.
pub trait TokenCounter {
    fn count_tokens(&self, content: &str) -> Result<usize, TokenizationError>;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count_tokens(&self, content: &str) -> Result<usize, TokenizationError> {
        (**self).count_tokens(content)
    }
}

/// Weight, in length units, of one character from a non-Latin script.
///
/// Four units make such a character cost a full token, where Latin text
/// averages four characters per token.
pub const NON_LATIN_CHAR_WEIGHT: usize = 4;

/// Approximate GPT-style tokenization
/// tokens(content) := ceil(units(content) / 4)
///
/// `units` is the UTF-8 byte length, except characters in the non-Latin
/// blocks of [`is_non_latin`] which weigh [`NON_LATIN_CHAR_WEIGHT`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproxTokenCounter;

impl TokenCounter for ApproxTokenCounter {
    fn count_tokens(&self, content: &str) -> Result<usize, TokenizationError> {
        Ok(approx_tokens(content))
    }
}

/// The character heuristic; also the fallback when a tokenizer fails.
pub fn approx_tokens(content: &str) -> usize {
    if content.is_ascii() {
        // Integer division ceil(len / 4) equivalent to (len + 4 - 1) / 4
        return (content.len() + 3) / 4;
    }

    let units: usize = content
        .chars()
        .map(|c| {
            if is_non_latin(c) {
                NON_LATIN_CHAR_WEIGHT
            } else {
                c.len_utf8()
            }
        })
        .sum();
    (units + 3) / 4
}

/// Scripts that tokenizers split far more finely than Latin text.
pub fn is_non_latin(c: char) -> bool {
    matches!(
        c as u32,
        0x0400..=0x04FF // Cyrillic
            | 0x0590..=0x05FF // Hebrew
            | 0x0600..=0x06FF // Arabic
            | 0x0900..=0x097F // Devanagari
            | 0x0E00..=0x0E7F // Thai
            | 0x1100..=0x11FF // Hangul Jamo
            | 0x3000..=0x303F // CJK punctuation
            | 0x3040..=0x30FF // Hiragana, Katakana
            | 0x3400..=0x4DBF // CJK extension A
            | 0x4E00..=0x9FFF // CJK unified ideographs
            | 0xAC00..=0xD7AF // Hangul syllables
            | 0xF900..=0xFAFF // CJK compatibility ideographs
            | 0xFF00..=0xFFEF // Halfwidth and fullwidth forms
            | 0x20000..=0x2FA1F // CJK extensions B-F, supplement
    )
}
