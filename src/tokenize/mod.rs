/// Tokenizer seam: splits raw shard text into a lazy sequence of word
/// tokens. The segmentation algorithm itself (e.g. a dictionary-based
/// word segmenter) is an external collaborator; [`LineTokenizer`] is the
/// built-in implementation for pre-split one-word-per-line input.
///
/// A designated delimiter token marks original record boundaries in the
/// token stream. The stream is finite and consumed exactly once per shard.

/// Token that marks an original record boundary.
pub const RECORD_DELIMITER: &str = "\n";

pub trait Tokenizer: Send + Sync {
    /// Lazily tokenize `text`, yielding word tokens interleaved with
    /// [`RECORD_DELIMITER`] tokens at record boundaries.
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a>;
}

/// Splits on `\n`, yielding each line as one token followed by a delimiter
/// token. Uses memchr for SIMD boundary detection; `\n` is ASCII so byte
/// offsets are always char boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineTokenizer;

impl Tokenizer for LineTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new(LineTokens {
            text,
            pos: 0,
            delimiter_pending: false,
        })
    }
}

struct LineTokens<'a> {
    text: &'a str,
    pos: usize,
    delimiter_pending: bool,
}

impl Iterator for LineTokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.delimiter_pending {
            self.delimiter_pending = false;
            return Some(RECORD_DELIMITER.to_string());
        }
        if self.pos >= self.text.len() {
            return None;
        }
        match memchr::memchr(b'\n', &self.text.as_bytes()[self.pos..]) {
            Some(0) => {
                // Empty line: emit the delimiter alone
                self.pos += 1;
                Some(RECORD_DELIMITER.to_string())
            }
            Some(off) => {
                let word = self.text[self.pos..self.pos + off].to_string();
                self.pos += off + 1;
                self.delimiter_pending = true;
                Some(word)
            }
            None => {
                // Final token without a trailing delimiter
                let word = self.text[self.pos..].to_string();
                self.pos = self.text.len();
                Some(word)
            }
        }
    }
}
