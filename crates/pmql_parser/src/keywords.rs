/// Keywords recognized by the tokenizer.
///
/// Keyword matching is case-sensitive; `null` is a keyword, `Null` is an
/// ordinary word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    IF,
    NULL,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        match word {
            "if" => Some(Keyword::IF),
            "null" => Some(Keyword::NULL),
            _ => None,
        }
    }
}
