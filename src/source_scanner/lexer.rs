//! Per-line tokenizer shared by every line scanner.

/// A token of Java source text.
///
/// Dotted names are kept together (`Response.Status.NOT_FOUND` is one `Word`), string
/// literals keep their contents, comments produce nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Str(String),
    Number(String),
    Char,
    /// `@Name` or `@pkg.Name`; `@interface` lexes as `Annotation("interface")`
    Annotation(String),
    Punct(char),
}

impl Token {
    pub fn word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_word(&self, expected: &str) -> bool {
        matches!(self, Token::Word(w) if w == expected)
    }

    pub fn is_punct(&self, expected: char) -> bool {
        matches!(self, Token::Punct(c) if *c == expected)
    }
}

/// Tokenizer carrying block-comment state from one line to the next.
#[derive(Debug, Default)]
pub struct Lexer {
    in_block_comment: bool,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokenize(&mut self, line: &str) -> Vec<Token> {
        let chars: Vec<char> = line.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if self.in_block_comment {
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    self.in_block_comment = false;
                    i += 2;
                } else {
                    i += 1;
                }
                continue;
            }

            let c = chars[i];
            let next = chars.get(i + 1).copied();
            match c {
                '/' if next == Some('/') => break,
                '/' if next == Some('*') => {
                    self.in_block_comment = true;
                    i += 2;
                }
                '"' => {
                    i += 1;
                    let mut literal = String::new();
                    while i < chars.len() {
                        match chars[i] {
                            '\\' => {
                                if let Some(escaped) = chars.get(i + 1) {
                                    literal.push(*escaped);
                                }
                                i += 2;
                            }
                            '"' => {
                                i += 1;
                                break;
                            }
                            other => {
                                literal.push(other);
                                i += 1;
                            }
                        }
                    }
                    tokens.push(Token::Str(literal));
                }
                '\'' => {
                    i += 1;
                    while i < chars.len() {
                        match chars[i] {
                            '\\' => i += 2,
                            '\'' => {
                                i += 1;
                                break;
                            }
                            _ => i += 1,
                        }
                    }
                    tokens.push(Token::Char);
                }
                '@' => {
                    i += 1;
                    while i < chars.len() && chars[i].is_whitespace() {
                        i += 1;
                    }
                    if i < chars.len() && is_identifier_start(chars[i]) {
                        tokens.push(Token::Annotation(read_identifier(&chars, &mut i)));
                    } else {
                        tokens.push(Token::Punct('@'));
                    }
                }
                c if is_identifier_start(c) => {
                    tokens.push(Token::Word(read_identifier(&chars, &mut i)));
                }
                c if c.is_ascii_digit() => {
                    let start = i;
                    while i < chars.len()
                        && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_')
                    {
                        i += 1;
                    }
                    tokens.push(Token::Number(chars[start..i].iter().collect()));
                }
                c if c.is_whitespace() => i += 1,
                other => {
                    tokens.push(Token::Punct(other));
                    i += 1;
                }
            }
        }

        tokens
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Reads a possibly dotted identifier. Whitespace around the dots is tolerated.
fn read_identifier(chars: &[char], i: &mut usize) -> String {
    let mut out = String::new();
    loop {
        while *i < chars.len() && is_identifier_part(chars[*i]) {
            out.push(chars[*i]);
            *i += 1;
        }

        let mut j = *i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if j < chars.len() && chars[j] == '.' {
            let mut k = j + 1;
            while k < chars.len() && chars[k].is_whitespace() {
                k += 1;
            }
            if k < chars.len() && is_identifier_start(chars[k]) {
                out.push('.');
                *i = k;
                continue;
            }
        }
        return out;
    }
}
