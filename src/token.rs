use strum_macros::{Display, EnumDiscriminants};

#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(derive(Hash, Display))]
#[strum_discriminants(name(TokenType))]
pub enum Token {
    Illegal(u8),
    Eof,

    // Identifiers and literals
    Ident(String),
    Int(String),
    String(String),

    // Operators
    Assign,
    Plus,
    Minus,
    Slash,
    Asterisk,
    Bang,
    LT,
    GT,
    Eq,
    NotEq,

    // Delimiters
    Comma,
    Semicolon,

    LParen,
    RParen,
    LBrace,
    RBrace,

    // Keywords
    Else,
    False,
    Function,
    If,
    Let,
    Return,
    True,
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        match text {
            "let" => Self::Let,
            "fn" => Self::Function,
            "if" => Self::If,
            "return" => Self::Return,
            "true" => Self::True,
            "else" => Self::Else,
            "false" => Self::False,
            identifier => Self::Ident(identifier.to_owned()),
        }
    }
}

impl Token {
    pub fn is(&self, token_type: TokenType) -> bool {
        TokenType::from(self) == token_type
    }

    pub fn token_type(&self) -> TokenType {
        TokenType::from(self)
    }

    /// The source text this token was scanned from.
    pub fn literal(&self) -> String {
        match self {
            Self::Illegal(c) => (*c as char).to_string(),
            Self::Eof => "".to_owned(),
            Self::Ident(s) | Self::Int(s) | Self::String(s) => s.clone(),
            Self::Assign => "=".to_owned(),
            Self::Plus => "+".to_owned(),
            Self::Minus => "-".to_owned(),
            Self::Slash => "/".to_owned(),
            Self::Asterisk => "*".to_owned(),
            Self::Bang => "!".to_owned(),
            Self::LT => "<".to_owned(),
            Self::GT => ">".to_owned(),
            Self::Eq => "==".to_owned(),
            Self::NotEq => "!=".to_owned(),
            Self::Comma => ",".to_owned(),
            Self::Semicolon => ";".to_owned(),
            Self::LParen => "(".to_owned(),
            Self::RParen => ")".to_owned(),
            Self::LBrace => "{".to_owned(),
            Self::RBrace => "}".to_owned(),
            Self::Else => "else".to_owned(),
            Self::False => "false".to_owned(),
            Self::Function => "fn".to_owned(),
            Self::If => "if".to_owned(),
            Self::Let => "let".to_owned(),
            Self::Return => "return".to_owned(),
            Self::True => "true".to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        let cases = [
            ("let", Token::Let),
            ("fn", Token::Function),
            ("if", Token::If),
            ("else", Token::Else),
            ("return", Token::Return),
            ("true", Token::True),
            ("false", Token::False),
            ("lettuce", Token::Ident("lettuce".to_owned())),
        ];

        for (text, token) in cases.iter() {
            assert_eq!(Token::from(*text), *token);
        }
    }

    #[test]
    fn test_literal_round_trips_keywords() {
        for keyword in ["let", "fn", "if", "else", "return", "true", "false"].iter() {
            assert_eq!(Token::from(*keyword).literal(), *keyword);
        }
    }

    #[test]
    fn test_token_type() {
        assert!(Token::Ident("x".to_owned()).is(TokenType::Ident));
        assert_eq!(Token::Int("5".to_owned()).token_type(), TokenType::Int);
        assert_eq!(TokenType::RParen.to_string(), "RParen");
    }
}
