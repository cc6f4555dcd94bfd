use crate::token::Token;

pub struct Lexer {
    input: String,
    position: usize,
    read_position: usize,
    ch: u8,
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_token())
    }
}

impl Lexer {
    pub fn new(input: String) -> Self {
        let mut lexer = Self {
            input,
            position: 0,
            read_position: 0,
            ch: 0,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        self.ch = *self.input.as_bytes().get(self.read_position).unwrap_or(&0);
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        *self.input.as_bytes().get(self.read_position).unwrap_or(&0)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let token = match self.ch {
            b'=' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::Eq
                } else {
                    Token::Assign
                }
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Asterisk,
            b'/' => Token::Slash,
            b'!' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            b'<' => Token::LT,
            b'>' => Token::GT,
            b';' => Token::Semicolon,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b',' => Token::Comma,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            b'"' => Token::String(self.read_string().to_owned()),
            // Past the end `read_char` keeps yielding 0, so Eof repeats.
            0 if self.position >= self.input.len() => return Token::Eof,
            c => {
                if is_letter(c) {
                    return self.read_identifier().into();
                } else if c.is_ascii_digit() {
                    return Token::Int(self.read_number().to_owned());
                } else {
                    Token::Illegal(c)
                }
            }
        };
        self.read_char();
        token
    }

    fn read_identifier(&mut self) -> &str {
        let start = self.position;
        while is_letter(self.ch) {
            self.read_char()
        }
        &self.input[start..self.position]
    }

    fn read_number(&mut self) -> &str {
        let start = self.position;
        while self.ch.is_ascii_digit() {
            self.read_char()
        }
        &self.input[start..self.position]
    }

    /// Leaves `ch` on the closing quote, or on end of input when unterminated.
    fn read_string(&mut self) -> &str {
        let start = self.position + 1;
        loop {
            self.read_char();
            if self.ch == b'"' || self.position >= self.input.len() {
                break;
            }
        }
        &self.input[start..self.position.min(self.input.len())]
    }

    fn skip_whitespace(&mut self) {
        while self.ch.is_ascii_whitespace() {
            self.read_char();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::Ident(name.to_owned())
    }

    fn int(text: &str) -> Token {
        Token::Int(text.to_owned())
    }

    #[test]
    fn test_next_token() {
        let input = "let five = 5;
let ten = 10;

let add = fn(x, y) {
  x + y;
};

let result = add(five, ten);
!-/*5;
5 < 10 > 5;

if (5 < 10) {
    return true;
} else {
    return false;
}

10 == 10;
10 != 9;
\"foobar\"
\"foo bar\"
"
        .to_owned();

        let cases = vec![
            Token::Let,
            ident("five"),
            Token::Assign,
            int("5"),
            Token::Semicolon,
            Token::Let,
            ident("ten"),
            Token::Assign,
            int("10"),
            Token::Semicolon,
            Token::Let,
            ident("add"),
            Token::Assign,
            Token::Function,
            Token::LParen,
            ident("x"),
            Token::Comma,
            ident("y"),
            Token::RParen,
            Token::LBrace,
            ident("x"),
            Token::Plus,
            ident("y"),
            Token::Semicolon,
            Token::RBrace,
            Token::Semicolon,
            Token::Let,
            ident("result"),
            Token::Assign,
            ident("add"),
            Token::LParen,
            ident("five"),
            Token::Comma,
            ident("ten"),
            Token::RParen,
            Token::Semicolon,
            Token::Bang,
            Token::Minus,
            Token::Slash,
            Token::Asterisk,
            int("5"),
            Token::Semicolon,
            int("5"),
            Token::LT,
            int("10"),
            Token::GT,
            int("5"),
            Token::Semicolon,
            Token::If,
            Token::LParen,
            int("5"),
            Token::LT,
            int("10"),
            Token::RParen,
            Token::LBrace,
            Token::Return,
            Token::True,
            Token::Semicolon,
            Token::RBrace,
            Token::Else,
            Token::LBrace,
            Token::Return,
            Token::False,
            Token::Semicolon,
            Token::RBrace,
            int("10"),
            Token::Eq,
            int("10"),
            Token::Semicolon,
            int("10"),
            Token::NotEq,
            int("9"),
            Token::Semicolon,
            Token::String("foobar".to_owned()),
            Token::String("foo bar".to_owned()),
            Token::Eof,
        ];

        let lexer = Lexer::new(input);
        let tokens: Vec<Token> = lexer.take(cases.len()).collect();

        assert_eq!(tokens, cases);
    }

    #[test]
    fn test_eof_repeats() {
        let mut lexer = Lexer::new("x".to_owned());
        assert_eq!(lexer.next_token(), ident("x"));
        assert_eq!(lexer.next_token(), Token::Eof);
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let mut lexer = Lexer::new("\"abc".to_owned());
        assert_eq!(lexer.next_token(), Token::String("abc".to_owned()));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_illegal_character() {
        let mut lexer = Lexer::new("5 @ 3".to_owned());
        assert_eq!(lexer.next_token(), int("5"));
        assert_eq!(lexer.next_token(), Token::Illegal(b'@'));
        assert_eq!(lexer.next_token(), int("3"));
    }
}
