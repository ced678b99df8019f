//! # Lexer for AVR assembly

use logos::Logos;

/// Tokens for AVR assembly
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace (not newlines)
#[logos(skip r"[;#][^\n]*")] // Skip comments
pub enum Token {
    /// Identifier (instruction mnemonics, labels)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Register r0-r31
    #[regex(r"[rR]([0-9]|[12][0-9]|3[01])", |lex| lex.slice()[1..].parse::<u8>().ok(), priority = 10)]
    Register(u8),

    /// Decimal number
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse().ok())]
    Number(i64),

    /// Hexadecimal number
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    Hex(i64),

    /// Binary number
    #[regex(r"0[bB][01]+", |lex| i64::from_str_radix(&lex.slice()[2..], 2).ok())]
    Binary(i64),

    /// Directive (.org, .word)
    #[regex(r"\.[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Directive(String),

    /// Comma
    #[token(",")]
    Comma,

    /// Colon (for labels)
    #[token(":")]
    Colon,

    /// Newline
    #[regex(r"\n")]
    Newline,
}

impl Token {
    /// Numeric value of any number literal
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Token::Number(n) | Token::Hex(n) | Token::Binary(n) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_registers() {
        let mut lex = Token::lexer("r0 r16 R31");
        assert_eq!(lex.next(), Some(Ok(Token::Register(0))));
        assert_eq!(lex.next(), Some(Ok(Token::Register(16))));
        assert_eq!(lex.next(), Some(Ok(Token::Register(31))));
    }

    #[test]
    fn test_lexer_register_lookalikes() {
        // Longest match wins, so these are identifiers
        let mut lex = Token::lexer("r32 ret r16x");
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("r32".to_string()))));
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("ret".to_string()))));
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("r16x".to_string()))));
    }

    #[test]
    fn test_lexer_numbers() {
        let mut lex = Token::lexer("42 -10 0x1A 0b1010");
        assert_eq!(lex.next(), Some(Ok(Token::Number(42))));
        assert_eq!(lex.next(), Some(Ok(Token::Number(-10))));
        assert_eq!(lex.next(), Some(Ok(Token::Hex(0x1A))));
        assert_eq!(lex.next(), Some(Ok(Token::Binary(0b1010))));
    }

    #[test]
    fn test_lexer_directive() {
        let mut lex = Token::lexer(".org .word");
        assert_eq!(lex.next(), Some(Ok(Token::Directive("org".to_string()))));
        assert_eq!(lex.next(), Some(Ok(Token::Directive("word".to_string()))));
    }

    #[test]
    fn test_lexer_label_and_instruction() {
        let mut lex = Token::lexer("loop: push r16 ; save\nldi r24, 0xFF");
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("loop".to_string()))));
        assert_eq!(lex.next(), Some(Ok(Token::Colon)));
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("push".to_string()))));
        assert_eq!(lex.next(), Some(Ok(Token::Register(16))));
        assert_eq!(lex.next(), Some(Ok(Token::Newline)));
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("ldi".to_string()))));
        assert_eq!(lex.next(), Some(Ok(Token::Register(24))));
        assert_eq!(lex.next(), Some(Ok(Token::Comma)));
        assert_eq!(lex.next(), Some(Ok(Token::Hex(0xFF))));
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn test_lexer_rejects_unknown_character() {
        let mut lex = Token::lexer("push @");
        assert_eq!(lex.next(), Some(Ok(Token::Identifier("push".to_string()))));
        assert!(matches!(lex.next(), Some(Err(_))));
    }
}
