//! Tokens of the type-signature language (`Int -> (Char, Bool)`, `Num a => a -> a`).

use lachs::Span;

#[lachs::token]
pub enum Token {
    #[literal("[a-zA-Z_][a-zA-Z0-9_']*")]
    Ident,
    #[terminal("->")]
    Arrow,
    #[terminal("=>")]
    FatArrow,
    #[terminal(",")]
    Comma,
    #[terminal("(")]
    LParen,
    #[terminal(")")]
    RParen,
    #[terminal("[")]
    LBracket,
    #[terminal("]")]
    RBracket,
}

impl Token {
    pub fn pos(&self) -> Span {
        match self {
            Token::Ident(inner) => inner.position.clone(),
            Token::Arrow(inner) => inner.position.clone(),
            Token::FatArrow(inner) => inner.position.clone(),
            Token::Comma(inner) => inner.position.clone(),
            Token::LParen(inner) => inner.position.clone(),
            Token::RParen(inner) => inner.position.clone(),
            Token::LBracket(inner) => inner.position.clone(),
            Token::RBracket(inner) => inner.position.clone(),
        }
    }

    /// Returns a human-readable description of the token
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(inner) => format!("identifier '{}'", inner.value),
            Token::Arrow(_) => "'->'".to_string(),
            Token::FatArrow(_) => "'=>'".to_string(),
            Token::Comma(_) => "','".to_string(),
            Token::LParen(_) => "'('".to_string(),
            Token::RParen(_) => "')'".to_string(),
            Token::LBracket(_) => "'['".to_string(),
            Token::RBracket(_) => "']'".to_string(),
        }
    }
}
