use logos::Logos;

/// The category of a [`Token`]. Carries no payload; the lexeme itself lives in
/// `Token::text` so keywords, punctuation and literals share one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Tilde,

    // operators, bare and compound-assignment forms
    Bang,
    BangEq,
    Eq,
    EqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Minus,
    MinusMinus,
    MinusEq,
    Plus,
    PlusPlus,
    PlusEq,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Caret,
    CaretEq,
    Amp,
    AmpEq,
    Pipe,
    PipeEq,

    // literals and names
    Identifier,
    String,
    Number,
    True,
    False,

    // keywords
    KwBool,
    KwChar,
    KwInt,
    KwLong,
    KwVoid,
    KwReturn,
    KwIf,
    KwElse,
    KwFor,
    KwWhile,
    KwAnd,
    KwOr,
    KwPrint,
    AtNative,
}

/// A single lexeme: its kind, raw source text, and 1-based source line.
///
/// `text` is the verbatim slice from source — for `String` tokens this
/// includes the surrounding quote characters, left for the parser to strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Extras {
    pub line: usize,
    pub unterminated_string: bool,
}

impl Default for Extras {
    fn default() -> Self {
        Self {
            line: 1,
            unterminated_string: false,
        }
    }
}

fn newline_cb(lex: &mut logos::Lexer<RawToken>) -> logos::Skip {
    lex.extras.line += 1;
    logos::Skip
}

fn string_cb(lex: &mut logos::Lexer<RawToken>) {
    let rem = lex.remainder();
    let bytes = rem.as_bytes();
    let mut i = 0;
    loop {
        if i >= bytes.len() {
            lex.extras.unterminated_string = true;
            break;
        }
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => {
                lex.extras.unterminated_string = true;
                break;
            }
            b'"' => {
                i += 1;
                lex.bump(i);
                return;
            }
            _ => i += 1,
        }
    }
    lex.bump(i.min(bytes.len()));
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(extras = Extras)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
pub(crate) enum RawToken {
    #[token("\n", newline_cb)]
    Newline,

    #[token("\"", string_cb)]
    StringLit,

    #[regex("[0-9]+")]
    Number,

    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[token("bool")]
    KwBool,
    #[token("char")]
    KwChar,
    #[token("int")]
    KwInt,
    #[token("long")]
    KwLong,
    #[token("void")]
    KwVoid,
    #[token("return")]
    KwReturn,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("for")]
    KwFor,
    #[token("while")]
    KwWhile,
    #[token("and")]
    KwAnd,
    #[token("or")]
    KwOr,
    #[token("print")]
    KwPrint,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token("@native")]
    AtNative,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token("~")]
    Tilde,

    #[token("!=")]
    BangEq,
    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("--")]
    MinusMinus,
    #[token("-=")]
    MinusEq,
    #[token("-")]
    Minus,
    #[token("++")]
    PlusPlus,
    #[token("+=")]
    PlusEq,
    #[token("+")]
    Plus,
    #[token("*=")]
    StarEq,
    #[token("*")]
    Star,
    #[token("/=")]
    SlashEq,
    #[token("/")]
    Slash,
    #[token("%=")]
    PercentEq,
    #[token("%")]
    Percent,
    #[token("^=")]
    CaretEq,
    #[token("^")]
    Caret,
    #[token("&=")]
    AmpEq,
    #[token("&")]
    Amp,
    #[token("|=")]
    PipeEq,
    #[token("|")]
    Pipe,
}

impl RawToken {
    pub(crate) fn is_string(&self) -> bool {
        matches!(self, RawToken::StringLit)
    }
}

impl From<&RawToken> for TokenKind {
    fn from(raw: &RawToken) -> Self {
        match raw {
            RawToken::Newline => unreachable!("newline is skipped, never converted"),
            RawToken::StringLit => TokenKind::String,
            RawToken::Number => TokenKind::Number,
            RawToken::Identifier => TokenKind::Identifier,
            RawToken::KwBool => TokenKind::KwBool,
            RawToken::KwChar => TokenKind::KwChar,
            RawToken::KwInt => TokenKind::KwInt,
            RawToken::KwLong => TokenKind::KwLong,
            RawToken::KwVoid => TokenKind::KwVoid,
            RawToken::KwReturn => TokenKind::KwReturn,
            RawToken::KwIf => TokenKind::KwIf,
            RawToken::KwElse => TokenKind::KwElse,
            RawToken::KwFor => TokenKind::KwFor,
            RawToken::KwWhile => TokenKind::KwWhile,
            RawToken::KwAnd => TokenKind::KwAnd,
            RawToken::KwOr => TokenKind::KwOr,
            RawToken::KwPrint => TokenKind::KwPrint,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::AtNative => TokenKind::AtNative,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::BangEq => TokenKind::BangEq,
            RawToken::Bang => TokenKind::Bang,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::Eq => TokenKind::Eq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::MinusMinus => TokenKind::MinusMinus,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::Minus => TokenKind::Minus,
            RawToken::PlusPlus => TokenKind::PlusPlus,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::Plus => TokenKind::Plus,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::Star => TokenKind::Star,
            RawToken::SlashEq => TokenKind::SlashEq,
            RawToken::Slash => TokenKind::Slash,
            RawToken::PercentEq => TokenKind::PercentEq,
            RawToken::Percent => TokenKind::Percent,
            RawToken::CaretEq => TokenKind::CaretEq,
            RawToken::Caret => TokenKind::Caret,
            RawToken::AmpEq => TokenKind::AmpEq,
            RawToken::Amp => TokenKind::Amp,
            RawToken::PipeEq => TokenKind::PipeEq,
            RawToken::Pipe => TokenKind::Pipe,
        }
    }
}

