//! Compile-time moxie encoding proc-macros for
//! [`moxie-codec`](https://crates.io/crates/moxie-codec).
//!
//! Provides [`moxie_bytes!`] and [`moxie_array!`], which encode instructions
//! at compile time into byte constants with zero runtime overhead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use moxie_codec_macros::{moxie_array, moxie_bytes};
//!
//! // ldi.l $r1, 0xdeadbeef (big-endian)
//! const LOAD: &[u8] = moxie_bytes!(big, "ldi.l", 3, 0xDEADBEEF);
//!
//! // inc $r0, 1 ; ret (little-endian), instructions separated by `;`
//! const TAIL: [u8; 4] = moxie_array!(little, "inc", 2, 1; "ret");
//! ```

use proc_macro::{Delimiter, Group, Ident, Literal, Punct, Spacing, Span, TokenStream, TokenTree};

use moxie_codec::{encode_values, Endian};

/// Encode instructions at compile time, producing a `&'static [u8]`.
///
/// # Syntax
///
/// ```rust,ignore
/// moxie_bytes!(ENDIAN, "mnemonic", operand, operand; "mnemonic", ...)
/// ```
///
/// `ENDIAN` is `big` or `little`. Operands are integer literals (decimal,
/// `0x`, `0o` or `0b`, optionally negative) in assembler order, the way
/// [`moxie_codec::encode_values`] takes them.
///
/// # Compile-time errors
///
/// An unknown mnemonic or an operand that does not fit emits a
/// `compile_error!` carrying the encoder's message.
#[proc_macro]
pub fn moxie_bytes(input: TokenStream) -> TokenStream {
    match encode_input(input) {
        Ok(bytes) => bytes_to_slice_expr(&bytes),
        Err(err) => err.into_compile_error(),
    }
}

/// Encode instructions at compile time, producing a fixed-size `[u8; N]`.
///
/// Same syntax as [`moxie_bytes!`].
///
/// ```rust,ignore
/// use moxie_codec_macros::moxie_array;
///
/// const RET: [u8; 2] = moxie_array!(big, "ret");
/// ```
#[proc_macro]
pub fn moxie_array(input: TokenStream) -> TokenStream {
    match encode_input(input) {
        Ok(bytes) => bytes_to_array_expr(&bytes),
        Err(err) => err.into_compile_error(),
    }
}

// ─── Implementation ─────────────────────────────────────────────────────────

struct Statement {
    mnemonic: String,
    values: Vec<i64>,
    /// Span of the mnemonic literal for error reporting.
    span: Span,
}

type Tokens = std::iter::Peekable<proc_macro::token_stream::IntoIter>;

fn encode_input(input: TokenStream) -> Result<Vec<u8>, syn_free::Error> {
    let mut tokens = input.into_iter().peekable();

    let endian_tt = tokens
        .next()
        .ok_or_else(|| syn_free::Error::new("expected byte order (`big` or `little`)"))?;
    let endian = parse_endian(&endian_tt)?;
    expect_punct(&mut tokens, ',')?;

    let mut out = Vec::new();
    loop {
        let stmt = parse_statement(&mut tokens)?;
        let encoding = encode_values(&stmt.mnemonic, &stmt.values).map_err(|e| {
            syn_free::Error::with_span(stmt.span, &format!("moxie encoding error: {e}"))
        })?;
        encoding.write_to(&mut out, endian);

        match tokens.next() {
            None => break,
            Some(TokenTree::Punct(p)) if p.as_char() == ';' => {
                if tokens.peek().is_none() {
                    break;
                }
            }
            Some(other) => {
                return Err(syn_free::Error::with_span(
                    other.span(),
                    "expected `,` or `;`",
                ))
            }
        }
    }
    Ok(out)
}

fn parse_endian(tt: &TokenTree) -> Result<Endian, syn_free::Error> {
    let TokenTree::Ident(id) = tt else {
        return Err(syn_free::Error::with_span(
            tt.span(),
            "expected byte order (`big` or `little`)",
        ));
    };
    match id.to_string().as_str() {
        "big" => Ok(Endian::Big),
        "little" => Ok(Endian::Little),
        other => Err(syn_free::Error::with_span(
            tt.span(),
            &format!("unknown byte order `{other}`, expected: big, little"),
        )),
    }
}

/// `"mnemonic" (, int)*` up to the next `;` or the end of input.
fn parse_statement(tokens: &mut Tokens) -> Result<Statement, syn_free::Error> {
    let (mnemonic, span) = parse_string_literal(tokens)?;
    let mut values = Vec::new();
    while let Some(TokenTree::Punct(p)) = tokens.peek() {
        if p.as_char() != ',' {
            break;
        }
        tokens.next();
        values.push(parse_integer(tokens)?);
    }
    Ok(Statement {
        mnemonic,
        values,
        span,
    })
}

fn expect_punct(tokens: &mut Tokens, ch: char) -> Result<(), syn_free::Error> {
    match tokens.next() {
        Some(TokenTree::Punct(p)) if p.as_char() == ch => Ok(()),
        Some(other) => Err(syn_free::Error::with_span(
            other.span(),
            &format!("expected `{ch}`"),
        )),
        None => Err(syn_free::Error::new(&format!("expected `{ch}`"))),
    }
}

fn parse_string_literal(tokens: &mut Tokens) -> Result<(String, Span), syn_free::Error> {
    let tt = tokens
        .next()
        .ok_or_else(|| syn_free::Error::new("expected mnemonic string literal"))?;
    let TokenTree::Literal(lit) = &tt else {
        return Err(syn_free::Error::with_span(
            tt.span(),
            "expected mnemonic string literal",
        ));
    };
    let raw = lit.to_string();
    // Mnemonics never contain escapes, so only plain `"..."` is accepted.
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) if !inner.contains('\\') => Ok((inner.to_string(), tt.span())),
        _ => Err(syn_free::Error::with_span(
            tt.span(),
            "expected mnemonic string literal",
        )),
    }
}

/// An integer literal, optionally preceded by `-`.
fn parse_integer(tokens: &mut Tokens) -> Result<i64, syn_free::Error> {
    let mut tt = tokens
        .next()
        .ok_or_else(|| syn_free::Error::new("expected integer operand"))?;
    let negative = matches!(&tt, TokenTree::Punct(p) if p.as_char() == '-');
    if negative {
        tt = tokens
            .next()
            .ok_or_else(|| syn_free::Error::new("expected integer after `-`"))?;
    }
    let TokenTree::Literal(lit) = &tt else {
        return Err(syn_free::Error::with_span(tt.span(), "expected integer operand"));
    };
    let magnitude = parse_integer_literal(&lit.to_string())
        .ok_or_else(|| syn_free::Error::with_span(tt.span(), "invalid integer literal"))?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value)
        .map_err(|_| syn_free::Error::with_span(tt.span(), "integer operand out of range"))
}

fn parse_integer_literal(s: &str) -> Option<i128> {
    // `-1` arrives as one literal when forwarded through a `macro_rules!` `$lit`
    if let Some(rest) = s.strip_prefix('-') {
        return parse_integer_literal(rest).map(|v| -v);
    }
    let s = s.replace('_', "");
    let (digits, radix) = if let Some(h) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (h, 16)
    } else if let Some(o) = s.strip_prefix("0o") {
        (o, 8)
    } else if let Some(b) = s.strip_prefix("0b") {
        (b, 2)
    } else {
        (s.as_str(), 10)
    };
    if digits.is_empty() {
        return None;
    }
    i128::from_str_radix(digits, radix).ok()
}

fn byte_list(bytes: &[u8]) -> TokenTree {
    let mut list = TokenStream::new();
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 {
            list.extend([TokenTree::Punct(Punct::new(',', Spacing::Alone))]);
        }
        list.extend([TokenTree::Literal(Literal::u8_suffixed(b))]);
    }
    TokenTree::Group(Group::new(Delimiter::Bracket, list))
}

fn ident(name: &str) -> TokenTree {
    TokenTree::Ident(Ident::new(name, Span::call_site()))
}

fn punct(ch: char) -> TokenTree {
    TokenTree::Punct(Punct::new(ch, Spacing::Alone))
}

/// `{ const BYTES: <ty> = <value>; BYTES }`
fn const_block(ty: Vec<TokenTree>, value: Vec<TokenTree>) -> TokenStream {
    let mut body = TokenStream::new();
    body.extend([ident("const"), ident("BYTES"), punct(':')]);
    body.extend(ty);
    body.extend([punct('=')]);
    body.extend(value);
    body.extend([punct(';'), ident("BYTES")]);
    TokenStream::from(TokenTree::Group(Group::new(Delimiter::Brace, body)))
}

fn bytes_to_slice_expr(bytes: &[u8]) -> TokenStream {
    let u8_slice = TokenTree::Group(Group::new(
        Delimiter::Bracket,
        TokenStream::from(ident("u8")),
    ));
    const_block(
        vec![punct('&'), u8_slice],
        vec![punct('&'), byte_list(bytes)],
    )
}

fn bytes_to_array_expr(bytes: &[u8]) -> TokenStream {
    let mut array_ty = TokenStream::new();
    array_ty.extend([
        ident("u8"),
        punct(';'),
        TokenTree::Literal(Literal::usize_unsuffixed(bytes.len())),
    ]);
    const_block(
        vec![TokenTree::Group(Group::new(Delimiter::Bracket, array_ty))],
        vec![byte_list(bytes)],
    )
}

// ─── Minimal syn-free error type ─────────────────────────────────────────────
// The macro input is a flat list of literals, so it is parsed straight from
// `proc_macro::TokenStream` without `syn`.

mod syn_free {
    use proc_macro::{Delimiter, Group, Ident, Literal, Punct, Spacing, Span, TokenStream, TokenTree};

    pub struct Error {
        message: String,
        span: Option<Span>,
    }

    impl Error {
        pub fn new(msg: &str) -> Self {
            Self {
                message: msg.to_string(),
                span: None,
            }
        }

        pub fn with_span(span: Span, msg: &str) -> Self {
            Self {
                message: msg.to_string(),
                span: Some(span),
            }
        }

        /// `compile_error!("message")`, spanned at the offending token.
        pub fn into_compile_error(self) -> TokenStream {
            let span = self.span.unwrap_or_else(Span::call_site);
            let mut message = Literal::string(&self.message);
            message.set_span(span);
            let mut bang = Punct::new('!', Spacing::Alone);
            bang.set_span(span);
            let mut args = Group::new(Delimiter::Parenthesis, TokenStream::from(TokenTree::Literal(message)));
            args.set_span(span);
            [
                TokenTree::Ident(Ident::new("compile_error", span)),
                TokenTree::Punct(bang),
                TokenTree::Group(args),
            ]
            .into_iter()
            .collect()
        }
    }
}
