use winnow::ascii::dec_uint;
use winnow::combinator::{opt, preceded, repeat};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::types::split_absolute;

// -- Line tokenization ------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

fn token<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| !c.is_ascii_whitespace()).parse_next(input)
}

fn line<'i>(input: &mut &'i str) -> ModalResult<Vec<&'i str>> {
    let tokens = repeat(0.., preceded(ws, token)).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(tokens)
}

/// Split one source line into whitespace-separated tokens, dropping
/// everything from the first token that starts a `#` comment. A `#` inside
/// a token (an anchor like `/post#ads`) is kept.
pub(crate) fn tokens(source: &str) -> Vec<&str> {
    let mut parsed = line.parse(source).unwrap_or_default();
    if let Some(pos) = parsed.iter().position(|t| t.starts_with('#')) {
        parsed.truncate(pos);
    }
    parsed
}

// -- Token classifiers ------------------------------------------------------

fn status(input: &mut &str) -> ModalResult<(u16, bool)> {
    let code = dec_uint::<_, u16, _>.parse_next(input)?;
    let force = opt('!').parse_next(input)?.is_some();
    Ok((code, force))
}

/// Parse a `301` / `301!` status token. `None` when the token is anything
/// else.
pub(crate) fn parse_status(token: &str) -> Option<(u16, bool)> {
    status
        .parse(token)
        .ok()
        .filter(|(code, _)| (100..=999).contains(code))
}

/// Whether a token reads as a destination or source: a rooted path or an
/// absolute URL.
pub(crate) fn is_path(token: &str) -> bool {
    token.starts_with('/') || split_absolute(token).is_some()
}
