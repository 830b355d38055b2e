//! Grammar for one custom-parameter declaration line:
//!
//! ```text
//! (float|bool) <ws>+ ZGE<ident> <ws>* = <ws>* <value> ; [suffix]
//! suffix := [// ... Range: <num> , <num> ...] [... @tag @tag ...]
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_till1, take_until, take_while1},
    character::complete::{char, digit0, digit1, multispace0, multispace1, one_of},
    combinator::{map_res, opt, recognize, value, verify},
    multi::many0,
    sequence::{pair, preceded, separated_pair, tuple},
};

use crate::context::{DeclaredRange, PARAM_PREFIX, ParamKind, ParamRange};

const RANGE_MARKER: &str = "Range:";

/// Captures of a matched declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: ParamKind,
    pub id: String,
    pub raw_value: String,
    pub range: Option<DeclaredRange>,
    pub tags: Vec<String>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse the first declaration found on `line`, if any.
///
/// Candidates start at identifier boundaries, so `myfloat` never matches.
pub fn parse_declaration(line: &str) -> Option<Declaration> {
    line.char_indices()
        .filter(|&(i, _)| line[..i].chars().next_back().is_none_or(|c| !is_ident_char(c)))
        .find_map(|(i, _)| declaration(&line[i..]).ok().map(|(_, decl)| decl))
}

fn param_kind(input: &str) -> IResult<&str, ParamKind> {
    alt((
        value(ParamKind::Float, tag(ParamKind::Float.keyword())),
        value(ParamKind::Bool, tag(ParamKind::Bool.keyword())),
    ))(input)
}

fn parse_assignment(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    let (input, _) = char('=')(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn declaration(input: &str) -> IResult<&str, Declaration> {
    let (input, kind) = param_kind(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag(PARAM_PREFIX)(input)?;
    let (input, id) = take_while1(is_ident_char)(input)?;
    let (input, _) = parse_assignment(input)?;
    let (input, raw_value) = verify(take_until(";"), |v: &str| !v.trim().is_empty())(input)?;
    let (suffix, _) = char(';')(input)?;

    Ok((
        "",
        Declaration {
            kind,
            id: id.to_string(),
            raw_value: raw_value.trim().to_string(),
            range: parse_range(suffix),
            tags: parse_tags(suffix),
        },
    ))
}

/// Text after `Range:` inside the trailing comment, up to the first tag.
fn range_text(suffix: &str) -> IResult<&str, &str> {
    let (input, _) = take_until("//")(suffix)?;
    let (input, _) = take_until(RANGE_MARKER)(input)?;
    let (input, _) = tag(RANGE_MARKER)(input)?;
    take_till(|c: char| c == '@')(input)
}

fn range_bounds(text: &str) -> IResult<&str, ParamRange> {
    let (input, (min, max)) = separated_pair(
        preceded(multispace0, number),
        pair(take_till(|c: char| c == ','), char(',')),
        preceded(multispace0, number),
    )(text)?;
    Ok((input, ParamRange { min, max }))
}

fn parse_range(suffix: &str) -> Option<DeclaredRange> {
    let (_, text) = range_text(suffix).ok()?;
    Some(match range_bounds(text) {
        Ok((_, r)) => DeclaredRange::Bounds(r),
        Err(_) => DeclaredRange::Malformed(text.trim().to_string()),
    })
}

/// Signed decimal literal with optional fraction and exponent.
/// A dangling exponent (`1e`) is left unconsumed.
fn decimal(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    map_res(decimal, str::parse::<f64>)(input)
}

/// Longest numeric prefix of `text`, ignoring leading whitespace:
/// `0.5f` reads as `0.5`, `1.0/3.0` as `1.0`.
pub fn leading_number(text: &str) -> Option<f64> {
    preceded(multispace0, number)(text).ok().map(|(_, v)| v)
}

fn tag_tokens(suffix: &str) -> IResult<&str, Vec<&str>> {
    let (input, _) = take_until("@")(suffix)?;
    many0(preceded(multispace0, take_till1(|c: char| c.is_whitespace())))(input)
}

fn parse_tags(suffix: &str) -> Vec<String> {
    let Ok((_, tokens)) = tag_tokens(suffix) else {
        return Vec::new();
    };
    tokens
        .into_iter()
        .map(|t| t.trim_start_matches('@'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
