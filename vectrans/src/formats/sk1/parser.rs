use crate::error::{ConvertError, Result};
use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, take_while, take_while_m_n},
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, map, map_opt, opt, recognize, value},
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair, terminated},
    IResult,
};

type ParseResult<'a, O> = IResult<&'a str, O>;

/// Argument of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Number(f64),
    Str(String),
    /// Bare name other than `None`.
    Name(String),
    /// Tuple or list.
    Seq(Vec<Value>),
}

impl Value {
    pub fn number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Name(s) => Some(s),
            _ => None,
        }
    }

    pub fn seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(v) => Some(v),
            _ => None,
        }
    }
}

/// One line of the document, a call with positional and keyword arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Value>,
    pub kwargs: Vec<(String, Value)>,
    /// Line number, counted from 1.
    pub line: usize,
}

impl Call {
    /// Argument by position or keyword.
    pub fn arg(&self, index: usize, key: &str) -> Option<&Value> {
        self.args
            .get(index)
            .or_else(|| self.kwargs.iter().find(|(k, _)| k == key).map(|(_, v)| v))
    }

    pub fn number(&self, index: usize, key: &str) -> Option<f64> {
        self.arg(index, key).and_then(Value::number)
    }

    /// Numbers of the leading positional arguments, `None` when fewer are
    /// given or one is not a number.
    pub fn numbers<const N: usize>(&self) -> Option<[f64; N]> {
        let mut r = [0.0; N];
        for (i, v) in r.iter_mut().enumerate() {
            *v = self.args.get(i)?.number()?;
        }
        Some(r)
    }
}

fn identifier(input: &str) -> ParseResult<&str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn hex_char(digits: usize) -> impl FnMut(&str) -> ParseResult<char> {
    move |input| {
        map_opt(
            take_while_m_n(digits, digits, |c: char| c.is_ascii_hexdigit()),
            |h| u32::from_str_radix(h, 16).ok().and_then(char::from_u32),
        )(input)
    }
}

fn escape(input: &str) -> ParseResult<char> {
    alt((
        value('\\', char('\\')),
        value('\'', char('\'')),
        value('"', char('"')),
        value('\n', char('n')),
        value('\t', char('t')),
        value('\r', char('r')),
        preceded(char('x'), hex_char(2)),
        preceded(char('u'), hex_char(4)),
    ))(input)
}

fn quoted(quote: char) -> impl FnMut(&str) -> ParseResult<String> {
    let stop = if quote == '\'' { "\\'" } else { "\\\"" };
    move |input| {
        delimited(
            char(quote),
            map(
                opt(escaped_transform(is_not(stop), '\\', escape)),
                Option::unwrap_or_default,
            ),
            char(quote),
        )(input)
    }
}

fn separator(input: &str) -> ParseResult<char> {
    delimited(multispace0, char(','), multispace0)(input)
}

/// Comma separated values up to `close`, a trailing comma allowed.
fn sequence(open: char, close: char) -> impl FnMut(&str) -> ParseResult<Vec<Value>> {
    move |input| {
        delimited(
            terminated(char(open), multispace0),
            terminated(separated_list0(separator, parse_value), opt(separator)),
            preceded(multispace0, char(close)),
        )(input)
    }
}

fn parse_value(input: &str) -> ParseResult<Value> {
    alt((
        map(quoted('\''), Value::Str),
        map(quoted('"'), Value::Str),
        map(identifier, |s| match s {
            "None" => Value::None,
            s => Value::Name(s.to_owned()),
        }),
        map(double, Value::Number),
        map(sequence('(', ')'), Value::Seq),
        map(sequence('[', ']'), Value::Seq),
    ))(input)
}

enum Arg {
    Positional(Value),
    Keyword(String, Value),
}

fn argument(input: &str) -> ParseResult<Arg> {
    alt((
        map(
            separated_pair(
                identifier,
                delimited(multispace0, char('='), multispace0),
                parse_value,
            ),
            |(k, v)| Arg::Keyword(k.to_owned(), v),
        ),
        map(parse_value, Arg::Positional),
    ))(input)
}

fn call(input: &str) -> ParseResult<(&str, Vec<Arg>)> {
    let (input, name) = preceded(multispace0, identifier)(input)?;
    let (input, args) = delimited(
        terminated(char('('), multispace0),
        terminated(separated_list0(separator, argument), opt(separator)),
        delimited(multispace0, char(')'), multispace0),
    )(input)?;
    Ok((input, (name, args)))
}

/// Deepest bracket nesting of a line, the call's own parentheses included.
pub const MAX_NESTING: usize = 32;

/// Bracket nesting outside of quoted strings.
fn nesting(text: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0);
    let mut quote = None;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[') => {
                depth += 1;
                max = max.max(depth);
            }
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, _) => {}
        }
    }
    max
}

fn parse_line(text: &str, line: usize, offset: usize) -> Result<Call> {
    let error = || ConvertError::RecordDecode {
        offset,
        record_id: u32::try_from(line).unwrap_or(u32::MAX),
        expected: text.len(),
        available: 0,
    };
    if nesting(text) > MAX_NESTING {
        debug!("line {line} nested deeper than {MAX_NESTING} levels");
        return Err(error());
    }
    let (_, (name, args)) = all_consuming(call)(text).map_err(|_| error())?;
    let mut r = Call {
        name: name.to_owned(),
        args: vec![],
        kwargs: vec![],
        line,
    };
    for arg in args {
        match arg {
            Arg::Positional(v) => r.args.push(v),
            Arg::Keyword(k, v) => r.kwargs.push((k, v)),
        }
    }
    Ok(r)
}

/// Calls of a document, one per non-empty line after the header. A line
/// that does not parse fails with [`ConvertError::RecordDecode`], its
/// record id being the line number. Base64 lines of an embedded bitmap,
/// from `bm(...)` up to a line holding `-`, are skipped.
pub fn parse(text: &str) -> Vec<Result<Call>> {
    let mut r = vec![];
    let mut in_bitmap = false;
    let mut offset = 0;
    for (i, raw) in text.split('\n').enumerate() {
        let start = offset;
        offset += raw.len() + 1;
        let line = raw.trim_end_matches('\r');
        if in_bitmap {
            in_bitmap = line.trim() != "-";
            continue;
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = parse_line(line, i + 1, start);
        if let Ok(c) = &parsed {
            if c.name == "bm" {
                debug!("skip bitmap data after line {}", i + 1);
                in_bitmap = true;
            }
        }
        r.push(parsed);
    }
    r
}
