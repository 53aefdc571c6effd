use crate::{
    error::{ConvertError, Result},
    geom::Point,
};
use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{take_till, take_while_m_n},
    character::complete::{char, multispace0, multispace1, space0},
    combinator::{all_consuming, opt, value},
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, separated_pair, terminated},
    IResult,
};

type ParseResult<'a, O> = IResult<&'a str, O>;

/// One plotter command, points are in plotter units.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init,
    PenUp(Vec<Point>),
    PenDown(Vec<Point>),
    PlotAbsolute(Vec<Point>),
    SelectPen(u32),
    /// Command without meaning for the drawing, kept as written.
    Opaque { name: String, args: String },
}

fn mnemonic(input: &str) -> ParseResult<&str> {
    take_while_m_n(2, 2, |c: char| c.is_ascii_alphabetic())(input)
}

fn separator(input: &str) -> ParseResult<()> {
    alt((
        value((), delimited(space0, char(','), multispace0)),
        value((), multispace1),
    ))(input)
}

fn numbers(args: &str) -> Option<Vec<f64>> {
    all_consuming(delimited(
        multispace0,
        separated_list0(separator, double),
        multispace0,
    ))(args)
    .ok()
    .map(|(_, v)| v)
}

fn point(input: &str) -> ParseResult<Point> {
    let (input, (x, y)) = separated_pair(double, separator, double)(input)?;
    Ok((input, Point::new(x, y)))
}

/// Coordinate pairs of `args`, on failure the number of leading bytes that
/// hold whole pairs.
fn points(args: &str) -> std::result::Result<Vec<Point>, usize> {
    let parsed: ParseResult<Vec<Point>> =
        delimited(multispace0, separated_list0(separator, point), multispace0)(args);
    match parsed {
        Ok((rest, v)) if rest.is_empty() => Ok(v),
        Ok((rest, _)) => Err(args.len() - rest.len()),
        Err(_) => Err(0),
    }
}

/// Name and raw argument text of the next command. Labels run up to the
/// ETX terminator, everything else up to `;` or the next command letter.
fn command(input: &str) -> ParseResult<(&str, &str)> {
    let (input, name) = mnemonic(input)?;
    let (input, args) = if name.eq_ignore_ascii_case("LB") {
        terminated(take_till(|c: char| c == '\x03'), opt(char('\x03')))(input)?
    } else {
        take_till(|c: char| c == ';' || c.is_ascii_alphabetic())(input)?
    };
    let (input, _) = opt(char(';'))(input)?;
    Ok((input, (name, args)))
}

/// Record id of a command, its two letters big-endian.
fn record_id(name: &str) -> u32 {
    name.bytes().fold(0, |acc, b| (acc << 8) | u32::from(b))
}

/// Command from its name and argument text, `offset` is the position of
/// the name. Pen moves with arguments that are not coordinate pairs fail
/// with [`ConvertError::RecordDecode`].
fn classify(name: &str, args: &str, offset: usize) -> Result<Command> {
    let name = name.to_ascii_uppercase();
    let moves = |make: fn(Vec<Point>) -> Command| {
        points(args).map(make).map_err(|available| ConvertError::RecordDecode {
            offset,
            record_id: record_id(&name),
            expected: args.len(),
            available,
        })
    };
    let r = match name.as_str() {
        "IN" => Some(Command::Init),
        "PU" => return moves(Command::PenUp),
        "PD" => return moves(Command::PenDown),
        "PA" => return moves(Command::PlotAbsolute),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        "SP" => numbers(args).map(|v| Command::SelectPen(v.first().map_or(0, |p| *p as u32))),
        _ => None,
    };
    Ok(r.unwrap_or_else(|| {
        debug!("opaque plotter command {name}{args}");
        Command::Opaque {
            name,
            args: args.to_owned(),
        }
    }))
}

/// Split plotter text into commands. Text that does not start with a
/// command name, such as device escape sequences, is kept up to the next
/// `;` as an opaque command with an empty name.
pub fn parse(text: &str) -> Vec<Result<Command>> {
    let mut r = vec![];
    let mut rest = text;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if rest.is_empty() {
            break;
        }
        match command(rest) {
            Ok((tail, (name, args))) => {
                r.push(classify(name, args, text.len() - rest.len()));
                rest = tail;
            }
            Err(_) => {
                let end = rest.find(';').unwrap_or(rest.len());
                debug!("skip unknown plotter text {:?}", &rest[..end]);
                r.push(Ok(Command::Opaque {
                    name: String::new(),
                    args: rest[..end].to_owned(),
                }));
                rest = &rest[end..];
            }
        }
    }
    r
}
