//! `transform` attribute lists.

use super::path_data::number_list;
use crate::geom::{Trafo, Vector};
use euclid::Angle;
use log::debug;
use nom::{
    bytes::complete::take_until,
    character::complete::{alpha1, char, multispace0},
    combinator::opt,
    sequence::{delimited, tuple},
    IResult,
};

fn transform_fn(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, (_, name, _, args, _, _)) = tuple((
        multispace0,
        alpha1,
        multispace0,
        delimited(char('('), take_until(")"), char(')')),
        multispace0,
        opt(char(',')),
    ))(input)?;
    Ok((input, (name, args)))
}

fn single(name: &str, args: &[f64]) -> Option<Trafo> {
    let deg = |a: f64| Angle::degrees(a);
    Some(match (name, args) {
        ("matrix", [a, b, c, d, e, f]) => Trafo::new(*a, *b, *c, *d, *e, *f),
        ("translate", [tx]) => Trafo::translation(*tx, 0.0),
        ("translate", [tx, ty]) => Trafo::translation(*tx, *ty),
        ("scale", [s]) => Trafo::scale(*s, *s),
        ("scale", [sx, sy]) => Trafo::scale(*sx, *sy),
        ("rotate", [a]) => Trafo::rotation(deg(*a)),
        ("rotate", [a, cx, cy]) => Trafo::translation(-cx, -cy)
            .then_rotate(deg(*a))
            .then_translate(Vector::new(*cx, *cy)),
        ("skewX", [a]) => Trafo::new(1.0, 0.0, a.to_radians().tan(), 1.0, 0.0, 0.0),
        ("skewY", [a]) => Trafo::new(1.0, a.to_radians().tan(), 0.0, 1.0, 0.0, 0.0),
        _ => return None,
    })
}

/// Parse a transform list. The rightmost transform applies first; items
/// with a wrong argument count are skipped, parsing stops at garbage.
pub fn parse_transform(s: &str) -> Trafo {
    let mut items = vec![];
    let mut rest = s;
    while let Ok((tail, (name, args))) = transform_fn(rest) {
        rest = tail;
        match single(name, &number_list(args)) {
            Some(t) => items.push(t),
            None => debug!("ignore transform {name}({args})"),
        }
    }
    items
        .iter()
        .rev()
        .fold(Trafo::identity(), |acc, t| acc.then(t))
}

#[cfg(test)]
mod tests;
