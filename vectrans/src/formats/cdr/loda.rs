//! Object records: the `loda` argument table and the `trfd` matrix.

use super::{arg, chunk_reader, size_value, Version, UNIT_TO_PT};
use crate::{
    error::Result,
    formats::reader::RecordReader,
    geom::{NodeKind, Path, Point, Segment, Trafo},
};
use riff_parser::Chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::FromRepr, strum::Display)]
#[repr(u32)]
pub enum ObjectType {
    Rectangle = 1,
    Ellipse = 2,
    Curve = 3,
    Text = 4,
    Image = 5,
    Polygon = 0x14,
}

/// Header of a `loda` chunk and its typed arguments.
#[derive(Debug, Clone)]
pub struct Loda<'a> {
    chunk: &'a Chunk,
    pub object_type: u32,
    /// Argument type and payload offset, in stored order.
    pub args: Vec<(u32, usize)>,
}

impl<'a> Loda<'a> {
    pub fn parse(chunk: &'a Chunk) -> Result<Self> {
        let mut r = chunk_reader(chunk);
        r.skip(4)?;
        let count = r.le_u32()? as usize;
        let offsets_at = r.le_u32()? as usize;
        let types_at = r.le_u32()? as usize;
        let object_type = r.le_u32()?;

        let mut offsets = r.at(offsets_at)?;
        let mut types = r.at(types_at)?;
        let offsets = (0..count)
            .map(|_| offsets.le_u32().map(|o| o as usize))
            .collect::<Result<Vec<_>>>()?;
        // type table runs backwards
        let mut kinds = (0..count)
            .map(|_| types.le_u32())
            .collect::<Result<Vec<_>>>()?;
        kinds.reverse();
        Ok(Self {
            chunk,
            object_type,
            args: kinds.into_iter().zip(offsets).collect(),
        })
    }

    pub fn kind(&self) -> Option<ObjectType> {
        ObjectType::from_repr(self.object_type)
    }

    pub fn arg(&self, kind: u32) -> Option<usize> {
        self.args.iter().find(|(k, _)| *k == kind).map(|(_, o)| *o)
    }

    /// Reader at the argument, or at `default` when it is missing.
    fn arg_reader(&self, kind: u32, default: usize) -> Result<RecordReader<'a>> {
        chunk_reader(self.chunk).at(self.arg(kind).unwrap_or(default))
    }

    /// Property id referenced by an argument.
    pub fn property_id(&self, kind: u32) -> Result<Option<u32>> {
        match self.arg(kind) {
            Some(at) => Ok(Some(chunk_reader(self.chunk).at(at)?.le_u32()?)),
            None => Ok(None),
        }
    }

    pub fn name(&self, version: Version) -> Result<Option<String>> {
        let Some(at) = self.arg(arg::NAME) else {
            return Ok(None);
        };
        let mut r = chunk_reader(self.chunk).at(at)?;
        let bytes = r.bytes(r.remaining())?;
        Ok(Some(super::chunk_string(bytes, version)))
    }

    /// Width, height and the four corner radii.
    pub fn rectangle(&self, version: Version) -> Result<(f64, f64, [f64; 4])> {
        let mut r = self.arg_reader(arg::COORDS, 100)?;
        let (w, h) = (size_value(&mut r)?, size_value(&mut r)?);
        let r1 = size_value(&mut r)?;
        let radii = if version <= Version::V7 {
            [r1; 4]
        } else {
            [r1, size_value(&mut r)?, size_value(&mut r)?, size_value(&mut r)?]
        };
        Ok((w, h, radii))
    }

    /// Width, height, start and end angle in radians, and whether the arc
    /// is closed to the center.
    pub fn ellipse(&self) -> Result<(f64, f64, f64, f64, bool)> {
        let mut r = self.arg_reader(arg::COORDS, 100)?;
        let (w, h) = (size_value(&mut r)?, size_value(&mut r)?);
        let mut angle = || -> Result<f64> { Ok((f64::from(r.le_i32()?) / 1e6).to_radians()) };
        let (start, end, pie) = (angle()?, angle()?, angle()?);
        Ok((w, h, start, end, pie != 0.0))
    }

    /// Point list with node flags, used by curves and polygons.
    pub fn paths(&self) -> Result<Vec<Path>> {
        let mut r = self.arg_reader(arg::COORDS, 100)?;
        let count = r.le_u32()? as usize;
        if r.remaining() < count * 9 {
            return Err(r.decode_error(count * 9));
        }
        let points = (0..count)
            .map(|_| Ok(Point::new(size_value(&mut r)?, size_value(&mut r)?)))
            .collect::<Result<Vec<_>>>()?;
        let flags = r.bytes(count)?;
        Ok(build_paths(&points, flags))
    }
}

fn node_kind(flags: u8) -> NodeKind {
    if flags & 0x20 != 0 {
        NodeKind::Symmetrical
    } else if flags & 0x10 != 0 {
        NodeKind::Smooth
    } else {
        NodeKind::Cusp
    }
}

/// Node flags: bits 6 and 7 give the segment type, bit 3 closes the path,
/// bits 4 and 5 are the node kind.
fn build_paths(points: &[Point], flags: &[u8]) -> Vec<Path> {
    const CLOSE: u8 = 0x08;
    let mut r = vec![];
    let mut path: Option<Path> = None;
    let mut controls: Vec<Point> = vec![];
    for (p, f) in points.iter().zip(flags) {
        match f & 0xc0 {
            0x00 => {
                r.extend(path.take());
                path = Some(Path::new(*p));
                controls.clear();
            }
            0x40 => {
                if let Some(path) = &mut path {
                    path.line_to(*p);
                }
                controls.clear();
            }
            0xc0 => controls.push(*p),
            _ => {
                if let Some(path) = &mut path {
                    match controls[..] {
                        [c1, c2, ..] => path.segments.push(Segment::Curve {
                            c1,
                            c2,
                            end: *p,
                            node: node_kind(*f),
                        }),
                        _ => path.line_to(*p),
                    }
                }
                controls.clear();
            }
        }
        if f & CLOSE != 0 {
            if let Some(mut closed) = path.take() {
                closed.close();
                r.push(closed);
            }
        }
    }
    r.extend(path);
    r
}

/// Matrix of a `trfd` chunk: `a b c d e f` with `x' = a x + b y + c`,
/// `y' = d x + e y + f`, translation in CDR units.
pub fn trafo(trfd: &Chunk, version: Version) -> Result<Trafo> {
    let at = if version >= Version::V13 { 40 } else { 32 };
    let mut r = chunk_reader(trfd).at(at)?;
    let mut m = [0.0; 6];
    for v in &mut m {
        *v = r.le_f64()?;
    }
    let [a, b, c, d, e, f] = m;
    Ok(Trafo::new(a, d, b, e, c * UNIT_TO_PT, f * UNIT_TO_PT))
}

#[cfg(test)]
mod tests;
