use super::PT_PER_UNIT;
use crate::{
    diag::Session,
    error::Result,
    formats::Exporter,
    geom::{apply_trafo_to_paths, flatten_paths, multiply_trafo, paths_bbox, sum_bbox, Path, Trafo},
    model::Document,
};
use educe::Educe;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Educe)]
#[educe(Default)]
pub struct PltOptions {
    /// Flattening tolerance in plotter units.
    #[educe(Default = 0.5)]
    pub tolerance: f64,
    /// Shift the drawing so its bbox starts at the plotter origin.
    pub force_zero: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PltExporter {
    options: PltOptions,
}

impl PltExporter {
    pub fn new(options: PltOptions) -> Self {
        Self { options }
    }

    /// Outlines of every primitive in plotter units, one entry per primitive.
    fn collect(doc: &Document) -> Result<Vec<Vec<Path>>> {
        let mut r = vec![];
        for page in doc.pages() {
            let size = doc.page_format(*page)?.size;
            let to_plotter = multiply_trafo(
                &Trafo::translation(size.width / 2.0, size.height / 2.0),
                &Trafo::scale(1.0 / PT_PER_UNIT, 1.0 / PT_PER_UNIT),
            );
            for (_, p) in doc.primitives(*page)? {
                let paths = p.to_paths();
                if !paths.is_empty() {
                    r.push(apply_trafo_to_paths(&paths, &to_plotter));
                }
            }
        }
        Ok(r)
    }
}

/// Plotter coordinate, whole units.
fn coord(v: f64) -> f64 {
    v.round() + 0.0
}

fn write_path(out: &mut String, path: &Path) {
    if path.segments.is_empty() {
        return;
    }
    let mut points = path.points().skip(1).collect::<Vec<_>>();
    if path.closed && path.end_point() != path.start {
        points.push(path.start);
    }
    // writing into a String does not fail
    let _ = write!(out, "PU{},{};PD", coord(path.start.x), coord(path.start.y));
    for (i, p) in points.iter().enumerate() {
        let sep = if i == 0 { "" } else { "," };
        let _ = write!(out, "{sep}{},{}", coord(p.x), coord(p.y));
    }
    out.push_str(";\n");
}

impl Exporter for PltExporter {
    fn export(&self, doc: &Document, session: &mut Session) -> Result<Vec<u8>> {
        let mut objects = Self::collect(doc)?;
        if self.options.force_zero {
            let bbox = objects
                .iter()
                .filter_map(|paths| paths_bbox(paths))
                .fold(None, |acc, b| Some(sum_bbox(acc, b)));
            if let Some(bbox) = bbox {
                let shift = Trafo::translation(-bbox.min.x, -bbox.min.y);
                for paths in &mut objects {
                    *paths = apply_trafo_to_paths(paths, &shift);
                }
            }
        }

        let mut out = String::from("IN;\n");
        let total = objects.len();
        for (i, paths) in objects.iter().enumerate() {
            for path in flatten_paths(paths, self.options.tolerance) {
                write_path(&mut out, &path);
            }
            session.progress.report(i + 1, total);
        }
        out.push_str("PU;\n");
        Ok(out.into_bytes())
    }
}
