use super::{
    parser::{parse, Command},
    PT_PER_UNIT,
};
use crate::{
    diag::Session,
    error::{ConvertError, Result},
    formats::{new_document, ImportDefaults, Importer},
    geom::{multiply_trafo, Path, Point, Trafo},
    model::{style::Style, DocOrigin, Document, Primitive},
};
use log::info;

pub struct PltImporter {
    defaults: ImportDefaults,
}

impl PltImporter {
    pub fn new(defaults: ImportDefaults) -> Self {
        Self { defaults }
    }
}

/// Pen state while walking the commands.
#[derive(Debug, Default)]
struct Plotter {
    pos: Point,
    pen_down: bool,
    run: Option<Path>,
    runs: Vec<Path>,
}

impl Plotter {
    fn finish_run(&mut self) {
        if let Some(run) = self.run.take() {
            if !run.segments.is_empty() {
                self.runs.push(run);
            }
        }
    }

    fn move_to(&mut self, p: Point) {
        self.finish_run();
        self.pos = p;
    }

    fn draw_to(&mut self, p: Point) {
        let pos = self.pos;
        self.run.get_or_insert_with(|| Path::new(pos)).line_to(p);
        self.pos = p;
    }

    fn pen_up(&mut self, points: &[Point]) {
        self.pen_down = false;
        self.finish_run();
        for p in points {
            self.move_to(*p);
        }
    }

    fn pen_down(&mut self, points: &[Point]) {
        self.pen_down = true;
        for p in points {
            self.draw_to(*p);
        }
    }

    fn plot_absolute(&mut self, points: &[Point]) {
        for p in points {
            if self.pen_down {
                self.draw_to(*p);
            } else {
                self.move_to(*p);
            }
        }
    }

    fn exec(&mut self, cmd: &Command) {
        match cmd {
            Command::Init => {
                info!("plotter init, reset pen");
                self.finish_run();
                self.pos = Point::origin();
                self.pen_down = false;
            }
            Command::PenUp(points) => self.pen_up(points),
            Command::PenDown(points) => self.pen_down(points),
            Command::PlotAbsolute(points) => self.plot_absolute(points),
            Command::SelectPen(_) | Command::Opaque { .. } => {}
        }
    }
}

impl Importer for PltImporter {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document> {
        let text = std::str::from_utf8(data)
            .map_err(|e| ConvertError::structural(e.valid_up_to(), 0, "plotter file is not text"))?;
        let mut commands = vec![];
        for cmd in parse(text) {
            if let Some(cmd) = session.absorb(cmd)? {
                commands.push(cmd);
            }
        }
        if !commands.iter().any(|c| *c == Command::Init) {
            return Err(ConvertError::structural(0, 0, "missing IN; instruction"));
        }

        let mut plotter = Plotter::default();
        for cmd in &commands {
            plotter.exec(cmd);
        }
        plotter.finish_run();

        let (mut doc, _, layer) =
            new_document(self.defaults.page_format.clone(), DocOrigin::LowerLeft)?;
        let trafo = multiply_trafo(
            &Trafo::scale(PT_PER_UNIT, PT_PER_UNIT),
            &doc.origin_trafo(self.defaults.page_format.size),
        );
        let style = Style::stroked(self.defaults.stroke());
        let total = plotter.runs.len();
        for (i, run) in plotter.runs.into_iter().enumerate() {
            doc.add_primitive(layer, Primitive::curve(vec![run], trafo, style.clone()))?;
            session.progress.report(i + 1, total);
        }
        Ok(doc)
    }
}
