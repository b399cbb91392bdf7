use crate::audio::meter_communication::display_utils::{
    sample_to_x, sample_to_y, REFERENCE_LEVELS, TIME_DIVISIONS,
};
use nih_plug_iced::widget::canvas::{self, Cursor, Frame, Geometry, Path, Program, Stroke};
use nih_plug_iced::{Color, Point, Rectangle, Size};

const BACKGROUND: Color = Color {
    r: 0.04,
    g: 0.04,
    b: 0.05,
    a: 1.0,
};
const GRID_LINE: Color = Color {
    r: 0.35,
    g: 0.35,
    b: 0.35,
    a: 0.3,
};
/// The 0 line is where a DC offset shows up, so it is drawn stronger
const ZERO_LINE: Color = Color {
    r: 0.35,
    g: 0.35,
    b: 0.35,
    a: 0.6,
};
const WAVEFORM_LINE: Color = Color {
    r: 0.0,
    g: 1.0,
    b: 1.0,
    a: 0.9,
};
const WAVEFORM_LINE_WIDTH: f32 = 1.5;

/// Oscilloscope-style view of the most recent visualizer window
///
/// Borrows a window the editor already copied out of the ring, so drawing never
/// touches the audio thread's state.
pub struct WaveformDisplay<'a> {
    samples: &'a [f32],
}

impl<'a> WaveformDisplay<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self { samples }
    }

    fn draw_grid(frame: &mut Frame, size: Size) {
        let grid_stroke = Stroke::default().with_width(1.0).with_color(GRID_LINE);

        for division in 0..=TIME_DIVISIONS {
            let x = sample_to_x(division, TIME_DIVISIONS + 1, size.width);
            let line = Path::line(Point::new(x, 0.0), Point::new(x, size.height));
            frame.stroke(&line, grid_stroke);
        }

        for level in REFERENCE_LEVELS {
            let y = sample_to_y(level, size.height);
            let color = if level == 0.0 { ZERO_LINE } else { GRID_LINE };
            let line = Path::line(Point::new(0.0, y), Point::new(size.width, y));
            frame.stroke(&line, Stroke::default().with_width(1.0).with_color(color));
        }
    }

    fn draw_waveform(&self, frame: &mut Frame, size: Size) {
        if self.samples.len() < 2 {
            return;
        }

        let num_samples = self.samples.len();
        let mut path_builder = canvas::path::Builder::new();
        for (index, &sample) in self.samples.iter().enumerate() {
            let point = Point::new(
                sample_to_x(index, num_samples, size.width),
                sample_to_y(sample, size.height),
            );
            if index == 0 {
                path_builder.move_to(point);
            } else {
                path_builder.line_to(point);
            }
        }

        let line_stroke = Stroke::default()
            .with_width(WAVEFORM_LINE_WIDTH)
            .with_color(WAVEFORM_LINE);
        frame.stroke(&path_builder.build(), line_stroke);
    }
}

impl<Message> Program<Message> for WaveformDisplay<'_> {
    fn draw(&self, bounds: Rectangle, _cursor: Cursor) -> Vec<Geometry> {
        let mut frame = Frame::new(bounds.size());

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, BACKGROUND);

        Self::draw_grid(&mut frame, bounds.size());
        self.draw_waveform(&mut frame, bounds.size());

        vec![frame.into_geometry()]
    }
}
