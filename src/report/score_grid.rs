//! One score per pixel drawn on the 10x10 stimulus grid.

use super::colormap::Colormap;
use super::{text, wrap_svg, Figure};
use crate::dataset::{IMAGE_COLS, IMAGE_ROWS};
use ndarray::Array1;

const MARGIN: u32 = 40;

pub struct ScoreGrid {
    pub name: String,
    pub title: String,
    /// One value per pixel, row-major.
    pub scores: Array1<f64>,
    pub vmin: f64,
    pub vmax: f64,
    /// Pixel outlined on the grid.
    pub highlight: Option<usize>,
    pub cell: u32,
    pub colormap: Colormap,
}

impl ScoreGrid {
    /// Accuracy grid on the hot scale from 0.3 to 1.0.
    pub fn accuracy(name: &str, title: &str, scores: Array1<f64>) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            scores,
            vmin: 0.3,
            vmax: 1.0,
            highlight: None,
            cell: 32,
            colormap: Colormap::Hot,
        }
    }

    pub fn with_highlight(mut self, pixel: usize) -> Self {
        self.highlight = Some(pixel);
        self
    }

    fn origin(&self, pixel: usize) -> (u32, u32) {
        let row = (pixel / IMAGE_COLS) as u32;
        let col = (pixel % IMAGE_COLS) as u32;
        (MARGIN / 2 + col * self.cell, MARGIN + row * self.cell)
    }
}

impl Figure for ScoreGrid {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> String {
        let width = IMAGE_COLS as u32 * self.cell + MARGIN;
        let height = IMAGE_ROWS as u32 * self.cell + 2 * MARGIN;
        let mut elements = vec![text(
            (MARGIN / 2) as f64,
            (MARGIN / 2 + 6) as f64,
            14,
            &self.title,
        )];

        for (pixel, score) in self.scores.iter().enumerate().take(IMAGE_ROWS * IMAGE_COLS) {
            let (x, y) = self.origin(pixel);
            elements.push(format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"><title>pixel {}: {:.3}</title></rect>"#,
                x,
                y,
                self.cell,
                self.cell,
                self.colormap.color(*score, self.vmin, self.vmax),
                pixel,
                score
            ));
        }

        if let Some(pixel) = self.highlight {
            let (x, y) = self.origin(pixel);
            elements.push(format!(
                r##"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="#1f77b4" stroke-width="3"/>"##,
                x, y, self.cell, self.cell
            ));
        }

        elements.push(text(
            (MARGIN / 2) as f64,
            (height - MARGIN / 3) as f64,
            11,
            &format!("scale {:.2} to {:.2}, grey = undefined", self.vmin, self.vmax),
        ));

        wrap_svg(width, height, &elements.join("\n  "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PIXELS;

    #[test]
    fn draws_every_pixel_and_the_highlight() {
        let mut scores = Array1::from_elem(PIXELS, 0.8);
        scores[3] = f64::NAN;
        let svg = ScoreGrid::accuracy("scores", "Decoding", scores)
            .with_highlight(42)
            .render();
        assert_eq!(svg.matches("<title>pixel").count(), PIXELS);
        assert!(svg.contains("stroke=\"#1f77b4\""));
        assert!(svg.contains(super::super::colormap::UNDEFINED));
    }

    #[test]
    fn highlight_lands_on_row_and_column() {
        let grid = ScoreGrid::accuracy("g", "t", Array1::zeros(PIXELS));
        assert_eq!(grid.origin(42), (20 + 2 * 32, 40 + 4 * 32));
    }
}
