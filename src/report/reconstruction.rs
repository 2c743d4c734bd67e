//! Stimulus shown beside the image reconstructed from brain activity.

use super::colormap::Colormap;
use super::{text, wrap_svg, Figure};
use crate::dataset::{IMAGE_COLS, IMAGE_ROWS};
use ndarray::{Array2, ArrayView1};

const CELL: u32 = 8;
const GAP: u32 = 12;
const HEADER: u32 = 36;

pub struct ReconstructionSheet {
    pub name: String,
    pub title: String,
    /// Trials × pixels.
    pub truth: Array2<u8>,
    /// Trials × pixels, same row order as `truth`.
    pub predicted: Array2<u8>,
    pub max_rows: usize,
}

impl ReconstructionSheet {
    fn rows(&self) -> usize {
        self.truth.nrows().min(self.predicted.nrows()).min(self.max_rows)
    }

    fn image(&self, pixels: ArrayView1<u8>, x0: u32, y0: u32, out: &mut Vec<String>) {
        let side = IMAGE_COLS as u32 * CELL;
        out.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="black" stroke-width="0.5"/>"#,
            x0, y0, side, IMAGE_ROWS as u32 * CELL
        ));
        for (pixel, value) in pixels.iter().enumerate() {
            if *value == 0 {
                continue;
            }
            let x = x0 + (pixel % IMAGE_COLS) as u32 * CELL;
            let y = y0 + (pixel / IMAGE_COLS) as u32 * CELL;
            out.push(format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                x,
                y,
                CELL,
                CELL,
                Colormap::Gray.color(f64::from(*value), 0.0, 1.0)
            ));
        }
    }
}

impl Figure for ReconstructionSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> String {
        let side = IMAGE_COLS as u32 * CELL;
        let rows = self.rows() as u32;
        let width = 2 * side + 3 * GAP;
        let height = HEADER + rows * (IMAGE_ROWS as u32 * CELL + GAP) + GAP;

        let mut elements = vec![
            text(GAP as f64, 14.0, 12, &self.title),
            text(GAP as f64, (HEADER - 6) as f64, 10, "stimulus"),
            text((2 * GAP + side) as f64, (HEADER - 6) as f64, 10, "reconstruction"),
        ];
        for row in 0..self.rows() {
            let y = HEADER + row as u32 * (IMAGE_ROWS as u32 * CELL + GAP);
            self.image(self.truth.row(row), GAP, y, &mut elements);
            self.image(self.predicted.row(row), 2 * GAP + side, y, &mut elements);
        }

        wrap_svg(width, height, &elements.join("\n  "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PIXELS;

    #[test]
    fn draws_one_cell_per_lit_pixel_and_caps_rows() {
        let mut truth = Array2::<u8>::zeros((3, PIXELS));
        truth[[0, 0]] = 1;
        truth[[0, 11]] = 1;
        let predicted = Array2::<u8>::zeros((3, PIXELS));
        let sheet = ReconstructionSheet {
            name: "sheet".into(),
            title: "figures".into(),
            truth,
            predicted,
            max_rows: 2,
        };
        let svg = sheet.render();
        assert_eq!(svg.matches(r##"fill="#000000""##).count(), 2);
        // two frames per row
        assert_eq!(svg.matches(r#"fill="none""#).count(), 4);
    }
}
