//! Terminal rendering of stimulus images with block glyphs.

use super::Figure;
use crate::dataset::{IMAGE_COLS, IMAGE_ROWS};
use ndarray::{Array2, ArrayView1};

const ON: char = '█';
const OFF: char = '·';
const SEPARATOR: &str = "   ";

/// Rows of glyphs for one 100-pixel image.
pub fn image_lines(pixels: ArrayView1<u8>) -> Vec<String> {
    (0..IMAGE_ROWS)
        .map(|row| {
            (0..IMAGE_COLS)
                .map(|col| match pixels.get(row * IMAGE_COLS + col) {
                    Some(&1) => ON,
                    _ => OFF,
                })
                .collect()
        })
        .collect()
}

/// Stimulus and reconstruction side by side, one block per trial.
pub struct GlyphSheet {
    pub name: String,
    pub trials: Vec<usize>,
    pub truth: Array2<u8>,
    pub predicted: Array2<u8>,
    pub max_rows: usize,
}

impl Figure for GlyphSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> String {
        let rows = self
            .truth
            .nrows()
            .min(self.predicted.nrows())
            .min(self.max_rows);
        let mut blocks = Vec::with_capacity(rows);
        for i in 0..rows {
            let label = self
                .trials
                .get(i)
                .map(|t| format!("trial {}", t))
                .unwrap_or_else(|| format!("row {}", i));
            let mut lines = vec![format!("{:<width$}{}{}", label, SEPARATOR, "predicted", width = IMAGE_COLS)];
            let truth = image_lines(self.truth.row(i));
            let predicted = image_lines(self.predicted.row(i));
            lines.extend(
                truth
                    .iter()
                    .zip(&predicted)
                    .map(|(t, p)| format!("{}{}{}", t, SEPARATOR, p)),
            );
            blocks.push(lines.join("\n"));
        }
        blocks.join("\n\n")
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}
