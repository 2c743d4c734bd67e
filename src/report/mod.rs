//! Summaries, figures and score files for inspecting pipeline results.
//!
//! Everything here consumes finished reports; nothing feeds back into fitting.

pub mod brain_slice;
pub mod colormap;
pub mod glyph;
pub mod reconstruction;
pub mod score_grid;
pub mod summary;

use crate::error::{Error, Result};
use crate::pipeline::{unit_scores, TestEvaluation};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use brain_slice::BrainSlice;
pub use glyph::GlyphSheet;
pub use reconstruction::ReconstructionSheet;
pub use score_grid::ScoreGrid;
pub use summary::ScoreSummary;

/// Trait for every rendered output.
pub trait Figure {
    /// File stem of this figure.
    fn name(&self) -> &str;

    /// Render the figure as a string (SVG or plain text).
    fn render(&self) -> String;

    /// File extension for the rendered output.
    fn extension(&self) -> &'static str {
        "svg"
    }
}

/// Render `figure` into `dir` and return the written path.
pub fn save(figure: &dyn Figure, dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", figure.name(), figure.extension()));
    fs::write(&path, figure.render())?;
    tracing::debug!(path = %path.display(), "figure written");
    Ok(path)
}

/// Scores written next to the figures. Undefined scores are `null`.
/// Prediction matrices stay in the score cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFile {
    pub model: String,
    /// Mean held-out score per unit.
    pub unit_scores: Vec<Option<f64>>,
    /// Units × folds.
    pub fold_scores: Vec<Vec<Option<f64>>>,
    pub test_trials: Option<Vec<usize>>,
    pub test_scores: Option<Vec<Option<f64>>>,
}

impl ScoreFile {
    pub fn new<T>(model: &str, fold_scores: &Array2<f64>, test: Option<&TestEvaluation<T>>) -> Self {
        Self {
            model: model.to_string(),
            unit_scores: defined(unit_scores(fold_scores).view()),
            fold_scores: fold_scores.rows().into_iter().map(defined).collect(),
            test_trials: test.map(|t| t.trials.clone()),
            test_scores: test.map(|t| defined(t.scores.view())),
        }
    }
}

fn defined(scores: ArrayView1<f64>) -> Vec<Option<f64>> {
    scores.iter().map(|s| (!s.is_nan()).then_some(*s)).collect()
}

/// Write a value as pretty JSON.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let failed = |reason: String| Error::Report {
        path: path.to_path_buf(),
        reason,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| failed(e.to_string()))?;
    fs::write(path, json).map_err(|e| failed(e.to_string()))
}

pub(crate) fn wrap_svg(width: u32, height: u32, content: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">
  <rect width="100%" height="100%" fill="white"/>
  {}
</svg>"#,
        width, height, width, height, content
    )
}

pub(crate) fn text(x: f64, y: f64, size: u32, content: &str) -> String {
    format!(
        r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="{}" fill="black">{}</text>"#,
        x,
        y,
        size,
        escape(content)
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note;

    impl Figure for Note {
        fn name(&self) -> &str {
            "note"
        }

        fn render(&self) -> String {
            "hello".to_string()
        }

        fn extension(&self) -> &'static str {
            "txt"
        }
    }

    #[test]
    fn wrapped_svg_has_viewbox() {
        let svg = wrap_svg(30, 20, "<g/>");
        assert!(svg.contains(r#"viewBox="0 0 30 20""#));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn text_is_escaped() {
        assert!(text(0.0, 0.0, 10, "a < b").contains("a &lt; b"));
    }

    #[test]
    fn score_file_marks_undefined_scores() {
        let folds = ndarray::array![[1.0, 0.5], [f64::NAN, 1.0]];
        let file = ScoreFile::new::<u8>("svc_l1", &folds, None);
        assert_eq!(file.unit_scores, vec![Some(0.75), None]);
        assert_eq!(file.fold_scores[1], vec![None, Some(1.0)]);
        assert!(file.test_scores.is_none());
    }

    #[test]
    fn unwritable_score_file_is_a_report_error() {
        let dir = std::env::temp_dir().join(format!("visrecon-blocked-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("file");
        fs::write(&blocker, "x").unwrap();
        let err = save_json(&1u8, &blocker.join("scores.json")).unwrap_err();
        assert!(matches!(err, Error::Report { .. }));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_writes_named_file() {
        let dir = std::env::temp_dir().join(format!("visrecon-report-{}", std::process::id()));
        let path = save(&Note, &dir).unwrap();
        assert_eq!(path.file_name().unwrap(), "note.txt");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        let _ = fs::remove_dir_all(&dir);
    }
}
