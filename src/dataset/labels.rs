//! Stimulus label files: one comma-separated row of 100 integers per volume.
//!
//! Rows list pixels column by column; they are reordered row-major here.
//! A first value of -1 marks a rest volume.

use super::{IMAGE_COLS, IMAGE_ROWS, PIXELS};
use crate::error::DatasetError;
use std::fs;
use std::path::Path;

/// One label row: a stimulus image or a rest period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Rest,
    Image([u8; PIXELS]),
}

pub fn read_labels(path: &Path) -> Result<Vec<Label>, DatasetError> {
    let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_labels(&contents, path)
}

pub fn parse_labels(contents: &str, path: &Path) -> Result<Vec<Label>, DatasetError> {
    let malformed = |line: usize, reason: String| DatasetError::Label {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut labels = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let values = trimmed
            .split(',')
            .map(|v| v.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| malformed(i + 1, err.to_string()))?;
        if values.len() != PIXELS {
            return Err(malformed(
                i + 1,
                format!("expected {} values, got {}", PIXELS, values.len()),
            ));
        }
        if values[0] == -1 {
            labels.push(Label::Rest);
            continue;
        }

        let mut image = [0u8; PIXELS];
        for row in 0..IMAGE_ROWS {
            for col in 0..IMAGE_COLS {
                let value = values[row + IMAGE_ROWS * col];
                image[row * IMAGE_COLS + col] = match value {
                    0 => 0,
                    1 => 1,
                    other => {
                        return Err(malformed(i + 1, format!("pixel value {}", other)));
                    }
                };
            }
        }
        labels.push(Label::Image(image));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: impl Fn(usize) -> i32) -> String {
        (0..PIXELS)
            .map(|i| values(i).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn column_major_rows_become_row_major() {
        // Column index 1 of the file is pixel (row 1, col 0).
        let contents = row(|i| (i == 1) as i32);
        let labels = parse_labels(&contents, Path::new("l.csv")).unwrap();
        match &labels[0] {
            Label::Image(image) => {
                assert_eq!(image[IMAGE_COLS], 1);
                assert_eq!(image.iter().map(|&p| p as usize).sum::<usize>(), 1);
            }
            Label::Rest => panic!("expected an image"),
        }
    }

    #[test]
    fn rest_rows_are_detected() {
        let contents = format!("{}\n{}\n", row(|_| -1), row(|_| 0));
        let labels = parse_labels(&contents, Path::new("l.csv")).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], Label::Rest);
        assert_eq!(labels[1], Label::Image([0; PIXELS]));
    }

    #[test]
    fn short_rows_report_their_line() {
        let contents = format!("{}\n1,0,1\n", row(|_| 0));
        let err = parse_labels(&contents, Path::new("l.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Label { line: 2, .. }));
    }
}
