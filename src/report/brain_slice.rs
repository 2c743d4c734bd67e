//! Voxel values projected through the mask onto one axial slice.

use super::colormap::{Colormap, BACKGROUND};
use super::{text, wrap_svg, Figure};
use crate::dataset::Mask;
use ndarray::{Array1, Axis};

const CELL: u32 = 10;
const GAP: u32 = 16;
const HEADER: u32 = 28;

pub struct BrainSlice {
    pub name: String,
    pub mask: Mask,
    /// Requested axial slice, clamped to the volume.
    pub slice: usize,
    /// Titled voxel maps, each with one value per mask voxel.
    pub panels: Vec<(String, Array1<f64>)>,
    pub colormap: Colormap,
}

impl BrainSlice {
    pub fn new(name: &str, mask: Mask, slice: usize) -> Self {
        Self {
            name: name.to_string(),
            mask,
            slice,
            panels: Vec::new(),
            colormap: Colormap::BlueGreen,
        }
    }

    pub fn panel(mut self, title: &str, values: Array1<f64>) -> Self {
        self.panels.push((title.to_string(), values));
        self
    }

    pub fn slice_index(&self) -> usize {
        self.slice.min(self.mask.shape()[2].saturating_sub(1))
    }

    /// Colour range shared by all panels; symmetric when any value is negative.
    fn range(&self) -> (f64, f64) {
        let values = self
            .panels
            .iter()
            .flat_map(|(_, v)| v.iter().copied())
            .filter(|v| v.is_finite());
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !lo.is_finite() {
            return (0.0, 1.0);
        }
        if lo < 0.0 {
            let bound = lo.abs().max(hi.abs());
            (-bound, bound)
        } else {
            (lo, hi)
        }
    }
}

impl Figure for BrainSlice {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> String {
        let [nx, ny, _] = self.mask.shape();
        let z = self.slice_index();
        let panel_w = nx as u32 * CELL;
        let panel_h = ny as u32 * CELL;
        let count = self.panels.len().max(1) as u32;
        let width = count * (panel_w + GAP) + GAP;
        let height = HEADER + panel_h + 2 * GAP;
        let (vmin, vmax) = self.range();
        let inside = self.mask.to_volume();
        let inside = inside.index_axis(Axis(2), z);

        let mut elements = Vec::new();
        for (i, (title, values)) in self.panels.iter().enumerate() {
            let x0 = GAP + i as u32 * (panel_w + GAP);
            elements.push(text(x0 as f64, (HEADER - 10) as f64, 11, title));
            let volume = self.mask.unmask(values.view());
            let plane = volume.index_axis(Axis(2), z);
            for ((x, y), value) in plane.indexed_iter() {
                let fill = if inside[[x, y]] {
                    self.colormap.color(*value, vmin, vmax)
                } else {
                    BACKGROUND.to_string()
                };
                // y grows upwards in the volume
                let py = HEADER + (ny - 1 - y) as u32 * CELL;
                elements.push(format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                    x0 + x as u32 * CELL,
                    py,
                    CELL,
                    CELL,
                    fill
                ));
            }
        }
        elements.push(text(
            GAP as f64,
            (height - GAP / 2) as f64,
            10,
            &format!("z = {}, scale {:.3} to {:.3}", z, vmin, vmax),
        ));

        wrap_svg(width, height, &elements.join("\n  "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn mask() -> Mask {
        Mask::from_coords([2, 2, 3], vec![[0, 0, 1], [1, 1, 1], [0, 1, 2]])
    }

    #[test]
    fn slice_is_clamped() {
        assert_eq!(BrainSlice::new("b", mask(), 99).slice_index(), 2);
    }

    #[test]
    fn signed_maps_use_symmetric_range() {
        let figure = BrainSlice::new("b", mask(), 1).panel("w", array![-2.0, 1.0, 0.5]);
        assert_eq!(figure.range(), (-2.0, 2.0));
        let figure = BrainSlice::new("b", mask(), 1).panel("s", array![0.2, 0.6, f64::NAN]);
        assert_eq!(figure.range(), (0.2, 0.6));
    }

    #[test]
    fn voxels_outside_mask_use_background() {
        let svg = BrainSlice::new("b", mask(), 1)
            .panel("a", array![1.0, 0.0, 0.5])
            .panel("b", array![0.0, 1.0, 0.5])
            .render();
        // two panels of a 2x2 plane with two masked voxels each
        assert_eq!(svg.matches(BACKGROUND).count(), 4);
    }
}
