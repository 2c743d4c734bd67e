//! Brain mask: flattens 4D volumes into trial × voxel matrices and projects
//! voxel vectors back into the volume.

use crate::error::DatasetError;
use ndarray::{Array2, Array3, ArrayD, ArrayView1, Ix3};
use serde::{Deserialize, Serialize};

/// Voxel coordinates selected by a 3D mask, in C order over (x, y, z).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    shape: [usize; 3],
    coords: Vec<[usize; 3]>,
}

impl Mask {
    /// Every voxel where the volume is non-zero. A trailing singleton
    /// fourth axis is accepted.
    pub fn from_volume(volume: &ArrayD<f32>) -> Result<Self, DatasetError> {
        let shape = spatial_shape(volume.shape()).ok_or_else(|| DatasetError::MaskShape {
            shape: volume.shape().to_vec(),
        })?;
        let mut coords = Vec::new();
        for x in 0..shape[0] {
            for y in 0..shape[1] {
                for z in 0..shape[2] {
                    let value = if volume.ndim() == 3 {
                        volume[[x, y, z].as_slice()]
                    } else {
                        volume[[x, y, z, 0].as_slice()]
                    };
                    if value != 0.0 && value.is_finite() {
                        coords.push([x, y, z]);
                    }
                }
            }
        }
        Ok(Self { shape, coords })
    }

    /// Mask from explicit coordinates, kept in the order given.
    pub fn from_coords(shape: [usize; 3], coords: Vec<[usize; 3]>) -> Self {
        Self { shape, coords }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn coords(&self) -> &[[usize; 3]] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Extract a (volumes × voxels) matrix from a 4D series. Non-finite
    /// samples become zero.
    pub fn apply(&self, series: &ArrayD<f32>) -> Result<Array2<f64>, DatasetError> {
        let dims = series.shape();
        let spatial = if dims.len() == 3 {
            dims.to_vec()
        } else if dims.len() == 4 {
            dims[..3].to_vec()
        } else {
            return Err(DatasetError::MaskMismatch {
                mask: self.shape.to_vec(),
                volume: dims.to_vec(),
            });
        };
        if spatial != self.shape {
            return Err(DatasetError::MaskMismatch {
                mask: self.shape.to_vec(),
                volume: spatial,
            });
        }
        let volumes = if dims.len() == 4 { dims[3] } else { 1 };

        let mut out = Array2::zeros((volumes, self.coords.len()));
        for t in 0..volumes {
            for (v, &[x, y, z]) in self.coords.iter().enumerate() {
                let value = if dims.len() == 4 {
                    series[[x, y, z, t].as_slice()]
                } else {
                    series[[x, y, z].as_slice()]
                };
                out[[t, v]] = if value.is_finite() { value as f64 } else { 0.0 };
            }
        }
        Ok(out)
    }

    /// Project one value per voxel back into the volume; unmasked voxels are 0.
    pub fn unmask(&self, values: ArrayView1<f64>) -> Array3<f64> {
        let mut volume = Array3::zeros(self.shape);
        for (value, &[x, y, z]) in values.iter().zip(&self.coords) {
            volume[[x, y, z]] = *value;
        }
        volume
    }

    /// Boolean volume of the mask.
    pub fn to_volume(&self) -> ndarray::Array<bool, Ix3> {
        let mut volume = ndarray::Array::from_elem(self.shape, false);
        for &[x, y, z] in &self.coords {
            volume[[x, y, z]] = true;
        }
        volume
    }
}

fn spatial_shape(dims: &[usize]) -> Option<[usize; 3]> {
    match dims {
        [x, y, z] => Some([*x, *y, *z]),
        [x, y, z, 1] => Some([*x, *y, *z]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, IxDyn};

    fn mask_volume() -> ArrayD<f32> {
        let mut volume = ArrayD::zeros(IxDyn(&[2, 2, 2]));
        volume[[0, 1, 0].as_slice()] = 1.0;
        volume[[1, 0, 1].as_slice()] = 1.0;
        volume[[1, 1, 1].as_slice()] = 3.0;
        volume
    }

    #[test]
    fn coordinates_follow_c_order() {
        let mask = Mask::from_volume(&mask_volume()).unwrap();
        assert_eq!(mask.coords(), &[[0, 1, 0], [1, 0, 1], [1, 1, 1]]);
        assert_eq!(mask.len(), 3);
    }

    #[test]
    fn apply_extracts_series_and_zeroes_non_finite() {
        let mask = Mask::from_volume(&mask_volume()).unwrap();
        let mut series = ArrayD::zeros(IxDyn(&[2, 2, 2, 2]));
        series[[0, 1, 0, 0].as_slice()] = 5.0;
        series[[1, 1, 1, 1].as_slice()] = f32::NAN;
        series[[1, 0, 1, 1].as_slice()] = 2.0;

        let matrix = mask.apply(&series).unwrap();
        assert_eq!(matrix.shape(), &[2, 3]);
        assert_eq!(matrix[[0, 0]], 5.0);
        assert_eq!(matrix[[1, 1]], 2.0);
        assert_eq!(matrix[[1, 2]], 0.0);
    }

    #[test]
    fn apply_rejects_shape_mismatch() {
        let mask = Mask::from_volume(&mask_volume()).unwrap();
        let series = ArrayD::zeros(IxDyn(&[3, 2, 2, 4]));
        assert!(matches!(
            mask.apply(&series),
            Err(DatasetError::MaskMismatch { .. })
        ));
    }

    #[test]
    fn four_volume_mask_is_rejected() {
        let volume = ArrayD::zeros(IxDyn(&[2, 2, 2, 4]));
        match Mask::from_volume(&volume) {
            Err(DatasetError::MaskShape { shape }) => assert_eq!(shape, vec![2, 2, 2, 4]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unmask_restores_positions() {
        let mask = Mask::from_volume(&mask_volume()).unwrap();
        let volume = mask.unmask(arr1(&[1.0, 2.0, 3.0]).view());
        assert_eq!(volume[[0, 1, 0]], 1.0);
        assert_eq!(volume[[1, 0, 1]], 2.0);
        assert_eq!(volume[[1, 1, 1]], 3.0);
        assert_eq!(volume.sum(), 6.0);
        assert!(mask.to_volume()[[1, 1, 1]]);
    }
}
