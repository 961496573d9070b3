use crate::error::{Error, Result};
use nalgebra::SVector;
use rand::Rng;

/// Rectangular simulation cell with axis-aligned bounds and periodic images
/// along every axis.
///
/// The cell is immutable: a resize means building a new domain.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicDomain<const D: usize> {
    lower: SVector<f64, D>,
    upper: SVector<f64, D>,
    lengths: SVector<f64, D>,
    half_lengths: SVector<f64, D>,
    volume: f64,
}

impl<const D: usize> PeriodicDomain<D> {
    /// Create a box spanning `[0, edges[k])` along each axis.
    pub fn new(edges: [f64; D]) -> Result<Self> {
        Self::with_bounds(SVector::zeros(), SVector::from(edges))
    }

    /// Create a box from an edge list whose length must equal `D`.
    pub fn from_slice(edges: &[f64]) -> Result<Self> {
        let edges: [f64; D] = edges.try_into().map_err(|_| {
            Error::config(format!(
                "expected {D} box edge lengths, got {}",
                edges.len()
            ))
        })?;
        Self::new(edges)
    }

    /// Create a box from explicit lower and upper corners.
    pub fn with_bounds(lower: SVector<f64, D>, upper: SVector<f64, D>) -> Result<Self> {
        if !(1..=3).contains(&D) {
            return Err(Error::config(format!(
                "domain dimensionality must be 1, 2 or 3, got {D}"
            )));
        }
        for k in 0..D {
            if !lower[k].is_finite() || !upper[k].is_finite() || upper[k] <= lower[k] {
                return Err(Error::config(format!(
                    "axis {k}: upper bound {} must be finite and exceed lower bound {}",
                    upper[k], lower[k]
                )));
            }
        }

        let lengths = upper - lower;
        Ok(Self {
            lower,
            upper,
            lengths,
            half_lengths: lengths * 0.5,
            volume: lengths.product(),
        })
    }

    pub fn ndim(&self) -> usize {
        D
    }

    pub fn lower(&self) -> &SVector<f64, D> {
        &self.lower
    }

    pub fn upper(&self) -> &SVector<f64, D> {
        &self.upper
    }

    pub fn lengths(&self) -> &SVector<f64, D> {
        &self.lengths
    }

    pub fn half_lengths(&self) -> &SVector<f64, D> {
        &self.half_lengths
    }

    /// Product of the per-axis extents.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Half of the shortest box edge; the largest cutoff that cannot see two
    /// images of the same particle.
    pub fn min_half_length(&self) -> f64 {
        self.half_lengths.min()
    }

    /// Apply the minimum-image convention to a separation vector.
    ///
    /// Components already inside `[-L/2, L/2]` are left alone, so applying
    /// the wrap twice gives the same vector as applying it once.
    #[inline]
    pub fn wrap(&self, mut d: SVector<f64, D>) -> SVector<f64, D> {
        for k in 0..D {
            if d[k].abs() > self.half_lengths[k] {
                let l = self.lengths[k];
                d[k] -= l * (d[k] / l).round();
            }
        }
        d
    }

    /// Draw a point uniformly from the box, independently per axis.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> SVector<f64, D> {
        SVector::from_fn(|k, _| rng.gen_range(self.lower[k]..self.upper[k]))
    }
}
