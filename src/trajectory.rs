use crate::error::Result;
use nalgebra::SVector;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes configurations as XYZ frames, one `C x y z` line per particle.
/// Missing axes of 1-D and 2-D systems are written as `0.0`.
pub struct XyzWriter<W: Write> {
    out: W,
    frames: usize,
}

impl XyzWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> XyzWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    pub fn write_frame<const D: usize>(
        &mut self,
        step: u64,
        positions: &[SVector<f64, D>],
    ) -> Result<()> {
        writeln!(self.out, "{}\nframe {}", positions.len(), step)?;
        for p in positions {
            let coord = |k: usize| if k < D { p[k] } else { 0.0 };
            writeln!(self.out, "C {:.6} {:.6} {:.6}", coord(0), coord(1), coord(2))?;
        }
        self.frames += 1;
        Ok(())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
