//! Sampling records and running statistics.
//!
//! The engine hands out one [`Sample`] per sampling point; the writers below
//! produce the `.data` series, the `.ave` averages and the `.moves`
//! acceptance summary.

use crate::error::Result;
use crate::gcmc::MoveStatistics;
use std::io::Write;

/// State of the simulation at one sampling point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Number of Monte Carlo steps executed when the sample was taken
    pub step: u64,
    pub pressure: f64,
    /// Total potential energy
    pub energy: f64,
    pub density: f64,
    pub active_count: usize,
    pub volume: f64,
}

/// Mean and population standard deviation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

impl MeanStd {
    fn of(values: impl Iterator<Item = f64> + Clone) -> Self {
        let n = values.clone().count();
        if n == 0 {
            return Self::default();
        }
        let mean = values.clone().sum::<f64>() / n as f64;
        let variance = values.map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        Self {
            mean,
            std: variance.sqrt(),
        }
    }
}

/// Averages over every recorded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub pressure: MeanStd,
    pub energy: MeanStd,
    pub density: MeanStd,
    pub active_count: MeanStd,
    pub volume: MeanStd,
}

impl Averages {
    /// Ideal-gas chemical potential `T·ln(ρ)` at the mean density and its
    /// propagated uncertainty `T·σ_ρ/ρ`.
    pub fn ideal_chemical_potential(&self, temperature: f64) -> MeanStd {
        let rho = self.density.mean;
        MeanStd {
            mean: -temperature * (1.0 / rho).ln(),
            std: temperature * self.density.std / rho,
        }
    }
}

/// Accumulates samples over the production phase.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    samples: Vec<Sample>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// `None` until at least one sample was recorded.
    pub fn averages(&self) -> Option<Averages> {
        if self.samples.is_empty() {
            return None;
        }
        let s = &self.samples;
        Some(Averages {
            pressure: MeanStd::of(s.iter().map(|x| x.pressure)),
            energy: MeanStd::of(s.iter().map(|x| x.energy)),
            density: MeanStd::of(s.iter().map(|x| x.density)),
            active_count: MeanStd::of(s.iter().map(|x| x.active_count as f64)),
            volume: MeanStd::of(s.iter().map(|x| x.volume)),
        })
    }
}

pub fn write_data_header<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "# step P U rho V N")?;
    Ok(())
}

/// One line of the `.data` series.
pub fn write_sample<W: Write>(writer: &mut W, sample: &Sample) -> Result<()> {
    writeln!(
        writer,
        "{} {:.6} {:.6} {:.6} {:.6} {}",
        sample.step,
        sample.pressure,
        sample.energy,
        sample.density,
        sample.volume,
        sample.active_count
    )?;
    Ok(())
}

/// The `.ave` summary: averages followed by their standard deviations.
pub fn write_averages<W: Write>(
    writer: &mut W,
    averages: &Averages,
    temperature: f64,
    chemical_potential: Option<f64>,
) -> Result<()> {
    let mu_ideal = averages.ideal_chemical_potential(temperature);

    write!(writer, "# ")?;
    if chemical_potential.is_some() {
        write!(writer, "mu ")?;
    }
    writeln!(writer, "T rho P U N V mu_ideal, stds")?;

    if let Some(mu) = chemical_potential {
        write!(writer, "{mu:.6} ")?;
    }
    writeln!(
        writer,
        "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
        temperature,
        averages.density.mean,
        averages.pressure.mean,
        averages.energy.mean,
        averages.active_count.mean,
        averages.volume.mean,
        mu_ideal.mean,
        averages.density.std,
        averages.pressure.std,
        averages.energy.std,
        averages.active_count.std,
        averages.volume.std,
        mu_ideal.std
    )?;
    Ok(())
}

/// The `.moves` summary: acceptance ratio per move kind.
pub fn write_move_ratios<W: Write>(writer: &mut W, stats: &MoveStatistics) -> Result<()> {
    writeln!(writer, "# fa_translate fa_insert fa_delete")?;
    let [translate, insert, delete] = stats.acceptance_ratios();
    writeln!(writer, "{translate:.6} {insert:.6} {delete:.6}")?;
    Ok(())
}
