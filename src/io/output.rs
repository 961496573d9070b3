//! Output formatting and logging utilities

use color_eyre::eyre::{Result, WrapErr};
use ljmc::tally::{self, Averages, Sample};
use ljmc::{MoveStatistics, SweepResult, XyzWriter};
use nalgebra::SVector;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    filter::LevelFilter, fmt::format::Writer, fmt::layer, fmt::time::FormatTime,
    layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = StdSystemTime::now();
        let duration = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup logging to a file or stdout
pub fn setup_output(log_path: Option<&String>, verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    match log_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).with(level).init();
                info!("Log will be written to: {}", path);
            }
            Err(err) => eprintln!("Could not create log file {}: {}", path, err),
        },
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).with(level).init();
        }
    }
}

/// The files one run writes, all named after a common prefix.
pub struct OutputFiles {
    prefix: String,
    data: BufWriter<File>,
    trajectory: Option<XyzWriter<BufWriter<File>>>,
}

impl OutputFiles {
    /// Create `<prefix>.data` and, when requested, `<prefix>.xyz`.
    pub fn create(prefix: &str, write_trajectory: bool) -> Result<Self> {
        let data_path = format!("{prefix}.data");
        let file = File::create(&data_path)
            .wrap_err_with(|| format!("Unable to create {data_path}"))?;
        let mut data = BufWriter::new(file);
        tally::write_data_header(&mut data)?;

        let trajectory = if write_trajectory {
            let xyz_path = format!("{prefix}.xyz");
            let writer = XyzWriter::create(&xyz_path)
                .wrap_err_with(|| format!("Unable to create {xyz_path}"))?;
            Some(writer)
        } else {
            None
        };

        Ok(Self {
            prefix: prefix.to_string(),
            data,
            trajectory,
        })
    }

    pub fn record<const D: usize>(
        &mut self,
        sample: &Sample,
        positions: &[SVector<f64, D>],
    ) -> Result<()> {
        tally::write_sample(&mut self.data, sample)?;
        if let Some(xyz) = self.trajectory.as_mut() {
            xyz.write_frame(sample.step, positions)?;
        }
        Ok(())
    }

    /// Flush the series and write `<prefix>.ave` and `<prefix>.moves`.
    pub fn finish(
        mut self,
        averages: Option<&Averages>,
        stats: &MoveStatistics,
        temperature: f64,
        chemical_potential: Option<f64>,
    ) -> Result<()> {
        self.data.flush()?;
        if let Some(xyz) = self.trajectory.as_mut() {
            xyz.flush()?;
            info!("Wrote {} trajectory frames to {}.xyz", xyz.frames(), self.prefix);
        }

        if let Some(averages) = averages {
            let mut ave = create(&format!("{}.ave", self.prefix))?;
            tally::write_averages(&mut ave, averages, temperature, chemical_potential)?;
            ave.flush()?;
        }

        let mut moves = create(&format!("{}.moves", self.prefix))?;
        tally::write_move_ratios(&mut moves, stats)?;
        moves.flush()?;
        Ok(())
    }
}

/// Write the sweep table to `<prefix>.sweep`.
pub fn write_sweep_file(prefix: &str, results: &[SweepResult]) -> Result<()> {
    let mut out = create(&format!("{prefix}.sweep"))?;
    ljmc::sweep::write_sweep(&mut out, results)?;
    out.flush()?;
    Ok(())
}

fn create(path: &str) -> Result<BufWriter<File>> {
    let file = File::create(path).wrap_err_with(|| format!("Unable to create {path}"))?;
    Ok(BufWriter::new(file))
}
