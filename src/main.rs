//! Lennard-Jones Monte Carlo command-line interface
//!
//! Runs NVT or μVT simulations configured from YAML and command-line switches.

use color_eyre::eyre::Result;

mod app;
mod io;

fn main() -> Result<()> {
    color_eyre::install()?;
    app::McApplication::from_cli()?.run()
}
