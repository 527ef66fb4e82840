//! Command line definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thales_import::{CompensationData, DecodeError, IsmSpectrum, Span, ThalesFile};

use crate::config::{AppConfig, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "thales-tools",
    version,
    about = "Inspect, convert and compensate Thales EIS measurement files"
)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Report every stored sample instead of the normalized sweep
    #[arg(long, default_value_t = false, global = true)]
    pub full: bool,

    /// Savitzky-Golay window length (overrides config)
    #[arg(long, global = true)]
    pub window: Option<usize>,

    /// Savitzky-Golay polynomial order (overrides config)
    #[arg(long, global = true)]
    pub poly_order: Option<usize>,

    /// Write a session log (JSON if the name ends in .json)
    #[arg(long, global = true)]
    pub session_log: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Impedance spectrum (.ism)
    Ism { file: PathBuf },
    /// Cyclic voltammogram (.isc)
    Cv { file: PathBuf },
    /// Current/voltage curve (.iss)
    Iss { file: PathBuf },
    /// Polarization sweep (.isw)
    Isw { file: PathBuf },
    /// Sequence text file
    Seqtxt { file: PathBuf },
    /// Circuit model (.isfx)
    Model { file: PathBuf },
    /// Saved fit result folder
    FitResult { dir: PathBuf },
    /// Re-export the normalized sweep of a spectrum as .ism
    Export {
        input: PathBuf,
        output: PathBuf,
        /// Smooth impedance and phase before writing
        #[arg(long, default_value_t = false)]
        smooth: bool,
    },
    /// Short/open/load compensation of a spectrum
    ///
    /// Each term is a constant impedance in ohms or the path of a measured
    /// .ism spectrum.
    Compensate {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        short: Option<String>,
        #[arg(long)]
        open: Option<String>,
        #[arg(long, requires = "reference")]
        load: Option<String>,
        #[arg(long, requires = "load")]
        reference: Option<String>,
        /// Conjugate the short term
        #[arg(long, default_value_t = false)]
        conjugate_short: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ism { .. } => "ism",
            Command::Cv { .. } => "cv",
            Command::Iss { .. } => "iss",
            Command::Isw { .. } => "isw",
            Command::Seqtxt { .. } => "seqtxt",
            Command::Model { .. } => "model",
            Command::FitResult { .. } => "fit-result",
            Command::Export { .. } => "export",
            Command::Compensate { .. } => "compensate",
        }
    }
}

impl Cli {
    /// Config values with the command line overrides applied.
    pub fn settings(&self, mut config: AppConfig) -> AppConfig {
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(window) = self.window {
            config.smoothing_window = window;
        }
        if let Some(order) = self.poly_order {
            config.smoothing_poly_order = order;
        }
        config.full_span |= self.full;
        if let Command::Compensate {
            conjugate_short, ..
        } = self.command
        {
            config.conjugate_short |= conjugate_short;
        }
        config
    }
}

pub fn span(config: &AppConfig) -> Span {
    if config.full_span {
        Span::Full
    } else {
        Span::Trimmed
    }
}

/// A constant impedance if `arg` is a number, otherwise a measured spectrum.
pub fn compensation_term(arg: &str) -> Result<CompensationData, DecodeError> {
    match arg.trim().parse::<f64>() {
        Ok(value) => Ok(value.into()),
        Err(_) => Ok(IsmSpectrum::open(arg)?.into()),
    }
}
