//! thales-tools: inspect, convert and compensate Thales EIS measurement files.

use clap::Parser;
use isfx_model::CircuitModel;
use std::path::Path;
use thales_import::{
    smooth_spectrum, CompensationData, DecodeError, IscRecord, IsmExport, IsmSpectrum, IssRecord,
    IswRecord, SeqTxtRecord, SetupCompensation, ThalesFile,
};

use thales_tools::cli::{self, Cli, Command};
use thales_tools::{AppConfig, FitOutcome, Report, SessionLog};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let settings = cli.settings(config);
    log::debug!("Settings: {:?}", settings);

    let mut session = SessionLog::new();
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    session.record(cli.command.name(), &command_line);
    let result = run(&cli.command, &settings, &mut session);

    if let Some(path) = &cli.session_log {
        session.save(path)?;
        log::info!(
            "Session log written to {} ({} warning(s))",
            path.display(),
            session.warning_count()
        );
    }
    result
}

fn run(
    command: &Command,
    settings: &AppConfig,
    session: &mut SessionLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let span = cli::span(settings);
    let report = match command {
        Command::Ism { file } => Some(Report::spectrum(&IsmSpectrum::open(file)?, span)),
        Command::Cv { file } => Some(Report::cv(&IscRecord::open(file)?)),
        Command::Iss { file } => Some(Report::polarization(&IssRecord::open(file)?)),
        Command::Isw { file } => Some(Report::sweep(&IswRecord::open(file)?)),
        Command::Seqtxt { file } => Some(Report::sequence(&SeqTxtRecord::open(file)?)),
        Command::Model { file } => Some(Report::model(&CircuitModel::open(file)?)),
        Command::FitResult { dir } => Some(Report::fit_outcome(&FitOutcome::load(dir)?)),
        Command::Export {
            input,
            output,
            smooth,
        } => {
            let spectrum = IsmSpectrum::open(input)?;
            session.add_input(input);
            record_warnings(session, &spectrum);
            let spectrum = if *smooth {
                smooth_spectrum(
                    &spectrum,
                    settings.smoothing_window,
                    settings.smoothing_poly_order,
                )?
            } else {
                spectrum
            };
            write_spectrum(&spectrum, output)?;
            session.add_output(output);
            None
        }
        Command::Compensate {
            input,
            output,
            short,
            open,
            load,
            reference,
            ..
        } => {
            let mut term = |arg: &Option<String>| -> Result<Option<CompensationData>, DecodeError> {
                let Some(arg) = arg.as_deref() else {
                    return Ok(None);
                };
                let data = cli::compensation_term(arg)?;
                if let CompensationData::Measured(_) = data {
                    session.add_input(Path::new(arg));
                }
                Ok(Some(data))
            };
            let (short, open, load, reference) =
                (term(short)?, term(open)?, term(load)?, term(reference)?);
            let compensation = SetupCompensation::new(short, open, load, reference)?
                .with_smoothing(settings.smoothing_window, settings.smoothing_poly_order);
            let spectrum = IsmSpectrum::open(input)?;
            session.add_input(input);
            record_warnings(session, &spectrum);
            let compensated = compensation.compensate(&spectrum, settings.conjugate_short)?;
            write_spectrum(&compensated, output)?;
            session.add_output(output);
            None
        }
    };

    if let Some(report) = report {
        if let Command::FitResult { dir: path }
        | Command::Ism { file: path }
        | Command::Cv { file: path }
        | Command::Iss { file: path }
        | Command::Isw { file: path }
        | Command::Seqtxt { file: path }
        | Command::Model { file: path } = command
        {
            session.add_input(path);
        }
        for warning in &report.warnings {
            session.add_warning(warning);
        }
        println!("{}", report.render(settings.output_format)?);
    }
    Ok(())
}

fn record_warnings(session: &mut SessionLog, spectrum: &IsmSpectrum) {
    for warning in spectrum.warnings() {
        log::warn!("{}: {}", spectrum.file_name(), warning);
        session.add_warning(warning);
    }
}

fn write_spectrum(spectrum: &IsmSpectrum, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let export = IsmExport::from_spectrum(spectrum)?;
    export.write_to_file(output)?;
    log::debug!(
        "Exported {} samples of {} to {}",
        export.number_of_samples(),
        spectrum.file_name(),
        output.display()
    );
    Ok(())
}
