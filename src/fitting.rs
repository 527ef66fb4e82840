//! Seam towards a remote equivalent-circuit fitting service.
//!
//! The tool does not fit models itself. A [`FitService`] implementation is
//! handed a [`FitJob`] holding the model and spectra as raw file parts and
//! answers with the raw files of the result, which are decoded here with the
//! same decoders used for files on disk.

use isfx_model::{CircuitModel, ModelError};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use thales_import::{DecodeError, IsmSpectrum, ThalesFile};
use thiserror::Error;

pub const FIT_RESULT_FILE: &str = "fit_result.json";
pub const FITTED_MODEL_FILE: &str = "fitted.isfx";
pub const FITTED_SIMULATED_FILE: &str = "fitted_simulated.ism";
pub const FIT_INPUT_FILE: &str = "fit_samples.ism";

#[derive(Error, Debug)]
pub enum FitServiceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("fitting service unavailable: {0}")]
    Unavailable(String),
    #[error("fitting service rejected the job: {0}")]
    Rejected(String),
    #[error("invalid fit result JSON: {0}")]
    InvalidResult(#[from] serde_json::Error),
    #[error("invalid fitted model: {0}")]
    Model(#[from] ModelError),
    #[error("invalid fitted spectrum: {0}")]
    Spectrum(#[from] DecodeError),
}

/// A named file sent to or received from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Model and spectra to fit, plus service-specific options.
#[derive(Debug, Clone)]
pub struct FitJob {
    pub model: FilePart,
    pub samples: Vec<FilePart>,
    pub options: Value,
}

impl FitJob {
    /// Job built from the original bytes of a decoded model and spectra.
    pub fn new(model: &CircuitModel, samples: &[&IsmSpectrum]) -> Self {
        Self {
            model: FilePart::new(model.file_name(), model.binary_content()),
            samples: samples
                .iter()
                .map(|s| FilePart::new(s.file_name(), s.binary_content()))
                .collect(),
            options: Value::Null,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

/// Raw files returned by a service.
#[derive(Debug, Clone)]
pub struct FitResponse {
    pub result_json: Vec<u8>,
    pub fitted_model: FilePart,
    pub fitted_simulated: FilePart,
    pub fit_input: FilePart,
}

pub trait FitService {
    fn submit(&self, job: &FitJob) -> Result<FitResponse, FitServiceError>;
}

/// Decoded fit result.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Per-element parameter values, errors and significances plus overall
    /// error figures, as reported by the service.
    pub result: Value,
    pub fitted_model: CircuitModel,
    /// Spectrum simulated from the fitted model.
    pub fitted_simulated: IsmSpectrum,
    /// Samples the service actually fitted.
    pub fit_input: IsmSpectrum,
}

impl FitOutcome {
    pub fn decode(response: FitResponse) -> Result<Self, FitServiceError> {
        let result: Value = serde_json::from_slice(&response.result_json)?;
        let model_xml = String::from_utf8(response.fitted_model.bytes)
            .map_err(|e| ModelError::Xml(format!("fitted model is not UTF-8: {}", e)))?;
        Ok(Self {
            result,
            fitted_model: CircuitModel::from_xml(model_xml)?,
            fitted_simulated: IsmSpectrum::from_bytes(response.fitted_simulated.bytes)?,
            fit_input: IsmSpectrum::from_bytes(response.fit_input.bytes)?,
        })
    }

    /// Read a result folder written by [`FitOutcome::save`].
    pub fn load(dir: &Path) -> Result<Self, FitServiceError> {
        let json = std::fs::read_to_string(dir.join(FIT_RESULT_FILE))?;
        Ok(Self {
            result: serde_json::from_str(&json)?,
            fitted_model: CircuitModel::open(dir.join(FITTED_MODEL_FILE))?,
            fitted_simulated: IsmSpectrum::open(dir.join(FITTED_SIMULATED_FILE))?,
            fit_input: IsmSpectrum::open(dir.join(FIT_INPUT_FILE))?,
        })
    }

    /// Write all result files into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>, FitServiceError> {
        std::fs::create_dir_all(dir)?;
        let paths = vec![
            dir.join(FIT_RESULT_FILE),
            dir.join(FITTED_MODEL_FILE),
            dir.join(FITTED_SIMULATED_FILE),
            dir.join(FIT_INPUT_FILE),
        ];
        std::fs::write(&paths[0], serde_json::to_string_pretty(&self.result)?)?;
        self.fitted_model.save(&paths[1])?;
        self.fitted_simulated.save(&paths[2])?;
        self.fit_input.save(&paths[3])?;
        log::info!("Saved fit result to {}", dir.display());
        Ok(paths)
    }

    /// Fitted value of `parameter` of `element` from the result JSON.
    pub fn fitted_value(&self, element: &str, parameter: &str) -> Option<f64> {
        self.result
            .get("model")?
            .get(element)?
            .get(parameter)?
            .get("value")?
            .as_f64()
    }

    pub fn overall_error(&self) -> Option<f64> {
        self.result.get("overall")?.get("overall_error")?.as_f64()
    }
}

/// Submit `job` and decode the answer.
pub fn fit(service: &dyn FitService, job: &FitJob) -> Result<FitOutcome, FitServiceError> {
    log::info!(
        "Submitting fit of {} with {} spectra",
        job.model.file_name,
        job.samples.len()
    );
    let response = service.submit(job)?;
    let outcome = FitOutcome::decode(response)?;
    if let Some(error) = outcome.overall_error() {
        log::info!("Fit finished, overall error {:.4}", error);
    }
    Ok(outcome)
}
