//! Decoders for the Thales record formats and the `.ism` spectrum encoder.
//!
//! Every decoder keeps the original bytes of its source and exposes the
//! decoded tracks as plain `Vec<f64>` arrays. Sub-blocks that fail to decode
//! degrade to [`DecodeWarning`]s stored on the record instead of aborting.

pub mod acq;
pub mod compensation;
pub mod error;
pub mod export;
pub mod isc;
pub mod ism;
pub mod iss;
pub mod isw;
pub mod popf;
pub mod range;
pub mod scan;
pub mod seqtxt;
pub mod smoothing;
pub mod source;

pub use acq::{AcqChannel, AcqStatus, AcqTable};
pub use compensation::{CompensationData, CompensationError, SetupCompensation};
pub use error::{DecodeError, DecodeWarning};
pub use export::{ExportError, ExportMetadata, IsmExport};
pub use isc::{CvScanParameters, IscRecord};
pub use ism::{IsmMetadata, IsmSpectrum};
pub use iss::{IssRecord, PolarizationParameters};
pub use isw::IswRecord;
pub use popf::{PopfLayout, PotentialScaling, ScalingSource};
pub use range::{FrequencyRange, Span};
pub use scan::ScanMetadata;
pub use seqtxt::SeqTxtRecord;
pub use smoothing::{savgol_filter, smooth_spectrum, SmoothingError};
pub use source::{SourceFile, ThalesFile};
