//! Text and JSON summaries of decoded records.

use chrono::NaiveDateTime;
use isfx_model::CircuitModel;
use serde::Serialize;
use thales_import::{
    AcqStatus, DecodeWarning, IscRecord, IsmSpectrum, IssRecord, IswRecord, PotentialScaling,
    ScanMetadata, SeqTxtRecord, Span, ThalesFile,
};

use crate::config::OutputFormat;
use crate::fitting::FitOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    pub values: Vec<f64>,
}

impl Track {
    pub fn new(name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        Self {
            name: name.into(),
            values: values.into(),
        }
    }

    /// Smallest and largest finite value.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub file: String,
    pub kind: String,
    pub fields: Vec<Field>,
    pub tracks: Vec<Track>,
    pub warnings: Vec<String>,
    /// Free-form text block, used for circuit listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<String>,
}

fn date_text(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl Report {
    fn new(file: &str, kind: &str) -> Self {
        Self {
            file: file.to_string(),
            kind: kind.to_string(),
            fields: Vec::new(),
            tracks: Vec::new(),
            warnings: Vec::new(),
            listing: None,
        }
    }

    fn field(&mut self, name: &str, value: impl ToString) -> &mut Self {
        self.fields.push(Field {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    fn track(&mut self, name: &str, values: impl Into<Vec<f64>>) -> &mut Self {
        self.tracks.push(Track::new(name, values));
        self
    }

    fn warnings(&mut self, warnings: &[DecodeWarning]) -> &mut Self {
        self.warnings.extend(warnings.iter().map(|w| w.to_string()));
        self
    }

    fn scan_metadata(&mut self, metadata: &ScanMetadata, scaling: &PotentialScaling) -> &mut Self {
        self.field("date", &metadata.date)
            .field("system", &metadata.system)
            .field("temperature", &metadata.temperature)
            .field("time", &metadata.time)
            .field("slew rate", &metadata.slew_rate)
            .field("electrode area", &metadata.electrode_area)
            .field("popf", &metadata.popf)
            .field(
                "potential scaling",
                format!(
                    "offset {} factor {} ({:?})",
                    scaling.offset, scaling.factor, scaling.source
                ),
            );
        for comment in metadata.comments.iter().filter(|c| !c.is_empty()) {
            self.field("comment", comment);
        }
        self
    }

    pub fn spectrum(spectrum: &IsmSpectrum, span: Span) -> Self {
        let mut r = Self::new(spectrum.file_name(), "impedance spectrum");
        let range = spectrum.range();
        let frequency = spectrum.frequency_in(span);
        r.field("version", spectrum.version())
            .field("samples", format!("{} of {}", frequency.len(), spectrum.number_of_samples()))
            .field("sweep", format!("{}..{}", range.from_index, range.to_index))
            .field("reversed", range.swap_necessary)
            .field("measured", date_text(spectrum.measurement_date()))
            .field("start", date_text(spectrum.measurement_start()))
            .field("end", date_text(spectrum.measurement_end()));
        if let Some(m) = spectrum.metadata() {
            r.field("system", &m.system)
                .field("potential", &m.potential)
                .field("current", &m.current)
                .field("temperature", &m.temperature)
                .field("electrode area", &m.electrode_area)
                .field("amplitude/V", m.amplitude());
            for comment in m.comments.iter().filter(|c| !c.is_empty()) {
                r.field("comment", comment);
            }
        }
        r.field("trailing bytes", spectrum.trailing_metadata().len());

        let significance: Vec<f64> = spectrum
            .significance_in(span)
            .into_iter()
            .map(f64::from)
            .collect();
        let phase_degrees: Vec<f64> = spectrum
            .phase_in(span)
            .into_iter()
            .map(f64::to_degrees)
            .collect();
        r.track("Frequency/Hz", frequency)
            .track("Impedance/Ohm", spectrum.impedance_in(span))
            .track("Phase/deg", phase_degrees)
            .track("Significance", significance);
        for channel in spectrum.acq_channels() {
            r.track(&channel.name, channel.values.clone());
        }
        r.warnings(spectrum.warnings());
        r
    }

    pub fn cv(record: &IscRecord) -> Self {
        let mut r = Self::new(record.file_name(), "cyclic voltammogram");
        let p = record.parameters();
        r.field("samples", record.number_of_samples())
            .field("scan rate/(V/s)", record.scan_rate())
            .field("upper potential/V", p.p_upper)
            .field("lower potential/V", p.p_lower)
            .field("periods", p.periods)
            .field("start", date_text(record.measurement_start()))
            .field("end", date_text(record.measurement_end()))
            .scan_metadata(record.metadata(), record.scaling());
        let acq = match record.acq_status() {
            AcqStatus::NotPresent => "not present".to_string(),
            AcqStatus::Decoded => format!("{} channels", record.acq_channels().len()),
            AcqStatus::Failed(w) => format!("failed: {}", w),
        };
        r.field("acq", acq)
            .track("Voltage/V", record.voltage())
            .track("Current/A", record.current())
            .track("Time/s", record.time());
        for channel in record.acq_channels() {
            r.track(&channel.name, channel.values.clone());
        }
        r.warnings(record.warnings());
        r
    }

    pub fn polarization(record: &IssRecord) -> Self {
        let mut r = Self::new(record.file_name(), "current/voltage curve");
        let p = record.parameters();
        r.field("samples", record.number_of_samples())
            .field("edge potentials/V", format!("{:?}", p.edge_potentials))
            .field("resolution", p.resolution)
            .field("ohmic drop", p.ohmic_drop)
            .field("start", date_text(record.measurement_start()))
            .field("end", date_text(record.measurement_end()))
            .scan_metadata(record.metadata(), record.scaling())
            .track("Voltage/V", record.voltage())
            .track("Current/A", record.current())
            .track("Time/s", record.time())
            .warnings(record.warnings());
        r
    }

    pub fn sweep(record: &IswRecord) -> Self {
        let mut r = Self::new(record.file_name(), "polarization sweep");
        r.field("version", record.version())
            .field("samples", record.number_of_samples())
            .track("Voltage/V", record.voltage())
            .track("Current/A", record.current())
            .track("Time/s", record.time());
        r
    }

    pub fn sequence(record: &SeqTxtRecord) -> Self {
        let mut r = Self::new(record.file_name(), "sequence text");
        r.field("rows", record.number_of_rows())
            .field("tracks", record.track_names().len());
        for (name, values) in record.tracks() {
            r.track(name, values);
        }
        r
    }

    pub fn model(model: &CircuitModel) -> Self {
        let mut r = Self::new(model.file_name(), "circuit model");
        r.field("elements", model.elements().len());
        for element in model.elements() {
            for p in &element.parameters {
                r.field(
                    &format!("{}.{}", element.name, p.name),
                    format!("{} {}{}", p.value, p.unit, if p.fixed { " (fixed)" } else { "" }),
                );
            }
        }
        r.listing = Some(model.to_string());
        r
    }

    pub fn fit_outcome(outcome: &FitOutcome) -> Self {
        let mut r = Self::model(&outcome.fitted_model);
        r.kind = "fit result".to_string();
        if let Some(error) = outcome.overall_error() {
            r.field("overall error", error);
        }
        r.field("fitted samples", outcome.fit_input.number_of_samples())
            .track("Frequency/Hz", outcome.fitted_simulated.frequency())
            .track("Simulated impedance/Ohm", outcome.fitted_simulated.impedance());
        r
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("─── {} ({}) ───\n", self.file, self.kind));
        for f in &self.fields {
            out.push_str(&format!("  {:<20} {}\n", f.name, f.value));
        }
        if !self.tracks.is_empty() {
            out.push_str("  tracks:\n");
            for t in &self.tracks {
                match t.bounds() {
                    Some((lo, hi)) => out.push_str(&format!(
                        "    {:<24} {:>6} values  [{:.4e} .. {:.4e}]\n",
                        t.name,
                        t.values.len(),
                        lo,
                        hi
                    )),
                    None => out.push_str(&format!("    {:<24} {:>6} values\n", t.name, t.values.len())),
                }
            }
        }
        if let Some(listing) = &self.listing {
            out.push_str("  circuit:\n");
            for line in listing.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
        if !self.warnings.is_empty() {
            out.push_str("  warnings:\n");
            for w in &self.warnings {
                out.push_str(&format!("    - {}\n", w));
            }
        }
        out
    }
}
