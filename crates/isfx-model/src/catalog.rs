//! Circuit element types and the names/units of their parameters.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ElementType {
    Resistor,
    Inductor,
    Capacitor,
    SphericalDiffusion,
    YoungGoehrImpedance,
    WarburgImpedance,
    NernstDiffusion,
    FiniteDiffusion,
    HomogenousReactionImpedance,
    ConstantPhaseElement,
    /// User-defined or unknown element, keyed by its XML tag.
    Other(String),
}

impl ElementType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "resistor" => ElementType::Resistor,
            "inductor" => ElementType::Inductor,
            "capacitor" => ElementType::Capacitor,
            "spherical-diffusion" => ElementType::SphericalDiffusion,
            "young-goehr-impedance" => ElementType::YoungGoehrImpedance,
            "warburg-impedance" => ElementType::WarburgImpedance,
            "nernst-diffusion" => ElementType::NernstDiffusion,
            "finite-diffusion" => ElementType::FiniteDiffusion,
            "homogenous-reaction-impedance" => ElementType::HomogenousReactionImpedance,
            "constant-phase-element" => ElementType::ConstantPhaseElement,
            other => ElementType::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ElementType::Resistor => "resistor",
            ElementType::Inductor => "inductor",
            ElementType::Capacitor => "capacitor",
            ElementType::SphericalDiffusion => "spherical-diffusion",
            ElementType::YoungGoehrImpedance => "young-goehr-impedance",
            ElementType::WarburgImpedance => "warburg-impedance",
            ElementType::NernstDiffusion => "nernst-diffusion",
            ElementType::FiniteDiffusion => "finite-diffusion",
            ElementType::HomogenousReactionImpedance => "homogenous-reaction-impedance",
            ElementType::ConstantPhaseElement => "constant-phase-element",
            ElementType::Other(tag) => tag,
        }
    }

    /// Catalog entries by parameter index; empty for [`ElementType::Other`].
    pub fn parameters(&self) -> &'static [ParameterInfo] {
        match self {
            ElementType::Resistor => RESISTOR,
            ElementType::Inductor => INDUCTOR,
            ElementType::Capacitor => CAPACITOR,
            ElementType::SphericalDiffusion => SPHERICAL_DIFFUSION,
            ElementType::YoungGoehrImpedance => YOUNG_GOEHR,
            ElementType::WarburgImpedance => WARBURG,
            ElementType::NernstDiffusion => NERNST_DIFFUSION,
            ElementType::FiniteDiffusion => FINITE_DIFFUSION,
            ElementType::HomogenousReactionImpedance => HOMOGENOUS_REACTION,
            ElementType::ConstantPhaseElement => CONSTANT_PHASE_ELEMENT,
            ElementType::Other(_) => &[],
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub unit: &'static str,
}

const fn info(name: &'static str, unit: &'static str) -> ParameterInfo {
    ParameterInfo { name, unit }
}

const RESISTOR: &[ParameterInfo] = &[info("R", "Ω")];
const INDUCTOR: &[ParameterInfo] = &[info("L", "H")];
const CAPACITOR: &[ParameterInfo] = &[info("C", "F")];
const SPHERICAL_DIFFUSION: &[ParameterInfo] = &[info("W", "Ωs^(-½)"), info("k", "1/s")];
const YOUNG_GOEHR: &[ParameterInfo] = &[info("C", "F"), info("p", ""), info("T", "s")];
const WARBURG: &[ParameterInfo] = &[info("W", "Ωs^(-½)")];
const NERNST_DIFFUSION: &[ParameterInfo] = &[info("W", "Ωs^(-½)"), info("k", "1/s")];
const FINITE_DIFFUSION: &[ParameterInfo] = &[info("W", "Ωs^(-½)"), info("k", "1/s")];
const HOMOGENOUS_REACTION: &[ParameterInfo] = &[info("W", "Ωs^(-½)"), info("k", "1/s")];
const CONSTANT_PHASE_ELEMENT: &[ParameterInfo] =
    &[info("C_eq", "F"), info("α", ""), info("f_norm", "Hz")];

/// Name and unit of parameter `index` of `element_type`.
pub fn parameter_info(element_type: &ElementType, index: usize) -> Option<ParameterInfo> {
    element_type.parameters().get(index).copied()
}
