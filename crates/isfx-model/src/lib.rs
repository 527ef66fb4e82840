//! Equivalent-circuit models stored as `.isfx` XML.
//!
//! The decoder reads the `<parsed-tree>` of a model, collects its circuit
//! elements and resolves parameter names and units from a fixed catalog.

pub mod catalog;
pub mod model;
pub mod xml;

pub use catalog::{parameter_info, ElementType, ParameterInfo};
pub use model::{CircuitElement, CircuitModel, ElementParameter, ModelError};
