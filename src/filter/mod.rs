//! Admission filters applied to every attachment: extension and size.

pub mod extension;
pub mod size;

pub use extension::{extension_of, is_allowed, ExtensionPolicy};
pub use size::{is_within_limit, size_in_mib};
