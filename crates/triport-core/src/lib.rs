mod manifest;
mod spec;

pub use manifest::PortManifest;
pub use spec::{is_valid_identifier, PackageSpec};
