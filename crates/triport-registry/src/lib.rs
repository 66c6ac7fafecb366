mod outdated;
mod port_index;

pub use outdated::{find_outdated_packages, OutdatedPackage};
pub use port_index::PortIndex;
