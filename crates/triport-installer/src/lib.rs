mod config;
mod error;
mod fs_utils;
mod layout;
mod listfile;
mod paragraph;
mod plan;
mod purge;
mod removal;
mod status_db;

pub use config::{default_triplet, host_triplet, RootConfig};
pub use error::RemoveError;
pub use layout::{default_root, InstallLayout};
pub use listfile::read_listfile;
pub use paragraph::{
    parse_status_paragraphs, serialize_status_paragraph, BinaryParagraph, InstallState,
    StatusParagraph, Want,
};
pub use plan::{create_remove_plan, RemovePlanAction, RemovePlanType, RequestType};
pub use purge::{purge_package_dir, PurgeOutcome};
pub use removal::{
    begin_removal, execute_remove_plan, finish_removal, remove_package, DeletionFailure,
    PackageRemovalReport, RemovalEvent, RemovalOptions,
};
pub use status_db::StatusDatabase;
