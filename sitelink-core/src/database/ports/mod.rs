//! Repository ports consumed by the allocation engine and the lifecycle
//! manager. Implementations live under
//! [`crate::database::infrastructure`]; tests inject in-memory fakes.

mod catalog;
mod load_index;
mod requests;

pub use catalog::CatalogRepository;
pub use load_index::LoadIndexRepository;
pub use requests::{
    DismantlesRepository, InstallationFilter, InstallationsRepository,
    NewDismantle, NewInstallation, NewRelocation, RelocationsRepository,
};
