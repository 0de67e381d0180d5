//! Concrete collaborators for the CityPulse stores: HTTP clients, file
//! persistence, configuration and logging.

pub mod backend;
pub mod catalog;
pub mod config_service;
pub mod logging;
pub mod paths;
pub mod session_snapshot_repository;
pub mod storage;

pub use backend::SupabaseClient;
pub use catalog::OxilorCatalog;
pub use config_service::ConfigService;
pub use paths::CityPulsePaths;
pub use session_snapshot_repository::FileSessionSnapshotRepository;
