//! Infrastructure layer: persistence, the lifecycle engine, configuration and
//! demo seeding.

pub mod config;
pub mod directory;
pub mod engine;
pub mod seed;
pub mod store;

mod integration_tests;

pub use config::{AppConfig, ConfigError, Environment};
pub use directory::StoreDirectory;
pub use engine::{DocumentRequestView, EngineError, EngineResult, LifecycleEngine, StatusUpdate};
pub use seed::seed_demo_data;
pub use store::{InMemoryStore, PostgresStore, RegistrarStore, StoreError, StoreResult, StoreTx};
