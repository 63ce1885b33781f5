pub mod capture;
pub mod clock;
pub mod config;
pub mod database;
pub mod deadline;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod progress;
pub mod repository;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use capture::TaskDraft;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use database::Database;
pub use deadline::{DeadlineInput, OffsetUnit, TimeOfDay};
pub use error::{StoreError, ValidationError};
pub use model::*;
pub use progress::{CollectionSummary, Health, TaskView};
pub use services::{Applied, HomeService, HomeWorkspace, PersonalService, PersonalWorkspace};
pub use session::{AuthProvider, Identity, Session, StaticAuth};
pub use state::AppState;
pub use store::{DocumentStore, MemoryStore, WriteMode};
