pub mod access;
pub mod config;
pub mod directory;
pub mod engine;
pub mod export;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod record;
pub mod stats;

pub mod prelude {
    pub use crate::config::ConnectionProfile;
    pub use crate::engine::{Engine, RunOutcome};
    pub use crate::record::UserRecord;
}
