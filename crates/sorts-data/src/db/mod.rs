//! Research database access.

pub mod sqlite;

pub use sqlite::{CharacteristicRecord, DbStats, MonthlyRecord, ResearchDb};
