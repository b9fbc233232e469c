pub mod model;
pub mod service;

pub use model::{BackupSchedule, Frequency};
pub use service::BackupScheduler;
