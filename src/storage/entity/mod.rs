pub mod backup_schedule;

pub use backup_schedule::Entity as BackupSchedule;
