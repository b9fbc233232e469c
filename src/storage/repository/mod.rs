pub mod schedule_repo;

pub use schedule_repo::ScheduleRepository;
