mod doctor;
mod status;
mod watch;

pub use doctor::run_doctor;
pub use status::run_status;
pub use watch::run_watch;
