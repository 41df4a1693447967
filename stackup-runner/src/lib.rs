pub mod browser;
pub mod launcher;
pub mod process;
pub mod readiness;
pub mod spawn;
pub mod state;

pub use launcher::StackLauncher;
pub use state::StateFile;
