pub mod build;
pub mod config;
pub mod debate;
pub mod intake;
pub mod roster;
pub mod serve;

pub use build::{cmd_build, BuildArgs};
pub use config::{cmd_config, cmd_config_init};
pub use debate::{cmd_run, cmd_watch};
pub use intake::{cmd_intake, IntakeArgs};
pub use roster::cmd_roster;
pub use serve::cmd_serve;
