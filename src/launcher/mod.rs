// src/launcher/mod.rs
mod command;
mod spawner;

pub use command::LaunchCommand;
pub use spawner::{LaunchError, ProcessSpawner, SpawnedProcess, Spawner};
