// src/launcher/command.rs
use crate::config::InstanceConfig;
use crate::launcher::LaunchError;
use std::fmt;

/// One fully rendered invocation: `<program...> <role> <port> <predecessor>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub port: u16,
}

impl LaunchCommand {
    pub fn for_instance(program: &[String], instance: &InstanceConfig) -> Result<Self, LaunchError> {
        let (exe, leading) = program.split_first().ok_or(LaunchError::EmptyProgram)?;
        if exe.trim().is_empty() {
            return Err(LaunchError::EmptyProgram);
        }

        let mut args = leading.to_vec();
        args.push(instance.role.to_string());
        args.push(instance.port.to_string());
        args.push(instance.predecessor.to_string());

        Ok(Self {
            program: exe.clone(),
            args,
            port: instance.port,
        })
    }

    /// The trailing `<role> <port> <predecessor>` triple, or every argument
    /// when fewer than three are present.
    pub fn chain_args(&self) -> &[String] {
        &self.args[self.args.len().saturating_sub(3)..]
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
