use std::{
    path::Path,
    process::{Command, Stdio},
};

use tracing::info;

use crate::error::{Result, WpcError};

/// Something that can put an image on the desktop.
pub trait Setter {
    fn apply(&self, wallpaper: &Path) -> Result<()>;
}

impl<S: Setter + ?Sized> Setter for &S {
    fn apply(&self, wallpaper: &Path) -> Result<()> {
        (**self).apply(wallpaper)
    }
}

/// Runs an external command with the wallpaper path as its last argument.
#[derive(Debug, Clone)]
pub struct CommandSetter {
    program: String,
    args: Vec<String>,
}

impl CommandSetter {
    /// Build from a full command line such as `["fbsetbg", "-a"]`.
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or(WpcError::SetterMissing)?;
        if program.trim().is_empty() {
            return Err(WpcError::SetterMissing);
        }

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Setter for CommandSetter {
    fn apply(&self, wallpaper: &Path) -> Result<()> {
        info!("Launching {} for {}", self.program, wallpaper.display());

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(wallpaper)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|source| WpcError::SetterSpawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(WpcError::SetterStatus {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}
