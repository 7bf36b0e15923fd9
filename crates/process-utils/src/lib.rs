//! Player command lines and the child processes they start.

mod error;
mod split;

#[cfg(feature = "tokio")]
mod player;

use std::ffi::OsStr;

pub use error::PlayerError;
pub use split::split_command_line;

#[cfg(feature = "tokio")]
pub use player::{Player, PlayerCommand};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}
