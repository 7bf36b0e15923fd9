use std::fmt;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdin};
use tracing::{debug, info};

use crate::error::PlayerError;
use crate::split::split_command_line;
use crate::tokio_command;

/// A media player invocation: the program and the arguments it always gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    program: String,
    args: Vec<String>,
}

impl PlayerCommand {
    pub fn parse(line: &str) -> Result<Self, PlayerError> {
        let mut words = split_command_line(line)?.into_iter();
        let program = words.next().ok_or(PlayerError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Starts the player reading media from its standard input.
    pub fn spawn_piped(&self) -> Result<Player, PlayerError> {
        let mut cmd = tokio_command(&self.program);
        cmd.args(&self.args).stdin(Stdio::piped());
        debug!(command = %self, "Starting player with piped input");
        self.start(cmd)
    }

    /// Starts the player with `url` appended as its last argument.
    pub fn spawn_with_url(&self, url: &str) -> Result<Player, PlayerError> {
        let mut cmd = tokio_command(&self.program);
        cmd.args(&self.args).arg(url).stdin(Stdio::null());
        debug!(command = %self, %url, "Starting player");
        self.start(cmd)
    }

    fn start(&self, mut cmd: tokio::process::Command) -> Result<Player, PlayerError> {
        let child = cmd
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::spawn(&self.program, e))?;
        info!(player = %self.program, pid = child.id(), "Player started");
        Ok(Player { child })
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A running player process.
#[derive(Debug)]
pub struct Player {
    child: Child,
}

impl Player {
    /// Takes the player's standard input. Only a player started with
    /// [`PlayerCommand::spawn_piped`] has one, and it can be taken once.
    pub fn take_stdin(&mut self) -> Result<ChildStdin, PlayerError> {
        self.child.stdin.take().ok_or(PlayerError::StdinUnavailable)
    }

    /// Waits for the player to exit. Any stdin still held is closed first.
    pub async fn wait(mut self) -> Result<ExitStatus, PlayerError> {
        drop(self.child.stdin.take());
        let status = self.child.wait().await.map_err(PlayerError::Wait)?;
        debug!(%status, "Player exited");
        Ok(status)
    }
}
