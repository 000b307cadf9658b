//! Playback through whichever external player is installed.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// An external player program and the flags that make it play a file and exit.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// Tried in order.
pub const PLAYERS: [Player; 4] = [
    Player { program: "afplay", args: &[] },
    Player { program: "mpg123", args: &["-q"] },
    Player { program: "ffplay", args: &["-nodisp", "-autoexit"] },
    Player { program: "aplay", args: &["-q"] },
];

/// Result of one player attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attempt {
    Played(&'static str),
    /// The binary is not installed.
    Missing(&'static str),
    /// The binary ran and exited unsuccessfully. `None` means killed by a signal.
    Exited { program: &'static str, code: Option<i32> },
    /// The binary exists but could not be started.
    SpawnFailed { program: &'static str, error: String },
}

/// Try each player until one succeeds. Returns every attempt made.
pub fn play(path: &Path, players: &[Player]) -> Vec<Attempt> {
    let mut attempts = Vec::new();
    for player in players {
        let attempt = try_player(player, path);
        debug!(?attempt, "player attempt");
        let done = matches!(attempt, Attempt::Played(_));
        attempts.push(attempt);
        if done {
            break;
        }
    }
    attempts
}

fn try_player(player: &Player, path: &Path) -> Attempt {
    let status = Command::new(player.program)
        .args(player.args)
        .arg(path)
        .stdin(Stdio::null())
        .status();
    match status {
        Ok(s) if s.success() => Attempt::Played(player.program),
        Ok(s) => {
            warn!(player = player.program, code = ?s.code(), "player exited with an error");
            Attempt::Exited { program: player.program, code: s.code() }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Attempt::Missing(player.program),
        Err(e) => Attempt::SpawnFailed { program: player.program, error: e.to_string() },
    }
}

/// Whether any attempt played the file.
pub fn played(attempts: &[Attempt]) -> Option<&'static str> {
    attempts.iter().find_map(|a| match a {
        Attempt::Played(p) => Some(*p),
        _ => None,
    })
}
