//! Line-oriented control commands read from stdin.

use crate::track::TrackId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    /// Skip the current asset on one track.
    Skip(TrackId),
    Status,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let cmd = match verb.to_ascii_lowercase().as_str() {
            "pause" | "p" => Command::Pause,
            "resume" | "r" => Command::Resume,
            "status" | "st" => Command::Status,
            "quit" | "q" | "exit" => Command::Quit,
            "skip" | "s" => {
                let id = words
                    .next()
                    .ok_or_else(|| "usage: skip <track-id>".to_string())?;
                let id = id
                    .parse::<TrackId>()
                    .map_err(|_| format!("not a track id: {id}"))?;
                Command::Skip(id)
            }
            other => return Err(format!("unknown command: {other}")),
        };

        if words.next().is_some() {
            return Err(format!("unexpected arguments after {verb}"));
        }
        Ok(Some(cmd))
    }
}
