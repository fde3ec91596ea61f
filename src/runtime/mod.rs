use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use rodio::OutputStreamBuilder;
use tracing::{info, warn};

use crate::audio::RodioBackend;
use crate::config;
use crate::error::SessionError;
use crate::library::scan;
use crate::playlist::{AssetSource, Playlist};
use crate::track::{EngineTiming, TrackParams};

mod commands;
mod logging;
mod session;
mod settings;

use commands::Command;
use session::Session;

/// Usage: `soundscape [TRACKS_FILE] [ASSETS_DIR]`. Both default to the
/// configured session paths.
pub fn run() -> Result<(), SessionError> {
    let (settings, problem) = settings::load_settings();
    logging::init(&settings.log);
    if let Some(msg) = problem {
        warn!("{msg}");
    }

    let mut args = env::args().skip(1);
    let tracks_file = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.session.tracks_file.clone());
    let assets_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.session.assets_dir.clone());

    let descriptors = config::load_track_descriptors(&tracks_file)?;
    let params: Vec<TrackParams> = descriptors.iter().map(TrackParams::from).collect();
    info!(tracks = params.len(), file = %tracks_file.display(), "track descriptors loaded");

    if !assets_dir.is_dir() {
        return Err(SessionError::MissingAssetDir(assets_dir));
    }
    let playlist = Playlist::new(scan(&assets_dir, &settings.library));
    if playlist.is_empty() {
        warn!(dir = %assets_dir.display(), "no playable assets found");
    } else {
        info!(assets = playlist.len(), dir = %assets_dir.display(), "asset catalog loaded");
    }
    let source: Arc<dyn AssetSource> = Arc::new(playlist);

    let mut stream = OutputStreamBuilder::open_default_stream()?;
    stream.log_on_drop(false);

    let session = Session::start(
        params,
        source,
        EngineTiming::from(&settings.session),
        settings.session.poll_interval(),
        |_| RodioBackend::new(stream.mixer()),
    )?;

    let result = command_loop(&session);

    // Tracks must be gone before the output stream is dropped.
    session.shutdown();
    drop(stream);
    result
}

fn command_loop(session: &Session) -> Result<(), SessionError> {
    for line in io::stdin().lock().lines() {
        match Command::parse(&line?) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => session.apply(cmd),
            Ok(None) => {}
            Err(msg) => eprintln!("{msg}"),
        }
    }
    Ok(())
}
