//! Replay regression helpers.
//!
//! States are fingerprinted by hashing their JSON encoding, so any game whose
//! state is `Serialize` can be checked for deterministic record/replay without
//! a renderer in the loop.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::{GameLogic, HeadlessRunner, TimeMachine};

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn bytes_sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn state_sha256_hex<S: Serialize>(state: &S) -> io::Result<String> {
    let bytes =
        serde_json::to_vec(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(bytes_sha256_hex(&bytes))
}

/// One hash per recorded frame.
pub fn history_hashes<S: Serialize>(tm: &TimeMachine<S>) -> io::Result<Vec<String>> {
    tm.history().iter().map(state_sha256_hex).collect()
}

#[derive(Debug, Clone)]
pub struct ReplayArtifacts {
    pub state_json: PathBuf,
    pub hashes: Vec<String>,
}

/// Runs `inputs` live, saves the recording as JSON, reloads it and checks
/// that every replayed frame hashes identically to the live one.
pub fn record_then_replay_and_compare<G>(
    name: &str,
    out_dir: impl AsRef<Path>,
    game: G,
    inputs: impl IntoIterator<Item = G::Input>,
) -> io::Result<ReplayArtifacts>
where
    G: GameLogic + Clone,
    G::State: Serialize + DeserializeOwned,
{
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let state_json = out_dir.join(format!("{}.json", sanitize_filename(name)));

    let mut live = HeadlessRunner::new(game.clone());
    live.run(inputs);
    let live_hashes = history_hashes(live.timemachine())?;
    live.timemachine().save_json_file(&state_json)?;

    let tm = TimeMachine::<G::State>::load_json_file(&state_json)?;
    let mut replay = HeadlessRunner::from_timemachine(game, tm);

    if replay.history().len() != live_hashes.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "replay frame count mismatch for {}: live {} replay {}",
                state_json.display(),
                live_hashes.len(),
                replay.history().len()
            ),
        ));
    }

    for (frame, expected) in live_hashes.iter().enumerate() {
        replay.seek(frame);
        let actual = state_sha256_hex(replay.state())?;
        if &actual != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "replay mismatch at {} (frame {frame}):\nlive:   {expected}\nreplay: {actual}",
                    state_json.display()
                ),
            ));
        }
    }

    Ok(ReplayArtifacts {
        state_json,
        hashes: live_hashes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_characters() {
        assert_eq!(sanitize_filename("len 8/seed:3"), "len_8_seed_3");
    }

    #[test]
    fn equal_states_hash_equal() {
        let a = state_sha256_hex(&vec![1, -2, 3]).unwrap();
        let b = state_sha256_hex(&vec![1, -2, 3]).unwrap();
        let c = state_sha256_hex(&vec![1, 2, 3]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
