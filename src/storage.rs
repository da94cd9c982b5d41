use crate::clock::Clock;
use crate::config::atomic_rename;
use crate::model::PetState;
use anyhow::Result;
use serde_json::{Map, Value};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Why a save could not be used. Every variant ends in a fresh pet.
#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error("no save file yet")]
    Missing,
    #[error("could not read save: {0}")]
    Io(#[from] io::Error),
    #[error("save is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("save is not a JSON object")]
    NotAnObject,
    #[error("save has a field of the wrong type: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Loads the pet, or starts a fresh one when the save is absent or unusable.
pub(crate) fn load_or_init(path: &Path, clock: &impl Clock) -> PetState {
    match try_load(path, clock) {
        Ok(st) => {
            log::info!("loaded save from {} (day {}, score {})", path.display(), st.day, st.score);
            st
        }
        Err(LoadError::Missing) => {
            log::info!("no save at {}, starting fresh", path.display());
            PetState::new(clock)
        }
        Err(e) => {
            log::warn!("{e}; starting fresh ({})", path.display());
            PetState::new(clock)
        }
    }
}

pub(crate) fn try_load(path: &Path, clock: &impl Clock) -> Result<PetState, LoadError> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::Missing),
        Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
        return Err(LoadError::Missing);
    }
    let stored: Value = serde_json::from_str(&raw).map_err(LoadError::Parse)?;
    merge_over_defaults(stored, clock)
}

/// Shallow merge: each top-level key present in `stored` replaces the default.
pub(crate) fn merge_over_defaults(
    stored: Value,
    clock: &impl Clock,
) -> Result<PetState, LoadError> {
    let Value::Object(stored) = stored else {
        return Err(LoadError::NotAnObject);
    };
    let mut merged = match serde_json::to_value(PetState::new(clock)) {
        Ok(Value::Object(m)) => m,
        _ => Map::new(),
    };
    merged.extend(stored);
    let mut st: PetState = serde_json::from_value(Value::Object(merged)).map_err(LoadError::Shape)?;
    st.normalize();
    Ok(st)
}

pub(crate) fn save_atomic(path: &Path, state: &PetState) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(state)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}
