//! High score persistence. This belongs to the host, never to the engine:
//! read once when a session starts, written only when a game beats it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait HighScoreStore {
    fn load(&mut self) -> io::Result<u32>;
    fn save(&mut self, score: u32) -> io::Result<()>;
}

/// Saves `score` if it beats `best`, the value read when the session started.
/// Returns the high score to show.
pub fn record_if_higher<S: HighScoreStore + ?Sized>(
    store: &mut S,
    best: u32,
    score: u32,
) -> io::Result<u32> {
    if score > best {
        store.save(score)?;
        log::info!("high score: new best {} (was {})", score, best);
        return Ok(score);
    }
    Ok(best)
}

/// Parses a stored value; anything unreadable counts as no high score yet.
pub fn parse_stored(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

/// Single integer in a text file.
#[derive(Debug, Clone)]
pub struct FileHighScore {
    path: PathBuf,
}

impl FileHighScore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileHighScore {
    /// A missing file is created holding 0.
    fn load(&mut self) -> io::Result<u32> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(parse_stored(&raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.save(0)?;
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    fn save(&mut self, score: u32) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, score.to_string())?;
        fs::rename(&tmp, &self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHighScore {
    pub value: u32,
    pub writes: usize,
}

impl HighScoreStore for MemoryHighScore {
    fn load(&mut self) -> io::Result<u32> {
        Ok(self.value)
    }

    fn save(&mut self, score: u32) -> io::Result<()> {
        self.value = score;
        self.writes += 1;
        Ok(())
    }
}
