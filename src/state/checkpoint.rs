use crate::state::CrawlState;
use crate::url::normalize_url;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const FRONTIER_FILE: &str = "urls_to_visit.txt";
pub const VISITED_FILE: &str = "urls_visited.txt";
pub const IN_FLIGHT_FILE: &str = "urls_being_visited.txt";
pub const UNREACHABLE_FILE: &str = "unreachable_domains.txt";
pub const ERROR_LOG_FILE: &str = "errors.log";

/// Errors raised while reading or writing checkpoint files
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {reason}")]
    Malformed {
        file: String,
        line: usize,
        reason: String,
    },
}

pub type CheckpointResult<T> = std::result::Result<T, CheckpointError>;

/// Everything recovered from a checkpoint directory
#[derive(Debug, Default)]
pub struct LoadedState {
    /// Frontier entries in their saved order
    pub frontier: Vec<(String, u32)>,
    pub state: CrawlState,
}

/// Reads and writes the crawl checkpoint files in one directory
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Opens (and creates if needed) a checkpoint directory
    pub fn open(dir: impl Into<PathBuf>) -> CheckpointResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CheckpointError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.dir.join(ERROR_LOG_FILE)
    }

    /// Loads all four checkpoint files
    ///
    /// Missing files are empty. A frontier or in-flight line that cannot be
    /// parsed aborts the load with its file name and line number. In-flight
    /// lines without a depth come from older checkpoints and are assigned
    /// `fallback_depth`.
    pub fn load(&self, fallback_depth: u32) -> CheckpointResult<LoadedState> {
        let frontier = self
            .read_lines(FRONTIER_FILE)?
            .into_iter()
            .map(|(line_no, line)| parse_entry(FRONTIER_FILE, line_no, &line, None))
            .collect::<CheckpointResult<Vec<_>>>()?;

        let in_flight = self
            .read_lines(IN_FLIGHT_FILE)?
            .into_iter()
            .map(|(line_no, line)| {
                parse_entry(IN_FLIGHT_FILE, line_no, &line, Some(fallback_depth))
            })
            .collect::<CheckpointResult<HashMap<_, _>>>()?;

        let visited: HashSet<String> = self
            .read_lines(VISITED_FILE)?
            .into_iter()
            .map(|(_, line)| line)
            .collect();

        let unreachable: BTreeSet<String> = self
            .read_lines(UNREACHABLE_FILE)?
            .into_iter()
            .map(|(_, line)| line.to_lowercase())
            .collect();

        tracing::info!(
            "Loaded checkpoint: {} queued, {} visited, {} in flight, {} unreachable domains",
            frontier.len(),
            visited.len(),
            in_flight.len(),
            unreachable.len()
        );

        Ok(LoadedState {
            frontier,
            state: CrawlState::from_parts(visited, in_flight, unreachable),
        })
    }

    /// Atomically replaces every checkpoint file
    ///
    /// Files are written in the order URLs and domains move through them:
    /// unreachable domains, visited, in flight, then the frontier. A crash
    /// between two writes leaves a frontier that is at worst older than the
    /// other files, and restoring re-filters it against them.
    ///
    /// # Arguments
    ///
    /// * `frontier` - Queued entries in insertion order
    /// * `state` - Visited, in-flight and unreachable sets
    pub fn save<'a, I>(&self, frontier: I, state: &CrawlState) -> CheckpointResult<()>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut buf = String::new();
        for domain in state.unreachable_domains() {
            buf.push_str(domain);
            buf.push('\n');
        }
        self.write_atomic(UNREACHABLE_FILE, &buf)?;

        buf.clear();
        for url in state.visited() {
            buf.push_str(url);
            buf.push('\n');
        }
        self.write_atomic(VISITED_FILE, &buf)?;

        buf.clear();
        for (url, depth) in state.in_flight() {
            let _ = writeln!(buf, "{}|{}", url, depth);
        }
        self.write_atomic(IN_FLIGHT_FILE, &buf)?;

        buf.clear();
        for (url, depth) in frontier {
            let _ = writeln!(buf, "{}|{}", url, depth);
        }
        self.write_atomic(FRONTIER_FILE, &buf)?;

        Ok(())
    }

    /// Writes to a sibling temporary file and renames it over the target
    fn write_atomic(&self, name: &str, contents: &str) -> CheckpointResult<()> {
        let path = self.dir.join(name);
        let tmp_path = path.with_extension("tmp");

        fs::write(&tmp_path, contents).map_err(|source| CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        fs::rename(&tmp_path, &path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Reads non-blank trimmed lines with their 1-based line numbers
    fn read_lines(&self, name: &str) -> CheckpointResult<Vec<(usize, String)>> {
        let path = self.dir.join(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };

        Ok(content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(i, line)| (i, line.to_string()))
            .collect())
    }
}

fn parse_entry(
    file: &str,
    line_no: usize,
    line: &str,
    fallback_depth: Option<u32>,
) -> CheckpointResult<(String, u32)> {
    let malformed = |reason: String| CheckpointError::Malformed {
        file: file.to_string(),
        line: line_no,
        reason,
    };

    let (url, depth) = match (line.rsplit_once('|'), fallback_depth) {
        (Some((url, depth)), _) => {
            let depth = depth
                .trim()
                .parse::<u32>()
                .map_err(|_| malformed(format!("invalid depth in '{}'", line)))?;
            (url.trim(), depth)
        }
        (None, Some(depth)) => (line, depth),
        (None, None) => return Err(malformed(format!("expected 'url|depth', got '{}'", line))),
    };

    let normalized =
        normalize_url(url).map_err(|e| malformed(format!("invalid URL '{}': {}", url, e)))?;

    Ok((normalized.to_string(), depth))
}
