use crate::cache::ContentHashes;
use crate::config::Config;
use crate::error::Result;
use crate::loader::{is_ignored, is_markdown, to_slash};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

pub const DEBOUNCE_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rebuild {
    Full,
    Partial(BTreeSet<PathBuf>),
}

impl Rebuild {
    pub fn partial(path: impl Into<PathBuf>) -> Self {
        Rebuild::Partial(BTreeSet::from([path.into()]))
    }

    pub fn merge(self, other: Rebuild) -> Rebuild {
        match (self, other) {
            (Rebuild::Partial(mut left), Rebuild::Partial(right)) => {
                left.extend(right);
                Rebuild::Partial(left)
            }
            _ => Rebuild::Full,
        }
    }

    pub fn changed(&self) -> Vec<PathBuf> {
        match self {
            Rebuild::Full => Vec::new(),
            Rebuild::Partial(paths) => paths.iter().cloned().collect(),
        }
    }

    pub fn kind(&self) -> BuildKind {
        match self {
            Rebuild::Full => BuildKind::Full,
            Rebuild::Partial(_) => BuildKind::Partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    Full,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Building(BuildKind),
}

pub struct Coordinator {
    input: PathBuf,
    output: Option<PathBuf>,
    summary: String,
    config: Config,
    hashes: ContentHashes,
    pending: Option<Rebuild>,
    touched: BTreeSet<PathBuf>,
    state: CoordinatorState,
}

impl Coordinator {
    pub fn new(config: &Config) -> Self {
        Self {
            input: config.input.clone(),
            output: config.output_within_input(),
            summary: to_slash(Path::new(&config.structure.summary)),
            config: config.clone(),
            hashes: ContentHashes::new(),
            pending: None,
            touched: BTreeSet::new(),
            state: CoordinatorState::Idle,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn pending(&self) -> Option<&Rebuild> {
        self.pending.as_ref()
    }

    pub fn remember<'p>(&mut self, paths: impl IntoIterator<Item = &'p Path>) {
        for path in paths {
            self.hashes.update(path);
        }
    }

    pub fn classify(&mut self, path: &Path) -> Option<Rebuild> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.input).ok()?
        } else {
            path
        };

        if !is_markdown(relative) || is_ignored(&self.config, relative, self.output.as_deref()) {
            return None;
        }

        let absolute = self.input.join(relative);

        if !absolute.exists() {
            log::debug!("{} was removed, rebuilding everything", relative.display());
            self.hashes.forget(&absolute);
            return Some(Rebuild::Full);
        }

        if !self.hashes.update(&absolute) {
            log::debug!("{} is unchanged, ignoring", relative.display());
            return None;
        }
        self.touched.insert(absolute);

        if to_slash(relative) == self.summary {
            Some(Rebuild::Full)
        } else {
            Some(Rebuild::partial(relative))
        }
    }

    pub fn enqueue(&mut self, path: &Path) {
        if let Some(rebuild) = self.classify(path) {
            self.pending = Some(match self.pending.take() {
                Some(pending) => pending.merge(rebuild),
                None => rebuild,
            });
        }
    }

    /// Runs the pending rebuild, if any. A failed build is logged and the
    /// coordinator goes back to idle either way; the sources it covered are
    /// forgotten so that saving them again retries the build.
    pub fn run_pending<F>(&mut self, build: &mut F) -> bool
    where
        F: FnMut(&Rebuild) -> Result<()>,
    {
        let Some(rebuild) = self.pending.take() else {
            return false;
        };

        self.state = CoordinatorState::Building(rebuild.kind());
        match &rebuild {
            Rebuild::Full => log::info!("Changes detected, rebuilding everything..."),
            Rebuild::Partial(paths) => log::info!("Changes detected, rebuilding {} file(s)...", paths.len()),
        }

        let touched = std::mem::take(&mut self.touched);
        if let Err(error) = build(&rebuild) {
            log::error!("Rebuild failed: {error}");
            for path in &touched {
                self.hashes.forget(path);
            }
        }

        self.state = CoordinatorState::Idle;
        true
    }

    pub fn run<F>(&mut self, events: &Receiver<PathBuf>, mut build: F)
    where
        F: FnMut(&Rebuild) -> Result<()>,
    {
        while let Ok(path) = events.recv() {
            self.enqueue(&path);

            let mut disconnected = false;
            loop {
                match events.recv_timeout(DEBOUNCE_DURATION) {
                    Ok(path) => self.enqueue(&path),
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }

            self.run_pending(&mut build);

            if disconnected {
                break;
            }
        }
    }
}
