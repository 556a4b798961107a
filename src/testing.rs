use std::{
    collections::{HashMap, HashSet},
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::sleep;

use crate::{
    error::{Error, Result},
    mirror::{MirrorOutput, MirrorRunner},
    storage::ObjectUploader,
};

/// Records every upload and fails the ones whose relative path is listed.
#[derive(Debug, Default)]
pub struct FakeUploader {
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing<'a, I: IntoIterator<Item = &'a str>>(paths: I) -> Self {
        FakeUploader {
            failing: paths.into_iter().map(ToOwned::to_owned).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_owned(), delay);
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectUploader for FakeUploader {
    async fn upload(&self, _bucket: &str, key: &str, path: &Path) -> Result<u64> {
        self.calls.lock().unwrap().push(key.to_owned());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let relative = key.split_once('/').map_or(key, |(_, rest)| rest);
        if let Some(delay) = self.delays.get(relative) {
            sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(relative) {
            return Err(Error::Sdk(format!("simulated failure for {relative}")));
        }

        let size = tokio::fs::metadata(path).await?.len();
        Ok(size)
    }
}

/// Returns a fixed output for every run and records the arguments.
#[derive(Debug)]
pub struct FakeMirror {
    output: MirrorOutput,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<OsString>>>,
}

impl FakeMirror {
    pub fn exiting(success: bool, stderr: &str) -> Self {
        let status = if success {
            "exit status: 0"
        } else {
            "exit status: 23"
        };
        FakeMirror {
            output: MirrorOutput {
                success,
                status: status.to_owned(),
                stdout: "sending incremental file list\n".to_owned(),
                stderr: stderr.to_owned(),
            },
            delay: None,
            calls: Mutex::default(),
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Vec<OsString>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MirrorRunner for FakeMirror {
    async fn run(&self, args: Vec<OsString>) -> Result<MirrorOutput> {
        self.calls.lock().unwrap().push(args);
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        Ok(self.output.clone())
    }
}

/// Writes `files` (relative path, contents) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(relative, contents)| {
            let path = root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, contents).unwrap();
            path
        })
        .collect()
}
