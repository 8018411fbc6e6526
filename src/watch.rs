//! File watcher: bundles once on startup, then re-bundles whenever a
//! participating source file changes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::config::Options;
use crate::error::Error;
use crate::generate;
use crate::paths;

/// Debounce delay between filesystem events and re-bundle.
const DEBOUNCE_MS: u64 = 100;

/// Parent directories of every source file from the last successful run,
/// falling back to the input's own directory when nothing resolved yet.
fn collect_watch_dirs(sources: &[PathBuf], input: &Path) -> HashSet<PathBuf> {
    let mut dirs = HashSet::new();
    for path in sources {
        if let Some(parent) = path.parent() {
            dirs.insert(parent.to_path_buf());
        }
    }
    if dirs.is_empty()
        && let Some(parent) = input.parent()
    {
        dirs.insert(parent.to_path_buf());
    }
    return dirs;
}

/// Create a filesystem watcher that sends events on the given channel.
/// Events for the output file itself are dropped: the bundle write would
/// otherwise retrigger the build it came from.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    output: PathBuf,
) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && !event.paths.iter().all(|p| return *p == output)
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return Error::Io(std::io::Error::other(format!("watcher setup failed: {e}")));
    });
}

/// Entry point for watch mode.
///
/// Runs an initial bundle, then watches the directories the bundle was
/// assembled from and re-bundles on changes. A failing build is reported
/// and watching continues; the next change gets another attempt.
///
/// # Errors
///
/// Returns errors from path handling or watcher setup. Bundle failures do
/// not end the watch.
pub fn run(input: &Path, output: &Path, overrides: &Options) -> Result<ExitCode, Error> {
    let input = paths::absolutize(input)?;
    let output_abs = paths::absolutize(output)?;

    eprintln!("watch: initial bundle");
    let mut sources = run_bundle(&input, output, overrides);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, output_abs)?;
    let mut watched: HashSet<PathBuf> = HashSet::new();
    watch_new_dirs(&mut watcher, &mut watched, collect_watch_dirs(&sources, &input));

    let dir_count = watched.len();
    eprintln!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-bundling...");
        sources = run_bundle(&input, output, overrides);
        watch_new_dirs(&mut watcher, &mut watched, collect_watch_dirs(&sources, &input));
        // Drop anything our own write queued while bundling.
        while rx.try_recv().is_ok() {}
    }

    return Ok(ExitCode::SUCCESS);
}

/// Start watching any directory not already covered.
fn watch_new_dirs(
    watcher: &mut notify::RecommendedWatcher,
    watched: &mut HashSet<PathBuf>,
    dirs: HashSet<PathBuf>,
) {
    for dir in dirs {
        if watched.contains(&dir) || !dir.exists() {
            continue;
        }
        if watcher.watch(&dir, RecursiveMode::NonRecursive).is_ok() {
            watched.insert(dir);
        }
    }
}

/// Bundle once and narrate the result. Returns the participating sources,
/// empty when the build failed.
fn run_bundle(input: &Path, output: &Path, overrides: &Options) -> Vec<PathBuf> {
    return match generate::generate_to_file(input, output, overrides) {
        Ok(report) => {
            let count = report.sources.len();
            eprintln!("watch: bundled {count} source files into {}", output.display());
            report.sources
        },
        Err(e) => {
            eprintln!("error: {e}");
            Vec::new()
        },
    };
}
