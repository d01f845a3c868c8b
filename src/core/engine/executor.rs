//! Engine execution.

use super::cancel::CancellationToken;
use super::config::{EngineBuilder, LayoutMode, OperationMode, RunConfig};
use super::writer::{FileWriter, WriteReport};
use crate::core::classifier::Classifier;
use crate::core::hasher::ContentHasher;
use crate::core::progress::{ProgressStore, RunProgress};
use crate::core::resolver::{PathResolver, Resolution};
use crate::core::scanner::{DiscoveredFile, SourceWalker};
use crate::core::transform::{ContentTransform, Transformed};
use crate::error::{FileError, MoverError, Result, SetupError};
use crate::events::{
    null_sender, EnginePhase, Event, EventSender, OutcomeKind, RunState, RunSummary,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of processing one file that did not fail
enum FileOutcome {
    Written { dest: PathBuf, report: WriteReport },
    Duplicate { existing: PathBuf },
}

/// Which already-handled files a resumed run passes over
#[derive(Debug)]
enum ResumeSkip {
    Nothing,
    /// Everything up to and including this path
    Through(PathBuf),
    /// The first n files
    First(usize),
}

impl ResumeSkip {
    fn skips(&mut self, path: &Path) -> bool {
        match self {
            ResumeSkip::Nothing => false,
            ResumeSkip::Through(last) => {
                if path == last.as_path() {
                    *self = ResumeSkip::Nothing;
                }
                true
            }
            ResumeSkip::First(remaining) => {
                if *remaining == 0 {
                    *self = ResumeSkip::Nothing;
                    return false;
                }
                *remaining -= 1;
                if *remaining == 0 {
                    *self = ResumeSkip::Nothing;
                }
                true
            }
        }
    }
}

/// Validated inputs of a run
struct Prepared {
    sources: Vec<PathBuf>,
    destination: PathBuf,
    classifier: Classifier,
    saved: Option<RunProgress>,
}

/// The classification and move engine
///
/// One run walks every source root, decides a destination for each file,
/// skips exact duplicates, resolves name collisions and writes the file.
/// Files are handled one at a time, in a stable order.
pub struct Engine {
    config: RunConfig,
    hasher: Box<dyn ContentHasher>,
    transform: Box<dyn ContentTransform>,
    store: Box<dyn ProgressStore>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(super) fn new(
        config: RunConfig,
        hasher: Box<dyn ContentHasher>,
        transform: Box<dyn ContentTransform>,
        store: Box<dyn ProgressStore>,
    ) -> Self {
        Self {
            config,
            hasher,
            transform,
            store,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run to completion without events
    pub fn run(&self) -> Result<RunSummary> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    /// Run on a dedicated worker thread
    pub fn spawn(
        self,
        events: EventSender,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<RunSummary>> {
        thread::spawn(move || self.run_with_events(&events, &cancel))
    }

    /// Run with event reporting and cooperative cancellation.
    ///
    /// Setup errors are returned after an `Error` and a fatal `Finished`
    /// event; no file has been touched at that point. Per-file failures
    /// never end the run.
    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        let start = Instant::now();

        match self.execute(events, cancel, start) {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!(error = %e, "run aborted during setup");
                events.error(e.to_string());
                events.send(Event::Finished {
                    summary: RunSummary {
                        state: Some(RunState::Fatal),
                        destination: self.config.destination.clone(),
                        duration_ms: start.elapsed().as_millis() as u64,
                        ..RunSummary::default()
                    },
                });
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Result<RunSummary> {
        let prepared = self.prepare()?;

        // Phase 1: Scanning
        info!(sources = prepared.sources.len(), "scanning sources");
        events.send(Event::PhaseChanged {
            phase: EnginePhase::Scanning,
        });

        let walker = SourceWalker::new(self.config.scan.clone())
            .excluding(vec![prepared.destination.clone()]);

        let resume_path = prepared.saved.as_ref().and_then(|p| p.last_completed.clone());
        let mut total = 0usize;
        let mut resume_path_found = false;
        for file in walker.walk(&prepared.sources).flatten() {
            total += 1;
            if resume_path.as_deref() == Some(file.path.as_path()) {
                resume_path_found = true;
            }
        }

        if total == 0 {
            return Err(SetupError::NoFilesFound {
                sources: prepared.sources.clone(),
            }
            .into());
        }

        fs::create_dir_all(&prepared.destination).map_err(|source| {
            SetupError::DestinationUnavailable {
                path: prepared.destination.clone(),
                source,
            }
        })?;

        let mut skip = match (&prepared.saved, self.config.operation) {
            (None, _) | (_, OperationMode::Move) => ResumeSkip::Nothing,
            (Some(_), _) if resume_path_found => {
                ResumeSkip::Through(resume_path.unwrap_or_default())
            }
            (Some(saved), _) => ResumeSkip::First(saved.completed),
        };

        // Phase 2: Running
        info!(total, destination = ?prepared.destination, "organizing files");
        events.send(Event::PhaseChanged {
            phase: EnginePhase::Running,
        });
        events.status(format!(
            "Organizing {} files into {}",
            total,
            prepared.destination.display()
        ));

        let mut progress = RunProgress::new(
            prepared.sources.clone(),
            prepared.destination.clone(),
            total,
        );
        if let Some(saved) = &prepared.saved {
            progress.run_id = saved.run_id;
        }

        let mut summary = RunSummary {
            total_files: total,
            destination: prepared.destination.clone(),
            ..RunSummary::default()
        };

        let mut resolver = PathResolver::new();
        let writer = FileWriter::new(self.config.operation);
        let mut state = RunState::Completed;
        let mut announced_resume = false;

        for entry in walker.walk(&prepared.sources) {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    events.error(e.to_string());
                    continue;
                }
            };

            if skip.skips(&file.path) {
                progress.advance(&file.path);
                summary.resumed_from += 1;
                continue;
            }

            if summary.resumed_from > 0 && !announced_resume {
                announced_resume = true;
                events.status(format!(
                    "Resuming: {} files were already handled",
                    summary.resumed_from
                ));
            }

            if progress.completed >= total {
                warn!(path = ?file.path, "file appeared after the scan, leaving it for a later run");
                break;
            }

            let file_name = file.file_name();

            if cancel.is_cancelled() {
                info!(completed = progress.completed, total, "run cancelled");
                summary.cancelled += 1;
                events.file_done(
                    file_name,
                    OutcomeKind::Cancelled,
                    "cancelled before processing".to_string(),
                    progress.percent(),
                );

                progress.current_source = Some(file.path.clone());
                self.save_progress(&progress, events);
                state = RunState::Cancelled;
                break;
            }

            progress.current_source = Some(file.path.clone());

            let (outcome, message) = match self.process(&file, &prepared, &mut resolver, &writer) {
                Ok(FileOutcome::Written { dest, report }) => {
                    summary.succeeded += 1;
                    summary.bytes_written += report.bytes;
                    progress.current_destination = Some(dest.clone());
                    debug!(source = ?file.path, ?dest, "file written");
                    (
                        OutcomeKind::Success,
                        success_message(&dest, &report, self.config.operation),
                    )
                }
                Ok(FileOutcome::Duplicate { existing }) => {
                    summary.skipped += 1;
                    debug!(source = ?file.path, ?existing, "duplicate skipped");
                    (
                        OutcomeKind::Skipped,
                        format!("duplicate of {}", existing.display()),
                    )
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(source = ?file.path, error = %e, "file failed");
                    (OutcomeKind::Error, format!("{}: {}", file_name, e))
                }
            };

            progress.advance(&file.path);
            self.save_progress(&progress, events);

            events.file_done(file_name, outcome, message, progress.percent());
        }

        match state {
            RunState::Cancelled => {
                events.status(format!(
                    "Cancelled after {} of {} files. Progress saved, resume to continue.",
                    progress.completed, total
                ));
            }
            _ => {
                if progress.percent() < 100 {
                    events.send(Event::Progress {
                        percent: 100,
                        file_name: String::new(),
                    });
                }
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "could not clear saved progress");
                }
                events.status(format!(
                    "Done: {} organized, {} duplicates skipped, {} failed",
                    summary.succeeded, summary.skipped, summary.failed
                ));
            }
        }

        summary.state = Some(state);
        summary.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            state = %state,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            duration_ms = summary.duration_ms,
            "run finished"
        );

        events.send(Event::Finished {
            summary: summary.clone(),
        });

        Ok(summary)
    }

    /// Validate the configuration and load saved progress
    fn prepare(&self) -> Result<Prepared> {
        if self.config.sources.is_empty() {
            return Err(SetupError::NoSources.into());
        }

        let mut sources = Vec::with_capacity(self.config.sources.len());
        for source in &self.config.sources {
            if !source.exists() {
                return Err(SetupError::SourceNotFound {
                    path: source.clone(),
                }
                .into());
            }
            if !source.is_dir() {
                return Err(SetupError::SourceNotDirectory {
                    path: source.clone(),
                }
                .into());
            }
            let canonical = source.canonicalize().map_err(|_| SetupError::SourceNotFound {
                path: source.clone(),
            })?;
            sources.push(canonical);
        }

        let classifier = match &self.config.structure {
            Some(model) => {
                model.validate()?;
                Classifier::with_model(model.clone())
            }
            None => Classifier::new(),
        };

        // Created only once the scan has found something to organize
        let destination = absolute_destination(&self.config.destination).map_err(|source| {
            SetupError::DestinationUnavailable {
                path: self.config.destination.clone(),
                source,
            }
        })?;

        if sources.contains(&destination) {
            return Err(SetupError::DestinationIsSource { path: destination }.into());
        }

        let saved = if self.config.resume {
            match self.store.load()? {
                Some(saved) => {
                    saved
                        .check_matches(&sources, &destination)
                        .map_err(|reason| SetupError::ResumeMismatch { reason })?;
                    info!(completed = saved.completed, total = saved.total, "resuming saved run");
                    Some(saved)
                }
                None => {
                    info!("no saved progress, starting from the beginning");
                    None
                }
            }
        } else {
            None
        };

        Ok(Prepared {
            sources,
            destination,
            classifier,
            saved,
        })
    }

    /// Classify, check for duplicates, transform and write one file
    fn process(
        &self,
        file: &DiscoveredFile,
        prepared: &Prepared,
        resolver: &mut PathResolver,
        writer: &FileWriter,
    ) -> std::result::Result<FileOutcome, FileError> {
        let classification = prepared.classifier.classify(&file.path);

        let folder = match self.config.layout {
            LayoutMode::Categorized => prepared.destination.join(&classification.label),
            LayoutMode::Mirrored => match file.relative_path.parent() {
                Some(parent) => prepared.destination.join(parent),
                None => prepared.destination.clone(),
            },
        };

        fs::create_dir_all(&folder).map_err(|e| FileError::CreateDir {
            path: folder.clone(),
            source: e,
        })?;

        let desired = match file.path.file_name() {
            Some(name) => folder.join(name),
            None => folder.join(file.file_name()),
        };

        let digest = self.hasher.hash_file(&file.path)?;
        let content = self.transform.apply(classification.kind, &file.path)?;

        // A re-encoded file is also a duplicate of an earlier run's output
        let written_digest = match &content {
            Transformed::Reencoded(bytes) => self.hasher.hash_bytes(bytes, &file.path)?,
            Transformed::Unchanged => digest,
        };

        let dest = match resolver.resolve(&desired, &[digest, written_digest], self.hasher.as_ref())? {
            Resolution::Duplicate { existing } => return Ok(FileOutcome::Duplicate { existing }),
            Resolution::Available(dest) => dest,
        };

        let report = writer.write(&file.path, &dest, content)?;
        resolver.record_written(&dest, written_digest);
        if written_digest != digest {
            resolver.record_written(&dest, digest);
        }

        Ok(FileOutcome::Written { dest, report })
    }

    fn save_progress(&self, progress: &RunProgress, events: &EventSender) {
        if let Err(e) = self.store.save(progress) {
            warn!(error = %e, "could not save progress");
            events.error(MoverError::from(e).to_string());
        }
    }
}

/// Absolute, symlink-free form of a destination that may not exist yet.
///
/// The deepest existing ancestor is canonicalized and the missing
/// components are appended unchanged.
fn absolute_destination(path: &Path) -> std::io::Result<PathBuf> {
    let mut missing = Vec::new();
    let mut existing = path;

    while !existing.exists() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = if existing.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        existing.canonicalize()?
    };
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

fn success_message(dest: &Path, report: &WriteReport, operation: OperationMode) -> String {
    let verb = if report.moved { "moved" } else { "copied" };
    match (report.reencoded, operation) {
        (false, _) => format!("{} to {}", verb, dest.display()),
        (true, OperationMode::Copy) => format!("{} to {} (image recompressed)", verb, dest.display()),
        (true, OperationMode::Move) => format!(
            "{} to {} (image recompressed, original kept)",
            verb,
            dest.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::StructureModel;
    use crate::core::progress::InMemoryProgressStore;
    use crate::core::hasher::{ContentDigest, Sha256Hasher};
    use crate::error::HashError;
    use crate::events::EventChannel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn engine(source: &Path, dest: &Path) -> EngineBuilder {
        Engine::builder().source(source).destination(dest).no_recompress()
    }

    #[test]
    fn files_land_in_category_folders() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "report.pdf", b"%PDF-1.4");
        write(src.path(), "notes.txt", b"notes");
        write(src.path(), "song.mp3", b"ID3");

        let summary = engine(src.path(), dest.path()).build().run().unwrap();

        assert_eq!(summary.state, Some(RunState::Completed));
        assert_eq!(summary.succeeded, 3);
        assert!(dest.path().join("PDFs/report.pdf").exists());
        assert!(dest.path().join("Documentos/notes.txt").exists());
        assert!(dest.path().join("Áudios/song.mp3").exists());
    }

    #[test]
    fn mirrored_layout_keeps_relative_paths() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "2024/trip/a.txt", b"a");
        write(src.path(), "top.txt", b"top");

        engine(src.path(), dest.path())
            .layout(LayoutMode::Mirrored)
            .build()
            .run()
            .unwrap();

        assert!(dest.path().join("2024/trip/a.txt").exists());
        assert!(dest.path().join("top.txt").exists());
    }

    #[test]
    fn same_content_under_another_name_is_skipped() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"same bytes");
        write(src.path(), "b.txt", b"same bytes");

        let summary = engine(src.path(), dest.path()).build().run().unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert!(dest.path().join("Documentos/a.txt").exists());
        assert!(!dest.path().join("Documentos/b.txt").exists());
    }

    #[test]
    fn name_collision_gets_suffix() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "one/notes.txt", b"first");
        write(src.path(), "two/notes.txt", b"second");
        write(src.path(), "zzz/notes.txt", b"third");

        engine(src.path(), dest.path()).build().run().unwrap();

        let folder = dest.path().join("Documentos");
        assert_eq!(fs::read(folder.join("notes.txt")).unwrap(), b"first");
        assert_eq!(fs::read(folder.join("notes_1.txt")).unwrap(), b"second");
        assert_eq!(fs::read(folder.join("notes_2.txt")).unwrap(), b"third");
    }

    #[test]
    fn rerun_is_idempotent() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "one/notes.txt", b"first");
        write(src.path(), "two/notes.txt", b"second");

        engine(src.path(), dest.path()).build().run().unwrap();
        let second = engine(src.path(), dest.path()).build().run().unwrap();

        assert_eq!(second.succeeded, 0);
        assert_eq!(second.skipped, 2);
        assert!(!dest.path().join("Documentos/notes_2.txt").exists());
    }

    #[test]
    fn structure_model_routes_by_first_match() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");
        write(src.path(), "b.bin", b"b");

        let model = StructureModel::new()
            .with_folder("Docs", ["*.txt"])
            .with_folder("All", ["*.txt"]);

        engine(src.path(), dest.path())
            .structure(model)
            .build()
            .run()
            .unwrap();

        assert!(dest.path().join("Docs/a.txt").exists());
        assert!(dest.path().join("Outros/b.bin").exists());
        assert!(!dest.path().join("All").exists());
    }

    #[test]
    fn empty_source_is_fatal() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let (sender, receiver) = EventChannel::new();

        let result = engine(src.path(), dest.path())
            .build()
            .run_with_events(&sender, &CancellationToken::new());
        drop(sender);

        assert!(matches!(
            result,
            Err(MoverError::Setup(SetupError::NoFilesFound { .. }))
        ));
        let events: Vec<_> = receiver.iter().collect();
        assert!(events.iter().any(|e| matches!(e, Event::Error { .. })));
        assert!(matches!(
            events.last(),
            Some(Event::Finished { summary }) if summary.state == Some(RunState::Fatal)
        ));
    }

    #[test]
    fn destination_equal_to_source_is_rejected() {
        let src = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");

        let result = engine(src.path(), src.path()).build().run();
        assert!(matches!(
            result,
            Err(MoverError::Setup(SetupError::DestinationIsSource { .. }))
        ));
    }

    #[test]
    fn missing_source_is_rejected() {
        let dest = TempDir::new().unwrap();
        let result = engine(&dest.path().join("nope"), dest.path()).build().run();
        assert!(matches!(
            result,
            Err(MoverError::Setup(SetupError::SourceNotFound { .. }))
        ));
    }

    #[test]
    fn invalid_structure_model_is_rejected() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");

        let result = engine(src.path(), dest.path())
            .structure(StructureModel::new())
            .build()
            .run();
        assert!(matches!(
            result,
            Err(MoverError::Setup(SetupError::InvalidStructureModel { .. }))
        ));
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn destination_inside_source_is_not_walked() {
        let src = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");
        let dest = src.path().join("organized");

        let summary = engine(src.path(), &dest).build().run().unwrap();
        assert_eq!(summary.total_files, 1);

        let again = engine(src.path(), &dest).build().run().unwrap();
        assert_eq!(again.total_files, 1);
        assert_eq!(again.skipped, 1);
    }

    #[test]
    fn fatal_setup_leaves_no_destination_behind() {
        let src = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let dest = root.path().join("organized");

        let empty = engine(src.path(), &dest).build().run();
        assert!(matches!(
            empty,
            Err(MoverError::Setup(SetupError::NoFilesFound { .. }))
        ));
        assert!(!dest.exists());

        write(src.path(), "a.txt", b"a");
        let invalid = engine(src.path(), &dest)
            .structure(StructureModel::new())
            .build()
            .run();
        assert!(matches!(
            invalid,
            Err(MoverError::Setup(SetupError::InvalidStructureModel { .. }))
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn missing_destination_is_created_once_files_are_found() {
        let src = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");
        let dest = root.path().join("new/organized");

        let summary = engine(src.path(), &dest).build().run().unwrap();

        assert_eq!(summary.succeeded, 1);
        assert!(dest.join("Documentos/a.txt").exists());
        assert_eq!(summary.destination, dest.canonicalize().unwrap());
    }

    #[test]
    fn transform_failure_is_local_to_the_file() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"plain text");
        write(src.path(), "bad.jpg", b"this is not a jpeg");
        let (sender, receiver) = EventChannel::new();

        let summary = Engine::builder()
            .source(src.path())
            .destination(dest.path())
            .build()
            .run_with_events(&sender, &CancellationToken::new())
            .unwrap();
        drop(sender);

        assert_eq!(summary.state, Some(RunState::Completed));
        assert_eq!((summary.succeeded, summary.failed), (1, 1));

        let results: Vec<(OutcomeKind, String)> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::FileResult {
                    outcome, message, ..
                } => Some((outcome, message)),
                _ => None,
            })
            .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, OutcomeKind::Success);
        assert_eq!(results[1].0, OutcomeKind::Error);
        assert!(results[1].1.starts_with("bad.jpg: "));
        assert!(!dest.path().join("Imagens/bad.jpg").exists());
    }

    struct FailingHasher;

    impl ContentHasher for FailingHasher {
        fn hash_file(&self, path: &Path) -> std::result::Result<ContentDigest, HashError> {
            Err(HashError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("disk on fire"),
            })
        }

        fn hash_bytes(&self, _bytes: &[u8], path: &Path) -> std::result::Result<ContentDigest, HashError> {
            self.hash_file(path)
        }
    }

    #[test]
    fn hash_failure_is_local_to_the_file() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");
        write(src.path(), "b.txt", b"b");
        let (sender, receiver) = EventChannel::new();

        let summary = engine(src.path(), dest.path())
            .hasher(Box::new(FailingHasher))
            .build()
            .run_with_events(&sender, &CancellationToken::new())
            .unwrap();
        drop(sender);

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.state, Some(RunState::Completed));

        let message = receiver
            .iter()
            .find_map(|e| match e {
                Event::FileResult { message, .. } => Some(message),
                _ => None,
            })
            .unwrap();
        assert!(message.starts_with("a.txt: "));
        assert!(message.contains("disk on fire"));
    }

    /// Requests cancellation while hashing the n-th file
    struct CancelAfter {
        inner: Sha256Hasher,
        calls: AtomicUsize,
        after: usize,
        token: CancellationToken,
    }

    impl ContentHasher for CancelAfter {
        fn hash_file(&self, path: &Path) -> std::result::Result<ContentDigest, HashError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
                self.token.cancel();
            }
            self.inner.hash_file(path)
        }

        fn hash_bytes(&self, bytes: &[u8], path: &Path) -> std::result::Result<ContentDigest, HashError> {
            self.inner.hash_bytes(bytes, path)
        }
    }

    #[test]
    fn cancelled_run_saves_progress_and_resumes() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let names = ["1.txt", "2.txt", "3.txt", "4.txt", "5.txt"];
        for name in names {
            write(src.path(), name, name.as_bytes());
        }
        let store = InMemoryProgressStore::new();
        let cancel = CancellationToken::new();
        let (sender, receiver) = EventChannel::new();

        let first = engine(src.path(), dest.path())
            .progress_store(Box::new(store.clone()))
            .hasher(Box::new(CancelAfter {
                inner: Sha256Hasher::new(),
                calls: AtomicUsize::new(0),
                after: 2,
                token: cancel.clone(),
            }))
            .build();

        let summary = first.spawn(sender, cancel).join().unwrap().unwrap();

        assert_eq!(summary.state, Some(RunState::Cancelled));
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.cancelled, 1);

        let cancelled: Vec<String> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::FileResult {
                    file_name,
                    outcome: OutcomeKind::Cancelled,
                    ..
                } => Some(file_name),
                _ => None,
            })
            .collect();
        assert_eq!(cancelled, vec!["3.txt".to_string()]);

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.completed, 2);
        assert_eq!(saved.total, 5);

        let resumed = engine(src.path(), dest.path())
            .progress_store(Box::new(store.clone()))
            .resume(true)
            .build()
            .run()
            .unwrap();

        assert_eq!(resumed.state, Some(RunState::Completed));
        assert_eq!(resumed.resumed_from, 2);
        assert_eq!(resumed.succeeded, 3);
        assert_eq!(store.load().unwrap(), None);
        for name in names {
            assert!(dest.path().join("Documentos").join(name).exists());
        }
    }

    #[test]
    fn pre_cancelled_run_handles_nothing() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");
        write(src.path(), "b.txt", b"b");
        let store = InMemoryProgressStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = engine(src.path(), dest.path())
            .progress_store(Box::new(store.clone()))
            .build()
            .run_with_events(&null_sender(), &cancel)
            .unwrap();

        assert_eq!(summary.state, Some(RunState::Cancelled));
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.outcomes(), 1);
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.completed, 0);
        assert!(saved.current_source.unwrap().ends_with("a.txt"));
    }

    #[test]
    fn resume_with_other_destination_is_rejected() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");

        let store = InMemoryProgressStore::new();
        store
            .save(&RunProgress::new(
                vec![src.path().canonicalize().unwrap()],
                other.path().canonicalize().unwrap(),
                1,
            ))
            .unwrap();

        let result = engine(src.path(), dest.path())
            .progress_store(Box::new(store))
            .resume(true)
            .build()
            .run();

        assert!(matches!(
            result,
            Err(MoverError::Setup(SetupError::ResumeMismatch { .. }))
        ));
    }

    #[test]
    fn resume_falls_back_to_count_when_last_path_is_gone() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "b.txt", b"b");
        write(src.path(), "c.txt", b"c");

        let store = InMemoryProgressStore::new();
        let mut saved = RunProgress::new(
            vec![src.path().canonicalize().unwrap()],
            dest.path().canonicalize().unwrap(),
            3,
        );
        saved.advance(&src.path().canonicalize().unwrap().join("a.txt"));
        store.save(&saved).unwrap();

        let summary = engine(src.path(), dest.path())
            .progress_store(Box::new(store))
            .resume(true)
            .build()
            .run()
            .unwrap();

        assert_eq!(summary.resumed_from, 1);
        assert_eq!(summary.succeeded, 1);
        assert!(dest.path().join("Documentos/c.txt").exists());
        assert!(!dest.path().join("Documentos/b.txt").exists());
    }

    #[test]
    fn move_mode_empties_the_source() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let a = write(src.path(), "a.txt", b"a");

        let summary = engine(src.path(), dest.path())
            .operation(OperationMode::Move)
            .build()
            .run()
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert!(!a.exists());
        assert!(dest.path().join("Documentos/a.txt").exists());
    }

    #[test]
    fn outcome_and_progress_events_are_paired_and_monotonic() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.pdf", "d.txt"] {
            write(src.path(), name, name.as_bytes());
        }
        let (sender, receiver) = EventChannel::new();

        engine(src.path(), dest.path())
            .build()
            .run_with_events(&sender, &CancellationToken::new())
            .unwrap();
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                Event::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();

        assert_eq!(percents, vec![25, 50, 75, 100]);

        for (i, event) in events.iter().enumerate() {
            if let Event::FileResult { file_name, .. } = event {
                assert!(matches!(
                    &events[i + 1],
                    Event::Progress { file_name: next, .. } if next == file_name
                ));
            }
        }
    }
}
