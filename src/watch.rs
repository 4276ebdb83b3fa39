//! File system watcher for incremental rebuilds.
//!
//! Watches the source tree after the full build and re-dispatches only the
//! paths that changed. Stylesheet fragments are mapped back to their owning
//! page through the session's dependency table.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Event Loop                           │
//! │                                                              │
//! │  ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌─────────┐  │
//! │  │ notify   │──▶│ WatchGate │──▶│ Debouncer │──▶│ handle_ │  │
//! │  │ + Ready  │   │ (ready?)  │   │ (quiet)   │   │ changes │  │
//! │  └──────────┘   └───────────┘   └───────────┘   └─────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::{
    compiler::{Outcome, Session, Trigger, dispatch},
    log,
    utils::category::is_temp_file,
};
use anyhow::{Context, Result};
use notify::{
    Event, EventKind, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{
    path::PathBuf,
    sync::mpsc::{self, RecvTimeoutError},
    time::{Duration, Instant},
};

/// Idle wait when nothing is pending.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Events
// =============================================================================

/// File system event in the terms the watch loop acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Add(PathBuf),
    Change(PathBuf),
    Remove(PathBuf),
    /// Watch registered; everything after this is a live change
    Ready,
}

/// Map a raw notify event to watch events.
pub fn map_event(event: Event) -> Vec<WatchEvent> {
    let Event { kind, paths, .. } = event;
    let all = |f: fn(PathBuf) -> WatchEvent| -> Vec<WatchEvent> {
        paths.iter().cloned().map(f).collect()
    };

    match kind {
        EventKind::Create(_) => all(WatchEvent::Add),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
            all(WatchEvent::Change)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(WatchEvent::Add),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(WatchEvent::Remove),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = paths.iter().cloned();
            paths
                .next()
                .map(WatchEvent::Remove)
                .into_iter()
                .chain(paths.map(WatchEvent::Add))
                .collect()
        }
        // Backends that cannot tell the rename side apart
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .iter()
            .cloned()
            .map(|p| if p.exists() { WatchEvent::Add(p) } else { WatchEvent::Remove(p) })
            .collect(),
        EventKind::Remove(_) => all(WatchEvent::Remove),
        _ => Vec::new(),
    }
}

/// Suppresses events until the watcher reports `Ready`.
#[derive(Debug, Default)]
pub struct WatchGate {
    ready: bool,
}

impl WatchGate {
    /// Path to act on, if the event qualifies.
    ///
    /// Only `Add` and `Change` after `Ready` qualify.
    pub fn admit(&mut self, event: WatchEvent) -> Option<PathBuf> {
        match event {
            WatchEvent::Ready => {
                self.ready = true;
                None
            }
            _ if !self.ready => None,
            WatchEvent::Add(path) | WatchEvent::Change(path) => Some(path),
            WatchEvent::Remove(_) => None,
        }
    }

    pub const fn is_ready(&self) -> bool {
        self.ready
    }
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events until the tree has been quiet for `delay`.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    delay: Duration,
}

impl Debouncer {
    fn new(delay: Duration) -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            delay,
        }
    }

    fn add(&mut self, path: PathBuf) {
        if !is_temp_file(&path) {
            self.pending.insert(path);
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.delay)
    }

    /// Drain pending paths in sorted order.
    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            IDLE_TIMEOUT
        } else {
            self.delay
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Dispatch a batch of changed paths in parallel.
pub fn handle_changes(paths: &[PathBuf], session: &Session) -> Vec<Outcome> {
    paths
        .par_iter()
        .map(|path| dispatch(path, session, Trigger::Watch))
        .collect()
}

fn log_ready(session: &Session) {
    let src = &session.config().build.src;
    let deps = session.deps();
    if deps.is_empty() {
        log!("watch"; "watching {}", src.display());
    } else {
        log!("watch"; "watching {} ({} tracked imports)", src.display(), deps.len());
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the source tree and re-dispatch changed files until the process is
/// terminated.
pub fn watch(session: &Session) -> Result<()> {
    let src = &session.config().build.src;
    let (tx, rx) = mpsc::channel::<notify::Result<Vec<WatchEvent>>>();

    let fs_tx = tx.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        // Receiver gone means the loop has ended
        let _ = fs_tx.send(res.map(map_event));
    })
    .context("Failed to create file watcher")?;
    watcher
        .watch(src, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", src.display()))?;

    tx.send(Ok(vec![WatchEvent::Ready]))
        .context("Failed to start watch loop")?;
    drop(tx);

    let mut gate = WatchGate::default();
    let mut debouncer = Debouncer::new(session.config().watch.debounce());

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(events)) => {
                for event in events {
                    if event == WatchEvent::Ready && !gate.is_ready() {
                        log_ready(session);
                    }
                    if let Some(path) = gate.admit(event) {
                        debouncer.add(path);
                    }
                }
            }
            Ok(Err(e)) => log!("error"; "watch: {e}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if debouncer.ready() {
            handle_changes(&debouncer.take(), session);
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use crate::compiler::wpy::{compile_page, write_page};
    use crate::config::ProjectConfig;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::fs;
    use tempfile::TempDir;

    fn session() -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        (dir, Session::new(config))
    }

    fn write_src(session: &Session, rel: &str, contents: &str) -> PathBuf {
        let path = session.config().build.src.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn pages_dir(session: &Session) -> PathBuf {
        session.config().build.pages_dir()
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, p| event.add_path(PathBuf::from(p)))
    }

    // ------------------------------------------------------------------------
    // Event mapping
    // ------------------------------------------------------------------------

    #[test]
    fn test_map_create_and_modify() {
        let created = map_event(event(EventKind::Create(CreateKind::File), &["/s/a.wpy"]));
        assert_eq!(created, [WatchEvent::Add("/s/a.wpy".into())]);

        let kind = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        let changed = map_event(event(kind, &["/s/a.less"]));
        assert_eq!(changed, [WatchEvent::Change("/s/a.less".into())]);
    }

    #[test]
    fn test_map_rename_both() {
        let kind = EventKind::Modify(ModifyKind::Name(RenameMode::Both));
        let events = map_event(event(kind, &["/s/old.wpy", "/s/new.wpy"]));
        assert_eq!(
            events,
            [
                WatchEvent::Remove("/s/old.wpy".into()),
                WatchEvent::Add("/s/new.wpy".into())
            ]
        );
    }

    #[test]
    fn test_map_ignores_metadata_and_maps_remove() {
        let kind = EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions));
        assert!(map_event(event(kind, &["/s/a.js"])).is_empty());

        let removed = map_event(event(EventKind::Remove(RemoveKind::File), &["/s/a.js"]));
        assert_eq!(removed, [WatchEvent::Remove("/s/a.js".into())]);
    }

    // ------------------------------------------------------------------------
    // Gate / debouncer
    // ------------------------------------------------------------------------

    #[test]
    fn test_gate_suppresses_until_ready() {
        let mut gate = WatchGate::default();
        assert_eq!(gate.admit(WatchEvent::Change("/s/a.wpy".into())), None);
        assert_eq!(gate.admit(WatchEvent::Add("/s/b.wpy".into())), None);

        assert_eq!(gate.admit(WatchEvent::Ready), None);
        assert!(gate.is_ready());

        assert_eq!(
            gate.admit(WatchEvent::Change("/s/a.wpy".into())),
            Some("/s/a.wpy".into())
        );
        assert_eq!(gate.admit(WatchEvent::Add("/s/b.wpy".into())), Some("/s/b.wpy".into()));
        assert_eq!(gate.admit(WatchEvent::Remove("/s/c.wpy".into())), None);
    }

    #[test]
    fn test_debouncer_collapses_bursts() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.add("/s/b.wpy".into());
        debouncer.add("/s/a.wpy".into());
        debouncer.add("/s/b.wpy".into());
        debouncer.add("/s/.b.wpy.swp".into());

        assert!(debouncer.ready());
        let batch = debouncer.take();
        assert_eq!(batch, [PathBuf::from("/s/a.wpy"), PathBuf::from("/s/b.wpy")]);
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), IDLE_TIMEOUT);
    }

    #[test]
    fn test_debouncer_waits_for_quiet() {
        let mut debouncer = Debouncer::new(Duration::from_secs(3600));
        debouncer.add("/s/a.wpy".into());
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(3600));
    }

    // ------------------------------------------------------------------------
    // Incremental rebuilds
    // ------------------------------------------------------------------------

    #[test]
    fn test_fragment_change_rewrites_only_stylesheet() {
        let (_dir, session) = session();
        let shared = write_src(&session, "shared.less", ".s { color: red; }");
        let page = write_src(
            &session,
            "a.wpy",
            "<template><view/></template><script>Page({})</script>\
             <style>@import 'shared';</style><config>{}</config>",
        );
        build(&session);

        fs::write(&shared, ".s { color: blue; }").unwrap();

        // Only the stylesheet artifact differs from what is on disk
        let compiled = compile_page(&page, &session).unwrap();
        assert_eq!(compiled.sections.style, ".s { color: blue; }");
        assert_eq!(write_page(&compiled, &session).unwrap(), 1);

        fs::write(&shared, ".s { color: green; }").unwrap();
        let outcomes = handle_changes(&[shared.clone()], &session);
        assert_eq!(
            outcomes,
            [Outcome::Recompiled {
                dependency: shared,
                document: page
            }]
        );
        let wxss = fs::read_to_string(pages_dir(&session).join("a.wxss")).unwrap();
        assert_eq!(wxss, ".s { color: green; }");
        assert_eq!(
            fs::read_to_string(pages_dir(&session).join("a.js")).unwrap(),
            "Page({})"
        );
    }

    #[test]
    fn test_shared_fragment_recompiles_last_owner_only() {
        let (_dir, session) = session();
        let shared = write_src(&session, "shared.less", ".s{}");
        let a = write_src(&session, "a.wpy", "<style>@import 'shared';.a{}</style>");
        let b = write_src(&session, "b.wpy", "<style>@import 'shared';.b{}</style>");

        // Sequential so the most recent compile is known
        dispatch(&a, &session, Trigger::Build);
        dispatch(&b, &session, Trigger::Build);
        assert_eq!(session.deps().len(), 1);
        assert_eq!(session.deps().owner_of(&shared), Some(b.as_path()));

        fs::write(&shared, ".t{}").unwrap();
        let outcomes = handle_changes(&[shared.clone()], &session);

        assert_eq!(
            outcomes,
            [Outcome::Recompiled {
                dependency: shared,
                document: b
            }]
        );
        let read = |name: &str| fs::read_to_string(pages_dir(&session).join(name)).unwrap();
        assert_eq!(read("a.wxss"), ".s{}.a{}");
        assert_eq!(read("b.wxss"), ".t{}.b{}");
    }

    #[test]
    fn test_watch_batch_mixes_categories() {
        let (_dir, session) = session();
        let page = write_src(&session, "pages/home.wpy", "<script>1</script>");
        let script = write_src(&session, "app.js", "App({})");
        let lonely = write_src(&session, "lonely.less", ".l{}");
        let other = write_src(&session, "readme.md", "# hi");

        let outcomes = handle_changes(&[page, script, lonely, other], &session);
        assert_eq!(
            outcomes,
            [
                Outcome::Compiled,
                Outcome::Copied,
                Outcome::Untracked,
                Outcome::Ignored
            ]
        );
        assert!(pages_dir(&session).join("home.js").exists());
    }

    #[test]
    fn test_watch_loop_recompiles_owner_on_fragment_edit() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("wpy.toml"), "[watch]\ndebounce = 10\n").unwrap();
        let session = Session::new(ProjectConfig::load(dir.path()).unwrap());

        let shared = write_src(&session, "shared.less", ".s{}");
        write_src(&session, "a.wpy", "<style>@import 'shared';</style>");
        build(&session);

        // The loop never returns; the thread ends with the test process
        let session: &'static Session = Box::leak(Box::new(session));
        std::thread::spawn(move || watch(session));

        let wxss = pages_dir(session).join("a.wxss");
        let mut updated = false;
        for _ in 0..100 {
            // Rewritten each round in case it landed before the watch registered
            fs::write(&shared, ".s{color:red}").unwrap();
            std::thread::sleep(Duration::from_millis(100));
            if fs::read_to_string(&wxss).unwrap_or_default() == ".s{color:red}" {
                updated = true;
                break;
            }
        }
        assert!(updated, "a.wxss was not rebuilt by the watch loop");
    }
}
