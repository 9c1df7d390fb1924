use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::EventKind;
use notify::event::{
    AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use tempfile::TempDir;

use super::filter::{detaches_watch, is_change_kind, is_hidden, is_tracked};
use super::{ChangeSource, DirtyFlag, WatchSet};
use crate::utils::path::normalize_path;

fn make_tree() -> (TempDir, PathBuf) {
    let temp = tempfile::Builder::new().prefix("livewasm").tempdir().unwrap();
    let root = normalize_path(temp.path());
    (temp, root)
}

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn make_event(paths: Vec<PathBuf>, kind: EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths,
        attrs: Default::default(),
    }
}

fn modify_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Any))
}

// =============================================================================
// Filter
// =============================================================================

#[test]
fn test_is_tracked_extension() {
    let root = Path::new("/project");
    assert!(is_tracked(Path::new("/project/main.go"), root));
    assert!(is_tracked(Path::new("/project/pkg/util/util.go"), root));
    assert!(!is_tracked(Path::new("/project/main.rs"), root));
    assert!(!is_tracked(Path::new("/project/go.mod"), root));
    assert!(!is_tracked(Path::new("/project/main.go.swp"), root));
    assert!(!is_tracked(Path::new("/project/Makefile"), root));
}

#[test]
fn test_is_tracked_skips_hidden() {
    let root = Path::new("/project");
    assert!(!is_tracked(Path::new("/project/.hidden.go"), root));
    assert!(!is_tracked(Path::new("/project/.git/hooks/x.go"), root));
    assert!(!is_tracked(Path::new("/project/vendor/.cache/a.go"), root));
}

#[test]
fn test_is_tracked_hidden_root_is_fine() {
    // Only components below the root count
    let root = Path::new("/home/me/.projects/app");
    assert!(is_tracked(Path::new("/home/me/.projects/app/main.go"), root));
}

#[test]
fn test_is_hidden() {
    assert!(is_hidden(Path::new(".git")));
    assert!(is_hidden(Path::new("a/.b/c")));
    assert!(!is_hidden(Path::new("a/b/c.go")));
    assert!(!is_hidden(Path::new("./a/b")));
}

#[test]
fn test_change_kinds() {
    assert!(is_change_kind(&EventKind::Create(CreateKind::File)));
    assert!(is_change_kind(&EventKind::Remove(RemoveKind::File)));
    assert!(is_change_kind(&modify_kind()));
    assert!(is_change_kind(&EventKind::Modify(ModifyKind::Name(
        RenameMode::To
    ))));

    assert!(!is_change_kind(&EventKind::Modify(ModifyKind::Metadata(
        MetadataKind::WriteTime
    ))));
    assert!(!is_change_kind(&EventKind::Access(AccessKind::Any)));
    assert!(!is_change_kind(&EventKind::Any));
}

#[test]
fn test_detaches_watch() {
    assert!(detaches_watch(&EventKind::Remove(RemoveKind::File)));
    assert!(detaches_watch(&EventKind::Modify(ModifyKind::Name(
        RenameMode::From
    ))));
    assert!(!detaches_watch(&modify_kind()));
    assert!(!detaches_watch(&EventKind::Create(CreateKind::File)));
}

// =============================================================================
// DirtyFlag
// =============================================================================

#[test]
fn test_dirty_flag_take_clears() {
    let flag = DirtyFlag::new();
    assert!(!flag.take());

    flag.mark();
    flag.mark();
    assert!(flag.is_dirty());
    assert!(flag.take());
    assert!(!flag.take());
    assert!(!flag.is_dirty());
}

#[test]
fn test_dirty_flag_shared_between_clones() {
    let flag = DirtyFlag::new();
    let other = flag.clone();
    other.mark();
    assert!(flag.take());
    assert!(!other.is_dirty());
}

#[test]
fn test_dirty_flag_concurrent_marks_are_never_lost() {
    let flag = DirtyFlag::new();
    let taken = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let markers: Vec<_> = (0..4)
        .map(|_| {
            let flag = flag.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    flag.mark();
                }
            })
        })
        .collect();

    let taker = {
        let flag = flag.clone();
        let taken = Arc::clone(&taken);
        std::thread::spawn(move || {
            for _ in 0..1000 {
                if flag.take() {
                    taken.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
            }
        })
    };

    for handle in markers {
        handle.join().unwrap();
    }
    taker.join().unwrap();

    // Whatever the taker missed is still pending
    let pending = flag.take();
    assert!(pending || taken.load(std::sync::atomic::Ordering::Relaxed) > 0);
    assert!(!flag.take());
}

// =============================================================================
// WatchSet
// =============================================================================

#[test]
fn test_watch_set_discover_tracked_only() {
    let (_temp, root) = make_tree();
    let main = write(&root, "main.go", "package main");
    let util = write(&root, "pkg/util.go", "package pkg");
    write(&root, "go.mod", "module x");
    write(&root, "server/index.html", "<html></html>");
    write(&root, ".git/hooks/pre.go", "package hooks");
    write(&root, "pkg/.draft.go", "package pkg");

    let set = WatchSet::new(root.clone());
    let found = set.discover();

    assert_eq!(found, {
        let mut expected = vec![main, util];
        expected.sort();
        expected
    });
}

#[test]
fn test_watch_set_discover_skips_members() {
    let (_temp, root) = make_tree();
    let main = write(&root, "main.go", "package main");

    let mut set = WatchSet::new(root.clone());
    for path in set.discover() {
        assert!(set.insert(path));
    }
    assert_eq!(set.len(), 1);
    assert!(set.contains(&main));
    assert!(set.discover().is_empty());

    let added = write(&root, "extra.go", "package main");
    assert_eq!(set.discover(), vec![added]);
}

#[test]
fn test_watch_set_stale_tracking() {
    let (_temp, root) = make_tree();
    let main = write(&root, "main.go", "package main");

    let mut set = WatchSet::new(root.clone());
    set.insert(main.clone());

    // Non-members are ignored
    set.mark_stale(&root.join("other.go"));
    assert_eq!(set.stale_len(), 0);

    set.mark_stale(&main);
    assert_eq!(set.stale_len(), 1);
    assert_eq!(set.reattachable(), vec![main.clone()]);

    std::fs::remove_file(&main).unwrap();
    assert!(set.reattachable().is_empty());
    // Removed files stay members
    assert!(set.contains(&main));

    set.mark_attached(&main);
    assert_eq!(set.stale_len(), 0);
}

// =============================================================================
// ChangeSource
// =============================================================================

#[test]
fn test_change_source_initial_scan_does_not_mark_dirty() {
    let (_temp, root) = make_tree();
    write(&root, "main.go", "package main");
    write(&root, "lib/lib.go", "package lib");

    let dirty = DirtyFlag::new();
    let source = ChangeSource::new(root, dirty.clone(), None);

    assert_eq!(source.watch_set().len(), 2);
    assert!(!dirty.is_dirty());
}

#[test]
fn test_change_source_handle_event_marks_dirty() {
    let (_temp, root) = make_tree();
    let main = write(&root, "main.go", "package main");

    let dirty = DirtyFlag::new();
    let mut source = ChangeSource::new(root.clone(), dirty.clone(), None);

    assert!(source.handle_event(&make_event(vec![main], modify_kind())));
    assert!(dirty.take());
}

#[test]
fn test_change_source_ignores_untracked_and_noise() {
    let (_temp, root) = make_tree();
    let main = write(&root, "main.go", "package main");
    let readme = write(&root, "README.md", "# hi");

    let dirty = DirtyFlag::new();
    let mut source = ChangeSource::new(root.clone(), dirty.clone(), None);

    assert!(!source.handle_event(&make_event(vec![readme], modify_kind())));
    assert!(!source.handle_event(&make_event(
        vec![root.join(".git/index.go")],
        modify_kind()
    )));
    assert!(!source.handle_event(&make_event(
        vec![main.clone()],
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))
    )));
    assert!(!source.handle_event(&make_event(
        vec![main],
        EventKind::Access(AccessKind::Any)
    )));
    assert!(!dirty.is_dirty());
}

#[test]
fn test_change_source_remove_marks_stale() {
    let (_temp, root) = make_tree();
    let main = write(&root, "main.go", "package main");

    let dirty = DirtyFlag::new();
    let mut source = ChangeSource::new(root.clone(), dirty.clone(), None);
    assert_eq!(source.watch_set().stale_len(), 0);

    std::fs::remove_file(&main).unwrap();
    assert!(source.handle_event(&make_event(
        vec![main.clone()],
        EventKind::Remove(RemoveKind::File)
    )));
    assert!(dirty.take());
    assert_eq!(source.watch_set().stale_len(), 1);

    // Recreated: next maintenance pass re-attaches
    write(&root, "main.go", "package main // v2");
    assert_eq!(source.maintain(), 1);
    assert_eq!(source.watch_set().stale_len(), 0);
}

#[test]
fn test_change_source_recreated_subdir_file_marks_dirty() {
    let (_temp, root) = make_tree();
    write(&root, "main.go", "package main");
    let lib = write(&root, "lib/lib.go", "package lib");

    let dirty = DirtyFlag::new();
    let mut source = ChangeSource::new(root.clone(), dirty.clone(), None);

    std::fs::remove_file(&lib).unwrap();
    source.handle_event(&make_event(vec![lib.clone()], EventKind::Remove(RemoveKind::File)));
    // A build ran after the delete
    assert!(dirty.take());

    // Still missing: nothing to re-attach, nothing to rebuild
    assert_eq!(source.maintain(), 0);
    assert_eq!(source.rescan(), 0);
    assert!(!dirty.is_dirty());

    write(&root, "lib/lib.go", "package lib // v2");
    assert_eq!(source.maintain(), 1);
    // Still a member, so rescan does not rediscover it
    assert_eq!(source.rescan(), 0);
    assert!(dirty.take());
}

#[tokio::test]
async fn test_change_source_run_rebuilds_recreated_subdir_file() {
    let (_temp, root) = make_tree();
    write(&root, "main.go", "package main");
    let lib = write(&root, "lib/lib.go", "package lib");

    let dirty = DirtyFlag::new();
    let source = ChangeSource::new(root.clone(), dirty.clone(), Some(Duration::from_millis(50)));
    let shutdown = crate::core::Shutdown::new();
    let task = tokio::spawn(source.run(shutdown.clone()));

    std::fs::remove_file(&lib).unwrap();
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !dirty.is_dirty() && std::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(dirty.take(), "removal was not detected");
    // Let the remaining events of the removal drain
    tokio::time::sleep(Duration::from_millis(200)).await;
    dirty.take();

    write(&root, "lib/lib.go", "package lib // v2");
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !dirty.is_dirty() && std::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(dirty.take(), "recreated lib/lib.go never marked the tree dirty");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}

#[test]
fn test_change_source_rescan_registers_new_files() {
    let (_temp, root) = make_tree();
    write(&root, "main.go", "package main");

    let dirty = DirtyFlag::new();
    let mut source = ChangeSource::new(root.clone(), dirty.clone(), None);
    assert_eq!(source.rescan(), 0);
    assert!(!dirty.is_dirty());

    let added = write(&root, "cmd/tool/tool.go", "package main");
    write(&root, "notes.txt", "not tracked");

    assert_eq!(source.rescan(), 1);
    assert!(source.watch_set().contains(&added));
    assert!(dirty.take());

    // Already registered
    assert_eq!(source.rescan(), 0);
    assert!(!dirty.is_dirty());
}

#[tokio::test]
async fn test_change_source_run_stops_on_shutdown() {
    let (_temp, root) = make_tree();
    write(&root, "main.go", "package main");

    let shutdown = crate::core::Shutdown::new();
    let source = ChangeSource::new(root, DirtyFlag::new(), Some(std::time::Duration::from_millis(20)));
    let handle = tokio::spawn(source.run(shutdown.clone()));

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    shutdown.trigger();

    tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("change source did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_change_source_run_detects_write() {
    let (_temp, root) = make_tree();
    let main = write(&root, "main.go", "package main");

    let dirty = DirtyFlag::new();
    let shutdown = crate::core::Shutdown::new();
    let source = ChangeSource::new(root, dirty.clone(), None);
    let handle = tokio::spawn(source.run(shutdown.clone()));

    // Let the bridge thread start
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    std::fs::write(&main, "package main\n\nfunc main() {}\n").unwrap();

    let mut seen = false;
    for _ in 0..50 {
        if dirty.is_dirty() {
            seen = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    shutdown.trigger();
    let _ = handle.await;
    assert!(seen, "write to main.go was not detected");
}
