//! Blocking until something a build depends on changes.

use std::path::Path;
use std::sync::mpsc;

use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::error::{Result, Chainable};
use crate::fstree::FsTree;

/// Reading a file isn't a change. The build itself reads every target.
fn is_change(event: &Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
}

/// Registers `target`. Directories are registered one by one, each
/// non-recursively, from a snapshot of the tree taken now.
fn register(watcher: &mut impl Watcher, target: &Path) -> Result<usize> {
    let metadata = target.metadata().chain_with(|| error! {
        "watch target does not exist",
        "path" => target.display(),
    })?;

    let mut watch = |path: &Path| watcher.watch(path, RecursiveMode::NonRecursive)
        .chain_with(|| error! {
            "failed to watch path",
            "path" => path.display(),
        });

    if !metadata.is_dir() {
        watch(target)?;
        return Ok(1);
    }

    let tree = FsTree::build(target)?;
    let mut count = 0;
    for dir in tree.dirs() {
        watch(&dir.path)?;
        count += 1;
    }

    Ok(count)
}

/// Watches `targets` and blocks until the first change to any of them, which
/// is returned. The watcher is dropped on return; events after the first are
/// not observed.
pub fn wait_for_changes(targets: &[&Path]) -> Result<Event> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)
        .chain(error!("failed to create file watcher"))?;

    for target in targets {
        let count = register(&mut watcher, target)?;
        tracing::debug!(target = %target.display(), directories = count, "watching");
    }

    loop {
        match rx.recv() {
            Ok(Ok(event)) if is_change(&event) => return Ok(event),
            Ok(Ok(event)) => tracing::trace!(?event, "ignoring access"),
            Ok(Err(e)) => return Err(e).chain(error!("file watcher failed")),
            Err(_) => return err!("file watcher disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn missing_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let error = wait_for_changes(&[&missing]).unwrap_err();
        assert_eq!(error.message(), "watch target does not exist");
    }

    #[test]
    fn wakes_on_change_in_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "").unwrap();

        let (tx, rx) = mpsc::channel();
        let (root, file) = (dir.path().join("a"), config.clone());
        thread::spawn(move || {
            let _ = tx.send(wait_for_changes(&[&file, &root]));
        });

        // Registration happens on the other thread; keep poking until it
        // notices.
        let target = nested.join("new.md");
        for i in 0..100 {
            fs::write(&target, format!("{i}")).unwrap();
            if let Ok(result) = rx.recv_timeout(Duration::from_millis(100)) {
                let event = result.unwrap();
                assert!(!matches!(event.kind, EventKind::Access(_)));
                return;
            }
        }

        panic!("no change observed");
    }
}
