use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::tempdir;
use zipmerge_fs::{
    CancelToken, DedupScope, DirectoryMerger, Error, LayoutPolicy, MergeOptions, Progress,
    ProgressFn, list_files, merge,
};

fn populate(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir.to_path_buf()
}

fn names(dir: &Path) -> Vec<String> {
    list_files(dir)
        .unwrap()
        .iter()
        .map(|f| f.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn identical_files_in_one_source_copied_once() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("target"), &[]);
    let source = populate(
        &root.path().join("source"),
        &[("first.txt", "same bytes"), ("second.txt", "same bytes")],
    );

    let report = merge(&[target.clone(), source], &MergeOptions::default()).unwrap();

    assert_eq!(names(&target), vec!["first.txt"]);
    assert_eq!(report.copied_count(), 1);
    assert_eq!(report.duplicate_count(), 1);
}

#[test]
fn first_encountered_duplicate_is_kept() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("target"), &[]);
    let source = populate(
        &root.path().join("source"),
        &[("a.txt", "dup"), ("b.txt", "unique"), ("c.txt", "dup")],
    );

    let report = merge(&[target.clone(), source.clone()], &MergeOptions::default()).unwrap();

    assert_eq!(names(&target), vec!["a.txt", "b.txt"]);
    assert_eq!(report.sources[0].duplicates, vec![source.join("c.txt")]);
}

#[test]
fn unreadable_file_is_recorded_and_skipped() {
    let root = tempdir().unwrap();
    // A directory squatting on the destination name makes the copy of f3 fail.
    let target = populate(&root.path().join("target"), &[("f3.txt/keep", "")]);
    let source = populate(
        &root.path().join("source"),
        &[
            ("f1.txt", "1"),
            ("f2.txt", "2"),
            ("f3.txt", "3"),
            ("f4.txt", "4"),
            ("f5.txt", "5"),
        ],
    );

    let report = merge(&[target.clone(), source.clone()], &MergeOptions::default()).unwrap();

    let faults: Vec<_> = report.faults().collect();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].path, source.join("f3.txt"));
    assert_eq!(report.copied_count(), 4);
    for name in ["f1.txt", "f2.txt", "f4.txt", "f5.txt"] {
        assert!(target.join(name).is_file(), "{name} should have been copied");
    }
}

#[test]
fn file_that_cannot_be_fingerprinted_is_recorded_and_skipped() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("target"), &[]);
    let source = populate(
        &root.path().join("source"),
        &[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")],
    );

    // b.txt vanishes after it was listed, so hashing it fails.
    let vanishing = source.join("b.txt");
    let callback: ProgressFn = Arc::new(move |p: Progress| {
        if p.current_file.as_deref().is_some_and(|f| f.ends_with("a.txt")) {
            let _ = fs::remove_file(&vanishing);
        }
    });

    let mut merger = DirectoryMerger::new(&target, MergeOptions::default().on_progress(callback)).unwrap();
    let folded = merger.fold(&source).unwrap();

    assert_eq!(folded.faults.len(), 1);
    assert_eq!(folded.faults[0].path, source.join("b.txt"));
    assert!(folded.faults[0].reason.contains("b.txt"), "{}", folded.faults[0].reason);
    assert_eq!(names(&target), vec!["a.txt", "c.txt"]);
}

#[test]
fn flatten_moves_nested_target_files_to_the_root() {
    let root = tempdir().unwrap();
    let target = populate(
        &root.path().join("target"),
        &[("docs/guide.txt", "guide"), ("top.txt", "top")],
    );

    let report = merge(&[target.clone()], &MergeOptions::default()).unwrap();

    assert_eq!(names(&target), vec!["guide.txt", "top.txt"]);
    assert_eq!(fs::read_to_string(target.join("guide.txt")).unwrap(), "guide");
    assert!(report.displaced.is_empty());
    assert!(report.target_faults.is_empty());
}

#[test]
fn flatten_keeps_the_last_target_file_per_name() {
    let root = tempdir().unwrap();
    let target = populate(
        &root.path().join("target"),
        &[("a/same.txt", "first"), ("b/same.txt", "second")],
    );

    let report = merge(&[target.clone()], &MergeOptions::default()).unwrap();

    assert_eq!(names(&target), vec!["same.txt"]);
    assert_eq!(fs::read_to_string(target.join("same.txt")).unwrap(), "second");
    assert_eq!(report.displaced, vec![target.join("a").join("same.txt")]);
}

#[test]
fn later_source_overwrites_nested_target_file() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("target"), &[("0dir/z.txt", "old")]);
    let source = populate(&root.path().join("source"), &[("z.txt", "new")]);

    merge(&[target.clone(), source], &MergeOptions::default()).unwrap();

    assert_eq!(names(&target), vec!["z.txt"]);
    assert_eq!(fs::read_to_string(target.join("z.txt")).unwrap(), "new");
}

#[test]
fn preserve_layout_leaves_target_untouched() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("target"), &[("docs/guide.txt", "guide")]);

    let options = MergeOptions::default().layout(LayoutPolicy::PreserveRelative);
    merge(&[target.clone()], &options).unwrap();

    assert_eq!(names(&target), vec!["docs/guide.txt"]);
}

#[test]
fn two_archives_worth_of_folders() {
    let root = tempdir().unwrap();
    let x = populate(&root.path().join("x"), &[("a.txt", "hello"), ("b.txt", "world")]);
    let y = populate(&root.path().join("y"), &[("a.txt", "hello"), ("c.txt", "bye")]);

    let report = merge(&[x.clone(), y], &MergeOptions::default()).unwrap();

    assert_eq!(report.target, x);
    assert_eq!(names(&x), vec!["a.txt", "b.txt", "c.txt"]);
    assert_eq!(fs::read_to_string(x.join("a.txt")).unwrap(), "hello");
    assert_eq!(fs::read_to_string(x.join("c.txt")).unwrap(), "bye");
}

#[test]
fn later_source_wins_name_clash() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("t"), &[("readme.txt", "v1")]);
    let first = populate(&root.path().join("s1"), &[("readme.txt", "v2")]);
    let second = populate(&root.path().join("s2"), &[("nested/readme.txt", "v3")]);

    merge(&[target.clone(), first, second], &MergeOptions::default()).unwrap();

    assert_eq!(names(&target), vec!["readme.txt"]);
    assert_eq!(fs::read_to_string(target.join("readme.txt")).unwrap(), "v3");
}

#[test]
fn per_source_scope_ignores_target_content() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("t"), &[("a.txt", "hello")]);
    let source = populate(&root.path().join("s"), &[("copy-of-a.txt", "hello")]);

    merge(&[target.clone(), source], &MergeOptions::default()).unwrap();

    assert_eq!(names(&target), vec!["a.txt", "copy-of-a.txt"]);
}

#[test]
fn global_scope_dedups_across_sources_and_target() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("t"), &[("a.txt", "hello")]);
    let first = populate(&root.path().join("s1"), &[("copy-of-a.txt", "hello"), ("b.txt", "b")]);
    let second = populate(&root.path().join("s2"), &[("also-b.txt", "b")]);

    let options = MergeOptions::default().dedup_scope(DedupScope::Global);
    let report = merge(&[target.clone(), first, second], &options).unwrap();

    assert_eq!(names(&target), vec!["a.txt", "b.txt"]);
    assert_eq!(report.duplicate_count(), 2);
}

#[test]
fn preserve_layout_keeps_subdirectories() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("t"), &[]);
    let source = populate(
        &root.path().join("s"),
        &[("docs/readme.txt", "docs"), ("src/readme.txt", "src")],
    );

    let options = MergeOptions::default().layout(LayoutPolicy::PreserveRelative);
    merge(&[target.clone(), source], &options).unwrap();

    assert_eq!(names(&target), vec!["docs/readme.txt", "src/readme.txt"]);
}

#[test]
fn missing_source_is_fatal() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("t"), &[]);

    let result = merge(&[target, root.path().join("missing")], &MergeOptions::default());
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[test]
fn empty_source_list_is_rejected() {
    assert!(matches!(merge(&[], &MergeOptions::default()), Err(Error::NoSources)));
}

#[test]
fn cancelled_merge_stops_before_copying() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("t"), &[]);
    let source = populate(&root.path().join("s"), &[("a.txt", "a")]);

    let token = CancelToken::new();
    token.cancel();
    let options = MergeOptions::default().cancel(token);

    let result = merge(&[target.clone(), source], &options);
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(names(&target).is_empty());
}

#[test]
fn one_progress_unit_per_file() {
    let root = tempdir().unwrap();
    let target = populate(&root.path().join("t"), &[]);
    let source = populate(&root.path().join("s"), &[("a.txt", "x"), ("b.txt", "x"), ("c.txt", "y")]);

    let events = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));

    let mut merger = DirectoryMerger::new(&target, MergeOptions::default().on_progress(callback)).unwrap();
    let folded = merger.fold(&source).unwrap();
    assert_eq!(folded.files_seen, 3);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|p| p.total == 3));
    assert_eq!(events.last().unwrap().processed, 3);
}
