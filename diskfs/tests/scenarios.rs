//! End-to-end scenarios driven entirely through `Filesystem`'s public API,
//! one image per test, each under its own throwaway directory so tests can
//! run concurrently without colliding.

use diskfs::{Filesystem, FsError, Kind};
use std::fs::{create_dir_all, remove_dir, remove_file};
use std::path::{Path, PathBuf};

fn prep_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(format!("fs-images-scenarios-{}", name));
    if path.exists() {
        remove_dir_all_quiet(&path);
    }
    create_dir_all(&path).unwrap();
    path.push("img");
    path
}

fn remove_dir_all_quiet(path: &Path) {
    if path.is_dir() {
        for entry in std::fs::read_dir(path).unwrap() {
            let entry = entry.unwrap();
            if entry.path().is_dir() {
                remove_dir_all_quiet(&entry.path());
                let _ = remove_dir(entry.path());
            } else {
                let _ = remove_file(entry.path());
            }
        }
        let _ = remove_dir(path);
    }
}

fn teardown(path: &Path) {
    let _ = remove_file(path);
    if let Some(parent) = path.parent() {
        let _ = remove_dir(parent);
    }
}

fn names(fs: &Filesystem) -> Vec<String> {
    fs.ls().unwrap().into_iter().map(|(n, _)| n).collect()
}

#[test]
fn builds_a_small_tree_and_lists_it_in_sorted_order() {
    let path = prep_path("small-tree");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    fs.mkdir("docs").unwrap();
    fs.mkdir("bin").unwrap();
    fs.touch("readme.txt").unwrap();
    fs.echo("readme.txt", "hello world").unwrap();

    assert_eq!(names(&fs), vec!["bin", "docs", "readme.txt"]);
    assert_eq!(fs.cat("readme.txt").unwrap(), "hello world");

    teardown(&path);
}

#[test]
fn nested_navigation_round_trips_through_pwd() {
    let path = prep_path("nested-nav");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    fs.mkdir("a").unwrap();
    fs.cd("a").unwrap();
    fs.mkdir("b").unwrap();
    fs.cd("b").unwrap();
    fs.mkdir("c").unwrap();
    fs.cd("c").unwrap();
    assert_eq!(fs.pwd().unwrap(), "root/a/b/c");

    fs.cd("../..").unwrap();
    assert_eq!(fs.pwd().unwrap(), "root/a");

    fs.cd("/a/b/c").unwrap();
    assert_eq!(fs.pwd().unwrap(), "root/a/b/c");

    fs.cd("/").unwrap();
    assert_eq!(fs.pwd().unwrap(), "root");

    teardown(&path);
}

#[test]
fn rmdir_requires_emptiness_but_then_succeeds() {
    let path = prep_path("rmdir-sequence");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    fs.mkdir("a").unwrap();
    fs.cd("a").unwrap();
    fs.mkdir("b").unwrap();
    fs.cd("..").unwrap();

    assert!(matches!(fs.rmdir("a"), Err(FsError::Full)));

    fs.cd("a").unwrap();
    fs.rmdir("b").unwrap();
    fs.cd("..").unwrap();

    fs.rmdir("a").unwrap();
    assert!(names(&fs).is_empty());

    teardown(&path);
}

#[test]
fn echo_content_spanning_several_blocks_round_trips_through_cat() {
    let path = prep_path("multi-block-content");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    fs.touch("big.txt").unwrap();
    // One byte past two full 4096-byte blocks: exercises the block-boundary
    // split and the trailing partial block in the same write.
    let content = "ab".repeat(4097);
    fs.echo("big.txt", &content).unwrap();
    assert_eq!(fs.cat("big.txt").unwrap(), content);

    // Shrinking back down must free the now-unused trailing blocks rather
    // than just truncating the logical content.
    fs.echo("big.txt", "small").unwrap();
    assert_eq!(fs.cat("big.txt").unwrap(), "small");

    teardown(&path);
}

#[test]
fn mv_renames_in_place_and_mvdir_reparents() {
    let path = prep_path("mv-and-mvdir");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    fs.touch("draft.txt").unwrap();
    fs.mv("draft.txt", "final.txt").unwrap();
    assert_eq!(names(&fs), vec!["final.txt"]);

    fs.mkdir("src").unwrap();
    fs.mkdir("archive").unwrap();
    fs.mvdir("src", "archive").unwrap();
    assert_eq!(names(&fs), vec!["archive", "final.txt"]);

    fs.cd("archive").unwrap();
    assert_eq!(names(&fs), vec!["src"]);

    teardown(&path);
}

#[test]
fn cp_handles_new_name_existing_directory_and_existing_file() {
    let path = prep_path("cp-variants");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    fs.touch("source.txt").unwrap();
    fs.echo("source.txt", "payload").unwrap();

    fs.cp("source.txt", "copy.txt").unwrap();
    assert_eq!(fs.cat("copy.txt").unwrap(), "payload");

    fs.mkdir("dest").unwrap();
    fs.cp("source.txt", "dest").unwrap();
    fs.cd("dest").unwrap();
    assert_eq!(fs.cat("source.txt").unwrap(), "payload");
    fs.cd("..").unwrap();

    fs.touch("target.txt").unwrap();
    fs.echo("target.txt", "old contents that are much longer than the new one")
        .unwrap();
    fs.cp("source.txt", "target.txt").unwrap();
    assert_eq!(fs.cat("target.txt").unwrap(), "payload");

    teardown(&path);
}

#[test]
fn unrecognized_operations_are_reported_with_the_expected_error_kind() {
    let path = prep_path("error-kinds");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    assert!(matches!(fs.cd("nowhere"), Err(FsError::NotFound(_))));
    assert!(matches!(fs.cat("nowhere"), Err(FsError::NotFound(_))));

    fs.mkdir("a").unwrap();
    assert!(matches!(fs.rm("a"), Err(FsError::NotFile(_))));

    fs.touch("f").unwrap();
    assert!(matches!(fs.rmdir("f"), Err(FsError::NotDirectory(_))));
    assert!(matches!(fs.mkdir("f"), Err(FsError::Exists(_))));

    teardown(&path);
}

#[test]
fn a_fresh_directory_exhausts_its_entry_capacity_cleanly() {
    let path = prep_path("directory-capacity");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();
    fs.mkdir("many").unwrap();
    fs.cd("many").unwrap();

    for i in 0..diskfs::geometry::MAX_TABLE_ENTRIES {
        fs.touch(&format!("f{}", i)).unwrap();
    }
    assert_eq!(names(&fs).len(), diskfs::geometry::MAX_TABLE_ENTRIES);
    assert!(matches!(fs.touch("one-too-many"), Err(FsError::Full)));

    teardown(&path);
}

#[test]
fn reopening_the_image_preserves_the_whole_tree_and_allocator_state() {
    let path = prep_path("reopen-preserves-tree");
    {
        let mut fs = Filesystem::mount(&path, "ada").unwrap();
        fs.mkdir("a").unwrap();
        fs.cd("a").unwrap();
        fs.touch("note.txt").unwrap();
        fs.echo("note.txt", "persisted").unwrap();
    }

    let mut fs = Filesystem::mount(&path, "bob").unwrap();
    assert_eq!(names(&fs), vec!["a"]);
    fs.cd("a").unwrap();
    assert_eq!(fs.cat("note.txt").unwrap(), "persisted");

    // A session opened under a different user can still touch new files;
    // the image itself carries no notion of a single fixed owner.
    fs.touch("second.txt").unwrap();
    assert_eq!(names(&fs), vec!["note.txt", "second.txt"]);

    teardown(&path);
}

#[test]
fn ignores_blank_and_dot_only_path_components() {
    let path = prep_path("dot-components");
    let mut fs = Filesystem::mount(&path, "ada").unwrap();

    fs.mkdir("a").unwrap();
    fs.cd("./a/.").unwrap();
    assert_eq!(fs.pwd().unwrap(), "root/a");

    fs.cd("").unwrap();
    assert_eq!(fs.pwd().unwrap(), "root/a");

    teardown(&path);
}
