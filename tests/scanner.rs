//! Scanner Integration Tests
//!
//! Builds small media trees on disk and checks the indexed entries.

use std::fs;
use std::path::{Path, PathBuf};

use audioshelf::config::ScanSettings;
use audioshelf::domain::{Chapter, ContentEntry, ContentId};
use audioshelf::library::Scanner;
use audioshelf::store::{Database, Table};
use tempfile::TempDir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

/// music/album/{b.mp3, a.mp3, cover.jpg}
/// books/novel/{.audiobook, 01.mp3, 02.MP3}, books/novel/part2/x.ogg
/// books/other/y.m4a
fn media_tree() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();

    touch(&root.join("music/album/b.mp3"));
    touch(&root.join("music/album/a.mp3"));
    touch(&root.join("music/album/cover.jpg"));
    touch(&root.join("books/novel/.audiobook"));
    touch(&root.join("books/novel/01.mp3"));
    touch(&root.join("books/novel/02.MP3"));
    touch(&root.join("books/novel/part2/x.ogg"));
    touch(&root.join("books/other/y.m4a"));

    (temp, root)
}

fn scanner() -> (Table<ContentEntry>, Scanner) {
    let db = Database::open_in_memory().unwrap();
    let table = db.table("directories").unwrap();
    let scanner = Scanner::new(table.clone(), ScanSettings::default());
    (table, scanner)
}

fn entry_for(table: &Table<ContentEntry>, dir: &Path) -> ContentEntry {
    let id = ContentId::from_path(dir);
    table
        .get(id.as_str())
        .unwrap()
        .unwrap_or_else(|| panic!("no entry for {}", dir.display()))
}

#[test]
fn test_scan_indexes_albums_and_books() {
    let (_temp, root) = media_tree();
    let (table, scanner) = scanner();

    let report = scanner.scan(&root, "/media").unwrap();

    assert_eq!(report.albums, 2);
    assert_eq!(report.books, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(table.list().unwrap().len(), 4);

    let album = entry_for(&table, &root.join("music/album"));
    assert_eq!(album.name, "album");
    assert!(!album.is_book);
    assert_eq!(album.url, "/media/music/album");
    let names: Vec<_> = album.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.mp3", "b.mp3"]);
    assert_eq!(album.files[0].url, "/media/music/album/a.mp3");
    assert!(album.files.iter().all(|f| f.chapters.is_none()));

    let novel = entry_for(&table, &root.join("books/novel"));
    assert!(novel.is_book);
    let names: Vec<_> = novel.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["01.mp3", "02.MP3"]);
}

#[test]
fn test_marker_propagates_to_subdirectories() {
    let (_temp, root) = media_tree();
    let (table, scanner) = scanner();

    scanner.scan(&root, "/").unwrap();

    let part2 = entry_for(&table, &root.join("books/novel/part2"));
    assert!(part2.is_book);
    assert_eq!(part2.url, "/books/novel/part2");

    // Sibling of the marked directory is unaffected
    let other = entry_for(&table, &root.join("books/other"));
    assert!(!other.is_book);
}

#[test]
fn test_marker_propagates_through_empty_levels() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    touch(&root.join("saga/.audiobook"));
    touch(&root.join("saga/vol1/disc1/track.mp3"));
    touch(&root.join("zzz/track.mp3"));

    let (table, scanner) = scanner();
    scanner.scan(&root, "/").unwrap();

    // The marked directory has no audio itself, so it gets no entry
    assert!(table
        .get(ContentId::from_path(&root.join("saga")).as_str())
        .unwrap()
        .is_none());
    assert!(entry_for(&table, &root.join("saga/vol1/disc1")).is_book);
    assert!(!entry_for(&table, &root.join("zzz")).is_book);
}

#[test]
fn test_rescan_is_idempotent() {
    let (_temp, root) = media_tree();
    let (table, scanner) = scanner();

    scanner.scan(&root, "/").unwrap();
    let first = table.list().unwrap();

    scanner.scan(&root, "/").unwrap();
    let second = table.list().unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_ids_are_stable_across_stores() {
    let (_temp, root) = media_tree();

    let (first_table, first) = scanner();
    let (second_table, second) = scanner();
    first.scan(&root, "/").unwrap();
    second.scan(&root, "/").unwrap();

    let first_ids: Vec<_> = first_table.list().unwrap().into_iter().map(|e| e.id).collect();
    let second_ids: Vec<_> = second_table.list().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(first_ids, second_ids);

    let expected = ContentId::from_path(&root.join("music/album"));
    assert_eq!(expected.as_str().len(), 64);
    assert!(first_ids.contains(&expected));
}

#[test]
fn test_rescan_keeps_removed_directories() {
    let (_temp, root) = media_tree();
    let (table, scanner) = scanner();

    scanner.scan(&root, "/").unwrap();
    let album = root.join("music/album");
    fs::remove_dir_all(&album).unwrap();

    let report = scanner.scan(&root, "/").unwrap();
    assert_eq!(report.albums, 1);

    // Stale entry stays until it is deleted explicitly
    let stale = entry_for(&table, &album);
    assert_eq!(stale.files.len(), 2);
    assert_eq!(table.list().unwrap().len(), 4);
}

#[test]
fn test_rescan_picks_up_new_files() {
    let (_temp, root) = media_tree();
    let (table, scanner) = scanner();

    scanner.scan(&root, "/").unwrap();
    touch(&root.join("music/album/0.ogg"));
    scanner.scan(&root, "/").unwrap();

    let album = entry_for(&table, &root.join("music/album"));
    let names: Vec<_> = album.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["0.ogg", "a.mp3", "b.mp3"]);
}

#[test]
fn test_missing_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let (_, scanner) = scanner();

    assert!(scanner.scan(&temp.path().join("nope"), "/").is_err());
}

/// Nest `depth` directories under `base` whose full path ends up longer than
/// the OS allows, so reading the deepest ones fails even for root. Each level
/// is created short and renamed bottom-up, keeping every call within limits.
fn overlong_chain(base: &Path, depth: usize) {
    let mut dirs = Vec::with_capacity(depth);
    let mut path = base.to_path_buf();
    for _ in 0..depth {
        path.push("d");
        dirs.push(path.clone());
    }
    fs::create_dir_all(&path).unwrap();

    let long_name = "d".repeat(200);
    for dir in dirs.iter().rev() {
        fs::rename(dir, dir.with_file_name(&long_name)).unwrap();
    }
}

#[test]
fn test_unreadable_subtree_is_skipped_once() {
    let (_temp, root) = media_tree();
    overlong_chain(&root.join("deep"), 30);
    let (table, scanner) = scanner();

    let report = scanner.scan(&root, "/").unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.albums, 2);
    assert_eq!(report.books, 2);
    assert_eq!(table.list().unwrap().len(), 4);
    assert!(entry_for(&table, &root.join("music/album")).files.len() == 2);
}

#[test]
fn test_rescan_keeps_chapters() {
    let (_temp, root) = media_tree();
    let (table, scanner) = scanner();
    scanner.scan(&root, "/").unwrap();

    let mut album = entry_for(&table, &root.join("music/album"));
    album.files[0].chapters = Some(vec![Chapter {
        title: "Side A".to_string(),
        start_time: 0,
    }]);
    album.files[1].chapters = Some(Vec::new());
    table.put(&album).unwrap();

    touch(&root.join("music/album/c.mp3"));
    scanner.scan(&root, "/").unwrap();

    let rescanned = entry_for(&table, &root.join("music/album"));
    assert_eq!(rescanned.files.len(), 3);
    assert_eq!(rescanned.files[0].chapters, album.files[0].chapters);
    assert_eq!(rescanned.files[1].chapters, Some(Vec::new()));
    assert_eq!(rescanned.files[2].chapters, None);
}
