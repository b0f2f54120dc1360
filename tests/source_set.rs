// tests/source_set.rs

use std::path::{Path, PathBuf};

use sitepipe::fs::mock::MockFileSystem;
use sitepipe::pipeline::source::{common_base, glob_base};
use sitepipe::pipeline::SourceSet;

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_glob_base_stops_at_first_wildcard() {
    assert_eq!(glob_base("styles/*.scss"), PathBuf::from("styles"));
    assert_eq!(glob_base("images/**/*"), PathBuf::from("images"));
    assert_eq!(glob_base("scripts/libs.js"), PathBuf::from("scripts"));
    assert_eq!(glob_base("**/*.js"), PathBuf::new());
    assert_eq!(glob_base("a/b/{c,d}/*.txt"), PathBuf::from("a/b"));
}

#[test]
fn test_common_base_of_sibling_patterns() {
    let base = common_base([PathBuf::from("scripts/app"), PathBuf::from("scripts/lib")]);
    assert_eq!(base, PathBuf::from("scripts"));

    let none = common_base([PathBuf::from("a"), PathBuf::from("b")]);
    assert_eq!(none, PathBuf::new());
}

#[test]
fn test_single_star_does_not_cross_directories() {
    let set = SourceSet::new(&patterns(&["scripts/*.js"]), &[]).unwrap();
    assert!(set.matches("scripts/app.js"));
    assert!(!set.matches("scripts/vendor/jquery.js"));
}

#[test]
fn test_exclude_wins_over_include() {
    let set = SourceSet::new(
        &patterns(&["styles/*.scss"]),
        &patterns(&["styles/_*.scss"]),
    )
    .unwrap();

    assert!(set.matches("styles/main.scss"));
    assert!(!set.matches("styles/_vars.scss"));
}

#[test]
fn test_collect_is_sorted_and_relative_to_source_root() {
    let fs = MockFileSystem::new();
    let root = Path::new("/site/dev");
    fs.add_file(root.join("images/b.png"), "b");
    fs.add_file(root.join("images/a.png"), "a");
    fs.add_file(root.join("images/nested/c.png"), "c");
    fs.add_file(root.join("other/d.png"), "d");

    let set = SourceSet::new(&patterns(&["images/**/*"]), &[]).unwrap();
    let files = set.collect(&fs, root).unwrap();

    assert_eq!(
        files,
        vec![
            PathBuf::from("images/a.png"),
            PathBuf::from("images/b.png"),
            PathBuf::from("images/nested/c.png"),
        ]
    );
    assert_eq!(set.base(), Path::new("images"));
}

#[test]
fn test_collect_with_missing_base_is_empty() {
    let fs = MockFileSystem::new();
    fs.add_dir("/site/dev");

    let set = SourceSet::new(&patterns(&["video/**/*"]), &[]).unwrap();
    assert!(set.collect(&fs, Path::new("/site/dev")).unwrap().is_empty());
}

#[test]
fn test_vendor_scripts_never_match_per_file_task() {
    let fs = MockFileSystem::new();
    let root = Path::new("/dev");
    fs.add_file(root.join("scripts/app.js"), "");
    fs.add_file(root.join("scripts/libs.js"), "");
    fs.add_file(root.join("scripts/vendor/jquery.js"), "");

    let scripts = SourceSet::new(&patterns(&["scripts/*.js"]), &patterns(&["scripts/libs.js"])).unwrap();
    assert_eq!(
        scripts.collect(&fs, root).unwrap(),
        vec![PathBuf::from("scripts/app.js")]
    );
}
