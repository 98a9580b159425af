use std::path::{Path, PathBuf};

use exe_assembler::{view::ImageView, ConfError, ImageError, TableError};
use exe_driver::{BuildOptions, Driver};
use exe_table::EntityOrder;

/// A throwaway source directory under the system temp dir
struct SourceDir {
    root: PathBuf,
}

impl SourceDir {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("exepack-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("src/DATA")).unwrap();
        SourceDir { root }
    }

    fn standard(name: &str, conf: &str, code: &[u8]) -> Self {
        let dir = Self::new(name);
        dir.file("CONF", conf.as_bytes());
        dir.file("CODE", code);
        dir
    }

    fn src(&self) -> PathBuf {
        self.root.join("src")
    }

    fn out(&self) -> PathBuf {
        self.root.join("out")
    }

    fn file(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.src().join(name), contents).unwrap();
    }

    fn entity(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.src().join("DATA").join(name), contents).unwrap();
    }

    fn options(&self) -> BuildOptions {
        BuildOptions {
            source: self.src(),
            output: self.out(),
            order: EntityOrder::Sorted,
        }
    }
}

impl Drop for SourceDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

#[test]
fn reference_scenario() {
    let dir = SourceDir::standard("reference", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    dir.entity("foo", b"AB");

    let path = Driver::build(&dir.options()).unwrap();
    assert_eq!(path, dir.out());

    let bytes = read(&path);
    assert_eq!(bytes.len(), 0x100 + 0x1C2 + 0x3E + 4);
    assert_eq!(&bytes[0x00..0x04], b".EXE");
    assert_eq!(&bytes[0x10..0x14], &[0x00, 0x00, 0x10, 0x00]);
    assert_eq!(&bytes[0x14..0x18], &[0x00, 0x00, 0x00, 0x04]);
    assert_eq!(&bytes[0x20..0x24], &[0x00, 0x00, 0x20, 0x00]);
    assert_eq!(&bytes[0x24..0x28], &[0x00, 0x00, 0x00, 0x02]);
    assert_eq!(
        &bytes[0x100..0x112],
        &[
            0x66, 0x6F, 0x6F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // "foo"
            0x00, 0x00, 0x20, 0x00, // address
            0x00, 0x00, 0x00, 0x02, // size
        ]
    );
    assert!(bytes[0x112..0x300].iter().all(|b| *b == 0));
    assert_eq!(&bytes[0x300..], b"DEAD");

    // No temporary file is left behind
    assert!(!dir.root.join("out.temp").exists());
}

#[test]
fn header_round_trip() {
    let dir = SourceDir::standard("round-trip", "DATA_AD=8000\nCODE_AD=400\n", &[0x90; 0x33]);
    dir.entity("b", &[1; 7]);
    dir.entity("a", &[2; 3]);
    dir.entity("c", &[]);

    let bytes = read(&Driver::build(&dir.options()).unwrap());
    let view = ImageView::parse(&bytes).unwrap();

    assert_eq!(view.header.code_ad, 0x400);
    assert_eq!(view.header.code_sz, 0x33);
    assert_eq!(view.header.data_ad, 0x8000);
    assert_eq!(view.header.data_sz, 10);
    assert_eq!(view.entries_total_size(), 10);

    // Sorted order: a, b, c
    let layout = view
        .entries
        .iter()
        .map(|e| (e.name(), e.address(), e.size()))
        .collect::<Vec<_>>();
    assert_eq!(
        layout,
        vec![("a", 0x8000, 3), ("b", 0x8003, 7), ("c", 0x800A, 0)]
    );
}

#[test]
fn listing_order_keeps_address_invariant() {
    let dir = SourceDir::standard("listing", "CODE_AD=0\nDATA_AD=100\n", b"");
    for (name, len) in [("one", 1), ("two", 2), ("three", 3), ("four", 4)] {
        dir.entity(name, &vec![0xEE; len]);
    }

    let mut options = dir.options();
    options.order = EntityOrder::Listing;
    let bytes = read(&Driver::build(&options).unwrap());
    let view = ImageView::parse(&bytes).unwrap();

    let mut expected = 0x100;
    for entry in &view.entries {
        assert_eq!(entry.address(), expected);
        expected += entry.size();
    }
    assert_eq!(view.entries.len(), 4);
    assert_eq!(view.header.data_sz, 10);
    assert!(view.code.is_empty());
}

#[test]
fn twenty_five_entities_fit() {
    let dir = SourceDir::standard("full-table", "CODE_AD=1\nDATA_AD=2\n", b"C");
    for i in 0..25 {
        dir.entity(&format!("e{:02}", i), &[i as u8]);
    }

    let bytes = read(&Driver::build(&dir.options()).unwrap());
    let view = ImageView::parse(&bytes).unwrap();
    assert_eq!(view.entries.len(), 25);
    assert_eq!(view.entry("e24").map(|e| e.address()), Some(2 + 24));
}

#[test]
fn too_many_entities() {
    let dir = SourceDir::standard("capacity", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    for i in 0..26 {
        dir.entity(&format!("e{:02}", i), b"X");
    }

    let err = Driver::build(&dir.options()).unwrap_err();
    assert!(matches!(
        err,
        ImageError::Table(TableError::CapacityExceeded { .. })
    ));
    assert!(!dir.out().exists());
}

#[test]
fn name_too_long() {
    let dir = SourceDir::standard("long-name", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    dir.entity("abcdefghijk", b"AB");

    let err = Driver::build(&dir.options()).unwrap_err();
    match err {
        ImageError::Table(TableError::NameTooLong { name }) => assert_eq!(name, "abcdefghijk"),
        e => panic!("unexpected error {e:?}"),
    }
    assert!(!dir.out().exists());
}

#[test]
fn invalid_layout() {
    let dir = SourceDir::standard("layout", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    dir.file("README", b"extra");

    match Driver::build(&dir.options()).unwrap_err() {
        ImageError::InvalidLayout { found, .. } => {
            assert_eq!(found, vec!["CODE", "CONF", "DATA", "README"])
        }
        e => panic!("unexpected error {e:?}"),
    }

    let dir = SourceDir::new("layout-missing");
    dir.file("CONF", b"CODE_AD=1\nDATA_AD=2\n");
    assert!(matches!(
        Driver::build(&dir.options()),
        Err(ImageError::InvalidLayout { .. })
    ));
}

#[test]
fn incomplete_config() {
    let dir = SourceDir::standard("incomplete", "CODE_AD=1000\n", b"DEAD");
    match Driver::build(&dir.options()).unwrap_err() {
        ImageError::Config(ConfError::Incomplete { missing }) => {
            assert_eq!(missing, vec!["DATA_AD"])
        }
        e => panic!("unexpected error {e:?}"),
    }
}

#[test]
fn malformed_config() {
    let dir = SourceDir::standard("malformed", "CODE_AD=1000\nDATA_AD=zz\n", b"DEAD");
    assert!(matches!(
        Driver::build(&dir.options()),
        Err(ImageError::Config(ConfError::InvalidValue { line: 2, .. }))
    ));
}

#[test]
fn failed_build_keeps_previous_output() {
    let dir = SourceDir::standard("keep-output", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    std::fs::write(dir.out(), b"previous").unwrap();
    dir.entity("abcdefghijk", b"AB");

    assert!(Driver::build(&dir.options()).is_err());
    assert_eq!(read(&dir.out()), b"previous");
}

#[test]
fn deterministic_output() {
    let dir = SourceDir::standard("deterministic", "CODE_AD=10\nDATA_AD=20\n", b"CODE");
    for name in ["zeta", "alpha", "mid"] {
        dir.entity(name, name.as_bytes());
    }

    let first = read(&Driver::build(&dir.options()).unwrap());
    let second = read(&Driver::build(&dir.options()).unwrap());
    assert_eq!(first, second);
}

#[test]
fn directory_inside_data() {
    let dir = SourceDir::standard("nested", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    dir.entity("foo", b"AB");
    std::fs::create_dir(dir.src().join("DATA/inner")).unwrap();

    match Driver::build(&dir.options()).unwrap_err() {
        ImageError::Table(TableError::Read { path, .. }) => {
            assert_eq!(path, dir.src().join("DATA/inner"))
        }
        e => panic!("unexpected error {e:?}"),
    }
    assert!(!dir.out().exists());
}

#[test]
fn data_is_a_file() {
    let dir = SourceDir::standard("data-file", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    std::fs::remove_dir(dir.src().join("DATA")).unwrap();
    dir.file("DATA", b"not a directory");

    match Driver::build(&dir.options()).unwrap_err() {
        ImageError::Table(TableError::Read { path, .. }) => assert_eq!(path, dir.src().join("DATA")),
        e => panic!("unexpected error {e:?}"),
    }
    assert!(!dir.out().exists());
}

#[test]
fn non_ascii_entity_name() {
    let dir = SourceDir::standard("non-ascii", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    dir.entity("caf\u{e9}", b"AB");

    match Driver::build(&dir.options()).unwrap_err() {
        ImageError::Table(TableError::NonAsciiName { name }) => assert_eq!(name, "caf\u{e9}"),
        e => panic!("unexpected error {e:?}"),
    }
    assert!(!dir.out().exists());
}

#[test]
fn failed_rename_removes_temp_file() {
    let dir = SourceDir::standard("rename", "CODE_AD=1000\nDATA_AD=2000\n", b"DEAD");
    dir.entity("foo", b"AB");
    // A non empty directory cannot be replaced by the image
    std::fs::create_dir_all(dir.out().join("taken")).unwrap();

    match Driver::build(&dir.options()).unwrap_err() {
        ImageError::Write { path, .. } => assert_eq!(path, dir.out()),
        e => panic!("unexpected error {e:?}"),
    }
    assert!(!dir.root.join("out.temp").exists());
    assert!(dir.out().join("taken").is_dir());
}
