//! File-level patching: output is written only after a successful patch.

use fitpatch::{patch_file, BaseType, FieldDefinition, FitError, FitFileBuilder, PatchTarget};
use std::fs;

fn scenario(sub_sport: u8) -> Vec<u8> {
    let mut b = FitFileBuilder::with_header_size(12);
    b.define_fields(0, 12, &[FieldDefinition::new(1, 1, BaseType::UInt8)]).data(0, &[sub_sport]);
    b.finish()
}

#[test]
fn test_patch_file_writes_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("indoor.fit");
    let output = dir.path().join("virtual.fit");
    fs::write(&input, scenario(6)).expect("write input");

    let report = patch_file(&input, &output, &PatchTarget::default()).expect("patch");
    assert_eq!(report.patched.len(), 1);
    assert_eq!(fs::read(&output).expect("read output"), scenario(58));
    // Input is never modified.
    assert_eq!(fs::read(&input).expect("read input"), scenario(6));
}

#[test]
fn test_no_match_creates_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.fit");
    let output = dir.path().join("out.fit");
    fs::write(&input, scenario(5)).expect("write input");

    let err = patch_file(&input, &output, &PatchTarget::default()).unwrap_err();
    assert!(matches!(err, FitError::NoMatchFound { .. }));
    assert!(!output.exists());
}

#[test]
fn test_existing_output_untouched_on_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.fit");
    let output = dir.path().join("out.fit");
    fs::write(&input, scenario(5)).expect("write input");
    fs::write(&output, b"previous contents").expect("write output");

    assert!(patch_file(&input, &output, &PatchTarget::default()).is_err());
    assert_eq!(fs::read(&output).expect("read output"), b"previous contents");

    fs::write(&input, &scenario(6)[..10]).expect("write truncated input");
    assert!(matches!(
        patch_file(&input, &output, &PatchTarget::default()),
        Err(FitError::MalformedHeader(_))
    ));
    assert_eq!(fs::read(&output).expect("read output"), b"previous contents");
}

#[test]
fn test_existing_output_is_replaced_whole() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.fit");
    let output = dir.path().join("out.fit");
    fs::write(&input, scenario(6)).expect("write input");
    fs::write(&output, vec![0x55u8; 4096]).expect("write output");

    patch_file(&input, &output, &PatchTarget::default()).expect("patch");
    assert_eq!(fs::read(&output).expect("read output"), scenario(58));
}

#[test]
fn test_failed_write_leaves_no_stray_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.fit");
    // A directory cannot be replaced by the patched file.
    let output = dir.path().join("out.fit");
    fs::write(&input, scenario(6)).expect("write input");
    fs::create_dir(&output).expect("create dir");

    let err = patch_file(&input, &output, &PatchTarget::default()).unwrap_err();
    assert!(matches!(err, FitError::Io(_)));
    assert!(output.is_dir());
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["in.fit", "out.fit"]);
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = patch_file(&dir.path().join("missing.fit"), &dir.path().join("out.fit"), &PatchTarget::default())
        .unwrap_err();
    assert!(matches!(err, FitError::Io(_)));
}
