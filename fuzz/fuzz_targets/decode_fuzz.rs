//! Decode/patch fuzz target: feed arbitrary bytes as a FIT file.
//! Decoding and patching must not panic; they return Ok or a FitError.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let _ = fitpatch::decode_file(data);
    let mut buf = data.to_vec();
    if fitpatch::patch_buffer(&mut buf, &fitpatch::PatchTarget::default()).is_err() {
        assert_eq!(buf, data, "failed patch must leave the buffer unchanged");
    }
    assert_eq!(buf.len(), data.len());
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
