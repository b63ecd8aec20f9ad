#![no_main]
mod fuzz_shared;
use fuzz_shared::{is_reasonable, sanity_check, FuzzPoint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Vec<FuzzPoint>| {
    if !is_reasonable(&data) {
        return;
    }
    // Degenerate input must be reported, not panic
    if let Ok(mesh) = isomesh::triangulate(&data) {
        assert_eq!(mesh.point_count(), data.len());
        sanity_check(&mesh);
    }
});
