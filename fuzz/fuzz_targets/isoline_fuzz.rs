#![no_main]
mod fuzz_shared;
use fuzz_shared::{is_reasonable, FuzzPoint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<FuzzPoint>, Vec<f64>, u8)| {
    let (data, values, level_count) = input;
    if !is_reasonable(&data) {
        return;
    }
    let Ok(mesh) = isomesh::triangulate(&data) else {
        return;
    };
    let level_count = usize::from(level_count);
    match isomesh::build_isolines(&mesh, &values, level_count) {
        Ok(segments) => {
            for segment in &segments {
                assert!(segment.triangle < mesh.triangle_count());
                assert!(segment.from != segment.to);
            }
            let isolines = isomesh::join_segments(&segments);
            let joined: usize = isolines
                .iter()
                .map(|line| line.points.len() - usize::from(!line.closed))
                .sum();
            assert_eq!(joined, segments.len());
        }
        Err(_) => assert!(
            values.len() != mesh.point_count()
                || level_count == 0
                || values.iter().any(|v| !v.is_finite())
        ),
    }
});
