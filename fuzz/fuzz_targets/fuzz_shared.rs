use isomesh::{HasPosition, Mesh, Point2};

#[derive(Clone, Copy, arbitrary::Arbitrary)]
pub struct FuzzPoint {
    pub x: f64,
    pub y: f64,
}

impl HasPosition for FuzzPoint {
    type Scalar = f64;
    fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

impl core::fmt::Debug for FuzzPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("Point2::new({:?}, {:?})", self.x, self.y))
    }
}

/// Returns `false` for inputs with coordinates that are non finite or too far apart.
pub fn is_reasonable(data: &[FuzzPoint]) -> bool {
    data.iter()
        .all(|p| p.x.is_finite() && p.y.is_finite() && p.x.abs() <= 20.0 && p.y.abs() <= 20.0)
}

pub fn sanity_check(mesh: &Mesh) {
    let mut usage = std::collections::HashMap::new();
    let mut referenced = vec![false; mesh.point_count()];
    for triangle in mesh.triangles() {
        for vertex in triangle.vertices() {
            assert!(vertex < mesh.point_count());
            referenced[vertex] = true;
        }
        assert!(mesh.triangle_area(triangle) > 0.0);
        for edge in triangle.edges() {
            *usage.entry(edge).or_insert(0) += 1;
        }
    }
    assert!(usage.values().all(|count| *count <= 2));
    assert!(referenced.iter().all(|referenced| *referenced));
}
