//! Shape features of the region: volume, surface and diameters from a triangle mesh of the region
//! surface, and axis lengths from the principal components of the voxel positions.
//!
//! The mesh is built by marching cubes over the voxel centres, with vertices on the midpoints of the cube
//! edges that cross the region border. Faces with diagonally opposite region corners keep those corners
//! apart.

use ndarray::{Array2, Array3};

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

use super::linalg::symmetric_eigenvalues;
use super::{insert_sorted, FeatureVector, Roi};

/// Corners of each cube face, counter-clockwise about the outward normal. Corner `k` sits at offset
/// `(k & 1, (k >> 1) & 1, (k >> 2) & 1)` from the cube origin.
const FACES: [[usize; 4]; 6] = [
    [0, 4, 6, 2],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 2, 3, 1],
    [4, 5, 7, 6],
];

fn corner_offset(k: usize) -> [i64; 3] {
    [(k & 1) as i64, ((k >> 1) & 1) as i64, ((k >> 2) & 1) as i64]
}

fn edge_key(a: usize, b: usize) -> usize {
    a.min(b) * 8 + a.max(b)
}

/// Closed outlines of the surface inside one cube, as lists of crossed edges.
fn cube_polygons(corners: &[bool; 8]) -> Vec<Vec<usize>> {
    let mut next: [Option<usize>; 64] = [None; 64];
    for face in FACES.iter() {
        let inside = [corners[face[0]], corners[face[1]], corners[face[2]], corners[face[3]]];
        for a in 0..4 {
            let b = (a + 1) % 4;
            if inside[a] || !inside[b] {
                continue;
            }
            // Walk the run of region corners starting at `b` to the edge where it ends.
            let mut j = b;
            while inside[(j + 1) % 4] {
                j = (j + 1) % 4;
            }
            next[edge_key(face[a], face[b])] = Some(edge_key(face[j], face[(j + 1) % 4]));
        }
    }

    let mut used = [false; 64];
    let mut polygons = Vec::new();
    for start in 0..64 {
        if next[start].is_none() || used[start] {
            continue;
        }
        let mut polygon = Vec::new();
        let mut key = start;
        while !used[key] {
            used[key] = true;
            polygon.push(key);
            match next[key] {
                Some(k) => key = k,
                None => break,
            }
        }
        if polygon.len() >= 3 {
            polygons.push(polygon);
        }
    }
    polygons
}

/// A closed triangle mesh, with vertices in half-voxel units: twice the (fractional) voxel index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub triangles: Vec<[[i64; 3]; 3]>,
}

impl SurfaceMesh {
    /// Mesh the surface of the `true` voxels. Voxels outside the array count as outside the region.
    pub fn from_mask(inside: &Array3<bool>) -> SurfaceMesh {
        let (nx, ny, nz) = inside.dim();
        let is_in = |p: [i64; 3]| {
            p[0] >= 0
                && p[1] >= 0
                && p[2] >= 0
                && p[0] < nx as i64
                && p[1] < ny as i64
                && p[2] < nz as i64
                && inside[[p[0] as usize, p[1] as usize, p[2] as usize]]
        };

        let mut triangles = Vec::new();
        for x in -1..nx as i64 {
            for y in -1..ny as i64 {
                for z in -1..nz as i64 {
                    let mut corners = [false; 8];
                    for (k, c) in corners.iter_mut().enumerate() {
                        let o = corner_offset(k);
                        *c = is_in([x + o[0], y + o[1], z + o[2]]);
                    }
                    if corners.iter().all(|&c| c) || !corners.iter().any(|&c| c) {
                        continue;
                    }

                    for polygon in cube_polygons(&corners) {
                        let vertices: Vec<[i64; 3]> = polygon
                            .iter()
                            .map(|&key| {
                                let (a, b) = (corner_offset(key / 8), corner_offset(key % 8));
                                [2 * x + a[0] + b[0], 2 * y + a[1] + b[1], 2 * z + a[2] + b[2]]
                            })
                            .collect();
                        for i in 1..vertices.len() - 1 {
                            triangles.push([vertices[0], vertices[i], vertices[i + 1]]);
                        }
                    }
                }
            }
        }
        SurfaceMesh { triangles }
    }

    fn physical(v: [i64; 3], spacing: [f64; 3]) -> [f64; 3] {
        [
            v[0] as f64 * 0.5 * spacing[0],
            v[1] as f64 * 0.5 * spacing[1],
            v[2] as f64 * 0.5 * spacing[2],
        ]
    }

    /// Enclosed volume and surface area in mm^3 and mm^2.
    pub fn volume_and_area(&self, spacing: [f64; 3]) -> (f64, f64) {
        let mut signed_volume = 0.0;
        let mut area = 0.0;
        for t in self.triangles.iter() {
            let [a, b, c] = [
                SurfaceMesh::physical(t[0], spacing),
                SurfaceMesh::physical(t[1], spacing),
                SurfaceMesh::physical(t[2], spacing),
            ];
            signed_volume += dot(a, cross(b, c)) / 6.0;
            area += norm(cross(sub(b, a), sub(c, a))) / 2.0;
        }
        (signed_volume.abs(), area)
    }

    /// The distinct mesh vertices.
    pub fn vertices(&self) -> Vec<[i64; 3]> {
        let unique: BTreeSet<[i64; 3]> = self.triangles.iter().flat_map(|t| t.iter().cloned()).collect();
        unique.into_iter().collect()
    }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn max_distance(points: &[[f64; 3]]) -> f64 {
    let mut best: f64 = 0.0;
    for (i, p) in points.iter().enumerate() {
        for q in points[i + 1..].iter() {
            let d = sub(*p, *q);
            best = best.max(dot(d, d));
        }
    }
    best.sqrt()
}

/// Largest vertex distance among vertices sharing their coordinate along `axis`.
fn max_planar_distance(vertices: &[[i64; 3]], axis: usize, spacing: [f64; 3]) -> f64 {
    let mut planes: BTreeMap<i64, Vec<[f64; 3]>> = BTreeMap::new();
    for v in vertices.iter() {
        planes.entry(v[axis]).or_insert_with(Vec::new).push(SurfaceMesh::physical(*v, spacing));
    }
    planes.values().map(|p| max_distance(p)).fold(0.0, f64::max)
}

/// Eigenvalues of the covariance of the physical voxel positions, largest first.
pub fn principal_moments(roi: &Roi, spacing: [f64; 3]) -> [f64; 3] {
    let n = roi.len() as f64;
    let points: Vec<[f64; 3]> = roi
        .indices
        .iter()
        .map(|idx| [idx[0] as f64 * spacing[0], idx[1] as f64 * spacing[1], idx[2] as f64 * spacing[2]])
        .collect();
    let mut mean = [0.0; 3];
    for p in points.iter() {
        for axis in 0..3 {
            mean[axis] += p[axis] / n;
        }
    }
    let mut covariance = Array2::zeros((3, 3));
    for p in points.iter() {
        let d = sub(*p, mean);
        for r in 0..3 {
            for c in 0..3 {
                covariance[[r, c]] += d[r] * d[c] / n;
            }
        }
    }
    let ev = symmetric_eigenvalues(&covariance);
    [ev[0].max(0.0), ev[1].max(0.0), ev[2].max(0.0)]
}

/// Add the `original_shape_*` features. `spacing` is the voxel size in mm.
pub fn compute(roi: &Roi, spacing: [f64; 3], features: &mut FeatureVector) {
    let size = roi.bbox_size();
    let mut inside = Array3::from_elem((size[0], size[1], size[2]), false);
    for idx in roi.indices.iter() {
        inside[[idx[0] - roi.bbox_min[0], idx[1] - roi.bbox_min[1], idx[2] - roi.bbox_min[2]]] = true;
    }

    let mesh = SurfaceMesh::from_mask(&inside);
    let (volume, area) = mesh.volume_and_area(spacing);
    let vertices = mesh.vertices();
    let physical: Vec<[f64; 3]> = vertices.iter().map(|v| SurfaceMesh::physical(*v, spacing)).collect();

    let [major, minor, least] = principal_moments(roi, spacing);
    let axis_ratio = |lambda: f64| if major == 0.0 { f64::NAN } else { (lambda / major).sqrt() };

    let values = vec![
        ("Elongation", axis_ratio(minor)),
        ("Flatness", axis_ratio(least)),
        ("LeastAxisLength", 4.0 * least.sqrt()),
        ("MajorAxisLength", 4.0 * major.sqrt()),
        ("Maximum2DDiameterColumn", max_planar_distance(&vertices, 1, spacing)),
        ("Maximum2DDiameterRow", max_planar_distance(&vertices, 0, spacing)),
        ("Maximum2DDiameterSlice", max_planar_distance(&vertices, 2, spacing)),
        ("Maximum3DDiameter", max_distance(&physical)),
        ("MeshVolume", volume),
        ("MinorAxisLength", 4.0 * minor.sqrt()),
        ("Sphericity", (36.0 * PI * volume * volume).cbrt() / area),
        ("SurfaceArea", area),
        ("SurfaceVolumeRatio", area / volume),
        ("VoxelVolume", roi.len() as f64 * spacing.iter().product::<f64>()),
    ];
    insert_sorted(features, "shape", values);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::volume::NiftiVolume;
    use approx::assert_abs_diff_eq;

    fn roi_of(mask: Array3<f64>) -> Roi {
        let image = NiftiVolume::from_array(Array3::zeros(mask.dim()), [1.0; 3]);
        let mask = NiftiVolume::from_array(mask, [1.0; 3]);
        Roi::from_volumes(&image, &mask, 1).unwrap()
    }

    fn shape_of(mask: Array3<f64>, spacing: [f64; 3]) -> FeatureVector {
        let mut fv = FeatureVector::new();
        compute(&roi_of(mask), spacing, &mut fv);
        fv
    }

    #[test]
    fn a_single_corner_is_cut_off_by_a_triangle() {
        let mut corners = [false; 8];
        corners[0] = true;
        let polygons = cube_polygons(&corners);
        assert_eq!(1, polygons.len());
        assert_eq!(3, polygons[0].len());
    }

    #[test]
    fn diagonal_corners_on_a_face_stay_apart() {
        let mut corners = [false; 8];
        corners[0] = true;
        corners[3] = true;
        let polygons = cube_polygons(&corners);
        assert_eq!(2, polygons.len());
    }

    #[test]
    fn a_single_voxel_is_an_octahedron() {
        let fv = shape_of(Array3::from_elem((1, 1, 1), 1.0), [1.0; 3]);
        assert_abs_diff_eq!(1.0 / 6.0, fv.number("original_shape_MeshVolume").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(3f64.sqrt(), fv.number("original_shape_SurfaceArea").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            PI.cbrt() / 3f64.sqrt(),
            fv.number("original_shape_Sphericity").unwrap(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(1.0, fv.number("original_shape_Maximum3DDiameter").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(1.0, fv.number("original_shape_Maximum2DDiameterSlice").unwrap(), epsilon = 1e-12);
        assert_eq!(Some(1.0), fv.number("original_shape_VoxelVolume"));
        assert_eq!(Some(0.0), fv.number("original_shape_MajorAxisLength"));
        assert!(fv.number("original_shape_Elongation").unwrap().is_nan());
        assert_eq!(14, fv.len());
        assert_eq!("original_shape_Elongation", fv.names().next().unwrap());
    }

    #[test]
    fn a_2x2x2_block_has_known_mesh_measures() {
        let fv = shape_of(Array3::from_elem((2, 2, 2), 1.0), [1.0; 3]);
        // 1 inner cube, 6 half cubes, 12 wedges of 1/8, 8 corners of 1/48.
        assert_abs_diff_eq!(17.0 / 3.0, fv.number("original_shape_MeshVolume").unwrap(), epsilon = 1e-12);
        // 6 unit squares, 12 slanted rectangles, 8 triangles.
        let area = 6.0 + 6.0 * 2f64.sqrt() + 3f64.sqrt();
        assert_abs_diff_eq!(area, fv.number("original_shape_SurfaceArea").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(6f64.sqrt(), fv.number("original_shape_Maximum3DDiameter").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(5f64.sqrt(), fv.number("original_shape_Maximum2DDiameterSlice").unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(2.0, fv.number("original_shape_MajorAxisLength").unwrap(), epsilon = 1e-9);
        assert_abs_diff_eq!(2.0, fv.number("original_shape_LeastAxisLength").unwrap(), epsilon = 1e-9);
        assert_abs_diff_eq!(1.0, fv.number("original_shape_Elongation").unwrap(), epsilon = 1e-9);
        assert_abs_diff_eq!(1.0, fv.number("original_shape_Flatness").unwrap(), epsilon = 1e-9);
    }

    #[test]
    fn spacing_scales_volumes_and_lengths() {
        let fv = shape_of(Array3::from_elem((1, 1, 1), 1.0), [2.0, 1.0, 1.0]);
        assert_abs_diff_eq!(2.0 / 6.0, fv.number("original_shape_MeshVolume").unwrap(), epsilon = 1e-12);
        assert_eq!(Some(2.0), fv.number("original_shape_VoxelVolume"));
        assert_abs_diff_eq!(2.0, fv.number("original_shape_Maximum3DDiameter").unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn an_elongated_region_has_a_major_axis() {
        let fv = shape_of(Array3::from_elem((5, 1, 1), 1.0), [1.0; 3]);
        // Variance of 0..5 is 2.
        assert_abs_diff_eq!(4.0 * 2f64.sqrt(), fv.number("original_shape_MajorAxisLength").unwrap(), epsilon = 1e-9);
        assert_abs_diff_eq!(0.0, fv.number("original_shape_Elongation").unwrap(), epsilon = 1e-6);
    }

    #[test]
    fn the_mesh_of_a_region_with_a_hole_is_closed() {
        let mut mask = Array3::from_elem((3, 3, 3), 1.0);
        mask[[1, 1, 1]] = 0.0;
        let roi = roi_of(mask);
        let mut inside = Array3::from_elem((3, 3, 3), true);
        inside[[1, 1, 1]] = false;
        let mesh = SurfaceMesh::from_mask(&inside);

        // Every edge of a closed, consistently oriented mesh is used once in each direction.
        let mut edges: BTreeMap<([i64; 3], [i64; 3]), i64> = BTreeMap::new();
        for t in mesh.triangles.iter() {
            for k in 0..3 {
                let (a, b) = (t[k], t[(k + 1) % 3]);
                if a < b {
                    *edges.entry((a, b)).or_insert(0) += 1;
                } else {
                    *edges.entry((b, a)).or_insert(0) -= 1;
                }
            }
        }
        assert!(edges.values().all(|&balance| balance == 0));

        // The hole is an octahedron removed from the solid.
        let (volume, _) = mesh.volume_and_area([1.0; 3]);
        let solid = SurfaceMesh::from_mask(&Array3::from_elem((3, 3, 3), true)).volume_and_area([1.0; 3]).0;
        assert_abs_diff_eq!(solid - 1.0 / 6.0, volume, epsilon = 1e-9);
        assert_eq!(26, roi.len());
    }
}
