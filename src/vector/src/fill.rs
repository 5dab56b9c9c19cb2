//! Fill tessellation: closed polylines to triangle meshes.
//!
//! Simple paths triangulate each subpath directly. Complex paths run each
//! subpath through the self-intersection simplifier first and triangulate
//! every resulting simple loop. Triangulation output is requested
//! clockwise: image space has its origin in the upper-left, so this maps
//! to counter-clockwise in clip space.

use cgmath::Vector2;

use hal::{Backend, Result};

use crate::command::FillStyle;
use crate::geom::Box2;
use crate::material::{self, MaterialSet};
use crate::polygon::TriangulateWinding;
use crate::scratch::{PointFlags, ShapeVertex, VectorScratchData};

/// Tessellate the assembled path as a fill.
pub(crate) fn add_fill<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    shared_materials: &MaterialSet<B>,
    local_materials: &MaterialSet<B>,
    style: &FillStyle,
) -> Result<()> {
    if scratch.points.len() < 3 {
        return Ok(());
    }

    let (material_index, material_type, material_source) =
        material::find_material(shared_materials, local_materials, &style.material)?;

    let transform = scratch.path_transform;
    let info_index = scratch.add_shape_piece(
        &transform,
        style.opacity,
        false,
        material_type,
        material_source,
    )?;

    // The triangulator and simplifier move out of the arena while they
    // borrow its point pool.
    let mut polygon = std::mem::take(&mut scratch.polygon);
    let mut simplifier = std::mem::take(&mut scratch.simplifier);
    let simple = scratch.path_simple;

    let result = (|| -> Result<Box2> {
        let mut bounds = Box2::empty();
        let point_count = scratch.points.len();
        let mut first_point = 0;
        while first_point < point_count {
            // Find the subpath extent.
            let mut end_index = first_point;
            while end_index < point_count {
                bounds.add_point(scratch.points[end_index].point);
                if scratch.points[end_index].flags.contains(PointFlags::END) {
                    break;
                }
                end_index += 1;
            }
            let end_index = end_index.min(point_count - 1);
            let join_start = scratch.points[first_point]
                .flags
                .contains(PointFlags::JOIN_START);

            // A closed subpath repeats its start; drop the duplicate.
            let mut subpath_len = end_index - first_point + 1;
            if join_start && subpath_len > 1 {
                subpath_len -= 1;
            }

            // Degenerate subpaths are silently skipped.
            if subpath_len < 3 {
                first_point = end_index + 1;
                continue;
            }

            let subpath: Vec<Vector2<f32>> = scratch.points
                [first_point..first_point + subpath_len]
                .iter()
                .map(|info| info.point)
                .collect();

            if simple {
                emit_loop(scratch, &mut polygon, &subpath, material_index, info_index)?;
            } else {
                let loops = simplifier.simplify(&subpath);
                for simple_loop in loops {
                    emit_loop(scratch, &mut polygon, simple_loop, material_index, info_index)?;
                }
            }

            first_point = end_index + 1;
        }
        Ok(bounds)
    })();

    scratch.polygon = polygon;
    scratch.simplifier = simplifier;

    let bounds = result?;
    if bounds.is_valid() {
        scratch.info_mut(info_index).set_bounds(bounds);
    }
    Ok(())
}

fn emit_loop<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    polygon: &mut crate::polygon::SimplePolygon,
    points: &[Vector2<f32>],
    material_index: u32,
    info_index: u32,
) -> Result<()> {
    let triangles = polygon
        .triangulate(points, TriangulateWinding::Clockwise)?
        .to_vec();

    let vertex_base = scratch.shape_vertices.len() as u32;
    for point in points {
        scratch.add_shape_vertex(ShapeVertex {
            position: [point.x, point.y, 0.0, 0.0],
            shape_index: info_index as u16,
            material_index: material_index as u16,
        });
    }
    for index in triangles {
        let mut vertex = vertex_base + index;
        scratch.add_index(&mut vertex)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{FillRule, VectorCommand};
    use crate::mock::{mock_materials, MockBackend};
    use crate::path;
    use crate::scratch::ShaderVariant;
    use cgmath::{Matrix3, SquareMatrix};

    fn fill_style(material: &str) -> FillStyle {
        FillStyle {
            material: material.to_owned(),
            opacity: 1.0,
            fill_rule: FillRule::NonZero,
        }
    }

    fn run(
        commands: Vec<VectorCommand<MockBackend>>,
    ) -> Result<VectorScratchData<MockBackend>> {
        let mut scratch = VectorScratchData::new();
        let (shared, local) = mock_materials();
        path::process_commands(&mut scratch, &commands, &shared, &local, 1.0)?;
        Ok(scratch)
    }

    fn triangle_commands(material: &str) -> Vec<VectorCommand<MockBackend>> {
        vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(10.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(5.0, 10.0),
            },
            VectorCommand::ClosePath,
            VectorCommand::FillPath(fill_style(material)),
        ]
    }

    #[test]
    fn filled_triangle() {
        let scratch = run(triangle_commands("red")).unwrap();

        assert_eq!(scratch.shape_vertices.len(), 3);
        assert_eq!(scratch.indices.len(), 3);
        // The indices are 0, 1, 2 up to rotation and the winding is
        // clockwise in image space.
        let indices: Vec<u16> = scratch.indices.clone();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);

        assert_eq!(scratch.pieces.len(), 1);
        assert_eq!(scratch.pieces[0].variant, ShaderVariant::FillColor);
        assert_eq!(scratch.pieces[0].range.index_count, 3);

        let bounds = scratch.infos[0].bounds();
        assert_eq!(bounds.min, Vector2::new(0.0, 0.0));
        assert_eq!(bounds.max, Vector2::new(10.0, 10.0));

        // Fill vertices carry no dash distances.
        assert!(scratch
            .shape_vertices
            .iter()
            .all(|v| v.position[2] == 0.0 && v.position[3] == 0.0));
    }

    #[test]
    fn unknown_material_fails_with_not_found() {
        let result = run(triangle_commands("no-such-material"));
        assert!(matches!(result, Err(hal::Error::NotFound(_))));
    }

    #[test]
    fn local_material_resolves_after_shared() {
        let scratch = run(triangle_commands("local-blue")).unwrap();
        assert_eq!(
            scratch.pieces[0].material_source,
            crate::scratch::MaterialSource::Local
        );
    }

    #[test]
    fn multiple_subpaths_triangulate_independently() {
        let commands = vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(4.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(2.0, 4.0),
            },
            VectorCommand::ClosePath,
            VectorCommand::Move {
                position: Vector2::new(10.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(14.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(12.0, 4.0),
            },
            VectorCommand::ClosePath,
            VectorCommand::FillPath(fill_style("red")),
        ];
        let scratch = run(commands).unwrap();
        assert_eq!(scratch.shape_vertices.len(), 6);
        assert_eq!(scratch.indices.len(), 6);
        // Both subpaths share one piece and info record.
        assert_eq!(scratch.pieces.len(), 1);
        assert_eq!(scratch.infos.len(), 1);
        let bounds = scratch.infos[0].bounds();
        assert_eq!(bounds.max, Vector2::new(14.0, 4.0));
    }

    #[test]
    fn complex_path_splits_before_triangulating() {
        // A bowtie is unfillable as-is; complex mode splits it at the
        // crossing into two triangles.
        let commands = vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: false,
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(4.0, 4.0),
            },
            VectorCommand::Line {
                end: Vector2::new(4.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(0.0, 4.0),
            },
            VectorCommand::ClosePath,
            VectorCommand::FillPath(fill_style("red")),
        ];
        let scratch = run(commands).unwrap();
        // Two loops of three points each.
        assert_eq!(scratch.shape_vertices.len(), 6);
        assert_eq!(scratch.indices.len(), 6);
    }

    #[test]
    fn single_point_subpaths_are_skipped() {
        let commands = vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Move {
                position: Vector2::new(100.0, 100.0),
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(10.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(5.0, 10.0),
            },
            VectorCommand::ClosePath,
            VectorCommand::FillPath(fill_style("red")),
        ];
        let scratch = run(commands).unwrap();
        assert_eq!(scratch.shape_vertices.len(), 3);
        assert_eq!(scratch.indices.len(), 3);
    }
}
