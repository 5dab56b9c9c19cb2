//! Stroke tessellation: polylines to triangle tubes with joins and caps.
//!
//! Every vertex carries its distance along the subpath and the subpath's
//! total length in `position.zw`, which is what lets the fragment shader
//! evaluate dashing. Joins place two coincident vertices at the inner
//! miter point with split distances so dash coverage stays continuous
//! across corners.

use cgmath::{InnerSpace, MetricSpace, Vector2};

use hal::{Backend, Result};

use crate::command::{LineCap, LineJoin, StrokeStyle};
use crate::curve::pixel_theta;
use crate::geom::{perpendicular, Box2};
use crate::material::{self, MaterialSet};
use crate::scratch::{PointFlags, ShapeVertex, VectorScratchData};

use std::f32::consts::PI;

/// Treat the corner as straight when the directions agree this closely.
const STRAIGHT_COS_EPSILON: f32 = 1e-3;

/// Per-stroke emission state shared by the cap and join helpers.
struct StrokeEmitter<'a, B: Backend> {
    scratch: &'a mut VectorScratchData<B>,
    material_index: u16,
    shape_index: u16,
    line_width: f32,
    pixel_size: f32,
    total_distance: f32,
    bounds: Box2,
}

impl<'a, B: Backend> StrokeEmitter<'a, B> {
    fn vertex(&mut self, position: Vector2<f32>, distance: f32) -> u32 {
        self.bounds.add_point(position);
        self.scratch.add_shape_vertex(ShapeVertex {
            position: [position.x, position.y, distance, self.total_distance],
            shape_index: self.shape_index,
            material_index: self.material_index,
        })
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) -> Result<()> {
        let (mut a, mut b, mut c) = (a, b, c);
        self.scratch.add_index(&mut a)?;
        self.scratch.add_index(&mut b)?;
        self.scratch.add_index(&mut c)
    }

    /// Continue the tube to `position`, connecting to the previous edge
    /// pair when one exists.
    fn simple_join(
        &mut self,
        position: Vector2<f32>,
        to_direction: Vector2<f32>,
        edge: &mut Option<(u32, u32)>,
        distance: f32,
    ) -> Result<()> {
        let offset = perpendicular(to_direction) * (self.line_width * 0.5);
        let new_first = self.vertex(position + offset, distance);
        let new_second = self.vertex(position - offset, distance);

        if let Some((first, second)) = *edge {
            self.triangle(first, second, new_first)?;
            self.triangle(second, new_second, new_first)?;
        }
        *edge = Some((new_first, new_second));
        Ok(())
    }

    /// Emit a cap at a subpath endpoint.
    ///
    /// A start cap also opens the tube by emitting the first edge pair;
    /// an end cap builds on the pair the last join left behind, so butt
    /// caps add no geometry at all.
    fn cap(
        &mut self,
        position: Vector2<f32>,
        direction: Vector2<f32>,
        edge: &mut Option<(u32, u32)>,
        cap_type: LineCap,
        distance: f32,
        start: bool,
    ) -> Result<()> {
        let half_width = self.line_width * 0.5;
        let offset = perpendicular(direction) * half_width;

        if start {
            let new_first = self.vertex(position + offset, distance);
            let new_second = self.vertex(position - offset, distance);
            *edge = Some((new_first, new_second));
        }
        let (first, second) = edge.expect("cap without a tube edge");

        match cap_type {
            LineCap::Butt => Ok(()),
            LineCap::Square => {
                let square_offset = direction * if start { -half_width } else { half_width };
                let first_square = self.vertex(position + offset + square_offset, distance);
                let second_square = self.vertex(position - offset + square_offset, distance);
                if start {
                    self.triangle(first, first_square, second)?;
                    self.triangle(second, first_square, second_square)
                } else {
                    self.triangle(first, second, first_square)?;
                    self.triangle(second, second_square, first_square)
                }
            }
            LineCap::Round => {
                // Half-circle fan around the endpoint.
                let step = pixel_theta(self.pixel_size, half_width);
                let point_count = ((PI / step) as u32).max(2);
                let mut incr = PI / point_count as f32;
                if start {
                    incr = -incr;
                }

                let first_fan = self.scratch.shape_vertices.len() as u32;
                for i in 1..point_count {
                    let theta = i as f32 * incr;
                    let (sin, cos) = theta.sin_cos();
                    let fan_position =
                        position + offset * cos + Vector2::new(-offset.y, offset.x) * sin;
                    self.vertex(fan_position, distance);
                }
                let fan_count = self.scratch.shape_vertices.len() as u32 - first_fan;
                if fan_count == 0 {
                    return Ok(());
                }

                if start {
                    self.triangle(first, first_fan, second)?;
                    for i in 1..fan_count {
                        self.triangle(second, first_fan + i - 1, first_fan + i)?;
                    }
                } else {
                    self.triangle(first, second, first_fan)?;
                    for i in 1..fan_count {
                        self.triangle(second, first_fan + i, first_fan + i - 1)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Emit a join at an interior corner.
    #[allow(clippy::too_many_arguments)]
    fn join(
        &mut self,
        position: Vector2<f32>,
        from_direction: Vector2<f32>,
        to_direction: Vector2<f32>,
        edge: &mut Option<(u32, u32)>,
        join_type: LineJoin,
        cos_miter_theta_limit: f32,
        segment_distance: f32,
        distance: f32,
        end: bool,
    ) -> Result<()> {
        let cos_theta = from_direction.dot(to_direction);
        if cos_theta >= 1.0 - STRAIGHT_COS_EPSILON {
            return self.simple_join(position, to_direction, edge, distance);
        }

        let right = perpendicular(from_direction).dot(to_direction) > 0.0;
        let theta = cos_theta.clamp(-1.0, 1.0).acos();
        let half_width = self.line_width * 0.5;
        let from_offset = perpendicular(from_direction) * half_width;
        let to_offset = perpendicular(to_direction) * half_width;

        let from_first_pos = position + from_offset;
        let from_second_pos = position - from_offset;
        let to_first_pos = position + to_offset;
        let to_second_pos = position - to_offset;

        let center = self.vertex(position, distance);

        // The inner side meets at the inverse of the outer miter point,
        // clamped to the incoming segment so short segments don't fold
        // over themselves. The two coincident vertices carry the distance
        // split so dashing stays continuous through the corner.
        let miter_theta = (PI - theta) / 2.0;
        let extend_length = half_width / miter_theta.tan();
        let inner_extend = extend_length.min(segment_distance);

        let (from_first, from_second, to_first, to_second);
        if right {
            let miter_pos = from_first_pos - from_direction * inner_extend;
            from_first = self.vertex(miter_pos, distance - inner_extend);
            to_first = self.vertex(miter_pos, distance + inner_extend);
            from_second = self.vertex(from_second_pos, distance);
            to_second = self.vertex(to_second_pos, distance);
            if !end {
                self.triangle(from_second, center, from_first)?;
                self.triangle(to_second, to_first, center)?;
            }
        } else {
            let miter_pos = from_second_pos - from_direction * inner_extend;
            from_second = self.vertex(miter_pos, distance - inner_extend);
            to_second = self.vertex(miter_pos, distance + inner_extend);
            from_first = self.vertex(from_first_pos, distance);
            to_first = self.vertex(to_first_pos, distance);
            if !end {
                self.triangle(from_first, from_second, center)?;
                self.triangle(to_second, to_first, center)?;
            }
        }

        if let Some((first, second)) = *edge {
            self.triangle(first, second, from_first)?;
            self.triangle(second, from_second, from_first)?;
        }

        if end {
            *edge = Some((to_first, to_second));
            return Ok(());
        }

        match join_type {
            LineJoin::Miter => {
                if right {
                    self.triangle(center, from_second, to_second)?;
                    if cos_theta >= cos_miter_theta_limit {
                        let miter_pos = from_second_pos + from_direction * extend_length;
                        let miter = self.vertex(miter_pos, distance);
                        self.triangle(from_second, miter, to_second)?;
                    }
                } else {
                    self.triangle(center, to_first, from_first)?;
                    if cos_theta >= cos_miter_theta_limit {
                        let miter_pos = from_first_pos + from_direction * extend_length;
                        let miter = self.vertex(miter_pos, distance);
                        self.triangle(to_first, miter, from_first)?;
                    }
                }
            }
            LineJoin::Bevel => {
                if right {
                    self.triangle(center, from_second, to_second)?;
                } else {
                    self.triangle(center, to_first, from_first)?;
                }
            }
            LineJoin::Round => {
                // Arc fan over the exterior angle.
                let offset = if right { to_offset } else { from_offset };
                let theta_offset = if right { PI } else { 0.0 };
                let step = pixel_theta(self.pixel_size, half_width.max(self.pixel_size));
                let point_count = ((theta / step) as u32).max(2);
                let incr = theta / point_count as f32;

                let first_fan = self.scratch.shape_vertices.len() as u32;
                for i in 1..point_count {
                    let fan_theta = theta_offset + i as f32 * incr;
                    let (sin, cos) = fan_theta.sin_cos();
                    let fan_position =
                        position + offset * cos + Vector2::new(-offset.y, offset.x) * sin;
                    self.vertex(fan_position, distance);
                }
                let fan_count = self.scratch.shape_vertices.len() as u32 - first_fan;
                if fan_count == 0 {
                    if right {
                        self.triangle(center, to_second, from_second)?;
                    } else {
                        self.triangle(center, from_first, to_first)?;
                    }
                } else if right {
                    self.triangle(center, first_fan, to_second)?;
                    self.triangle(center, from_second, first_fan + fan_count - 1)?;
                    for i in 1..fan_count {
                        self.triangle(center, first_fan + i, first_fan + i - 1)?;
                    }
                } else {
                    self.triangle(center, first_fan, from_first)?;
                    self.triangle(center, to_first, first_fan + fan_count - 1)?;
                    for i in 1..fan_count {
                        self.triangle(center, first_fan + i, first_fan + i - 1)?;
                    }
                }
            }
        }

        *edge = Some((to_first, to_second));
        Ok(())
    }
}

/// Direction from `index` to the next distinct point of its subpath.
fn find_line_dir<B: Backend>(
    scratch: &VectorScratchData<B>,
    index: usize,
) -> Option<Vector2<f32>> {
    let points = &scratch.points;
    let mut j = index + 1;
    while j < points.len() && !points[j - 1].flags.contains(PointFlags::END) {
        if points[j].point != points[index].point {
            return Some((points[j].point - points[index].point).normalize());
        }
        j += 1;
    }
    None
}

/// Tessellate the assembled path as a stroke.
pub(crate) fn add_stroke<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    shared_materials: &MaterialSet<B>,
    local_materials: &MaterialSet<B>,
    style: &StrokeStyle,
    pixel_size: f32,
) -> Result<()> {
    if scratch.points.is_empty() {
        return Ok(());
    }

    let (material_index, material_type, material_source) =
        material::find_material(shared_materials, local_materials, &style.material)?;

    // Outside angle limit for miters:
    // strokeWidth / miterLength = sin(theta / 2), so the inside angle
    // limit is asin(1 / miterLimit) * 2; the dot product compares against
    // the cosine of the outside angle.
    let cos_miter_theta_limit = if style.join == LineJoin::Miter {
        debug_assert!(style.miter_limit >= 1.0);
        (PI - 2.0 * (1.0 / style.miter_limit).asin()).cos()
    } else {
        0.0
    };

    // Expand to at least half a pixel, fading sub-pixel strokes through
    // opacity instead of letting them vanish.
    let expand_size = style.width.max(pixel_size * 0.5);
    let size_alpha = style.width / expand_size;

    let dash_distance: f32 = style.dash_array.iter().sum();
    let dashed = dash_distance > 0.0;

    let transform = scratch.path_transform;
    let info_index = scratch.add_shape_piece(
        &transform,
        style.opacity * size_alpha,
        dashed,
        material_type,
        material_source,
    )?;
    scratch.info_mut(info_index).set_dash_array(style.dash_array);

    let mut emitter = StrokeEmitter {
        scratch,
        material_index: material_index as u16,
        shape_index: info_index as u16,
        line_width: expand_size,
        pixel_size,
        total_distance: 0.0,
        bounds: Box2::empty(),
    };

    let mut distance = 0.0;
    let mut first_point = 0;
    let mut join_start = false;
    let mut last_dir = Vector2::new(1.0, 0.0);
    let mut first_dir = last_dir;
    let mut edge: Option<(u32, u32)> = None;

    let point_count = emitter.scratch.points.len();
    for i in 0..point_count {
        let point = emitter.scratch.points[i];
        let end = i == point_count - 1 || point.flags.contains(PointFlags::END);

        if i == first_point {
            // A lone point draws nothing.
            if end {
                first_point = i + 1;
                continue;
            }

            // Measure the subpath for dash evaluation.
            distance = 0.0;
            let mut subpath_distance = 0.0;
            let mut end_index = i + 1;
            while end_index < point_count {
                subpath_distance += emitter.scratch.points[end_index - 1]
                    .point
                    .distance(emitter.scratch.points[end_index].point);
                if emitter.scratch.points[end_index].flags.contains(PointFlags::END) {
                    break;
                }
                end_index += 1;
            }
            emitter.total_distance = subpath_distance;

            first_dir = match find_line_dir(emitter.scratch, i) {
                Some(dir) => dir,
                None => {
                    first_point = i + 1;
                    continue;
                }
            };

            // A closed subpath joins back to its start instead of capping.
            join_start = point.flags.contains(PointFlags::JOIN_START);
            if join_start {
                let end_index = end_index.min(point_count - 1);
                let segment_distance =
                    emitter.scratch.points[end_index - 1].point.distance(point.point);
                last_dir = find_line_dir(emitter.scratch, end_index - 1).unwrap_or(first_dir);
                if point.flags.contains(PointFlags::CORNER) {
                    emitter.join(
                        point.point,
                        last_dir,
                        first_dir,
                        &mut edge,
                        style.join,
                        cos_miter_theta_limit,
                        segment_distance,
                        distance,
                        false,
                    )?;
                } else {
                    emitter.simple_join(point.point, first_dir, &mut edge, distance)?;
                }
            } else {
                emitter.cap(point.point, first_dir, &mut edge, style.cap, distance, true)?;
            }
            last_dir = first_dir;
            continue;
        }

        let segment_distance = emitter.scratch.points[i - 1].point.distance(point.point);
        distance += segment_distance;

        let next_dir = if end && join_start {
            first_dir
        } else if end {
            last_dir
        } else {
            find_line_dir(emitter.scratch, i).unwrap_or(last_dir)
        };

        if point.flags.contains(PointFlags::CORNER) {
            emitter.join(
                point.point,
                last_dir,
                next_dir,
                &mut edge,
                style.join,
                cos_miter_theta_limit,
                segment_distance,
                distance,
                end,
            )?;
        } else {
            emitter.simple_join(point.point, next_dir, &mut edge, distance)?;
        }

        if end {
            if !join_start {
                emitter.cap(point.point, last_dir, &mut edge, style.cap, distance, false)?;
            }
            first_point = i + 1;
            edge = None;
            continue;
        }
        last_dir = next_dir;
    }

    let bounds = emitter.bounds;
    if bounds.is_valid() {
        scratch.info_mut(info_index).set_bounds(bounds);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::VectorCommand;
    use crate::mock::{mock_materials, MockBackend};
    use crate::path;
    use crate::scratch::{MaterialSource, ShaderVariant};
    use cgmath::{Matrix3, SquareMatrix};

    fn stroke_style(width: f32, dash: [f32; 4]) -> StrokeStyle {
        StrokeStyle {
            material: "black".to_owned(),
            opacity: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            width,
            miter_limit: 4.0,
            dash_array: dash,
        }
    }

    fn run(
        commands: Vec<VectorCommand<MockBackend>>,
        pixel_size: f32,
    ) -> VectorScratchData<MockBackend> {
        let mut scratch = VectorScratchData::new();
        let (shared, local) = mock_materials();
        path::process_commands(&mut scratch, &commands, &shared, &local, pixel_size).unwrap();
        scratch
    }

    fn line_commands(style: StrokeStyle) -> Vec<VectorCommand<MockBackend>> {
        vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(100.0, 0.0),
            },
            VectorCommand::StrokePath(style),
        ]
    }

    #[test]
    fn dashed_horizontal_line() {
        let scratch = run(line_commands(stroke_style(2.0, [4.0, 2.0, 0.0, 0.0])), 1.0);

        // Two butt caps add no geometry: just the tube.
        assert_eq!(scratch.shape_vertices.len(), 4);
        assert_eq!(scratch.indices.len(), 6);
        assert_eq!(scratch.pieces.len(), 1);
        assert_eq!(scratch.pieces[0].variant, ShaderVariant::Line);
        assert_eq!(scratch.pieces[0].material_source, MaterialSource::Shared);
        assert_eq!(scratch.infos[0].dash_array(), [4.0, 2.0, 0.0, 0.0]);

        let mut distances: Vec<f32> = scratch
            .shape_vertices
            .iter()
            .map(|v| v.position[2])
            .collect();
        distances.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(distances, vec![0.0, 0.0, 100.0, 100.0]);
        assert!(scratch
            .shape_vertices
            .iter()
            .all(|v| v.position[3] == 100.0));
    }

    #[test]
    fn undashed_stroke_uses_fill_variant() {
        let scratch = run(line_commands(stroke_style(2.0, [0.0; 4])), 1.0);
        assert_eq!(scratch.pieces[0].variant, ShaderVariant::FillColor);
        assert_eq!(scratch.infos[0].dash_array(), [0.0; 4]);
    }

    #[test]
    fn subpixel_strokes_fade_instead_of_vanishing() {
        let scratch = run(line_commands(stroke_style(0.1, [0.0; 4])), 1.0);
        // Expanded to half a pixel; opacity compensates.
        let info = &scratch.infos[0];
        assert!((info.opacity() - 0.1 / 0.5).abs() < 1e-5);
        let width: f32 = scratch
            .shape_vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max)
            - scratch
                .shape_vertices
                .iter()
                .map(|v| v.position[1])
                .fold(f32::MAX, f32::min);
        assert!((width - 0.5).abs() < 1e-5);
    }

    #[test]
    fn bounds_contain_every_vertex() {
        let commands = vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(50.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(50.0, 50.0),
            },
            VectorCommand::StrokePath(StrokeStyle {
                join: LineJoin::Round,
                cap: LineCap::Round,
                ..stroke_style(4.0, [0.0; 4])
            }),
        ];
        let scratch = run(commands, 1.0);
        let bounds = scratch.infos[0].bounds();
        for vertex in &scratch.shape_vertices {
            assert!(
                bounds.contains(Vector2::new(vertex.position[0], vertex.position[1])),
                "vertex {:?} outside bounds {:?}",
                vertex.position,
                bounds
            );
        }
    }

    #[test]
    fn corner_join_splits_distance() {
        // Right-angle corner at (50, 0) with width 4: the inner miter
        // pair shares a position but splits distance.x by the miter
        // extension, keeping dashing continuous.
        let commands = vec![
            VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            },
            VectorCommand::Move {
                position: Vector2::new(0.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(50.0, 0.0),
            },
            VectorCommand::Line {
                end: Vector2::new(50.0, 50.0),
            },
            VectorCommand::StrokePath(stroke_style(4.0, [4.0, 4.0, 0.0, 0.0])),
        ];
        let scratch = run(commands, 1.0);

        // Expected split: delta = min(halfWidth / tan(theta/2), segment)
        // with theta = 90 degrees -> delta = 2.
        let corner_distance = 50.0;
        let delta = 2.0;
        let mut split_pair: Vec<&ShapeVertex> = scratch
            .shape_vertices
            .iter()
            .filter(|v| {
                (v.position[2] - (corner_distance - delta)).abs() < 1e-4
                    || (v.position[2] - (corner_distance + delta)).abs() < 1e-4
            })
            .collect();
        split_pair.sort_by(|a, b| a.position[2].partial_cmp(&b.position[2]).unwrap());
        assert_eq!(split_pair.len(), 2, "inner miter pair missing");
        // Coincident positions, split distances.
        assert_eq!(split_pair[0].position[0], split_pair[1].position[0]);
        assert_eq!(split_pair[0].position[1], split_pair[1].position[1]);
        assert!((split_pair[1].position[2] - split_pair[0].position[2] - 2.0 * delta).abs() < 1e-4);
    }

    #[test]
    fn square_and_round_caps_add_geometry() {
        let butt = run(line_commands(stroke_style(2.0, [0.0; 4])), 1.0)
            .shape_vertices
            .len();
        let square = run(
            line_commands(StrokeStyle {
                cap: LineCap::Square,
                ..stroke_style(2.0, [0.0; 4])
            }),
            1.0,
        )
        .shape_vertices
        .len();
        let round = run(
            line_commands(StrokeStyle {
                cap: LineCap::Round,
                ..stroke_style(2.0, [0.0; 4])
            }),
            1.0,
        )
        .shape_vertices
        .len();
        assert_eq!(butt, 4);
        assert_eq!(square, 4 + 4);
        assert!(round > butt);
    }

    #[test]
    fn closed_subpath_joins_instead_of_capping() {
        let commands = vec![
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
                end: Vector2::new(10.0, 10.0),
            },
            VectorCommand::Line {
                end: Vector2::new(0.0, 10.0),
            },
            VectorCommand::ClosePath,
            VectorCommand::StrokePath(StrokeStyle {
                cap: LineCap::Square,
                ..stroke_style(1.0, [0.0; 4])
            }),
        ];
        let scratch = run(commands, 1.0);
        // A square cap would push vertices half a width beyond the
        // corners along the tangent; a closed path must not have any.
        let bounds = scratch.infos[0].bounds();
        assert!(bounds.max.x <= 10.5 + 1e-4 && bounds.min.x >= -0.5 - 1e-4);
        assert!(bounds.max.y <= 10.5 + 1e-4 && bounds.min.y >= -0.5 - 1e-4);
        // The miter corners reach exactly the half-width diagonal.
        assert!((bounds.max.x - 10.5).abs() < 1e-4);
    }

    #[test]
    fn miter_limit_falls_back_to_bevel() {
        let sharp = |limit: f32| {
            vec![
                VectorCommand::StartPath {
                    transform: Matrix3::identity(),
                    simple: true,
                },
                VectorCommand::Move {
                    position: Vector2::new(0.0, 0.0),
                },
                VectorCommand::Line {
                    end: Vector2::new(50.0, 0.0),
                },
                // Nearly reversing direction: an extreme miter.
                VectorCommand::Line {
                    end: Vector2::new(0.0, 4.0),
                },
                VectorCommand::StrokePath(StrokeStyle {
                    miter_limit: limit,
                    ..stroke_style(2.0, [0.0; 4])
                }),
            ]
        };
        let beveled = run(sharp(1.01), 1.0);
        let mitered = run(sharp(100.0), 1.0);
        // The permissive limit emits the extra miter vertex.
        assert!(mitered.shape_vertices.len() > beveled.shape_vertices.len());
        // And the miter point extends past the corner.
        let max_x = |s: &VectorScratchData<MockBackend>| {
            s.shape_vertices
                .iter()
                .map(|v| v.position[0])
                .fold(f32::MIN, f32::max)
        };
        assert!(max_x(&mitered) > max_x(&beveled) + 1.0);
    }
}
