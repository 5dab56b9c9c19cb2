//! Path assembly: turns the command stream into flagged point runs.
//!
//! The assembler keeps an implicit pen and the per-path transform, emits
//! points into the scratch pools, and hands the assembled polylines to the
//! stroke and fill tessellators. Curves degrade into polylines here, so
//! everything downstream works on points only.

use cgmath::{InnerSpace, Vector2};

use hal::{Backend, Error, Result};

use crate::command::VectorCommand;
use crate::curve::{pixel_theta, CubicCurve};
use crate::fill;
use crate::geom::{adjust_pixel_size, Box2};
use crate::material::MaterialSet;
use crate::scratch::{ImageVertex, PointFlags, VectorScratchData};
use crate::stroke;
use crate::text;

use std::f32::consts::PI;

fn ensure_in_path<B: Backend>(scratch: &VectorScratchData<B>) -> Result<()> {
    if !scratch.in_path {
        error!("path command given without a start path command");
        return Err(Error::InvalidState("path command outside a path"));
    }
    Ok(())
}

fn ensure_current_point<B: Backend>(scratch: &VectorScratchData<B>) -> Result<()> {
    ensure_in_path(scratch)?;
    if scratch.points.is_empty() {
        error!("path continuation command given without an initial move");
        return Err(Error::InvalidState("path continuation without a move"));
    }
    Ok(())
}

fn mark_end<B: Backend>(scratch: &mut VectorScratchData<B>) {
    if let Some(last) = scratch.points.last_mut() {
        last.flags |= PointFlags::END;
    }
}

fn start_path<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    transform: cgmath::Matrix3<f32>,
    simple: bool,
) {
    scratch.in_path = true;
    scratch.path_simple = simple;
    scratch.path_transform = transform;
    scratch.points.clear();
    scratch.last_start = 0;
}

fn move_to<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    position: Vector2<f32>,
    flags: PointFlags,
) -> Result<()> {
    ensure_in_path(scratch)?;
    mark_end(scratch);
    scratch.last_start = scratch.points.len();
    scratch.add_point(position, flags);
    Ok(())
}

fn line_to<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    end: Vector2<f32>,
    flags: PointFlags,
) -> Result<()> {
    ensure_current_point(scratch)?;
    scratch.add_point(end, flags);
    Ok(())
}

fn add_bezier<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    curve: CubicCurve,
    pixel_size: f32,
) {
    let mut points = std::mem::take(&mut scratch.loop_points);
    points.clear();
    curve.tessellate(pixel_size, &mut |point| points.push(point));
    for point in &points {
        scratch.add_point(*point, PointFlags::empty());
    }
    // The endpoint is a corner; duplicate collapsing ORs the flag into
    // the point the tessellation just emitted.
    scratch.add_point(curve.p3, PointFlags::CORNER);
    points.clear();
    scratch.loop_points = points;
}

fn add_cubic<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    control1: Vector2<f32>,
    control2: Vector2<f32>,
    end: Vector2<f32>,
    pixel_size: f32,
) -> Result<()> {
    ensure_current_point(scratch)?;
    let p0 = scratch.points.last().unwrap().point;
    add_bezier(scratch, CubicCurve::bezier(p0, control1, control2, end), pixel_size);
    Ok(())
}

fn add_quadratic<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    control: Vector2<f32>,
    end: Vector2<f32>,
    pixel_size: f32,
) -> Result<()> {
    ensure_current_point(scratch)?;
    let p0 = scratch.points.last().unwrap().point;
    add_bezier(scratch, CubicCurve::quadratic(p0, control, end), pixel_size);
    Ok(())
}

fn rotate(point: Vector2<f32>, sin: f32, cos: f32) -> Vector2<f32> {
    Vector2::new(cos * point.x - sin * point.y, sin * point.x + cos * point.y)
}

fn rotate_transposed(point: Vector2<f32>, sin: f32, cos: f32) -> Vector2<f32> {
    Vector2::new(cos * point.x + sin * point.y, -sin * point.x + cos * point.y)
}

/// Elliptical arc per the SVG implementation notes: endpoint form to
/// center form, unrealizable radii scaled up, delta angle corrected by
/// the sweep flags, sampled at the pixel-error step with the remainder
/// amortized over all samples.
#[allow(clippy::too_many_arguments)]
fn add_arc<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    end: Vector2<f32>,
    radius: Vector2<f32>,
    rotation: f32,
    clockwise: bool,
    large_arc: bool,
    pixel_size: f32,
    end_flags: PointFlags,
    force_center_scale_zero: bool,
) -> Result<()> {
    ensure_current_point(scratch)?;

    // A zero radius degrades to a straight line.
    if radius.x == 0.0 || radius.y == 0.0 {
        scratch.add_point(end, end_flags);
        return Ok(());
    }

    let (sin, cos) = rotation.sin_cos();
    let start = scratch.points.last().unwrap().point;
    let mid_prime = (start - end) / 2.0;
    let pos_prime = rotate_transposed(mid_prime, sin, cos);

    let mut center_scale = 0.0;
    if !force_center_scale_zero {
        let min_radius = Vector2::new(pos_prime.x.abs(), pos_prime.y.abs());
        if radius.x < min_radius.x || radius.y < min_radius.y {
            // No arc fits these radii; scale them up uniformly by the
            // minimum factor that makes one realizable. The recursion
            // forces the center term to zero to dodge infinite radii
            // from rounding.
            let scale = (min_radius.x / radius.x).max(min_radius.y / radius.y);
            return add_arc(
                scratch,
                end,
                radius * scale,
                rotation,
                clockwise,
                large_arc,
                pixel_size,
                end_flags,
                true,
            );
        }

        let pos2 = Vector2::new(pos_prime.x * pos_prime.x, pos_prime.y * pos_prime.y);
        let radius2 = Vector2::new(radius.x * radius.x, radius.y * radius.y);
        let term = (radius2.x * radius2.y - radius2.x * pos2.y - radius2.y * pos2.x)
            / (radius2.x * pos2.y + radius2.y * pos2.x);
        center_scale = term.max(0.0).sqrt();
        if clockwise == large_arc {
            center_scale = -center_scale;
        }
    }

    let center_prime = Vector2::new(
        radius.x * pos_prime.y / radius.y,
        -radius.y * pos_prime.x / radius.x,
    ) * center_scale;
    let mid = (start + end) / 2.0;
    let center = rotate(center_prime, sin, cos) + mid;

    let v = Vector2::new(
        (pos_prime.x - center_prime.x) / radius.x,
        (pos_prime.y - center_prime.y) / radius.y,
    );
    let mut start_theta = (v.x / v.magnitude()).clamp(-1.0, 1.0).acos();
    if center_prime.y > pos_prime.y {
        start_theta = -start_theta;
    }

    let u = v;
    let w = Vector2::new(
        (-pos_prime.x - center_prime.x) / radius.x,
        (-pos_prime.y - center_prime.y) / radius.y,
    );
    let cos_delta = (u.dot(w) / (u.magnitude() * w.magnitude())).clamp(-1.0, 1.0);
    let mut delta_theta = cos_delta.acos();
    if u.y * w.x > u.x * w.y {
        delta_theta = -delta_theta;
    }
    if clockwise && delta_theta < 0.0 {
        delta_theta += 2.0 * PI;
    } else if !clockwise && delta_theta > 0.0 {
        delta_theta -= 2.0 * PI;
    }

    // Sample under a one-pixel chord error, amortizing the remainder by
    // stepping delta/N instead of the raw pixel step.
    let theta_step = pixel_theta(pixel_size, radius.x.max(radius.y));
    let point_count = (delta_theta.abs() / theta_step) as u32;
    if point_count > 1 {
        let incr = delta_theta / point_count as f32;
        for i in 1..point_count {
            let theta = start_theta + i as f32 * incr;
            let base = Vector2::new(theta.cos() * radius.x, theta.sin() * radius.y);
            let position = rotate(base, sin, cos) + center;
            scratch.add_point(position, PointFlags::empty());
        }
    }

    scratch.add_point(end, end_flags);
    Ok(())
}

fn close_path<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    flags: PointFlags,
) -> Result<()> {
    ensure_current_point(scratch)?;
    let start_point = scratch.points[scratch.last_start].point;
    scratch.add_point(start_point, flags | PointFlags::END);
    scratch.points[scratch.last_start].flags |= PointFlags::JOIN_START;
    scratch.last_start = scratch.points.len();
    Ok(())
}

fn add_ellipse<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    center: Vector2<f32>,
    radius: Vector2<f32>,
    pixel_size: f32,
) -> Result<()> {
    let start = center + Vector2::new(radius.x, 0.0);
    move_to(scratch, start, PointFlags::empty())?;

    let theta_step = pixel_theta(pixel_size, radius.x.max(radius.y));
    let delta = 2.0 * PI;
    let point_count = ((delta / theta_step) as u32).max(3);
    let incr = delta / point_count as f32;
    for i in 1..point_count {
        let theta = i as f32 * incr;
        let position = center + Vector2::new(theta.cos() * radius.x, theta.sin() * radius.y);
        scratch.add_point(position, PointFlags::empty());
    }

    close_path(scratch, PointFlags::empty())
}

#[allow(clippy::too_many_arguments)]
fn add_corner<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    center: Vector2<f32>,
    radius: Vector2<f32>,
    start_theta: f32,
    incr: f32,
    point_count: u32,
    first_point: bool,
    join_prev: bool,
) -> Result<()> {
    if first_point || join_prev {
        let position =
            center + Vector2::new(start_theta.cos() * radius.x, start_theta.sin() * radius.y);
        if first_point {
            move_to(scratch, position, PointFlags::empty())?;
        } else {
            scratch.add_point(position, PointFlags::empty());
        }
    }

    for i in 1..=point_count {
        let theta = start_theta + i as f32 * incr;
        let position = center + Vector2::new(theta.cos() * radius.x, theta.sin() * radius.y);
        scratch.add_point(position, PointFlags::empty());
    }
    Ok(())
}

fn add_rectangle<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    bounds: Box2,
    corner_radius: Vector2<f32>,
    pixel_size: f32,
) -> Result<()> {
    if !bounds.is_valid() {
        error!("rectangle bounds are invalid");
        return Err(Error::InvalidArg("invalid rectangle bounds"));
    }

    let mut rx = corner_radius.x;
    let mut ry = corner_radius.y;
    if rx <= 0.0 && ry > 0.0 {
        rx = ry;
    } else if ry <= 0.0 && rx > 0.0 {
        ry = rx;
    }

    if rx <= 0.0 && ry <= 0.0 {
        move_to(scratch, bounds.min, PointFlags::CORNER)?;
        scratch.add_point(Vector2::new(bounds.max.x, bounds.min.y), PointFlags::CORNER);
        scratch.add_point(bounds.max, PointFlags::CORNER);
        scratch.add_point(Vector2::new(bounds.min.x, bounds.max.y), PointFlags::CORNER);
        return close_path(scratch, PointFlags::CORNER);
    }

    let half_extents = bounds.extents() / 2.0;
    rx = rx.min(half_extents.x);
    ry = ry.min(half_extents.y);
    let center = bounds.center();

    let theta_step = pixel_theta(pixel_size, rx.max(ry));
    let quarter = PI / 2.0;
    let point_count = ((quarter / theta_step) as u32).max(1);
    let incr = quarter / point_count as f32;
    let radius = Vector2::new(rx, ry);

    // Corner walk in Cartesian terms; on screen the y axis is flipped but
    // the connectivity is identical.

    // Upper-right.
    let mut corner_center = Vector2::new(
        center.x + half_extents.x - rx,
        center.y + half_extents.y - ry,
    );
    add_corner(scratch, corner_center, radius, 0.0, incr, point_count, true, false)?;

    // Upper-left.
    corner_center.x = center.x - half_extents.x + rx;
    add_corner(
        scratch,
        corner_center,
        radius,
        quarter,
        incr,
        point_count,
        false,
        rx < half_extents.x,
    )?;

    // Lower-left.
    corner_center.y = center.y - half_extents.y + ry;
    add_corner(
        scratch,
        corner_center,
        radius,
        PI,
        incr,
        point_count,
        false,
        ry < half_extents.y,
    )?;

    // Lower-right.
    corner_center.x = center.x + half_extents.x - rx;
    add_corner(
        scratch,
        corner_center,
        radius,
        PI + quarter,
        incr,
        point_count,
        false,
        rx < half_extents.x,
    )?;

    // Closing re-adds the start; drop the last point when the final
    // straight edge is degenerate.
    if ry >= half_extents.y {
        scratch.points.pop();
    }
    close_path(scratch, PointFlags::empty())
}

fn add_image<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    image: &B::Texture,
    bounds: Box2,
    opacity: f32,
    transform: &cgmath::Matrix3<f32>,
) -> Result<()> {
    if !bounds.is_valid() {
        error!("image bounds are invalid");
        return Err(Error::InvalidArg("invalid image bounds"));
    }

    let info_index = scratch.add_image_piece(transform, image.clone(), opacity, bounds)?;
    let shape_index = info_index as i16;

    let corners = [
        (bounds.min, [0, 0]),
        (Vector2::new(bounds.min.x, bounds.max.y), [0, 1]),
        (bounds.max, [1, 1]),
        (Vector2::new(bounds.max.x, bounds.min.y), [1, 0]),
    ];
    let mut vertex_indices = [0u32; 4];
    for (slot, (position, tex_coords)) in corners.iter().enumerate() {
        vertex_indices[slot] = scratch.add_image_vertex(ImageVertex {
            position: [position.x, position.y],
            tex_coords: *tex_coords,
            shape_index,
            padding: 0,
        });
    }

    // Clockwise in image space, counter-clockwise in clip space.
    for &slot in &[0usize, 1, 2, 2, 3, 0] {
        let mut index = vertex_indices[slot];
        scratch.add_index(&mut index)?;
    }
    Ok(())
}

/// Run the command stream, building geometry into the scratch pools.
pub(crate) fn process_commands<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    commands: &[VectorCommand<B>],
    shared_materials: &MaterialSet<B>,
    local_materials: &MaterialSet<B>,
    pixel_size: f32,
) -> Result<()> {
    scratch.reset();
    let mut i = 0;
    while i < commands.len() {
        match &commands[i] {
            VectorCommand::StartPath { transform, simple } => {
                start_path(scratch, *transform, *simple);
            }
            VectorCommand::Move { position } => {
                move_to(scratch, *position, PointFlags::CORNER)?;
            }
            VectorCommand::Line { end } => {
                line_to(scratch, *end, PointFlags::CORNER)?;
            }
            VectorCommand::Bezier {
                control1,
                control2,
                end,
            } => {
                add_cubic(scratch, *control1, *control2, *end, pixel_size)?;
            }
            VectorCommand::Quadratic { control, end } => {
                add_quadratic(scratch, *control, *end, pixel_size)?;
            }
            VectorCommand::Arc {
                radius,
                rotation,
                large_arc,
                clockwise,
                end,
            } => {
                let radius = Vector2::new(radius.x.abs(), radius.y.abs());
                let adjusted = adjust_pixel_size(&scratch.path_transform, pixel_size);
                add_arc(
                    scratch,
                    *end,
                    radius,
                    *rotation,
                    *clockwise,
                    *large_arc,
                    adjusted,
                    PointFlags::CORNER,
                    false,
                )?;
            }
            VectorCommand::ClosePath => {
                close_path(scratch, PointFlags::CORNER)?;
            }
            VectorCommand::Ellipse { center, radius } => {
                let adjusted = adjust_pixel_size(&scratch.path_transform, pixel_size);
                add_ellipse(scratch, *center, *radius, adjusted)?;
            }
            VectorCommand::Rectangle {
                bounds,
                corner_radius,
            } => {
                let adjusted = adjust_pixel_size(&scratch.path_transform, pixel_size);
                add_rectangle(scratch, *bounds, *corner_radius, adjusted)?;
            }
            VectorCommand::StrokePath(style) => {
                ensure_current_point(scratch)?;
                let adjusted = adjust_pixel_size(&scratch.path_transform, pixel_size);
                stroke::add_stroke(scratch, shared_materials, local_materials, style, adjusted)?;
            }
            VectorCommand::FillPath(style) => {
                ensure_current_point(scratch)?;
                fill::add_fill(scratch, shared_materials, local_materials, style)?;
            }
            VectorCommand::Image {
                image,
                bounds,
                opacity,
                transform,
            } => {
                add_image(scratch, image, *bounds, *opacity, transform)?;
            }
            VectorCommand::Text(text_command) => {
                let range_count = text_command.range_count as usize;
                if i + 1 + range_count > commands.len() {
                    error!("text ranges out of command range");
                    return Err(Error::IndexOutOfRange("text ranges exceed the command list"));
                }
                text::add_text(
                    scratch,
                    shared_materials,
                    local_materials,
                    text_command,
                    &commands[i + 1..i + 1 + range_count],
                    pixel_size,
                )?;
                i += range_count;
            }
            VectorCommand::TextRange(_) => {
                error!("text range without a preceding text command");
                return Err(Error::InvalidArg("stray text range command"));
            }
        }
        i += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use cgmath::SquareMatrix;

    type Scratch = VectorScratchData<MockBackend>;

    fn path_scratch() -> Scratch {
        let mut scratch = Scratch::new();
        start_path(&mut scratch, cgmath::Matrix3::identity(), true);
        scratch
    }

    #[test]
    fn commands_outside_a_path_fail() {
        let mut scratch = Scratch::new();
        assert!(matches!(
            move_to(&mut scratch, Vector2::new(0.0, 0.0), PointFlags::CORNER),
            Err(Error::InvalidState(_))
        ));
        start_path(&mut scratch, cgmath::Matrix3::identity(), true);
        // Curves without a current point also fail.
        assert!(matches!(
            add_cubic(
                &mut scratch,
                Vector2::new(0.0, 1.0),
                Vector2::new(1.0, 1.0),
                Vector2::new(1.0, 0.0),
                1.0
            ),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn close_path_flags_start_and_end() {
        let mut scratch = path_scratch();
        move_to(&mut scratch, Vector2::new(0.0, 0.0), PointFlags::CORNER).unwrap();
        line_to(&mut scratch, Vector2::new(10.0, 0.0), PointFlags::CORNER).unwrap();
        line_to(&mut scratch, Vector2::new(5.0, 10.0), PointFlags::CORNER).unwrap();
        close_path(&mut scratch, PointFlags::CORNER).unwrap();

        assert!(scratch.points[0].flags.contains(PointFlags::JOIN_START));
        let last = scratch.points.last().unwrap();
        assert!(last.flags.contains(PointFlags::END));
        assert_eq!(last.point, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn move_ends_the_previous_subpath() {
        let mut scratch = path_scratch();
        move_to(&mut scratch, Vector2::new(0.0, 0.0), PointFlags::CORNER).unwrap();
        line_to(&mut scratch, Vector2::new(1.0, 0.0), PointFlags::CORNER).unwrap();
        move_to(&mut scratch, Vector2::new(5.0, 5.0), PointFlags::CORNER).unwrap();
        assert!(scratch.points[1].flags.contains(PointFlags::END));
        assert_eq!(scratch.last_start, 2);
    }

    #[test]
    fn zero_radius_arc_is_a_straight_line() {
        let mut scratch = path_scratch();
        move_to(&mut scratch, Vector2::new(0.0, 0.0), PointFlags::CORNER).unwrap();
        add_arc(
            &mut scratch,
            Vector2::new(10.0, 0.0),
            Vector2::new(0.0, 0.0),
            0.0,
            false,
            false,
            1.0,
            PointFlags::CORNER,
            false,
        )
        .unwrap();
        // Exactly the existing start plus the endpoint.
        assert_eq!(scratch.points.len(), 2);
        assert_eq!(scratch.points[1].point, Vector2::new(10.0, 0.0));
        assert!(scratch.points[1].flags.contains(PointFlags::CORNER));
    }

    #[test]
    fn arc_interpolates_a_half_circle() {
        let mut scratch = path_scratch();
        move_to(&mut scratch, Vector2::new(0.0, 0.0), PointFlags::CORNER).unwrap();
        // Half circle of radius 5 from (0,0) to (10,0).
        add_arc(
            &mut scratch,
            Vector2::new(10.0, 0.0),
            Vector2::new(5.0, 5.0),
            0.0,
            true,
            false,
            1.0,
            PointFlags::CORNER,
            false,
        )
        .unwrap();
        assert!(scratch.points.len() > 3);
        // Every interior point sits on the circle centered at (5, 0).
        for info in &scratch.points[1..scratch.points.len() - 1] {
            let d = (info.point - Vector2::new(5.0, 0.0)).magnitude();
            assert!((d - 5.0).abs() < 0.05, "point {:?} radius {}", info.point, d);
            assert!(info.flags.is_empty());
        }
        assert_eq!(scratch.points.last().unwrap().point, Vector2::new(10.0, 0.0));
    }

    #[test]
    fn unrealizable_arc_radii_scale_up() {
        let mut scratch = path_scratch();
        move_to(&mut scratch, Vector2::new(0.0, 0.0), PointFlags::CORNER).unwrap();
        // Radius far too small for the endpoints; the arc still reaches
        // the endpoint by scaling the radii.
        add_arc(
            &mut scratch,
            Vector2::new(10.0, 0.0),
            Vector2::new(1.0, 1.0),
            0.0,
            false,
            false,
            1.0,
            PointFlags::CORNER,
            false,
        )
        .unwrap();
        assert_eq!(
            scratch.points.last().unwrap().point,
            Vector2::new(10.0, 0.0)
        );
        assert!(scratch.points.len() > 2);
    }

    #[test]
    fn sharp_rectangle_has_four_corners() {
        let mut scratch = path_scratch();
        add_rectangle(
            &mut scratch,
            Box2::new(Vector2::new(0.0, 0.0), Vector2::new(4.0, 2.0)),
            Vector2::new(0.0, 0.0),
            1.0,
        )
        .unwrap();
        // Four corners plus the closing duplicate of the start.
        assert_eq!(scratch.points.len(), 5);
        assert!(scratch.points[0].flags.contains(PointFlags::JOIN_START));
        assert!(scratch
            .points
            .iter()
            .take(4)
            .all(|p| p.flags.contains(PointFlags::CORNER)));
        assert!(scratch.points[4].flags.contains(PointFlags::END));
    }

    #[test]
    fn rounded_rectangle_stays_inside_bounds() {
        let mut scratch = path_scratch();
        let bounds = Box2::new(Vector2::new(0.0, 0.0), Vector2::new(20.0, 10.0));
        add_rectangle(&mut scratch, bounds, Vector2::new(3.0, 3.0), 0.5).unwrap();
        assert!(scratch.points.len() > 8);
        let slack = 1e-3;
        for info in &scratch.points {
            assert!(info.point.x >= bounds.min.x - slack && info.point.x <= bounds.max.x + slack);
            assert!(info.point.y >= bounds.min.y - slack && info.point.y <= bounds.max.y + slack);
        }
        assert!(scratch.points[0].flags.contains(PointFlags::JOIN_START));
    }

    #[test]
    fn pill_shape_suppresses_degenerate_edges() {
        // Corner radius equal to the half height turns the sides into
        // pure arcs; the duplicate seam point must not survive.
        let mut scratch = path_scratch();
        let bounds = Box2::new(Vector2::new(0.0, 0.0), Vector2::new(20.0, 10.0));
        add_rectangle(&mut scratch, bounds, Vector2::new(5.0, 5.0), 0.5).unwrap();
        let end = scratch.points.last().unwrap();
        assert!(end.flags.contains(PointFlags::END));
        // No interior point repeats its predecessor.
        for pair in scratch.points.windows(2) {
            assert!(
                (pair[0].point - pair[1].point).magnitude() > 1e-5,
                "duplicate point {:?}",
                pair[0].point
            );
        }
    }

    #[test]
    fn ellipse_is_closed_and_round() {
        let mut scratch = path_scratch();
        add_ellipse(
            &mut scratch,
            Vector2::new(10.0, 10.0),
            Vector2::new(5.0, 3.0),
            0.5,
        )
        .unwrap();
        assert!(scratch.points[0].flags.contains(PointFlags::JOIN_START));
        assert!(scratch.points.last().unwrap().flags.contains(PointFlags::END));
        for info in &scratch.points {
            let d = info.point - Vector2::new(10.0, 10.0);
            let on_ellipse = (d.x / 5.0).powi(2) + (d.y / 3.0).powi(2);
            assert!((on_ellipse - 1.0).abs() < 0.05);
        }
    }
}
