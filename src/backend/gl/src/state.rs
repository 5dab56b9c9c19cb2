//! Render state diffing.
//!
//! The live command buffer tracks the last state delivered to the driver
//! and issues only the calls needed to reach a new state. Dynamic values
//! fill in the fields the pipeline left as `None`; the comparison always
//! happens on fully resolved states, so re-applying the current state is
//! a no-op.

use hal::pso::{
    BlendFactor, BlendOp, CompareOp, CullMode, DynamicRenderStates, FrontFace, PolygonMode,
    RenderState, StencilFaceState, StencilOp, MAX_COLOR_ATTACHMENTS,
};

use crate::gl::{consts as gl, Context};
use crate::info::{Limits, PrivateCaps};

pub(crate) fn map_comparison(op: CompareOp) -> u32 {
    match op {
        CompareOp::Never => gl::NEVER,
        CompareOp::Less => gl::LESS,
        CompareOp::Equal => gl::EQUAL,
        CompareOp::LessEqual => gl::LEQUAL,
        CompareOp::Greater => gl::GREATER,
        CompareOp::NotEqual => gl::NOTEQUAL,
        CompareOp::GreaterEqual => gl::GEQUAL,
        CompareOp::Always => gl::ALWAYS,
    }
}

fn map_stencil_op(op: StencilOp) -> u32 {
    match op {
        StencilOp::Keep => gl::KEEP,
        StencilOp::Zero => gl::ZERO,
        StencilOp::Replace => gl::REPLACE,
        StencilOp::IncrementClamp => gl::INCR,
        StencilOp::DecrementClamp => gl::DECR,
        StencilOp::Invert => gl::INVERT,
        StencilOp::IncrementWrap => gl::INCR_WRAP,
        StencilOp::DecrementWrap => gl::DECR_WRAP,
    }
}

fn map_blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => gl::ZERO,
        BlendFactor::One => gl::ONE,
        BlendFactor::SrcColor => gl::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => gl::DST_COLOR,
        BlendFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => gl::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => gl::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstColor => gl::CONSTANT_COLOR,
        BlendFactor::OneMinusConstColor => gl::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::SrcAlphaSaturate => gl::SRC_ALPHA_SATURATE,
    }
}

fn map_blend_op(op: BlendOp) -> u32 {
    match op {
        BlendOp::Add => gl::FUNC_ADD,
        BlendOp::Subtract => gl::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => gl::MIN,
        BlendOp::Max => gl::MAX,
    }
}

/// Fill the dynamic fields of `state` from `dynamic`, clamp the line
/// width to the probed range, and fold the face-winding inversion of the
/// render target into the cull mode.
pub(crate) fn resolve(
    state: &RenderState,
    dynamic: Option<&DynamicRenderStates>,
    invert_y: bool,
    limits: &Limits,
) -> RenderState {
    let defaults = DynamicRenderStates::default();
    let dynamic = dynamic.unwrap_or(&defaults);
    let mut resolved = *state;

    let raster = &mut resolved.rasterization;
    raster.depth_bias_constant_factor = Some(
        raster
            .depth_bias_constant_factor
            .unwrap_or(dynamic.depth_bias_constant_factor),
    );
    raster.depth_bias_clamp = Some(raster.depth_bias_clamp.unwrap_or(dynamic.depth_bias_clamp));
    raster.depth_bias_slope_factor = Some(
        raster
            .depth_bias_slope_factor
            .unwrap_or(dynamic.depth_bias_slope_factor),
    );
    let line_width = raster.line_width.unwrap_or(dynamic.line_width);
    raster.line_width = Some(line_width.clamp(limits.line_width_range[0], limits.line_width_range[1]));
    if invert_y {
        raster.cull_mode = match raster.cull_mode {
            CullMode::Front => CullMode::Back,
            CullMode::Back => CullMode::Front,
            other => other,
        };
    }

    let depth_stencil = &mut resolved.depth_stencil;
    depth_stencil.min_depth_bounds =
        Some(depth_stencil.min_depth_bounds.unwrap_or(dynamic.depth_bounds[0]));
    depth_stencil.max_depth_bounds =
        Some(depth_stencil.max_depth_bounds.unwrap_or(dynamic.depth_bounds[1]));
    let front = &mut depth_stencil.front_stencil;
    front.compare_mask = Some(front.compare_mask.unwrap_or(dynamic.front_stencil_compare_mask));
    front.write_mask = Some(front.write_mask.unwrap_or(dynamic.front_stencil_write_mask));
    front.reference = Some(front.reference.unwrap_or(dynamic.front_stencil_reference));
    let back = &mut depth_stencil.back_stencil;
    back.compare_mask = Some(back.compare_mask.unwrap_or(dynamic.back_stencil_compare_mask));
    back.write_mask = Some(back.write_mask.unwrap_or(dynamic.back_stencil_write_mask));
    back.reference = Some(back.reference.unwrap_or(dynamic.back_stencil_reference));

    resolved.blend.blend_constants =
        Some(resolved.blend.blend_constants.unwrap_or(dynamic.blend_constants));

    resolved
}

fn set_enabled(ctx: &dyn Context, cap: u32, enable: bool) {
    if enable {
        ctx.enable(cap);
    } else {
        ctx.disable(cap);
    }
}

fn apply_rasterization(
    ctx: &dyn Context,
    cur: &RenderState,
    new: &RenderState,
    force: bool,
) {
    let cur = &cur.rasterization;
    let new = &new.rasterization;

    if force || cur.depth_clamp_enable != new.depth_clamp_enable {
        set_enabled(ctx, gl::DEPTH_CLAMP, new.depth_clamp_enable);
    }
    if force || cur.rasterizer_discard_enable != new.rasterizer_discard_enable {
        set_enabled(ctx, gl::RASTERIZER_DISCARD, new.rasterizer_discard_enable);
    }
    if force || cur.polygon_mode != new.polygon_mode {
        ctx.polygon_mode(match new.polygon_mode {
            PolygonMode::Fill => gl::FILL,
            PolygonMode::Line => gl::LINE,
            PolygonMode::Point => gl::POINT,
        });
    }
    if force || cur.cull_mode != new.cull_mode {
        match new.cull_mode {
            CullMode::None => ctx.disable(gl::CULL_FACE),
            mode => {
                ctx.enable(gl::CULL_FACE);
                ctx.cull_face(match mode {
                    CullMode::Front => gl::FRONT,
                    CullMode::Back => gl::BACK,
                    _ => gl::FRONT_AND_BACK,
                });
            }
        }
    }
    if force || cur.front_face != new.front_face {
        ctx.front_face(match new.front_face {
            FrontFace::CounterClockwise => gl::CCW,
            FrontFace::Clockwise => gl::CW,
        });
    }
    if force || cur.depth_bias_enable != new.depth_bias_enable {
        let offset_cap = match new.polygon_mode {
            PolygonMode::Fill => gl::POLYGON_OFFSET_FILL,
            PolygonMode::Line => gl::POLYGON_OFFSET_LINE,
            PolygonMode::Point => gl::POLYGON_OFFSET_POINT,
        };
        set_enabled(ctx, offset_cap, new.depth_bias_enable);
    }
    if new.depth_bias_enable
        && (force
            || cur.depth_bias_constant_factor != new.depth_bias_constant_factor
            || cur.depth_bias_slope_factor != new.depth_bias_slope_factor)
    {
        ctx.polygon_offset(
            new.depth_bias_slope_factor.unwrap_or(0.0),
            new.depth_bias_constant_factor.unwrap_or(0.0),
        );
    }
    if force || cur.line_width != new.line_width {
        ctx.line_width(new.line_width.unwrap_or(1.0));
    }
}

fn apply_multisample(ctx: &dyn Context, cur: &RenderState, new: &RenderState, force: bool) {
    let cur = &cur.multisample;
    let new = &new.multisample;

    if force || cur.multisample_enable != new.multisample_enable {
        set_enabled(ctx, gl::MULTISAMPLE, new.multisample_enable);
    }
    if force || cur.sample_mask != new.sample_mask {
        match new.sample_mask {
            Some(mask) => {
                ctx.enable(gl::SAMPLE_MASK);
                ctx.sample_mask_i(0, mask);
            }
            None => ctx.disable(gl::SAMPLE_MASK),
        }
    }
    if force || cur.alpha_to_coverage_enable != new.alpha_to_coverage_enable {
        set_enabled(ctx, gl::SAMPLE_ALPHA_TO_COVERAGE, new.alpha_to_coverage_enable);
    }
    if force || cur.alpha_to_one_enable != new.alpha_to_one_enable {
        set_enabled(ctx, gl::SAMPLE_ALPHA_TO_ONE, new.alpha_to_one_enable);
    }
}

fn apply_stencil_face(
    ctx: &dyn Context,
    face: u32,
    cur: &StencilFaceState,
    new: &StencilFaceState,
    force: bool,
) {
    if force
        || cur.compare_op != new.compare_op
        || cur.reference != new.reference
        || cur.compare_mask != new.compare_mask
    {
        ctx.stencil_func_separate(
            face,
            map_comparison(new.compare_op),
            new.reference.unwrap_or(0) as i32,
            new.compare_mask.unwrap_or(!0),
        );
    }
    if force
        || cur.fail_op != new.fail_op
        || cur.depth_fail_op != new.depth_fail_op
        || cur.pass_op != new.pass_op
    {
        ctx.stencil_op_separate(
            face,
            map_stencil_op(new.fail_op),
            map_stencil_op(new.depth_fail_op),
            map_stencil_op(new.pass_op),
        );
    }
    if force || cur.write_mask != new.write_mask {
        ctx.stencil_mask_separate(face, new.write_mask.unwrap_or(!0));
    }
}

fn apply_depth_stencil(
    ctx: &dyn Context,
    cur: &RenderState,
    new: &RenderState,
    force: bool,
    caps: PrivateCaps,
) {
    let cur = &cur.depth_stencil;
    let new = &new.depth_stencil;

    if force || cur.depth_test_enable != new.depth_test_enable {
        set_enabled(ctx, gl::DEPTH_TEST, new.depth_test_enable);
    }
    if new.depth_test_enable && (force || cur.depth_compare_op != new.depth_compare_op) {
        ctx.depth_func(map_comparison(new.depth_compare_op));
    }
    if force || cur.depth_write_enable != new.depth_write_enable {
        ctx.depth_mask(new.depth_write_enable);
    }
    if caps.contains(PrivateCaps::DEPTH_BOUNDS) {
        if force || cur.depth_bounds_test_enable != new.depth_bounds_test_enable {
            set_enabled(ctx, gl::DEPTH_BOUNDS_TEST_EXT, new.depth_bounds_test_enable);
        }
        if new.depth_bounds_test_enable
            && (force
                || cur.min_depth_bounds != new.min_depth_bounds
                || cur.max_depth_bounds != new.max_depth_bounds)
        {
            ctx.depth_bounds(
                new.min_depth_bounds.unwrap_or(0.0),
                new.max_depth_bounds.unwrap_or(1.0),
            );
        }
    }
    if force || cur.stencil_test_enable != new.stencil_test_enable {
        set_enabled(ctx, gl::STENCIL_TEST, new.stencil_test_enable);
    }
    if new.stencil_test_enable || force {
        apply_stencil_face(ctx, gl::FRONT, &cur.front_stencil, &new.front_stencil, force);
        apply_stencil_face(ctx, gl::BACK, &cur.back_stencil, &new.back_stencil, force);
    }
}

fn apply_blend(
    ctx: &dyn Context,
    cur: &RenderState,
    new: &RenderState,
    force: bool,
    caps: PrivateCaps,
) {
    let cur = &cur.blend;
    let new = &new.blend;

    if force || cur.blend_constants != new.blend_constants {
        let c = new.blend_constants.unwrap_or([0.0; 4]);
        ctx.blend_color(c[0], c[1], c[2], c[3]);
    }

    let indexed = new.separate_attachment_blending_enable && caps.contains(PrivateCaps::INDEXED_BLEND);
    if indexed {
        for i in 0..MAX_COLOR_ATTACHMENTS {
            let cur_attachment = &cur.attachments[i];
            let new_attachment = &new.attachments[i];
            let changed = force
                || cur.separate_attachment_blending_enable != new.separate_attachment_blending_enable
                || cur_attachment != new_attachment;
            if !changed {
                continue;
            }
            let slot = i as u32;
            if new_attachment.blend_enable {
                ctx.enable_i(gl::BLEND, slot);
                ctx.blend_func_separate_i(
                    slot,
                    map_blend_factor(new_attachment.src_color_factor),
                    map_blend_factor(new_attachment.dst_color_factor),
                    map_blend_factor(new_attachment.src_alpha_factor),
                    map_blend_factor(new_attachment.dst_alpha_factor),
                );
                ctx.blend_equation_separate_i(
                    slot,
                    map_blend_op(new_attachment.color_op),
                    map_blend_op(new_attachment.alpha_op),
                );
            } else {
                ctx.disable_i(gl::BLEND, slot);
            }
            let mask = new_attachment.color_write_mask;
            ctx.color_mask_i(
                slot,
                mask.contains(hal::pso::ColorMask::RED),
                mask.contains(hal::pso::ColorMask::GREEN),
                mask.contains(hal::pso::ColorMask::BLUE),
                mask.contains(hal::pso::ColorMask::ALPHA),
            );
        }
    } else {
        // Attachment 0 broadcasts through the non-indexed entry points.
        let cur_attachment = &cur.attachments[0];
        let new_attachment = &new.attachments[0];
        let switched = cur.separate_attachment_blending_enable
            != new.separate_attachment_blending_enable;
        if force || switched || cur_attachment.blend_enable != new_attachment.blend_enable {
            set_enabled(ctx, gl::BLEND, new_attachment.blend_enable);
        }
        if new_attachment.blend_enable
            && (force
                || switched
                || cur_attachment.src_color_factor != new_attachment.src_color_factor
                || cur_attachment.dst_color_factor != new_attachment.dst_color_factor
                || cur_attachment.src_alpha_factor != new_attachment.src_alpha_factor
                || cur_attachment.dst_alpha_factor != new_attachment.dst_alpha_factor)
        {
            ctx.blend_func_separate(
                map_blend_factor(new_attachment.src_color_factor),
                map_blend_factor(new_attachment.dst_color_factor),
                map_blend_factor(new_attachment.src_alpha_factor),
                map_blend_factor(new_attachment.dst_alpha_factor),
            );
        }
        if new_attachment.blend_enable
            && (force
                || switched
                || cur_attachment.color_op != new_attachment.color_op
                || cur_attachment.alpha_op != new_attachment.alpha_op)
        {
            ctx.blend_equation_separate(
                map_blend_op(new_attachment.color_op),
                map_blend_op(new_attachment.alpha_op),
            );
        }
        if force || switched || cur_attachment.color_write_mask != new_attachment.color_write_mask {
            let mask = new_attachment.color_write_mask;
            ctx.color_mask(
                mask.contains(hal::pso::ColorMask::RED),
                mask.contains(hal::pso::ColorMask::GREEN),
                mask.contains(hal::pso::ColorMask::BLUE),
                mask.contains(hal::pso::ColorMask::ALPHA),
            );
        }
    }
}

/// Bring the driver from `cur` (`None` = unknown, apply everything) to the
/// state described by `new` + `dynamic`, issuing only changing calls.
/// Returns the resolved state that was applied, to be stored as the new
/// current state.
pub(crate) fn update_state(
    ctx: &dyn Context,
    cur: Option<&RenderState>,
    new: &RenderState,
    dynamic: Option<&DynamicRenderStates>,
    invert_y: bool,
    limits: &Limits,
    caps: PrivateCaps,
) -> RenderState {
    let resolved = resolve(new, dynamic, invert_y, limits);
    let force = cur.is_none();
    let default_state;
    let cur = match cur {
        Some(cur) => cur,
        None => {
            default_state = RenderState::default();
            &default_state
        }
    };

    if !force && *cur == resolved {
        return resolved;
    }

    apply_rasterization(ctx, cur, &resolved, force);
    apply_multisample(ctx, cur, &resolved, force);
    apply_depth_stencil(ctx, cur, &resolved, force, caps);
    apply_blend(ctx, cur, &resolved, force, caps);

    if force || cur.patch_control_points != resolved.patch_control_points {
        if let Some(points) = resolved.patch_control_points {
            ctx.patch_parameter(gl::PATCH_VERTICES, points as i32);
        }
    }

    // Enable or disable only the clip distances that changed.
    let cur_clip = if force { 0 } else { cur.clip_distance_count };
    let new_clip = resolved.clip_distance_count.min(limits.max_clip_distances);
    for i in cur_clip.min(new_clip)..cur_clip.max(new_clip) {
        set_enabled(ctx, gl::CLIP_DISTANCE0 + i, i < new_clip);
    }

    resolved
}

/// Re-apply only the dynamically-overridable subset. Fields baked into
/// the static state (`Some`) are left untouched.
pub(crate) fn update_dynamic_state(
    ctx: &dyn Context,
    cur: &mut RenderState,
    static_state: &RenderState,
    dynamic: &DynamicRenderStates,
    limits: &Limits,
    caps: PrivateCaps,
) {
    let raster = &static_state.rasterization;
    if raster.line_width.is_none() {
        let clamped = dynamic
            .line_width
            .clamp(limits.line_width_range[0], limits.line_width_range[1]);
        if cur.rasterization.line_width != Some(clamped) {
            cur.rasterization.line_width = Some(clamped);
            ctx.line_width(clamped);
        }
    }
    if raster.depth_bias_enable
        && (raster.depth_bias_constant_factor.is_none() || raster.depth_bias_slope_factor.is_none())
    {
        let constant = raster
            .depth_bias_constant_factor
            .unwrap_or(dynamic.depth_bias_constant_factor);
        let slope = raster
            .depth_bias_slope_factor
            .unwrap_or(dynamic.depth_bias_slope_factor);
        if cur.rasterization.depth_bias_constant_factor != Some(constant)
            || cur.rasterization.depth_bias_slope_factor != Some(slope)
        {
            cur.rasterization.depth_bias_constant_factor = Some(constant);
            cur.rasterization.depth_bias_slope_factor = Some(slope);
            ctx.polygon_offset(slope, constant);
        }
    }

    let depth_stencil = &static_state.depth_stencil;
    if caps.contains(PrivateCaps::DEPTH_BOUNDS)
        && depth_stencil.depth_bounds_test_enable
        && (depth_stencil.min_depth_bounds.is_none() || depth_stencil.max_depth_bounds.is_none())
    {
        let min = depth_stencil.min_depth_bounds.unwrap_or(dynamic.depth_bounds[0]);
        let max = depth_stencil.max_depth_bounds.unwrap_or(dynamic.depth_bounds[1]);
        if cur.depth_stencil.min_depth_bounds != Some(min)
            || cur.depth_stencil.max_depth_bounds != Some(max)
        {
            cur.depth_stencil.min_depth_bounds = Some(min);
            cur.depth_stencil.max_depth_bounds = Some(max);
            ctx.depth_bounds(min, max);
        }
    }

    if depth_stencil.stencil_test_enable {
        let faces = [
            (
                gl::FRONT,
                &depth_stencil.front_stencil,
                dynamic.front_stencil_compare_mask,
                dynamic.front_stencil_write_mask,
                dynamic.front_stencil_reference,
            ),
            (
                gl::BACK,
                &depth_stencil.back_stencil,
                dynamic.back_stencil_compare_mask,
                dynamic.back_stencil_write_mask,
                dynamic.back_stencil_reference,
            ),
        ];
        for &(face, side, compare_mask, write_mask, reference) in &faces {
            let cur_side = if face == gl::FRONT {
                &mut cur.depth_stencil.front_stencil
            } else {
                &mut cur.depth_stencil.back_stencil
            };
            if side.compare_mask.is_none() || side.reference.is_none() {
                let compare_mask = side.compare_mask.unwrap_or(compare_mask);
                let reference = side.reference.unwrap_or(reference);
                if cur_side.compare_mask != Some(compare_mask)
                    || cur_side.reference != Some(reference)
                {
                    cur_side.compare_mask = Some(compare_mask);
                    cur_side.reference = Some(reference);
                    ctx.stencil_func_separate(
                        face,
                        map_comparison(side.compare_op),
                        reference as i32,
                        compare_mask,
                    );
                }
            }
            if side.write_mask.is_none() {
                let write_mask = side.write_mask.unwrap_or(write_mask);
                if cur_side.write_mask != Some(write_mask) {
                    cur_side.write_mask = Some(write_mask);
                    ctx.stencil_mask_separate(face, write_mask);
                }
            }
        }
    }

    if static_state.blend.blend_constants.is_none()
        && cur.blend.blend_constants != Some(dynamic.blend_constants)
    {
        cur.blend.blend_constants = Some(dynamic.blend_constants);
        let c = dynamic.blend_constants;
        ctx.blend_color(c[0], c[1], c[2], c[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Info;
    use crate::mock::MockContext;

    fn setup() -> (MockContext, Limits, PrivateCaps) {
        let ctx = MockContext::new();
        let info = Info::get(&ctx);
        let limits = info.limits;
        let caps = info.private_caps;
        ctx.take_calls();
        (ctx, limits, caps)
    }

    #[test]
    fn identical_state_issues_no_calls() {
        let (ctx, limits, caps) = setup();
        let state = RenderState::default();
        let applied = update_state(&ctx, None, &state, None, false, &limits, caps);
        ctx.take_calls();
        update_state(&ctx, Some(&applied), &state, None, false, &limits, caps);
        assert_eq!(ctx.take_calls(), Vec::<String>::new());
    }

    #[test]
    fn depth_write_change_issues_single_call() {
        let (ctx, limits, caps) = setup();
        let state = RenderState::default();
        let applied = update_state(&ctx, None, &state, None, false, &limits, caps);
        ctx.take_calls();

        let mut new_state = state;
        new_state.depth_stencil.depth_write_enable = false;
        update_state(&ctx, Some(&applied), &new_state, None, false, &limits, caps);
        assert_eq!(ctx.take_calls(), vec!["depth_mask(false)".to_owned()]);
    }

    #[test]
    fn line_width_is_clamped_to_probed_range() {
        let (ctx, limits, caps) = setup();
        let state = RenderState::default();
        let applied = update_state(&ctx, None, &state, None, false, &limits, caps);
        ctx.take_calls();

        let mut new_state = state;
        new_state.rasterization.line_width = Some(64.0);
        let applied = update_state(&ctx, Some(&applied), &new_state, None, false, &limits, caps);
        // The mock's probed range is [1, 8].
        assert_eq!(applied.rasterization.line_width, Some(8.0));
        assert!(ctx.take_calls().contains(&"line_width(8)".to_owned()));

        let mut tiny = state;
        tiny.rasterization.line_width = Some(0.01);
        let applied = update_state(&ctx, Some(&applied), &tiny, None, false, &limits, caps);
        assert_eq!(applied.rasterization.line_width, Some(1.0));
    }

    #[test]
    fn invert_y_flips_culling() {
        let (ctx, limits, caps) = setup();
        let mut state = RenderState::default();
        state.rasterization.cull_mode = CullMode::Back;
        let applied = update_state(&ctx, None, &state, None, false, &limits, caps);
        ctx.take_calls();

        // Same state rendered to an inverted target must re-cull.
        let applied = update_state(&ctx, Some(&applied), &state, None, true, &limits, caps);
        assert_eq!(applied.rasterization.cull_mode, CullMode::Front);
        let calls = ctx.take_calls();
        assert!(calls.iter().any(|c| c == "cull_face(0x404)"));
    }

    #[test]
    fn dynamic_value_fills_unset_field() {
        let (ctx, limits, caps) = setup();
        let mut state = RenderState::default();
        state.rasterization.line_width = None;
        let dynamic = DynamicRenderStates {
            line_width: 3.0,
            ..DynamicRenderStates::default()
        };
        let applied = update_state(&ctx, None, &state, Some(&dynamic), false, &limits, caps);
        assert_eq!(applied.rasterization.line_width, Some(3.0));

        // A dynamic update touches only the dynamic subset.
        ctx.take_calls();
        let mut cur = applied;
        let new_dynamic = DynamicRenderStates {
            line_width: 5.0,
            ..DynamicRenderStates::default()
        };
        update_dynamic_state(&ctx, &mut cur, &state, &new_dynamic, &limits, caps);
        assert_eq!(ctx.take_calls(), vec!["line_width(5)".to_owned()]);
    }
}
