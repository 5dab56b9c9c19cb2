//! Scratch data reused while building vector images.
//!
//! Holds the append-only pools every tessellation stage writes into
//! (points, vertices, indices, info records, draw pieces, triangulation
//! loops, text objects) plus the triangulator and simplifier shared across
//! images. `reset` clears lengths but keeps capacity, so building many
//! images amortizes all allocation.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix3, MetricSpace, Vector2};

use hal::command::DrawIndexedRange;
use hal::{Backend, Error, Result};

use crate::command::VectorCommand;
use crate::geom::Box2;
use crate::polygon::{PolygonSimplifier, SimplePolygon};
use crate::text::{TextLayout, TextStyle};

/// Info records per info texture; the vertex shader indexes records by the
/// low bits of the shape index.
pub const INFOS_PER_TEXTURE: u32 = 1024;
/// Largest vertex index a draw piece may contain.
pub const MAX_VERTEX_INDEX: u32 = u16::MAX as u32 - 1;
/// Points closer than this collapse into one, OR-ing their flags.
pub(crate) const POINT_EPSILON: f32 = 1e-5;

bitflags::bitflags! {
    /// Attributes of an assembled path point.
    pub struct PointFlags: u32 {
        /// The point is a hard corner; strokes emit a join here.
        const CORNER = 0x1;
        /// First point of a closed subpath; the stroke joins back to it
        /// instead of capping.
        const JOIN_START = 0x2;
        /// Last point of a subpath.
        const END = 0x4;
    }
}

/// A point emitted by the path assembler.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PointInfo {
    pub point: Vector2<f32>,
    pub flags: PointFlags,
}

/// Vertex layout of strokes and fills. `position.zw` carries the distance
/// along the subpath and the total subpath length for dash evaluation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 4],
    pub shape_index: u16,
    pub material_index: u16,
}

/// Vertex layout of image quads.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ImageVertex {
    pub position: [f32; 2],
    pub tex_coords: [i16; 2],
    pub shape_index: i16,
    pub padding: i16,
}

/// One 64-byte info record: four texel rows of an RGBA32F info texture.
///
/// Shape records store bounds, the path transform, opacity and the dash
/// array; text records replace the last rows with style and per-layer
/// opacity.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VectorInfo(pub [[f32; 4]; 4]);

impl VectorInfo {
    pub(crate) fn new(transform: &Matrix3<f32>, opacity: f32) -> Self {
        let mut info = VectorInfo::zeroed();
        info.set_bounds(Box2::empty());
        info.set_transform(transform);
        info.0[2][2] = opacity;
        info
    }

    pub fn bounds(&self) -> Box2 {
        Box2::new(
            Vector2::new(self.0[0][0], self.0[0][1]),
            Vector2::new(self.0[0][2], self.0[0][3]),
        )
    }

    pub(crate) fn set_bounds(&mut self, bounds: Box2) {
        self.0[0] = [bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y];
    }

    pub(crate) fn set_transform(&mut self, transform: &Matrix3<f32>) {
        self.0[1] = [transform.x.x, transform.x.y, transform.y.x, transform.y.y];
        self.0[2][0] = transform.z.x;
        self.0[2][1] = transform.z.y;
    }

    pub fn opacity(&self) -> f32 {
        self.0[2][2]
    }

    pub fn dash_array(&self) -> [f32; 4] {
        self.0[3]
    }

    pub(crate) fn set_dash_array(&mut self, dash_array: [f32; 4]) {
        self.0[3] = dash_array;
    }

    pub(crate) fn set_text_style(&mut self, style: &TextStyle, fill_opacity: f32, outline_opacity: f32) {
        self.0[2][2] = fill_opacity;
        self.0[2][3] = outline_opacity;
        self.0[3] = [
            style.embolden,
            style.slant,
            style.outline_thickness,
            style.anti_alias,
        ];
    }
}

/// The shader a draw piece uses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShaderVariant {
    FillColor,
    FillLinearGradient,
    FillRadialGradient,
    Line,
    Image,
    TextColor,
    TextColorOutline,
    TextGradient,
    TextGradientOutline,
}

impl ShaderVariant {
    /// Whether the piece binds its own texture (images, glyph atlases).
    pub fn has_texture(&self) -> bool {
        matches!(
            self,
            ShaderVariant::Image
                | ShaderVariant::TextColor
                | ShaderVariant::TextColorOutline
                | ShaderVariant::TextGradient
                | ShaderVariant::TextGradientOutline
        )
    }

    /// Whether the piece is text; text piece ranges count draw infos
    /// rather than indices.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ShaderVariant::TextColor
                | ShaderVariant::TextColorOutline
                | ShaderVariant::TextGradient
                | ShaderVariant::TextGradientOutline
        )
    }

    /// Which vertex pool the piece draws from.
    pub(crate) fn uses_image_vertices(&self) -> bool {
        *self == ShaderVariant::Image
    }
}

/// Distinguishes materials resolved from the image-local palette from
/// those in the shared palette.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MaterialSource {
    Shared,
    Local,
}

/// Kinds of materials a name can resolve to.
pub use crate::material::MaterialType;

/// A draw piece under construction.
#[derive(Debug)]
pub(crate) struct TempPiece<B: Backend> {
    pub variant: ShaderVariant,
    pub texture: Option<B::Texture>,
    pub material_source: MaterialSource,
    pub text_outline_material_source: MaterialSource,
    pub info_texture_index: u32,
    pub range: DrawIndexedRange,
}

impl<B: Backend> Clone for TempPiece<B> {
    fn clone(&self) -> Self {
        TempPiece {
            variant: self.variant,
            texture: self.texture.clone(),
            material_source: self.material_source,
            text_outline_material_source: self.text_outline_material_source,
            info_texture_index: self.info_texture_index,
            range: self.range,
        }
    }
}

/// Per-range information needed to draw a span of laid-out text.
#[derive(Clone, Debug)]
pub struct TextDrawInfo {
    pub layout: Arc<TextLayout>,
    pub first_character: u32,
    pub character_count: u32,
    pub fill_material: u16,
    pub outline_material: Option<u16>,
    /// Record index within the piece's bound info texture.
    pub info_index: u32,
    pub offset: Vector2<f32>,
}

/// High-water statistics kept for diagnostics.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArenaStats {
    pub peak_points: usize,
    pub peak_shape_vertices: usize,
    pub peak_indices: usize,
    pub peak_infos: usize,
    pub images_built: usize,
}

/// The scratch arena. Single-threaded; one per builder thread.
#[derive(Debug)]
pub struct VectorScratchData<B: Backend> {
    pub(crate) points: Vec<PointInfo>,
    pub(crate) last_start: usize,
    pub(crate) in_path: bool,
    pub(crate) path_simple: bool,
    pub(crate) path_transform: Matrix3<f32>,

    pub(crate) shape_vertices: Vec<ShapeVertex>,
    pub(crate) image_vertices: Vec<ImageVertex>,
    pub(crate) indices: Vec<u16>,
    pub(crate) infos: Vec<VectorInfo>,
    pub(crate) pieces: Vec<TempPiece<B>>,
    pub(crate) loop_points: Vec<Vector2<f32>>,

    pub(crate) text_layouts: Vec<Arc<TextLayout>>,
    pub(crate) text_draw_infos: Vec<TextDrawInfo>,
    pub(crate) text_styles: Vec<TextStyle>,

    pub(crate) temp_commands: Vec<VectorCommand<B>>,
    pub(crate) file_buffer: Vec<u8>,
    pub(crate) combined_buffer: Vec<u8>,

    pub(crate) polygon: SimplePolygon,
    pub(crate) simplifier: PolygonSimplifier,

    stats: ArenaStats,
}

impl<B: Backend> Default for VectorScratchData<B> {
    fn default() -> Self {
        VectorScratchData::new()
    }
}

impl<B: Backend> VectorScratchData<B> {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        VectorScratchData {
            points: Vec::new(),
            last_start: 0,
            in_path: false,
            path_simple: false,
            path_transform: Matrix3::identity(),
            shape_vertices: Vec::new(),
            image_vertices: Vec::new(),
            indices: Vec::new(),
            infos: Vec::new(),
            pieces: Vec::new(),
            loop_points: Vec::new(),
            text_layouts: Vec::new(),
            text_draw_infos: Vec::new(),
            text_styles: Vec::new(),
            temp_commands: Vec::new(),
            file_buffer: Vec::new(),
            combined_buffer: Vec::new(),
            polygon: SimplePolygon::new(),
            simplifier: PolygonSimplifier::new(),
            stats: ArenaStats::default(),
        }
    }

    /// Clear logical lengths, keeping capacity. Text layouts not claimed
    /// by an image are released here.
    pub fn reset(&mut self) {
        self.stats.peak_points = self.stats.peak_points.max(self.points.len());
        self.stats.peak_shape_vertices =
            self.stats.peak_shape_vertices.max(self.shape_vertices.len());
        self.stats.peak_indices = self.stats.peak_indices.max(self.indices.len());
        self.stats.peak_infos = self.stats.peak_infos.max(self.infos.len());

        self.points.clear();
        self.last_start = 0;
        self.in_path = false;
        self.path_simple = false;
        self.shape_vertices.clear();
        self.image_vertices.clear();
        self.indices.clear();
        self.infos.clear();
        self.pieces.clear();
        self.loop_points.clear();
        self.text_layouts.clear();
        self.text_draw_infos.clear();
        self.text_styles.clear();
        self.temp_commands.clear();
    }

    /// Diagnostics accumulated across resets.
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    pub(crate) fn note_image_built(&mut self) {
        self.stats.images_built += 1;
    }

    /// Append a path point, collapsing consecutive duplicates by OR-ing
    /// their flags.
    pub(crate) fn add_point(&mut self, point: Vector2<f32>, flags: PointFlags) {
        if let Some(last) = self.points.last_mut() {
            if last.point.distance2(point) <= POINT_EPSILON * POINT_EPSILON {
                last.flags |= flags;
                return;
            }
        }
        self.points.push(PointInfo { point, flags });
    }

    pub(crate) fn add_shape_vertex(&mut self, vertex: ShapeVertex) -> u32 {
        let index = self.shape_vertices.len() as u32;
        self.shape_vertices.push(vertex);
        index
    }

    pub(crate) fn add_image_vertex(&mut self, vertex: ImageVertex) -> u32 {
        let index = self.image_vertices.len() as u32;
        self.image_vertices.push(vertex);
        index
    }

    /// Append an index referencing a pool vertex.
    ///
    /// Vertices before the current piece's base are duplicated to the top
    /// of the pool. When the piece-relative index would exceed the 16-bit
    /// range, the piece is split: a new piece with the same key starts at
    /// this vertex, and the 1-2 trailing indices of an incomplete triangle
    /// migrate to it.
    pub(crate) fn add_index(&mut self, vertex: &mut u32) -> Result<()> {
        let piece_index = self.pieces.len() - 1;
        let piece = &self.pieces[piece_index];
        debug_assert!(!piece.variant.is_text());

        if *vertex < piece.range.vertex_offset {
            if piece.variant.uses_image_vertices() {
                let copy = self.image_vertices[*vertex as usize];
                *vertex = self.add_image_vertex(copy);
            } else {
                let copy = self.shape_vertices[*vertex as usize];
                *vertex = self.add_shape_vertex(copy);
            }
        }

        let piece = &self.pieces[piece_index];
        let mut index_value = *vertex - piece.range.vertex_offset;
        if index_value > MAX_VERTEX_INDEX {
            // Split: the 1-2 trailing indices of an incomplete triangle
            // move off the end of the stream, then a new piece with the
            // same key opens at this vertex and re-emits them against its
            // base, keeping piece index ranges consecutive.
            let old = self.pieces[piece_index].clone();
            let remaining = old.range.index_count % 3;
            let mut trailing = [0u32; 2];
            for slot in (0..remaining as usize).rev() {
                let stored = self.indices.pop().unwrap();
                trailing[slot] = stored as u32 + old.range.vertex_offset;
            }
            self.pieces[piece_index].range.index_count -= remaining;

            let mut piece = old;
            piece.range.index_count = 0;
            piece.range.first_index = self.indices.len() as u32;
            piece.range.vertex_offset = *vertex;
            self.pieces.push(piece);
            index_value = 0;

            for &trailing_vertex in &trailing[..remaining as usize] {
                let mut vertex_value = trailing_vertex;
                self.add_index(&mut vertex_value)?;
            }
            debug_assert_eq!(self.pieces.last().unwrap().range.index_count, remaining);
        }

        self.indices.push(index_value as u16);
        self.pieces.last_mut().unwrap().range.index_count += 1;
        Ok(())
    }

    fn push_info(&mut self, info: VectorInfo) -> Result<u32> {
        let index = self.infos.len() as u32;
        if index >= INFOS_PER_TEXTURE * INFOS_PER_TEXTURE {
            return Err(Error::IndexOutOfRange("too many info records"));
        }
        self.infos.push(info);
        Ok(index)
    }

    pub(crate) fn info_mut(&mut self, index: u32) -> &mut VectorInfo {
        &mut self.infos[index as usize]
    }

    /// Reuse the last piece when its key matches; otherwise start a new
    /// piece at the current high-water marks. A new piece is forced
    /// whenever the info index crosses an info texture boundary.
    fn add_piece(
        &mut self,
        variant: ShaderVariant,
        texture: Option<B::Texture>,
        info_index: u32,
        material_source: MaterialSource,
        text_outline_material_source: MaterialSource,
    ) {
        let force = info_index % INFOS_PER_TEXTURE == 0;
        if !force {
            if let Some(prev) = self.pieces.last() {
                if prev.variant == variant
                    && (!variant.has_texture() || prev.texture == texture)
                    && prev.material_source == material_source
                    && prev.text_outline_material_source == text_outline_material_source
                {
                    return;
                }
            }
        }

        let (first_index, vertex_offset) = if variant.is_text() {
            (self.text_draw_infos.len() as u32, 0)
        } else if variant.uses_image_vertices() {
            (self.indices.len() as u32, self.image_vertices.len() as u32)
        } else {
            (self.indices.len() as u32, self.shape_vertices.len() as u32)
        };

        self.pieces.push(TempPiece {
            variant,
            texture,
            material_source,
            text_outline_material_source,
            info_texture_index: info_index / INFOS_PER_TEXTURE,
            range: DrawIndexedRange {
                index_count: 0,
                instance_count: 1,
                first_index,
                vertex_offset,
                first_instance: 0,
            },
        });
    }

    /// Add an info record and piece for a stroke or fill. Returns the info
    /// index; the caller fills in bounds and dash data afterwards.
    pub(crate) fn add_shape_piece(
        &mut self,
        transform: &Matrix3<f32>,
        opacity: f32,
        line: bool,
        material_type: MaterialType,
        material_source: MaterialSource,
    ) -> Result<u32> {
        let variant = if line {
            ShaderVariant::Line
        } else {
            match material_type {
                MaterialType::Color => ShaderVariant::FillColor,
                MaterialType::LinearGradient => ShaderVariant::FillLinearGradient,
                MaterialType::RadialGradient => ShaderVariant::FillRadialGradient,
            }
        };
        let info_index = self.push_info(VectorInfo::new(transform, opacity))?;
        self.add_piece(
            variant,
            None,
            info_index,
            material_source,
            MaterialSource::Local,
        );
        Ok(info_index)
    }

    /// Add an info record and piece for a textured image quad.
    pub(crate) fn add_image_piece(
        &mut self,
        transform: &Matrix3<f32>,
        texture: B::Texture,
        opacity: f32,
        bounds: Box2,
    ) -> Result<u32> {
        let mut info = VectorInfo::new(transform, opacity);
        info.set_bounds(bounds);
        let info_index = self.push_info(info)?;
        self.add_piece(
            ShaderVariant::Image,
            Some(texture),
            info_index,
            MaterialSource::Local,
            MaterialSource::Local,
        );
        Ok(info_index)
    }

    /// Add the info record, piece and draw info for the first range of a
    /// text command.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_text_piece(
        &mut self,
        bounds: Box2,
        transform: &Matrix3<f32>,
        texture: B::Texture,
        fill_opacity: f32,
        outline_opacity: f32,
        layout: &Arc<TextLayout>,
        style: &TextStyle,
        offset: Vector2<f32>,
        fill_material: u16,
        outline_material: Option<u16>,
        variant: ShaderVariant,
        fill_source: MaterialSource,
        outline_source: MaterialSource,
    ) -> Result<()> {
        let mut info = VectorInfo::new(transform, fill_opacity);
        info.set_bounds(bounds);
        info.set_text_style(style, fill_opacity, outline_opacity);
        let info_index = self.push_info(info)?;
        self.add_piece(
            variant,
            Some(texture),
            info_index,
            fill_source,
            outline_source,
        );

        self.push_text_draw_info(layout, style, offset, fill_material, outline_material, info_index);
        Ok(())
    }

    /// Add a further text range. Compatible consecutive ranges reuse the
    /// previous info record; otherwise a new record (and possibly piece)
    /// is started, copying the previous transform and bounds.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_text_range(
        &mut self,
        fill_opacity: f32,
        outline_opacity: f32,
        layout: &Arc<TextLayout>,
        style: &TextStyle,
        offset: Vector2<f32>,
        fill_material: u16,
        outline_material: Option<u16>,
        variant: ShaderVariant,
        fill_source: MaterialSource,
        outline_source: MaterialSource,
    ) -> Result<()> {
        let prev_piece = self
            .pieces
            .last()
            .ok_or(Error::InvalidState("text range without a text piece"))?;
        debug_assert!(prev_piece.variant.is_text());
        let prev_info_index = self.infos.len() as u32 - 1;
        let prev_info = self.infos[prev_info_index as usize];

        let style_row = [
            style.embolden,
            style.slant,
            style.outline_thickness,
            style.anti_alias,
        ];
        let compatible = prev_info.0[2][2] == fill_opacity
            && prev_info.0[2][3] == outline_opacity
            && prev_info.0[3] == style_row
            && prev_piece.variant == variant
            && prev_piece.material_source == fill_source
            && prev_piece.text_outline_material_source == outline_source;

        if compatible {
            self.push_text_draw_info(
                layout,
                style,
                offset,
                fill_material,
                outline_material,
                prev_info_index,
            );
            return Ok(());
        }

        let mut info = prev_info;
        info.set_text_style(style, fill_opacity, outline_opacity);
        let texture = prev_piece.texture.clone();
        let info_index = self.push_info(info)?;
        self.add_piece(variant, texture, info_index, fill_source, outline_source);
        self.push_text_draw_info(layout, style, offset, fill_material, outline_material, info_index);
        Ok(())
    }

    fn push_text_draw_info(
        &mut self,
        layout: &Arc<TextLayout>,
        style: &TextStyle,
        offset: Vector2<f32>,
        fill_material: u16,
        outline_material: Option<u16>,
        info_index: u32,
    ) {
        let draw_info_index = self.text_draw_infos.len() as u32;
        self.text_draw_infos.push(TextDrawInfo {
            layout: layout.clone(),
            first_character: style.start,
            character_count: style.count,
            fill_material,
            outline_material,
            info_index: info_index % INFOS_PER_TEXTURE,
            offset,
        });
        let piece = self.pieces.last_mut().unwrap();
        debug_assert_eq!(
            piece.range.first_index + piece.range.index_count,
            draw_info_index
        );
        piece.range.index_count += 1;
    }

    /// Whether any geometry was emitted.
    pub(crate) fn has_geometry(&self) -> bool {
        !self.shape_vertices.is_empty() || !self.image_vertices.is_empty() || !self.indices.is_empty()
    }

    /// Assemble the combined GPU buffer: shape vertices, then image
    /// vertices, then indices, padded to 4-byte alignment. Returns
    /// `(image vertex offset, index offset)`.
    pub(crate) fn build_combined_buffer(&mut self) -> (usize, usize) {
        let shape_bytes: &[u8] = bytemuck::cast_slice(&self.shape_vertices);
        let image_bytes: &[u8] = bytemuck::cast_slice(&self.image_vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&self.indices);

        self.combined_buffer.clear();
        self.combined_buffer.extend_from_slice(shape_bytes);
        let image_offset = self.combined_buffer.len();
        self.combined_buffer.extend_from_slice(image_bytes);
        let index_offset = self.combined_buffer.len();
        self.combined_buffer.extend_from_slice(index_bytes);
        while self.combined_buffer.len() % 4 != 0 {
            self.combined_buffer.push(0);
        }
        (image_offset, index_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use cgmath::SquareMatrix;

    fn scratch() -> VectorScratchData<MockBackend> {
        VectorScratchData::new()
    }

    fn shape_vertex(x: f32, y: f32) -> ShapeVertex {
        ShapeVertex {
            position: [x, y, 0.0, 0.0],
            shape_index: 0,
            material_index: 0,
        }
    }

    #[test]
    fn vector_info_is_one_texel_row_block() {
        assert_eq!(std::mem::size_of::<VectorInfo>(), 64);
        assert_eq!(std::mem::size_of::<ShapeVertex>(), 20);
        assert_eq!(std::mem::size_of::<ImageVertex>(), 16);
    }

    #[test]
    fn nearby_points_collapse_flags() {
        let mut data = scratch();
        data.add_point(Vector2::new(1.0, 1.0), PointFlags::CORNER);
        data.add_point(Vector2::new(1.0 + 4e-6, 1.0), PointFlags::END);
        assert_eq!(data.points.len(), 1);
        assert_eq!(data.points[0].flags, PointFlags::CORNER | PointFlags::END);

        data.add_point(Vector2::new(2.0, 1.0), PointFlags::empty());
        assert_eq!(data.points.len(), 2);
    }

    #[test]
    fn pieces_coalesce_on_matching_key() {
        let mut data = scratch();
        let transform = Matrix3::identity();
        data.add_shape_piece(&transform, 1.0, false, MaterialType::Color, MaterialSource::Shared)
            .unwrap();
        data.add_shape_piece(&transform, 0.5, false, MaterialType::Color, MaterialSource::Shared)
            .unwrap();
        assert_eq!(data.pieces.len(), 1);
        assert_eq!(data.infos.len(), 2);

        // A different key starts a new piece.
        data.add_shape_piece(&transform, 1.0, true, MaterialType::Color, MaterialSource::Shared)
            .unwrap();
        assert_eq!(data.pieces.len(), 2);

        // A different material source starts a new piece.
        data.add_shape_piece(&transform, 1.0, true, MaterialType::Color, MaterialSource::Local)
            .unwrap();
        assert_eq!(data.pieces.len(), 3);
    }

    #[test]
    fn info_texture_boundary_forces_a_piece() {
        let mut data = scratch();
        let transform = Matrix3::identity();
        for _ in 0..INFOS_PER_TEXTURE {
            data.add_shape_piece(
                &transform,
                1.0,
                false,
                MaterialType::Color,
                MaterialSource::Shared,
            )
            .unwrap();
        }
        assert_eq!(data.pieces.len(), 1);
        assert_eq!(data.pieces[0].info_texture_index, 0);

        // Record 1024 lands in the second texture and must split even
        // though the key matches.
        data.add_shape_piece(&transform, 1.0, false, MaterialType::Color, MaterialSource::Shared)
            .unwrap();
        assert_eq!(data.pieces.len(), 2);
        assert_eq!(data.pieces[1].info_texture_index, 1);
    }

    #[test]
    fn index_overflow_splits_piece_and_migrates_triangle() {
        let mut data = scratch();
        data.add_shape_piece(
            &Matrix3::identity(),
            1.0,
            false,
            MaterialType::Color,
            MaterialSource::Shared,
        )
        .unwrap();

        // Fill the pool past the 16-bit range.
        for i in 0..(MAX_VERTEX_INDEX + 3) {
            data.add_shape_vertex(shape_vertex(i as f32, 0.0));
        }

        // A triangle whose last index exceeds the range: the first two
        // indices land in piece 0, then the third forces a split and the
        // two trailing indices migrate.
        let mut a = MAX_VERTEX_INDEX - 1;
        let mut b = MAX_VERTEX_INDEX;
        let mut c = MAX_VERTEX_INDEX + 1;
        data.add_index(&mut a).unwrap();
        data.add_index(&mut b).unwrap();
        data.add_index(&mut c).unwrap();

        assert_eq!(data.pieces.len(), 2);
        let old = &data.pieces[0].range;
        let new = &data.pieces[1].range;
        // The incomplete triangle moved entirely into the new piece.
        assert_eq!(old.index_count, 0);
        assert_eq!(new.index_count, 3);
        assert!(new.vertex_offset > old.vertex_offset);

        // Every stored index stays within the 16-bit limit relative to
        // its piece, and re-emitted vertices resolve to the same
        // positions.
        for piece in &data.pieces {
            let range = &piece.range;
            for i in 0..range.index_count {
                let stored = data.indices[(range.first_index + i) as usize] as u32;
                assert!(stored <= MAX_VERTEX_INDEX);
                assert!((stored + range.vertex_offset as u32) < data.shape_vertices.len() as u32);
            }
        }
        let positions: Vec<f32> = (0..3)
            .map(|i| {
                let range = &data.pieces[1].range;
                let stored = data.indices[(range.first_index + i) as usize] as u32;
                data.shape_vertices[(stored + range.vertex_offset) as usize].position[0]
            })
            .collect();
        assert_eq!(
            positions,
            vec![
                (MAX_VERTEX_INDEX - 1) as f32,
                MAX_VERTEX_INDEX as f32,
                (MAX_VERTEX_INDEX + 1) as f32
            ]
        );
    }

    #[test]
    fn vertices_below_piece_base_are_duplicated() {
        let mut data = scratch();
        data.add_shape_vertex(shape_vertex(7.0, 0.0));
        // Piece starts after the first vertex.
        data.add_shape_piece(
            &Matrix3::identity(),
            1.0,
            false,
            MaterialType::Color,
            MaterialSource::Shared,
        )
        .unwrap();
        data.add_shape_vertex(shape_vertex(8.0, 0.0));

        let mut early = 0;
        data.add_index(&mut early).unwrap();
        // The early vertex was copied to the top of the pool.
        assert_eq!(early, 2);
        assert_eq!(data.shape_vertices[2].position[0], 7.0);
    }

    #[test]
    fn combined_buffer_layout() {
        let mut data = scratch();
        data.add_shape_piece(
            &Matrix3::identity(),
            1.0,
            false,
            MaterialType::Color,
            MaterialSource::Shared,
        )
        .unwrap();
        for i in 0..3 {
            data.add_shape_vertex(shape_vertex(i as f32, 0.0));
        }
        for mut i in 0..3u32 {
            data.add_index(&mut i).unwrap();
        }
        let (image_offset, index_offset) = data.build_combined_buffer();
        assert_eq!(image_offset, 3 * std::mem::size_of::<ShapeVertex>());
        assert_eq!(index_offset, image_offset);
        // 3 u16 indices pad to 4 bytes.
        assert_eq!(data.combined_buffer.len(), index_offset + 8);
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut data = scratch();
        for i in 0..100 {
            data.add_point(Vector2::new(i as f32, 0.0), PointFlags::empty());
        }
        let capacity = data.points.capacity();
        data.reset();
        assert!(data.points.is_empty());
        assert_eq!(data.points.capacity(), capacity);
        assert!(data.stats().peak_points >= 100);
    }
}
