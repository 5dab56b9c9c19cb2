//! Text shaping interface and the text emitter.
//!
//! Glyph rasterization and layout live outside this crate; the emitter
//! consumes them through the [`Font`] trait, which hands back an owned
//! [`TextLayout`]. Layouts are pooled in the scratch data and handed to
//! the finished image, which keeps them alive for as long as its draw
//! pieces reference them.

use std::fmt;
use std::sync::Arc;

use cgmath::Vector2;

use hal::{Backend, Error, Result};

use crate::command::{TextAlign, TextCommand, TextRangeCommand, VectorCommand};
use crate::geom::Box2;
use crate::material::{self, MaterialSet, MaterialType};
use crate::scratch::{MaterialSource, ShaderVariant, VectorScratchData};

/// Resolved style of one character range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// First character of the range.
    pub start: u32,
    /// Number of characters.
    pub count: u32,
    /// Font size in image units.
    pub size: f32,
    pub embolden: f32,
    pub slant: f32,
    pub outline_position: f32,
    pub outline_thickness: f32,
    /// Anti-alias factor, filled in by the font's hinting pass.
    pub anti_alias: f32,
    pub vertical_offset: f32,
}

/// One glyph placed by layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedGlyph {
    /// Glyph identifier inside the font.
    pub glyph: u32,
    /// Index of the source character that produced the glyph.
    pub character: u32,
    /// Pen position of the glyph.
    pub position: Vector2<f32>,
    /// Quad of the glyph relative to the pen position.
    pub geometry: Box2,
    /// Texture coordinates inside the font texture.
    pub tex_coords: Box2,
}

/// An owned, laid-out text object.
#[derive(Clone, Debug)]
pub struct TextLayout {
    pub glyphs: Vec<PositionedGlyph>,
    /// Union bounds of all glyph quads.
    pub bounds: Box2,
}

/// External glyph shaping and layout.
pub trait Font<B: Backend>: fmt::Debug + Send + Sync {
    /// The glyph atlas texture draws sample from.
    fn texture(&self) -> &B::Texture;

    /// Adjust a style's hinting and anti-aliasing for the display scale.
    fn apply_hinting(&self, style: &mut TextStyle, display_scale: f32, fuzziness: f32);

    /// Shape and lay out a string under per-range styles.
    fn shape(
        &self,
        text: &str,
        styles: &[TextStyle],
        alignment: TextAlign,
        max_length: f32,
        line_height: f32,
    ) -> Result<TextLayout>;
}

fn pick_variant(
    fill_type: MaterialType,
    outline: Option<MaterialType>,
) -> ShaderVariant {
    let gradient = fill_type != MaterialType::Color
        || outline.map_or(false, |t| t != MaterialType::Color);
    match (gradient, outline.is_some()) {
        (false, false) => ShaderVariant::TextColor,
        (false, true) => ShaderVariant::TextColorOutline,
        (true, false) => ShaderVariant::TextGradient,
        (true, true) => ShaderVariant::TextGradientOutline,
    }
}

/// Emit a text command with its ranges.
pub(crate) fn add_text<B: Backend>(
    scratch: &mut VectorScratchData<B>,
    shared_materials: &MaterialSet<B>,
    local_materials: &MaterialSet<B>,
    command: &TextCommand<B>,
    ranges: &[VectorCommand<B>],
    pixel_size: f32,
) -> Result<()> {
    if ranges.len() != command.range_count as usize {
        return Err(Error::InvalidArg("text range count mismatch"));
    }

    // Build the style array, letting the font adjust hinting per range.
    scratch.text_styles.clear();
    let mut range_commands: Vec<&TextRangeCommand> = Vec::with_capacity(ranges.len());
    for range in ranges {
        let range = match range {
            VectorCommand::TextRange(range) => range,
            _ => return Err(Error::InvalidArg("vector command isn't a text range")),
        };
        let mut style = TextStyle {
            start: range.start,
            count: range.count,
            size: range.size,
            embolden: range.embolden,
            slant: range.slant,
            outline_position: range.embolden,
            outline_thickness: range.outline_width,
            anti_alias: 1.0,
            vertical_offset: 0.0,
        };
        command
            .font
            .apply_hinting(&mut style, 1.0 / pixel_size, range.fuzziness);
        scratch.text_styles.push(style);
        range_commands.push(range);
    }

    let styles = scratch.text_styles.clone();
    let layout = Arc::new(command.font.shape(
        &command.text,
        &styles,
        command.alignment,
        command.max_length,
        command.line_height,
    )?);
    scratch.text_layouts.push(layout.clone());

    for (i, range) in range_commands.iter().enumerate() {
        let (fill_index, fill_type, fill_source) =
            material::find_material(shared_materials, local_materials, &range.fill_material)?;
        let outline = if range.outline_material.is_empty() {
            None
        } else {
            Some(material::find_material(
                shared_materials,
                local_materials,
                &range.outline_material,
            )?)
        };
        let variant = pick_variant(fill_type, outline.map(|(_, t, _)| t));
        let outline_source = outline.map_or(MaterialSource::Local, |(_, _, s)| s);
        let texture = command.font.texture().clone();

        if i == 0 {
            scratch.add_text_piece(
                layout.bounds,
                &command.transform,
                texture,
                range.fill_opacity,
                range.outline_opacity,
                &layout,
                &styles[i],
                range.position_offset,
                fill_index as u16,
                outline.map(|(index, _, _)| index as u16),
                variant,
                fill_source,
                outline_source,
            )?;
        } else {
            scratch.add_text_range(
                range.fill_opacity,
                range.outline_opacity,
                &layout,
                &styles[i],
                range.position_offset,
                fill_index as u16,
                outline.map(|(index, _, _)| index as u16),
                variant,
                fill_source,
                outline_source,
            )?;
        }
    }
    Ok(())
}
