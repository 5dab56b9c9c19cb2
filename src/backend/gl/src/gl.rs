//! The driver interface.
//!
//! The backend never links a GL loader directly; every driver entry point
//! it needs is a method of the [`Context`] trait, using the raw GL enum
//! vocabulary. A real implementation forwards to a loaded function table;
//! [`MockContext`] records each call as a string so the command and state
//! machinery can be exercised without a GPU.

use std::fmt::Debug;

pub type Enum = u32;
pub type Object = u32;
pub type SyncHandle = u64;

/// Raw GL enums used across the backend. Only the values the backend
/// actually passes through the interface are defined.
#[allow(missing_docs)]
pub mod consts {
    pub const NONE: u32 = 0;

    // Buffer targets.
    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
    pub const PIXEL_PACK_BUFFER: u32 = 0x88EB;
    pub const PIXEL_UNPACK_BUFFER: u32 = 0x88EC;
    pub const UNIFORM_BUFFER: u32 = 0x8A11;
    pub const TEXTURE_BUFFER: u32 = 0x8C2A;
    pub const COPY_READ_BUFFER: u32 = 0x8F36;
    pub const COPY_WRITE_BUFFER: u32 = 0x8F37;
    pub const DRAW_INDIRECT_BUFFER: u32 = 0x8F3F;
    pub const SHADER_STORAGE_BUFFER: u32 = 0x90D2;
    pub const DISPATCH_INDIRECT_BUFFER: u32 = 0x90EE;
    pub const QUERY_BUFFER: u32 = 0x9192;

    // Buffer usage.
    pub const STREAM_DRAW: u32 = 0x88E0;
    pub const STREAM_READ: u32 = 0x88E1;
    pub const STATIC_DRAW: u32 = 0x88E4;
    pub const STATIC_READ: u32 = 0x88E5;
    pub const DYNAMIC_DRAW: u32 = 0x88E8;
    pub const DYNAMIC_READ: u32 = 0x88E9;

    // Map access bits.
    pub const MAP_READ_BIT: u32 = 0x1;
    pub const MAP_WRITE_BIT: u32 = 0x2;
    pub const MAP_INVALIDATE_BUFFER_BIT: u32 = 0x8;
    pub const MAP_FLUSH_EXPLICIT_BIT: u32 = 0x10;
    pub const MAP_UNSYNCHRONIZED_BIT: u32 = 0x20;
    pub const MAP_PERSISTENT_BIT: u32 = 0x40;
    pub const MAP_COHERENT_BIT: u32 = 0x80;

    // Texture targets.
    pub const TEXTURE_1D: u32 = 0x0DE0;
    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE_3D: u32 = 0x806F;
    pub const TEXTURE_1D_ARRAY: u32 = 0x8C18;
    pub const TEXTURE_2D_ARRAY: u32 = 0x8C1A;
    pub const TEXTURE_CUBE_MAP: u32 = 0x8513;
    pub const TEXTURE_2D_MULTISAMPLE: u32 = 0x9100;
    pub const TEXTURE0: u32 = 0x84C0;

    // Texture parameters.
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;
    pub const TEXTURE_MAX_LEVEL: u32 = 0x813D;
    pub const TEXTURE_COMPARE_MODE: u32 = 0x884C;
    pub const TEXTURE_COMPARE_FUNC: u32 = 0x884D;
    pub const COMPARE_REF_TO_TEXTURE: u32 = 0x884E;
    pub const NEAREST: u32 = 0x2600;
    pub const LINEAR: u32 = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;
    pub const REPEAT: u32 = 0x2901;
    pub const MIRRORED_REPEAT: u32 = 0x8370;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const CLAMP_TO_BORDER: u32 = 0x812D;

    // Framebuffer targets and attachments.
    pub const FRAMEBUFFER: u32 = 0x8D40;
    pub const READ_FRAMEBUFFER: u32 = 0x8CA8;
    pub const DRAW_FRAMEBUFFER: u32 = 0x8CA9;
    pub const RENDERBUFFER: u32 = 0x8D41;
    pub const COLOR_ATTACHMENT0: u32 = 0x8CE0;
    pub const DEPTH_ATTACHMENT: u32 = 0x8D00;
    pub const STENCIL_ATTACHMENT: u32 = 0x8D20;
    pub const DEPTH_STENCIL_ATTACHMENT: u32 = 0x821A;
    pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;
    pub const BACK: u32 = 0x0405;
    pub const BACK_LEFT: u32 = 0x0402;
    pub const COLOR_BUFFER_BIT: u32 = 0x4000;
    pub const DEPTH_BUFFER_BIT: u32 = 0x100;
    pub const STENCIL_BUFFER_BIT: u32 = 0x400;

    // Clear buffer selectors.
    pub const COLOR: u32 = 0x1800;
    pub const DEPTH: u32 = 0x1801;
    pub const STENCIL: u32 = 0x1802;
    pub const DEPTH_STENCIL: u32 = 0x84F9;

    // Primitive modes.
    pub const POINTS: u32 = 0x0;
    pub const LINES: u32 = 0x1;
    pub const LINE_STRIP: u32 = 0x3;
    pub const TRIANGLES: u32 = 0x4;
    pub const TRIANGLE_STRIP: u32 = 0x5;
    pub const TRIANGLE_FAN: u32 = 0x6;
    pub const PATCHES: u32 = 0xE;

    // Data types.
    pub const BYTE: u32 = 0x1400;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const SHORT: u32 = 0x1402;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const INT: u32 = 0x1404;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;
    pub const UNSIGNED_SHORT_5_6_5: u32 = 0x8363;
    pub const UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
    pub const UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
    pub const UNSIGNED_INT_2_10_10_10_REV: u32 = 0x8368;
    pub const UNSIGNED_INT_10F_11F_11F_REV: u32 = 0x8C3B;
    pub const UNSIGNED_INT_5_9_9_9_REV: u32 = 0x8C3E;
    pub const UNSIGNED_INT_24_8: u32 = 0x84FA;
    pub const FLOAT_32_UNSIGNED_INT_24_8_REV: u32 = 0x8DAD;

    // External formats.
    pub const RED: u32 = 0x1903;
    pub const RG: u32 = 0x8227;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const BGRA: u32 = 0x80E1;
    pub const RED_INTEGER: u32 = 0x8D94;
    pub const RG_INTEGER: u32 = 0x8228;
    pub const RGB_INTEGER: u32 = 0x8D98;
    pub const RGBA_INTEGER: u32 = 0x8D99;
    pub const DEPTH_COMPONENT: u32 = 0x1902;
    pub const STENCIL_INDEX: u32 = 0x1901;

    // Internal formats.
    pub const R8: u32 = 0x8229;
    pub const R8_SNORM: u32 = 0x8F94;
    pub const R8I: u32 = 0x8231;
    pub const R8UI: u32 = 0x8232;
    pub const RG8: u32 = 0x822B;
    pub const RG8_SNORM: u32 = 0x8F95;
    pub const RG8I: u32 = 0x8237;
    pub const RG8UI: u32 = 0x8238;
    pub const RGB8: u32 = 0x8051;
    pub const RGB8_SNORM: u32 = 0x8F96;
    pub const RGB8I: u32 = 0x8D8F;
    pub const RGB8UI: u32 = 0x8D7D;
    pub const SRGB8: u32 = 0x8C41;
    pub const RGBA8: u32 = 0x8058;
    pub const RGBA8_SNORM: u32 = 0x8F97;
    pub const RGBA8I: u32 = 0x8D8E;
    pub const RGBA8UI: u32 = 0x8D7C;
    pub const SRGB8_ALPHA8: u32 = 0x8C43;
    pub const R16: u32 = 0x822A;
    pub const R16_SNORM: u32 = 0x8F98;
    pub const R16I: u32 = 0x8233;
    pub const R16UI: u32 = 0x8234;
    pub const R16F: u32 = 0x822D;
    pub const RG16: u32 = 0x822C;
    pub const RG16_SNORM: u32 = 0x8F99;
    pub const RG16I: u32 = 0x8239;
    pub const RG16UI: u32 = 0x823A;
    pub const RG16F: u32 = 0x822F;
    pub const RGB16: u32 = 0x8054;
    pub const RGB16_SNORM: u32 = 0x8F9A;
    pub const RGB16I: u32 = 0x8D89;
    pub const RGB16UI: u32 = 0x8D77;
    pub const RGB16F: u32 = 0x881B;
    pub const RGBA16: u32 = 0x805B;
    pub const RGBA16_SNORM: u32 = 0x8F9B;
    pub const RGBA16I: u32 = 0x8D88;
    pub const RGBA16UI: u32 = 0x8D76;
    pub const RGBA16F: u32 = 0x881A;
    pub const R32I: u32 = 0x8235;
    pub const R32UI: u32 = 0x8236;
    pub const R32F: u32 = 0x822E;
    pub const RG32I: u32 = 0x823B;
    pub const RG32UI: u32 = 0x823C;
    pub const RG32F: u32 = 0x8230;
    pub const RGB32I: u32 = 0x8D83;
    pub const RGB32UI: u32 = 0x8D71;
    pub const RGB32F: u32 = 0x8815;
    pub const RGBA32I: u32 = 0x8D82;
    pub const RGBA32UI: u32 = 0x8D70;
    pub const RGBA32F: u32 = 0x8814;
    pub const RGB565: u32 = 0x8D62;
    pub const RGB5_A1: u32 = 0x8057;
    pub const RGBA4: u32 = 0x8056;
    pub const RGB10_A2: u32 = 0x8059;
    pub const R11F_G11F_B10F: u32 = 0x8C3A;
    pub const RGB9_E5: u32 = 0x8C3D;
    pub const DEPTH_COMPONENT16: u32 = 0x81A5;
    pub const DEPTH_COMPONENT32F: u32 = 0x8CAC;
    pub const DEPTH24_STENCIL8: u32 = 0x88F0;
    pub const DEPTH32F_STENCIL8: u32 = 0x8CAD;
    pub const STENCIL_INDEX8: u32 = 0x8D48;
    pub const COMPRESSED_RGB_S3TC_DXT1: u32 = 0x83F0;
    pub const COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
    pub const COMPRESSED_RGBA_S3TC_DXT3: u32 = 0x83F2;
    pub const COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;
    pub const COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
    pub const COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
    pub const COMPRESSED_RGB8_ETC2: u32 = 0x9274;
    pub const COMPRESSED_SRGB8_ETC2: u32 = 0x9275;
    pub const COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9276;
    pub const COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
    pub const COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: u32 = 0x9279;

    // Capabilities.
    pub const CULL_FACE: u32 = 0x0B44;
    pub const DEPTH_TEST: u32 = 0x0B71;
    pub const STENCIL_TEST: u32 = 0x0B90;
    pub const BLEND: u32 = 0x0BE2;
    pub const SCISSOR_TEST: u32 = 0x0C11;
    pub const POLYGON_OFFSET_FILL: u32 = 0x8037;
    pub const POLYGON_OFFSET_LINE: u32 = 0x2A02;
    pub const POLYGON_OFFSET_POINT: u32 = 0x2A01;
    pub const MULTISAMPLE: u32 = 0x809D;
    pub const SAMPLE_ALPHA_TO_COVERAGE: u32 = 0x809E;
    pub const SAMPLE_ALPHA_TO_ONE: u32 = 0x809F;
    pub const SAMPLE_MASK: u32 = 0x8E51;
    pub const DEPTH_CLAMP: u32 = 0x864F;
    pub const RASTERIZER_DISCARD: u32 = 0x8C89;
    pub const DEPTH_BOUNDS_TEST_EXT: u32 = 0x8890;
    pub const CLIP_DISTANCE0: u32 = 0x3000;
    pub const TEXTURE_CUBE_MAP_SEAMLESS: u32 = 0x884F;

    // Face/winding/polygon modes.
    pub const FRONT: u32 = 0x0404;
    pub const FRONT_AND_BACK: u32 = 0x0408;
    pub const CW: u32 = 0x0900;
    pub const CCW: u32 = 0x0901;
    pub const POINT: u32 = 0x1B00;
    pub const LINE: u32 = 0x1B01;
    pub const FILL: u32 = 0x1B02;

    // Comparison functions.
    pub const NEVER: u32 = 0x200;
    pub const LESS: u32 = 0x201;
    pub const EQUAL: u32 = 0x202;
    pub const LEQUAL: u32 = 0x203;
    pub const GREATER: u32 = 0x204;
    pub const NOTEQUAL: u32 = 0x205;
    pub const GEQUAL: u32 = 0x206;
    pub const ALWAYS: u32 = 0x207;

    // Stencil ops.
    pub const KEEP: u32 = 0x1E00;
    pub const ZERO: u32 = 0x0;
    pub const REPLACE: u32 = 0x1E01;
    pub const INCR: u32 = 0x1E02;
    pub const DECR: u32 = 0x1E03;
    pub const INVERT: u32 = 0x150A;
    pub const INCR_WRAP: u32 = 0x8507;
    pub const DECR_WRAP: u32 = 0x8508;

    // Blend factors and equations.
    pub const ONE: u32 = 0x1;
    pub const SRC_COLOR: u32 = 0x300;
    pub const ONE_MINUS_SRC_COLOR: u32 = 0x301;
    pub const SRC_ALPHA: u32 = 0x302;
    pub const ONE_MINUS_SRC_ALPHA: u32 = 0x303;
    pub const DST_ALPHA: u32 = 0x304;
    pub const ONE_MINUS_DST_ALPHA: u32 = 0x305;
    pub const DST_COLOR: u32 = 0x306;
    pub const ONE_MINUS_DST_COLOR: u32 = 0x307;
    pub const SRC_ALPHA_SATURATE: u32 = 0x308;
    pub const CONSTANT_COLOR: u32 = 0x8001;
    pub const ONE_MINUS_CONSTANT_COLOR: u32 = 0x8002;
    pub const FUNC_ADD: u32 = 0x8006;
    pub const MIN: u32 = 0x8007;
    pub const MAX: u32 = 0x8008;
    pub const FUNC_SUBTRACT: u32 = 0x800A;
    pub const FUNC_REVERSE_SUBTRACT: u32 = 0x800B;

    // Patch parameter.
    pub const PATCH_VERTICES: u32 = 0x8E72;

    // Sync.
    pub const SYNC_GPU_COMMANDS_COMPLETE: u32 = 0x9117;
    pub const ALREADY_SIGNALED: u32 = 0x911A;
    pub const TIMEOUT_EXPIRED: u32 = 0x911B;
    pub const CONDITION_SATISFIED: u32 = 0x911C;
    pub const WAIT_FAILED: u32 = 0x911D;

    // Queries.
    pub const SAMPLES_PASSED: u32 = 0x8914;
    pub const ANY_SAMPLES_PASSED: u32 = 0x8C2F;
    pub const TIMESTAMP: u32 = 0x8E28;

    // Memory barrier bits.
    pub const VERTEX_ATTRIB_ARRAY_BARRIER_BIT: u32 = 0x1;
    pub const ELEMENT_ARRAY_BARRIER_BIT: u32 = 0x2;
    pub const UNIFORM_BARRIER_BIT: u32 = 0x4;
    pub const TEXTURE_FETCH_BARRIER_BIT: u32 = 0x8;
    pub const SHADER_IMAGE_ACCESS_BARRIER_BIT: u32 = 0x20;
    pub const COMMAND_BARRIER_BIT: u32 = 0x40;
    pub const PIXEL_BUFFER_BARRIER_BIT: u32 = 0x80;
    pub const TEXTURE_UPDATE_BARRIER_BIT: u32 = 0x100;
    pub const BUFFER_UPDATE_BARRIER_BIT: u32 = 0x200;
    pub const FRAMEBUFFER_BARRIER_BIT: u32 = 0x400;
    pub const ALL_BARRIER_BITS: u32 = 0xFFFFFFFF;

    // Strings and limits.
    pub const VERSION: u32 = 0x1F02;
    pub const EXTENSIONS: u32 = 0x1F03;
    pub const MAX_TEXTURE_SIZE: u32 = 0x0D33;
    pub const MAX_CLIP_DISTANCES: u32 = 0x0D32;
    pub const MAX_COLOR_ATTACHMENTS: u32 = 0x8CDF;
    pub const MAX_SAMPLES: u32 = 0x8D57;
    pub const ALIASED_LINE_WIDTH_RANGE: u32 = 0x846E;

    // Errors.
    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x500;
    pub const INVALID_VALUE: u32 = 0x501;
    pub const INVALID_OPERATION: u32 = 0x502;
    pub const OUT_OF_MEMORY: u32 = 0x505;
}

/// Result of a client sync wait.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WaitStatus {
    /// The sync was already signaled or became signaled in time.
    Signaled,
    /// The timeout expired first.
    TimedOut,
    /// The wait failed in the driver.
    Failed,
}

/// The driver entry points the backend records against.
///
/// Object handles are raw driver names (`0` = none). The trait is written
/// in the vocabulary of the GL enums in [`consts`]; implementations outside
/// of tests forward each method to the loaded driver table verbatim.
#[allow(missing_docs)]
pub trait Context: Debug + Send + Sync + 'static {
    // Object lifetime.
    fn create_buffer(&self) -> Object;
    fn delete_buffer(&self, buffer: Object);
    fn create_texture(&self) -> Object;
    fn delete_texture(&self, texture: Object);
    fn create_renderbuffer(&self) -> Object;
    fn delete_renderbuffer(&self, renderbuffer: Object);
    fn create_framebuffer(&self) -> Object;
    fn delete_framebuffer(&self, framebuffer: Object);
    fn create_vertex_array(&self) -> Object;
    fn delete_vertex_array(&self, vao: Object);
    fn create_query(&self) -> Object;
    fn delete_query(&self, query: Object);
    fn create_sampler(&self) -> Object;
    fn delete_sampler(&self, sampler: Object);
    fn create_program(&self, binary: &[u8]) -> Object;
    fn delete_program(&self, program: Object);

    // Buffers.
    fn bind_buffer(&self, target: Enum, buffer: Object);
    fn bind_buffer_range(&self, target: Enum, index: u32, buffer: Object, offset: isize, size: isize);
    fn buffer_data(&self, target: Enum, size: usize, data: Option<&[u8]>, usage: Enum);
    fn buffer_sub_data(&self, target: Enum, offset: isize, data: &[u8]);
    fn get_buffer_sub_data(&self, target: Enum, offset: isize, out: &mut [u8]);
    fn copy_buffer_sub_data(
        &self,
        src_target: Enum,
        dst_target: Enum,
        src_offset: isize,
        dst_offset: isize,
        size: isize,
    );
    fn map_buffer_range(&self, target: Enum, offset: isize, length: usize, access: u32) -> *mut u8;
    fn flush_mapped_buffer_range(&self, target: Enum, offset: isize, length: usize);
    fn unmap_buffer(&self, target: Enum) -> bool;

    // Textures and samplers.
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: Enum, texture: Object);
    fn tex_image_2d(
        &self,
        target: Enum,
        level: i32,
        internal_format: Enum,
        width: i32,
        height: i32,
        format: Enum,
        data_type: Enum,
        data: Option<&[u8]>,
    );
    fn tex_image_3d(
        &self,
        target: Enum,
        level: i32,
        internal_format: Enum,
        width: i32,
        height: i32,
        depth: i32,
        format: Enum,
        data_type: Enum,
        data: Option<&[u8]>,
    );
    fn tex_sub_image_2d(
        &self,
        target: Enum,
        level: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: Enum,
        data_type: Enum,
        data: Option<&[u8]>,
    );
    fn tex_sub_image_3d(
        &self,
        target: Enum,
        level: i32,
        x: i32,
        y: i32,
        z: i32,
        width: i32,
        height: i32,
        depth: i32,
        format: Enum,
        data_type: Enum,
        data: Option<&[u8]>,
    );
    fn tex_sub_image_2d_pbo(
        &self,
        target: Enum,
        level: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: Enum,
        data_type: Enum,
        unpack_offset: usize,
    );
    fn tex_sub_image_3d_pbo(
        &self,
        target: Enum,
        level: i32,
        x: i32,
        y: i32,
        z: i32,
        width: i32,
        height: i32,
        depth: i32,
        format: Enum,
        data_type: Enum,
        unpack_offset: usize,
    );
    fn copy_image_sub_data(
        &self,
        src: Object,
        src_target: Enum,
        src_level: i32,
        src_x: i32,
        src_y: i32,
        src_z: i32,
        dst: Object,
        dst_target: Enum,
        dst_level: i32,
        dst_x: i32,
        dst_y: i32,
        dst_z: i32,
        width: i32,
        height: i32,
        depth: i32,
    );
    fn generate_mipmap(&self, target: Enum);
    fn tex_parameter_i(&self, target: Enum, pname: Enum, value: i32);
    fn tex_buffer_range(&self, internal_format: Enum, buffer: Object, offset: isize, size: isize);
    fn bind_sampler(&self, unit: u32, sampler: Object);
    fn sampler_parameter_i(&self, sampler: Object, pname: Enum, value: i32);
    fn read_pixels(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: Enum,
        data_type: Enum,
        pack_offset: usize,
    );

    // Framebuffers and renderbuffers.
    fn bind_framebuffer(&self, target: Enum, framebuffer: Object);
    fn framebuffer_texture(&self, target: Enum, attachment: Enum, texture: Object, level: i32);
    fn framebuffer_texture_layer(
        &self,
        target: Enum,
        attachment: Enum,
        texture: Object,
        level: i32,
        layer: i32,
    );
    fn framebuffer_renderbuffer(&self, target: Enum, attachment: Enum, renderbuffer: Object);
    fn renderbuffer_storage(&self, samples: u32, internal_format: Enum, width: i32, height: i32);
    fn draw_buffers(&self, buffers: &[Enum]);
    fn read_buffer(&self, src: Enum);
    fn check_framebuffer_status(&self, target: Enum) -> Enum;
    fn blit_framebuffer(
        &self,
        src_x0: i32,
        src_y0: i32,
        src_x1: i32,
        src_y1: i32,
        dst_x0: i32,
        dst_y0: i32,
        dst_x1: i32,
        dst_y1: i32,
        mask: u32,
        filter: Enum,
    );

    // Clears.
    fn clear(&self, mask: u32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth(&self, depth: f32);
    fn clear_stencil(&self, stencil: i32);
    fn clear_buffer_fv(&self, buffer: Enum, draw_buffer: i32, values: [f32; 4]);
    fn clear_buffer_iv(&self, buffer: Enum, draw_buffer: i32, values: [i32; 4]);
    fn clear_buffer_uiv(&self, buffer: Enum, draw_buffer: i32, values: [u32; 4]);
    fn clear_buffer_depth_stencil(&self, draw_buffer: i32, depth: f32, stencil: i32);

    // Vertex arrays and draws.
    fn bind_vertex_array(&self, vao: Object);
    fn enable_vertex_attrib_array(&self, location: u32);
    fn disable_vertex_attrib_array(&self, location: u32);
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        data_type: Enum,
        normalized: bool,
        stride: i32,
        offset: usize,
    );
    fn vertex_attrib_i_pointer(
        &self,
        location: u32,
        size: i32,
        data_type: Enum,
        stride: i32,
        offset: usize,
    );
    fn draw_arrays(&self, mode: Enum, first: i32, count: i32);
    fn draw_arrays_instanced(&self, mode: Enum, first: i32, count: i32, instances: i32);
    fn draw_elements(&self, mode: Enum, count: i32, index_type: Enum, offset: usize);
    fn draw_elements_base_vertex(
        &self,
        mode: Enum,
        count: i32,
        index_type: Enum,
        offset: usize,
        base_vertex: i32,
    );
    fn draw_elements_instanced(
        &self,
        mode: Enum,
        count: i32,
        index_type: Enum,
        offset: usize,
        instances: i32,
    );
    fn draw_elements_instanced_base_vertex(
        &self,
        mode: Enum,
        count: i32,
        index_type: Enum,
        offset: usize,
        instances: i32,
        base_vertex: i32,
    );
    fn draw_arrays_indirect(&self, mode: Enum, offset: usize);
    fn draw_elements_indirect(&self, mode: Enum, index_type: Enum, offset: usize);
    fn dispatch_compute(&self, x: u32, y: u32, z: u32);
    fn dispatch_compute_indirect(&self, offset: isize);

    // Programs and uniforms.
    fn use_program(&self, program: Object);
    fn uniform_1iv(&self, location: i32, values: &[i32]);
    fn uniform_2iv(&self, location: i32, values: &[i32]);
    fn uniform_3iv(&self, location: i32, values: &[i32]);
    fn uniform_4iv(&self, location: i32, values: &[i32]);
    fn uniform_1fv(&self, location: i32, values: &[f32]);
    fn uniform_2fv(&self, location: i32, values: &[f32]);
    fn uniform_3fv(&self, location: i32, values: &[f32]);
    fn uniform_4fv(&self, location: i32, values: &[f32]);
    fn uniform_matrix_3fv(&self, location: i32, values: &[f32]);
    fn uniform_matrix_4fv(&self, location: i32, values: &[f32]);

    // Fixed-function state.
    fn enable(&self, cap: Enum);
    fn disable(&self, cap: Enum);
    fn enable_i(&self, cap: Enum, index: u32);
    fn disable_i(&self, cap: Enum, index: u32);
    fn cull_face(&self, mode: Enum);
    fn front_face(&self, mode: Enum);
    fn polygon_mode(&self, mode: Enum);
    fn polygon_offset(&self, factor: f32, units: f32);
    fn line_width(&self, width: f32);
    fn sample_mask_i(&self, index: u32, mask: u32);
    fn depth_func(&self, func: Enum);
    fn depth_mask(&self, enable: bool);
    fn depth_bounds(&self, min: f32, max: f32);
    fn stencil_func_separate(&self, face: Enum, func: Enum, reference: i32, mask: u32);
    fn stencil_op_separate(&self, face: Enum, fail: Enum, depth_fail: Enum, pass: Enum);
    fn stencil_mask_separate(&self, face: Enum, mask: u32);
    fn blend_func_separate(&self, src_rgb: Enum, dst_rgb: Enum, src_alpha: Enum, dst_alpha: Enum);
    fn blend_equation_separate(&self, rgb: Enum, alpha: Enum);
    fn blend_func_separate_i(
        &self,
        buffer: u32,
        src_rgb: Enum,
        dst_rgb: Enum,
        src_alpha: Enum,
        dst_alpha: Enum,
    );
    fn blend_equation_separate_i(&self, buffer: u32, rgb: Enum, alpha: Enum);
    fn blend_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool);
    fn color_mask_i(&self, buffer: u32, r: bool, g: bool, b: bool, a: bool);
    fn patch_parameter(&self, pname: Enum, value: i32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn depth_range(&self, near: f32, far: f32);
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);

    // Sync and barriers.
    fn fence_sync(&self) -> SyncHandle;
    fn delete_sync(&self, sync: SyncHandle);
    fn client_wait_sync(&self, sync: SyncHandle, flush: bool, timeout_ns: u64) -> WaitStatus;
    fn memory_barrier(&self, barriers: u32);
    fn flush(&self);
    fn finish(&self);

    // Queries.
    fn begin_query(&self, target: Enum, query: Object);
    fn end_query(&self, target: Enum);
    fn query_counter(&self, query: Object, target: Enum);
    fn get_query_result(&self, query: Object, wait: bool) -> Option<u64>;

    // Debug.
    fn push_debug_group(&self, name: &str);
    fn pop_debug_group(&self);

    // Surfaces.
    fn make_current(&self, surface: Object);
    fn swap_buffers(&self, surface: Object);

    // Introspection.
    fn get_error(&self) -> Enum;
    fn get_string(&self, name: Enum) -> String;
    fn get_integer(&self, name: Enum) -> i32;
    fn get_float_2(&self, name: Enum) -> [f32; 2];
}
