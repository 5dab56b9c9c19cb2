//! A driver stub that records every call.
//!
//! Stands in for a loaded GL function table where no GPU is available:
//! object creation hands out sequential names, queries return configured
//! limits, and every entry point appends a formatted line to an internal
//! log. Tests assert on the log to pin down exactly which driver calls an
//! operation issues.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::gl::{consts, Context, Enum, Object, SyncHandle, WaitStatus};

/// Call-recording [`Context`] implementation.
#[derive(Debug)]
pub struct MockContext {
    version: String,
    extensions: String,
    calls: Mutex<Vec<String>>,
    next_object: AtomicU32,
    next_sync: AtomicU64,
}

impl Default for MockContext {
    fn default() -> Self {
        MockContext::new()
    }
}

impl MockContext {
    /// A mock exposing a fully capable desktop driver.
    pub fn new() -> Self {
        MockContext::with_driver(
            "4.6.0 Mock",
            "GL_EXT_texture_compression_s3tc GL_EXT_depth_bounds_test \
             GL_ARB_texture_buffer_object GL_KHR_debug",
        )
    }

    /// A mock reporting the given version/extension strings, for testing
    /// the reduced-capability paths.
    pub fn with_driver(version: &str, extensions: &str) -> Self {
        MockContext {
            version: version.to_owned(),
            extensions: extensions.to_owned(),
            calls: Mutex::new(Vec::new()),
            next_object: AtomicU32::new(1),
            next_sync: AtomicU64::new(1),
        }
    }

    /// Drain and return the recorded calls.
    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock())
    }

    /// Number of recorded calls since the last drain.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn log(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn next(&self) -> Object {
        self.next_object.fetch_add(1, Ordering::Relaxed)
    }
}

impl Context for MockContext {
    fn create_buffer(&self) -> Object {
        let name = self.next();
        self.log(format!("create_buffer() -> {}", name));
        name
    }
    fn delete_buffer(&self, buffer: Object) {
        self.log(format!("delete_buffer({})", buffer));
    }
    fn create_texture(&self) -> Object {
        let name = self.next();
        self.log(format!("create_texture() -> {}", name));
        name
    }
    fn delete_texture(&self, texture: Object) {
        self.log(format!("delete_texture({})", texture));
    }
    fn create_renderbuffer(&self) -> Object {
        let name = self.next();
        self.log(format!("create_renderbuffer() -> {}", name));
        name
    }
    fn delete_renderbuffer(&self, renderbuffer: Object) {
        self.log(format!("delete_renderbuffer({})", renderbuffer));
    }
    fn create_framebuffer(&self) -> Object {
        let name = self.next();
        self.log(format!("create_framebuffer() -> {}", name));
        name
    }
    fn delete_framebuffer(&self, framebuffer: Object) {
        self.log(format!("delete_framebuffer({})", framebuffer));
    }
    fn create_vertex_array(&self) -> Object {
        let name = self.next();
        self.log(format!("create_vertex_array() -> {}", name));
        name
    }
    fn delete_vertex_array(&self, vao: Object) {
        self.log(format!("delete_vertex_array({})", vao));
    }
    fn create_query(&self) -> Object {
        let name = self.next();
        self.log(format!("create_query() -> {}", name));
        name
    }
    fn delete_query(&self, query: Object) {
        self.log(format!("delete_query({})", query));
    }
    fn create_sampler(&self) -> Object {
        let name = self.next();
        self.log(format!("create_sampler() -> {}", name));
        name
    }
    fn delete_sampler(&self, sampler: Object) {
        self.log(format!("delete_sampler({})", sampler));
    }
    fn create_program(&self, binary: &[u8]) -> Object {
        let name = self.next();
        self.log(format!("create_program({} bytes) -> {}", binary.len(), name));
        name
    }
    fn delete_program(&self, program: Object) {
        self.log(format!("delete_program({})", program));
    }

    fn bind_buffer(&self, target: Enum, buffer: Object) {
        self.log(format!("bind_buffer({:#x}, {})", target, buffer));
    }
    fn bind_buffer_range(&self, target: Enum, index: u32, buffer: Object, offset: isize, size: isize) {
        self.log(format!(
            "bind_buffer_range({:#x}, {}, {}, {}, {})",
            target, index, buffer, offset, size
        ));
    }
    fn buffer_data(&self, target: Enum, size: usize, data: Option<&[u8]>, usage: Enum) {
        self.log(format!(
            "buffer_data({:#x}, {}, {}, {:#x})",
            target,
            size,
            data.map_or("none".to_owned(), |d| format!("{} bytes", d.len())),
            usage
        ));
    }
    fn buffer_sub_data(&self, target: Enum, offset: isize, data: &[u8]) {
        self.log(format!(
            "buffer_sub_data({:#x}, {}, {} bytes)",
            target,
            offset,
            data.len()
        ));
    }
    fn get_buffer_sub_data(&self, target: Enum, offset: isize, out: &mut [u8]) {
        self.log(format!(
            "get_buffer_sub_data({:#x}, {}, {} bytes)",
            target,
            offset,
            out.len()
        ));
        for byte in out.iter_mut() {
            *byte = 0;
        }
    }
    fn copy_buffer_sub_data(
        &self,
        src_target: Enum,
        dst_target: Enum,
        src_offset: isize,
        dst_offset: isize,
        size: isize,
    ) {
        self.log(format!(
            "copy_buffer_sub_data({:#x}, {:#x}, {}, {}, {})",
            src_target, dst_target, src_offset, dst_offset, size
        ));
    }
    fn map_buffer_range(&self, target: Enum, offset: isize, length: usize, access: u32) -> *mut u8 {
        self.log(format!(
            "map_buffer_range({:#x}, {}, {}, {:#x})",
            target, offset, length, access
        ));
        std::ptr::null_mut()
    }
    fn flush_mapped_buffer_range(&self, target: Enum, offset: isize, length: usize) {
        self.log(format!(
            "flush_mapped_buffer_range({:#x}, {}, {})",
            target, offset, length
        ));
    }
    fn unmap_buffer(&self, target: Enum) -> bool {
        self.log(format!("unmap_buffer({:#x})", target));
        true
    }

    fn active_texture(&self, unit: u32) {
        self.log(format!("active_texture({})", unit));
    }
    fn bind_texture(&self, target: Enum, texture: Object) {
        self.log(format!("bind_texture({:#x}, {})", target, texture));
    }
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
    ) {
        self.log(format!(
            "tex_image_2d({:#x}, {}, {:#x}, {}x{}, {:#x}, {:#x}, {})",
            target,
            level,
            internal_format,
            width,
            height,
            format,
            data_type,
            data.map_or("none".to_owned(), |d| format!("{} bytes", d.len()))
        ));
    }
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
    ) {
        self.log(format!(
            "tex_image_3d({:#x}, {}, {:#x}, {}x{}x{}, {:#x}, {:#x}, {})",
            target,
            level,
            internal_format,
            width,
            height,
            depth,
            format,
            data_type,
            data.map_or("none".to_owned(), |d| format!("{} bytes", d.len()))
        ));
    }
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
    ) {
        self.log(format!(
            "tex_sub_image_2d({:#x}, {}, {},{}, {}x{}, {:#x}, {:#x}, {})",
            target,
            level,
            x,
            y,
            width,
            height,
            format,
            data_type,
            data.map_or("pack buffer".to_owned(), |d| format!("{} bytes", d.len()))
        ));
    }
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
    ) {
        self.log(format!(
            "tex_sub_image_3d({:#x}, {}, {},{},{}, {}x{}x{}, {:#x}, {:#x}, {})",
            target,
            level,
            x,
            y,
            z,
            width,
            height,
            depth,
            format,
            data_type,
            data.map_or("pack buffer".to_owned(), |d| format!("{} bytes", d.len()))
        ));
    }
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
    ) {
        self.log(format!(
            "tex_sub_image_2d_pbo({:#x}, {}, {},{}, {}x{}, {:#x}, {:#x}, {})",
            target, level, x, y, width, height, format, data_type, unpack_offset
        ));
    }
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
    ) {
        self.log(format!(
            "tex_sub_image_3d_pbo({:#x}, {}, {},{},{}, {}x{}x{}, {:#x}, {:#x}, {})",
            target, level, x, y, z, width, height, depth, format, data_type, unpack_offset
        ));
    }
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
    ) {
        self.log(format!(
            "copy_image_sub_data({} {:#x} l{} {},{},{} -> {} {:#x} l{} {},{},{} {}x{}x{})",
            src, src_target, src_level, src_x, src_y, src_z, dst, dst_target, dst_level, dst_x,
            dst_y, dst_z, width, height, depth
        ));
    }
    fn generate_mipmap(&self, target: Enum) {
        self.log(format!("generate_mipmap({:#x})", target));
    }
    fn tex_parameter_i(&self, target: Enum, pname: Enum, value: i32) {
        self.log(format!("tex_parameter_i({:#x}, {:#x}, {})", target, pname, value));
    }
    fn tex_buffer_range(&self, internal_format: Enum, buffer: Object, offset: isize, size: isize) {
        self.log(format!(
            "tex_buffer_range({:#x}, {}, {}, {})",
            internal_format, buffer, offset, size
        ));
    }
    fn bind_sampler(&self, unit: u32, sampler: Object) {
        self.log(format!("bind_sampler({}, {})", unit, sampler));
    }
    fn sampler_parameter_i(&self, sampler: Object, pname: Enum, value: i32) {
        self.log(format!("sampler_parameter_i({}, {:#x}, {})", sampler, pname, value));
    }
    fn read_pixels(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: Enum,
        data_type: Enum,
        pack_offset: usize,
    ) {
        self.log(format!(
            "read_pixels({},{}, {}x{}, {:#x}, {:#x}, {})",
            x, y, width, height, format, data_type, pack_offset
        ));
    }

    fn bind_framebuffer(&self, target: Enum, framebuffer: Object) {
        self.log(format!("bind_framebuffer({:#x}, {})", target, framebuffer));
    }
    fn framebuffer_texture(&self, target: Enum, attachment: Enum, texture: Object, level: i32) {
        self.log(format!(
            "framebuffer_texture({:#x}, {:#x}, {}, {})",
            target, attachment, texture, level
        ));
    }
    fn framebuffer_texture_layer(
        &self,
        target: Enum,
        attachment: Enum,
        texture: Object,
        level: i32,
        layer: i32,
    ) {
        self.log(format!(
            "framebuffer_texture_layer({:#x}, {:#x}, {}, {}, {})",
            target, attachment, texture, level, layer
        ));
    }
    fn framebuffer_renderbuffer(&self, target: Enum, attachment: Enum, renderbuffer: Object) {
        self.log(format!(
            "framebuffer_renderbuffer({:#x}, {:#x}, {})",
            target, attachment, renderbuffer
        ));
    }
    fn renderbuffer_storage(&self, samples: u32, internal_format: Enum, width: i32, height: i32) {
        self.log(format!(
            "renderbuffer_storage({}, {:#x}, {}x{})",
            samples, internal_format, width, height
        ));
    }
    fn draw_buffers(&self, buffers: &[Enum]) {
        self.log(format!("draw_buffers({:x?})", buffers));
    }
    fn read_buffer(&self, src: Enum) {
        self.log(format!("read_buffer({:#x})", src));
    }
    fn check_framebuffer_status(&self, target: Enum) -> Enum {
        self.log(format!("check_framebuffer_status({:#x})", target));
        consts::FRAMEBUFFER_COMPLETE
    }
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
    ) {
        self.log(format!(
            "blit_framebuffer({},{} {},{} -> {},{} {},{} mask {:#x} filter {:#x})",
            src_x0, src_y0, src_x1, src_y1, dst_x0, dst_y0, dst_x1, dst_y1, mask, filter
        ));
    }

    fn clear(&self, mask: u32) {
        self.log(format!("clear({:#x})", mask));
    }
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.log(format!("clear_color({}, {}, {}, {})", r, g, b, a));
    }
    fn clear_depth(&self, depth: f32) {
        self.log(format!("clear_depth({})", depth));
    }
    fn clear_stencil(&self, stencil: i32) {
        self.log(format!("clear_stencil({})", stencil));
    }
    fn clear_buffer_fv(&self, buffer: Enum, draw_buffer: i32, values: [f32; 4]) {
        self.log(format!("clear_buffer_fv({:#x}, {}, {:?})", buffer, draw_buffer, values));
    }
    fn clear_buffer_iv(&self, buffer: Enum, draw_buffer: i32, values: [i32; 4]) {
        self.log(format!("clear_buffer_iv({:#x}, {}, {:?})", buffer, draw_buffer, values));
    }
    fn clear_buffer_uiv(&self, buffer: Enum, draw_buffer: i32, values: [u32; 4]) {
        self.log(format!("clear_buffer_uiv({:#x}, {}, {:?})", buffer, draw_buffer, values));
    }
    fn clear_buffer_depth_stencil(&self, draw_buffer: i32, depth: f32, stencil: i32) {
        self.log(format!(
            "clear_buffer_depth_stencil({}, {}, {})",
            draw_buffer, depth, stencil
        ));
    }

    fn bind_vertex_array(&self, vao: Object) {
        self.log(format!("bind_vertex_array({})", vao));
    }
    fn enable_vertex_attrib_array(&self, location: u32) {
        self.log(format!("enable_vertex_attrib_array({})", location));
    }
    fn disable_vertex_attrib_array(&self, location: u32) {
        self.log(format!("disable_vertex_attrib_array({})", location));
    }
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        data_type: Enum,
        normalized: bool,
        stride: i32,
        offset: usize,
    ) {
        self.log(format!(
            "vertex_attrib_pointer({}, {}, {:#x}, {}, {}, {})",
            location, size, data_type, normalized, stride, offset
        ));
    }
    fn vertex_attrib_i_pointer(
        &self,
        location: u32,
        size: i32,
        data_type: Enum,
        stride: i32,
        offset: usize,
    ) {
        self.log(format!(
            "vertex_attrib_i_pointer({}, {}, {:#x}, {}, {})",
            location, size, data_type, stride, offset
        ));
    }
    fn draw_arrays(&self, mode: Enum, first: i32, count: i32) {
        self.log(format!("draw_arrays({:#x}, {}, {})", mode, first, count));
    }
    fn draw_arrays_instanced(&self, mode: Enum, first: i32, count: i32, instances: i32) {
        self.log(format!(
            "draw_arrays_instanced({:#x}, {}, {}, {})",
            mode, first, count, instances
        ));
    }
    fn draw_elements(&self, mode: Enum, count: i32, index_type: Enum, offset: usize) {
        self.log(format!(
            "draw_elements({:#x}, {}, {:#x}, {})",
            mode, count, index_type, offset
        ));
    }
    fn draw_elements_base_vertex(
        &self,
        mode: Enum,
        count: i32,
        index_type: Enum,
        offset: usize,
        base_vertex: i32,
    ) {
        self.log(format!(
            "draw_elements_base_vertex({:#x}, {}, {:#x}, {}, {})",
            mode, count, index_type, offset, base_vertex
        ));
    }
    fn draw_elements_instanced(
        &self,
        mode: Enum,
        count: i32,
        index_type: Enum,
        offset: usize,
        instances: i32,
    ) {
        self.log(format!(
            "draw_elements_instanced({:#x}, {}, {:#x}, {}, {})",
            mode, count, index_type, offset, instances
        ));
    }
    fn draw_elements_instanced_base_vertex(
        &self,
        mode: Enum,
        count: i32,
        index_type: Enum,
        offset: usize,
        instances: i32,
        base_vertex: i32,
    ) {
        self.log(format!(
            "draw_elements_instanced_base_vertex({:#x}, {}, {:#x}, {}, {}, {})",
            mode, count, index_type, offset, instances, base_vertex
        ));
    }
    fn draw_arrays_indirect(&self, mode: Enum, offset: usize) {
        self.log(format!("draw_arrays_indirect({:#x}, {})", mode, offset));
    }
    fn draw_elements_indirect(&self, mode: Enum, index_type: Enum, offset: usize) {
        self.log(format!(
            "draw_elements_indirect({:#x}, {:#x}, {})",
            mode, index_type, offset
        ));
    }
    fn dispatch_compute(&self, x: u32, y: u32, z: u32) {
        self.log(format!("dispatch_compute({}, {}, {})", x, y, z));
    }
    fn dispatch_compute_indirect(&self, offset: isize) {
        self.log(format!("dispatch_compute_indirect({})", offset));
    }

    fn use_program(&self, program: Object) {
        self.log(format!("use_program({})", program));
    }
    fn uniform_1iv(&self, location: i32, values: &[i32]) {
        self.log(format!("uniform_1iv({}, {:?})", location, values));
    }
    fn uniform_2iv(&self, location: i32, values: &[i32]) {
        self.log(format!("uniform_2iv({}, {:?})", location, values));
    }
    fn uniform_3iv(&self, location: i32, values: &[i32]) {
        self.log(format!("uniform_3iv({}, {:?})", location, values));
    }
    fn uniform_4iv(&self, location: i32, values: &[i32]) {
        self.log(format!("uniform_4iv({}, {:?})", location, values));
    }
    fn uniform_1fv(&self, location: i32, values: &[f32]) {
        self.log(format!("uniform_1fv({}, {:?})", location, values));
    }
    fn uniform_2fv(&self, location: i32, values: &[f32]) {
        self.log(format!("uniform_2fv({}, {:?})", location, values));
    }
    fn uniform_3fv(&self, location: i32, values: &[f32]) {
        self.log(format!("uniform_3fv({}, {:?})", location, values));
    }
    fn uniform_4fv(&self, location: i32, values: &[f32]) {
        self.log(format!("uniform_4fv({}, {:?})", location, values));
    }
    fn uniform_matrix_3fv(&self, location: i32, values: &[f32]) {
        self.log(format!("uniform_matrix_3fv({}, {} values)", location, values.len()));
    }
    fn uniform_matrix_4fv(&self, location: i32, values: &[f32]) {
        self.log(format!("uniform_matrix_4fv({}, {} values)", location, values.len()));
    }

    fn enable(&self, cap: Enum) {
        self.log(format!("enable({:#x})", cap));
    }
    fn disable(&self, cap: Enum) {
        self.log(format!("disable({:#x})", cap));
    }
    fn enable_i(&self, cap: Enum, index: u32) {
        self.log(format!("enable_i({:#x}, {})", cap, index));
    }
    fn disable_i(&self, cap: Enum, index: u32) {
        self.log(format!("disable_i({:#x}, {})", cap, index));
    }
    fn cull_face(&self, mode: Enum) {
        self.log(format!("cull_face({:#x})", mode));
    }
    fn front_face(&self, mode: Enum) {
        self.log(format!("front_face({:#x})", mode));
    }
    fn polygon_mode(&self, mode: Enum) {
        self.log(format!("polygon_mode({:#x})", mode));
    }
    fn polygon_offset(&self, factor: f32, units: f32) {
        self.log(format!("polygon_offset({}, {})", factor, units));
    }
    fn line_width(&self, width: f32) {
        self.log(format!("line_width({})", width));
    }
    fn sample_mask_i(&self, index: u32, mask: u32) {
        self.log(format!("sample_mask_i({}, {:#x})", index, mask));
    }
    fn depth_func(&self, func: Enum) {
        self.log(format!("depth_func({:#x})", func));
    }
    fn depth_mask(&self, enable: bool) {
        self.log(format!("depth_mask({})", enable));
    }
    fn depth_bounds(&self, min: f32, max: f32) {
        self.log(format!("depth_bounds({}, {})", min, max));
    }
    fn stencil_func_separate(&self, face: Enum, func: Enum, reference: i32, mask: u32) {
        self.log(format!(
            "stencil_func_separate({:#x}, {:#x}, {}, {:#x})",
            face, func, reference, mask
        ));
    }
    fn stencil_op_separate(&self, face: Enum, fail: Enum, depth_fail: Enum, pass: Enum) {
        self.log(format!(
            "stencil_op_separate({:#x}, {:#x}, {:#x}, {:#x})",
            face, fail, depth_fail, pass
        ));
    }
    fn stencil_mask_separate(&self, face: Enum, mask: u32) {
        self.log(format!("stencil_mask_separate({:#x}, {:#x})", face, mask));
    }
    fn blend_func_separate(&self, src_rgb: Enum, dst_rgb: Enum, src_alpha: Enum, dst_alpha: Enum) {
        self.log(format!(
            "blend_func_separate({:#x}, {:#x}, {:#x}, {:#x})",
            src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
    }
    fn blend_equation_separate(&self, rgb: Enum, alpha: Enum) {
        self.log(format!("blend_equation_separate({:#x}, {:#x})", rgb, alpha));
    }
    fn blend_func_separate_i(
        &self,
        buffer: u32,
        src_rgb: Enum,
        dst_rgb: Enum,
        src_alpha: Enum,
        dst_alpha: Enum,
    ) {
        self.log(format!(
            "blend_func_separate_i({}, {:#x}, {:#x}, {:#x}, {:#x})",
            buffer, src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
    }
    fn blend_equation_separate_i(&self, buffer: u32, rgb: Enum, alpha: Enum) {
        self.log(format!(
            "blend_equation_separate_i({}, {:#x}, {:#x})",
            buffer, rgb, alpha
        ));
    }
    fn blend_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.log(format!("blend_color({}, {}, {}, {})", r, g, b, a));
    }
    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        self.log(format!("color_mask({}, {}, {}, {})", r, g, b, a));
    }
    fn color_mask_i(&self, buffer: u32, r: bool, g: bool, b: bool, a: bool) {
        self.log(format!("color_mask_i({}, {}, {}, {}, {})", buffer, r, g, b, a));
    }
    fn patch_parameter(&self, pname: Enum, value: i32) {
        self.log(format!("patch_parameter({:#x}, {})", pname, value));
    }
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.log(format!("viewport({}, {}, {}, {})", x, y, width, height));
    }
    fn depth_range(&self, near: f32, far: f32) {
        self.log(format!("depth_range({}, {})", near, far));
    }
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.log(format!("scissor({}, {}, {}, {})", x, y, width, height));
    }

    fn fence_sync(&self) -> SyncHandle {
        let handle = self.next_sync.fetch_add(1, Ordering::Relaxed);
        self.log(format!("fence_sync() -> {}", handle));
        handle
    }
    fn delete_sync(&self, sync: SyncHandle) {
        self.log(format!("delete_sync({})", sync));
    }
    fn client_wait_sync(&self, sync: SyncHandle, flush: bool, timeout_ns: u64) -> WaitStatus {
        self.log(format!("client_wait_sync({}, {}, {})", sync, flush, timeout_ns));
        WaitStatus::Signaled
    }
    fn memory_barrier(&self, barriers: u32) {
        self.log(format!("memory_barrier({:#x})", barriers));
    }
    fn flush(&self) {
        self.log("flush()".to_owned());
    }
    fn finish(&self) {
        self.log("finish()".to_owned());
    }

    fn begin_query(&self, target: Enum, query: Object) {
        self.log(format!("begin_query({:#x}, {})", target, query));
    }
    fn end_query(&self, target: Enum) {
        self.log(format!("end_query({:#x})", target));
    }
    fn query_counter(&self, query: Object, target: Enum) {
        self.log(format!("query_counter({}, {:#x})", query, target));
    }
    fn get_query_result(&self, query: Object, wait: bool) -> Option<u64> {
        self.log(format!("get_query_result({}, {})", query, wait));
        Some(0)
    }

    fn push_debug_group(&self, name: &str) {
        self.log(format!("push_debug_group({:?})", name));
    }
    fn pop_debug_group(&self) {
        self.log("pop_debug_group()".to_owned());
    }

    fn make_current(&self, surface: Object) {
        self.log(format!("make_current({})", surface));
    }
    fn swap_buffers(&self, surface: Object) {
        self.log(format!("swap_buffers({})", surface));
    }

    fn get_error(&self) -> Enum {
        consts::NO_ERROR
    }
    fn get_string(&self, name: Enum) -> String {
        match name {
            consts::VERSION => self.version.clone(),
            consts::EXTENSIONS => self.extensions.clone(),
            _ => String::new(),
        }
    }
    fn get_integer(&self, name: Enum) -> i32 {
        match name {
            consts::MAX_TEXTURE_SIZE => 16384,
            consts::MAX_CLIP_DISTANCES => 8,
            consts::MAX_COLOR_ATTACHMENTS => 8,
            consts::MAX_SAMPLES => 8,
            _ => 0,
        }
    }
    fn get_float_2(&self, name: Enum) -> [f32; 2] {
        match name {
            consts::ALIASED_LINE_WIDTH_RANGE => [1.0, 8.0],
            _ => [0.0, 0.0],
        }
    }
}
