//! Rendu GPU du chrome navigateur : bande d'onglets, boutons, barre d'URL.
//!
//! Utilise `glow` pour les appels OpenGL et `fontdue` pour la rastérisation
//! CPU des glyphes. Les glyphes sont pré-rendus dans un atlas texture au
//! démarrage, puis dessinés comme des quads texturés à chaque frame.
//!
//! La géométrie vient de [`ChromeLayout`] ; ce module ne fait que dessiner.
//! Sans police (fichier absent ou illisible) le chrome est dessiné sans
//! texte, les boutons restent cliquables.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glow::HasContext;
use tracing::{info, warn};

use crate::config::{ChromeColors, ChromeConfig};
use crate::toolbar::{ChromeLayout, Rect};

/// Vertex shader GLES 300 es.
const VERTEX_SHADER: &str = r#"#version 300 es
precision mediump float;
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;
uniform mat4 u_projection;
out vec2 v_uv;
void main() {
    gl_Position = u_projection * vec4(a_position, 0.0, 1.0);
    v_uv = a_uv;
}
"#;

/// Fragment shader GLES 300 es.
const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
in vec2 v_uv;
uniform sampler2D u_texture;
uniform vec4 u_color;
uniform bool u_use_texture;
out vec4 fragColor;
void main() {
    if (u_use_texture) {
        float alpha = texture(u_texture, v_uv).r;
        fragColor = vec4(u_color.rgb, u_color.a * alpha);
    } else {
        fragColor = u_color;
    }
}
"#;

const ATLAS_WIDTH: u32 = 512;
const BADGE_PAD: f32 = 4.0;

/// Glyphe rastérisé, avant placement dans l'atlas.
struct RasterGlyph {
    c: char,
    width: u32,
    height: u32,
    advance_x: f32,
    offset_x: f32,
    offset_y: f32,
    coverage: Vec<u8>,
}

/// Informations par glyphe dans l'atlas.
#[derive(Debug, Clone, Copy)]
struct GlyphInfo {
    atlas_x: u32,
    atlas_y: u32,
    width: u32,
    height: u32,
    advance_x: f32,
    offset_x: f32,
    /// Bord inférieur relatif à la ligne de base (positif = vers le haut).
    offset_y: f32,
}

/// Atlas de glyphes pré-rendus (ASCII imprimable plus les quelques
/// caractères utilisés par le chrome).
struct GlyphAtlas {
    width: u32,
    height: u32,
    glyphs: HashMap<char, GlyphInfo>,
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    fn build(font: &fontdue::Font, font_size: f32) -> Self {
        let glyphs = (32u8..=126)
            .map(char::from)
            .chain(['…', '×'])
            .map(|c| {
                let (metrics, coverage) = font.rasterize(c, font_size);
                RasterGlyph {
                    c,
                    width: metrics.width as u32,
                    height: metrics.height as u32,
                    advance_x: metrics.advance_width,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    coverage,
                }
            })
            .collect();
        Self::pack(glyphs)
    }

    /// Range les glyphes en rangées de gauche à droite, un pixel d'écart.
    fn pack(rasterized: Vec<RasterGlyph>) -> Self {
        let mut glyphs = HashMap::new();
        let (mut x, mut y, mut row_height) = (0u32, 0u32, 0u32);

        for g in &rasterized {
            if x + g.width > ATLAS_WIDTH {
                x = 0;
                y += row_height + 1;
                row_height = 0;
            }
            row_height = row_height.max(g.height);
            glyphs.insert(
                g.c,
                GlyphInfo {
                    atlas_x: x,
                    atlas_y: y,
                    width: g.width,
                    height: g.height,
                    advance_x: g.advance_x,
                    offset_x: g.offset_x,
                    offset_y: g.offset_y,
                },
            );
            x += g.width + 1;
        }

        let height = (y + row_height + 1).next_power_of_two().max(64);
        let mut pixels = vec![0u8; (ATLAS_WIDTH * height) as usize];
        for g in &rasterized {
            let info = &glyphs[&g.c];
            for row in 0..info.height {
                let src = (row * info.width) as usize;
                let dst = ((info.atlas_y + row) * ATLAS_WIDTH + info.atlas_x) as usize;
                let len = info.width as usize;
                if let (Some(from), Some(to)) =
                    (g.coverage.get(src..src + len), pixels.get_mut(dst..dst + len))
                {
                    to.copy_from_slice(from);
                }
            }
        }

        Self {
            width: ATLAS_WIDTH,
            height,
            glyphs,
            pixels,
        }
    }

    fn advance(&self, c: char, font_size: f32) -> f32 {
        self.glyphs
            .get(&c)
            .or_else(|| self.glyphs.get(&' '))
            .map_or(font_size * 0.5, |g| g.advance_x)
    }
}

/// Nombre de caractères de `text` qui tiennent dans `max_width`.
///
/// Quand tout ne tient pas, la place d'un `…` final est réservée ; le
/// booléen indique s'il faut le dessiner.
fn fit_chars(text: &str, max_width: f32, advance: impl Fn(char) -> f32) -> (usize, bool) {
    let total: f32 = text.chars().map(&advance).sum();
    if total <= max_width {
        return (text.chars().count(), false);
    }
    let budget = max_width - advance('…');
    let mut used = 0.0;
    let mut count = 0;
    for c in text.chars() {
        let w = advance(c);
        if used + w > budget {
            break;
        }
        used += w;
        count += 1;
    }
    (count, true)
}

/// Charge la police du chrome. `None` si le fichier est absent ou invalide.
pub fn load_font(path: &Path) -> Option<fontdue::Font> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(path = %path.display(), %error, "Police du chrome introuvable, texte désactivé");
            return None;
        }
    };
    match fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()) {
        Ok(font) => {
            info!(path = %path.display(), "Police du chrome chargée");
            Some(font)
        }
        Err(error) => {
            warn!(path = %path.display(), error, "Police du chrome invalide, texte désactivé");
            None
        }
    }
}

/// Ce que le chrome doit afficher pour une frame.
pub struct ChromeFrame<'a> {
    pub layout: &'a ChromeLayout,
    /// Libellé de chaque onglet, dans l'ordre du layout.
    pub tab_labels: &'a [&'a str],
    pub active_tab: Option<usize>,
    pub url_text: &'a str,
    /// Étiquette dessinée devant le texte de l'URL, hors zone éditable.
    pub url_badge: Option<&'a str>,
    pub url_focused: bool,
    pub cursor_char_offset: usize,
}

struct TextAtlas {
    atlas: GlyphAtlas,
    texture: glow::Texture,
}

/// Renderer OpenGL pour le chrome du navigateur.
pub struct ChromeRenderer {
    gl: Arc<glow::Context>,
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    text: Option<TextAtlas>,
    u_projection: glow::UniformLocation,
    u_color: glow::UniformLocation,
    u_use_texture: glow::UniformLocation,
    u_texture: glow::UniformLocation,
    colors: ChromeColors,
    font_size: f32,
    text_left_pad: f32,
}

#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn compile_shader(gl: &glow::Context, kind: u32, source: &str) -> Result<glow::Shader, String> {
    let shader = gl.create_shader(kind)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(format!("compilation du shader : {log}"));
    }
    Ok(shader)
}

#[allow(unsafe_op_in_unsafe_fn)]
impl ChromeRenderer {
    /// Crée le renderer. Doit être appelé avec un contexte GL actif.
    ///
    /// # Safety
    /// Appelle des fonctions OpenGL.
    pub unsafe fn new(
        gl: Arc<glow::Context>,
        config: &ChromeConfig,
        font: Option<&fontdue::Font>,
    ) -> Result<Self, String> {
        // ── Shaders ──────────────────────────────────────────────────────
        let vs = compile_shader(&gl, glow::VERTEX_SHADER, VERTEX_SHADER)?;
        let fs = compile_shader(&gl, glow::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

        let program = gl.create_program()?;
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        if !gl.get_program_link_status(program) {
            return Err(format!("édition de liens : {}", gl.get_program_info_log(program)));
        }

        let uniform = |name: &str| {
            unsafe { gl.get_uniform_location(program, name) }
                .ok_or_else(|| format!("uniform {name} absent"))
        };
        let u_projection = uniform("u_projection")?;
        let u_color = uniform("u_color")?;
        let u_use_texture = uniform("u_use_texture")?;
        let u_texture = uniform("u_texture")?;

        // ── VAO / VBO ────────────────────────────────────────────────────
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));

        // [x, y, u, v] par sommet
        let float = std::mem::size_of::<f32>() as i32;
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 4 * float, 0);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 4 * float, 2 * float);
        gl.enable_vertex_attrib_array(1);

        gl.bind_vertex_array(None);

        // ── Atlas de glyphes ─────────────────────────────────────────────
        let text = match font {
            Some(font) => {
                let atlas = GlyphAtlas::build(font, config.font_size);
                let texture = Self::upload_atlas(&gl, &atlas)?;
                Some(TextAtlas { atlas, texture })
            }
            None => None,
        };

        Ok(Self {
            gl,
            program,
            vao,
            vbo,
            text,
            u_projection,
            u_color,
            u_use_texture,
            u_texture,
            colors: config.colors.clone(),
            font_size: config.font_size,
            text_left_pad: config.text_left_pad,
        })
    }

    unsafe fn upload_atlas(gl: &glow::Context, atlas: &GlyphAtlas) -> Result<glow::Texture, String> {
        let texture = gl.create_texture()?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        for (param, value) in [
            (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
            (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
            (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
            (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
        ] {
            gl.tex_parameter_i32(glow::TEXTURE_2D, param, value as i32);
        }
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::R8 as i32,
            atlas.width as i32,
            atlas.height as i32,
            0,
            glow::RED,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&atlas.pixels)),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(texture)
    }

    /// Dessine le chrome en haut de la fenêtre.
    ///
    /// # Safety
    /// Appelle des fonctions OpenGL.
    pub unsafe fn draw(&self, window_width: u32, window_height: u32, frame: &ChromeFrame<'_>) {
        let gl = &self.gl;
        let w = window_width as f32;
        let h = window_height as f32;
        let layout = frame.layout;
        let colors = &self.colors;

        // ── Sauvegarder l'état GL ────────────────────────────────────────
        let prev_blend = gl.is_enabled(glow::BLEND);
        let prev_depth = gl.is_enabled(glow::DEPTH_TEST);
        let prev_scissor = gl.is_enabled(glow::SCISSOR_TEST);

        gl.viewport(0, 0, window_width as i32, window_height as i32);
        gl.disable(glow::DEPTH_TEST);
        gl.disable(glow::SCISSOR_TEST);
        gl.enable(glow::BLEND);
        gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);

        gl.use_program(Some(self.program));

        // (0,0) en haut-gauche, (w, h) en bas-droite.
        #[rustfmt::skip]
        let projection: [f32; 16] = [
            2.0 / w,  0.0,       0.0, 0.0,
            0.0,     -2.0 / h,   0.0, 0.0,
            0.0,      0.0,      -1.0, 0.0,
           -1.0,      1.0,       0.0, 1.0,
        ];
        gl.uniform_matrix_4_f32_slice(Some(&self.u_projection), false, &projection);
        gl.uniform_1_i32(Some(&self.u_texture), 0);
        gl.bind_vertex_array(Some(self.vao));
        if let Some(text) = &self.text {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(text.texture));
        }

        // ── 1. Bande d'onglets ───────────────────────────────────────────
        self.draw_rect(&layout.tab_strip, colors.background);
        for (i, rects) in layout.tabs.iter().enumerate() {
            let color = if frame.active_tab == Some(i) {
                colors.tab_active
            } else {
                colors.tab
            };
            let body = Rect::new(rects.tab.x + 1.0, rects.tab.y, (rects.tab.w - 2.0).max(0.0), rects.tab.h);
            self.draw_rect(&body, color);
            if let Some(label) = frame.tab_labels.get(i) {
                let max_x = rects.close.x - 2.0;
                self.draw_text(label, body.x + self.text_left_pad, &body, max_x);
            }
            self.draw_centered_label("×", &rects.close);
        }
        self.draw_button(&layout.new_tab, "+");

        // ── 2. Barre d'outils ────────────────────────────────────────────
        let toolbar_bg = if frame.url_focused {
            colors.background_focused
        } else {
            colors.background
        };
        self.draw_rect(&layout.toolbar, toolbar_bg);
        for (button, rect) in &layout.buttons {
            self.draw_button(rect, button.label());
        }
        self.draw_button(&layout.go, "Go");

        // ── 3. Barre d'URL ───────────────────────────────────────────────
        let field = &layout.url_field;
        self.draw_rect(field, colors.bar_border);
        let inner = field.inset(1.0);
        self.draw_rect(&inner, colors.bar_background);

        let mut text_x = inner.x + self.text_left_pad;
        if let Some(badge) = frame.url_badge {
            text_x = self.draw_badge(badge, text_x, &inner);
        }
        let cursor_x = self.draw_text_with_cursor(
            frame.url_text,
            text_x,
            &inner,
            inner.right() - self.text_left_pad,
            frame.cursor_char_offset,
        );

        // ── 4. Curseur ───────────────────────────────────────────────────
        if frame.url_focused {
            let cursor_h = (self.font_size + 4.0).min(inner.h);
            let cursor = Rect::new(cursor_x, inner.y + (inner.h - cursor_h) / 2.0, 2.0, cursor_h);
            self.draw_rect(&cursor, colors.cursor);
        }

        // ── Restaurer l'état GL ──────────────────────────────────────────
        gl.bind_texture(glow::TEXTURE_2D, None);
        gl.bind_vertex_array(None);
        gl.use_program(None);
        if prev_depth {
            gl.enable(glow::DEPTH_TEST);
        }
        if !prev_blend {
            gl.disable(glow::BLEND);
        }
        if prev_scissor {
            gl.enable(glow::SCISSOR_TEST);
        }
    }

    unsafe fn draw_button(&self, rect: &Rect, label: &str) {
        self.draw_rect(rect, self.colors.button);
        self.draw_centered_label(label, rect);
    }

    /// Étiquette sur fond de bouton ; rend l'abscisse qui suit.
    unsafe fn draw_badge(&self, label: &str, x: f32, line: &Rect) -> f32 {
        let Some(text) = &self.text else { return x };
        let width: f32 = label
            .chars()
            .map(|c| text.atlas.advance(c, self.font_size))
            .sum::<f32>()
            + 2.0 * BADGE_PAD;
        let rect = Rect::new(x, line.y + 2.0, width, (line.h - 4.0).max(0.0));
        self.draw_button(&rect, label);
        rect.right() + BADGE_PAD
    }

    unsafe fn draw_centered_label(&self, label: &str, rect: &Rect) {
        let Some(text) = &self.text else { return };
        let width: f32 = label
            .chars()
            .map(|c| text.atlas.advance(c, self.font_size))
            .sum();
        let x = rect.x + ((rect.w - width) / 2.0).max(0.0);
        self.draw_text(label, x, rect, rect.right());
    }

    /// Texte tronqué avec `…` s'il dépasse `max_x`.
    unsafe fn draw_text(&self, label: &str, x: f32, line: &Rect, max_x: f32) {
        let Some(text) = &self.text else { return };
        let advance = |c| text.atlas.advance(c, self.font_size);
        let (count, ellipsis) = fit_chars(label, max_x - x, advance);
        let baseline = self.baseline(line);
        let mut pen_x = x;
        for c in label.chars().take(count) {
            pen_x = self.draw_glyph(&text.atlas, c, pen_x, baseline);
        }
        if ellipsis {
            self.draw_glyph(&text.atlas, '…', pen_x, baseline);
        }
    }

    /// Dessine le texte de la barre d'URL, coupé à `max_x`, et rend la
    /// position horizontale du curseur.
    unsafe fn draw_text_with_cursor(
        &self,
        url_text: &str,
        x: f32,
        line: &Rect,
        max_x: f32,
        cursor_char_offset: usize,
    ) -> f32 {
        let Some(text) = &self.text else { return x };
        let baseline = self.baseline(line);
        let mut pen_x = x;
        let mut cursor_x = x;
        for (i, c) in url_text.chars().enumerate() {
            if i == cursor_char_offset {
                cursor_x = pen_x;
            }
            if pen_x + text.atlas.advance(c, self.font_size) > max_x {
                return if cursor_char_offset > i { max_x } else { cursor_x };
            }
            pen_x = self.draw_glyph(&text.atlas, c, pen_x, baseline);
        }
        if cursor_char_offset >= url_text.chars().count() {
            cursor_x = pen_x;
        }
        cursor_x
    }

    fn baseline(&self, line: &Rect) -> f32 {
        line.y + line.h / 2.0 + self.font_size / 3.0
    }

    /// Dessine `c` et rend la position du glyphe suivant.
    unsafe fn draw_glyph(&self, atlas: &GlyphAtlas, c: char, pen_x: f32, baseline: f32) -> f32 {
        let Some(glyph) = atlas.glyphs.get(&c) else {
            return pen_x + atlas.advance(c, self.font_size);
        };
        if glyph.width > 0 && glyph.height > 0 {
            let gx = pen_x + glyph.offset_x;
            let gy = baseline - glyph.offset_y - glyph.height as f32;
            self.draw_textured_rect(atlas, gx, gy, glyph);
        }
        pen_x + glyph.advance_x
    }

    /// Dessine un rectangle de couleur unie.
    unsafe fn draw_rect(&self, rect: &Rect, color: [f32; 4]) {
        let gl = &self.gl;
        gl.uniform_1_i32(Some(&self.u_use_texture), 0);
        gl.uniform_4_f32_slice(Some(&self.u_color), &color);
        self.draw_quad(rect.x, rect.y, rect.w, rect.h, [0.0; 4]);
    }

    /// Dessine un glyphe depuis l'atlas.
    unsafe fn draw_textured_rect(&self, atlas: &GlyphAtlas, x: f32, y: f32, glyph: &GlyphInfo) {
        let gl = &self.gl;
        gl.uniform_1_i32(Some(&self.u_use_texture), 1);
        gl.uniform_4_f32_slice(Some(&self.u_color), &self.colors.text);

        let aw = atlas.width as f32;
        let ah = atlas.height as f32;
        let uv = [
            glyph.atlas_x as f32 / aw,
            glyph.atlas_y as f32 / ah,
            (glyph.atlas_x + glyph.width) as f32 / aw,
            (glyph.atlas_y + glyph.height) as f32 / ah,
        ];
        self.draw_quad(x, y, glyph.width as f32, glyph.height as f32, uv);
    }

    /// Deux triangles ; `uv` = [u0, v0, u1, v1].
    unsafe fn draw_quad(&self, x: f32, y: f32, w: f32, h: f32, uv: [f32; 4]) {
        let gl = &self.gl;
        let [u0, v0, u1, v1] = uv;

        #[rustfmt::skip]
        let vertices: [f32; 24] = [
            x,     y,     u0, v0,
            x + w, y,     u1, v0,
            x + w, y + h, u1, v1,
            x,     y,     u0, v0,
            x + w, y + h, u1, v1,
            x,     y + h, u0, v1,
        ];

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            f32_slice_as_bytes(&vertices),
            glow::DYNAMIC_DRAW,
        );
        gl.draw_arrays(glow::TRIANGLES, 0, 6);
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.program);
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
            if let Some(text) = &self.text {
                self.gl.delete_texture(text.texture);
            }
        }
    }
}

/// Vue `[u8]` d'un slice `[f32]` pour l'upload GL.
fn f32_slice_as_bytes(data: &[f32]) -> &[u8] {
    // SAFETY: f32 n'a ni padding ni valeur invalide en tant qu'octets.
    unsafe { std::slice::from_raw_parts(data.as_ptr().cast::<u8>(), std::mem::size_of_val(data)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(c: char, width: u32, height: u32) -> RasterGlyph {
        RasterGlyph {
            c,
            width,
            height,
            advance_x: width as f32 + 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            coverage: vec![0xff; (width * height) as usize],
        }
    }

    fn synthetic_atlas() -> GlyphAtlas {
        GlyphAtlas::pack(
            (33u8..=126)
                .map(char::from)
                .map(|c| glyph(c, 9, 14))
                .chain([glyph(' ', 0, 0)])
                .collect(),
        )
    }

    #[test]
    fn test_atlas_dimensions() {
        let atlas = synthetic_atlas();
        assert_eq!(atlas.width, 512);
        assert!(atlas.height >= 64);
        assert!(atlas.height.is_power_of_two());
        assert_eq!(atlas.pixels.len(), (atlas.width * atlas.height) as usize);
    }

    #[test]
    fn test_glyphs_within_atlas_bounds() {
        let atlas = synthetic_atlas();
        for (c, g) in &atlas.glyphs {
            assert!(g.atlas_x + g.width <= atlas.width, "{c:?} dépasse en largeur");
            assert!(g.atlas_y + g.height <= atlas.height, "{c:?} dépasse en hauteur");
        }
    }

    #[test]
    fn test_no_overlapping_glyphs() {
        let atlas = synthetic_atlas();
        let glyphs: Vec<_> = atlas.glyphs.iter().filter(|(_, g)| g.width > 0).collect();
        for (i, (c1, g1)) in glyphs.iter().enumerate() {
            for (c2, g2) in &glyphs[i + 1..] {
                let overlap_x = g1.atlas_x < g2.atlas_x + g2.width && g2.atlas_x < g1.atlas_x + g1.width;
                let overlap_y = g1.atlas_y < g2.atlas_y + g2.height && g2.atlas_y < g1.atlas_y + g1.height;
                assert!(!(overlap_x && overlap_y), "{c1:?} et {c2:?} se chevauchent");
            }
        }
    }

    #[test]
    fn test_coverage_copied_into_atlas() {
        let atlas = GlyphAtlas::pack(vec![glyph('a', 2, 2)]);
        let g = atlas.glyphs[&'a'];
        let at = |x: u32, y: u32| atlas.pixels[(y * atlas.width + x) as usize];
        assert_eq!(at(g.atlas_x, g.atlas_y), 0xff);
        assert_eq!(at(g.atlas_x + 1, g.atlas_y + 1), 0xff);
        assert_eq!(at(g.atlas_x + 2, g.atlas_y), 0);
    }

    #[test]
    fn test_missing_glyph_advances_like_space() {
        let atlas = synthetic_atlas();
        assert_eq!(atlas.advance('é', 15.0), atlas.glyphs[&' '].advance_x);
    }

    #[test]
    fn test_fit_chars_everything_fits() {
        assert_eq!(fit_chars("abc", 100.0, |_| 10.0), (3, false));
    }

    #[test]
    fn test_fit_chars_truncates_with_ellipsis() {
        // 5 caractères de 10 px dans 35 px : 2 caractères + l'ellipse.
        assert_eq!(fit_chars("abcde", 35.0, |_| 10.0), (2, true));
    }

    #[test]
    fn test_fit_chars_too_narrow() {
        assert_eq!(fit_chars("abc", 5.0, |_| 10.0), (0, true));
    }

    #[test]
    fn test_missing_font_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_font(&dir.path().join("absent.ttf")).is_none());
    }

    #[test]
    fn test_invalid_font_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"pas une police").unwrap();
        assert!(load_font(&path).is_none());
    }

    #[test]
    fn test_f32_slice_as_bytes_length() {
        assert_eq!(f32_slice_as_bytes(&[1.0, 2.0]).len(), 8);
    }
}
