/// Renderer capabilities reported by the GPU backend.

use bitflags::bitflags;

bitflags! {
    /// Features supported by a renderer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Caps: u32 {
        const GLSL100 = 1 << 0;
        const GLSL110 = 1 << 1;
        const GLSL120 = 1 << 2;
        const GLSL130 = 1 << 3;
        const GLSL140 = 1 << 4;
        const GLSL150 = 1 << 5;
        const GLSL330 = 1 << 6;
        const GLSL400 = 1 << 7;
        /// Render to texture
        const FRAME_BUFFER = 1 << 8;
        /// Several color targets in one frame buffer
        const FRAME_BUFFER_MRT = 1 << 9;
        const MULTISAMPLE = 1 << 10;
        const FLOAT_TEXTURE = 1 << 11;
        const TEXTURE_ARRAY = 1 << 12;
        const INSTANCING = 1 << 13;

        const ALL_GLSL = Self::GLSL100.bits() | Self::GLSL110.bits() | Self::GLSL120.bits()
            | Self::GLSL130.bits() | Self::GLSL140.bits() | Self::GLSL150.bits()
            | Self::GLSL330.bits() | Self::GLSL400.bits();
    }
}

/// Shading language versions a technique can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderLanguage {
    Glsl100,
    Glsl110,
    Glsl120,
    Glsl130,
    Glsl140,
    Glsl150,
    Glsl330,
    Glsl400,
}

impl Caps {
    /// True when shaders of the given language can be compiled.
    pub fn supports_shader_language(&self, language: ShaderLanguage) -> bool {
        match language {
            ShaderLanguage::Glsl100 => self.contains(Caps::GLSL100),
            ShaderLanguage::Glsl110 => self.contains(Caps::GLSL110),
            ShaderLanguage::Glsl120 => self.contains(Caps::GLSL120),
            ShaderLanguage::Glsl130 => self.contains(Caps::GLSL130),
            ShaderLanguage::Glsl140 => self.contains(Caps::GLSL140),
            ShaderLanguage::Glsl150 => self.contains(Caps::GLSL150),
            ShaderLanguage::Glsl330 => self.contains(Caps::GLSL330),
            ShaderLanguage::Glsl400 => self.contains(Caps::GLSL400),
        }
    }

    /// True when at least one shading language is available
    pub fn supports_shaders(&self) -> bool {
        self.intersects(Caps::ALL_GLSL)
    }
}

#[cfg(test)]
#[path = "caps_tests.rs"]
mod tests;
