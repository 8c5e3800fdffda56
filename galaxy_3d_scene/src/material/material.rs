/// Material instances.
///
/// A material is a definition plus parameter values, a selected technique
/// and an optional state override. Geometries own their material; cloning
/// one shares the definition but copies the values.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use glam::{Mat4, Vec4};
use rustc_hash::{FxHashMap, FxHasher};
use crate::error::Result;
use crate::engine_bail;
use crate::material::{MaterialDef, RenderState, TechniqueDef, DEFAULT_TECHNIQUE};
use crate::renderer::{Caps, TextureHandle};

// ===== PARAMETER VALUES =====

/// A typed material parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum MatParam {
    Int(i32),
    Float(f32),
    Vec4(Vec4),
    Mat4(Mat4),
    Mat4Array(Vec<Mat4>),
    Texture(TextureHandle),
}

impl MatParam {
    /// Raw bytes as uploaded to a uniform; empty for textures
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            MatParam::Int(v) => bytemuck::bytes_of(v),
            MatParam::Float(v) => bytemuck::bytes_of(v),
            MatParam::Vec4(v) => bytemuck::bytes_of(v),
            MatParam::Mat4(v) => bytemuck::bytes_of(v),
            MatParam::Mat4Array(v) => bytemuck::cast_slice(v),
            MatParam::Texture(_) => &[],
        }
    }
}

// ===== MATERIAL =====

#[derive(Debug, Clone)]
pub struct Material {
    def: Arc<MaterialDef>,
    name: String,
    params: Vec<(String, MatParam)>,
    param_names: FxHashMap<String, usize>,
    technique: String,
    additional_render_state: Option<RenderState>,
}

impl Material {
    /// Instantiate a definition with the default technique selected.
    pub fn new(def: Arc<MaterialDef>) -> Self {
        let name = def.name().to_string();
        Self {
            def,
            name,
            params: Vec::new(),
            param_names: FxHashMap::default(),
            technique: DEFAULT_TECHNIQUE.to_string(),
            additional_render_state: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn def(&self) -> &Arc<MaterialDef> {
        &self.def
    }

    // ===== PARAMETERS =====

    /// Set a parameter declared by the definition.
    pub fn set_param(&mut self, name: &str, value: MatParam) -> Result<()> {
        if !self.def.has_param(name) {
            engine_bail!("galaxy3d::Material", InvalidResource =>
                "Material parameter '{}' is not defined by '{}'", name, self.def.name());
        }
        match self.param_names.get(name) {
            Some(&index) => self.params[index].1 = value,
            None => {
                self.param_names.insert(name.to_string(), self.params.len());
                self.params.push((name.to_string(), value));
            }
        }
        Ok(())
    }

    /// Remove a parameter value. Returns false when it was not set.
    pub fn clear_param(&mut self, name: &str) -> bool {
        let Some(index) = self.param_names.remove(name) else {
            return false;
        };
        self.params.remove(index);
        for slot in self.param_names.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        true
    }

    pub fn param(&self, name: &str) -> Option<&MatParam> {
        let index = self.param_names.get(name)?;
        self.params.get(*index).map(|(_, v)| v)
    }

    /// Parameters in the order they were first set
    pub fn params(&self) -> impl Iterator<Item = (&str, &MatParam)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Texture parameters in binding order
    pub fn textures(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.params.iter().filter_map(|(_, v)| match v {
            MatParam::Texture(handle) => Some(*handle),
            _ => None,
        })
    }

    // ===== TECHNIQUES =====

    /// Select the technique used by subsequent draws.
    ///
    /// Fails when the definition has no such technique or the renderer
    /// cannot run it; the previous selection is kept in that case.
    pub fn select_technique(&mut self, name: &str, caps: Caps) -> Result<()> {
        let Some(technique) = self.def.technique(name) else {
            engine_bail!("galaxy3d::Material", InvalidResource =>
                "Material '{}': technique '{}' is not defined", self.name, name);
        };
        if !technique.is_supported(caps) {
            engine_bail!("galaxy3d::Material", InvalidResource =>
                "Material '{}': technique '{}' is not supported by the renderer", self.name, name);
        }
        self.technique = name.to_string();
        Ok(())
    }

    pub fn active_technique(&self) -> &str {
        &self.technique
    }

    pub fn active_technique_def(&self) -> Option<&TechniqueDef> {
        self.def.technique(&self.technique)
    }

    // ===== RENDER STATE =====

    pub fn additional_render_state(&self) -> Option<&RenderState> {
        self.additional_render_state.as_ref()
    }

    pub fn set_additional_render_state(&mut self, state: Option<RenderState>) {
        self.additional_render_state = state;
    }

    /// State for a draw with `technique`: the material override, then the
    /// technique state, then the defaults.
    pub fn render_state(&self, technique: &TechniqueDef) -> RenderState {
        self.additional_render_state
            .or_else(|| technique.render_state().copied())
            .unwrap_or_default()
    }

    /// Key grouping materials that bind the same shader
    pub fn sort_id(&self) -> u32 {
        let mut hasher = FxHasher::default();
        self.def.name().hash(&mut hasher);
        self.technique.hash(&mut hasher);
        hasher.finish() as u32
    }
}
