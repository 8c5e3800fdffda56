/// Material definitions: the shared template materials are instantiated from.
///
/// A definition declares the parameters its shaders understand and a set
/// of named techniques. Every material built from the definition shares it
/// through an `Arc`.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::Result;
use crate::engine_bail;
use crate::material::RenderState;
use crate::renderer::{Caps, ShaderLanguage};

/// Name of the technique selected when nothing else is asked for
pub const DEFAULT_TECHNIQUE: &str = "Default";

/// One way of rendering a material (forward pass, depth pre-pass, shadow, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct TechniqueDef {
    name: String,
    language: ShaderLanguage,
    /// Capabilities required on top of the shading language
    required_caps: Caps,
    /// Base state, `None` keeps the renderer default
    render_state: Option<RenderState>,
    /// State imposed while this technique is forced by the render manager
    forced_render_state: Option<RenderState>,
}

impl TechniqueDef {
    pub fn new(name: impl Into<String>, language: ShaderLanguage) -> Self {
        Self {
            name: name.into(),
            language,
            required_caps: Caps::empty(),
            render_state: None,
            forced_render_state: None,
        }
    }

    pub fn with_required_caps(mut self, caps: Caps) -> Self {
        self.required_caps = caps;
        self
    }

    pub fn with_render_state(mut self, state: RenderState) -> Self {
        self.render_state = Some(state);
        self
    }

    pub fn with_forced_render_state(mut self, state: RenderState) -> Self {
        self.forced_render_state = Some(state);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> ShaderLanguage {
        self.language
    }

    pub fn required_caps(&self) -> Caps {
        self.required_caps
    }

    pub fn render_state(&self) -> Option<&RenderState> {
        self.render_state.as_ref()
    }

    pub fn forced_render_state(&self) -> Option<&RenderState> {
        self.forced_render_state.as_ref()
    }

    /// True when the renderer can run this technique
    pub fn is_supported(&self, caps: Caps) -> bool {
        caps.supports_shader_language(self.language) && caps.contains(self.required_caps)
    }
}

#[derive(Debug, Clone)]
pub struct MaterialDef {
    name: String,
    techniques: Vec<TechniqueDef>,
    technique_names: FxHashMap<String, usize>,
    params: FxHashSet<String>,
}

impl MaterialDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            techniques: Vec::new(),
            technique_names: FxHashMap::default(),
            params: FxHashSet::default(),
        }
    }

    /// Add a technique. Names must be unique within the definition.
    pub fn with_technique(mut self, technique: TechniqueDef) -> Result<Self> {
        if self.technique_names.contains_key(technique.name()) {
            engine_bail!("galaxy3d::MaterialDef", InvalidResource =>
                "Material definition '{}': duplicate technique '{}'", self.name, technique.name());
        }
        self.technique_names.insert(technique.name().to_string(), self.techniques.len());
        self.techniques.push(technique);
        Ok(self)
    }

    /// Declare a parameter the shaders accept
    pub fn with_param(mut self, name: impl Into<String>) -> Self {
        self.params.insert(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn technique(&self, name: &str) -> Option<&TechniqueDef> {
        let index = self.technique_names.get(name)?;
        self.techniques.get(*index)
    }

    pub fn techniques(&self) -> &[TechniqueDef] {
        &self.techniques
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains(name)
    }
}
