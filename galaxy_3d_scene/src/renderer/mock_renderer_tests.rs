use std::sync::Arc;
use glam::Vec3;
use crate::material::{MaterialDef, TechniqueDef};
use crate::renderer::ShaderLanguage;
use super::*;

fn quad() -> Mesh {
    Mesh::new("quad", vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE])
        .with_indices(vec![0, 1, 2, 2, 1, 3])
        .unwrap()
}

#[test]
fn test_log_is_shared_with_clones() {
    let mut renderer = MockRenderer::new();
    let log = renderer.log();

    renderer.set_depth_range(1.0, 1.0);
    renderer.clear_buffers(true, true, false);

    assert_eq!(log.depth_ranges(), vec![(1.0, 1.0)]);
    assert_eq!(log.commands().len(), 2);

    log.clear();
    assert!(renderer.log().commands().is_empty());
}

#[test]
fn test_draw_updates_stats() {
    let mut renderer = MockRenderer::new();

    renderer.render_mesh(&quad(), 0, 1).unwrap();
    renderer.render_mesh(&quad(), 0, 1).unwrap();

    assert_eq!(renderer.stats().draw_calls, 2);
    assert_eq!(renderer.stats().triangles, 4);
    assert_eq!(renderer.log().drawn_meshes(), vec!["quad", "quad"]);

    renderer.reset_stats();
    assert_eq!(renderer.stats(), RendererStats::default());
}

#[test]
fn test_failing_preload() {
    let def = Arc::new(
        MaterialDef::new("Unshaded")
            .with_technique(TechniqueDef::new("Default", ShaderLanguage::Glsl100))
            .unwrap(),
    );
    let material = Material::new(def);
    let mut renderer = MockRenderer::new();

    assert!(renderer.preload(&material, &quad()).is_ok());
    renderer.fail_preload = true;
    assert!(renderer.preload(&material, &quad()).is_err());
}
