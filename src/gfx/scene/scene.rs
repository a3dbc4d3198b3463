use cgmath::Vector3;

use crate::{
    config::AppConfig,
    gfx::{
        camera::{Camera, OrbitController, OrbitTarget},
        resources::{LoadingManager, Texture},
    },
};

use super::{
    graph::SceneGraph,
    node::{NodeId, NodeKind, TransformNode},
};

/// Main scene containing the node graph, the active camera and the loader
pub struct Scene {
    pub graph: SceneGraph,
    pub camera: Camera,
    /// Drives `camera` when present
    pub orbit: Option<OrbitController>,
    pub loader: LoadingManager,
}

impl Scene {
    pub fn new(camera: Camera, loader: LoadingManager) -> Self {
        Self {
            graph: SceneGraph::new(),
            camera,
            orbit: None,
            loader,
        }
    }

    /// Builds the camera, orbit controller and file loader described by `config`.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        config.validate()?;

        let camera_config = &config.camera;
        let position = Vector3::from(camera_config.position);
        let target = Vector3::from(camera_config.target);

        let mut camera = Camera::perspective(
            camera_config.fov_y,
            config.aspect(),
            camera_config.near,
            camera_config.far,
        )?;
        camera.transform.position = position;
        camera.look_at(target)?;

        let mut scene = Self::new(camera, LoadingManager::from_config(&config.loader)?);
        if config.orbit.enabled {
            scene.orbit = Some(OrbitController::new(
                &config.orbit,
                OrbitTarget::Point(target),
                position - target,
            ));
        }
        Ok(scene)
    }

    pub fn with_orbit(mut self, orbit: OrbitController) -> Self {
        self.orbit = Some(orbit);
        self
    }

    /// Adds a node under the scene root
    pub fn add(&mut self, node: TransformNode) -> NodeId {
        self.graph.add_to_root(node)
    }

    /// Starts loading a texture; the handle fills in once the load settles
    pub fn load_texture(&mut self, url: &str) -> Texture {
        self.loader.load_texture(url)
    }

    /// Returns statistics about the scene for debugging and UI display
    pub fn statistics(&self) -> SceneStatistics {
        let mut stats = SceneStatistics {
            node_count: self.graph.len(),
            pending_loads: self.loader.pending(),
            ..Default::default()
        };

        for (_, node) in self.graph.iter() {
            stats.reachable_nodes += 1;
            if let NodeKind::Mesh { geometry, .. } = &node.kind {
                stats.mesh_count += 1;
                stats.total_vertices += geometry.vertex_count();
                stats.total_triangles += geometry.triangle_count();
            }
        }
        stats
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SceneStatistics {
    /// Live nodes, detached subtrees included
    pub node_count: usize,
    /// Nodes reachable from the root
    pub reachable_nodes: usize,
    pub mesh_count: usize,
    pub total_triangles: usize,
    pub total_vertices: usize,
    pub pending_loads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::primitives::generate_box,
        resources::{material::BasicMaterial, InlineExecutor, MemorySource},
    };
    use std::{rc::Rc, sync::Arc};

    #[test]
    fn test_statistics_count_reachable_meshes() {
        let camera = Camera::perspective(55.0, 1.0, 0.1, 100.0).unwrap();
        let loader = LoadingManager::new(Arc::new(MemorySource::new()), Box::new(InlineExecutor));
        let mut scene = Scene::new(camera, loader);

        let cube = Rc::new(generate_box(1.0, 1.0, 1.0));
        let group = scene.add(TransformNode::group("group"));
        for i in 0..3 {
            let name = format!("cube{i}");
            scene
                .graph
                .add(group, TransformNode::mesh(name, cube.clone(), BasicMaterial::default()))
                .unwrap();
        }
        let loose = scene
            .graph
            .create(TransformNode::mesh("loose", cube.clone(), BasicMaterial::default()));
        scene.add(TransformNode::axes("axes", 2.0));
        scene.load_texture("door.jpg");

        let stats = scene.statistics();
        assert!(scene.graph.contains(loose));
        assert_eq!(stats.node_count, 7);
        assert_eq!(stats.reachable_nodes, 6);
        assert_eq!(stats.mesh_count, 3);
        assert_eq!(stats.total_triangles, 36);
        assert_eq!(stats.total_vertices, 72);
        assert_eq!(stats.pending_loads, 1);
    }

    #[test]
    fn test_from_config_aims_camera_at_target() {
        let scene = Scene::from_config(&AppConfig::default()).unwrap();
        assert!((scene.camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
        assert!((scene.camera.forward().z + 1.0).abs() < 1e-4);
        assert!(scene.orbit.is_some());
    }

    #[test]
    fn test_from_config_rejects_zero_sized_window() {
        let config = AppConfig::default().with_size(0, 600);
        assert!(matches!(Scene::from_config(&config), Err(crate::Error::Config(_))));
    }
}
