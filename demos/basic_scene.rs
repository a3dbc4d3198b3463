//! # Basic Scene Demo
//!
//! A box, an axes helper and a rotating group of three cubes under an orbit
//! camera. The first cube is textured with `assets/door.jpg`; until that load
//! settles it draws with the placeholder.
//!
//! The sink only logs what it would draw, once a second.
//!
//! Run with `RUST_LOG=debug cargo run --example basic_scene`.

use std::{rc::Rc, sync::Arc, time::Instant};

use thistle::prelude::*;
use winit::window::Window;

struct LoggingSink {
    window: Arc<Window>,
    last_report: Instant,
    frames: u32,
}

impl RenderSink for LoggingSink {
    fn resize(&mut self, width: u32, height: u32) {
        log::info!("surface {:?}: {width}x{height}", self.window.id());
    }

    fn set_pixel_density(&mut self, ratio: f64) {
        log::info!("pixel density {ratio}");
    }

    fn submit(&mut self, graph: &SceneGraph, camera: &Camera) -> anyhow::Result<()> {
        self.frames += 1;
        if self.last_report.elapsed().as_secs_f32() < 1.0 {
            return Ok(());
        }

        let meshes = graph
            .iter()
            .filter(|(_, node)| node.visible && matches!(node.kind, NodeKind::Mesh { .. }))
            .count();
        let textured = graph
            .iter()
            .filter_map(|(_, node)| node.material())
            .filter(|material| material.map_ready())
            .count();
        let eye = camera.position();
        log::info!(
            "{} frames, {meshes} meshes ({textured} textured), eye ({:.2}, {:.2}, {:.2})",
            self.frames,
            eye.x,
            eye.y,
            eye.z
        );

        self.frames = 0;
        self.last_report = Instant::now();
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env().with_title("thistle: basic scene");
    let mut app = ThistleApp::new(config, |window| async move {
        Ok(LoggingSink {
            window,
            last_report: Instant::now(),
            frames: 0,
        })
    })?;

    let door = app.scene_mut().loader.load(
        "door.jpg",
        LoadCallbacks::new()
            .on_progress(|loaded, total| log::debug!("door.jpg {loaded}/{total} bytes"))
            .on_load(|texture| log::info!("door.jpg ready: {:?}", texture.size()))
            .on_error(|err| log::warn!("{err}; keeping the placeholder")),
    );

    let cube = Rc::new(generate_box(1.0, 1.0, 1.0));

    app.add(TransformNode::mesh(
        "box",
        Rc::new(generate_box(1.5, 0.5, 0.5)),
        BasicMaterial::from_hex("red", 0xff0000).with_wireframe(true),
    ));
    app.add(TransformNode::axes("axes", 2.0));

    let group = app.add(
        TransformNode::group("cubes").with_transform(Transform::from_position(0.0, 1.5, 0.0)),
    );
    let colours = [0x44aa88, 0x8844aa, 0xaa8844];
    for (i, hex) in colours.into_iter().enumerate() {
        let mut material = BasicMaterial::from_hex(&format!("cube{i}"), hex);
        if i == 0 {
            material = material.with_map(door.clone());
        }
        let offset = (i as f32 - 1.0) * 2.0;
        let node = TransformNode::mesh(format!("cube{i}"), cube.clone(), material)
            .with_transform(Transform::from_position(offset, 0.0, 0.0));
        let id = app.scene_mut().graph.add(group, node)?;

        let speed = 1.0 + i as f32 * 0.1;
        app.add_update_hook(id, move |node, time| {
            let angle = time.elapsed_secs() * speed;
            node.transform
                .set_euler(Euler::new(angle, angle, 0.0, EulerOrder::YXZ));
            Ok(())
        });
    }

    app.add_update_hook(group, |node, time| {
        node.transform.rotate_y(Rad(0.3 * time.delta_secs()));
        Ok(())
    });

    app.run()
}
