//! Cooperative frame loop.
//!
//! [`FrameScheduler::tick`] is the only place scene state changes during a
//! frame. Each tick runs, in order:
//!
//! 1. pending resize and pixel-density changes, applied to the camera and the sink
//! 2. clock sample
//! 3. loader delivery, so load callbacks run on this thread
//! 4. per-node update hooks
//! 5. orbit controller update
//! 6. world transform pass
//! 7. submission to the [`RenderSink`]
//! 8. exactly one [`FrameHost::request_frame`]

pub mod clock;

use std::panic::{self, AssertUnwindSafe};

use anyhow::Context;

use crate::{
    gfx::{
        camera::Camera,
        scene::{graph::SceneGraph, NodeId, Scene, TransformNode},
    },
    input::InputEvent,
    performance::FrameStats,
};

pub use clock::{Clock, FrameTime, InstantSource, ManualTime, TimeSource};

/// The renderer the scene is handed to every tick.
///
/// `resize` and `set_pixel_density` are always delivered before the
/// `submit` that should observe them.
pub trait RenderSink {
    fn resize(&mut self, width: u32, height: u32);
    fn set_pixel_density(&mut self, ratio: f64);
    fn submit(&mut self, graph: &SceneGraph, camera: &Camera) -> anyhow::Result<()>;
}

/// The host's frame-boundary primitive.
pub trait FrameHost {
    /// Ask for one more tick. Called once per completed tick.
    fn request_frame(&mut self);
}

/// Per-node update, run once per tick before world transforms are computed.
pub type UpdateHook = Box<dyn FnMut(&mut TransformNode, &FrameTime) -> anyhow::Result<()>>;

/// An update hook that returned an error or panicked during a tick.
#[derive(Debug, Clone)]
pub struct HookFailure {
    pub node: NodeId,
    pub name: String,
    pub message: String,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub time: FrameTime,
    /// Surface size applied at the start of this tick, if any.
    pub resized: Option<(u32, u32)>,
    pub loads_settled: usize,
    pub hooks_run: usize,
    pub nodes_updated: usize,
    pub hook_failures: Vec<HookFailure>,
}

struct RegisteredHook {
    node: NodeId,
    hook: UpdateHook,
}

pub struct FrameScheduler {
    clock: Clock,
    hooks: Vec<RegisteredHook>,
    pending_resize: Option<(u32, u32)>,
    pending_density: Option<f64>,
    max_pixel_density: f64,
    stats: FrameStats,
}

impl FrameScheduler {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            hooks: Vec::new(),
            pending_resize: None,
            pending_density: None,
            max_pixel_density: 2.0,
            stats: FrameStats::new(),
        }
    }

    pub fn realtime() -> Self {
        Self::new(Clock::realtime())
    }

    /// Upper bound for densities forwarded to the sink. Non-positive or NaN
    /// bounds are ignored and the previous bound is kept.
    pub fn with_max_pixel_density(mut self, max: f64) -> Self {
        if max > 0.0 {
            self.max_pixel_density = max;
        } else {
            log::warn!("ignoring max pixel density {max}, keeping {}", self.max_pixel_density);
        }
        self
    }

    /// Runs `hook` against `node` every tick until the node is removed.
    pub fn add_update_hook<F>(&mut self, node: NodeId, hook: F)
    where
        F: FnMut(&mut TransformNode, &FrameTime) -> anyhow::Result<()> + 'static,
    {
        self.hooks.push(RegisteredHook {
            node,
            hook: Box::new(hook),
        });
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Routes one host event.
    ///
    /// Resize and density changes are held until the next tick; pointer
    /// events go straight to the orbit controller. Returns true when the
    /// event was consumed.
    pub fn handle_input(&mut self, scene: &mut Scene, event: InputEvent) -> bool {
        match event {
            InputEvent::Resize { width, height } => {
                self.pending_resize = Some((width, height));
                true
            }
            InputEvent::PixelDensity(ratio) => {
                self.pending_density = Some(ratio);
                true
            }
            _ => scene
                .orbit
                .as_mut()
                .is_some_and(|orbit| orbit.handle_input(&event)),
        }
    }

    /// Runs one frame. See the module docs for the order of steps.
    ///
    /// Hook failures and camera faults are logged and reported without
    /// stopping the frame. A sink error is returned after the next frame has
    /// already been requested.
    pub fn tick(
        &mut self,
        scene: &mut Scene,
        sink: &mut dyn RenderSink,
        host: &mut dyn FrameHost,
    ) -> anyhow::Result<TickReport> {
        let mut report = TickReport {
            resized: self.apply_surface_changes(&mut scene.camera, sink),
            ..Default::default()
        };

        report.time = self.clock.sample();
        self.stats.record(report.time.delta);

        report.loads_settled = scene.loader.poll();

        self.run_hooks(&mut scene.graph, &mut report);

        if let Some(orbit) = scene.orbit.as_mut() {
            if let Err(err) = orbit.update(&mut scene.camera, &scene.graph) {
                log::warn!("orbit update skipped: {err}");
            }
        }

        report.nodes_updated = scene.graph.compute_world_transforms();
        self.stats
            .update_scene_stats(report.nodes_updated, report.hook_failures.len());

        let submitted = sink.submit(&scene.graph, &scene.camera);
        host.request_frame();

        submitted.with_context(|| format!("submitting frame {}", report.time.frame))?;
        Ok(report)
    }

    fn apply_surface_changes(
        &mut self,
        camera: &mut Camera,
        sink: &mut dyn RenderSink,
    ) -> Option<(u32, u32)> {
        match self.pending_density.take() {
            Some(ratio) if ratio.is_finite() && ratio > 0.0 => {
                sink.set_pixel_density(ratio.min(self.max_pixel_density));
            }
            Some(ratio) => log::warn!("dropping invalid pixel density {ratio}"),
            None => (),
        }

        let (width, height) = self.pending_resize.take()?;
        if width == 0 || height == 0 {
            log::debug!("skipping resize to {width}x{height}");
            return None;
        }

        camera.set_viewport(width, height);
        if let Err(err) = camera.update_projection() {
            log::warn!("projection not updated after resize: {err}");
        }
        sink.resize(width, height);
        log::debug!("surface resized to {width}x{height}");
        Some((width, height))
    }

    fn run_hooks(&mut self, graph: &mut SceneGraph, report: &mut TickReport) {
        let time = report.time;

        self.hooks.retain_mut(|registered| {
            let Some(node) = graph.get_mut(registered.node) else {
                log::debug!("dropping update hook for removed {}", registered.node);
                return false;
            };

            let hook = &mut registered.hook;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook(node, &time)));
            report.hooks_run += 1;

            let message = match outcome {
                Ok(Ok(())) => return true,
                Ok(Err(err)) => format!("{err:#}"),
                Err(payload) => panic_message(payload.as_ref()),
            };
            log::error!("update hook for `{}` failed: {message}", node.name);
            report.hook_failures.push(HookFailure {
                node: registered.node,
                name: node.name.clone(),
                message,
            });
            true
        });
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::OrbitConfig,
        gfx::{
            camera::{OrbitController, OrbitTarget},
            resources::{InlineExecutor, LoadingManager, MemorySource},
            scene::transform::Transform,
        },
    };
    use cgmath::{Quaternion, Rad, Rotation3, Vector3};
    use std::{cell::RefCell, rc::Rc, sync::Arc, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum SinkCall {
        Resize(u32, u32),
        Density(f64),
        Submit { aspect: f32, nodes: usize },
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<SinkCall>,
        fail: bool,
    }

    impl RenderSink for RecordingSink {
        fn resize(&mut self, width: u32, height: u32) {
            self.calls.push(SinkCall::Resize(width, height));
        }

        fn set_pixel_density(&mut self, ratio: f64) {
            self.calls.push(SinkCall::Density(ratio));
        }

        fn submit(&mut self, graph: &SceneGraph, camera: &Camera) -> anyhow::Result<()> {
            self.calls.push(SinkCall::Submit {
                aspect: camera.aspect(),
                nodes: graph.iter().count(),
            });
            if self.fail {
                anyhow::bail!("device lost");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingHost {
        requests: usize,
    }

    impl FrameHost for CountingHost {
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }

    fn scene() -> Scene {
        let camera = Camera::perspective(55.0, 800.0 / 600.0, 0.1, 1000.0)
            .unwrap()
            .with_position(0.0, 0.0, 5.0);
        let loader = LoadingManager::new(Arc::new(MemorySource::new()), Box::new(InlineExecutor));
        Scene::new(camera, loader)
    }

    fn manual_scheduler() -> (FrameScheduler, ManualTime) {
        let time = ManualTime::new();
        (FrameScheduler::new(Clock::new(Box::new(time.clone()))), time)
    }

    /// Ticks until `total` has elapsed, in steps of `step`.
    fn run_for(
        scheduler: &mut FrameScheduler,
        time: &ManualTime,
        scene: &mut Scene,
        step: Duration,
        total: Duration,
    ) {
        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());
        scheduler.tick(scene, &mut sink, &mut host).unwrap();
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            time.advance(step);
            elapsed += step;
            scheduler.tick(scene, &mut sink, &mut host).unwrap();
        }
    }

    #[test]
    fn test_elapsed_driven_rotation_is_frame_rate_independent() {
        let orientations: Vec<Quaternion<f32>> = [1, 7, 60]
            .into_iter()
            .map(|ticks| {
                let mut scene = scene();
                let cube = scene.add(TransformNode::group("cube"));
                let (mut scheduler, time) = manual_scheduler();
                scheduler.add_update_hook(cube, |node, time| {
                    node.transform.rotation = Quaternion::from_angle_y(Rad(time.elapsed_secs()));
                    Ok(())
                });

                let total = Duration::from_millis(1050);
                run_for(&mut scheduler, &time, &mut scene, total / ticks, total);
                scene.graph.node(cube).unwrap().transform.rotation
            })
            .collect();

        assert_eq!(orientations[0], orientations[1]);
        assert_eq!(orientations[0], orientations[2]);
    }

    #[test]
    fn test_delta_integrated_rotation_only_approximately_agrees() {
        let angles: Vec<f32> = [1u32, 10]
            .into_iter()
            .map(|ticks| {
                let mut scene = scene();
                let cube = scene.add(TransformNode::group("cube"));
                let (mut scheduler, time) = manual_scheduler();
                let angle = Rc::new(RefCell::new(0.0f32));
                let accumulated = angle.clone();
                scheduler.add_update_hook(cube, move |node, time| {
                    *accumulated.borrow_mut() += 0.7 * time.delta_secs();
                    node.transform.rotation =
                        Quaternion::from_angle_y(Rad(*accumulated.borrow()));
                    Ok(())
                });

                let total = Duration::from_millis(1000);
                run_for(&mut scheduler, &time, &mut scene, total / ticks, total);
                let value = *angle.borrow();
                value
            })
            .collect();

        assert!((angles[0] - 0.7).abs() < 1e-6);
        assert!((angles[0] - angles[1]).abs() < 1e-4);
    }

    #[test]
    fn test_resize_reaches_camera_and_sink_before_submit() {
        let mut scene = scene();
        let (mut scheduler, _time) = manual_scheduler();
        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());

        scheduler.handle_input(&mut scene, InputEvent::Resize { width: 800, height: 600 });
        scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();
        scheduler.handle_input(&mut scene, InputEvent::Resize { width: 400, height: 300 });
        let report = scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();

        assert_eq!(report.resized, Some((400, 300)));
        let tail = &sink.calls[sink.calls.len() - 2..];
        assert_eq!(tail[0], SinkCall::Resize(400, 300));
        match tail[1] {
            SinkCall::Submit { aspect, .. } => assert!((aspect - 400.0 / 300.0).abs() < 1e-6),
            ref other => panic!("expected submit, got {other:?}"),
        }
        assert_eq!(
            scene.camera.projection_matrix(),
            cgmath::perspective(cgmath::Deg(55.0), 400.0 / 300.0, 0.1, 1000.0)
        );
    }

    #[test]
    fn test_pixel_density_is_clamped() {
        let mut scene = scene();
        let (mut scheduler, _time) = manual_scheduler();
        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());

        scheduler.handle_input(&mut scene, InputEvent::PixelDensity(3.0));
        scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();
        assert_eq!(sink.calls[0], SinkCall::Density(2.0));
    }

    #[test]
    fn test_bad_density_bound_and_values_do_not_reach_sink() {
        let mut scene = scene();
        let (scheduler, _time) = manual_scheduler();
        let mut scheduler = scheduler.with_max_pixel_density(0.0).with_max_pixel_density(f64::NAN);
        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());

        scheduler.handle_input(&mut scene, InputEvent::PixelDensity(1.0));
        scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();
        assert_eq!(sink.calls[0], SinkCall::Density(1.0));

        for ratio in [f64::NAN, 0.0, -1.5, f64::INFINITY] {
            sink.calls.clear();
            scheduler.handle_input(&mut scene, InputEvent::PixelDensity(ratio));
            scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();
            assert!(
                !sink.calls.iter().any(|call| matches!(call, SinkCall::Density(_))),
                "density {ratio} was forwarded"
            );
        }
        assert_eq!(host.requests, 5);
    }

    #[test]
    fn test_one_frame_request_per_tick_even_when_submit_fails() {
        let mut scene = scene();
        let (mut scheduler, time) = manual_scheduler();
        let mut sink = RecordingSink::default();
        let mut host = CountingHost::default();

        for _ in 0..5 {
            time.advance(Duration::from_millis(16));
            scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();
        }
        assert_eq!(host.requests, 5);

        sink.fail = true;
        let err = scheduler.tick(&mut scene, &mut sink, &mut host).unwrap_err();
        assert!(format!("{err:#}").contains("device lost"));
        assert_eq!(host.requests, 6);
        assert_eq!(scheduler.stats().frames(), 6);
    }

    #[test]
    fn test_failing_hook_does_not_stop_the_frame() {
        let mut scene = scene();
        let bad = scene.add(TransformNode::group("bad"));
        let panicky = scene.add(TransformNode::group("panicky"));
        let good = scene.add(TransformNode::group("good"));
        let (mut scheduler, time) = manual_scheduler();

        scheduler.add_update_hook(bad, |_, _| anyhow::bail!("bad input"));
        scheduler.add_update_hook(panicky, |_, _| panic!("boom"));
        scheduler.add_update_hook(good, |node, _| {
            node.transform.position.x += 1.0;
            Ok(())
        });

        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());
        time.advance(Duration::from_millis(16));
        let report = scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();

        assert_eq!(report.hooks_run, 3);
        let failed: Vec<&str> = report.hook_failures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, ["bad", "panicky"]);
        assert!(report.hook_failures[1].message.contains("boom"));
        assert_eq!(scene.graph.node(good).unwrap().transform.position.x, 1.0);
        assert!(matches!(sink.calls.last(), Some(SinkCall::Submit { nodes: 4, .. })));
        assert_eq!(scheduler.stats().metrics().hook_failures, 2);
    }

    #[test]
    fn test_hooks_for_removed_nodes_are_dropped() {
        let mut scene = scene();
        let node = scene.add(TransformNode::group("doomed"));
        let (mut scheduler, _time) = manual_scheduler();
        scheduler.add_update_hook(node, |_, _| Ok(()));

        scene.graph.remove(node).unwrap();
        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());
        let report = scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();

        assert_eq!(report.hooks_run, 0);
        assert_eq!(scheduler.hook_count(), 0);
    }

    #[test]
    fn test_world_transforms_fresh_at_submit() {
        let mut scene = scene();
        let parent = scene.add(TransformNode::group("parent").with_transform(Transform::from_position(1.0, 0.0, 0.0)));
        let child = scene.graph.add(parent, TransformNode::group("child")).unwrap();
        let (mut scheduler, time) = manual_scheduler();
        scheduler.add_update_hook(parent, |node, time| {
            node.transform.position.y = time.elapsed_secs();
            Ok(())
        });

        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());
        time.advance(Duration::from_secs(2));
        scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();

        assert_eq!(scene.graph.world_position(child), Some(Vector3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_pointer_input_drives_orbit() {
        let mut scene = scene().with_orbit(OrbitController::new(
            &OrbitConfig {
                damping: 0.0,
                ..Default::default()
            },
            OrbitTarget::Point(Vector3::new(0.0, 0.0, 0.0)),
            Vector3::new(0.0, 0.0, 5.0),
        ));
        let (mut scheduler, _time) = manual_scheduler();

        assert!(scheduler.handle_input(&mut scene, InputEvent::PointerDown { x: 0.0, y: 0.0 }));
        assert!(scheduler.handle_input(&mut scene, InputEvent::PointerMove { dx: 100.0, dy: 0.0 }));
        scheduler.handle_input(&mut scene, InputEvent::PointerUp);

        let (mut sink, mut host) = (RecordingSink::default(), CountingHost::default());
        scheduler.tick(&mut scene, &mut sink, &mut host).unwrap();

        let position = scene.camera.position();
        assert!(position.x > 0.0);
        assert!(((position.x * position.x + position.z * position.z).sqrt() - 5.0).abs() < 1e-4);
    }
}
