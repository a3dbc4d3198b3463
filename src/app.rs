use std::{future::Future, sync::Arc};

use futures::future::{FutureExt, LocalBoxFuture};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::AppConfig,
    gfx::scene::{NodeId, Scene, TransformNode},
    input::{InputEvent, PointerTracker},
    scheduler::{FrameHost, FrameScheduler, FrameTime, RenderSink},
};

/// Builds the render sink once the window exists.
pub type SinkFactory<R> = Box<dyn FnOnce(Arc<Window>) -> LocalBoxFuture<'static, anyhow::Result<R>>>;

/// Desktop host: owns the window, translates its events and ticks the scheduler
/// on every redraw.
pub struct ThistleApp<R: RenderSink> {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState<R>,
}

struct AppState<R: RenderSink> {
    config: AppConfig,
    window: Option<Arc<Window>>,
    sink: Option<R>,
    sink_factory: Option<SinkFactory<R>>,
    scene: Scene,
    scheduler: FrameScheduler,
    pointer: PointerTracker,
    fatal: Option<anyhow::Error>,
}

/// Requests the next tick through the window's redraw queue.
struct WindowFrameHost<'a> {
    window: &'a Window,
}

impl FrameHost for WindowFrameHost<'_> {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

impl<R: RenderSink + 'static> ThistleApp<R> {
    /// Create a new application; `factory` runs once the window has been created
    pub fn new<F, Fut>(config: AppConfig, factory: F) -> anyhow::Result<Self>
    where
        F: FnOnce(Arc<Window>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
    {
        let event_loop = EventLoop::new()?;
        let scene = Scene::from_config(&config)?;
        let scheduler = FrameScheduler::realtime().with_max_pixel_density(config.max_pixel_density);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                sink: None,
                sink_factory: Some(Box::new(move |window| factory(window).boxed_local())),
                scene,
                scheduler,
                pointer: PointerTracker::new(),
                fatal: None,
            },
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.app_state.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    /// Adds a node under the scene root
    pub fn add(&mut self, node: TransformNode) -> NodeId {
        self.app_state.scene.add(node)
    }

    pub fn add_update_hook<F>(&mut self, node: NodeId, hook: F)
    where
        F: FnMut(&mut TransformNode, &FrameTime) -> anyhow::Result<()> + 'static,
    {
        self.app_state.scheduler.add_update_hook(node, hook);
    }

    /// Run the application (consumes self and blocks until the window closes)
    pub fn run(mut self) -> anyhow::Result<()> {
        let Some(event_loop) = self.event_loop.take() else {
            anyhow::bail!("event loop already consumed");
        };
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<R: RenderSink> AppState<R> {
    fn input(&mut self, event: InputEvent) {
        self.scheduler.handle_input(&mut self.scene, event);
    }

    fn redraw(&mut self) {
        let (Some(window), Some(sink)) = (self.window.as_ref(), self.sink.as_mut()) else {
            return;
        };
        let mut host = WindowFrameHost { window };
        if let Err(err) = self.scheduler.tick(&mut self.scene, sink, &mut host) {
            log::error!("{err:#}");
        }
    }
}

impl<R: RenderSink> ApplicationHandler for AppState<R> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(factory) = self.sink_factory.take() else {
            return;
        };

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                self.fatal = Some(err.into());
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(factory(window.clone())) {
            Ok(sink) => self.sink = Some(sink),
            Err(err) => {
                log::error!("failed to create render sink: {err:#}");
                self.fatal = Some(err);
                event_loop.exit();
                return;
            }
        }

        let PhysicalSize { width, height } = window.inner_size();
        self.input(InputEvent::Resize { width, height });
        self.input(InputEvent::PixelDensity(window.scale_factor()));
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.input(InputEvent::Resize { width, height });
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.input(InputEvent::PixelDensity(scale_factor));
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(event) = self.pointer.cursor_moved(position) {
                    self.input(event);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(event) = self.pointer.button(button, state) {
                    self.input(event);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                let event = self.pointer.cursor_left();
                self.input(event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let event = self.pointer.wheel(delta);
                self.input(event);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }
}
