use anyhow::{Context, Result};

use crate::backend::Backend;
use crate::capability::CapabilityLevel;
use crate::deferred::{DeferredQueue, DeferredSender};
use crate::error::ConfigError;
use crate::layer::{LAYER_COUNT, Layer, LayerId};
use crate::settings::SettingsResolver;
use crate::task::{RenderTask, run_phases};

use super::{EngineConfig, FlushStats};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum EngineState {
    Uninitialized,
    Ready { capability: CapabilityLevel },
}

/// Layered render-task scheduler.
///
/// Owns a fixed table of [`LAYER_COUNT`] layers. Each frame, [`flush`](Self::flush)
/// walks the layers in ascending index order, resolves settings for the
/// non-empty ones, runs their tasks in insertion order, clears them, and then
/// drains the deferred queue.
///
/// Everything except [`run_on_render_thread`](Self::run_on_render_thread) and
/// [`deferred_sender`](Self::deferred_sender) belongs to the render thread.
pub struct RenderEngine<B: ?Sized> {
    layers: [Layer<B>; LAYER_COUNT],
    resolver: Box<dyn SettingsResolver>,
    deferred: DeferredQueue,
    state: EngineState,
}

impl<B: ?Sized> RenderEngine<B> {
    pub fn new<R>(resolver: R) -> Self
    where
        R: SettingsResolver + 'static,
    {
        Self::with_config(EngineConfig::default(), resolver)
    }

    pub fn with_config<R>(config: EngineConfig, resolver: R) -> Self
    where
        R: SettingsResolver + 'static,
    {
        Self {
            layers: std::array::from_fn(|_| Layer::with_capacity(config.layer_capacity)),
            resolver: Box::new(resolver),
            deferred: DeferredQueue::new(),
            state: EngineState::Uninitialized,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready { .. })
    }

    /// Negotiated capability level; [`CapabilityLevel::LOWEST`] until initialized.
    pub fn capability(&self) -> CapabilityLevel {
        match self.state {
            EngineState::Ready { capability } => capability,
            EngineState::Uninitialized => CapabilityLevel::LOWEST,
        }
    }

    /// Appends `task` to `layer`.
    ///
    /// # Panics
    /// If the engine is not initialized or `layer` is out of range.
    pub fn enqueue<T>(&mut self, layer: LayerId, task: T)
    where
        T: RenderTask<B> + 'static,
    {
        self.layer_mut(layer).push(Box::new(task));
    }

    /// Appends every task from `tasks` to `layer`, preserving their order.
    ///
    /// # Panics
    /// If the engine is not initialized or `layer` is out of range.
    pub fn enqueue_all<I>(&mut self, layer: LayerId, tasks: I)
    where
        I: IntoIterator<Item = Box<dyn RenderTask<B>>>,
    {
        self.layer_mut(layer).extend(tasks);
    }

    /// Tasks currently queued on `layer`.
    ///
    /// # Panics
    /// If `layer` is out of range.
    pub fn layer(&self, layer: LayerId) -> &Layer<B> {
        match LayerId::checked(layer.index()) {
            Ok(id) => &self.layers[id.index()],
            Err(err) => panic!("{err}"),
        }
    }

    /// Schedules `task` to run on the render thread at the end of the next flush.
    ///
    /// Callable from any thread, in any engine state.
    pub fn run_on_render_thread<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.deferred.submit(task);
    }

    /// Producer handle for threads that do not own the engine.
    pub fn deferred_sender(&self) -> DeferredSender {
        self.deferred.sender()
    }

    fn layer_mut(&mut self, layer: LayerId) -> &mut Layer<B> {
        if !self.is_ready() {
            panic!("{}", ConfigError::NotInitialized);
        }
        match LayerId::checked(layer.index()) {
            Ok(id) => &mut self.layers[id.index()],
            Err(err) => panic!("{err}"),
        }
    }
}

impl<B> RenderEngine<B>
where
    B: Backend + ?Sized,
{
    /// Prepares the backend and negotiates the capability level.
    ///
    /// Runs backend setup, then asset preparation, then reads the driver version.
    /// An absent or malformed version degrades to [`CapabilityLevel::LOWEST`]
    /// instead of failing. Meant to be called exactly once.
    pub fn initialize(&mut self, backend: &mut B) -> Result<CapabilityLevel> {
        if self.is_ready() {
            log::warn!("render engine initialized twice; re-running backend setup");
        }

        backend.setup().context("graphics backend setup failed")?;
        backend
            .prepare_assets()
            .context("render asset preparation failed")?;

        let version = backend.driver_version();
        let capability = CapabilityLevel::negotiate(version.as_deref());

        self.state = EngineState::Ready { capability };
        log::debug!("render engine ready at {capability:?}");

        Ok(capability)
    }

    /// Executes and clears every layer, then drains deferred work.
    ///
    /// `time_fraction` is the progress through the current tick, in `[0, 1)`.
    /// Empty layers are skipped without resolving their settings. A task that
    /// fails is logged and skipped; the rest of the frame proceeds.
    ///
    /// # Panics
    /// If the engine is not initialized, or a non-empty layer has no settings case.
    /// In the latter case that layer's tasks are dropped first, so the engine stays
    /// usable; layers after it keep their tasks for the next flush.
    pub fn flush(&mut self, backend: &mut B, time_fraction: f32) -> FlushStats {
        debug_assert!(
            (0.0..1.0).contains(&time_fraction),
            "time fraction {time_fraction} outside [0, 1)"
        );

        let EngineState::Ready { capability } = self.state else {
            panic!("{}", ConfigError::NotInitialized);
        };

        backend.enable_blending();

        let mut stats = FlushStats::default();

        for (id, layer) in LayerId::all().zip(self.layers.iter_mut()) {
            if layer.is_empty() {
                continue;
            }

            let settings = match self.resolver.resolve(id, time_fraction) {
                Ok(settings) => settings,
                Err(err) => {
                    // Drop the offending tasks so the next flush starts clean.
                    layer.clear();
                    panic!("{err}");
                }
            };

            backend.set_culling(settings.culling);

            for task in layer.iter_mut() {
                stats.tasks_executed += 1;
                if let Err(err) = run_phases(task, backend, capability, &settings.transform) {
                    stats.tasks_failed += 1;
                    log::warn!("render task on {id} failed: {err:#}");
                }
            }

            layer.clear();
            stats.layers_flushed += 1;
        }

        stats.deferred_executed = self.deferred.drain_once();

        log::trace!("flush: {stats}");
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use anyhow::bail;
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::settings::{LayerSettings, StandardResolver};

    type Journal = Arc<Mutex<Vec<String>>>;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Setup,
        PrepareAssets,
        Blend,
        Cull(bool),
        Init(&'static str, Mat4, CapabilityLevel),
        Draw(&'static str),
        Cleanup(&'static str),
    }

    #[derive(Default)]
    struct FakeBackend {
        version: Option<String>,
        fail_setup: bool,
        events: Vec<Event>,
    }

    impl FakeBackend {
        fn with_version(version: &str) -> Self {
            Self {
                version: Some(version.to_owned()),
                ..Self::default()
            }
        }

        fn draws(&self) -> Vec<&'static str> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Draw(tag) => Some(*tag),
                    _ => None,
                })
                .collect()
        }
    }

    impl Backend for FakeBackend {
        fn setup(&mut self) -> Result<()> {
            self.events.push(Event::Setup);
            if self.fail_setup {
                bail!("no context");
            }
            Ok(())
        }

        fn prepare_assets(&mut self) -> Result<()> {
            self.events.push(Event::PrepareAssets);
            Ok(())
        }

        fn driver_version(&self) -> Option<String> {
            self.version.clone()
        }

        fn enable_blending(&mut self) {
            self.events.push(Event::Blend);
        }

        fn set_culling(&mut self, enabled: bool) {
            self.events.push(Event::Cull(enabled));
        }
    }

    struct Tagged {
        tag: &'static str,
        fail_draw: bool,
        journal: Option<Journal>,
        on_draw: Option<Box<dyn FnOnce()>>,
    }

    fn task(tag: &'static str) -> Tagged {
        Tagged {
            tag,
            fail_draw: false,
            journal: None,
            on_draw: None,
        }
    }

    impl RenderTask<FakeBackend> for Tagged {
        fn init_rendering(
            &mut self,
            backend: &mut FakeBackend,
            capability: CapabilityLevel,
            transform: &Mat4,
        ) -> Result<()> {
            backend.events.push(Event::Init(self.tag, *transform, capability));
            Ok(())
        }

        fn draw(&mut self, backend: &mut FakeBackend, _: CapabilityLevel) -> Result<()> {
            backend.events.push(Event::Draw(self.tag));
            if let Some(journal) = &self.journal {
                journal.lock().unwrap().push(format!("task {}", self.tag));
            }
            if let Some(hook) = self.on_draw.take() {
                hook();
            }
            if self.fail_draw {
                bail!("{} exploded", self.tag);
            }
            Ok(())
        }

        fn cleanup_rendering(&mut self, backend: &mut FakeBackend, _: CapabilityLevel) -> Result<()> {
            backend.events.push(Event::Cleanup(self.tag));
            Ok(())
        }
    }

    /// Resolver that counts calls and encodes the layer index in the transform.
    struct CountingResolver {
        calls: Rc<Cell<usize>>,
    }

    impl SettingsResolver for CountingResolver {
        fn resolve(&self, layer: LayerId, _: f32) -> Result<LayerSettings, ConfigError> {
            self.calls.set(self.calls.get() + 1);
            Ok(LayerSettings {
                transform: layer_transform(layer),
                culling: layer != LayerId::HUD,
            })
        }
    }

    fn layer_transform(layer: LayerId) -> Mat4 {
        Mat4::from_translation(Vec3::splat(layer.index() as f32))
    }

    fn engine() -> (RenderEngine<FakeBackend>, Rc<Cell<usize>>, FakeBackend) {
        let calls = Rc::new(Cell::new(0));
        let mut engine = RenderEngine::new(CountingResolver {
            calls: Rc::clone(&calls),
        });
        let mut backend = FakeBackend::with_version("4.6.0 NVIDIA 535.54.03");
        engine.initialize(&mut backend).unwrap();
        backend.events.clear();
        (engine, calls, backend)
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    // ── initialization ────────────────────────────────────────────────────

    #[test]
    fn initialize_runs_setup_then_assets() {
        let mut engine = RenderEngine::<FakeBackend>::new(CountingResolver {
            calls: Rc::default(),
        });
        let mut backend = FakeBackend::with_version("3.3 (Core Profile) Mesa 23.2.1");

        assert!(!engine.is_ready());
        let capability = engine.initialize(&mut backend).unwrap();

        assert!(engine.is_ready());
        assert_eq!(capability, CapabilityLevel::Core);
        assert_eq!(engine.capability(), CapabilityLevel::Core);
        assert_eq!(backend.events, [Event::Setup, Event::PrepareAssets]);
    }

    #[test]
    fn unparsable_version_falls_back_to_lowest() {
        let mut engine = RenderEngine::<FakeBackend>::new(CountingResolver {
            calls: Rc::default(),
        });
        let mut backend = FakeBackend::with_version("Intel Open Source Technology Center");

        let capability = engine.initialize(&mut backend).unwrap();

        assert!(engine.is_ready());
        assert_eq!(capability, CapabilityLevel::LOWEST);
    }

    #[test]
    fn missing_version_falls_back_to_lowest() {
        let mut engine = RenderEngine::<FakeBackend>::new(CountingResolver {
            calls: Rc::default(),
        });

        let capability = engine.initialize(&mut FakeBackend::default()).unwrap();

        assert_eq!(capability, CapabilityLevel::LOWEST);
    }

    #[test]
    fn setup_failure_propagates_and_leaves_engine_uninitialized() {
        let mut engine = RenderEngine::<FakeBackend>::new(CountingResolver {
            calls: Rc::default(),
        });
        let mut backend = FakeBackend {
            fail_setup: true,
            ..FakeBackend::with_version("4.6")
        };

        let err = engine.initialize(&mut backend).unwrap_err();

        assert!(format!("{err:#}").contains("no context"));
        assert!(!engine.is_ready());
        assert_eq!(backend.events, [Event::Setup]);
    }

    #[test]
    fn tasks_receive_negotiated_capability_and_layer_transform() {
        let (mut engine, _, mut backend) = engine();
        engine.enqueue(LayerId::PSEUDO_2D, task("p"));

        engine.flush(&mut backend, 0.0);

        assert!(backend.events.contains(&Event::Init(
            "p",
            layer_transform(LayerId::PSEUDO_2D),
            CapabilityLevel::Compute
        )));
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn layers_flush_ascending_and_tasks_fifo() {
        let (mut engine, _, mut backend) = engine();

        engine.enqueue(LayerId::HUD, task("hud-1"));
        engine.enqueue(LayerId::CAMERA_VIEW, task("world-1"));
        engine.enqueue(LayerId::PSEUDO_2D, task("tag-1"));
        engine.enqueue(LayerId::CAMERA_VIEW, task("world-2"));
        engine.enqueue(LayerId::HUD, task("hud-2"));

        let stats = engine.flush(&mut backend, 0.5);

        assert_eq!(backend.draws(), ["world-1", "world-2", "tag-1", "hud-1", "hud-2"]);
        assert_eq!(stats.layers_flushed, 3);
        assert_eq!(stats.tasks_executed, 5);
    }

    #[test]
    fn enqueue_all_preserves_order() {
        let (mut engine, _, mut backend) = engine();
        let batch: Vec<Box<dyn RenderTask<FakeBackend>>> =
            vec![Box::new(task("a")), Box::new(task("b")), Box::new(task("c"))];

        engine.enqueue(LayerId::CAMERA_VIEW, task("first"));
        engine.enqueue_all(LayerId::CAMERA_VIEW, batch);
        assert_eq!(engine.layer(LayerId::CAMERA_VIEW).len(), 4);

        engine.flush(&mut backend, 0.0);

        assert_eq!(backend.draws(), ["first", "a", "b", "c"]);
    }

    #[test]
    fn each_task_runs_all_phases_before_the_next_starts() {
        let (mut engine, _, mut backend) = engine();
        engine.enqueue(LayerId::CAMERA_VIEW, task("a"));
        engine.enqueue(LayerId::CAMERA_VIEW, task("b"));

        engine.flush(&mut backend, 0.0);

        let t = layer_transform(LayerId::CAMERA_VIEW);
        let c = CapabilityLevel::Compute;
        assert_eq!(
            backend.events,
            [
                Event::Blend,
                Event::Cull(true),
                Event::Init("a", t, c),
                Event::Draw("a"),
                Event::Cleanup("a"),
                Event::Init("b", t, c),
                Event::Draw("b"),
                Event::Cleanup("b"),
            ]
        );
    }

    #[test]
    fn culling_follows_layer_settings() {
        let (mut engine, _, mut backend) = engine();
        engine.enqueue(LayerId::CAMERA_VIEW, task("world"));
        engine.enqueue(LayerId::HUD, task("hud"));

        engine.flush(&mut backend, 0.0);

        let culls: Vec<bool> = backend
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Cull(on) => Some(*on),
                _ => None,
            })
            .collect();
        assert_eq!(culls, [true, false]);
    }

    // ── empty layers ──────────────────────────────────────────────────────

    #[test]
    fn empty_frame_never_resolves_settings() {
        let (mut engine, calls, mut backend) = engine();

        let stats = engine.flush(&mut backend, 0.3);

        assert_eq!(calls.get(), 0);
        assert_eq!(stats, FlushStats::default());
        assert_eq!(backend.events, [Event::Blend]);
    }

    #[test]
    fn only_non_empty_layers_resolve_settings() {
        let (mut engine, calls, mut backend) = engine();
        engine.enqueue(LayerId::HUD, task("hud"));

        engine.flush(&mut backend, 0.3);

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn flush_clears_every_layer() {
        let (mut engine, calls, mut backend) = engine();
        engine.enqueue(LayerId::CAMERA_VIEW, task("a"));
        engine.enqueue(LayerId::HUD, task("b"));

        engine.flush(&mut backend, 0.0);
        for id in LayerId::all() {
            assert!(engine.layer(id).is_empty(), "{id} not cleared");
        }

        backend.events.clear();
        let second = engine.flush(&mut backend, 0.0);

        assert_eq!(second.tasks_executed, 0);
        assert!(backend.draws().is_empty());
        assert_eq!(calls.get(), 2);
    }

    // ── deferred work ─────────────────────────────────────────────────────

    #[test]
    fn deferred_tasks_run_after_all_layers_in_submission_order() {
        let (mut engine, _, mut backend) = engine();
        let log = journal();

        for name in ["one", "two", "three"] {
            let log = Arc::clone(&log);
            engine.run_on_render_thread(move || log.lock().unwrap().push(format!("deferred {name}")));
        }
        engine.enqueue(
            LayerId::HUD,
            Tagged {
                journal: Some(Arc::clone(&log)),
                ..task("hud")
            },
        );

        let stats = engine.flush(&mut backend, 0.0);

        assert_eq!(stats.deferred_executed, 3);
        assert_eq!(
            *log.lock().unwrap(),
            ["task hud", "deferred one", "deferred two", "deferred three"]
        );
    }

    #[test]
    fn deferred_work_submitted_by_a_task_runs_in_the_same_frame() {
        let (mut engine, _, mut backend) = engine();
        let log = journal();
        let sender = engine.deferred_sender();
        let hook_log = Arc::clone(&log);

        engine.enqueue(
            LayerId::CAMERA_VIEW,
            Tagged {
                on_draw: Some(Box::new(move || {
                    sender
                        .submit(move || hook_log.lock().unwrap().push("from task".to_owned()))
                        .unwrap();
                })),
                ..task("producer")
            },
        );

        let stats = engine.flush(&mut backend, 0.0);

        assert_eq!(stats.deferred_executed, 1);
        assert_eq!(*log.lock().unwrap(), ["from task"]);
    }

    #[test]
    fn deferred_submission_is_valid_before_initialize() {
        let mut engine = RenderEngine::<FakeBackend>::new(CountingResolver {
            calls: Rc::default(),
        });
        let log = journal();
        let early = Arc::clone(&log);
        engine
            .deferred_sender()
            .submit(move || early.lock().unwrap().push("early".to_owned()))
            .unwrap();

        let mut backend = FakeBackend::with_version("4.6");
        engine.initialize(&mut backend).unwrap();
        let stats = engine.flush(&mut backend, 0.0);

        assert_eq!(stats.deferred_executed, 1);
        assert_eq!(*log.lock().unwrap(), ["early"]);
    }

    #[test]
    fn deferred_work_from_another_thread_is_drained() {
        let (mut engine, _, mut backend) = engine();
        let log = journal();
        let sender = engine.deferred_sender();
        let remote = Arc::clone(&log);

        std::thread::spawn(move || {
            sender
                .submit(move || remote.lock().unwrap().push("remote".to_owned()))
                .unwrap();
        })
        .join()
        .unwrap();

        engine.flush(&mut backend, 0.0);

        assert_eq!(*log.lock().unwrap(), ["remote"]);
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn failing_task_is_skipped_and_cleaned_up() {
        let (mut engine, _, mut backend) = engine();
        engine.enqueue(LayerId::CAMERA_VIEW, task("before"));
        engine.enqueue(
            LayerId::CAMERA_VIEW,
            Tagged {
                fail_draw: true,
                ..task("broken")
            },
        );
        engine.enqueue(LayerId::CAMERA_VIEW, task("after"));
        engine.enqueue(LayerId::HUD, task("hud"));

        let stats = engine.flush(&mut backend, 0.0);

        assert_eq!(stats.tasks_executed, 4);
        assert_eq!(stats.tasks_failed, 1);
        assert_eq!(backend.draws(), ["before", "broken", "after", "hud"]);
        assert!(backend.events.contains(&Event::Cleanup("broken")));
        assert!(engine.layer(LayerId::CAMERA_VIEW).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn enqueue_out_of_range_panics() {
        let (mut engine, _, _) = engine();
        engine.enqueue(LayerId::new(LAYER_COUNT), task("nowhere"));
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn enqueue_before_initialize_panics() {
        let mut engine = RenderEngine::<FakeBackend>::new(CountingResolver {
            calls: Rc::default(),
        });
        engine.enqueue(LayerId::HUD, task("early"));
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn flush_before_initialize_panics() {
        let mut engine = RenderEngine::<FakeBackend>::new(CountingResolver {
            calls: Rc::default(),
        });
        engine.flush(&mut FakeBackend::default(), 0.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside [0, 1)")]
    fn full_time_fraction_is_rejected() {
        let (mut engine, _, mut backend) = engine();
        engine.flush(&mut backend, 1.0);
    }

    #[test]
    #[should_panic(expected = "no settings case")]
    fn flushing_a_reserved_layer_panics() {
        let mut engine = RenderEngine::<FakeBackend>::new(StandardResolver::new(
            |_: bool, _: f32| Mat4::IDENTITY,
            || (640, 480),
        ));
        let mut backend = FakeBackend::with_version("4.6");
        engine.initialize(&mut backend).unwrap();

        engine.enqueue(LayerId::RESERVED[0], task("future"));
        engine.flush(&mut backend, 0.0);
    }

    #[test]
    fn engine_recovers_after_reserved_layer_panic() {
        use std::panic::{AssertUnwindSafe, catch_unwind};
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut engine = RenderEngine::<FakeBackend>::new(StandardResolver::new(
            |_: bool, _: f32| Mat4::IDENTITY,
            || (640, 480),
        ));
        let mut backend = FakeBackend::with_version("4.6");
        engine.initialize(&mut backend).unwrap();

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        engine.run_on_render_thread(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        engine.enqueue(LayerId::RESERVED[0], task("future"));

        let first = catch_unwind(AssertUnwindSafe(|| engine.flush(&mut backend, 0.0)));
        assert!(first.is_err());
        assert!(engine.layer(LayerId::RESERVED[0]).is_empty());

        let stats = engine.flush(&mut backend, 0.0);
        assert_eq!(stats.tasks_executed, 0);
        assert_eq!(stats.deferred_executed, 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reserved_layer_left_empty_is_harmless() {
        let mut engine = RenderEngine::<FakeBackend>::new(StandardResolver::new(
            |_: bool, _: f32| Mat4::IDENTITY,
            || (640, 480),
        ));
        let mut backend = FakeBackend::with_version("4.6");
        engine.initialize(&mut backend).unwrap();
        engine.enqueue(LayerId::HUD, task("hud"));

        let stats = engine.flush(&mut backend, 0.0);

        assert_eq!(stats.layers_flushed, 1);
    }
}
