use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;

use crate::device::GraphicsContext;
use crate::error::{EngineError, EngineResult, LastError};
use crate::time::{frame_interval, sleep_budget, FpsCounter, FrameClock};

/// Work executed on the render thread between frames.
pub type RenderTask = Box<dyn FnOnce() + Send>;

/// Per-frame callback; receives the frame's delta time in seconds.
pub type FrameCallback = Box<dyn FnMut(f32) + Send>;

const THREAD_NAME: &str = "glex-render";

#[derive(Default)]
struct TaskQueue {
    tasks: VecDeque<RenderTask>,
    /// True while a live loop is guaranteed to drain the queue again.
    open: bool,
}

struct Shared {
    running: AtomicBool,
    target_fps: AtomicU32,
    /// `f32` bits.
    current_fps: AtomicU32,
    queue: Mutex<TaskQueue>,
    errors: Arc<LastError>,
}

impl Shared {
    fn drain(&self) {
        let tasks = std::mem::take(&mut self.queue.lock().tasks);
        for task in tasks {
            task();
        }
    }

    /// Closes the queue and runs what was accepted before closing.
    fn close_and_drain(&self) {
        let tasks = {
            let mut q = self.queue.lock();
            q.open = false;
            std::mem::take(&mut q.tasks)
        };
        for task in tasks {
            task();
        }
    }

    fn set_fps(&self, fps: f32) {
        self.current_fps.store(fps.to_bits(), Ordering::Release);
    }
}

/// Dedicated frame-loop thread.
///
/// Between `start` and `stop` exactly one OS thread holds the context bind and
/// runs, once per iteration:
/// 1. drain posted tasks (FIFO)
/// 2. the frame callback
/// 3. `swap_buffers`; a failure stops the loop
/// 4. frame-rate bookkeeping, then sleep out the rest of `1000 / fps` ms
pub struct RenderThread {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RenderThread {
    pub const DEFAULT_FPS: u32 = 60;

    /// Fatal loop errors are recorded into `errors`.
    pub fn new(errors: Arc<LastError>) -> Self {
        Self {
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                target_fps: AtomicU32::new(Self::DEFAULT_FPS),
                current_fps: AtomicU32::new(0f32.to_bits()),
                queue: Mutex::new(TaskQueue::default()),
                errors,
            }),
            handle: Mutex::new(None),
        }
    }

    /// Spawns the loop and waits until it holds the context bind.
    ///
    /// The calling thread must not hold the bind.
    pub fn start(&self, context: Arc<GraphicsContext>, mut frame: FrameCallback) -> EngineResult<()> {
        if !context.is_initialized() {
            return Err(EngineError::precondition("render thread needs an initialized context"));
        }
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::precondition("render thread already running"));
        }

        let mut slot = self.handle.lock();
        // A loop that stopped itself (swap failure) is still waiting to be joined.
        if let Some(stale) = slot.take() {
            join(stale);
        }

        let shared = Arc::clone(&self.shared);
        let (ready_tx, ready_rx) = mpsc::sync_channel::<EngineResult<()>>(1);
        let spawned = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                let bound = context.bind_to_current_thread();
                let ok = bound.is_ok();
                // Opened only by a thread that will drain it: a loop that never
                // binds must not accept waiters.
                if ok {
                    shared.queue.lock().open = true;
                }
                let _ = ready_tx.send(bound);
                if !ok {
                    shared.running.store(false, Ordering::Release);
                    return;
                }
                run_loop(&shared, &context, &mut frame);
            });

        let handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                return Err(EngineError::ThreadSpawn(e));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *slot = Some(handle);
                log::info!(
                    "render thread started at {} fps",
                    self.shared.target_fps.load(Ordering::Relaxed)
                );
                Ok(())
            }
            Ok(Err(e)) => {
                join(handle);
                Err(e)
            }
            Err(_) => {
                join(handle);
                self.shared.running.store(false, Ordering::Release);
                Err(EngineError::precondition("render thread exited before binding"))
            }
        }
    }

    /// Stops the loop and joins the thread.
    ///
    /// Returns once the final task batch has run and the bind is released.
    /// Called from the render thread itself it only requests the exit.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);

        let handle = {
            let mut slot = self.handle.lock();
            if slot
                .as_ref()
                .is_some_and(|h| h.thread().id() == thread::current().id())
            {
                return;
            }
            slot.take()
        };

        if let Some(h) = handle {
            join(h);
            log::info!("render thread stopped");
        }
        self.shared.set_fps(0.0);
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// True when called from the loop's own thread.
    pub fn is_current(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| h.thread().id() == thread::current().id())
    }

    /// Queues `task` for the next iteration. Tasks posted while stopped run
    /// after the next `start`.
    pub fn post(&self, task: RenderTask) {
        self.shared.queue.lock().tasks.push_back(task);
    }

    /// Runs `task` on the render thread and blocks until it finished.
    ///
    /// Returns `false` without running it if no live loop will drain the
    /// queue. From the render thread itself the task runs inline.
    pub fn post_and_wait(&self, task: RenderTask) -> bool {
        if self.is_current() {
            task();
            return true;
        }

        let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);
        {
            let mut q = self.shared.queue.lock();
            if !q.open {
                return false;
            }
            q.tasks.push_back(Box::new(move || {
                task();
                let _ = done_tx.send(());
            }));
        }
        done_rx.recv().is_ok()
    }

    /// Clamped to at least 1; takes effect on the next iteration.
    pub fn set_target_fps(&self, fps: u32) {
        self.shared.target_fps.store(fps.max(1), Ordering::Release);
    }

    pub fn target_fps(&self) -> u32 {
        self.shared.target_fps.load(Ordering::Acquire)
    }

    /// Rolling one-second estimate; 0 when stopped.
    pub fn current_fps(&self) -> f32 {
        f32::from_bits(self.shared.current_fps.load(Ordering::Acquire))
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("render thread panicked");
    }
}

fn run_loop(shared: &Shared, context: &GraphicsContext, frame: &mut FrameCallback) {
    let mut clock = FrameClock::new();
    let mut fps = FpsCounter::new(Instant::now());

    while shared.running.load(Ordering::Acquire) {
        let started = Instant::now();
        let ft = clock.tick();

        shared.drain();
        frame(ft.dt);

        if let Err(e) = context.swap_buffers() {
            shared.errors.record(&e);
            shared.running.store(false, Ordering::Release);
            break;
        }

        if let Some(estimate) = fps.record(Instant::now()) {
            shared.set_fps(estimate);
            log::trace!("fps {estimate:.1}");
        }

        let interval = frame_interval(shared.target_fps.load(Ordering::Acquire));
        if let Some(rest) = sleep_budget(interval, started.elapsed()) {
            thread::sleep(rest);
        }
    }

    shared.close_and_drain();
    context.unbind_from_current_thread();
    shared.set_fps(0.0);
    log::debug!("render loop exited after {} frames", clock.frame_index());
}
