//! Cooperative deferral helpers on top of the tokio runtime.
//!
//! Nothing here runs work inline: every helper spawns. Spawned work starts
//! only after the caller yields, which requires a current-thread runtime
//! (the binary uses one). Failures and panics inside deferred work are
//! logged at `debug` and dropped. Timer-based helpers hand back the raw
//! [`JoinHandle`]; cancel with `abort()`.

use std::{
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use tokio::{sync::watch, task::JoinHandle, time::sleep};

pub const FRAME_FALLBACK: Duration = Duration::from_millis(16);
pub const IDLE_FALLBACK: Duration = Duration::from_millis(50);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(1500);

type StepFn = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// A unit of deferred work, synchronous or asynchronous.
pub struct Step(StepFn);

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Step")
    }
}

impl Step {
    pub fn sync<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self(Box::new(move || {
            f();
            futures::future::ready(Ok::<(), anyhow::Error>(())).boxed()
        }))
    }

    pub fn fallible<F>(f: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self(Box::new(move || futures::future::ready(f()).boxed()))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self(Box::new(move || f().boxed()))
    }
}

async fn run_step(step: Step) {
    let future = match panic::catch_unwind(AssertUnwindSafe(step.0)) {
        Ok(future) => future,
        Err(_) => {
            tracing::debug!("deferred task panicked");
            return;
        }
    };
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::debug!(error = %err, "deferred task failed"),
        Err(_) => tracing::debug!("deferred task panicked"),
    }
}

/// Broadcast tick used as a frame or idle notification source.
#[derive(Debug, Clone)]
pub struct Signal {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn fire(&self) {
        self.tx.send_modify(|tick| *tick = tick.wrapping_add(1));
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleOptions {
    pub timeout: Duration,
}

impl Default for IdleOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    frames: Option<Signal>,
    idle: Option<Signal>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_frames(mut self, frames: Signal) -> Self {
        self.frames = Some(frames);
        self
    }

    #[must_use]
    pub fn with_idle(mut self, idle: Signal) -> Self {
        self.idle = Some(idle);
        self
    }

    pub fn schedule_microtask(&self, step: Step) {
        tokio::spawn(run_step(step));
    }

    /// Runs `step` after the next frame tick, or after 16 ms without a
    /// frame source.
    pub fn schedule_frame(&self, step: Step) -> JoinHandle<()> {
        match &self.frames {
            Some(frames) => {
                let mut ticks = frames.subscribe();
                tokio::spawn(async move {
                    let _ = ticks.changed().await;
                    run_step(step).await;
                })
            }
            None => tokio::spawn(async move {
                sleep(FRAME_FALLBACK).await;
                run_step(step).await;
            }),
        }
    }

    /// Runs `step` on the next idle notification, forced once
    /// `options.timeout` passes. Without an idle source it runs after 50 ms
    /// and the timeout is ignored.
    pub fn schedule_idle(&self, step: Step, options: IdleOptions) -> JoinHandle<()> {
        match &self.idle {
            Some(idle) => {
                let mut ticks = idle.subscribe();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = ticks.changed() => {}
                        () = sleep(options.timeout) => {}
                    }
                    run_step(step).await;
                })
            }
            None => tokio::spawn(async move {
                sleep(IDLE_FALLBACK).await;
                run_step(step).await;
            }),
        }
    }

    /// Runs `steps` one after another on a single spawned task. Each step
    /// settles before the next starts; a failing step does not stop the rest.
    pub fn sequence(&self, steps: Vec<Step>) -> JoinHandle<()> {
        tokio::spawn(async move {
            for step in steps {
                run_step(step).await;
            }
        })
    }
}

/// Wrapper that lets `f` run at most once.
#[derive(Debug)]
pub struct Once<F> {
    f: Mutex<Option<F>>,
}

#[must_use]
pub fn once<F>(f: F) -> Once<F> {
    Once {
        f: Mutex::new(Some(f)),
    }
}

impl<F> Once<F> {
    /// Calls the wrapped function with `arg` the first time; `None` after.
    pub fn call<A, R>(&self, arg: A) -> Option<R>
    where
        F: FnOnce(A) -> R,
    {
        let f = self
            .f
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        Some(f(arg))
    }

    pub fn has_run(&self) -> bool {
        self.f
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
