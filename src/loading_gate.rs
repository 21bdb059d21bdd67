use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_SPLASH: Duration = Duration::from_millis(6000);
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateEvent {
    Progress(f64),
    Ready,
}

pub struct LoadingGate {
    events: Receiver<GateEvent>,
    stop: Option<Sender<()>>,
    timer: Option<JoinHandle<()>>,
    started: Instant,
    progress: f64,
    ready: bool,
}

impl LoadingGate {
    pub fn start(duration: Duration) -> Self {
        Self::start_with_tick(duration, DEFAULT_TICK)
    }

    pub fn start_with_tick(duration: Duration, tick: Duration) -> Self {
        let (event_tx, events) = mpsc::channel();
        let (stop, stop_rx) = mpsc::channel::<()>();
        let started = Instant::now();
        let tick = tick.max(Duration::from_millis(1));
        let timer = thread::Builder::new()
            .name("loading-gate".to_string())
            .spawn(move || run_timer(started, duration, tick, &event_tx, &stop_rx))
            .ok();

        let mut gate = Self {
            events,
            stop: Some(stop),
            timer,
            started,
            progress: 0.0,
            ready: false,
        };
        if gate.timer.is_none() {
            // No timer thread: nothing to wait for.
            gate.progress = 100.0;
            gate.ready = true;
        }
        gate
    }

    /// Drains pending timer events. Returns them in emission order.
    pub fn poll(&mut self) -> Vec<GateEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            self.observe(event);
            out.push(event);
        }
        out
    }

    /// Blocks until the next event, or `None` once the gate is finished.
    pub fn next_event(&mut self, timeout: Duration) -> Option<GateEvent> {
        let event = self.events.recv_timeout(timeout).ok()?;
        self.observe(event);
        Some(event)
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn observe(&mut self, event: GateEvent) {
        match event {
            GateEvent::Progress(p) => self.progress = self.progress.max(p),
            GateEvent::Ready => self.ready = true,
        }
    }
}

impl Drop for LoadingGate {
    fn drop(&mut self) {
        // Disconnecting the stop channel wakes the timer immediately.
        self.stop.take();
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

fn run_timer(
    started: Instant,
    duration: Duration,
    tick: Duration,
    events: &Sender<GateEvent>,
    stop: &Receiver<()>,
) {
    let mut last = 0.0_f64;
    loop {
        let elapsed = started.elapsed();
        if elapsed >= duration {
            let _ = events.send(GateEvent::Progress(100.0));
            let _ = events.send(GateEvent::Ready);
            return;
        }
        let pct = (elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0).min(100.0);
        // Hold back exactly 100 for the final tick.
        let pct = pct.min(99.9).max(last);
        if events.send(GateEvent::Progress(pct)).is_err() {
            return;
        }
        last = pct;

        let wait = tick.min(duration.saturating_sub(started.elapsed()));
        match stop.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
