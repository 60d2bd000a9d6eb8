//! Two-surface synchronization coordinator.
//!
//! All transition requests funnel into one coordination task, so no two
//! activations ever run concurrently and the surfaces never observe
//! overlapping profiles. Headers are applied before script spoofing: header
//! changes only take effect on the *next* request, so the worst transient a
//! page can observe is old script state (internally consistent) with new
//! headers, never a half-built script surface.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::error::{Error, Result, Surface};
use crate::profile::{HeaderRule, Profile};
use crate::script::render_spoof_script;

/// Backoff before the single retry of a failed surface apply.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Script-surface capability: registers page-world spoofing for subsequent
/// loads. A fresh `register` replaces any prior registration.
#[async_trait]
pub trait Injector: Send + Sync {
    async fn register(&self, script: &str) -> Result<()>;
    async fn unregister_all(&self) -> Result<()>;
}

/// Header-surface capability: declarative request-header rewriting. The rule
/// ids are stable across transitions, so `replace_rules` swaps the whole set
/// atomically from the engine's point of view.
#[async_trait]
pub trait HeaderRuleEngine: Send + Sync {
    async fn replace_rules(&self, rules: &[HeaderRule]) -> Result<()>;
}

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No profile active on either surface.
    Idle,
    /// A transition is in flight.
    Activating,
    /// A profile is installed; check the surface flags for degradation.
    Active,
}

/// Published surface status: state, epoch, and per-surface health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceStatus {
    pub state: CoordinatorState,
    /// Monotonically increasing activation counter.
    pub epoch: u64,
    pub headers_ok: bool,
    pub script_ok: bool,
}

impl SurfaceStatus {
    fn idle() -> Self {
        Self {
            state: CoordinatorState::Idle,
            epoch: 0,
            headers_ok: true,
            script_ok: true,
        }
    }

    /// A profile is active but one surface failed to apply; protection is
    /// partial and observability layers should warn.
    pub fn degraded(&self) -> bool {
        self.state == CoordinatorState::Active && !(self.headers_ok && self.script_ok)
    }
}

enum Command {
    Install(Box<Profile>),
    Clear,
    /// Answered once the queue at submission time has been fully applied.
    Sync(oneshot::Sender<()>),
}

/// The desired end state after coalescing queued requests.
enum DesiredOp {
    Install(Box<Profile>),
    Clear,
}

/// Handle to the coordination task. Cheap to clone; submission never blocks
/// the caller beyond the channel send.
#[derive(Clone)]
pub struct SyncCoordinator {
    tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<SurfaceStatus>,
    active_rx: watch::Receiver<Option<Profile>>,
}

impl SyncCoordinator {
    /// Spawn the coordination task over the two surface capabilities.
    pub fn spawn(injector: Arc<dyn Injector>, engine: Arc<dyn HeaderRuleEngine>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SurfaceStatus::idle());
        let (active_tx, active_rx) = watch::channel(None);
        tokio::spawn(run(rx, injector, engine, status_tx, active_tx));
        Self {
            tx,
            status_rx,
            active_rx,
        }
    }

    /// Request installation of a profile on both surfaces. A request
    /// submitted while another is pending supersedes it; intermediate
    /// profiles are dropped, never merged.
    pub fn install(&self, profile: Profile) -> Result<()> {
        self.tx
            .send(Command::Install(Box::new(profile)))
            .map_err(|_| Error::coordinator("coordination task stopped"))
    }

    /// Request clearing of both surfaces (protection disabled).
    pub fn clear(&self) -> Result<()> {
        self.tx
            .send(Command::Clear)
            .map_err(|_| Error::coordinator("coordination task stopped"))
    }

    /// Wait until every request submitted before this call has been applied
    /// or superseded.
    pub async fn settled(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Sync(ack_tx))
            .map_err(|_| Error::coordinator("coordination task stopped"))?;
        ack_rx
            .await
            .map_err(|_| Error::coordinator("coordination task stopped"))
    }

    /// Lock-free snapshot of the surface status.
    pub fn status(&self) -> SurfaceStatus {
        self.status_rx.borrow().clone()
    }

    /// Lock-free snapshot of the published active profile.
    pub fn active_profile(&self) -> Option<Profile> {
        self.active_rx.borrow().clone()
    }
}

/// Apply one surface call, retrying once with backoff.
async fn with_retry<F, Fut>(surface: Surface, call: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match call().await {
        Ok(()) => true,
        Err(first) => {
            warn!(surface = surface.as_str(), error = %first, "surface apply failed, retrying");
            tokio::time::sleep(RETRY_BACKOFF).await;
            match call().await {
                Ok(()) => true,
                Err(second) => {
                    warn!(surface = surface.as_str(), error = %second,
                          "surface apply failed after retry, continuing degraded");
                    false
                }
            }
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    injector: Arc<dyn Injector>,
    engine: Arc<dyn HeaderRuleEngine>,
    status_tx: watch::Sender<SurfaceStatus>,
    active_tx: watch::Sender<Option<Profile>>,
) {
    let mut epoch: u64 = 0;

    while let Some(first) = rx.recv().await {
        // Single-slot pending queue: drain everything submitted so far and
        // keep only the most recent desired operation. Sync acks are kept
        // and answered after convergence.
        let mut desired: Option<DesiredOp> = None;
        let mut acks: Vec<oneshot::Sender<()>> = Vec::new();
        let mut absorb = |cmd: Command, desired: &mut Option<DesiredOp>| match cmd {
            Command::Install(p) => {
                if desired.is_some() {
                    debug!("pending transition superseded before start");
                }
                *desired = Some(DesiredOp::Install(p));
            }
            Command::Clear => *desired = Some(DesiredOp::Clear),
            Command::Sync(tx) => acks.push(tx),
        };
        absorb(first, &mut desired);
        while let Ok(cmd) = rx.try_recv() {
            absorb(cmd, &mut desired);
        }
        drop(absorb);

        loop {
            // Re-coalesce before each apply so we always chase the newest
            // desired state, never a stale intermediate one.
            while let Ok(cmd) = rx.try_recv() {
                match cmd {
                    Command::Install(p) => desired = Some(DesiredOp::Install(p)),
                    Command::Clear => desired = Some(DesiredOp::Clear),
                    Command::Sync(tx) => acks.push(tx),
                }
            }
            let Some(op) = desired.take() else { break };

            epoch += 1;
            let _ = status_tx.send(SurfaceStatus {
                state: CoordinatorState::Activating,
                epoch,
                headers_ok: true,
                script_ok: true,
            });

            match op {
                DesiredOp::Install(profile) => {
                    debug!(epoch, id = %profile.id, "activating profile");
                    let headers_ok =
                        with_retry(Surface::Headers, || engine.replace_rules(&profile.header_rules))
                            .await;

                    // Stale-epoch guard: if a newer request arrived while the
                    // header apply was in flight, abandon this epoch and let
                    // the loop apply the newest one. The next apply replaces
                    // both surfaces, so the abandoned result is harmless.
                    while let Ok(cmd) = rx.try_recv() {
                        match cmd {
                            Command::Install(p) => desired = Some(DesiredOp::Install(p)),
                            Command::Clear => desired = Some(DesiredOp::Clear),
                            Command::Sync(tx) => acks.push(tx),
                        }
                    }
                    if desired.is_some() {
                        warn!(epoch, "newer transition queued, discarding in-flight epoch");
                        continue;
                    }

                    let script = render_spoof_script(&profile);
                    let script_ok =
                        with_retry(Surface::Script, || injector.register(&script)).await;

                    if !(headers_ok && script_ok) {
                        warn!(epoch, headers_ok, script_ok, "profile active but degraded");
                    }
                    let _ = status_tx.send(SurfaceStatus {
                        state: CoordinatorState::Active,
                        epoch,
                        headers_ok,
                        script_ok,
                    });
                    let _ = active_tx.send(Some(*profile));
                }
                DesiredOp::Clear => {
                    debug!(epoch, "clearing both surfaces");
                    let headers_ok =
                        with_retry(Surface::Headers, || engine.replace_rules(&[])).await;
                    let script_ok =
                        with_retry(Surface::Script, || injector.unregister_all()).await;
                    let _ = status_tx.send(SurfaceStatus {
                        state: CoordinatorState::Idle,
                        epoch,
                        headers_ok,
                        script_ok,
                    });
                    let _ = active_tx.send(None);
                }
            }
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
    debug!("coordination task stopped");
}
