use super::{misrouted, BoxFuture, Service};
use crate::protocol::{BrewResponse, BrewStatusResponse, EndpointKind, Request, Response};
use rpcmesh_common::config::brew::{BREW_SECS, POT_CAPACITY};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Refusals from the brew-cycle state machine. State is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrewError {
    #[error("Already brewing coffee!")]
    AlreadyInProgress,

    #[error("Pot still has coffee ({0} cups left).")]
    StockRemaining(u32),

    #[error("Brewing in progress: {}m{}s left.", .0.as_secs() / 60, .0.as_secs() % 60)]
    NotReady(Duration),

    #[error("No coffee left.")]
    Empty,
}

/// Where the pot is in its cycle
///
/// Cups only exist in `Ready`, so brewing with cups left over is unrepresentable.
/// `Ready` always holds at least one cup; taking the last one returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrewPhase {
    Idle,
    Brewing { started_at: Instant, cycle: u64 },
    Ready { cups: u32 },
}

#[derive(Debug)]
struct PotState {
    phase: BrewPhase,

    /// Incremented per cycle so a stale completion timer never fires into a newer cycle
    next_cycle: u64,

    timer: Option<JoinHandle<()>>,
}

/// Snapshot returned by [`CoffeePot::status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrewStatus {
    pub remaining: Duration,
    pub available_cups: u32,
    pub brewing: bool,
}

/// A single pot shared by every caller on a node
///
/// One mutex guards the whole state. The completion timer takes the same
/// lock before flipping `Brewing` to `Ready`, so callers see either side of
/// the transition, never a mix.
#[derive(Debug, Clone)]
pub struct CoffeePot {
    state: Arc<Mutex<PotState>>,
    capacity: u32,
    brew_time: Duration,
}

impl Default for CoffeePot {
    fn default() -> Self {
        Self::new()
    }
}

impl CoffeePot {
    pub fn new() -> Self {
        Self::with_settings(POT_CAPACITY, Duration::from_secs(BREW_SECS))
    }

    /// A pot always brews at least one cup; a capacity of 0 is raised to 1.
    pub fn with_settings(capacity: u32, brew_time: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(PotState {
                phase: BrewPhase::Idle,
                next_cycle: 0,
                timer: None,
            })),
            capacity: capacity.max(1),
            brew_time,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub async fn phase(&self) -> BrewPhase {
        self.state.lock().await.phase
    }

    /// Start brewing. Returns immediately; the pot fills once the brew time elapses.
    pub async fn start_cycle(&self) -> Result<String, BrewError> {
        let mut state = self.state.lock().await;
        match state.phase {
            BrewPhase::Brewing { .. } => return Err(BrewError::AlreadyInProgress),
            BrewPhase::Ready { cups } => return Err(BrewError::StockRemaining(cups)),
            BrewPhase::Idle => {}
        }

        let cycle = state.next_cycle;
        state.next_cycle += 1;
        state.phase = BrewPhase::Brewing {
            started_at: Instant::now(),
            cycle,
        };

        let shared = Arc::clone(&self.state);
        let (capacity, brew_time) = (self.capacity, self.brew_time);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(brew_time).await;

            let mut state = shared.lock().await;
            if let BrewPhase::Brewing { cycle: current, .. } = state.phase {
                if current == cycle {
                    state.phase = BrewPhase::Ready { cups: capacity };
                    state.timer = None;
                    info!("Brew cycle {} complete: {} cups ready", cycle, capacity);
                }
            }
        }));

        debug!("Brew cycle {} started", cycle);
        Ok(format!(
            "Brewing started. Ready in {}s.",
            self.brew_time.as_secs()
        ))
    }

    /// Pour one cup.
    pub async fn take_unit(&self) -> Result<String, BrewError> {
        let mut state = self.state.lock().await;
        match state.phase {
            BrewPhase::Idle => Err(BrewError::Empty),
            BrewPhase::Brewing { started_at, .. } => {
                Err(BrewError::NotReady(self.remaining(started_at)))
            }
            BrewPhase::Ready { cups } => {
                let left = cups - 1;
                state.phase = if left == 0 {
                    BrewPhase::Idle
                } else {
                    BrewPhase::Ready { cups: left }
                };
                Ok(format!("Enjoy your cup! ({left} left)"))
            }
        }
    }

    pub async fn status(&self) -> BrewStatus {
        let state = self.state.lock().await;
        match state.phase {
            BrewPhase::Idle => BrewStatus {
                remaining: Duration::ZERO,
                available_cups: 0,
                brewing: false,
            },
            BrewPhase::Brewing { started_at, .. } => BrewStatus {
                remaining: self.remaining(started_at),
                available_cups: 0,
                brewing: true,
            },
            BrewPhase::Ready { cups } => BrewStatus {
                remaining: Duration::ZERO,
                available_cups: cups,
                brewing: false,
            },
        }
    }

    /// Abandon any pending completion. An interrupted cycle leaves the pot empty.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if matches!(state.phase, BrewPhase::Brewing { .. }) {
            state.phase = BrewPhase::Idle;
            debug!("Abandoned in-flight brew cycle");
        }
    }

    fn remaining(&self, started_at: Instant) -> Duration {
        self.brew_time.saturating_sub(started_at.elapsed())
    }
}

impl BrewStatus {
    pub fn message(&self) -> String {
        if self.brewing {
            "Brewing in progress...".to_string()
        } else if self.available_cups > 0 {
            format!("Ready: {} cups available.", self.available_cups)
        } else {
            "Idle: no coffee.".to_string()
        }
    }
}

impl From<BrewStatus> for BrewStatusResponse {
    fn from(status: BrewStatus) -> Self {
        let secs = status.remaining.as_secs();
        Self {
            minutes_remaining: secs / 60,
            seconds_remaining: secs % 60,
            available_cups: status.available_cups,
            message: status.message(),
        }
    }
}

fn brew_reply(result: Result<String, BrewError>) -> BrewResponse {
    match result {
        Ok(message) => BrewResponse {
            accepted: true,
            message,
            ..Default::default()
        },
        Err(e) => BrewResponse {
            accepted: false,
            error: e.to_string(),
            ..Default::default()
        },
    }
}

/// Exposes a [`CoffeePot`] over the wire
#[derive(Debug, Clone, Default)]
pub struct CoffeePotService {
    pot: CoffeePot,
}

impl CoffeePotService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pot(pot: CoffeePot) -> Self {
        Self { pot }
    }

    pub fn pot(&self) -> &CoffeePot {
        &self.pot
    }
}

impl Service for CoffeePotService {
    fn name(&self) -> &'static str {
        "services.CoffeePot"
    }

    fn endpoints(&self) -> &'static [EndpointKind] {
        &[
            EndpointKind::CoffeeBrew,
            EndpointKind::CoffeeGetCup,
            EndpointKind::CoffeeBrewStatus,
        ]
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            match request {
                Request::Brew => Response::Brew(brew_reply(self.pot.start_cycle().await)),
                Request::GetCup => Response::Brew(brew_reply(self.pot.take_unit().await)),
                Request::BrewStatus => Response::BrewStatus(self.pot.status().await.into()),
                other => misrouted(self.name(), &other),
            }
        })
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.pot.shutdown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_full_brew_cycle() {
        let pot = CoffeePot::new();

        let started = pot.start_cycle().await.unwrap();
        assert_eq!(started, "Brewing started. Ready in 30s.");

        sleep(Duration::from_secs(10)).await;
        let status = pot.status().await;
        assert!(status.brewing);
        assert_eq!(status.remaining, Duration::from_secs(20));
        assert_eq!(status.available_cups, 0);

        sleep(Duration::from_secs(21)).await;
        let status = pot.status().await;
        assert!(!status.brewing);
        assert_eq!(status.available_cups, 5);

        for left in (0..5).rev() {
            let message = pot.take_unit().await.unwrap();
            assert_eq!(message, format!("Enjoy your cup! ({left} left)"));
        }
        assert_eq!(pot.take_unit().await, Err(BrewError::Empty));
        assert_eq!(pot.phase().await, BrewPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refusals_leave_state_unchanged() {
        let pot = CoffeePot::new();
        pot.start_cycle().await.unwrap();
        let brewing = pot.phase().await;

        assert_eq!(pot.start_cycle().await, Err(BrewError::AlreadyInProgress));
        let err = pot.take_unit().await.unwrap_err();
        assert_eq!(err.to_string(), "Brewing in progress: 0m30s left.");
        assert_eq!(pot.phase().await, brewing);

        sleep(Duration::from_secs(31)).await;
        assert_eq!(pot.start_cycle().await, Err(BrewError::StockRemaining(5)));
        assert_eq!(pot.phase().await, BrewPhase::Ready { cups: 5 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_capacity_still_pours_one_cup() {
        let pot = CoffeePot::with_settings(0, Duration::from_secs(5));
        assert_eq!(pot.capacity(), 1);

        pot.start_cycle().await.unwrap();
        sleep(Duration::from_secs(6)).await;
        assert_eq!(pot.phase().await, BrewPhase::Ready { cups: 1 });

        assert_eq!(pot.take_unit().await.unwrap(), "Enjoy your cup! (0 left)");
        assert_eq!(pot.take_unit().await, Err(BrewError::Empty));
        assert_eq!(pot.phase().await, BrewPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_splits_minutes_and_seconds() {
        let pot = CoffeePot::with_settings(2, Duration::from_secs(90));
        pot.start_cycle().await.unwrap();

        sleep(Duration::from_secs(5)).await;
        let reply: BrewStatusResponse = pot.status().await.into();
        assert_eq!(reply.minutes_remaining, 1);
        assert_eq!(reply.seconds_remaining, 25);
        assert_eq!(reply.message, "Brewing in progress...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_cycle() {
        let pot = CoffeePot::new();
        pot.start_cycle().await.unwrap();
        sleep(Duration::from_secs(5)).await;

        pot.shutdown().await;
        assert_eq!(pot.phase().await, BrewPhase::Idle);

        // The aborted timer must not fill the pot later.
        sleep(Duration::from_secs(60)).await;
        assert_eq!(pot.phase().await, BrewPhase::Idle);
        assert_eq!(pot.status().await.available_cups, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_takers_never_overdraw() {
        let pot = CoffeePot::with_settings(5, Duration::from_secs(1));
        pot.start_cycle().await.unwrap();
        sleep(Duration::from_secs(2)).await;

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let pot = pot.clone();
            tasks.push(tokio::spawn(async move { pot.take_unit().await.is_ok() }));
        }

        let mut served = 0;
        for task in tasks {
            if task.await.unwrap() {
                served += 1;
            }
        }
        assert_eq!(served, 5);
        assert_eq!(pot.phase().await, BrewPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_replies() {
        let service = CoffeePotService::new();

        let Response::Brew(reply) = service.handle(Request::GetCup).await else {
            panic!("expected brew reply");
        };
        assert!(!reply.accepted);
        assert_eq!(reply.error, "No coffee left.");

        let Response::BrewStatus(status) = service.handle(Request::BrewStatus).await else {
            panic!("expected status reply");
        };
        assert_eq!(status.message, "Idle: no coffee.");

        let Response::Brew(reply) = service.handle(Request::Brew).await else {
            panic!("expected brew reply");
        };
        assert!(reply.accepted);
        assert!(reply.error.is_empty());
    }
}
