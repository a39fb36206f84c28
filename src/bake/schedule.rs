use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::bake::material::MeshId;

/// Token identifying one bake of one mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BakeTicket {
    /// Mesh being baked.
    pub mesh: MeshId,
    /// Generation number; never reused, even across model reloads.
    pub generation: u64,
}

/// Bake generations drawn from one monotonic sequence, tracked per mesh.
///
/// A result is current only while its ticket is the latest issued for its mesh, so when bakes
/// overlap the last one *triggered* wins, not the last one to finish.
#[derive(Clone, Debug, Default)]
pub struct GenerationCounter {
    next: u64,
    latest: HashMap<MeshId, u64>,
}

impl GenerationCounter {
    /// Issue the next ticket for `mesh`, superseding all earlier ones.
    pub fn issue(&mut self, mesh: MeshId) -> BakeTicket {
        self.next += 1;
        self.latest.insert(mesh, self.next);
        BakeTicket {
            mesh,
            generation: self.next,
        }
    }

    /// `true` when no newer ticket has been issued for the ticket's mesh.
    pub fn is_current(&self, ticket: BakeTicket) -> bool {
        self.latest.get(&ticket.mesh).copied() == Some(ticket.generation)
    }

    /// Forget all meshes (model reload). Outstanding tickets become stale and stay stale:
    /// the sequence is not rewound, so tickets issued afterwards never collide with them.
    pub fn reset(&mut self) {
        self.latest.clear();
    }
}

/// Trailing-edge debounce for rebakes.
///
/// Every change restarts the window; the work fires once the window has elapsed since the
/// last change. A zero window fires on the first poll after any change.
#[derive(Clone, Debug)]
pub struct Debouncer {
    window: Duration,
    last_change: Option<Instant>,
}

impl Debouncer {
    /// Debouncer with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_change: None,
        }
    }

    /// Configured window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a change at `now`.
    pub fn notify_at(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    /// `true` when a change is waiting, whether or not its window has elapsed.
    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// Consume the pending change if its window has elapsed at `now`.
    pub fn take_ready_at(&mut self, now: Instant) -> bool {
        match self.last_change {
            Some(t) if now.saturating_duration_since(t) >= self.window => {
                self.last_change = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending change regardless of the window.
    pub fn take_now(&mut self) -> bool {
        self.last_change.take().is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bake/schedule.rs"]
mod tests;
