//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────────────────┬──────────┬─────────┬─────────────┐ │
//! │  │ StateId              │ on_enter │ on_exit │ on_update   │ │
//! │  ├──────────────────────┼──────────┼─────────┼─────────────┤ │
//! │  │ Idle                 │ fn(ctx)  │   —     │ fn -> Opt<> │ │
//! │  │ Igniting             │ fn(ctx)  │ fn(ctx) │ fn -> Opt<> │ │
//! │  │ Burning              │ fn(ctx)  │   —     │ fn -> Opt<> │ │
//! │  │ CooldownAfterFailure │ fn(ctx)  │   —     │ fn -> Opt<> │ │
//! │  └──────────────────────┴──────────┴─────────┴─────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut SupervisorContext`.

pub mod context;
pub mod states;

use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use context::SupervisorContext;
use log::debug;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// The four supervisor states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Igniting = 1,
    Burning = 2,
    CooldownAfterFailure = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Idle` (gas closed) in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Igniting,
            2 => Self::Burning,
            3 => Self::CooldownAfterFailure,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// States in which the gas valve must be closed.
    pub fn requires_gas_closed(self) -> bool {
        matches!(self, Self::Idle | Self::CooldownAfterFailure)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut SupervisorContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut SupervisorContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// Table-driven engine.  Holds no timing of its own: handlers compare
/// `ctx.now` against the deadlines in the context.
pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    current: StateId,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, row)| row.id as usize == i),
            "state table rows out of order"
        );
        Self {
            table,
            current: initial,
        }
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id as usize]
    }

    /// Enter the initial state.  Call once, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut SupervisorContext) {
        debug!("FSM enters {:?}", self.current);
        if let Some(enter) = self.row(self.current).on_enter {
            enter(ctx);
        }
    }

    /// Run the current state's update.  At most one transition per call;
    /// returns `(from, to)` when it happened.
    pub fn tick(&mut self, ctx: &mut SupervisorContext) -> Option<(StateId, StateId)> {
        let from = self.current;
        let to = (self.row(from).on_update)(ctx)?;
        self.transition(to, ctx);
        Some((from, to))
    }

    /// Jump to `next` without consulting `on_update`.  No-op if already there.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut SupervisorContext) {
        if next != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    fn transition(&mut self, next: StateId, ctx: &mut SupervisorContext) {
        debug!("FSM {:?} -> {:?}", self.current, next);
        if let Some(exit) = self.row(self.current).on_exit {
            exit(ctx);
        }
        self.current = next;
        if let Some(enter) = self.row(next).on_enter {
            enter(ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// State watch
// ---------------------------------------------------------------------------

/// Read-only view of the supervisor's current state, shareable across
/// threads.
#[derive(Debug, Clone)]
pub struct StateWatch {
    state: Arc<AtomicU8>,
}

impl StateWatch {
    pub fn new(initial: StateId) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(initial as u8)),
        }
    }

    pub fn get(&self) -> StateId {
        StateId::from_index(self.state.load(Ordering::Acquire) as usize)
    }

    pub(crate) fn publish(&self, state: StateId) {
        self.state.store(state as u8, Ordering::Release);
    }
}
