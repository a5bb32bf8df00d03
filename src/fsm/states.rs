//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers, with no closures or dynamic
//! dispatch.
//!
//! ```text
//!  IDLE ──[gas requested]──▶ IGNITING ──[flame]──▶ BURNING
//!   ▲                         │   ▲                  │
//!   │                  [timeout]  └───[flame lost]───┘
//!   │                         ▼
//!   │                      COOLDOWN ──[retry deadline, still requested]──▶ IGNITING
//!   │
//!  Any state ──[gas request dropped]──▶ IDLE
//! ```
//!
//! Within a state the checks run in a fixed order: request withdrawn,
//! then flame, then deadline.  One tick causes at most one transition.

use super::context::{OutputCommands, SupervisorContext};
use super::{StateDescriptor, StateId};
use crate::app::events::BurnerEvent;
use log::debug;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Igniting
        StateDescriptor {
            id: StateId::Igniting,
            on_enter: Some(igniting_enter),
            on_exit: Some(igniting_exit),
            on_update: igniting_update,
        },
        // Index 2: Burning
        StateDescriptor {
            id: StateId::Burning,
            on_enter: Some(burning_enter),
            on_exit: None,
            on_update: burning_update,
        },
        // Index 3: CooldownAfterFailure
        StateDescriptor {
            id: StateId::CooldownAfterFailure,
            on_enter: Some(cooldown_enter),
            on_exit: None,
            on_update: cooldown_update,
        },
    ]
}

/// Leave for Idle if the request line dropped, recording where from.
fn request_withdrawn(ctx: &mut SupervisorContext, during: StateId) -> Option<StateId> {
    if ctx.inputs.gas_requested {
        return None;
    }
    let at = ctx.now;
    ctx.emit(BurnerEvent::RequestWithdrawn { at, during });
    Some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut SupervisorContext) {
    ctx.commands = OutputCommands::all_off();
    debug!("IDLE: gas closed, igniter off");
}

fn idle_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    if ctx.inputs.gas_requested {
        return Some(StateId::Igniting);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IGNITING state: gas flowing, igniter pulsing, waiting for flame
// ═══════════════════════════════════════════════════════════════════════════

fn igniting_enter(ctx: &mut SupervisorContext) {
    // Gas first; the supervisor applies the valve before the igniter.
    ctx.commands.gas_valve = true;
    ctx.commands.igniter = true;
    ctx.ignition_started = ctx.now;
    ctx.ignition_deadline = ctx.now + ctx.no_flame_shutdown;
    debug!(
        "IGNITING: gas open, igniter on, flame required by {}",
        ctx.ignition_deadline
    );
}

fn igniting_exit(ctx: &mut SupervisorContext) {
    ctx.commands.igniter = false;
}

fn igniting_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    if let Some(next) = request_withdrawn(ctx, StateId::Igniting) {
        return Some(next);
    }

    if ctx.inputs.flame_present {
        let at = ctx.now;
        let after = at.saturating_duration_since(ctx.ignition_started);
        ctx.emit(BurnerEvent::FlameEstablished { at, after });
        return Some(StateId::Burning);
    }

    if ctx.now >= ctx.ignition_deadline {
        return Some(StateId::CooldownAfterFailure);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  BURNING state: flame established, igniter idle
// ═══════════════════════════════════════════════════════════════════════════

fn burning_enter(ctx: &mut SupervisorContext) {
    ctx.commands.gas_valve = true;
    ctx.commands.igniter = false;
    debug!("BURNING: flame detected, igniter off");
}

fn burning_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    if let Some(next) = request_withdrawn(ctx, StateId::Burning) {
        return Some(next);
    }

    // Flame-out: reignite with the valve left open.
    if !ctx.inputs.flame_present {
        let at = ctx.now;
        ctx.emit(BurnerEvent::FlameLost { at });
        return Some(StateId::Igniting);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN state: ignition failed, gas closed until the retry deadline
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_enter(ctx: &mut SupervisorContext) {
    ctx.commands = OutputCommands::all_off();
    ctx.retry_deadline = ctx.now + ctx.no_flame_shutdown;
    let (at, retry_at) = (ctx.now, ctx.retry_deadline);
    ctx.emit(BurnerEvent::IgnitionFailed { at, retry_at });
    debug!("COOLDOWN: ignition failed, gas closed until {}", retry_at);
}

fn cooldown_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    if let Some(next) = request_withdrawn(ctx, StateId::CooldownAfterFailure) {
        return Some(next);
    }

    if ctx.now >= ctx.retry_deadline {
        let at = ctx.now;
        ctx.emit(BurnerEvent::RetryReady { at });
        return Some(StateId::Igniting);
    }

    None
}
