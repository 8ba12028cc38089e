//! Transition resolution and action execution.
//!
//! # Key Concepts
//!
//! - **Resolution**: pure computation of a [`TransitionPlan`] from the active
//!   configuration, the context and a trigger
//! - **Actions**: context assignments applied in place, plus sends, spawns and
//!   stops recorded for commit after the macrostep
//!
//! Guards run during resolution, before any exit or entry action, so a
//! failing guard never leaves a half-applied transition behind.

mod action;
pub(crate) mod transition;

pub use action::{Action, SendAction, SpawnAction};
pub use transition::TransitionPlan;
