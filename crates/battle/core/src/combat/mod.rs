//! Combat resolution: damage and hit math, technical hits, status effects
//! and the resolver that applies an action to its targets.

pub mod damage;
pub mod hit;
mod resolver;
mod result;
mod status;
pub mod technical;

pub use resolver::DamageResolver;
pub use result::{ActionResult, TargetOutcome};
pub use status::{ApplyOutcome, StatusEngine, StatusTick};
