//! Minimal behavior tree used by the decision engine.
//!
//! Every tick completes immediately: a node either succeeds or fails, there is
//! no running state. Leaves write their chosen action into the
//! [`DecisionContext`] and succeed; composites short-circuit on the first
//! success (selector) or failure (sequence).

use super::DecisionContext;

/// Result of evaluating a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value { Status::Success } else { Status::Failure }
    }
}

/// A decision node.
pub trait Behavior: Send + Sync {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status;
}

impl Behavior for Box<dyn Behavior> {
    #[inline]
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        (**self).tick(ctx)
    }
}

/// Runs children left to right until one succeeds.
pub struct Selector {
    children: Vec<Box<dyn Behavior>>,
}

impl Selector {
    pub fn new(children: Vec<Box<dyn Behavior>>) -> Self {
        Self { children }
    }
}

impl Behavior for Selector {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        for child in &self.children {
            if child.tick(ctx).is_success() {
                return Status::Success;
            }
        }
        Status::Failure
    }
}

/// Runs children left to right until one fails.
pub struct Sequence {
    children: Vec<Box<dyn Behavior>>,
}

impl Sequence {
    pub fn new(children: Vec<Box<dyn Behavior>>) -> Self {
        Self { children }
    }
}

impl Behavior for Sequence {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        for child in &self.children {
            if !child.tick(ctx).is_success() {
                return Status::Failure;
            }
        }
        Status::Success
    }
}

#[inline]
pub fn selector(children: Vec<Box<dyn Behavior>>) -> Box<dyn Behavior> {
    Box::new(Selector::new(children))
}

#[inline]
pub fn sequence(children: Vec<Box<dyn Behavior>>) -> Box<dyn Behavior> {
    Box::new(Sequence::new(children))
}
