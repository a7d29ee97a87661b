use std::collections::BTreeSet;

use crate::combat::ActionResult;
use crate::state::{CombatantId, Element};

/// Weaknesses discovered during the current battle.
///
/// Discovery is passive: every opponent hit that lands on a weakness records
/// the `(recipient, element)` pair, whichever decision produced the action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeaknessMemory {
    known: BTreeSet<(CombatantId, Element)>,
}

impl WeaknessMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the pair was not known yet.
    pub fn record(&mut self, target: CombatantId, element: Element) -> bool {
        self.known.insert((target, element))
    }

    /// Records every weakness hit of `result`, dealt with `element`.
    pub fn observe(&mut self, element: Element, result: &ActionResult) -> usize {
        result
            .outcomes
            .iter()
            .filter(|outcome| outcome.weakness)
            .filter(|outcome| self.record(outcome.recipient, element))
            .count()
    }

    pub fn knows(&self, target: CombatantId, element: Element) -> bool {
        self.known.contains(&(target, element))
    }

    pub fn weaknesses_of(&self, target: CombatantId) -> impl Iterator<Item = Element> + '_ {
        self.known
            .iter()
            .filter(move |(id, _)| *id == target)
            .map(|(_, element)| *element)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::TargetOutcome;

    #[test]
    fn observe_records_each_weakness_once() {
        let mut memory = WeaknessMemory::new();
        let mut hit = TargetOutcome::new(CombatantId(0));
        hit.weakness = true;
        let miss = TargetOutcome::new(CombatantId(1));
        let result = ActionResult::new(CombatantId(3), vec![hit, miss]);

        assert_eq!(memory.observe(Element::Ice, &result), 1);
        assert_eq!(memory.observe(Element::Ice, &result), 0);
        assert!(memory.knows(CombatantId(0), Element::Ice));
        assert!(!memory.knows(CombatantId(1), Element::Ice));
    }

    #[test]
    fn weaknesses_are_listed_per_target() {
        let mut memory = WeaknessMemory::new();
        memory.record(CombatantId(1), Element::Fire);
        memory.record(CombatantId(2), Element::Ice);
        memory.record(CombatantId(1), Element::Wind);

        let elements: Vec<_> = memory.weaknesses_of(CombatantId(1)).collect();
        assert_eq!(elements.len(), 2);
        assert!(elements.contains(&Element::Fire));
        assert!(elements.contains(&Element::Wind));
        assert_eq!(memory.weaknesses_of(CombatantId(0)).count(), 0);
    }
}
