//! Status/element compatibility for technical hits.
//!
//! A technical hit exploits one active status on the recipient. The fixed
//! table below decides which incoming element or damage kind exploits which
//! status; a skill may widen it with its own `technical_with` list.

use crate::env::DamageKind;
use crate::state::{Element, StatusEffects, StatusKind};

/// Returns true when a hit of `element`/`kind` exploits `status`.
pub const fn compatible(status: StatusKind, element: Element, kind: DamageKind) -> bool {
    use StatusKind::*;
    match status {
        // Fanned flames and overloaded burns.
        Burn => matches!(element, Element::Thunder | Element::Wind),
        // Shatter or melt.
        Freeze => matches!(element, Element::Physical | Element::Fire),
        Petrify => matches!(element, Element::Physical),
        Sleep | Stun => matches!(kind, DamageKind::Physical),
        Poison => matches!(element, Element::Wind),
        Bleed => matches!(element, Element::Dark),
        Regen | Reflect | Doom | AttackUp | AttackDown | DefenseUp | DefenseDown | SpeedUp
        | SpeedDown => false,
    }
}

/// First active status on the recipient that the incoming hit exploits.
pub fn exploitable_status(
    statuses: &StatusEffects,
    element: Element,
    kind: DamageKind,
    extra: &[StatusKind],
) -> Option<StatusKind> {
    statuses
        .iter()
        .filter(|status| !status.is_expired())
        .map(|status| status.kind)
        .find(|status| compatible(*status, element, kind) || extra.contains(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ActiveStatus;

    #[test]
    fn thunder_exploits_burn() {
        assert!(compatible(StatusKind::Burn, Element::Thunder, DamageKind::Physical));
        assert!(!compatible(StatusKind::Burn, Element::Ice, DamageKind::Magical));
        assert!(compatible(StatusKind::Sleep, Element::Fire, DamageKind::Physical));
        assert!(!compatible(StatusKind::Sleep, Element::Fire, DamageKind::Magical));
    }

    #[test]
    fn extra_kinds_widen_the_table() {
        let mut statuses = StatusEffects::empty();
        statuses.insert(ActiveStatus::new(StatusKind::Poison, 3, 5));

        assert_eq!(
            exploitable_status(&statuses, Element::Ice, DamageKind::Magical, &[]),
            None
        );
        assert_eq!(
            exploitable_status(&statuses, Element::Ice, DamageKind::Magical, &[StatusKind::Poison]),
            Some(StatusKind::Poison)
        );
    }
}
