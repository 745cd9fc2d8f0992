//! Passive recovery of balance and fatigue

use crate::combat::state::CombatStats;
use crate::combat::tier::RegenBand;
use crate::core::config::CombatConfig;
use crate::entity::stats::Stats;

/// What changed during one regeneration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegenReport {
    pub became_exhausted: bool,
    pub recovered: bool,
}

/// Balance regen rate (per second) for the combatant's range band
pub fn balance_rate(band: RegenBand, config: &CombatConfig) -> f32 {
    match band {
        RegenBand::Safe => config.balance_regen_disengaged,
        RegenBand::Ranged => config.balance_regen_ranged,
        RegenBand::Engaged => config.balance_regen_melee,
    }
}

/// Advance one combatant's recovery by `dt` seconds
///
/// Fatigue regenerates toward `CON * 10` at `2 + CON/10` per second. An
/// exhausted combatant (fatigue hit zero) keeps balance capped until fatigue
/// climbs back to the configured fraction of max.
pub fn regenerate(combat: &mut CombatStats, stats: &Stats, dt: f32, config: &CombatConfig) -> RegenReport {
    let mut report = RegenReport::default();

    let con = stats.constitution();
    combat.max_fatigue = stats.max_fatigue();

    if combat.fatigue <= 0.0 && !combat.exhausted {
        combat.exhausted = true;
        report.became_exhausted = true;
    }

    if combat.balance < 1.0 {
        let rate = balance_rate(combat.engagement_tier.regen_band(), config);
        combat.adjust_balance(rate * dt);
    }

    if combat.fatigue < combat.max_fatigue {
        combat.recover_fatigue((2.0 + con / 10.0) * dt);
    } else {
        combat.fatigue = combat.max_fatigue;
    }

    if combat.exhausted
        && combat.fatigue >= combat.max_fatigue * config.exhaustion_recovery_fraction
        && combat.fatigue > 0.0
    {
        combat.exhausted = false;
        report.recovered = true;
    }
    if combat.exhausted {
        combat.balance = combat.balance.min(config.exhausted_balance_cap);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::tier::EngagementTier;
    use crate::entity::stats::Attribute;

    #[test]
    fn test_balance_rate_depends_on_tier() {
        let config = CombatConfig::default();
        let stats = Stats::new();
        for (tier, expected) in [
            (EngagementTier::Disengaged, 0.55),
            (EngagementTier::Polearm, 0.525),
            (EngagementTier::CloseQuarters, 0.51),
        ] {
            let mut combat = CombatStats::default().at_tier(tier).with_balance(0.5);
            regenerate(&mut combat, &stats, 1.0, &config);
            assert!((combat.balance - expected).abs() < 1e-5, "{:?}", tier);
        }
    }

    #[test]
    fn test_fatigue_regen_from_constitution() {
        let config = CombatConfig::default();
        let stats = Stats::new().with_attribute(Attribute::Constitution, 20);
        let mut combat = CombatStats::default();
        combat.fatigue = 10.0;
        regenerate(&mut combat, &stats, 2.0, &config);
        // (2 + 20/10) * 2
        assert_eq!(combat.fatigue, 18.0);
        assert_eq!(combat.max_fatigue, 200.0);
    }

    #[test]
    fn test_fatigue_capped_at_max() {
        let config = CombatConfig::default();
        let stats = Stats::new();
        let mut combat = CombatStats::default();
        combat.fatigue = 99.5;
        regenerate(&mut combat, &stats, 5.0, &config);
        assert_eq!(combat.fatigue, 100.0);
    }

    #[test]
    fn test_exhaustion_caps_balance_until_recovered() {
        let config = CombatConfig::default();
        let stats = Stats::new();
        let mut combat = CombatStats::default()
            .at_tier(EngagementTier::Melee)
            .with_balance(0.8);
        combat.fatigue = 0.0;

        let report = regenerate(&mut combat, &stats, 1.0, &config);
        assert!(report.became_exhausted);
        assert_eq!(combat.balance, 0.5);

        // 3/s at CON 10; 25 needed
        for _ in 0..7 {
            regenerate(&mut combat, &stats, 1.0, &config);
            assert!(combat.balance <= 0.5);
        }
        assert!(combat.exhausted);

        let report = regenerate(&mut combat, &stats, 1.0, &config);
        assert!(report.recovered);
        assert!(!combat.exhausted);
    }
}
