use crate::clock::Clock;
use crate::model::{Care, Notice, PetState, Stat, BOOST, DAILY_REWARD};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PetAction {
    Care(Care),
    ClaimDaily,
    UseBoost,
}

/// Whole seconds since the last tick, never less than one so a throttled
/// timer still moves the simulation forward.
pub(crate) fn elapsed_secs(last_tick_ms: i64, now_ms: i64) -> u64 {
    let secs = (now_ms.saturating_sub(last_tick_ms) as f64 / 1000.0).round();
    if secs < 1.0 {
        1
    } else {
        secs as u64
    }
}

impl PetState {
    pub(crate) fn tick(&mut self, clock: &impl Clock) -> Vec<Notice> {
        let now = clock.now_ms();
        let elapsed = elapsed_secs(self.last_tick, now);
        self.last_tick = now;

        self.decay(elapsed, self.boosted(now));
        self.score = self.score.saturating_add((self.health() / 50.0).round() as u64);

        let mut notices = Vec::new();

        // a long absence still counts as a single new day
        let today = clock.today();
        if today != self.last_login_date {
            self.day = self.day.saturating_add(1);
            self.last_login_date = today;
            self.reward_claimed_date = None;
            log::info!("day rollover to day {} ({today})", self.day);
            notices.push(Notice::DayBegan(self.day));
        }

        if self.active_boost_until != 0 && now >= self.active_boost_until {
            self.active_boost_until = 0;
            notices.push(Notice::BoostFaded);
        }

        notices
    }

    pub(crate) fn decay(&mut self, elapsed_secs: u64, boosted: bool) {
        let scale = if boosted { BOOST.decay_factor } else { 1.0 };
        let dt = elapsed_secs as f64 * scale;
        for stat in Stat::ALL {
            self.bump(stat, -stat.decay_per_sec() * dt);
        }
    }

    pub(crate) fn apply(&mut self, action: PetAction, clock: &impl Clock) -> Notice {
        self.apply_scaled(action, 1.0, clock)
    }

    /// `scale` multiplies care gains only; reward and boost ignore it.
    pub(crate) fn apply_scaled(
        &mut self,
        action: PetAction,
        scale: f64,
        clock: &impl Clock,
    ) -> Notice {
        let notice = match action {
            PetAction::Care(care) => self.care(care, scale, clock.now_ms()),
            PetAction::ClaimDaily => self.claim_daily(clock),
            PetAction::UseBoost => self.use_boost(clock.now_ms()),
        };
        log::debug!("{action:?} -> {notice:?}");
        notice
    }

    fn care(&mut self, care: Care, scale: f64, now_ms: i64) -> Notice {
        let rule = care.rule();
        let multiplier = if self.boosted(now_ms) {
            rule.boost_multiplier
        } else {
            1.0
        };
        self.bump(rule.stat, rule.gain * multiplier * scale);
        if let Some((stat, cost)) = rule.side_cost {
            self.bump(stat, -cost);
        }
        self.score = self.score.saturating_add(rule.score);
        Notice::Cared(care)
    }

    fn claim_daily(&mut self, clock: &impl Clock) -> Notice {
        let today = clock.today();
        if self.reward_claimed_on(today) {
            return Notice::DailyAlreadyClaimed;
        }
        self.reward_claimed_date = Some(today);
        for stat in Stat::ALL {
            self.bump(stat, DAILY_REWARD.per_stat);
        }
        self.boosts_owned = self.boosts_owned.saturating_add(DAILY_REWARD.boosts);
        Notice::DailyClaimed
    }

    fn use_boost(&mut self, now_ms: i64) -> Notice {
        if self.boosted(now_ms) {
            return Notice::BoostAlreadyActive;
        }
        if self.boosts_owned == 0 {
            return Notice::NoBoosts;
        }
        self.boosts_owned -= 1;
        self.active_boost_until = now_ms.saturating_add(BOOST.duration_ms);
        Notice::BoostActivated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn fresh() -> (ManualClock, PetState) {
        let clock = ManualClock::at(ManualClock::NOON);
        let st = PetState::new(&clock);
        (clock, st)
    }

    fn in_range(st: &PetState) -> bool {
        Stat::ALL
            .iter()
            .all(|&s| (0.0..=100.0).contains(&st.stat(s)))
    }

    #[test]
    fn elapsed_rounds_and_never_drops_below_one() {
        assert_eq!(elapsed_secs(0, 0), 1);
        assert_eq!(elapsed_secs(0, 400), 1);
        assert_eq!(elapsed_secs(0, 1_499), 1);
        assert_eq!(elapsed_secs(0, 1_500), 2);
        assert_eq!(elapsed_secs(0, 10_000), 10);
        assert_eq!(elapsed_secs(5_000, 0), 1);
    }

    #[test]
    fn elapsed_saturates_on_extreme_timestamps() {
        assert_eq!(elapsed_secs(i64::MIN, 0), (i64::MAX as f64 / 1000.0).round() as u64);
        assert_eq!(elapsed_secs(i64::MAX, i64::MIN), 1);
    }

    #[test]
    fn counters_stop_at_their_ceiling() {
        let (clock, mut st) = fresh();
        st.day = u32::MAX;
        st.score = u64::MAX;
        st.boosts_owned = u32::MAX;
        st.last_login_date = st.last_login_date.pred_opt().unwrap();

        clock.advance_secs(1);
        assert_eq!(st.tick(&clock), vec![Notice::DayBegan(u32::MAX)]);
        assert_eq!(st.day, u32::MAX);
        assert_eq!(st.score, u64::MAX);

        assert_eq!(st.apply(PetAction::ClaimDaily, &clock), Notice::DailyClaimed);
        assert_eq!(st.boosts_owned, u32::MAX);
        st.apply(PetAction::Care(Care::Rest), &clock);
        assert_eq!(st.score, u64::MAX);
    }

    #[test]
    fn one_second_tick_decays_each_stat_by_its_rate() {
        let (clock, mut st) = fresh();
        clock.advance_secs(1);
        let notices = st.tick(&clock);

        assert!(notices.is_empty());
        assert!(close(st.hunger, 50.0 - 0.02));
        assert!(close(st.hygiene, 50.0 - 0.015));
        assert!(close(st.fun, 50.0 - 0.018));
        assert!(close(st.energy, 50.0 - 0.012));
        assert_eq!(st.last_tick, clock.now_ms());
    }

    #[test]
    fn tick_measures_from_previous_tick() {
        let (clock, mut st) = fresh();
        clock.advance_secs(10);
        st.tick(&clock);
        assert!(close(st.hunger, 50.0 - 0.2));

        clock.advance_secs(5);
        st.tick(&clock);
        assert!(close(st.hunger, 50.0 - 0.3));
    }

    #[test]
    fn boosted_tick_decays_at_forty_percent() {
        let (clock, mut st) = fresh();
        st.boosts_owned = 1;
        st.apply(PetAction::UseBoost, &clock);
        clock.advance_secs(10);
        st.tick(&clock);
        assert!(close(st.hunger, 50.0 - 0.02 * 10.0 * 0.4));
        assert!(close(st.energy, 50.0 - 0.012 * 10.0 * 0.4));
    }

    #[test]
    fn tick_score_follows_health() {
        let (clock, mut st) = fresh();
        clock.advance_secs(1);
        st.tick(&clock);
        // health just under 50 rounds to one point
        assert_eq!(st.score, 1);

        for stat in Stat::ALL {
            st.bump(stat, -100.0);
        }
        clock.advance_secs(1);
        st.tick(&clock);
        assert_eq!(st.score, 1);

        for stat in Stat::ALL {
            st.bump(stat, 100.0);
        }
        clock.advance_secs(1);
        st.tick(&clock);
        assert_eq!(st.score, 3);
    }

    #[test]
    fn day_rolls_over_once_and_clears_claim() {
        let (clock, mut st) = fresh();
        st.apply(PetAction::ClaimDaily, &clock);
        assert!(st.reward_claimed_date.is_some());

        clock.advance_secs(3600);
        assert!(st.tick(&clock).is_empty());
        assert_eq!(st.day, 1);

        clock.advance_secs(12 * 3600);
        let notices = st.tick(&clock);
        assert_eq!(notices, vec![Notice::DayBegan(2)]);
        assert_eq!(st.day, 2);
        assert_eq!(st.last_login_date, clock.today());
        assert_eq!(st.reward_claimed_date, None);

        clock.advance_secs(1);
        assert!(st.tick(&clock).is_empty());
        assert_eq!(st.day, 2);
    }

    #[test]
    fn several_missed_days_count_as_one() {
        let (clock, mut st) = fresh();
        clock.advance_secs(5 * 24 * 3600);
        st.tick(&clock);
        assert_eq!(st.day, 2);
        // five days of decay bottoms every stat out
        assert!(Stat::ALL.iter().all(|&s| st.stat(s) == 0.0));
    }

    #[test]
    fn boost_expires_on_tick() {
        let (clock, mut st) = fresh();
        st.boosts_owned = 1;
        assert_eq!(st.apply(PetAction::UseBoost, &clock), Notice::BoostActivated);

        clock.advance_secs(59);
        assert!(st.tick(&clock).is_empty());
        assert!(st.boosted(clock.now_ms()));

        clock.advance_secs(1);
        assert_eq!(st.tick(&clock), vec![Notice::BoostFaded]);
        assert_eq!(st.active_boost_until, 0);
        assert!(!st.boosted(clock.now_ms()));

        clock.advance_secs(1);
        assert!(st.tick(&clock).is_empty());
    }

    #[test]
    fn boosted_feed_from_fifty() {
        let (clock, mut st) = fresh();
        st.boosts_owned = 1;
        st.apply(PetAction::UseBoost, &clock);
        let notice = st.apply(PetAction::Care(Care::Feed), &clock);
        assert_eq!(notice, Notice::Cared(Care::Feed));
        assert!(close(st.hunger, 82.4));
        assert_eq!(st.score, 6);
    }

    #[test]
    fn unboosted_care_gains() {
        let (clock, mut st) = fresh();
        st.apply(PetAction::Care(Care::Feed), &clock);
        st.apply(PetAction::Care(Care::Clean), &clock);
        assert_eq!(st.hunger, 68.0);
        assert_eq!(st.hygiene, 66.0);
        assert_eq!(st.score, 11);
    }

    #[test]
    fn play_side_cost_is_not_boosted() {
        let (clock, mut st) = fresh();
        st.boosts_owned = 1;
        st.apply(PetAction::UseBoost, &clock);
        st.apply(PetAction::Care(Care::Play), &clock);
        assert!(close(st.fun, 84.0));
        assert_eq!(st.energy, 44.0);
        assert_eq!(st.score, 7);
    }

    #[test]
    fn rest_from_empty_energy() {
        let (clock, mut st) = fresh();
        st.energy = 0.0;
        st.hunger = 3.0;
        st.apply(PetAction::Care(Care::Rest), &clock);
        assert_eq!(st.energy, 24.0);
        assert_eq!(st.hunger, 0.0);
        assert_eq!(st.score, 4);
    }

    #[test]
    fn caller_scale_multiplies_the_gain_only() {
        let (clock, mut st) = fresh();
        st.apply_scaled(PetAction::Care(Care::Rest), 0.5, &clock);
        assert_eq!(st.energy, 62.0);
        assert_eq!(st.hunger, 45.0);
        assert_eq!(st.score, 4);
    }

    #[test]
    fn claim_daily_is_idempotent_per_day() {
        let (clock, mut st) = fresh();
        assert_eq!(st.apply(PetAction::ClaimDaily, &clock), Notice::DailyClaimed);
        assert_eq!(st.hunger, 65.0);
        assert_eq!(st.energy, 65.0);
        assert_eq!(st.boosts_owned, 1);
        assert_eq!(st.reward_claimed_date, Some(clock.today()));

        let before = st.clone();
        clock.advance_secs(60);
        assert_eq!(
            st.apply(PetAction::ClaimDaily, &clock),
            Notice::DailyAlreadyClaimed
        );
        assert_eq!(st, before);
    }

    #[test]
    fn claim_daily_clamps_stats() {
        let (clock, mut st) = fresh();
        st.fun = 95.0;
        st.apply(PetAction::ClaimDaily, &clock);
        assert_eq!(st.fun, 100.0);
    }

    #[test]
    fn use_boost_twice_is_single_instance() {
        let (clock, mut st) = fresh();
        st.boosts_owned = 1;
        assert_eq!(st.apply(PetAction::UseBoost, &clock), Notice::BoostActivated);
        assert_eq!(st.boosts_owned, 0);
        assert_eq!(st.active_boost_until, clock.now_ms() + 60_000);

        let before = st.clone();
        assert_eq!(
            st.apply(PetAction::UseBoost, &clock),
            Notice::BoostAlreadyActive
        );
        assert_eq!(st, before);
    }

    #[test]
    fn active_boost_is_reported_before_empty_stock() {
        let (clock, mut st) = fresh();
        st.boosts_owned = 2;
        st.apply(PetAction::UseBoost, &clock);
        st.apply(PetAction::UseBoost, &clock);
        assert_eq!(st.boosts_owned, 1);

        st.boosts_owned = 0;
        st.active_boost_until = 0;
        assert_eq!(st.apply(PetAction::UseBoost, &clock), Notice::NoBoosts);
        assert_eq!(st.active_boost_until, 0);
    }

    #[test]
    fn boost_can_be_restarted_after_expiry() {
        let (clock, mut st) = fresh();
        st.boosts_owned = 2;
        st.apply(PetAction::UseBoost, &clock);
        clock.advance_secs(61);
        st.tick(&clock);
        assert_eq!(st.apply(PetAction::UseBoost, &clock), Notice::BoostActivated);
        assert_eq!(st.boosts_owned, 0);
    }

    #[test]
    fn long_mixed_sequence_keeps_invariants() {
        let (clock, mut st) = fresh();
        let script = [
            PetAction::ClaimDaily,
            PetAction::UseBoost,
            PetAction::Care(Care::Feed),
            PetAction::Care(Care::Play),
            PetAction::Care(Care::Play),
            PetAction::Care(Care::Rest),
            PetAction::Care(Care::Clean),
            PetAction::UseBoost,
            PetAction::ClaimDaily,
        ];

        let mut day = st.day;
        let mut score = st.score;
        for round in 0..400 {
            let action = script[round % script.len()];
            let boosts_before = st.boosts_owned;
            st.apply(action, &clock);
            match action {
                PetAction::ClaimDaily => assert!(st.boosts_owned >= boosts_before),
                PetAction::UseBoost => assert!(st.boosts_owned <= boosts_before),
                PetAction::Care(_) => assert_eq!(st.boosts_owned, boosts_before),
            }
            assert!(in_range(&st));

            clock.advance_secs(1 + (round as i64 % 7) * 900);
            let boosts_before = st.boosts_owned;
            st.tick(&clock);
            assert_eq!(st.boosts_owned, boosts_before);
            assert!(in_range(&st));
            assert!(st.day >= day && st.day <= day + 1);
            assert!(st.score >= score);
            day = st.day;
            score = st.score;
        }
        assert!(st.day > 1);
    }
}
