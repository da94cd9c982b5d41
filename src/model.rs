use crate::clock::Clock;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub(crate) const STAT_MIN: f64 = 0.0;
pub(crate) const STAT_MAX: f64 = 100.0;
pub(crate) const STAT_DEFAULT: f64 = 50.0;

pub(crate) const BOOST_NAME: &str = "Glow Burst";
pub(crate) const DAILY_REWARD_NAME: &str = "LumiSeed";

pub(crate) fn clamp_stat(v: f64) -> f64 {
    v.clamp(STAT_MIN, STAT_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stat {
    Hunger,
    Hygiene,
    Fun,
    Energy,
}

impl Stat {
    pub(crate) const ALL: [Stat; 4] = [Stat::Hunger, Stat::Hygiene, Stat::Fun, Stat::Energy];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Stat::Hunger => "hunger",
            Stat::Hygiene => "hygiene",
            Stat::Fun => "fun",
            Stat::Energy => "energy",
        }
    }

    /// Units lost per second of elapsed time, before the boost decay factor.
    pub(crate) fn decay_per_sec(self) -> f64 {
        match self {
            Stat::Hunger => 0.02,
            Stat::Hygiene => 0.015,
            Stat::Fun => 0.018,
            Stat::Energy => 0.012,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BoostRules {
    pub(crate) duration_ms: i64,
    pub(crate) decay_factor: f64,
}

pub(crate) const BOOST: BoostRules = BoostRules {
    duration_ms: 60_000,
    decay_factor: 0.4,
};

#[derive(Clone, Copy, Debug)]
pub(crate) struct DailyReward {
    pub(crate) per_stat: f64,
    pub(crate) boosts: u32,
}

pub(crate) const DAILY_REWARD: DailyReward = DailyReward {
    per_stat: 15.0,
    boosts: 1,
};

/// One row of the care table: what an action raises, what it costs and what it pays.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CareRule {
    pub(crate) stat: Stat,
    pub(crate) gain: f64,
    pub(crate) boost_multiplier: f64,
    pub(crate) side_cost: Option<(Stat, f64)>,
    pub(crate) score: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Care {
    Feed,
    Clean,
    Play,
    Rest,
}

impl Care {
    pub(crate) fn rule(self) -> CareRule {
        match self {
            Care::Feed => CareRule {
                stat: Stat::Hunger,
                gain: 18.0,
                boost_multiplier: 1.8,
                side_cost: None,
                score: 6,
            },
            Care::Clean => CareRule {
                stat: Stat::Hygiene,
                gain: 16.0,
                boost_multiplier: 1.6,
                side_cost: None,
                score: 5,
            },
            Care::Play => CareRule {
                stat: Stat::Fun,
                gain: 20.0,
                boost_multiplier: 1.7,
                side_cost: Some((Stat::Energy, 6.0)),
                score: 7,
            },
            Care::Rest => CareRule {
                stat: Stat::Energy,
                gain: 24.0,
                boost_multiplier: 1.5,
                side_cost: Some((Stat::Hunger, 5.0)),
                score: 4,
            },
        }
    }
}

/// The persisted pet record. Field names match the on-disk JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PetState {
    pub(crate) hunger: f64,
    pub(crate) hygiene: f64,
    pub(crate) fun: f64,
    pub(crate) energy: f64,
    pub(crate) last_tick: i64,
    pub(crate) day: u32,
    pub(crate) score: u64,
    pub(crate) last_login_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_date")]
    pub(crate) reward_claimed_date: Option<NaiveDate>,
    pub(crate) boosts_owned: u32,
    pub(crate) active_boost_until: i64,
    /// Keys we don't know about; carried through load/save untouched.
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

/// Anything that isn't a `YYYY-MM-DD` string reads as "not claimed".
fn lenient_date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(de)?;
    Ok(raw
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
}

impl PetState {
    pub(crate) fn new(clock: &impl Clock) -> Self {
        Self {
            hunger: STAT_DEFAULT,
            hygiene: STAT_DEFAULT,
            fun: STAT_DEFAULT,
            energy: STAT_DEFAULT,
            last_tick: clock.now_ms(),
            day: 1,
            score: 0,
            last_login_date: clock.today(),
            reward_claimed_date: None,
            boosts_owned: 0,
            active_boost_until: 0,
            extra: Map::new(),
        }
    }

    /// Pulls loaded values back inside the ranges the engine works with.
    pub(crate) fn normalize(&mut self) {
        for stat in Stat::ALL {
            self.bump(stat, 0.0);
        }
        self.day = self.day.max(1);
    }

    pub(crate) fn stat(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Hunger => self.hunger,
            Stat::Hygiene => self.hygiene,
            Stat::Fun => self.fun,
            Stat::Energy => self.energy,
        }
    }

    /// Adds `delta` (may be negative) and clamps into range.
    pub(crate) fn bump(&mut self, stat: Stat, delta: f64) {
        let slot = match stat {
            Stat::Hunger => &mut self.hunger,
            Stat::Hygiene => &mut self.hygiene,
            Stat::Fun => &mut self.fun,
            Stat::Energy => &mut self.energy,
        };
        *slot = clamp_stat(*slot + delta);
    }

    pub(crate) fn health(&self) -> f64 {
        (self.hunger + self.hygiene + self.fun + self.energy) / 4.0
    }

    pub(crate) fn boosted(&self, now_ms: i64) -> bool {
        now_ms < self.active_boost_until
    }

    pub(crate) fn boost_remaining_ms(&self, now_ms: i64) -> i64 {
        self.active_boost_until.saturating_sub(now_ms).max(0)
    }

    pub(crate) fn reward_claimed_on(&self, date: NaiveDate) -> bool {
        self.reward_claimed_date == Some(date)
    }

    pub(crate) fn can_use_boost(&self, now_ms: i64) -> bool {
        self.boosts_owned > 0 && !self.boosted(now_ms)
    }
}

/// Informational messages produced by the engine. None of these are errors.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Notice {
    Cared(Care),
    DayBegan(u32),
    BoostFaded,
    DailyClaimed,
    DailyAlreadyClaimed,
    BoostActivated,
    BoostAlreadyActive,
    NoBoosts,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Cared(Care::Feed) => write!(f, "A warm bowl of noodles. Yum!"),
            Notice::Cared(Care::Clean) => write!(f, "Squeaky clean, sparkles everywhere."),
            Notice::Cared(Care::Play) => write!(f, "Playtime! Your lumipod loved that."),
            Notice::Cared(Care::Rest) => write!(f, "A cozy nap restores the glow."),
            Notice::DayBegan(day) => write!(f, "Day {day} begins. A soft glow fills the room."),
            Notice::BoostFaded => write!(f, "{BOOST_NAME} has faded."),
            Notice::DailyClaimed => write!(
                f,
                "You claimed a {DAILY_REWARD_NAME}: +{} to all stats and +{} {BOOST_NAME}!",
                DAILY_REWARD.per_stat, DAILY_REWARD.boosts
            ),
            Notice::DailyAlreadyClaimed => write!(f, "Daily reward already claimed."),
            Notice::BoostActivated => write!(
                f,
                "{BOOST_NAME} activated for {} seconds! Gains up, decay down.",
                BOOST.duration_ms / 1000
            ),
            Notice::BoostAlreadyActive => write!(f, "A boost is already active."),
            Notice::NoBoosts => write!(f, "No boosts available."),
        }
    }
}
