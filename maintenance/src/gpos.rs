//! GPOS vote-weight decay.
//!
//! A stake's voting (and core-dividend) weight decays as whole subperiods
//! pass without the owner refreshing its vote set. The factor is kept as an
//! exact rational over the subperiod count — no floating point reaches
//! consensus state.

use estuary_types::{ChainParameters, Hardfork, HardforkSchedule, Timestamp};
use estuary_utils::mul_div_floor;

/// An exact decay factor `numerator / denominator`, both in subperiod
/// counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VestingFactor {
    pub numerator: u64,
    pub denominator: u64,
}

impl VestingFactor {
    pub const ZERO: Self = Self {
        numerator: 0,
        denominator: 1,
    };

    pub fn full() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_full(&self) -> bool {
        self.numerator == self.denominator
    }

    /// Scale an amount by this factor, truncating.
    pub fn apply(&self, amount: u128) -> u128 {
        if self.is_full() {
            return amount;
        }
        mul_div_floor(amount, u128::from(self.numerator), u128::from(self.denominator))
    }
}

/// Whether head time sits inside the GPOS bootstrap window: the first
/// subperiod after activation, during which stake still counts at its
/// legacy (liquid-balance) weight because nobody has had a chance to vote
/// under the new rules.
pub fn in_bootstrap_window(
    schedule: &HardforkSchedule,
    params: &ChainParameters,
    now: Timestamp,
) -> bool {
    if !schedule.activated(Hardfork::Gpos, now) {
        return false;
    }
    let activation = schedule.activation(Hardfork::Gpos);
    now < activation.saturating_add_secs(params.gpos_subperiod_secs)
}

/// Decay factor for a stake whose opinion account last voted at
/// `last_vote`, evaluated at head time `now`.
///
/// Subperiods are counted globally from `gpos_period_start`; the factor is
/// `(subperiods_in_period - age) / subperiods_in_period` where `age` is how
/// many whole subperiods lie between the vote and now. A vote older than a
/// full period, or cast before the period start, scores zero.
///
/// One grandfathered exception, preserved as found: when head time is in
/// the first subperiod of a period, a vote cast during the final subperiod
/// of the previous period scores full weight. Without it every stake would
/// open a period at zero.
pub fn vesting_factor(
    last_vote: Timestamp,
    now: Timestamp,
    params: &ChainParameters,
) -> VestingFactor {
    let start = params.gpos_period_start;
    if now < start {
        return VestingFactor::ZERO;
    }

    let subperiods = params.gpos_subperiod_count();
    let sub_secs = if params.gpos_subperiod_secs == 0 {
        params.gpos_period_secs.max(1)
    } else {
        params.gpos_subperiod_secs
    };

    let current_sub = (now.as_secs() - start.as_secs()) / sub_secs;

    if last_vote < start {
        return VestingFactor::ZERO;
    }
    let vote_sub = (last_vote.as_secs() - start.as_secs()) / sub_secs;
    if vote_sub > current_sub {
        // Vote timestamped in the future relative to head time; treat as
        // current.
        return VestingFactor::full();
    }
    let age = current_sub - vote_sub;

    if current_sub % subperiods == 0 && age == 1 {
        return VestingFactor::full();
    }

    if age >= subperiods {
        return VestingFactor::ZERO;
    }
    VestingFactor {
        numerator: subperiods - age,
        denominator: subperiods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estuary_types::ChainParameters;

    fn params() -> ChainParameters {
        let mut p = ChainParameters::mainnet_defaults();
        p.gpos_period_start = Timestamp::new(1_000);
        p.gpos_period_secs = 600; // 6 subperiods of 100s
        p.gpos_subperiod_secs = 100;
        p
    }

    #[test]
    fn fresh_vote_scores_full() {
        let p = params();
        let f = vesting_factor(Timestamp::new(1_050), Timestamp::new(1_080), &p);
        assert!(f.is_full());
    }

    #[test]
    fn factor_decays_one_step_per_subperiod() {
        let p = params();
        let vote = Timestamp::new(1_050); // subperiod 0
        for (now, expected_num) in [
            (1_150, 5), // 1 subperiod old
            (1_250, 4),
            (1_350, 3),
            (1_450, 2),
            (1_550, 1),
        ] {
            let f = vesting_factor(vote, Timestamp::new(now), &p);
            assert_eq!(f.numerator, expected_num, "at t={now}");
            assert_eq!(f.denominator, 6);
        }
        // A full period later the vote no longer counts.
        let f = vesting_factor(vote, Timestamp::new(1_650), &p);
        assert!(f.is_zero());
    }

    #[test]
    fn votes_before_period_start_score_zero() {
        let p = params();
        let f = vesting_factor(Timestamp::new(500), Timestamp::new(1_250), &p);
        assert!(f.is_zero());
        let never = vesting_factor(Timestamp::EPOCH, Timestamp::new(1_250), &p);
        assert!(never.is_zero());
    }

    #[test]
    fn head_before_period_start_scores_zero() {
        let p = params();
        assert!(vesting_factor(Timestamp::new(900), Timestamp::new(950), &p).is_zero());
    }

    #[test]
    fn final_subperiod_vote_grandfathered_into_next_period() {
        let p = params();
        // Vote in subperiod 5 (the final one of period 0), head in
        // subperiod 6 (first of period 1): full weight, not 5/6.
        let f = vesting_factor(Timestamp::new(1_550), Timestamp::new(1_650), &p);
        assert!(f.is_full());
        // Same vote two subperiods later decays normally.
        let f = vesting_factor(Timestamp::new(1_550), Timestamp::new(1_750), &p);
        assert_eq!(f.numerator, 4);
    }

    #[test]
    fn apply_truncates() {
        let f = VestingFactor {
            numerator: 2,
            denominator: 3,
        };
        assert_eq!(f.apply(100), 66);
        assert_eq!(VestingFactor::ZERO.apply(100), 0);
        assert_eq!(VestingFactor::full().apply(100), 100);
    }
}
