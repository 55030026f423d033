use rust_decimal::Decimal;

/// Share breakdown of a single profit event. All values carry full
/// precision; rounding to 2 decimals happens at persistence/display time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub base: Decimal,
    pub bonus: Decimal,
    pub with_bonus: Decimal,
    pub referral_cut: Decimal,
    pub mentor_cut: Decimal,
    pub worker_net: Decimal,
}

fn percent_of(value: Decimal, percent: u32) -> Decimal {
    value * Decimal::from(percent) / Decimal::from(100)
}

/// `referral_percent` is Some iff the worker has a referrer;
/// `mentor_percent` is Some iff an assigned mentor passed the service gate.
///
/// The referral cut comes off the gross amount and is funded by the team
/// side; the mentor cut comes off the worker's bonus-inclusive share.
pub fn compute_split(
    gross: Decimal,
    worker_percent: u32,
    rank_bonus_percent: u32,
    referral_percent: Option<u32>,
    mentor_percent: Option<u32>,
) -> Split {
    let base = percent_of(gross, worker_percent);
    let bonus = percent_of(base, rank_bonus_percent);
    let with_bonus = base + bonus;

    let referral_cut = referral_percent.map_or(Decimal::ZERO, |p| percent_of(gross, p));
    let mentor_cut = mentor_percent.map_or(Decimal::ZERO, |p| percent_of(with_bonus, p));

    let worker_net = with_bonus - mentor_cut;

    Split {
        base,
        bonus,
        with_bonus,
        referral_cut,
        mentor_cut,
        worker_net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn plain_split_without_bonus() {
        let split = compute_split(dec(1000), 50, 0, None, None);

        assert_eq!(split.base, dec(500));
        assert_eq!(split.bonus, Decimal::ZERO);
        assert_eq!(split.worker_net, dec(500));
    }

    #[test]
    fn rank_bonus_is_additive() {
        let split = compute_split(dec(1000), 50, 10, None, None);

        assert_eq!(split.base, dec(500));
        assert_eq!(split.bonus, dec(50));
        assert_eq!(split.worker_net, dec(550));
    }

    #[test]
    fn mentor_cut_does_not_leak() {
        let split = compute_split(dec(1000), 50, 10, None, Some(20));

        assert_eq!(split.worker_net + split.mentor_cut, split.with_bonus);
    }

    #[test]
    fn referral_cut_is_from_gross_and_not_subtracted() {
        let with_referrer = compute_split(dec(1000), 50, 0, Some(5), None);
        let without_referrer = compute_split(dec(1000), 50, 0, None, None);

        assert_eq!(with_referrer.referral_cut, dec(50));
        assert_eq!(with_referrer.worker_net, without_referrer.worker_net);
    }

    #[test]
    fn zero_worker_percent_yields_zero_net() {
        let split = compute_split(dec(1000), 0, 10, Some(5), Some(20));

        assert_eq!(split.base, Decimal::ZERO);
        assert_eq!(split.bonus, Decimal::ZERO);
        assert_eq!(split.worker_net, Decimal::ZERO);
    }

    #[test]
    fn full_scenario_with_referrer_and_mentor() {
        let split = compute_split(dec(2000), 60, 5, Some(5), Some(30));

        assert_eq!(split.base, dec(1200));
        assert_eq!(split.bonus, dec(60));
        assert_eq!(split.with_bonus, dec(1260));
        assert_eq!(split.mentor_cut, dec(378));
        assert_eq!(split.worker_net, dec(882));
        assert_eq!(split.referral_cut, dec(100));
    }

    #[test]
    fn net_never_exceeds_gross_for_full_percent() {
        // Rank bonus is additive before cuts, so the worker share may only
        // exceed the base share, never the gross amount at 100% w/o bonus.
        let split = compute_split(dec(1000), 100, 0, Some(5), Some(20));

        assert!(split.worker_net <= dec(1000));
    }
}
