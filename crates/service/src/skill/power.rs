use std::collections::BTreeSet;

use models::SkillBook;

/// Bonus for each affinity the book matches.
pub const MATCH_BONUS: i64 = 20;
/// Penalty for each affinity the book does not match.
pub const MISMATCH_PENALTY: i64 = 10;

/// Base power of a skill learned from `book` by someone with `affinities`.
///
/// Every affinity contributes exactly one term, matching or not. `None` when
/// the result does not fit in an `i64`.
pub fn skill_power(book: &SkillBook, affinities: &BTreeSet<String>) -> Option<i64> {
    affinities.iter().try_fold(book.power, |power, affinity| {
        if book.matches(affinity) {
            power.checked_add(MATCH_BONUS)
        } else {
            power.checked_sub(MISMATCH_PENALTY)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> { items.iter().map(|s| s.to_string()).collect() }

    fn book(roots: &[&str]) -> SkillBook {
        SkillBook { name: "技能书：烈焰斩".into(), power: 50, spiritual_root: roots.iter().map(|s| s.to_string()).collect() }
    }

    #[test]
    fn one_match_one_mismatch() {
        assert_eq!(skill_power(&book(&["火"]), &set(&["火", "金"])), Some(60));
    }

    #[test]
    fn no_affinities_keeps_base_power() {
        assert_eq!(skill_power(&book(&["火"]), &set(&[])), Some(50));
    }

    #[test]
    fn every_mismatch_counts() {
        assert_eq!(skill_power(&book(&[]), &set(&["水", "木", "土"])), Some(20));
        assert_eq!(skill_power(&book(&["水", "木", "土"]), &set(&["水", "木", "土"])), Some(110));
    }

    #[test]
    fn out_of_range_power_is_none() {
        let mut strong = book(&["火"]);
        strong.power = i64::MAX - 5;
        assert_eq!(skill_power(&strong, &set(&["火"])), None);

        let mut weak = book(&[]);
        weak.power = i64::MIN + 5;
        assert_eq!(skill_power(&weak, &set(&["金"])), None);
    }
}
