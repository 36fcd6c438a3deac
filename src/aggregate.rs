use crate::models::{GlobalStat, SubjectStat};
use crate::stats::percentage;

/// Running hours for one request, threaded through a fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulator {
    pub attended: i64,
    pub conducted: i64,
}

impl Accumulator {
    pub fn absorb(self, stat: &SubjectStat) -> Self {
        Self {
            attended: self.attended.saturating_add(stat.attended),
            conducted: self.conducted.saturating_add(stat.conducted),
        }
    }

    pub fn finish(self) -> GlobalStat {
        GlobalStat {
            attended: self.attended,
            conducted: self.conducted,
            percentage: percentage(self.attended, self.conducted),
        }
    }
}

pub fn aggregate(stats: &[SubjectStat]) -> GlobalStat {
    stats
        .iter()
        .fold(Accumulator::default(), Accumulator::absorb)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(name: &str, attended: i64, conducted: i64) -> SubjectStat {
        SubjectStat {
            id: name.to_string(),
            name: name.to_string(),
            kind: "Lecture".to_string(),
            attended,
            conducted,
            percentage: percentage(attended, conducted),
        }
    }

    #[test]
    fn totals_are_summed() {
        let global = aggregate(&[stat("a", 15, 18), stat("b", 9, 12)]);
        assert_eq!(global.attended, 24);
        assert_eq!(global.conducted, 30);
        assert_eq!(global.percentage, 80.0);
    }

    #[test]
    fn order_does_not_matter() {
        let mut stats = vec![stat("a", 15, 18), stat("b", 9, 12), stat("c", 0, 7)];
        let forward = aggregate(&stats);
        stats.reverse();
        assert_eq!(aggregate(&stats), forward);
    }

    #[test]
    fn nothing_conducted_is_zero_percent() {
        let global = aggregate(&[stat("a", 0, 0)]);
        assert_eq!(global.percentage, 0.0);
        assert_eq!(aggregate(&[]).conducted, 0);
    }
}
