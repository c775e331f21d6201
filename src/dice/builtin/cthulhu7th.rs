//! Call of Cthulhu 7th edition skill checks (`CC`).

use rand::Rng;

use super::common::Scanner;

const MAX_BONUS: i64 = 2;

/// `CC[(b)][<=t]`: a percentile check with bonus (b > 0) or penalty (b < 0)
/// tens dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillCheck {
    pub bonus: i64,
    pub target: Option<i64>,
}

impl SkillCheck {
    pub fn parse(command: &str) -> Option<Self> {
        let mut scanner = Scanner::new(command);
        if !scanner.eat_str("CC") {
            return None;
        }

        let bonus = if scanner.eat(b'(') {
            let bonus = scanner.signed()?;
            if !scanner.eat(b')') {
                return None;
            }
            bonus
        } else if matches!(scanner.peek(), Some(b'0'..=b'9' | b'+' | b'-')) {
            scanner.signed()?
        } else {
            0
        };

        if bonus.abs() > MAX_BONUS {
            return None;
        }

        let target = if scanner.eat_str("<=") {
            Some(i64::from(scanner.number()?))
        } else {
            None
        };

        scanner.is_end().then_some(Self { bonus, target })
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let units = rng.gen_range(0..=9);
        let tens: Vec<u32> = (0..=self.bonus.unsigned_abs())
            .map(|_| rng.gen_range(0..=9))
            .collect();
        self.render(units, &tens)
    }

    /// Render a check given the units die and every tens die rolled.
    pub fn render(&self, units: u32, tens: &[u32]) -> String {
        let candidates: Vec<i64> = tens
            .iter()
            .map(|&t| match i64::from(t * 10 + units) {
                0 => 100,
                v => v,
            })
            .collect();
        let chosen = if self.bonus >= 0 {
            candidates.iter().copied().min()
        } else {
            candidates.iter().copied().max()
        }
        .unwrap_or(100);

        let mut text = match self.target {
            Some(target) => format!("(1D100<={target})"),
            None => "(1D100)".to_string(),
        };
        text.push_str(&format!(" ボーナス・ペナルティダイス[{}]", self.bonus));
        if candidates.len() > 1 {
            let listed = candidates
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            text.push_str(&format!(" ＞ {listed}"));
        }
        text.push_str(&format!(" ＞ {chosen}"));

        if let Some(target) = self.target {
            text.push_str(" ＞ ");
            text.push_str(success_level(chosen, target));
        }
        text
    }
}

/// Success level of a percentile result against a skill value.
pub fn success_level(value: i64, target: i64) -> &'static str {
    if value == 1 {
        "クリティカル"
    } else if value == 100 || (value >= 96 && target < 50) {
        "ファンブル"
    } else if value <= target / 5 {
        "イクストリーム成功"
    } else if value <= target / 2 {
        "ハード成功"
    } else if value <= target {
        "レギュラー成功"
    } else {
        "失敗"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forms() {
        assert_eq!(
            SkillCheck::parse("CC"),
            Some(SkillCheck { bonus: 0, target: None })
        );
        assert_eq!(
            SkillCheck::parse("CC<=50"),
            Some(SkillCheck { bonus: 0, target: Some(50) })
        );
        assert_eq!(
            SkillCheck::parse("CC(1)<=50"),
            Some(SkillCheck { bonus: 1, target: Some(50) })
        );
        assert_eq!(
            SkillCheck::parse("CC-2<=30"),
            Some(SkillCheck { bonus: -2, target: Some(30) })
        );
        assert_eq!(
            SkillCheck::parse("CC1"),
            Some(SkillCheck { bonus: 1, target: None })
        );
    }

    #[test]
    fn rejects_bad_forms() {
        for bad in ["C", "CC(3)<=50", "CC<=", "CC<50", "CC(1<=50", "CCX", "1D100"] {
            assert_eq!(SkillCheck::parse(bad), None, "{bad}");
        }
    }

    #[test]
    fn levels() {
        assert_eq!(success_level(1, 50), "クリティカル");
        assert_eq!(success_level(100, 99), "ファンブル");
        assert_eq!(success_level(97, 40), "ファンブル");
        assert_eq!(success_level(97, 99), "レギュラー成功");
        assert_eq!(success_level(10, 50), "イクストリーム成功");
        assert_eq!(success_level(25, 50), "ハード成功");
        assert_eq!(success_level(50, 50), "レギュラー成功");
        assert_eq!(success_level(51, 50), "失敗");
    }

    #[test]
    fn renders_plain_check() {
        let check = SkillCheck { bonus: 0, target: Some(50) };
        assert_eq!(
            check.render(7, &[3]),
            "(1D100<=50) ボーナス・ペナルティダイス[0] ＞ 37 ＞ レギュラー成功"
        );
    }

    #[test]
    fn double_zero_is_one_hundred() {
        let check = SkillCheck { bonus: 0, target: None };
        assert_eq!(check.render(0, &[0]), "(1D100) ボーナス・ペナルティダイス[0] ＞ 100");
    }

    #[test]
    fn bonus_takes_lowest_and_penalty_highest() {
        let bonus = SkillCheck { bonus: 1, target: Some(50) };
        assert_eq!(
            bonus.render(4, &[2, 8]),
            "(1D100<=50) ボーナス・ペナルティダイス[1] ＞ 24, 84 ＞ 24 ＞ ハード成功"
        );
        let penalty = SkillCheck { bonus: -1, target: Some(50) };
        assert!(penalty.render(4, &[2, 8]).ends_with("＞ 84 ＞ 失敗"));
    }
}
