//! Emoklore success-counting rolls (`kDM<=n`).

use rand::Rng;

use super::common::Scanner;

const MAX_POOL: u32 = 30;
const FACES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolRoll {
    pub pool: u32,
    pub target: u32,
}

impl PoolRoll {
    pub fn parse(command: &str) -> Option<Self> {
        let mut scanner = Scanner::new(command);
        let pool = if scanner.eat_str("DM") {
            1
        } else {
            let pool = scanner.number()?;
            if !scanner.eat_str("DM") {
                return None;
            }
            pool
        };
        if !(1..=MAX_POOL).contains(&pool) || !scanner.eat_str("<=") {
            return None;
        }
        let target = scanner.number()?;
        scanner.is_end().then_some(Self { pool, target })
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let dice: Vec<u32> = (0..self.pool)
            .map(|_| rng.gen_range(1..=FACES))
            .collect();
        self.render(&dice)
    }

    /// Count successes: a 1 counts twice, a 10 takes one away.
    pub fn successes(&self, dice: &[u32]) -> i64 {
        dice.iter()
            .map(|&d| match d {
                1 => 2,
                FACES => -1,
                d if d <= self.target => 1,
                _ => 0,
            })
            .sum()
    }

    pub fn render(&self, dice: &[u32]) -> String {
        let successes = self.successes(dice);
        let listed = dice
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "({}DM<={}) ＞ [{}] ＞ {} ＞ {}",
            self.pool,
            self.target,
            listed,
            successes,
            result_label(successes)
        )
    }
}

pub fn result_label(successes: i64) -> &'static str {
    match successes {
        i64::MIN..=-1 => "ファンブル",
        0 => "失敗",
        1 => "成功",
        2 => "ダブル",
        3 => "トリプル",
        _ => "ミラクル",
    }
}
