//! Notation pieces shared by every game system: a tiny scanner, comparison
//! operators and plain `NdM` sums.

use rand::Rng;

pub const MAX_DICE: u32 = 100;
pub const MAX_FACES: u32 = 1000;

/// Cursor over an upper-cased ASCII command.
pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    pub fn is_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    /// Consume `byte` if it is next.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `token` if the input continues with it.
    pub fn eat_str(&mut self, token: &str) -> bool {
        if self.src[self.pos..].starts_with(token.as_bytes()) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// Consume a run of ASCII digits. `None` if there are none or it overflows.
    pub fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }

    /// Consume an integer with an optional leading sign.
    pub fn signed(&mut self) -> Option<i64> {
        let negative = if self.eat(b'-') {
            true
        } else {
            self.eat(b'+');
            false
        };
        let value = i64::from(self.number()?);
        Some(if negative { -value } else { value })
    }

    pub fn comparison(&mut self) -> Option<Comparison> {
        const OPERATORS: [(&str, Comparison); 6] = [
            ("<=", Comparison::LessOrEqual),
            (">=", Comparison::GreaterOrEqual),
            ("<>", Comparison::NotEqual),
            ("<", Comparison::Less),
            (">", Comparison::Greater),
            ("=", Comparison::Equal),
        ];
        OPERATORS
            .iter()
            .find(|(symbol, _)| self.eat_str(symbol))
            .map(|(_, cmp)| *cmp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessOrEqual,
    GreaterOrEqual,
    NotEqual,
    Less,
    Greater,
    Equal,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::LessOrEqual => "<=",
            Comparison::GreaterOrEqual => ">=",
            Comparison::NotEqual => "<>",
            Comparison::Less => "<",
            Comparison::Greater => ">",
            Comparison::Equal => "=",
        }
    }

    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
            Comparison::NotEqual => lhs != rhs,
            Comparison::Less => lhs < rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::Equal => lhs == rhs,
        }
    }
}

/// Verdict appended to a checked roll.
pub fn verdict(success: bool) -> &'static str {
    if success {
        "成功"
    } else {
        "失敗"
    }
}

/// A parsed `NdM[+k][<op>t]` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumRoll {
    pub count: u32,
    pub faces: u32,
    pub modifier: i64,
    pub check: Option<(Comparison, i64)>,
}

impl SumRoll {
    pub fn parse(command: &str) -> Option<Self> {
        let mut scanner = Scanner::new(command);
        let count = scanner.number()?;
        if !scanner.eat(b'D') {
            return None;
        }
        let faces = scanner.number()?;
        if !(1..=MAX_DICE).contains(&count) || !(1..=MAX_FACES).contains(&faces) {
            return None;
        }

        let modifier = if matches!(scanner.peek(), Some(b'+' | b'-')) {
            scanner.signed()?
        } else {
            0
        };

        let check = match scanner.comparison() {
            Some(cmp) => Some((cmp, scanner.signed()?)),
            None => None,
        };

        scanner.is_end().then_some(Self {
            count,
            faces,
            modifier,
            check,
        })
    }

    fn expression(&self) -> String {
        let mut expr = format!("{}D{}", self.count, self.faces);
        if self.modifier != 0 {
            expr.push_str(&format!("{:+}", self.modifier));
        }
        if let Some((cmp, target)) = self.check {
            expr.push_str(&format!("{}{}", cmp.symbol(), target));
        }
        expr
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let dice: Vec<u32> = (0..self.count)
            .map(|_| rng.gen_range(1..=self.faces))
            .collect();
        self.render(&dice)
    }

    pub fn render(&self, dice: &[u32]) -> String {
        let sum: i64 = dice.iter().map(|&d| i64::from(d)).sum();
        let total = sum + self.modifier;

        let mut text = format!("({}) ＞ ", self.expression());
        if self.count == 1 && self.modifier == 0 {
            text.push_str(&total.to_string());
        } else {
            let listed = dice
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            text.push_str(&format!("{sum}[{listed}]"));
            if self.modifier != 0 {
                text.push_str(&format!("{:+}", self.modifier));
            }
            text.push_str(&format!(" ＞ {total}"));
        }

        if let Some((cmp, target)) = self.check {
            text.push_str(" ＞ ");
            text.push_str(verdict(cmp.holds(total, target)));
        }
        text
    }
}
