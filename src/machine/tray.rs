use crate::Amount;
use crate::model::Denomination;

use super::TrayError;

/// Coins the machine holds for dispensing change, counted per denomination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoinReserve {
    counts: [u32; 4],
}

impl CoinReserve {
    /// An empty reserve.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reserve holding `count` coins of every denomination.
    pub fn uniform(count: u32) -> Self {
        Self { counts: [count; 4] }
    }

    pub fn with_count(mut self, coin: Denomination, count: u32) -> Self {
        self.set(coin, count);
        self
    }

    pub fn count(&self, coin: Denomination) -> u32 {
        self.counts[coin as usize]
    }

    pub fn set(&mut self, coin: Denomination, count: u32) {
        self.counts[coin as usize] = count;
    }

    /// Counts per denomination, largest first.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        Denomination::DESCENDING
            .into_iter()
            .map(|coin| (coin, self.count(coin)))
    }

    pub fn total(&self) -> Amount {
        self.iter().map(|(coin, count)| coin.value() * count).sum()
    }

    /// Whether every coin in `breakdown` is on hand.
    pub fn covers(&self, breakdown: &Breakdown) -> bool {
        breakdown
            .iter()
            .all(|(coin, needed)| u64::from(self.count(coin)) >= needed)
    }

    /// Remove the coins in `breakdown`.
    ///
    /// Fails without touching any count if a single denomination would go
    /// negative.
    pub fn deduct(&mut self, breakdown: &Breakdown) -> Result<(), TrayError> {
        if !self.covers(breakdown) {
            return Err(TrayError::ChangeUnavailable(breakdown.total()));
        }
        for (coin, needed) in breakdown.iter() {
            // covered, so `needed` fits the stored count
            self.counts[coin as usize] -= needed as u32;
        }
        Ok(())
    }
}

impl FromIterator<(Denomination, u32)> for CoinReserve {
    fn from_iter<I: IntoIterator<Item = (Denomination, u32)>>(iter: I) -> Self {
        let mut reserve = Self::new();
        for (coin, count) in iter {
            reserve.set(coin, count);
        }
        reserve
    }
}

/// Coins making up an amount, largest denomination first.
///
/// `remainder` holds whatever part of the requested amount no denomination
/// could express; a breakdown is only payable when it is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown {
    coins: Vec<(Denomination, u64)>,
    remainder: Amount,
}

impl Breakdown {
    /// Greedy breakdown: take as many of the largest coin as fit, then move
    /// down. Minimal in coin count for the canonical 1.00/0.25/0.10/0.05 set.
    pub fn greedy(amount: Amount) -> Self {
        if amount < Amount::ZERO {
            return Self {
                coins: Vec::new(),
                remainder: amount,
            };
        }

        let mut coins = Vec::new();
        let mut remaining = amount.cents();
        for coin in Denomination::DESCENDING {
            let value = coin.value().cents();
            // `remaining` is never negative here
            let count = (remaining / value) as u64;
            if count > 0 {
                coins.push((coin, count));
                remaining %= value;
            }
        }

        Self {
            coins,
            remainder: Amount::from_cents(remaining),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn is_exact(&self) -> bool {
        self.remainder.is_zero()
    }

    pub fn remainder(&self) -> Amount {
        self.remainder
    }

    pub fn count(&self, coin: Denomination) -> u64 {
        self.coins
            .iter()
            .find(|(c, _)| *c == coin)
            .map_or(0, |(_, count)| *count)
    }

    /// Non-zero counts, largest denomination first.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u64)> + '_ {
        self.coins.iter().copied()
    }

    /// Every coin individually, in dispensing order.
    pub fn coins(&self) -> impl Iterator<Item = Denomination> + '_ {
        self.iter()
            .flat_map(|(coin, count)| std::iter::repeat_n(coin, count as usize))
    }

    pub fn coin_count(&self) -> u64 {
        self.coins.iter().map(|(_, count)| count).sum()
    }

    pub fn total(&self) -> Amount {
        self.iter().map(|(coin, count)| coin.value() * count).sum()
    }
}

/// The customer's inserted balance together with the machine's coin reserve.
///
/// The two are separate pools: inserted coins are never used to pay out
/// change.
#[derive(Debug, Clone, Default)]
pub struct ChangeTray {
    balance: Amount,
    reserve: CoinReserve,
}

impl ChangeTray {
    pub fn new(reserve: CoinReserve) -> Self {
        Self {
            balance: Amount::ZERO,
            reserve,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn available_change(&self) -> &CoinReserve {
        &self.reserve
    }

    pub fn set_available_change(&mut self, reserve: CoinReserve) {
        self.reserve = reserve;
    }

    /// Accept a coin whose value exactly matches a known denomination.
    pub fn insert_coin(&mut self, amount: Amount) -> Result<Denomination, TrayError> {
        let coin = Denomination::from_amount(amount).ok_or(TrayError::InvalidCoin(amount))?;
        self.balance += coin.value();
        Ok(coin)
    }

    /// Hand the whole balance back. The reserve is untouched since these are
    /// the customer's own coins.
    pub fn return_coins(&mut self) -> Breakdown {
        let returned = Breakdown::greedy(self.balance);
        self.balance = Amount::ZERO;
        returned
    }

    /// Whether `amount` can be paid out of the reserve right now.
    pub fn has_enough_change(&self, amount: Amount) -> bool {
        if amount.is_zero() {
            return true;
        }
        let needed = Breakdown::greedy(amount);
        needed.is_exact() && self.reserve.covers(&needed)
    }

    /// Charge `price` against the balance and pay out the difference from the
    /// reserve.
    ///
    /// Feasibility is checked before anything changes: on error the balance
    /// and the reserve are left as they were.
    pub fn calculate_change(&mut self, price: Amount) -> Result<Breakdown, TrayError> {
        if price > self.balance {
            return Err(TrayError::InsufficientFunds {
                shortfall: price - self.balance,
            });
        }

        let change = self.balance - price;
        if change.is_zero() {
            self.balance = Amount::ZERO;
            return Ok(Breakdown::default());
        }

        let breakdown = Breakdown::greedy(change);
        if !breakdown.is_exact() {
            return Err(TrayError::ChangeUnavailable(change));
        }
        self.reserve.deduct(&breakdown)?;
        self.balance = Amount::ZERO;

        Ok(breakdown)
    }
}
