//! Performance statistics over closed trades. Pure functions only.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::account::Trade;

/// Percentages are in percent units. `profit_factor` is infinite when no
/// trade lost money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub total_return: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub losing_trades: usize,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub average_return_per_trade: f64,
}

impl Performance {
    pub fn compute(trades: &[Trade], initial_capital: Decimal, final_capital: Decimal) -> Self {
        let average_win = average_win(trades);
        let average_loss = average_loss(trades);
        Self {
            initial_capital,
            final_capital,
            total_return: total_return(initial_capital, final_capital),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(average_win, average_loss),
            average_win,
            average_loss,
            total_trades: trades.len(),
            profitable_trades: trades.iter().filter(|t| is_win(t)).count(),
            losing_trades: trades.iter().filter(|t| !is_win(t)).count(),
            largest_win: trades
                .iter()
                .map(|t| t.profit)
                .filter(|p| *p > Decimal::ZERO)
                .max()
                .unwrap_or(Decimal::ZERO),
            largest_loss: trades
                .iter()
                .map(|t| t.profit)
                .filter(|p| *p <= Decimal::ZERO)
                .min()
                .unwrap_or(Decimal::ZERO),
            average_return_per_trade: average_return(trades),
        }
    }
}

fn is_win(trade: &Trade) -> bool {
    trade.profit > Decimal::ZERO
}

pub fn total_return(initial_capital: Decimal, final_capital: Decimal) -> f64 {
    if initial_capital <= Decimal::ZERO {
        return 0.0;
    }
    ((final_capital - initial_capital) / initial_capital * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| is_win(t)).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// Mean profit of winning trades, zero without any.
pub fn average_win(trades: &[Trade]) -> Decimal {
    mean(trades.iter().filter(|t| is_win(t)).map(|t| t.profit))
}

/// Mean profit of trades with `profit <= 0`, zero without any.
pub fn average_loss(trades: &[Trade]) -> Decimal {
    mean(trades.iter().filter(|t| !is_win(t)).map(|t| t.profit))
}

pub fn profit_factor(average_win: Decimal, average_loss: Decimal) -> f64 {
    if average_loss.is_zero() {
        return f64::INFINITY;
    }
    (average_win / average_loss).abs().to_f64().unwrap_or(0.0)
}

/// Mean trade return rate, in percent.
pub fn average_return(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.return_rate).sum::<f64>() / trades.len() as f64 * 100.0
}

fn mean(values: impl Iterator<Item = Decimal>) -> Decimal {
    let (sum, count) = values.fold((Decimal::ZERO, 0u32), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(count)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use strategy::SignalKind;

    use super::{profit_factor, Performance};
    use crate::account::Trade;

    fn trade(profit: Decimal) -> Trade {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Trade {
            entry_index: 0,
            exit_index: 1,
            entry_time: t,
            exit_time: t,
            entry_price: dec!(10),
            exit_price: dec!(10),
            shares: dec!(10),
            notional: dec!(100),
            profit,
            return_rate: 0.0,
            signal_kind: SignalKind::Buy2,
            forced: false,
        }
    }

    #[test]
    fn empty_trade_list() {
        let p = Performance::compute(&[], dec!(1000), dec!(1000));
        assert_eq!(p.total_return, 0.0);
        assert_eq!(p.win_rate, 0.0);
        assert!(p.profit_factor.is_infinite());
        assert_eq!(p.total_trades, 0);
        assert_eq!(p.largest_win, Decimal::ZERO);
    }

    #[test]
    fn mixed_trades() {
        let trades = vec![trade(dec!(30)), trade(dec!(-10)), trade(dec!(10)), trade(dec!(0))];
        let p = Performance::compute(&trades, dec!(1000), dec!(1030));

        assert!((p.total_return - 3.0).abs() < 1e-12);
        assert!((p.win_rate - 50.0).abs() < 1e-12);
        assert_eq!(p.average_win, dec!(20));
        assert_eq!(p.average_loss, dec!(-5));
        assert!((p.profit_factor - 4.0).abs() < 1e-12);
        assert_eq!(p.profitable_trades, 2);
        assert_eq!(p.losing_trades, 2);
        assert_eq!(p.largest_win, dec!(30));
        assert_eq!(p.largest_loss, dec!(-10));
    }

    #[test]
    fn break_even_only_counts_as_loss_side() {
        assert!(profit_factor(dec!(5), Decimal::ZERO).is_infinite());
        let p = Performance::compute(&[trade(Decimal::ZERO)], dec!(100), dec!(100));
        assert_eq!(p.losing_trades, 1);
        assert!(p.profit_factor.is_infinite());
    }
}
