//! 单一多头仓位的模拟账户。
//!
//! 状态只有 `Flat` 与 `Long` 两种。开仓扣除名义金额，平仓收回市值，
//! 盈亏按 `市值 - 名义金额` 记账，因此现金只随已记录的交易盈亏变化。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use strategy::{Signal, SignalKind};

/// Decimal places kept for notional and share quantities.
pub const QUANTITY_DP: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub shares: Decimal,
    pub notional: Decimal,
    pub signal_kind: SignalKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub shares: Decimal,
    pub notional: Decimal,
    pub profit: Decimal,
    pub return_rate: f64,
    pub signal_kind: SignalKind,
    pub forced: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PositionState {
    #[default]
    Flat,
    Long(OpenPosition),
}

#[derive(Debug, Clone)]
pub struct Account {
    initial_cash: Decimal,
    cash: Decimal,
    state: PositionState,
    trades: Vec<Trade>,
}

impl Account {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            state: PositionState::Flat,
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.state, PositionState::Flat)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Cash plus the open position at its cost basis.
    pub fn book_value(&self) -> Decimal {
        match &self.state {
            PositionState::Flat => self.cash,
            PositionState::Long(pos) => self.cash + pos.notional,
        }
    }

    pub fn equity(&self, price: Decimal) -> Decimal {
        match &self.state {
            PositionState::Flat => self.cash,
            PositionState::Long(pos) => self.cash + pos.shares * price,
        }
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.cash - self.initial_cash
    }

    /// Opens a long sized by `signal.position_size`. Returns `false` and
    /// leaves the account untouched when already long or nothing would be
    /// bought.
    pub fn open_long(
        &mut self,
        index: usize,
        time: DateTime<Utc>,
        price: Decimal,
        signal: &Signal,
    ) -> bool {
        if !self.is_flat() || price <= Decimal::ZERO {
            return false;
        }
        let fraction = Decimal::from_f64(signal.position_size).unwrap_or(Decimal::ZERO);
        let notional = (self.cash * fraction).round_dp(QUANTITY_DP);
        let shares = (notional / price).round_dp(QUANTITY_DP);
        if notional <= Decimal::ZERO || shares <= Decimal::ZERO {
            return false;
        }

        self.cash -= notional;
        self.state = PositionState::Long(OpenPosition {
            entry_index: index,
            entry_time: time,
            entry_price: price,
            shares,
            notional,
            signal_kind: signal.kind,
        });
        true
    }

    pub fn close_long(
        &mut self,
        index: usize,
        time: DateTime<Utc>,
        price: Decimal,
        forced: bool,
    ) -> Option<&Trade> {
        let PositionState::Long(pos) = std::mem::take(&mut self.state) else {
            return None;
        };

        let exit_value = pos.shares * price;
        let profit = exit_value - pos.notional;
        self.cash += exit_value;
        self.trades.push(Trade {
            entry_index: pos.entry_index,
            exit_index: index,
            entry_time: pos.entry_time,
            exit_time: time,
            entry_price: pos.entry_price,
            exit_price: price,
            shares: pos.shares,
            notional: pos.notional,
            profit,
            return_rate: (profit / pos.notional).to_f64().unwrap_or(0.0),
            signal_kind: pos.signal_kind,
            forced,
        });
        self.trades.last()
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use strategy::{RiskLevel, Signal, SignalKind};

    use super::{Account, PositionState};

    fn buy(position_size: f64) -> Signal {
        Signal {
            kind: SignalKind::Buy3,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            price: dec!(10),
            confidence: 0.8,
            risk: RiskLevel::Low,
            position_size,
            stop_loss: None,
            take_profit: None,
            description: "test".to_string(),
        }
    }

    #[test]
    fn open_then_close_books_profit() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut account = Account::new(dec!(1000));

        assert!(account.open_long(3, t, dec!(10), &buy(0.2)));
        assert_eq!(account.cash(), dec!(800));
        assert_eq!(account.book_value(), dec!(1000));
        assert_eq!(account.equity(dec!(12)), dec!(1040));
        assert!(!account.open_long(4, t, dec!(11), &buy(0.2)));

        let trade = account.close_long(9, t, dec!(12), false).cloned().unwrap();
        assert_eq!(trade.shares, dec!(20));
        assert_eq!(trade.profit, dec!(40));
        assert!((trade.return_rate - 0.2).abs() < 1e-12);
        assert_eq!(account.cash(), dec!(1040));
        assert_eq!(account.state(), &PositionState::Flat);
        assert_eq!(account.realized_pnl(), dec!(40));
    }

    #[test]
    fn close_when_flat_is_noop() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut account = Account::new(dec!(1000));
        assert!(account.close_long(1, t, dec!(5), true).is_none());
        assert!(account.trades().is_empty());
    }

    #[test]
    fn zero_size_or_price_does_not_open() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut account = Account::new(dec!(1000));
        assert!(!account.open_long(1, t, dec!(10), &buy(0.0)));
        assert!(!account.open_long(1, t, dec!(0), &buy(0.2)));
        assert!(account.is_flat());
        assert_eq!(account.cash(), dec!(1000));
    }
}
