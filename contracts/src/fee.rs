//! # Fee-on-Transfer Token
//!
//! Burns a basis-point fee from every transfer. The recipient gets
//! `amount - fee`, the sender loses `amount`, and the call still returns
//! `true`. A vault that credits the requested amount instead of what
//! arrived ends up owing more than it holds.

use tracing::trace;

use cipher_vault::config::BASIS_POINTS;
use cipher_vault::{
    Address, Amount, CallContext, CallOutcome, Chain, Revert, TokenContract, TokenState,
};

/// Token that withholds `fee_bps` basis points of every transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeOnTransferToken {
    /// Display name.
    pub name: String,
    /// Ticker.
    pub symbol: String,
    /// Fee in basis points, capped at 100%.
    pub fee_bps: u32,
}

impl FeeOnTransferToken {
    /// Token charging `fee_bps` basis points per move. Values above 100%
    /// are clamped.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, fee_bps: u32) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            fee_bps: fee_bps.min(BASIS_POINTS),
        }
    }

    /// Fee withheld from a transfer of `amount`, rounded down.
    pub fn fee_for(&self, amount: Amount) -> Amount {
        // amount / 10_000 * bps + remainder part, to stay clear of overflow.
        let bps = Amount::from(self.fee_bps);
        let scale = Amount::from(BASIS_POINTS);
        amount / scale * bps + amount % scale * bps / scale
    }

    fn move_with_fee(
        &self,
        state: &mut TokenState,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), Revert> {
        let fee = self.fee_for(amount);
        state.move_balance(from, to, amount)?;
        state.burn(to, fee)?;
        trace!(amount = %amount, fee = %fee, "fee withheld");
        Ok(())
    }
}

impl TokenContract for FeeOnTransferToken {
    fn transfer(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        let state = chain.token_state_mut(ctx.this)?;
        self.move_with_fee(state, ctx.caller, to, amount)?;
        Ok(Some(true))
    }

    fn transfer_from(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        let state = chain.token_state_mut(ctx.this)?;
        state.spend_allowance(from, ctx.caller, amount)?;
        self.move_with_fee(state, from, to, amount)?;
        Ok(Some(true))
    }
}
