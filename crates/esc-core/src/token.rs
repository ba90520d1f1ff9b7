//! # Token Denominations and Micro-Unit Amounts
//!
//! The escrow contract custodies one of a small closed set of tokens per
//! project. Amounts cross the gateway as integer micro-units; display
//! strings are parsed with the token's decimal scale.
//!
//! ## Security Invariant
//!
//! Financial amounts are never represented as floating-point numbers.
//! Display-unit strings are parsed digit-by-digit into integer micro-units;
//! any precision the token cannot express is rejected, not rounded.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The token a project's escrow is denominated in.
///
/// A closed set: the ledger contract exposes one entry point per token,
/// so adding a variant here forces the gateway to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// The chain's native coin (6 decimal places).
    Native,
    /// The bridged fungible asset (8 decimal places).
    Asset,
}

impl TokenKind {
    /// Number of decimal places in the token's display unit.
    pub fn decimals(&self) -> u32 {
        match self {
            Self::Native => 6,
            Self::Asset => 8,
        }
    }

    /// Micro-units per display unit.
    pub fn scale(&self) -> u64 {
        10u64.pow(self.decimals())
    }

    /// The canonical string name of this token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "NATIVE",
            Self::Asset => "ASSET",
        }
    }

    /// Parse a canonical token name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NATIVE" => Some(Self::Native),
            "ASSET" => Some(Self::Asset),
            _ => None,
        }
    }

    /// Parse a display-unit decimal string (e.g. `"25"`, `"0.125"`) into
    /// an [`Amount`] of integer micro-units.
    ///
    /// # Errors
    ///
    /// Rejects empty strings, non-numeric characters, negative values,
    /// and fractional parts finer than the token's decimal scale.
    pub fn parse_amount(&self, s: &str) -> Result<Amount, CoreError> {
        let invalid = || CoreError::InvalidAmount(s.to_string());
        if s.is_empty() || s.starts_with('-') {
            return Err(invalid());
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac.len() > self.decimals() as usize {
            return Err(invalid());
        }
        let whole_units: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut frac_units: u64 = 0;
        if !frac.is_empty() {
            let padded = format!("{frac:0<width$}", width = self.decimals() as usize);
            frac_units = padded.parse().map_err(|_| invalid())?;
        }
        whole_units
            .checked_mul(self.scale())
            .and_then(|w| w.checked_add(frac_units))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integer amount of token micro-units.
///
/// The scale (micro-units per display unit) is a property of the project's
/// [`TokenKind`], carried separately — amounts from projects with different
/// tokens are never arithmetic-compatible in practice, but the type system
/// does not enforce that; the 4-milestone sum check is always within one
/// project and therefore one token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Amount(pub u64);

impl Amount {
    /// Zero micro-units.
    pub const ZERO: Amount = Amount(0);

    /// Construct from raw micro-units.
    pub fn micro(units: u64) -> Self {
        Self(units)
    }

    /// The raw micro-unit count.
    pub fn as_micro(&self) -> u64 {
        self.0
    }

    /// Checked sum of a slice of amounts.
    pub fn checked_sum(amounts: &[Amount]) -> Option<Amount> {
        amounts
            .iter()
            .try_fold(0u64, |acc, a| acc.checked_add(a.0))
            .map(Amount)
    }

    /// Render in display units for the given token (e.g. `25.000000`).
    pub fn display(&self, token: TokenKind) -> String {
        let scale = token.scale();
        format!(
            "{}.{:0width$}",
            self.0 / scale,
            self.0 % scale,
            width = token.decimals() as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_parse_whole_units() {
        let a = TokenKind::Native.parse_amount("25").unwrap();
        assert_eq!(a.as_micro(), 25_000_000);
    }

    #[test]
    fn test_asset_parse_fractional() {
        let a = TokenKind::Asset.parse_amount("0.25").unwrap();
        assert_eq!(a.as_micro(), 25_000_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TokenKind::Native.parse_amount("").is_err());
        assert!(TokenKind::Native.parse_amount("-1").is_err());
        assert!(TokenKind::Native.parse_amount("1.2.3").is_err());
        assert!(TokenKind::Native.parse_amount("abc").is_err());
        assert!(TokenKind::Native.parse_amount(".").is_err());
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        // Native has 6 decimals; 7 fractional digits cannot be represented.
        assert!(TokenKind::Native.parse_amount("1.0000001").is_err());
        assert!(TokenKind::Asset.parse_amount("1.0000001").is_ok());
    }

    #[test]
    fn test_parse_overflow_rejected() {
        assert!(TokenKind::Native.parse_amount("99999999999999999999").is_err());
    }

    #[test]
    fn test_checked_sum() {
        let parts = [Amount::micro(1), Amount::micro(2), Amount::micro(3)];
        assert_eq!(Amount::checked_sum(&parts), Some(Amount::micro(6)));
        let overflow = [Amount::micro(u64::MAX), Amount::micro(1)];
        assert_eq!(Amount::checked_sum(&overflow), None);
    }

    #[test]
    fn test_display_roundtrip() {
        let a = TokenKind::Native.parse_amount("12.5").unwrap();
        assert_eq!(a.display(TokenKind::Native), "12.500000");
    }

    #[test]
    fn test_token_names() {
        assert_eq!(TokenKind::Native.as_str(), "NATIVE");
        assert_eq!(TokenKind::parse("ASSET"), Some(TokenKind::Asset));
        assert_eq!(TokenKind::parse("DOGE"), None);
    }
}
