// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{Signed, Zero};

/// A quantity of tokens (VET or VTHO).
/// A token amount is an integer, but has a human interpretation as a value
/// with 18 decimal places.
/// This is a new-type in order to prevent accidental conversion from other
/// BigInts. From/Into BigInt is missing by design.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct TokenAmount {
    wei: BigInt,
}

impl TokenAmount {
    /// The logical number of decimal places of a token unit.
    pub const DECIMALS: usize = 18;

    /// The logical precision of a token unit.
    pub const PRECISION: u64 = 10u64.pow(Self::DECIMALS as u32);

    /// Creates a token amount from a quantity of indivisible units (10^-18
    /// whole units).
    pub fn from_wei(wei: impl Into<BigInt>) -> Self {
        Self { wei: wei.into() }
    }

    /// Creates a token amount from a quantity of whole units (10^18
    /// indivisible units).
    pub fn from_whole(tokens: i64) -> Self {
        Self::from_wei((tokens as i128) * (Self::PRECISION as i128))
    }

    /// Returns the quantity of indivisible units.
    pub fn wei(&self) -> &BigInt {
        &self.wei
    }

    pub fn is_zero(&self) -> bool {
        self.wei.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.wei.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.wei.is_negative()
    }

    /// Whether the amount is an exact multiple of one whole token.
    pub fn is_whole(&self) -> bool {
        self.wei.mod_floor(&BigInt::from(Self::PRECISION)).is_zero()
    }

    /// Minimal big-endian magnitude bytes; empty for zero.
    /// Negative amounts have no byte form, storage never holds them.
    pub fn to_bytes(&self) -> Vec<u8> {
        debug_assert!(!self.wei.is_negative());
        if self.wei.is_zero() {
            return Vec::new();
        }
        self.wei.to_bytes_be().1
    }

    pub fn from_bytes(raw: &[u8]) -> Self {
        Self {
            wei: BigInt::from_bytes_be(Sign::Plus, raw),
        }
    }

    /// Converts into an ABI `uint256`, clamping negatives to zero.
    pub fn to_uint256(&self) -> ethereum_types::U256 {
        if self.wei.is_negative() {
            return ethereum_types::U256::zero();
        }
        let bytes = self.wei.to_bytes_be().1;
        ethereum_types::U256::from_big_endian(&bytes)
    }

    pub fn from_uint256(v: ethereum_types::U256) -> Self {
        let mut buf = [0u8; 32];
        v.to_big_endian(&mut buf);
        Self::from_bytes(&buf)
    }
}

impl Zero for TokenAmount {
    #[inline]
    fn zero() -> Self {
        Self {
            wei: BigInt::zero(),
        }
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.wei.is_zero()
    }
}

impl PartialOrd for TokenAmount {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenAmount {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.wei.cmp(&other.wei)
    }
}

impl fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAmount({})", self)
    }
}

/// Displays a token amount as a decimal in human units, always with a
/// decimal point so indivisible units can never be confused for whole ones.
impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (q, r) = self.wei.div_rem(&BigInt::from(Self::PRECISION));
        let before = q.abs().to_str_radix(10);
        let after = if r.is_zero() {
            "0".to_string()
        } else {
            let frac = r.abs().to_str_radix(10);
            let padded = "0".repeat(Self::DECIMALS - frac.len()) + frac.as_str();
            padded.trim_end_matches('0').to_string()
        };
        if self.wei.is_negative() {
            write!(f, "-{}.{}", before, after)
        } else {
            write!(f, "{}.{}", before, after)
        }
    }
}

impl Add for TokenAmount {
    type Output = TokenAmount;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            wei: self.wei + rhs.wei,
        }
    }
}

impl<'a> Add<&'a TokenAmount> for TokenAmount {
    type Output = TokenAmount;
    fn add(self, rhs: &'a TokenAmount) -> Self::Output {
        Self {
            wei: self.wei + &rhs.wei,
        }
    }
}

impl AddAssign for TokenAmount {
    fn add_assign(&mut self, rhs: Self) {
        self.wei += rhs.wei;
    }
}

impl<'a> AddAssign<&'a TokenAmount> for TokenAmount {
    fn add_assign(&mut self, rhs: &'a TokenAmount) {
        self.wei += &rhs.wei;
    }
}

impl Sub for TokenAmount {
    type Output = TokenAmount;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            wei: self.wei - rhs.wei,
        }
    }
}

impl<'a> Sub<&'a TokenAmount> for TokenAmount {
    type Output = TokenAmount;
    fn sub(self, rhs: &'a TokenAmount) -> Self::Output {
        Self {
            wei: self.wei - &rhs.wei,
        }
    }
}

impl SubAssign for TokenAmount {
    fn sub_assign(&mut self, rhs: Self) {
        self.wei -= rhs.wei;
    }
}

impl Mul<u64> for TokenAmount {
    type Output = TokenAmount;
    fn mul(self, rhs: u64) -> Self::Output {
        Self {
            wei: self.wei * rhs,
        }
    }
}

impl Neg for TokenAmount {
    type Output = TokenAmount;
    fn neg(self) -> Self::Output {
        Self { wei: -self.wei }
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl From<u64> for TokenAmount {
    fn from(v: u64) -> Self {
        Self::from_wei(v)
    }
}

// Wire/storage form: the minimal big-endian magnitude as a single item.
impl rlp::Encodable for TokenAmount {
    fn rlp_append(&self, s: &mut rlp::RlpStream) {
        s.append(&self.to_bytes());
    }
}

impl rlp::Decodable for TokenAmount {
    fn decode(rlp: &rlp::Rlp) -> Result<Self, rlp::DecoderError> {
        let bytes: Vec<u8> = rlp.as_val()?;
        Ok(TokenAmount::from_bytes(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_always_carries_a_point() {
        assert_eq!(TokenAmount::from_whole(3).to_string(), "3.0");
        assert_eq!(TokenAmount::from_wei(1).to_string(), "0.000000000000000001");
        assert_eq!(
            (TokenAmount::zero() - TokenAmount::from_whole(1)).to_string(),
            "-1.0"
        );
    }

    #[test]
    fn byte_round_trip_and_zero_is_empty() {
        assert!(TokenAmount::zero().to_bytes().is_empty());
        let v = TokenAmount::from_wei(0x1234_5678u64);
        assert_eq!(TokenAmount::from_bytes(&v.to_bytes()), v);
    }

    #[test]
    fn uint256_clamps_negative() {
        let v = TokenAmount::zero() - TokenAmount::from_whole(5);
        assert_eq!(v.to_uint256(), ethereum_types::U256::zero());
    }

    #[test]
    fn whole_multiples() {
        assert!(TokenAmount::from_whole(7).is_whole());
        assert!(!TokenAmount::from_wei(3).is_whole());
        assert!(TokenAmount::zero().is_whole());
    }
}
