// -*- mode: rust; -*-
//
// This file is part of secp256k1-dalek.
// Copyright (c) 2016-2021 isis agora lovecruft
// Copyright (c) 2016-2019 Henry de Valence
// See LICENSE for licensing information.
//
// Authors:
// - isis agora lovecruft <isis@patternsinthevoid.net>
// - Henry de Valence <hdevalence@hdevalence.ca>

//! Arithmetic on scalars (integers mod the group order).
//!
//! The secp256k1 basepoint G has prime order
//!
//! n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141,
//!
//! so a multiple `kG` of the basepoint depends only on `k (mod n)`.  The
//! `Scalar` struct represents an element of Z/nZ, held as four `u64` limbs
//! in little-endian order, always the canonical representative in `[0, n)`.
//!
//! Besides the ring operations, this module implements the two scalar
//! recodings used by scalar multiplication: the width-w non-adjacent form
//! used by the variable-time double-scalar multiplication, and the GLV
//! decomposition `k = k1 + k2*lambda (mod n)` with `|k1|, |k2| < 2^128`
//! used by the windowed multiplication.

use core::fmt::Debug;
use core::ops::Neg;
use core::ops::{Add, AddAssign};
use core::ops::{Mul, MulAssign};
use core::ops::{Sub, SubAssign};

use subtle::Choice;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::arithmetic::{adc, add4, gte4, invert_mod, is_zero4, load_be, mac, mul_wide, shr1, store_be, sub4};
use crate::errors::InternalError;
use crate::errors::SignatureError;

/// The group order, `n`.
pub(crate) const N: [u64; 4] = [
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// `(n - 1) / 2`, the threshold for the low-S rule.
const N_HALF: [u64; 4] = [
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
];

/// `2^256 mod n`, the folding constant for wide reduction (129 bits).
const REDUCTION_R: [u64; 3] = [
    0x402D_A173_2FC9_BEBF,
    0x4551_2319_50B7_5FC4,
    0x0000_0000_0000_0001,
];

// GLV lattice basis for the secp256k1 endomorphism.  With
// a1 = 0x3086D221A7D46BCDE86C90E49284EB15 and
// b1 = -0xE4437ED6010E88286F547FA90ABFE4C3, the vectors (a1, b1) and
// (a2, b2) = (a1 - b1, a1) satisfy a1^2 + b1^2 + a1*|b1| = n.
const GLV_A1: [u64; 2] = [0xE86C_90E4_9284_EB15, 0x3086_D221_A7D4_6BCD];
const GLV_B1_ABS: [u64; 2] = [0x6F54_7FA9_0ABF_E4C3, 0xE443_7ED6_010E_8828];

const GLV_A1_SCALAR: Scalar =
    Scalar([0xE86C_90E4_9284_EB15, 0x3086_D221_A7D4_6BCD, 0, 0]);
const GLV_B1_ABS_SCALAR: Scalar =
    Scalar([0x6F54_7FA9_0ABF_E4C3, 0xE443_7ED6_010E_8828, 0, 0]);
const GLV_A2_SCALAR: Scalar =
    Scalar([0x57C1_108D_9D44_CFD8, 0x14CA_50F7_A8E2_F3F6, 1, 0]);

// Granlund-Montgomery multiplier for exact rounded division by n: for any
// k < n and e < 2^129, round(e*k/n) = (M * (e*k + (n-1)/2)) >> 637.
const DIVR_M: [u64; 6] = [
    0xBCD2_FEBC_8B79_A0F9,
    0x13AC_E39A_B038_D378,
    0x8805_B42E_65F9_37D8,
    0x28AA_2463_2A16_EBF8,
    0x0000_0000_0000_0000,
    0x2000_0000_0000_0000,
];

/// The `Scalar` struct holds an integer mod the order of the secp256k1
/// basepoint.
#[derive(Copy, Clone)]
pub struct Scalar(pub(crate) [u64; 4]);

impl Debug for Scalar {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Scalar: {:?}", &self.0[..])
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Scalar) -> Choice {
        self.0[0].ct_eq(&other.0[0])
            & self.0[1].ct_eq(&other.0[1])
            & self.0[2].ct_eq(&other.0[2])
            & self.0[3].ct_eq(&other.0[3])
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Scalar) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Scalar {}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl From<u64> for Scalar {
    fn from(x: u64) -> Scalar {
        Scalar([x, 0, 0, 0])
    }
}

impl<'a, 'b> Add<&'b Scalar> for &'a Scalar {
    type Output = Scalar;
    fn add(self, rhs: &'b Scalar) -> Scalar {
        let (sum, carry) = add4(&self.0, &rhs.0);
        if carry != 0 || gte4(&sum, &N) {
            Scalar(sub4(&sum, &N).0)
        } else {
            Scalar(sum)
        }
    }
}

define_add_variants!(LHS = Scalar, RHS = Scalar, Output = Scalar);

impl<'b> AddAssign<&'b Scalar> for Scalar {
    fn add_assign(&mut self, rhs: &'b Scalar) {
        *self = (self as &Scalar) + rhs;
    }
}

define_add_assign_variants!(LHS = Scalar, RHS = Scalar);

impl<'a, 'b> Sub<&'b Scalar> for &'a Scalar {
    type Output = Scalar;
    fn sub(self, rhs: &'b Scalar) -> Scalar {
        let (diff, borrow) = sub4(&self.0, &rhs.0);
        if borrow != 0 {
            Scalar(add4(&diff, &N).0)
        } else {
            Scalar(diff)
        }
    }
}

define_sub_variants!(LHS = Scalar, RHS = Scalar, Output = Scalar);

impl<'b> SubAssign<&'b Scalar> for Scalar {
    fn sub_assign(&mut self, rhs: &'b Scalar) {
        *self = (self as &Scalar) - rhs;
    }
}

define_sub_assign_variants!(LHS = Scalar, RHS = Scalar);

impl<'a, 'b> Mul<&'b Scalar> for &'a Scalar {
    type Output = Scalar;
    fn mul(self, rhs: &'b Scalar) -> Scalar {
        Scalar::reduce_wide(mul_wide(&self.0, &rhs.0))
    }
}

define_mul_variants!(LHS = Scalar, RHS = Scalar, Output = Scalar);

impl<'b> MulAssign<&'b Scalar> for Scalar {
    fn mul_assign(&mut self, rhs: &'b Scalar) {
        *self = (self as &Scalar) * rhs;
    }
}

define_mul_assign_variants!(LHS = Scalar, RHS = Scalar);

impl<'a> Neg for &'a Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        &Scalar::ZERO - self
    }
}

impl Neg for Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        -&self
    }
}

impl Scalar {
    /// The additive identity.
    pub const ZERO: Scalar = Scalar([0, 0, 0, 0]);

    /// The multiplicative identity.
    pub const ONE: Scalar = Scalar([1, 0, 0, 0]);

    /// Attempt to construct a scalar from 32 big-endian bytes.
    ///
    /// Returns `None` if the value is not the canonical representative,
    /// i.e. not below `n`.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
        let limbs = load_be(bytes);
        if gte4(&limbs, &N) {
            return None;
        }
        Some(Scalar(limbs))
    }

    /// Construct a scalar from 32 big-endian bytes, reducing mod `n`.
    pub fn from_bytes_mod_order(bytes: &[u8; 32]) -> Scalar {
        let limbs = load_be(bytes);
        Scalar::reduce_wide([
            limbs[0], limbs[1], limbs[2], limbs[3], 0, 0, 0, 0,
        ])
    }

    /// Construct a scalar from 64 big-endian bytes, reducing mod `n`.
    pub fn from_bytes_mod_order_wide(bytes: &[u8; 64]) -> Scalar {
        let mut hi_bytes = [0u8; 32];
        let mut lo_bytes = [0u8; 32];
        hi_bytes.copy_from_slice(&bytes[..32]);
        lo_bytes.copy_from_slice(&bytes[32..]);
        let hi = load_be(&hi_bytes);
        let lo = load_be(&lo_bytes);
        Scalar::reduce_wide([
            lo[0], lo[1], lo[2], lo[3], hi[0], hi[1], hi[2], hi[3],
        ])
    }

    pub(crate) fn from_u128(x: u128) -> Scalar {
        Scalar([x as u64, (x >> 64) as u64, 0, 0])
    }

    /// Serialize this scalar to 32 big-endian bytes.  The encoding is
    /// canonical.
    pub fn to_bytes(&self) -> [u8; 32] {
        store_be(&self.0)
    }

    pub(crate) fn is_zero(&self) -> Choice {
        self.ct_eq(&Scalar::ZERO)
    }

    /// Is this scalar above `n/2`?  Signatures whose `s` half answers yes
    /// are malleable and rejected by strict verification.
    pub(crate) fn is_high(&self) -> bool {
        !gte4(&N_HALF, &self.0)
    }

    /// The `i`-th bit of the scalar, little-endian.
    pub(crate) fn bit(&self, i: usize) -> u64 {
        (self.0[i / 64] >> (i % 64)) & 1
    }

    /// Reduce an eight-limb value mod `n` by repeatedly folding the high
    /// half as `hi * (2^256 - n)`.  Each fold shrinks the value by about
    /// 127 bits, so the loop runs at most three times.
    pub(crate) fn reduce_wide(limbs: [u64; 8]) -> Scalar {
        let mut buf = limbs;
        while (buf[4] | buf[5] | buf[6] | buf[7]) != 0 {
            let lo = [buf[0], buf[1], buf[2], buf[3]];
            let hi = [buf[4], buf[5], buf[6], buf[7]];
            // prod = hi * R, at most 7 limbs
            let mut prod = [0u64; 8];
            for i in 0..4 {
                let mut carry = 0u64;
                for j in 0..3 {
                    let (limb, c) = mac(prod[i + j], hi[i], REDUCTION_R[j], carry);
                    prod[i + j] = limb;
                    carry = c;
                }
                // prod[i + 3] has not been written yet
                prod[i + 3] = carry;
            }
            // buf = prod + lo; cannot overflow eight limbs
            let mut carry = 0u64;
            for i in 0..8 {
                let addend = if i < 4 { lo[i] } else { 0 };
                let (limb, c) = adc(prod[i], addend, carry);
                buf[i] = limb;
                carry = c;
            }
            debug_assert_eq!(carry, 0);
        }
        let mut out = [buf[0], buf[1], buf[2], buf[3]];
        while gte4(&out, &N) {
            out = sub4(&out, &N).0;
        }
        Scalar(out)
    }

    /// Compute the multiplicative inverse of this scalar mod `n`.
    ///
    /// Fails with `NotInvertible` for zero.
    pub fn invert(&self) -> Result<Scalar, SignatureError> {
        invert_mod(&self.0, &N)
            .map(Scalar)
            .ok_or(SignatureError(InternalError::NotInvertible))
    }

    /// Compute a width-`w` "Non-Adjacent Form" of this scalar.
    ///
    /// A width-w NAF of `k` is a digit expansion `k = sum(naf[i] * 2^i)`
    /// where each nonzero digit is odd and bounded by `2^(w-1)` in
    /// absolute value, and at most one of any `w` consecutive digits is
    /// nonzero.  (Hankerson, Menezes, Vanstone; def 3.32.)
    pub(crate) fn non_adjacent_form(&self, w: usize) -> [i8; 257] {
        debug_assert!((2..=8).contains(&w));

        let mut naf = [0i8; 257];
        let mut k = self.0;
        let mut i = 0;
        while !is_zero4(&k) {
            if k[0] & 1 == 1 {
                let width = 1i64 << w;
                let mut digit = (k[0] & (width as u64 - 1)) as i64;
                if digit >= width / 2 {
                    digit -= width;
                }
                naf[i] = digit as i8;
                if digit >= 0 {
                    k = Scalar::sub_small(&k, digit as u64);
                } else {
                    k = Scalar::add_small(&k, (-digit) as u64);
                }
            }
            k = shr1(&k);
            i += 1;
        }
        naf
    }

    fn sub_small(a: &[u64; 4], x: u64) -> [u64; 4] {
        let (out, borrow) = sub4(a, &[x, 0, 0, 0]);
        debug_assert_eq!(borrow, 0);
        out
    }

    fn add_small(a: &[u64; 4], x: u64) -> [u64; 4] {
        // a < 2^256 - 2^128 here, so no carry out is possible
        let (out, carry) = add4(a, &[x, 0, 0, 0]);
        debug_assert_eq!(carry, 0);
        out
    }

    /// Compute `round(e * k / n)` exactly, for `k < n` and `e < 2^129`.
    ///
    /// Uses the Granlund-Montgomery method ("Division by Invariant
    /// Integers using Multiplication"): with the precomputed 382-bit
    /// multiplier `M` for divisor `n` and precision 384,
    /// `round(e*k/n) = floor((e*k + (n-1)/2) / n) = (M*(e*k + (n-1)/2)) >> 637`.
    fn mul_divr_rounded(k: &[u64; 4], e: &[u64; 2]) -> u128 {
        // z = k*e + (n-1)/2, fits in 7 limbs
        let mut z = [0u64; 7];
        for i in 0..4 {
            let mut carry = 0u64;
            for j in 0..2 {
                let (limb, c) = mac(z[i + j], k[i], e[j], carry);
                z[i + j] = limb;
                carry = c;
            }
            // z[i + 2] has not been written yet
            let (limb, c) = adc(z[i + 2], carry, 0);
            z[i + 2] = limb;
            debug_assert_eq!(c, 0);
        }
        let mut carry = 0u64;
        for (i, limb) in z.iter_mut().enumerate() {
            let addend = if i < 4 { N_HALF[i] } else { 0 };
            let (sum, c) = adc(*limb, addend, carry);
            *limb = sum;
            carry = c;
        }
        debug_assert_eq!(carry, 0);

        // t = M * z
        let mut t = [0u64; 13];
        for i in 0..6 {
            let mut carry = 0u64;
            for (j, zj) in z.iter().enumerate() {
                let (limb, c) = mac(t[i + j], DIVR_M[i], *zj, carry);
                t[i + j] = limb;
                carry = c;
            }
            let (limb, c) = adc(t[i + 7], carry, 0);
            t[i + 7] = limb;
            debug_assert_eq!(c, 0);
        }

        // q = t >> 637; the quotient is below 2^128
        let q0 = (t[9] >> 61) | (t[10] << 3);
        let q1 = (t[10] >> 61) | (t[11] << 3);
        debug_assert_eq!((t[11] >> 61) | (t[12] << 3), 0);
        (q0 as u128) | ((q1 as u128) << 64)
    }

    /// Split this scalar with the curve endomorphism: find `k1`, `k2`
    /// with `|k1|, |k2| < 2^128` and signs `k1neg`, `k2neg` such that
    /// `k = (-1)^k1neg * k1 + (-1)^k2neg * k2 * lambda (mod n)`.
    ///
    /// Returns `(k1neg, |k1|, k2neg, |k2|)`.
    pub(crate) fn split_glv(&self) -> (bool, u128, bool, u128) {
        let c1 = Scalar::from_u128(Scalar::mul_divr_rounded(&self.0, &GLV_A1));
        let c2 = Scalar::from_u128(Scalar::mul_divr_rounded(&self.0, &GLV_B1_ABS));

        // k1 = k - c1*a1 - c2*a2 ; k2 = -c1*b1 - c2*b2 = c1*|b1| - c2*a1
        let k1 = self - &(&(&c1 * &GLV_A1_SCALAR) + &(&c2 * &GLV_A2_SCALAR));
        let k2 = &(&c1 * &GLV_B1_ABS_SCALAR) - &(&c2 * &GLV_A1_SCALAR);

        let (k1neg, k1) = Scalar::to_signed_half(k1);
        let (k2neg, k2) = Scalar::to_signed_half(k2);
        (k1neg, k1, k2neg, k2)
    }

    /// Interpret a reduced scalar as a signed value of magnitude below
    /// `2^128`: representatives above `2^128` stand for their negation.
    fn to_signed_half(k: Scalar) -> (bool, u128) {
        if (k.0[2] | k.0[3]) != 0 {
            let neg = -&k;
            debug_assert_eq!(neg.0[2] | neg.0[3], 0);
            (true, (neg.0[0] as u128) | ((neg.0[1] as u128) << 64))
        } else {
            (false, (k.0[0] as u128) | ((k.0[1] as u128) << 64))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants;
    use rand::RngCore;

    fn random_scalar() -> Scalar {
        let mut rng = rand::rngs::OsRng;
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Some(s) = Scalar::from_bytes(&bytes) {
                if !bool::from(s.is_zero()) {
                    return s;
                }
            }
        }
    }

    fn n_minus_one() -> Scalar {
        -&Scalar::ONE
    }

    #[test]
    fn reduction_wraps_at_n() {
        // (n - 1) + 2 == 1
        let two = &Scalar::ONE + &Scalar::ONE;
        assert_eq!(&n_minus_one() + &two, Scalar::ONE);
    }

    #[test]
    fn wide_reduction_matches_shift_and_add() {
        // x + 2^256 * x mod n, with x = 1: 2^256 mod n = R, so the result
        // is R + 1.
        let mut wide = [0u8; 64];
        wide[31] = 1;
        wide[63] = 1;
        let expected = Scalar([
            REDUCTION_R[0] + 1,
            REDUCTION_R[1],
            REDUCTION_R[2],
            0,
        ]);
        assert_eq!(Scalar::from_bytes_mod_order_wide(&wide), expected);
    }

    #[test]
    fn invert_round_trip() {
        for _ in 0..1000 {
            let a = random_scalar();
            let inv = a.invert().unwrap();
            assert_eq!(&inv * &a, Scalar::ONE);
        }
    }

    #[test]
    fn invert_zero_fails() {
        assert!(Scalar::ZERO.invert().is_err());
    }

    #[test]
    fn from_bytes_rejects_noncanonical() {
        let bytes = [0xFFu8; 32];
        assert!(Scalar::from_bytes(&bytes).is_none());
        // the reduced value re-encodes canonically
        let reduced = Scalar::from_bytes_mod_order(&bytes);
        assert_eq!(Scalar::from_bytes(&reduced.to_bytes()), Some(reduced));
    }

    #[test]
    fn is_high_threshold() {
        assert!(!Scalar::ONE.is_high());
        assert!(n_minus_one().is_high());
        // (n-1)/2 is low, (n-1)/2 + 1 is high
        let half = Scalar(N_HALF);
        assert!(!half.is_high());
        assert!((&half + &Scalar::ONE).is_high());
    }

    #[test]
    fn naf_reconstructs_scalar() {
        for &w in &[5usize, 8] {
            for _ in 0..20 {
                let k = random_scalar();
                let naf = k.non_adjacent_form(w);
                let mut acc = Scalar::ZERO;
                let mut power = Scalar::ONE;
                let two = Scalar::from(2u64);
                for digit in naf.iter() {
                    if *digit > 0 {
                        acc += &power * &Scalar::from(*digit as u64);
                    } else if *digit < 0 {
                        acc -= &power * &Scalar::from(digit.unsigned_abs() as u64);
                    }
                    power *= &two;
                }
                assert_eq!(acc, k);
                // no two nonzero digits within w of one another
                let mut last = None;
                for (i, digit) in naf.iter().enumerate() {
                    if *digit != 0 {
                        if let Some(prev) = last {
                            assert!(i - prev >= w);
                        }
                        last = Some(i);
                        assert_eq!(digit.rem_euclid(2), 1);
                    }
                }
            }
        }
    }

    #[test]
    fn glv_split_identity() {
        for _ in 0..100 {
            let k = random_scalar();
            let (k1neg, k1, k2neg, k2) = k.split_glv();
            let mut k1s = Scalar::from_u128(k1);
            let mut k2s = Scalar::from_u128(k2);
            if k1neg {
                k1s = -&k1s;
            }
            if k2neg {
                k2s = -&k2s;
            }
            assert_eq!(&k1s + &(&k2s * &constants::LAMBDA), k);
        }
    }

    #[test]
    fn glv_split_edge_scalars() {
        for k in [Scalar::ONE, n_minus_one(), constants::LAMBDA, -&constants::LAMBDA] {
            let (k1neg, k1, k2neg, k2) = k.split_glv();
            let mut k1s = Scalar::from_u128(k1);
            let mut k2s = Scalar::from_u128(k2);
            if k1neg {
                k1s = -&k1s;
            }
            if k2neg {
                k2s = -&k2s;
            }
            assert_eq!(&k1s + &(&k2s * &constants::LAMBDA), k);
        }
    }
}
