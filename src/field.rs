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

//! Field arithmetic for GF(2^256 - 2^32 - 977), using 64-bit limbs with
//! 128-bit products.

use core::fmt::Debug;
use core::ops::Neg;
use core::ops::{Add, AddAssign};
use core::ops::{Mul, MulAssign};
use core::ops::{Sub, SubAssign};

use subtle::Choice;
use subtle::ConditionallySelectable;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::arithmetic::{adc, add4, gte4, invert_mod, load_be, mac, mul_wide, store_be, sub4};
use crate::errors::InternalError;
use crate::errors::SignatureError;

/// The field prime, `p = 2^256 - 2^32 - 977`.
pub(crate) const P: [u64; 4] = [
    0xFFFF_FFFE_FFFF_FC2F,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// `2^256 mod p`; the whole reduction trick is that this fits in one limb.
const REDUCTION_C: u64 = 0x1_0000_03D1;

/// A `FieldElement` represents an element of the field GF(2^256 - 2^32 - 977).
///
/// The element is held as four `u64` limbs in little-endian order, and is
/// always the canonical representative in `[0, p)`: every operation reduces
/// its result into that range before returning.
#[derive(Copy, Clone)]
pub struct FieldElement(pub(crate) [u64; 4]);

impl Debug for FieldElement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FieldElement: {:?}", &self.0[..])
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &FieldElement) -> Choice {
        self.0[0].ct_eq(&other.0[0])
            & self.0[1].ct_eq(&other.0[1])
            & self.0[2].ct_eq(&other.0[2])
            & self.0[3].ct_eq(&other.0[3])
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &FieldElement) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FieldElement {}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &FieldElement, b: &FieldElement, choice: Choice) -> FieldElement {
        FieldElement([
            u64::conditional_select(&a.0[0], &b.0[0], choice),
            u64::conditional_select(&a.0[1], &b.0[1], choice),
            u64::conditional_select(&a.0[2], &b.0[2], choice),
            u64::conditional_select(&a.0[3], &b.0[3], choice),
        ])
    }
}

impl Zeroize for FieldElement {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl<'a, 'b> Add<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn add(self, rhs: &'b FieldElement) -> FieldElement {
        let (sum, carry) = add4(&self.0, &rhs.0);
        if carry != 0 || gte4(&sum, &P) {
            FieldElement(sub4(&sum, &P).0)
        } else {
            FieldElement(sum)
        }
    }
}

define_add_variants!(LHS = FieldElement, RHS = FieldElement, Output = FieldElement);

impl<'b> AddAssign<&'b FieldElement> for FieldElement {
    fn add_assign(&mut self, rhs: &'b FieldElement) {
        *self = (self as &FieldElement) + rhs;
    }
}

define_add_assign_variants!(LHS = FieldElement, RHS = FieldElement);

impl<'a, 'b> Sub<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn sub(self, rhs: &'b FieldElement) -> FieldElement {
        let (diff, borrow) = sub4(&self.0, &rhs.0);
        if borrow != 0 {
            FieldElement(add4(&diff, &P).0)
        } else {
            FieldElement(diff)
        }
    }
}

define_sub_variants!(LHS = FieldElement, RHS = FieldElement, Output = FieldElement);

impl<'b> SubAssign<&'b FieldElement> for FieldElement {
    fn sub_assign(&mut self, rhs: &'b FieldElement) {
        *self = (self as &FieldElement) - rhs;
    }
}

define_sub_assign_variants!(LHS = FieldElement, RHS = FieldElement);

impl<'a, 'b> Mul<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn mul(self, rhs: &'b FieldElement) -> FieldElement {
        FieldElement::reduce_wide(mul_wide(&self.0, &rhs.0))
    }
}

define_mul_variants!(LHS = FieldElement, RHS = FieldElement, Output = FieldElement);

impl<'b> MulAssign<&'b FieldElement> for FieldElement {
    fn mul_assign(&mut self, rhs: &'b FieldElement) {
        *self = (self as &FieldElement) * rhs;
    }
}

define_mul_assign_variants!(LHS = FieldElement, RHS = FieldElement);

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;
    fn neg(self) -> FieldElement {
        &FieldElement::ZERO - self
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;
    fn neg(self) -> FieldElement {
        -&self
    }
}

impl FieldElement {
    /// The additive identity.
    pub const ZERO: FieldElement = FieldElement([0, 0, 0, 0]);

    /// The multiplicative identity.
    pub const ONE: FieldElement = FieldElement([1, 0, 0, 0]);

    /// Reduce an eight-limb product into `[0, p)`.
    ///
    /// Since `2^256 = 0x1000003D1 (mod p)`, the high half folds in as
    /// `hi * 0x1000003D1`, which spills at most 33 bits past the low half.
    /// One more single-limb fold and a conditional subtraction finish the
    /// job.
    #[inline]
    fn reduce_wide(limbs: [u64; 8]) -> FieldElement {
        // r = lo + hi * C, at most 5 limbs
        let mut r = [0u64; 5];
        let mut carry = 0u64;
        for i in 0..4 {
            let (limb, c) = mac(limbs[i], limbs[i + 4], REDUCTION_C, carry);
            r[i] = limb;
            carry = c;
        }
        r[4] = carry;

        // second fold: r[4] * C is at most 2 limbs
        let t = (r[4] as u128) * (REDUCTION_C as u128);
        let mut out = [0u64; 4];
        let (limb, carry) = adc(r[0], t as u64, 0);
        out[0] = limb;
        let (limb, carry) = adc(r[1], (t >> 64) as u64, carry);
        out[1] = limb;
        let (limb, carry) = adc(r[2], 0, carry);
        out[2] = limb;
        let (limb, carry) = adc(r[3], 0, carry);
        out[3] = limb;
        if carry != 0 {
            // the wrapped value is below 2^67, so adding C cannot carry again
            let (limb, c) = adc(out[0], REDUCTION_C, 0);
            out[0] = limb;
            let (limb, c) = adc(out[1], 0, c);
            out[1] = limb;
            let (limb, c) = adc(out[2], 0, c);
            out[2] = limb;
            let (limb, _) = adc(out[3], 0, c);
            out[3] = limb;
        }
        if gte4(&out, &P) {
            out = sub4(&out, &P).0;
        }
        FieldElement(out)
    }

    /// Attempt to construct a field element from 32 big-endian bytes.
    ///
    /// Returns `None` if the value is not the canonical representative,
    /// i.e. not below `p`.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<FieldElement> {
        let limbs = load_be(bytes);
        if gte4(&limbs, &P) {
            return None;
        }
        Some(FieldElement(limbs))
    }

    /// Serialize this field element to 32 big-endian bytes.  The encoding
    /// is canonical.
    pub fn to_bytes(&self) -> [u8; 32] {
        store_be(&self.0)
    }

    pub(crate) fn is_zero(&self) -> Choice {
        self.ct_eq(&FieldElement::ZERO)
    }

    pub(crate) fn is_odd(&self) -> Choice {
        Choice::from((self.0[0] & 1) as u8)
    }

    /// Returns the square of this field element.
    pub fn square(&self) -> FieldElement {
        self * self
    }

    /// Square `n` times.
    #[inline]
    fn sqn(&self, n: usize) -> FieldElement {
        let mut acc = *self;
        for _ in 0..n {
            acc = acc.square();
        }
        acc
    }

    /// Raise this field element to an arbitrary 256-bit power.
    ///
    /// Runs in time variable in the exponent; the exponents used internally
    /// are public values.
    pub fn pow(&self, exp: &[u64; 4]) -> FieldElement {
        let mut acc = FieldElement::ONE;
        let mut started = false;
        for i in (0..256).rev() {
            if started {
                acc = acc.square();
            }
            if (exp[i / 64] >> (i % 64)) & 1 == 1 {
                if started {
                    acc = &acc * self;
                } else {
                    acc = *self;
                    started = true;
                }
            }
        }
        acc
    }

    /// Compute the multiplicative inverse of this field element.
    ///
    /// Fails with `NotInvertible` when `gcd(a, p) != 1`.  Since `p` is
    /// prime this is only reachable for zero, but it is checked regardless.
    pub fn invert(&self) -> Result<FieldElement, SignatureError> {
        invert_mod(&self.0, &P)
            .map(FieldElement)
            .ok_or(SignatureError(InternalError::NotInvertible))
    }

    /// Invert a batch of field elements with a single inversion pass,
    /// using Montgomery's running-product trick.
    ///
    /// Zero entries are left untouched.
    pub fn batch_invert(inputs: &mut [FieldElement]) {
        let n = inputs.len();
        let mut prefix = vec![FieldElement::ONE; n];
        let mut acc = FieldElement::ONE;
        for (i, x) in inputs.iter().enumerate() {
            prefix[i] = acc;
            if !bool::from(x.is_zero()) {
                acc = &acc * x;
            }
        }
        // acc is a product of nonzero elements, so inversion cannot fail
        let mut inv = match acc.invert() {
            Ok(inv) => inv,
            Err(_) => return,
        };
        for i in (0..n).rev() {
            if !bool::from(inputs[i].is_zero()) {
                let next = &inv * &inputs[i];
                inputs[i] = &inv * &prefix[i];
                inv = next;
            }
        }
    }

    /// Return *a* square root of this field element, if one exists.
    ///
    /// Computes `self^((p+1)/4)` with the fixed squaring/multiplication
    /// chain for that exponent, whose binary expansion has blocks of ones
    /// of lengths 2, 22, and 223.  No particular parity of the root is
    /// promised; callers wanting a specific sign must negate afterwards.
    pub fn sqrt(&self) -> Option<FieldElement> {
        let x = self;
        let x2 = &x.sqn(1) * x;
        let x3 = &x2.sqn(1) * x;
        let x6 = &x3.sqn(3) * &x3;
        let x9 = &x6.sqn(3) * &x3;
        let x11 = &x9.sqn(2) * &x2;
        let x22 = &x11.sqn(11) * &x11;
        let x44 = &x22.sqn(22) * &x22;
        let x88 = &x44.sqn(44) * &x44;
        let x176 = &x88.sqn(88) * &x88;
        let x220 = &x176.sqn(44) * &x44;
        let x223 = &x220.sqn(3) * &x3;
        let t = &x223.sqn(23) * &x22;
        let t = &t.sqn(6) * &x2;
        let root = t.sqn(2);
        if root.square() == *x {
            Some(root)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::RngCore;

    fn random_element() -> FieldElement {
        let mut rng = rand::rngs::OsRng;
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Some(fe) = FieldElement::from_bytes(&bytes) {
                return fe;
            }
        }
    }

    /// p - 1 as a field element.
    fn minus_one() -> FieldElement {
        -&FieldElement::ONE
    }

    #[test]
    fn add_sub_round_trip() {
        for _ in 0..100 {
            let a = random_element();
            let b = random_element();
            assert_eq!(&(&a + &b) - &b, a);
            assert_eq!(&(&a - &b) + &b, a);
        }
    }

    #[test]
    fn mul_by_one_and_zero() {
        let a = random_element();
        assert_eq!(&a * &FieldElement::ONE, a);
        assert_eq!(&a * &FieldElement::ZERO, FieldElement::ZERO);
    }

    #[test]
    fn minus_one_squares_to_one() {
        assert_eq!(minus_one().square(), FieldElement::ONE);
    }

    #[test]
    fn reduction_wraps_at_p() {
        // (p - 1) + 2 == 1
        assert_eq!(
            &minus_one() + &(&FieldElement::ONE + &FieldElement::ONE),
            FieldElement::ONE
        );
    }

    #[test]
    fn invert_round_trip() {
        for _ in 0..1000 {
            let a = random_element();
            if bool::from(a.is_zero()) {
                continue;
            }
            let inv = a.invert().unwrap();
            assert_eq!(&inv * &a, FieldElement::ONE);
        }
    }

    #[test]
    fn invert_zero_fails() {
        assert!(FieldElement::ZERO.invert().is_err());
    }

    #[test]
    fn batch_invert_matches_invert() {
        let mut elements: Vec<FieldElement> = (0..32).map(|_| random_element()).collect();
        elements[7] = FieldElement::ZERO;
        let singles: Vec<FieldElement> = elements
            .iter()
            .map(|x| x.invert().unwrap_or(FieldElement::ZERO))
            .collect();
        FieldElement::batch_invert(&mut elements);
        for (batch, single) in elements.iter().zip(singles.iter()) {
            assert_eq!(batch, single);
        }
    }

    #[test]
    fn sqrt_of_squares() {
        for _ in 0..100 {
            let a = random_element();
            let sq = a.square();
            let root = sq.sqrt().unwrap();
            assert!(root == a || root == -&a);
        }
    }

    #[test]
    fn sqrt_of_non_residue_fails() {
        // 7 is a quadratic non-residue mod p, which is also why no curve
        // point has x = 0.
        let seven = FieldElement([7, 0, 0, 0]);
        assert!(seven.sqrt().is_none());
    }

    #[test]
    fn pow_matches_repeated_squaring() {
        let a = random_element();
        // a^8 via pow and via squarings
        let pow8 = a.pow(&[8, 0, 0, 0]);
        assert_eq!(pow8, a.square().square().square());
        // a^(p-1) == 1 by Fermat
        let mut exp = P;
        exp[0] -= 1;
        assert_eq!(a.pow(&exp), FieldElement::ONE);
    }

    #[test]
    fn from_bytes_rejects_noncanonical() {
        let mut bytes = [0xFFu8; 32];
        assert!(FieldElement::from_bytes(&bytes).is_none());
        bytes = (-&FieldElement::ONE).to_bytes();
        assert!(FieldElement::from_bytes(&bytes).is_some());
    }

    #[test]
    fn byte_round_trip() {
        for _ in 0..20 {
            let a = random_element();
            assert_eq!(FieldElement::from_bytes(&a.to_bytes()).unwrap(), a);
        }
    }
}
