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

//! Code for fixed-window functionality: precomputed tables of multiples
//! of a fixed point, and the windowed multiplication built on them.

#![allow(non_snake_case)]

use core::fmt::Debug;

use crate::constants;
use crate::errors::InternalError;
use crate::errors::SignatureError;
use crate::scalar::Scalar;
use crate::traits::{Identity, IsIdentity};
use crate::weierstrass::{AffinePoint, JacobianPoint};

/// A precomputed table of multiples of a fixed point `P`, for
/// accelerating scalar multiplication.
///
/// For window width `w` the table holds `128/w + 1` windows of
/// `2^(w-1)` points: window `i` stores `j * 2^(w*i) * P` for
/// `1 <= j <= 2^(w-1)`, enough to cover the two half-width halves of a
/// GLV-decomposed scalar.  The table is built once, normalized to affine
/// with a single batched inversion, and never mutated afterwards; to
/// change the window width, build a new table.
///
/// The width-8 table for the basepoint weighs in around 140KB, so tables
/// for ad-hoc points default to width 1.
#[derive(Clone)]
pub struct LookupTable {
    w: usize,
    windows: usize,
    points: Vec<AffinePoint>,
}

impl Debug for LookupTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "LookupTable(w = {}, {} points)", self.w, self.points.len())
    }
}

impl LookupTable {
    /// Create a table of precomputed multiples of `point`.
    ///
    /// The window width must be a power of two dividing 256 that keeps
    /// the digits in an `i8`-sized window, i.e. one of 1, 2, 4, or 8.
    pub fn create(point: &AffinePoint, w: usize) -> LookupTable {
        assert!(
            matches!(w, 1 | 2 | 4 | 8),
            "window width must be a power of two dividing 256"
        );
        assert!(!point.is_identity(), "cannot build a table for the identity");

        let windows = 128 / w + 1;
        let window_size = 1usize << (w - 1);

        let base = JacobianPoint::from(point);
        let mut jacobians = Vec::with_capacity(windows * window_size);
        let mut window_base = base;
        for _ in 0..windows {
            // multiples 1..=2^(w-1) of the current window base
            let mut multiple = window_base;
            jacobians.push(multiple);
            for _ in 1..window_size {
                multiple = multiple.add(&window_base);
                jacobians.push(multiple);
            }
            // 2 * (2^(w-1) * base) = 2^w * base, the next window's base
            window_base = multiple.double();
        }

        let points = JacobianPoint::to_affine_batch(&jacobians);
        LookupTable { w, windows, points }
    }

    /// Windowed-NAF multiplication of the table's point by `k`.
    ///
    /// The scalar is split with the GLV endomorphism into two half-width
    /// signed scalars; each is processed with signed window digits in
    /// `[-(2^(w-1)), 2^(w-1)]` (carrying when a window overflows half its
    /// range), the second partial result is mapped through the
    /// endomorphism by scaling its x-coordinate by `beta`, and the two
    /// partials are summed.  The result and the decoy accumulator are
    /// normalized with one batched affine conversion.
    ///
    /// Fails with `ZeroScalar` if `k` is zero.
    pub fn mul(&self, k: &Scalar) -> Result<AffinePoint, SignatureError> {
        if bool::from(k.is_zero()) {
            return Err(SignatureError(InternalError::ZeroScalar));
        }
        let (k1neg, k1, k2neg, k2) = k.split_glv();
        let (mut p1, f1) = self.wnaf_half(k1);
        let (mut p2, f2) = self.wnaf_half(k2);
        if k1neg {
            p1 = -p1;
        }
        if k2neg {
            p2 = -p2;
        }
        p2.X = &p2.X * &constants::BETA;
        let acc = p1.add(&p2);

        // The decoy accumulator only exists to balance the number of
        // additions between the zero-digit and nonzero-digit branches;
        // normalizing it together with the result keeps the final
        // conversion shape independent of the digit pattern.
        let decoy = f1.add(&f2);
        let normalized = JacobianPoint::to_affine_batch(&[acc, decoy]);
        Ok(normalized[0])
    }

    /// Process one half-width scalar, returning the accumulator and the
    /// decoy accumulator.
    fn wnaf_half(&self, k: u128) -> (JacobianPoint, JacobianPoint) {
        let window_size = 1u128 << (self.w - 1);
        let mask = (1u128 << self.w) - 1;

        let mut p = JacobianPoint::IDENTITY;
        let mut f = JacobianPoint::IDENTITY;
        let mut n = k;
        for window in 0..self.windows {
            let offset = window * (window_size as usize);
            let mut wbits = (n & mask) as i64;
            n >>= self.w;
            if wbits > window_size as i64 {
                // recenter the digit and carry into the next window
                wbits -= 1i64 << self.w;
                n += 1;
            }
            if wbits == 0 {
                // a real table point keeps the decoy on the curve;
                // alternating signs keeps it from being a plain multiple
                let mut pt = self.points[offset];
                if window & 1 == 1 {
                    pt = -pt;
                }
                f = f.add_mixed(&pt);
            } else {
                let mut pt = self.points[offset + wbits.unsigned_abs() as usize - 1];
                if wbits < 0 {
                    pt = -pt;
                }
                p = p.add_mixed(&pt);
            }
        }
        debug_assert_eq!(n, 0);
        (p, f)
    }
}

/// Holds odd multiples 1A, 3A, ..., 15A of a point A, for the width-5
/// NAF used by variable-time double-scalar multiplication.
#[derive(Copy, Clone)]
pub(crate) struct NafLookupTable5([AffinePoint; 8]);

impl NafLookupTable5 {
    pub(crate) fn from_point(A: &AffinePoint) -> NafLookupTable5 {
        if A.is_identity() {
            return NafLookupTable5([AffinePoint::identity(); 8]);
        }
        let base = JacobianPoint::from(A);
        let A2 = base.double();
        let mut Ai = [base; 8];
        for i in 0..7 {
            Ai[i + 1] = Ai[i].add(&A2);
        }
        // Now Ai = [A, 3A, 5A, 7A, 9A, 11A, 13A, 15A]
        let affine = JacobianPoint::to_affine_batch(&Ai);
        let mut out = [AffinePoint::identity(); 8];
        out.copy_from_slice(&affine);
        NafLookupTable5(out)
    }

    /// Given public, odd `x` with `0 < x < 2^4`, return `xA`.
    pub(crate) fn select(&self, x: usize) -> AffinePoint {
        debug_assert_eq!(x & 1, 1);
        debug_assert!(x < 16);

        self.0[x / 2]
    }
}

impl Debug for NafLookupTable5 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NafLookupTable5({:?})", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_shapes() {
        let g = constants::SECP256K1_BASEPOINT;
        let t1 = LookupTable::create(&g, 1);
        assert_eq!(t1.windows, 129);
        assert_eq!(t1.points.len(), 129);
        let t8 = LookupTable::create(&g, 8);
        assert_eq!(t8.windows, 17);
        assert_eq!(t8.points.len(), 17 * 128);
    }

    #[test]
    fn first_window_holds_small_multiples() {
        let g = constants::SECP256K1_BASEPOINT;
        let table = LookupTable::create(&g, 8);
        assert_eq!(table.points[0], g);
        let g2 = JacobianPoint::from(&g).double().to_affine();
        assert_eq!(table.points[1], g2);
        let g3 = JacobianPoint::from(&g2).add_mixed(&g).to_affine();
        assert_eq!(table.points[2], g3);
    }

    #[test]
    fn window_widths_agree() {
        let g = constants::SECP256K1_BASEPOINT;
        let t1 = LookupTable::create(&g, 1);
        let t4 = LookupTable::create(&g, 4);
        let t8 = LookupTable::create(&g, 8);
        for k in [1u64, 2, 3, 0xFFFF_FFFF, 0xDEAD_BEEF_0BAD_F00D] {
            let k = Scalar::from(k);
            let a = t1.mul(&k).unwrap();
            let b = t4.mul(&k).unwrap();
            let c = t8.mul(&k).unwrap();
            assert_eq!(a, b);
            assert_eq!(b, c);
        }
    }

    #[test]
    fn naf_table_holds_odd_multiples() {
        let g = constants::SECP256K1_BASEPOINT;
        let table = NafLookupTable5::from_point(&g);
        let g3 = g.mul(&Scalar::from(3u64)).unwrap();
        let g15 = g.mul(&Scalar::from(15u64)).unwrap();
        assert_eq!(table.select(1), g);
        assert_eq!(table.select(3), g3);
        assert_eq!(table.select(15), g15);
    }
}
