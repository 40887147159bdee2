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

//! Various constants, such as the secp256k1 basepoint and curve
//! parameters.
//!
//! The curve is `y^2 = x^3 + 7` over GF(p) with
//! `p = 2^256 - 2^32 - 977`, cofactor 1, and prime group order `n`.

use crate::field::FieldElement;
use crate::scalar::Scalar;
use crate::weierstrass::AffinePoint;

/// The constant term of the curve equation, `b = 7`.
pub(crate) const CURVE_B: FieldElement = FieldElement([7, 0, 0, 0]);

/// The x-coordinate of the basepoint.
///
/// Gx = 0x79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798
pub(crate) const BASEPOINT_X: FieldElement = FieldElement([
    0x59F2_815B_16F8_1798,
    0x029B_FCDB_2DCE_28D9,
    0x55A0_6295_CE87_0B07,
    0x79BE_667E_F9DC_BBAC,
]);

/// The y-coordinate of the basepoint.
///
/// Gy = 0x483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8
pub(crate) const BASEPOINT_Y: FieldElement = FieldElement([
    0x9C47_D08F_FB10_D4B8,
    0xFD17_B448_A685_5419,
    0x5DA4_FBFC_0E11_08A8,
    0x483A_DA77_26A3_C465,
]);

/// The secp256k1 basepoint, as an `AffinePoint`.
pub const SECP256K1_BASEPOINT: AffinePoint = AffinePoint {
    x: BASEPOINT_X,
    y: BASEPOINT_Y,
};

/// A nontrivial cube root of unity mod `p`.
///
/// The map `phi(x, y) = (beta * x, y)` is an automorphism of the curve,
/// with `phi(P) = lambda * P`.  Windowed scalar multiplication exploits
/// this to halve the number of doublings.
pub(crate) const BETA: FieldElement = FieldElement([
    0xC139_6C28_7195_01EE,
    0x9CF0_4975_12F5_8995,
    0x6E64_479E_AC34_34E9,
    0x7AE9_6A2B_657C_0710,
]);

/// The nontrivial cube root of unity mod `n` matching `BETA`.
pub(crate) const LAMBDA: Scalar = Scalar([
    0xDF02_967C_1B23_BD72,
    0x122E_22EA_2081_6678,
    0xA526_1C02_8812_645A,
    0x5363_AD4C_C05C_30E0,
]);

#[cfg(test)]
mod test {
    use super::*;
    use crate::traits::ValidityCheck;

    #[test]
    fn basepoint_is_on_curve() {
        assert!(SECP256K1_BASEPOINT.is_valid());
    }

    #[test]
    fn beta_is_a_nontrivial_cube_root_of_unity() {
        assert_ne!(BETA, FieldElement::ONE);
        assert_eq!(&BETA.square() * &BETA, FieldElement::ONE);
    }

    #[test]
    fn lambda_is_a_nontrivial_cube_root_of_unity() {
        assert_ne!(LAMBDA, Scalar::ONE);
        assert_eq!(&(&LAMBDA * &LAMBDA) * &LAMBDA, Scalar::ONE);
    }

    #[test]
    fn lambda_times_basepoint_is_endomorphism_image() {
        let lambda_g = SECP256K1_BASEPOINT.mul(&LAMBDA).unwrap();
        assert_eq!(lambda_g.x, &BETA * &SECP256K1_BASEPOINT.x);
        assert_eq!(lambda_g.y, SECP256K1_BASEPOINT.y);
    }
}
