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

//! Group operations for secp256k1, in short Weierstrass form.

// We allow non snake_case names because coordinates in projective space are
// traditionally denoted by the capitalisation of their respective
// counterparts in affine space.  Yeah, you heard me, rustc, I'm gonna have my
// affine and projective cakes and eat both of them too.
#![allow(non_snake_case)]

use core::fmt::Debug;
use core::ops::Neg;
use std::sync::OnceLock;

use crate::constants;
use crate::errors::InternalError;
use crate::errors::SignatureError;
use crate::field::FieldElement;
use crate::scalar::Scalar;
use crate::traits::{Identity, IsIdentity, ValidityCheck};
use crate::window::{LookupTable, NafLookupTable5};

/// The length of a SEC1 compressed point encoding, in bytes.
pub const COMPRESSED_POINT_LENGTH: usize = 33;

/// The length of a SEC1 uncompressed point encoding, in bytes.
pub const UNCOMPRESSED_POINT_LENGTH: usize = 65;

// ------------------------------------------------------------------------
// Compressed points
// ------------------------------------------------------------------------

/// In SEC1 compressed format, a curve point `(x, y)` is determined by the
/// x-coordinate and the parity of `y`: a tag byte of `0x02` (even) or
/// `0x03` (odd) followed by the 32-byte big-endian x-coordinate.
///
/// The identity has no SEC1 encoding; compressing it yields 33 zero bytes,
/// which `decompress` rejects.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct CompressedPoint(pub [u8; COMPRESSED_POINT_LENGTH]);

impl Debug for CompressedPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CompressedPoint: {:?}", self.as_bytes())
    }
}

impl CompressedPoint {
    /// View this `CompressedPoint` as an array of bytes.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_POINT_LENGTH] {
        &self.0
    }

    /// Copy this `CompressedPoint` to an array of bytes.
    pub fn to_bytes(&self) -> [u8; COMPRESSED_POINT_LENGTH] {
        self.0
    }

    /// Attempt to decompress to an `AffinePoint`.
    ///
    /// Returns `None` if the tag byte is not `0x02`/`0x03`, if the
    /// x-coordinate is not canonical, or if it is not the x-coordinate of
    /// a curve point.
    pub fn decompress(&self) -> Option<AffinePoint> {
        let tag = self.0[0];
        if tag != 0x02 && tag != 0x03 {
            return None;
        }
        let mut x_bytes = [0u8; 32];
        x_bytes.copy_from_slice(&self.0[1..]);
        let x = FieldElement::from_bytes(&x_bytes)?;
        let mut y = weierstrass(&x).sqrt()?;
        // Flip the sign of y if it does not match the tag parity
        let want_odd = tag == 0x03;
        if bool::from(y.is_odd()) != want_odd {
            y = -&y;
        }
        Some(AffinePoint { x, y })
    }
}

// ------------------------------------------------------------------------
// Serde support
// ------------------------------------------------------------------------

#[cfg(feature = "serde")]
use serde::de::Visitor;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(feature = "serde")]
impl Serialize for AffinePoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.compress().as_bytes())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for AffinePoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AffinePointVisitor;

        impl<'de> Visitor<'de> for AffinePointVisitor {
            type Value = AffinePoint;

            fn expecting(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                formatter.write_str("a valid point in SEC1 compressed format")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<AffinePoint, E>
            where
                E: serde::de::Error,
            {
                if v.len() == COMPRESSED_POINT_LENGTH {
                    let mut arr = [0u8; COMPRESSED_POINT_LENGTH];
                    arr.copy_from_slice(v);
                    CompressedPoint(arr)
                        .decompress()
                        .ok_or_else(|| serde::de::Error::custom("decompression failed"))
                } else {
                    Err(serde::de::Error::invalid_length(v.len(), &self))
                }
            }
        }

        deserializer.deserialize_bytes(AffinePointVisitor)
    }
}

// ------------------------------------------------------------------------
// Affine points
// ------------------------------------------------------------------------

/// The right-hand side of the curve equation, `x^3 + 7`.
pub(crate) fn weierstrass(x: &FieldElement) -> FieldElement {
    &(&x.square() * x) + &constants::CURVE_B
}

/// An `AffinePoint` is a point on the curve `y^2 = x^3 + 7` in affine
/// coordinates, with the distinguished pair `(0, 0)` standing for the
/// identity.  (No actual curve point has `x = 0`, since 7 is a quadratic
/// non-residue mod `p`, so the encoding is unambiguous.)
#[derive(Copy, Clone)]
pub struct AffinePoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
}

impl Debug for AffinePoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "AffinePoint{{\n\tx: {:?},\n\ty: {:?}\n}}", &self.x, &self.y)
    }
}

impl Identity for AffinePoint {
    fn identity() -> AffinePoint {
        AffinePoint {
            x: FieldElement::ZERO,
            y: FieldElement::ZERO,
        }
    }
}

impl IsIdentity for AffinePoint {
    fn is_identity(&self) -> bool {
        bool::from(self.x.is_zero() & self.y.is_zero())
    }
}

impl PartialEq for AffinePoint {
    fn eq(&self, other: &AffinePoint) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for AffinePoint {}

impl ValidityCheck for AffinePoint {
    fn is_valid(&self) -> bool {
        !self.is_identity() && self.y.square() == weierstrass(&self.x)
    }
}

impl<'a> Neg for &'a AffinePoint {
    type Output = AffinePoint;
    fn neg(self) -> AffinePoint {
        AffinePoint {
            x: self.x,
            y: -&self.y,
        }
    }
}

impl Neg for AffinePoint {
    type Output = AffinePoint;
    fn neg(self) -> AffinePoint {
        -&self
    }
}

impl AffinePoint {
    /// The identity element, `(0, 0)`.
    pub const IDENTITY: AffinePoint = AffinePoint {
        x: FieldElement::ZERO,
        y: FieldElement::ZERO,
    };

    /// The 32-byte big-endian x-coordinate.
    pub fn x_bytes(&self) -> [u8; 32] {
        self.x.to_bytes()
    }

    /// The parity of the y-coordinate.
    pub fn y_is_odd(&self) -> bool {
        bool::from(self.y.is_odd())
    }

    /// Fails with `PointNotOnCurve` unless the coordinates satisfy the
    /// curve equation (the identity also fails).
    pub fn assert_validity(&self) -> Result<(), SignatureError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SignatureError(InternalError::PointNotOnCurve))
        }
    }

    /// Compress this point to SEC1 compressed format.
    pub fn compress(&self) -> CompressedPoint {
        let mut bytes = [0u8; COMPRESSED_POINT_LENGTH];
        if self.is_identity() {
            return CompressedPoint(bytes);
        }
        bytes[0] = if self.y_is_odd() { 0x03 } else { 0x02 };
        bytes[1..].copy_from_slice(&self.x.to_bytes());
        CompressedPoint(bytes)
    }

    /// Encode this point in SEC1 uncompressed format:
    /// `0x04 || x || y`.
    pub fn to_uncompressed_bytes(&self) -> [u8; UNCOMPRESSED_POINT_LENGTH] {
        let mut bytes = [0u8; UNCOMPRESSED_POINT_LENGTH];
        bytes[0] = 0x04;
        bytes[1..33].copy_from_slice(&self.x.to_bytes());
        bytes[33..].copy_from_slice(&self.y.to_bytes());
        bytes
    }

    /// Decode a point from SEC1 bytes, either compressed (33 bytes) or
    /// uncompressed (65 bytes).  The decoded point is checked to lie on
    /// the curve; the identity is rejected.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<AffinePoint, SignatureError> {
        match bytes.len() {
            COMPRESSED_POINT_LENGTH => {
                let mut arr = [0u8; COMPRESSED_POINT_LENGTH];
                arr.copy_from_slice(bytes);
                CompressedPoint(arr)
                    .decompress()
                    .ok_or(SignatureError(InternalError::PointDecompressionError))
            }
            UNCOMPRESSED_POINT_LENGTH => {
                if bytes[0] != 0x04 {
                    return Err(SignatureError(InternalError::PointDecompressionError));
                }
                let mut x_bytes = [0u8; 32];
                let mut y_bytes = [0u8; 32];
                x_bytes.copy_from_slice(&bytes[1..33]);
                y_bytes.copy_from_slice(&bytes[33..]);
                let x = FieldElement::from_bytes(&x_bytes)
                    .ok_or(SignatureError(InternalError::PointDecompressionError))?;
                let y = FieldElement::from_bytes(&y_bytes)
                    .ok_or(SignatureError(InternalError::PointDecompressionError))?;
                let point = AffinePoint { x, y };
                point.assert_validity()?;
                Ok(point)
            }
            _ => Err(SignatureError(InternalError::BytesLengthError {
                name: "AffinePoint",
                length: COMPRESSED_POINT_LENGTH,
            })),
        }
    }

    /// Reconstruct the curve point with the given x-coordinate and even
    /// y-coordinate, if one exists.
    pub(crate) fn lift_x(x: &FieldElement) -> Option<AffinePoint> {
        let mut y = weierstrass(x).sqrt()?;
        if bool::from(y.is_odd()) {
            y = -&y;
        }
        Some(AffinePoint { x: *x, y })
    }

    /// Windowed scalar multiplication, `k * self`.
    ///
    /// Multiplications by the basepoint reuse the cached width-8 table;
    /// other points get a transient width-1 table.  For repeated
    /// multiplications of another fixed point, build a `LookupTable` once
    /// and call `LookupTable::mul` directly.
    ///
    /// Fails with `ZeroScalar` if `k` is zero.
    pub fn mul(&self, k: &Scalar) -> Result<AffinePoint, SignatureError> {
        if bool::from(k.is_zero()) {
            return Err(SignatureError(InternalError::ZeroScalar));
        }
        if self.is_identity() {
            return Ok(AffinePoint::IDENTITY);
        }
        if self == &constants::SECP256K1_BASEPOINT {
            return basepoint_table().mul(k);
        }
        LookupTable::create(self, 1).mul(k)
    }
}

// ------------------------------------------------------------------------
// Jacobian points
// ------------------------------------------------------------------------

/// A `JacobianPoint` represents the affine point `(X/Z^2, Y/Z^3)`; the
/// point at infinity is encoded as `Z = 0`.  Any representation with the
/// same affine quotient is a valid alias for the same logical point, so
/// equality compares cross-multiplied coordinates, never raw tuples.
#[derive(Copy, Clone)]
pub struct JacobianPoint {
    pub(crate) X: FieldElement,
    pub(crate) Y: FieldElement,
    pub(crate) Z: FieldElement,
}

impl Debug for JacobianPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "JacobianPoint{{\n\tX: {:?},\n\tY: {:?},\n\tZ: {:?}\n}}",
            &self.X, &self.Y, &self.Z
        )
    }
}

impl Identity for JacobianPoint {
    fn identity() -> JacobianPoint {
        JacobianPoint {
            X: FieldElement::ZERO,
            Y: FieldElement::ONE,
            Z: FieldElement::ZERO,
        }
    }
}

impl IsIdentity for JacobianPoint {
    fn is_identity(&self) -> bool {
        bool::from(self.Z.is_zero())
    }
}

impl<'a> From<&'a AffinePoint> for JacobianPoint {
    fn from(point: &'a AffinePoint) -> JacobianPoint {
        if point.is_identity() {
            return JacobianPoint::identity();
        }
        JacobianPoint {
            X: point.x,
            Y: point.y,
            Z: FieldElement::ONE,
        }
    }
}

impl PartialEq for JacobianPoint {
    fn eq(&self, other: &JacobianPoint) -> bool {
        match (self.is_identity(), other.is_identity()) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            _ => {}
        }
        let z1z1 = self.Z.square();
        let z2z2 = other.Z.square();
        let x_eq = &self.X * &z2z2 == &other.X * &z1z1;
        let y_eq = &self.Y * &(&z2z2 * &other.Z) == &other.Y * &(&z1z1 * &self.Z);
        x_eq && y_eq
    }
}

impl Eq for JacobianPoint {}

impl ValidityCheck for JacobianPoint {
    fn is_valid(&self) -> bool {
        !self.is_identity() && self.to_affine().is_valid()
    }
}

impl<'a> Neg for &'a JacobianPoint {
    type Output = JacobianPoint;
    fn neg(self) -> JacobianPoint {
        JacobianPoint {
            X: self.X,
            Y: -&self.Y,
            Z: self.Z,
        }
    }
}

impl Neg for JacobianPoint {
    type Output = JacobianPoint;
    fn neg(self) -> JacobianPoint {
        -&self
    }
}

impl JacobianPoint {
    /// The point at infinity, `(0 : 1 : 0)`.
    pub const IDENTITY: JacobianPoint = JacobianPoint {
        X: FieldElement::ZERO,
        Y: FieldElement::ONE,
        Z: FieldElement::ZERO,
    };

    /// Add this point to itself, with the doubling formulas specialized
    /// to `a = 0`.
    pub fn double(&self) -> JacobianPoint {
        let A = self.X.square();
        let B = self.Y.square();
        let C = B.square();
        let t = &self.X + &B;
        let mut D = &t.square() - &(&A + &C);
        D = &D + &D;
        let E = &(&A + &A) + &A;
        let F = E.square();
        let two_C = &C + &C;
        let eight_C = &(&two_C + &two_C) + &(&two_C + &two_C);
        let X3 = &F - &(&D + &D);
        let Y3 = &(&E * &(&D - &X3)) - &eight_C;
        let Z3 = &(&self.Y * &self.Z) + &(&self.Y * &self.Z);
        JacobianPoint { X: X3, Y: Y3, Z: Z3 }
    }

    /// General addition.  Identity operands short-circuit; equal
    /// x-coordinates (after cross-normalization) mean either a doubling
    /// (`r == 0`) or the sum of a point and its negation (`r != 0`),
    /// which is the identity.
    pub fn add(&self, other: &JacobianPoint) -> JacobianPoint {
        if other.is_identity() {
            return *self;
        }
        if self.is_identity() {
            return *other;
        }
        let Z1Z1 = self.Z.square();
        let Z2Z2 = other.Z.square();
        let U1 = &self.X * &Z2Z2;
        let U2 = &other.X * &Z1Z1;
        let S1 = &(&self.Y * &other.Z) * &Z2Z2;
        let S2 = &(&other.Y * &self.Z) * &Z1Z1;
        let H = &U2 - &U1;
        let r = &S2 - &S1;
        if bool::from(H.is_zero()) {
            if bool::from(r.is_zero()) {
                return self.double();
            }
            return JacobianPoint::IDENTITY;
        }
        let HH = H.square();
        let HHH = &H * &HH;
        let V = &U1 * &HH;
        let X3 = &(&r.square() - &HHH) - &(&V + &V);
        let Y3 = &(&r * &(&V - &X3)) - &(&S1 * &HHH);
        let Z3 = &(&self.Z * &other.Z) * &H;
        JacobianPoint { X: X3, Y: Y3, Z: Z3 }
    }

    /// Mixed addition with an affine point (`Z2 = 1`), used when adding
    /// precomputed table entries.
    pub(crate) fn add_mixed(&self, other: &AffinePoint) -> JacobianPoint {
        if other.is_identity() {
            return *self;
        }
        if self.is_identity() {
            return JacobianPoint::from(other);
        }
        let Z1Z1 = self.Z.square();
        let U2 = &other.x * &Z1Z1;
        let S2 = &(&other.y * &self.Z) * &Z1Z1;
        let H = &U2 - &self.X;
        let r = &S2 - &self.Y;
        if bool::from(H.is_zero()) {
            if bool::from(r.is_zero()) {
                return self.double();
            }
            return JacobianPoint::IDENTITY;
        }
        let HH = H.square();
        let HHH = &H * &HH;
        let V = &self.X * &HH;
        let X3 = &(&r.square() - &HHH) - &(&V + &V);
        let Y3 = &(&r * &(&V - &X3)) - &(&self.Y * &HHH);
        let Z3 = &self.Z * &H;
        JacobianPoint { X: X3, Y: Y3, Z: Z3 }
    }

    /// Convert to affine coordinates with a freshly computed `z^{-1}`.
    /// The point at infinity maps to the affine identity `(0, 0)`.
    pub fn to_affine(&self) -> AffinePoint {
        match self.Z.invert() {
            Ok(z_inv) => self.to_affine_with_z_inverse(&z_inv),
            Err(_) => AffinePoint::IDENTITY,
        }
    }

    /// Convert to affine coordinates using a supplied `z^{-1}`.
    pub(crate) fn to_affine_with_z_inverse(&self, z_inv: &FieldElement) -> AffinePoint {
        let z_inv2 = z_inv.square();
        let z_inv3 = &z_inv2 * z_inv;
        AffinePoint {
            x: &self.X * &z_inv2,
            y: &self.Y * &z_inv3,
        }
    }

    /// Convert a batch of Jacobian points to affine, sharing one
    /// inversion pass over the z-coordinates.  Points at infinity map to
    /// the affine identity.
    pub fn to_affine_batch(points: &[JacobianPoint]) -> Vec<AffinePoint> {
        let mut zs: Vec<FieldElement> = points.iter().map(|p| p.Z).collect();
        FieldElement::batch_invert(&mut zs);
        points
            .iter()
            .zip(zs.iter())
            .map(|(p, z_inv)| {
                if p.is_identity() {
                    AffinePoint::IDENTITY
                } else {
                    p.to_affine_with_z_inverse(z_inv)
                }
            })
            .collect()
    }

    /// Plain double-and-add scalar multiplication, `k * self`.
    ///
    /// This runs in time variable in the scalar and must only be used
    /// where `k` is not secret, e.g. for verification terms derived from
    /// public keys.  Fails with `ZeroScalar` if `k` is zero.
    pub fn mul_vartime(&self, k: &Scalar) -> Result<JacobianPoint, SignatureError> {
        if bool::from(k.is_zero()) {
            return Err(SignatureError(InternalError::ZeroScalar));
        }
        let mut acc = JacobianPoint::IDENTITY;
        let mut base = *self;
        for i in 0..256 {
            if k.bit(i) == 1 {
                acc = acc.add(&base);
            }
            if i < 255 {
                base = base.double();
            }
        }
        Ok(acc)
    }
}

// ------------------------------------------------------------------------
// Cached basepoint tables
// ------------------------------------------------------------------------

static BASEPOINT_TABLE: OnceLock<LookupTable> = OnceLock::new();
static BASEPOINT_NAF_TABLE: OnceLock<NafLookupTable5> = OnceLock::new();

/// The width-8 windowed table for the basepoint.
///
/// Built once on first use and shared by reference afterwards; this is
/// the only long-lived derived state in the crate, and it is never
/// mutated after construction.
pub fn basepoint_table() -> &'static LookupTable {
    BASEPOINT_TABLE.get_or_init(|| LookupTable::create(&constants::SECP256K1_BASEPOINT, 8))
}

pub(crate) fn basepoint_naf_table() -> &'static NafLookupTable5 {
    BASEPOINT_NAF_TABLE.get_or_init(|| NafLookupTable5::from_point(&constants::SECP256K1_BASEPOINT))
}

// ------------------------------------------------------------------------
// Variable-time functions
// ------------------------------------------------------------------------

pub mod vartime {
    //! Variable-time operations on curve points, useful for non-secret data.
    use super::*;

    /// Given a point `A` and scalars `a` and `b`, compute the point
    /// `aA + bG`, where `G` is the secp256k1 basepoint.
    ///
    /// Zero scalars contribute the identity, so this function backs the
    /// verification equations, whose terms may legitimately vanish.
    pub fn double_scalar_mul_basepoint(
        a: &Scalar,
        A: &AffinePoint,
        b: &Scalar,
    ) -> JacobianPoint {
        let a_naf = a.non_adjacent_form(5);
        let b_naf = b.non_adjacent_form(5);

        let odd_multiples_of_A = NafLookupTable5::from_point(A);
        let odd_multiples_of_B = basepoint_naf_table();

        let mut r = JacobianPoint::IDENTITY;
        for i in (0..257).rev() {
            if !r.is_identity() {
                r = r.double();
            }

            if a_naf[i] > 0 {
                r = r.add_mixed(&odd_multiples_of_A.select(a_naf[i] as usize));
            } else if a_naf[i] < 0 {
                r = r.add_mixed(&-odd_multiples_of_A.select(a_naf[i].unsigned_abs() as usize));
            }

            if b_naf[i] > 0 {
                r = r.add_mixed(&odd_multiples_of_B.select(b_naf[i] as usize));
            } else if b_naf[i] < 0 {
                r = r.add_mixed(&-odd_multiples_of_B.select(b_naf[i].unsigned_abs() as usize));
            }
        }

        r
    }
}

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------
