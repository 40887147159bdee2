// -*- mode: rust; -*-
//
// This file is part of secp256k1-dalek.
// Copyright (c) 2017-2021 isis agora lovecruft
// See LICENSE for licensing information.
//
// Authors:
// - isis agora lovecruft <isis@patternsinthevoid.net>

//! ECDSA and BIP-340 Schnorr signature types, and their wire codecs.

use core::fmt::Debug;

use crate::errors::InternalError;
use crate::errors::SignatureError;
use crate::field::FieldElement;
use crate::scalar::Scalar;

#[cfg(feature = "serde")]
use serde::de::Visitor;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The length of a compact ECDSA signature (or a Schnorr signature), in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// The length of a recoverable ECDSA signature, in bytes.
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = 65;

/// The maximum length of a DER-encoded ECDSA signature, in bytes.
pub const MAX_DER_SIGNATURE_LENGTH: usize = 72;

/// The prefix byte of a recoverable signature is `31 + recovery_id`,
/// matching bitcoin-style compact signatures over compressed keys.
const RECOVERY_PREFIX_BASE: u8 = 31;

/// An ECDSA signature over secp256k1.
///
/// Both halves are scalars in `(0, n)`.  A signature in "low-S" form
/// additionally has `s <= n/2`; see [`Signature::normalize_s`].
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Signature {
    /// `r` is the x-coordinate of the nonce point `kG`, reduced mod `n`.
    pub(crate) r: Scalar,
    /// `s = k^-1 (m + d*r) mod n`.
    pub(crate) s: Scalar,
}

impl Debug for Signature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Signature( r: {:?}, s: {:?} )", &self.r, &self.s)
    }
}

impl Signature {
    pub(crate) fn from_scalars(r: Scalar, s: Scalar) -> Result<Signature, SignatureError> {
        if bool::from(r.is_zero()) {
            return Err(SignatureError(InternalError::ScalarFormatError {
                name: "Signature.r",
            }));
        }
        if bool::from(s.is_zero()) {
            return Err(SignatureError(InternalError::ScalarFormatError {
                name: "Signature.s",
            }));
        }
        Ok(Signature { r, s })
    }

    /// The 32-byte big-endian encoding of `r`.
    pub fn r_bytes(&self) -> [u8; 32] {
        self.r.to_bytes()
    }

    /// The 32-byte big-endian encoding of `s`.
    pub fn s_bytes(&self) -> [u8; 32] {
        self.s.to_bytes()
    }

    /// Convert this signature to the 64-byte compact form `r || s`.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&self.r.to_bytes());
        bytes[32..].copy_from_slice(&self.s.to_bytes());
        bytes
    }

    /// Construct a `Signature` from a 64-byte compact encoding.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError(InternalError::BytesLengthError {
                name: "Signature",
                length: SIGNATURE_LENGTH,
            }));
        }
        let mut r_bytes = [0u8; 32];
        let mut s_bytes = [0u8; 32];
        r_bytes.copy_from_slice(&bytes[..32]);
        s_bytes.copy_from_slice(&bytes[32..]);

        let r = Scalar::from_bytes(&r_bytes).ok_or(SignatureError(
            InternalError::ScalarFormatError { name: "Signature.r" },
        ))?;
        let s = Scalar::from_bytes(&s_bytes).ok_or(SignatureError(
            InternalError::ScalarFormatError { name: "Signature.s" },
        ))?;
        Signature::from_scalars(r, s)
    }

    /// Is `s` in the upper half of the scalar range?
    ///
    /// Such signatures are malleable: `(r, n - s)` verifies whenever
    /// `(r, s)` does, so strict verification rejects them.
    pub fn is_high_s(&self) -> bool {
        self.s.is_high()
    }

    /// Replace a high `s` with `n - s`.  Idempotent.
    ///
    /// When this changes the signature, the caller must also flip the
    /// parity bit of an associated recovery id; the signing engine does
    /// this automatically.
    pub fn normalize_s(&self) -> Signature {
        if self.is_high_s() {
            Signature {
                r: self.r,
                s: -&self.s,
            }
        } else {
            *self
        }
    }

    /// Encode this signature as a DER `SEQUENCE { INTEGER r, INTEGER s }`.
    ///
    /// Each INTEGER is minimally encoded: no leading zero bytes, except a
    /// single one when the high bit of the first byte would otherwise be
    /// set (keeping the INTEGER non-negative).
    pub fn to_der(&self) -> Vec<u8> {
        fn push_integer(out: &mut Vec<u8>, bytes: &[u8; 32]) {
            let mut start = 0;
            while start < 31 && bytes[start] == 0 {
                start += 1;
            }
            let needs_pad = bytes[start] & 0x80 != 0;
            out.push(0x02);
            out.push((32 - start) as u8 + needs_pad as u8);
            if needs_pad {
                out.push(0x00);
            }
            out.extend_from_slice(&bytes[start..]);
        }

        let mut body = Vec::with_capacity(MAX_DER_SIGNATURE_LENGTH - 2);
        push_integer(&mut body, &self.r.to_bytes());
        push_integer(&mut body, &self.s.to_bytes());

        let mut out = Vec::with_capacity(body.len() + 2);
        out.push(0x30);
        out.push(body.len() as u8);
        out.extend_from_slice(&body);
        out
    }

    /// Decode a DER-encoded signature, rejecting anything that is not a
    /// strict encoding: truncated length fields, trailing bytes after the
    /// two integers, negative integers, and unnecessary leading-zero
    /// padding are all errors.
    pub fn from_der(bytes: &[u8]) -> Result<Signature, SignatureError> {
        fn der_err(reason: &'static str) -> SignatureError {
            SignatureError(InternalError::DerFormatError { reason })
        }

        /// Parse one minimally-encoded INTEGER, returning its 32-byte
        /// value and the remaining input.
        fn parse_integer(input: &[u8]) -> Result<([u8; 32], &[u8]), SignatureError> {
            if input.len() < 2 {
                return Err(der_err("truncated integer header"));
            }
            if input[0] != 0x02 {
                return Err(der_err("expected INTEGER tag"));
            }
            let len = input[1] as usize;
            if len == 0 {
                return Err(der_err("empty integer"));
            }
            if input[1] & 0x80 != 0 {
                return Err(der_err("multi-byte lengths are not used"));
            }
            if input.len() < 2 + len {
                return Err(der_err("truncated integer body"));
            }
            let body = &input[2..2 + len];
            if body[0] & 0x80 != 0 {
                return Err(der_err("negative integer"));
            }
            if len > 1 && body[0] == 0x00 && body[1] & 0x80 == 0 {
                return Err(der_err("unnecessary leading-zero padding"));
            }
            if len > 33 || (len == 33 && body[0] != 0x00) {
                return Err(der_err("integer too large"));
            }
            let digits = if body[0] == 0x00 { &body[1..] } else { body };
            let mut value = [0u8; 32];
            value[32 - digits.len()..].copy_from_slice(digits);
            Ok((value, &input[2 + len..]))
        }

        if bytes.len() < 2 {
            return Err(der_err("truncated sequence header"));
        }
        if bytes[0] != 0x30 {
            return Err(der_err("expected SEQUENCE tag"));
        }
        if bytes[1] & 0x80 != 0 {
            return Err(der_err("multi-byte lengths are not used"));
        }
        if bytes[1] as usize != bytes.len() - 2 {
            return Err(der_err("sequence length mismatch"));
        }

        let (r_bytes, rest) = parse_integer(&bytes[2..])?;
        let (s_bytes, rest) = parse_integer(rest)?;
        if !rest.is_empty() {
            return Err(der_err("trailing bytes after integers"));
        }

        let r = Scalar::from_bytes(&r_bytes).ok_or(SignatureError(
            InternalError::ScalarFormatError { name: "Signature.r" },
        ))?;
        let s = Scalar::from_bytes(&s_bytes).ok_or(SignatureError(
            InternalError::ScalarFormatError { name: "Signature.s" },
        ))?;
        Signature::from_scalars(r, s)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes()[..])
    }
}

#[cfg(feature = "serde")]
impl<'d> Deserialize<'d> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        struct SignatureVisitor;

        impl<'d> Visitor<'d> for SignatureVisitor {
            type Value = Signature;

            fn expecting(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                formatter.write_str("An ECDSA signature as 64 bytes of compact r || s.")
            }

            fn visit_bytes<E>(self, bytes: &[u8]) -> Result<Signature, E>
            where
                E: serde::de::Error,
            {
                Signature::from_bytes(bytes)
                    .or(Err(serde::de::Error::invalid_length(bytes.len(), &self)))
            }
        }
        deserializer.deserialize_bytes(SignatureVisitor)
    }
}

/// An ECDSA signature together with its recovery id, which encodes
/// enough information to recover the signing public key from the
/// signature and message hash alone.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RecoverableSignature {
    /// The underlying signature.
    pub signature: Signature,
    /// Which of the candidate nonce points corresponds to `r`: bit 0 is
    /// the parity of the nonce point's y-coordinate, bit 1 is set when
    /// its x-coordinate exceeded `n`.
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// Encode as 65 bytes: a prefix byte of `31 + recovery_id` followed
    /// by the compact signature.
    pub fn to_bytes(&self) -> [u8; RECOVERABLE_SIGNATURE_LENGTH] {
        let mut bytes = [0u8; RECOVERABLE_SIGNATURE_LENGTH];
        bytes[0] = RECOVERY_PREFIX_BASE + self.recovery_id;
        bytes[1..].copy_from_slice(&self.signature.to_bytes());
        bytes
    }

    /// Decode a 65-byte recoverable signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<RecoverableSignature, SignatureError> {
        if bytes.len() != RECOVERABLE_SIGNATURE_LENGTH {
            return Err(SignatureError(InternalError::BytesLengthError {
                name: "RecoverableSignature",
                length: RECOVERABLE_SIGNATURE_LENGTH,
            }));
        }
        let recovery_id = bytes[0]
            .checked_sub(RECOVERY_PREFIX_BASE)
            .ok_or(SignatureError(InternalError::RecoveryIdError))?;
        if recovery_id > 3 {
            return Err(SignatureError(InternalError::RecoveryIdError));
        }
        let signature = Signature::from_bytes(&bytes[1..])?;
        Ok(RecoverableSignature {
            signature,
            recovery_id,
        })
    }
}

/// A BIP-340 Schnorr signature: the x-coordinate of the nonce point,
/// followed by a scalar.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct SchnorrSignature {
    /// The x-coordinate of the nonce point `R` (whose y is even).
    pub(crate) r: FieldElement,
    /// `s = k + e*d mod n`.
    pub(crate) s: Scalar,
}

impl Debug for SchnorrSignature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SchnorrSignature( r: {:?}, s: {:?} )", &self.r, &self.s)
    }
}

impl SchnorrSignature {
    /// Convert this signature to the 64-byte form `r || s`.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&self.r.to_bytes());
        bytes[32..].copy_from_slice(&self.s.to_bytes());
        bytes
    }

    /// Construct a `SchnorrSignature` from a 64-byte encoding.
    ///
    /// The first half must be a canonical field element in `(0, p)` and
    /// the second a canonical scalar in `(0, n)`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<SchnorrSignature, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError(InternalError::BytesLengthError {
                name: "SchnorrSignature",
                length: SIGNATURE_LENGTH,
            }));
        }
        let mut r_bytes = [0u8; 32];
        let mut s_bytes = [0u8; 32];
        r_bytes.copy_from_slice(&bytes[..32]);
        s_bytes.copy_from_slice(&bytes[32..]);

        let r = FieldElement::from_bytes(&r_bytes).ok_or(SignatureError(
            InternalError::ScalarFormatError {
                name: "SchnorrSignature.r",
            },
        ))?;
        if bool::from(r.is_zero()) {
            return Err(SignatureError(InternalError::ScalarFormatError {
                name: "SchnorrSignature.r",
            }));
        }
        let s = Scalar::from_bytes(&s_bytes).ok_or(SignatureError(
            InternalError::ScalarFormatError {
                name: "SchnorrSignature.s",
            },
        ))?;
        if bool::from(s.is_zero()) {
            return Err(SignatureError(InternalError::ScalarFormatError {
                name: "SchnorrSignature.s",
            }));
        }
        Ok(SchnorrSignature { r, s })
    }
}

#[cfg(feature = "serde")]
impl Serialize for SchnorrSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes()[..])
    }
}

#[cfg(feature = "serde")]
impl<'d> Deserialize<'d> for SchnorrSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        struct SchnorrSignatureVisitor;

        impl<'d> Visitor<'d> for SchnorrSignatureVisitor {
            type Value = SchnorrSignature;

            fn expecting(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                formatter.write_str("A BIP-340 Schnorr signature as 64 bytes of r || s.")
            }

            fn visit_bytes<E>(self, bytes: &[u8]) -> Result<SchnorrSignature, E>
            where
                E: serde::de::Error,
            {
                SchnorrSignature::from_bytes(bytes)
                    .or(Err(serde::de::Error::invalid_length(bytes.len(), &self)))
            }
        }
        deserializer.deserialize_bytes(SchnorrSignatureVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::RngCore;

    fn random_nonzero_scalar() -> Scalar {
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

    fn random_signature() -> Signature {
        Signature {
            r: random_nonzero_scalar(),
            s: random_nonzero_scalar(),
        }
    }

    #[test]
    fn compact_round_trip() {
        for _ in 0..50 {
            let sig = random_signature();
            let decoded = Signature::from_bytes(&sig.to_bytes()).unwrap();
            assert_eq!(decoded, sig);
        }
    }

    #[test]
    fn compact_rejects_bad_lengths_and_ranges() {
        assert!(Signature::from_bytes(&[0u8; 63]).is_err());
        assert!(Signature::from_bytes(&[0u8; 65]).is_err());
        // r = 0
        assert!(Signature::from_bytes(&[0u8; 64]).is_err());
        // s >= n
        let mut bytes = [0u8; 64];
        bytes[31] = 1;
        bytes[32..].copy_from_slice(&[0xFF; 32]);
        assert!(Signature::from_bytes(&bytes).is_err());
    }

    #[test]
    fn der_round_trip() {
        for _ in 0..100 {
            let sig = random_signature();
            let der = sig.to_der();
            let decoded = Signature::from_der(&der).unwrap();
            assert_eq!(decoded.r, sig.r);
            assert_eq!(decoded.s, sig.s);
        }
    }

    #[test]
    fn der_known_vector() {
        // produced by signing sha256(b"Satoshi Nakamoto") with key 1
        let der = hex::decode(
            "3045022100934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d8\
             02202442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5",
        )
        .unwrap();
        let sig = Signature::from_der(&der).unwrap();
        assert_eq!(sig.to_der(), der);
        assert_eq!(
            hex::encode(sig.r_bytes()),
            "934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d8"
        );
    }

    #[test]
    fn der_minimal_encoding_of_small_r() {
        // r = 1 encodes as a single byte
        let sig = Signature {
            r: Scalar::ONE,
            s: Scalar::from(0x80u64),
        };
        let der = sig.to_der();
        // 30 07 02 01 01 02 02 00 80
        assert_eq!(der, vec![0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x02, 0x00, 0x80]);
        assert_eq!(Signature::from_der(&der).unwrap(), sig);
    }

    #[test]
    fn der_rejects_trailing_bytes() {
        let mut der = random_signature().to_der();
        der.push(0x00);
        assert!(Signature::from_der(&der).is_err());
    }

    #[test]
    fn der_rejects_wrong_sequence_length() {
        let mut der = random_signature().to_der();
        der[1] ^= 1;
        assert!(Signature::from_der(&der).is_err());
    }

    #[test]
    fn der_rejects_nonminimal_padding() {
        // 30 08 02 02 00 01 02 02 00 80: the first integer pads 0x01
        let der = [0x30, 0x08, 0x02, 0x02, 0x00, 0x01, 0x02, 0x02, 0x00, 0x80];
        assert!(Signature::from_der(&der).is_err());
    }

    #[test]
    fn der_rejects_negative_integers() {
        // 30 07 02 01 81 02 02 00 80: the first integer is negative
        let der = [0x30, 0x07, 0x02, 0x01, 0x81, 0x02, 0x02, 0x00, 0x80];
        assert!(Signature::from_der(&der).is_err());
    }

    #[test]
    fn der_rejects_truncation() {
        let der = random_signature().to_der();
        for cut in 1..der.len() {
            assert!(Signature::from_der(&der[..cut]).is_err());
        }
    }

    #[test]
    fn normalize_s_is_idempotent() {
        for _ in 0..50 {
            let sig = random_signature();
            let normalized = sig.normalize_s();
            assert!(!normalized.is_high_s());
            assert_eq!(normalized.normalize_s(), normalized);
            assert_eq!(normalized.r, sig.r);
        }
    }

    #[test]
    fn recoverable_round_trip() {
        for recovery_id in 0..4 {
            let rec = RecoverableSignature {
                signature: random_signature(),
                recovery_id,
            };
            let bytes = rec.to_bytes();
            assert_eq!(bytes[0], 31 + recovery_id);
            assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), rec);
        }
    }

    #[test]
    fn recoverable_rejects_bad_prefix() {
        let mut bytes = RecoverableSignature {
            signature: random_signature(),
            recovery_id: 0,
        }
        .to_bytes();
        bytes[0] = 30;
        assert!(RecoverableSignature::from_bytes(&bytes).is_err());
        bytes[0] = 36;
        assert!(RecoverableSignature::from_bytes(&bytes).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_bincode_round_trip() {
        let sig = random_signature();
        let encoded = bincode::serialize(&sig).unwrap();
        let decoded: Signature = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, sig);
    }

    #[test]
    fn schnorr_round_trip() {
        let sig_bytes = hex::decode(
            "e907831f80848d1069a5371b402410364bdf1c5f8307b0084c55f1ce2dca8215\
             25f66a4a85ea8b71e482a74f382d2ce5ebeee8fdb2172f477df4900d310536c0",
        )
        .unwrap();
        let sig = SchnorrSignature::from_bytes(&sig_bytes).unwrap();
        assert_eq!(sig.to_bytes().to_vec(), sig_bytes);
        assert!(SchnorrSignature::from_bytes(&sig_bytes[..63]).is_err());
        // r >= p is rejected
        let mut bad = sig_bytes.clone();
        bad[..32].copy_from_slice(&[0xFF; 32]);
        assert!(SchnorrSignature::from_bytes(&bad).is_err());
    }
}
