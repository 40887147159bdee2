// -*- mode: rust; -*-
//
// This file is part of secp256k1-dalek.
// Copyright (c) 2017-2021 isis agora lovecruft
// See LICENSE for licensing information.
//
// Authors:
// - isis agora lovecruft <isis@patternsinthevoid.net>

//! BIP-340 Schnorr signatures over secp256k1.
//!
//! Public keys are x-only: 32 bytes naming the curve point with that
//! x-coordinate and even y.  Signing normalizes both the key and the
//! nonce to even-y form, derives the nonce from the key, an auxiliary
//! random value, and the message through tagged hashes, and verifies its
//! own output before returning it.

use core::fmt::Debug;

use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::ecdsa::SecretKey;
use crate::errors::InternalError;
use crate::errors::SignatureError;
use crate::field::FieldElement;
use crate::scalar::Scalar;
use crate::signature::SchnorrSignature;
use crate::traits::IsIdentity;
use crate::weierstrass::{basepoint_table, vartime, AffinePoint};

/// The length of an x-only Schnorr public key, in bytes.
pub const XONLY_PUBLIC_KEY_LENGTH: usize = 32;

/// Compute `SHA256(SHA256(tag) || SHA256(tag) || parts...)`.
fn tagged_hash(tag: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let tag_hash: [u8; 32] = Sha256::digest(tag).into();
    let mut h = Sha256::new();
    h.update(tag_hash);
    h.update(tag_hash);
    for part in parts {
        h.update(part);
    }
    h.finalize().into()
}

/// A BIP-340 x-only public key.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct XOnlyPublicKey(pub(crate) FieldElement);

impl Debug for XOnlyPublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "XOnlyPublicKey( {:?} )", &self.0)
    }
}

impl XOnlyPublicKey {
    /// Construct an `XOnlyPublicKey` from its 32-byte big-endian
    /// x-coordinate.
    ///
    /// The coordinate must be canonical; whether it lifts to a curve
    /// point is checked during verification, which treats an unliftable
    /// key as "signature invalid" per BIP-340.
    pub fn from_bytes(bytes: &[u8]) -> Result<XOnlyPublicKey, SignatureError> {
        if bytes.len() != XONLY_PUBLIC_KEY_LENGTH {
            return Err(SignatureError(InternalError::BytesLengthError {
                name: "XOnlyPublicKey",
                length: XONLY_PUBLIC_KEY_LENGTH,
            }));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        let x = FieldElement::from_bytes(&arr)
            .ok_or(SignatureError(InternalError::PointDecompressionError))?;
        Ok(XOnlyPublicKey(x))
    }

    /// Derive the x-only public key for a secret key.
    pub fn from_secret(secret_key: &SecretKey) -> XOnlyPublicKey {
        XOnlyPublicKey(secret_key.public_key().as_point().x)
    }

    /// The 32-byte big-endian x-coordinate.
    pub fn to_bytes(&self) -> [u8; XONLY_PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }
}

/// Sign `message` with auxiliary randomness drawn from `csprng`.
pub fn sign<R>(
    message: &[u8],
    secret_key: &SecretKey,
    csprng: &mut R,
) -> Result<SchnorrSignature, SignatureError>
where
    R: CryptoRng + RngCore,
{
    let mut aux_rand = [0u8; 32];
    csprng.fill_bytes(&mut aux_rand);
    sign_with_aux_rand(message, secret_key, &aux_rand)
}

/// Sign `message` with the given auxiliary randomness, per BIP-340.
///
/// Before returning, the signature is verified against the signer's own
/// public key; failure of that self-check aborts signing with
/// `SignSelfCheck`, since it indicates an arithmetic bug rather than bad
/// input.
pub fn sign_with_aux_rand(
    message: &[u8],
    secret_key: &SecretKey,
    aux_rand: &[u8; 32],
) -> Result<SchnorrSignature, SignatureError> {
    let d0 = secret_key.0;
    let p_point = basepoint_table().mul(&d0)?;
    // BIP-340 works with even-Y public keys; negate the key if needed
    let d = if p_point.y_is_odd() { -&d0 } else { d0 };
    let px = p_point.x_bytes();

    // t = d XOR H_aux(aux_rand)
    let aux_hash = tagged_hash(b"BIP0340/aux", &[aux_rand]);
    let mut t = d.to_bytes();
    for (t_byte, aux_byte) in t.iter_mut().zip(aux_hash.iter()) {
        *t_byte ^= aux_byte;
    }

    let k0 = Scalar::from_bytes_mod_order(&tagged_hash(b"BIP0340/nonce", &[&t, &px, message]));
    if bool::from(k0.is_zero()) {
        return Err(SignatureError(InternalError::ZeroScalar));
    }

    let r_point = basepoint_table().mul(&k0)?;
    let k = if r_point.y_is_odd() { -&k0 } else { k0 };
    let rx = r_point.x_bytes();

    let e = Scalar::from_bytes_mod_order(&tagged_hash(
        b"BIP0340/challenge",
        &[&rx, &px, message],
    ));

    let signature = SchnorrSignature {
        r: r_point.x,
        s: &k + &(&e * &d),
    };

    // self-check: a bad signature here means broken arithmetic, and must
    // abort rather than hand out a possibly-invalid signature
    let public_key = XOnlyPublicKey(p_point.x);
    if !verify(&signature, message, &public_key) {
        return Err(SignatureError(InternalError::SignSelfCheck));
    }
    Ok(signature)
}

/// Verify a BIP-340 Schnorr signature.
///
/// Never panics or errors: an unliftable public key or any failed check
/// returns `false`.
pub fn verify(signature: &SchnorrSignature, message: &[u8], public_key: &XOnlyPublicKey) -> bool {
    let p_point = match AffinePoint::lift_x(&public_key.0) {
        Some(point) => point,
        None => return false,
    };

    let e = Scalar::from_bytes_mod_order(&tagged_hash(
        b"BIP0340/challenge",
        &[&signature.r.to_bytes(), &public_key.to_bytes(), message],
    ));

    // R' = s*G - e*P
    let r_point = vartime::double_scalar_mul_basepoint(&-&e, &p_point, &signature.s);
    if r_point.is_identity() {
        return false;
    }
    let r_affine = r_point.to_affine();
    if r_affine.y_is_odd() {
        return false;
    }
    r_affine.x == signature.r
}
