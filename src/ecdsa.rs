// -*- mode: rust; -*-
//
// This file is part of secp256k1-dalek.
// Copyright (c) 2017-2021 isis agora lovecruft
// See LICENSE for licensing information.
//
// Authors:
// - isis agora lovecruft <isis@patternsinthevoid.net>

//! ECDSA key generation, signing, verification, and public-key recovery
//! over secp256k1.
//!
//! Signing is deterministic per RFC 6979, with optional extra entropy
//! mixed into the nonce seed.  Produced signatures are always in
//! canonical low-S form, with the recovery bit adjusted to match.

use core::fmt::Debug;

use digest::consts::U32;
use digest::Digest;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::errors::InternalError;
use crate::errors::SignatureError;
use crate::field::FieldElement;
use crate::rfc6979::{bits2octets, NonceDrbg};
use crate::scalar::Scalar;
use crate::signature::{RecoverableSignature, Signature};
use crate::traits::IsIdentity;
use crate::weierstrass::{basepoint_table, vartime, AffinePoint, CompressedPoint};

#[cfg(feature = "serde")]
use serde::de::Visitor;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The length of an ECDSA `SecretKey`, in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// The length of an ECDSA `PublicKey` in compressed form, in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// An ECDSA secret key: a scalar in `(0, n)`.
///
/// The scalar is wiped from memory when the key is dropped.
pub struct SecretKey(pub(crate) Scalar);

impl Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SecretKey: [REDACTED]")
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl SecretKey {
    /// Construct a `SecretKey` from a slice of 32 big-endian bytes.
    ///
    /// The value must be a canonical scalar in `(0, n)`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<SecretKey, SignatureError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(SignatureError(InternalError::BytesLengthError {
                name: "SecretKey",
                length: SECRET_KEY_LENGTH,
            }));
        }
        let mut arr = [0u8; SECRET_KEY_LENGTH];
        arr.copy_from_slice(bytes);
        let scalar = Scalar::from_bytes(&arr).ok_or(SignatureError(
            InternalError::ScalarFormatError { name: "SecretKey" },
        ))?;
        if bool::from(scalar.is_zero()) {
            return Err(SignatureError(InternalError::ScalarFormatError {
                name: "SecretKey",
            }));
        }
        Ok(SecretKey(scalar))
    }

    /// Construct a `SecretKey` from a hex string of 64 digits.
    pub fn from_hex(hex_str: &str) -> Result<SecretKey, SignatureError> {
        let bytes = hex::decode(hex_str)
            .map_err(|_| SignatureError(InternalError::HexFormatError))?;
        SecretKey::from_bytes(&bytes)
    }

    /// Generate a `SecretKey` from a cryptographically secure RNG, by
    /// rejection sampling into `(0, n)`.
    pub fn generate<R>(csprng: &mut R) -> SecretKey
    where
        R: CryptoRng + RngCore,
    {
        loop {
            let mut bytes = [0u8; SECRET_KEY_LENGTH];
            csprng.fill_bytes(&mut bytes);
            if let Ok(key) = SecretKey::from_bytes(&bytes) {
                bytes.zeroize();
                return key;
            }
        }
    }

    /// Convert this secret key to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Derive the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        // the key scalar is nonzero by construction
        let point = basepoint_table()
            .mul(&self.0)
            .expect("secret key scalars are nonzero");
        PublicKey(point)
    }

    /// Sign a 32-byte message hash, deterministically per RFC 6979.
    ///
    /// The returned signature is in canonical low-S form, with the
    /// recovery id matching the normalized `s`.
    pub fn sign_prehashed(
        &self,
        msg_hash: &[u8; 32],
    ) -> Result<RecoverableSignature, SignatureError> {
        self.sign_prehashed_inner(msg_hash, None)
    }

    /// Sign a 32-byte message hash with caller-supplied extra entropy
    /// mixed into the RFC 6979 nonce seed.
    ///
    /// The signature remains valid and verifiable either way; the extra
    /// entropy only decorrelates the nonce from the (key, message) pair.
    pub fn sign_prehashed_with_entropy(
        &self,
        msg_hash: &[u8; 32],
        extra_entropy: &[u8; 32],
    ) -> Result<RecoverableSignature, SignatureError> {
        self.sign_prehashed_inner(msg_hash, Some(*extra_entropy))
    }

    /// Sign a 32-byte message hash with 32 bytes of fresh randomness from
    /// `csprng` as extra entropy.
    pub fn sign_prehashed_randomized<R>(
        &self,
        msg_hash: &[u8; 32],
        csprng: &mut R,
    ) -> Result<RecoverableSignature, SignatureError>
    where
        R: CryptoRng + RngCore,
    {
        let mut entropy = [0u8; 32];
        csprng.fill_bytes(&mut entropy);
        self.sign_prehashed_inner(msg_hash, Some(entropy))
    }

    /// Hash `message` with the supplied digest and sign the result.
    pub fn sign<D>(&self, message: &[u8]) -> Result<RecoverableSignature, SignatureError>
    where
        D: Digest<OutputSize = U32>,
    {
        let msg_hash: [u8; 32] = D::digest(message).into();
        self.sign_prehashed(&msg_hash)
    }

    fn sign_prehashed_inner(
        &self,
        msg_hash: &[u8; 32],
        extra_entropy: Option<[u8; 32]>,
    ) -> Result<RecoverableSignature, SignatureError> {
        let m = Scalar::from_bytes_mod_order(msg_hash);

        // seed = secret || bits2octets(hash) [|| extra entropy]
        let mut seed = [0u8; 96];
        seed[..32].copy_from_slice(&self.to_bytes());
        seed[32..64].copy_from_slice(&bits2octets(msg_hash));
        let seed_len = match extra_entropy {
            Some(entropy) => {
                seed[64..].copy_from_slice(&entropy);
                96
            }
            None => 64,
        };

        let mut drbg = NonceDrbg::new();
        drbg.reseed(&seed[..seed_len]);
        seed.zeroize();

        loop {
            let candidate = drbg.generate()?;
            if let Some(k) = Scalar::from_bytes(&candidate) {
                if !bool::from(k.is_zero()) {
                    if let Some((signature, recovery_id)) = kmd_to_sig(&k, &m, &self.0) {
                        // canonicalize: low-S, flipping the recovery
                        // parity bit when s crosses n/2
                        let (signature, recovery_id) = if signature.is_high_s() {
                            (signature.normalize_s(), recovery_id ^ 1)
                        } else {
                            (signature, recovery_id)
                        };
                        return Ok(RecoverableSignature {
                            signature,
                            recovery_id,
                        });
                    }
                }
            }
            drbg.reseed(&[]);
        }
    }
}

/// One signing attempt: turn a nonce candidate into a signature.
///
/// `R = kG`; `r = R.x mod n`, failing (for retry) when zero;
/// `s = k^-1 (m + d*r) mod n`, failing when zero.  The recovery id
/// records the parity of `R.y` and whether `R.x` exceeded `n`.
fn kmd_to_sig(k: &Scalar, m: &Scalar, d: &Scalar) -> Option<(Signature, u8)> {
    let r_point = basepoint_table().mul(k).ok()?;
    let x_bytes = r_point.x_bytes();
    let r = Scalar::from_bytes_mod_order(&x_bytes);
    if bool::from(r.is_zero()) {
        return None;
    }
    let x_overflows = Scalar::from_bytes(&x_bytes).is_none();

    let k_inv = k.invert().ok()?;
    let s = &k_inv * &(m + &(&r * d));
    if bool::from(s.is_zero()) {
        return None;
    }

    let recovery_id = ((x_overflows as u8) << 1) | (r_point.y_is_odd() as u8);
    Some((Signature { r, s }, recovery_id))
}

/// An ECDSA public key: a validity-checked, non-identity curve point.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct PublicKey(pub(crate) AffinePoint);

impl Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PublicKey( {:?} )", self.compress())
    }
}

impl<'a> From<&'a SecretKey> for PublicKey {
    fn from(secret_key: &'a SecretKey) -> PublicKey {
        secret_key.public_key()
    }
}

impl PublicKey {
    /// Decode a public key from SEC1 bytes, either compressed (33 bytes,
    /// tag `0x02`/`0x03`) or uncompressed (65 bytes, tag `0x04`).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<PublicKey, SignatureError> {
        let point = AffinePoint::from_sec1_bytes(bytes)?;
        Ok(PublicKey(point))
    }

    /// The SEC1 compressed encoding of this key.
    pub fn compress(&self) -> CompressedPoint {
        self.0.compress()
    }

    /// The SEC1 uncompressed encoding of this key.
    pub fn to_uncompressed_bytes(&self) -> [u8; 65] {
        self.0.to_uncompressed_bytes()
    }

    /// The underlying curve point.
    pub fn as_point(&self) -> &AffinePoint {
        &self.0
    }

    /// Verify an ECDSA signature over a 32-byte message hash.
    ///
    /// Never panics or errors: malformed or invalid inputs simply return
    /// `false`.  High-S signatures are rejected as malleable; use
    /// [`PublicKey::verify_prehashed_lenient`] to accept them.
    pub fn verify_prehashed(&self, signature: &Signature, msg_hash: &[u8; 32]) -> bool {
        if signature.is_high_s() {
            return false;
        }
        self.verify_prehashed_lenient(signature, msg_hash)
    }

    /// Verify an ECDSA signature over a 32-byte message hash, accepting
    /// non-canonical high-S signatures.
    pub fn verify_prehashed_lenient(&self, signature: &Signature, msg_hash: &[u8; 32]) -> bool {
        let m = Scalar::from_bytes_mod_order(msg_hash);
        let s_inv = match signature.s.invert() {
            Ok(s_inv) => s_inv,
            Err(_) => return false,
        };
        let u1 = &m * &s_inv;
        let u2 = &signature.r * &s_inv;

        // R = u1*G + u2*Q
        let r_point = vartime::double_scalar_mul_basepoint(&u2, &self.0, &u1);
        if r_point.is_identity() {
            return false;
        }
        let r_affine = r_point.to_affine();
        Scalar::from_bytes_mod_order(&r_affine.x_bytes()) == signature.r
    }

    /// Hash `message` with the supplied digest and verify the signature
    /// over the result.
    pub fn verify<D>(&self, signature: &Signature, message: &[u8]) -> bool
    where
        D: Digest<OutputSize = U32>,
    {
        let msg_hash: [u8; 32] = D::digest(message).into();
        self.verify_prehashed(signature, &msg_hash)
    }
}

#[cfg(feature = "serde")]
impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.compress().as_bytes())
    }
}

#[cfg(feature = "serde")]
impl<'d> Deserialize<'d> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        struct PublicKeyVisitor;

        impl<'d> Visitor<'d> for PublicKeyVisitor {
            type Value = PublicKey;

            fn expecting(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                formatter.write_str("An ECDSA public key as SEC1 compressed or uncompressed bytes.")
            }

            fn visit_bytes<E>(self, bytes: &[u8]) -> Result<PublicKey, E>
            where
                E: serde::de::Error,
            {
                PublicKey::from_sec1_bytes(bytes)
                    .or(Err(serde::de::Error::invalid_length(bytes.len(), &self)))
            }
        }
        deserializer.deserialize_bytes(PublicKeyVisitor)
    }
}

/// An ECDSA keypair.
pub struct Keypair {
    /// The secret half of this keypair.
    pub secret: SecretKey,
    /// The public half of this keypair.
    pub public: PublicKey,
}

impl Keypair {
    /// Generate an ECDSA keypair from a cryptographically secure RNG.
    pub fn generate<R>(csprng: &mut R) -> Keypair
    where
        R: CryptoRng + RngCore,
    {
        let secret = SecretKey::generate(csprng);
        let public = secret.public_key();
        Keypair { secret, public }
    }

    /// Sign a 32-byte message hash with this keypair's secret key.
    pub fn sign_prehashed(
        &self,
        msg_hash: &[u8; 32],
    ) -> Result<RecoverableSignature, SignatureError> {
        self.secret.sign_prehashed(msg_hash)
    }

    /// Verify a signature over a 32-byte message hash with this
    /// keypair's public key.
    pub fn verify_prehashed(&self, signature: &Signature, msg_hash: &[u8; 32]) -> bool {
        self.public.verify_prehashed(signature, msg_hash)
    }
}

/// Recover the signing public key from a signature and message hash.
///
/// `recovery_id` must be 0 or 1 (the parity of the nonce point's
/// y-coordinate); the x-overflow candidates (ids 2 and 3) occur with
/// probability ~2^-127 and are not supported, matching the reference
/// behavior.  The recovered point is validity-checked before returning.
pub fn recover_public_key(
    msg_hash: &[u8; 32],
    signature: &Signature,
    recovery_id: u8,
) -> Result<PublicKey, SignatureError> {
    if recovery_id > 1 {
        return Err(SignatureError(InternalError::RecoveryIdError));
    }

    // reconstruct R from r and the parity bit; r < n < p, so r is
    // always a canonical x-coordinate
    let x = FieldElement::from_bytes(&signature.r.to_bytes())
        .ok_or(SignatureError(InternalError::PointDecompressionError))?;
    let mut r_point = AffinePoint::lift_x(&x)
        .ok_or(SignatureError(InternalError::PointDecompressionError))?;
    if (recovery_id & 1 == 1) != r_point.y_is_odd() {
        r_point = -r_point;
    }

    // Q = (s*R - m*G) * r^-1
    let m = Scalar::from_bytes_mod_order(msg_hash);
    let s_r_minus_m_g = vartime::double_scalar_mul_basepoint(&signature.s, &r_point, &-&m);
    if s_r_minus_m_g.is_identity() {
        return Err(SignatureError(InternalError::PointNotOnCurve));
    }
    let r_inv = signature.r.invert()?;
    let q = s_r_minus_m_g.mul_vartime(&r_inv)?.to_affine();
    q.assert_validity()?;
    Ok(PublicKey(q))
}
