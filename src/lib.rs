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

//! A pure-Rust implementation of group operations on the secp256k1
//! curve, with ECDSA (RFC 6979 deterministic nonces, low-S signatures,
//! public-key recovery) and BIP-340 Schnorr signatures built on top.
//!
//! # Warning
//!
//! This code matches the behavior of the systems it interoperates with,
//! including their timing profile: scalar multiplication is **not**
//! constant-time.  The windowed ladder balances its addition count with a
//! decoy accumulator, which is a weak mitigation only.  Evaluate whether
//! that is acceptable for your threat model before using it with
//! long-lived secret keys.

#![deny(missing_docs)]

//------------------------------------------------------------------------
// External dependencies:
//------------------------------------------------------------------------

// The digest trait is part of the public API (hash-generic signing),
// so re-export the version we were built against.
pub use digest;

// Internal macros. Must come first!
#[macro_use]
pub(crate) mod macros;

//------------------------------------------------------------------------
// secp256k1-dalek public modules
//------------------------------------------------------------------------

// Scalar arithmetic mod n, the order of the basepoint
pub mod scalar;

// Point operations on the short Weierstrass form of secp256k1
pub mod weierstrass;

// ECDSA signing, verification, and public-key recovery
pub mod ecdsa;

// BIP-340 Schnorr signing and verification
pub mod schnorr;

// Signature types and wire codecs (compact, DER, recoverable)
pub mod signature;

// Useful constants, like the secp256k1 basepoint
pub mod constants;

// External (and internal) traits.
pub mod traits;

// Errors for the whole crate.
pub mod errors;

//------------------------------------------------------------------------
// secp256k1-dalek internal modules
//------------------------------------------------------------------------

// Finite field arithmetic mod p = 2^256 - 2^32 - 977
pub mod field;

// Shared limb arithmetic for the 64-bit field and scalar backends
pub(crate) mod arithmetic;

// RFC 6979 deterministic nonce generation
pub(crate) mod rfc6979;

// Precomputed-table code for windowed scalar multiplication
pub mod window;

//------------------------------------------------------------------------
// Re-exports of the most commonly used types
//------------------------------------------------------------------------

pub use crate::ecdsa::{recover_public_key, Keypair, PublicKey, SecretKey};
pub use crate::errors::SignatureError;
pub use crate::field::FieldElement;
pub use crate::scalar::Scalar;
pub use crate::schnorr::XOnlyPublicKey;
pub use crate::signature::{RecoverableSignature, SchnorrSignature, Signature};
pub use crate::weierstrass::{AffinePoint, CompressedPoint, JacobianPoint};
