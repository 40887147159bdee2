// -*- mode: rust; -*-
//
// This file is part of secp256k1-dalek.
// Copyright (c) 2017-2021 isis agora lovecruft
// See LICENSE for licensing information.
//
// Authors:
// - isis agora lovecruft <isis@patternsinthevoid.net>

//! Errors which may occur when parsing keys and/or signatures to or from wire formats.

use core::fmt;
use core::fmt::Display;

/// Internal errors.  Most application-level developers will likely not
/// need to pay any attention to these.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) enum InternalError {
    /// Malformed hexadecimal input.
    HexFormatError,
    /// An error in the length of bytes handed to a constructor.
    ///
    /// To use this, pass a string specifying the `name` of the type which is
    /// returning the error, and the `length` in bytes which its constructor
    /// expects.
    BytesLengthError {
        name: &'static str,
        length: usize,
    },
    /// A DER-encoded signature did not follow strict encoding rules.
    DerFormatError {
        reason: &'static str,
    },
    /// A scalar was not a canonical representative of `(0, n)`.
    ScalarFormatError {
        name: &'static str,
    },
    /// A scalar multiplication was requested for the zero scalar.
    ZeroScalar,
    /// An x-coordinate had no square root, so the point could not be
    /// reconstructed.
    PointDecompressionError,
    /// The point coordinates do not satisfy the curve equation.
    PointNotOnCurve,
    /// The recovery id of a recoverable signature was out of range.
    RecoveryIdError,
    /// The element shares a factor with the modulus, so it has no inverse.
    NotInvertible,
    /// The deterministic nonce generator exhausted its retry budget.
    NonceExhausted,
    /// A freshly produced Schnorr signature failed its own verification.
    SignSelfCheck,
}

impl Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InternalError::HexFormatError
                => write!(f, "Cannot decode malformed hexadecimal input"),
            InternalError::BytesLengthError { name: n, length: l }
                => write!(f, "{} must be {} bytes in length", n, l),
            InternalError::DerFormatError { reason }
                => write!(f, "Malformed DER signature: {}", reason),
            InternalError::ScalarFormatError { name: n }
                => write!(f, "{} is not a canonical scalar in (0, n)", n),
            InternalError::ZeroScalar
                => write!(f, "Cannot multiply a point by the zero scalar"),
            InternalError::PointDecompressionError
                => write!(f, "Cannot decompress point: x is not on the curve"),
            InternalError::PointNotOnCurve
                => write!(f, "Point coordinates do not satisfy the curve equation"),
            InternalError::RecoveryIdError
                => write!(f, "Recovery id must be 0 or 1"),
            InternalError::NotInvertible
                => write!(f, "Element has no inverse modulo the given modulus"),
            InternalError::NonceExhausted
                => write!(f, "Tried 1000 k values, all were invalid"),
            InternalError::SignSelfCheck
                => write!(f, "Signature produced is invalid"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InternalError {}

/// Errors which may occur while processing keys, signatures, and points.
///
/// This error may arise due to:
///
/// * Being given bytes with a length different to what was expected.
///
/// * Malformed hexadecimal or DER input.
///
/// * A well-formed encoding of a mathematically invalid value: a scalar
///   outside `(0, n)`, a point which is not on the curve, or an invalid
///   recovery id.
///
/// * A fatal engine failure: nonce-generator exhaustion (a broken HMAC or
///   PRNG), or a Schnorr signature failing its own self-check (an arithmetic
///   bug).
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct SignatureError(pub(crate) InternalError);

impl SignatureError {
    /// Returns `true` when the error was caused by malformed input bytes,
    /// and `false` when the input was well-formed but mathematically
    /// invalid (or the failure was internal to the engine).
    pub fn is_encoding(&self) -> bool {
        matches!(
            self.0,
            InternalError::HexFormatError
                | InternalError::BytesLengthError { .. }
                | InternalError::DerFormatError { .. }
        )
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SignatureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}
