// -*- mode: rust; -*-
//
// This file is part of secp256k1-dalek.
// Copyright (c) 2017-2021 isis agora lovecruft
// See LICENSE for licensing information.
//
// Authors:
// - isis agora lovecruft <isis@patternsinthevoid.net>

//! Integration tests for BIP-340 Schnorr signatures.

use rand::rngs::OsRng;

use secp256k1_dalek::ecdsa::SecretKey;
use secp256k1_dalek::schnorr;
use secp256k1_dalek::schnorr::XOnlyPublicKey;
use secp256k1_dalek::signature::SchnorrSignature;

/// A BIP-340 official test vector: secret key, auxiliary randomness,
/// message, x-only public key, and expected signature.
struct Bip340Vector {
    secret_hex: &'static str,
    aux_hex: &'static str,
    message_hex: &'static str,
    public_hex: &'static str,
    signature_hex: &'static str,
}

static BIP340_VECTORS: &[Bip340Vector] = &[
    Bip340Vector {
        secret_hex: "0000000000000000000000000000000000000000000000000000000000000003",
        aux_hex: "0000000000000000000000000000000000000000000000000000000000000000",
        message_hex: "0000000000000000000000000000000000000000000000000000000000000000",
        public_hex: "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
        signature_hex: "e907831f80848d1069a5371b402410364bdf1c5f8307b0084c55f1ce2dca8215\
                        25f66a4a85ea8b71e482a74f382d2ce5ebeee8fdb2172f477df4900d310536c0",
    },
    Bip340Vector {
        secret_hex: "b7e151628aed2a6abf7158809cf4f3c762e7160f38b4da56a784d9045190cfef",
        aux_hex: "0000000000000000000000000000000000000000000000000000000000000001",
        message_hex: "243f6a8885a308d313198a2e03707344a4093822299f31d0082efa98ec4e6c89",
        public_hex: "dff1d77f2a671c5f36183726db2341be58feae1da2deced843240f7b502ba659",
        signature_hex: "6896bd60eeae296db48a229ff71dfe071bde413e6d43f917dc8dcf8c78de3341\
                        8906d11ac976abccb20b091292bff4ea897efcb639ea871cfa95f6de339e4b0a",
    },
    Bip340Vector {
        secret_hex: "c90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74020bbea63b14e5c9",
        aux_hex: "c87aa53824b4d7ae2eb035a2b5bbbccc080e76cdc6d1692c4b0b62d798e6d906",
        message_hex: "7e2d58d8b3bcdf1abadec7829054f90dda9805aab56c77333024b9d0a508b75c",
        public_hex: "dd308afec5777e13121fa72b9cc1b7cc0139715309b086c960e18fd969774eb8",
        signature_hex: "5831aaeed7b44bb74e5eab94ba9d4294c49bcf2a60728d8b4c200f50dd313c1b\
                        ab745879a5ad954a72c45a91c3a51d3c7adea98d82f8481e0e1e03674a6f3fb7",
    },
];

fn hex32(hex_str: &str) -> [u8; 32] {
    let bytes = hex::decode(hex_str).unwrap();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    arr
}

#[test]
fn bip340_known_answers() {
    for vector in BIP340_VECTORS {
        let secret = SecretKey::from_hex(vector.secret_hex).unwrap();
        let aux = hex32(vector.aux_hex);
        let message = hex::decode(vector.message_hex).unwrap();

        let public = XOnlyPublicKey::from_secret(&secret);
        assert_eq!(hex::encode(public.to_bytes()), vector.public_hex);

        let signature = schnorr::sign_with_aux_rand(&message, &secret, &aux).unwrap();
        assert_eq!(hex::encode(signature.to_bytes()), vector.signature_hex);
        assert!(schnorr::verify(&signature, &message, &public));
    }
}

#[test]
fn sign_verify_round_trip() {
    let mut csprng = OsRng;
    for i in 0..25 {
        let secret = SecretKey::generate(&mut csprng);
        let public = XOnlyPublicKey::from_secret(&secret);
        let message = format!("schnorr message {}", i).into_bytes();
        let signature = schnorr::sign(&message, &secret, &mut csprng).unwrap();
        assert!(schnorr::verify(&signature, &message, &public));
        assert!(!schnorr::verify(&signature, b"some other message", &public));
    }
}

#[test]
fn any_single_bit_flip_invalidates() {
    let mut csprng = OsRng;
    let secret = SecretKey::generate(&mut csprng);
    let public = XOnlyPublicKey::from_secret(&secret);
    let message = b"flip one bit and everything falls apart";
    let signature = schnorr::sign(message, &secret, &mut csprng).unwrap();
    let bytes = signature.to_bytes();

    for bit in 0..512 {
        let mut tampered = bytes;
        tampered[bit / 8] ^= 1 << (bit % 8);
        // the tampered encoding either fails to parse or fails to verify
        match SchnorrSignature::from_bytes(&tampered) {
            Ok(sig) => assert!(!schnorr::verify(&sig, message, &public)),
            Err(_) => {}
        }
    }
}

#[test]
fn verification_rejects_wrong_key() {
    let mut csprng = OsRng;
    let secret = SecretKey::generate(&mut csprng);
    let other = SecretKey::generate(&mut csprng);
    let message = b"whose key is it anyway";
    let signature = schnorr::sign(message, &secret, &mut csprng).unwrap();
    assert!(!schnorr::verify(
        &signature,
        message,
        &XOnlyPublicKey::from_secret(&other)
    ));
}

#[test]
fn unliftable_public_key_fails_verification_not_parsing() {
    // x = 5 is not the x-coordinate of any curve point
    let mut bytes = [0u8; 32];
    bytes[31] = 5;
    let public = XOnlyPublicKey::from_bytes(&bytes).unwrap();

    let mut csprng = OsRng;
    let secret = SecretKey::generate(&mut csprng);
    let message = b"no such point";
    let signature = schnorr::sign(message, &secret, &mut csprng).unwrap();
    assert!(!schnorr::verify(&signature, message, &public));
}

#[test]
fn deterministic_given_fixed_aux() {
    let secret = SecretKey::from_hex(
        "000000000000000000000000000000000000000000000000000000000000002a",
    )
    .unwrap();
    let message = b"determinism";
    let first = schnorr::sign_with_aux_rand(message, &secret, &[7; 32]).unwrap();
    let second = schnorr::sign_with_aux_rand(message, &secret, &[7; 32]).unwrap();
    let third = schnorr::sign_with_aux_rand(message, &secret, &[8; 32]).unwrap();
    assert_eq!(first.to_bytes(), second.to_bytes());
    assert_ne!(first.to_bytes(), third.to_bytes());
}
