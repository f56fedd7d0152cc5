//! Cryptographic primitives for Plutus
//!
//! Thin wrappers over the curve crates used for account derivation:
//! - SLIP-0010 hardened derivation over the ed25519 master key
//! - Ed25519 public keys (Solana)
//! - secp256k1 public keys (Ethereum)

pub mod curves;

pub use curves::{
    CurveError, Ed25519Curve, EllipticCurve, ExtendedKey, KeyDerivation, Secp256k1Curve,
};
