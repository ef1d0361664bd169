// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON Web Key types and public key material decoding.
//!
//! Public keys arrive from the key registry in one of three shapes:
//! - bare base64 for Ed25519 policies
//! - PEM wrapping a SubjectPublicKeyInfo (RSA, EC or Ed25519)
//! - an already-typed RSA public key
//!
//! Each shape decodes into [`PublicKeyMaterial`], which renders the
//! algorithm-specific JWK members.

use base64::{
	engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD as BASE64URL},
	Engine,
};
use ed25519_dalek::VerifyingKey;
use rsa::pkcs8::spki::{self, ObjectIdentifier, SubjectPublicKeyInfoRef};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type of a serialized key set.
pub const JWK_SET_CONTENT_TYPE: &str = "application/jwk-set+json";

/// The only key use this backend publishes.
pub const KEY_USE_SIGNATURE: &str = "sig";

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const OID_SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const OID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const OID_SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// SEC1 tag for an uncompressed curve point.
const SEC1_UNCOMPRESSED: u8 = 0x04;

// =============================================================================
// Key Set Types
// =============================================================================

/// JSON Web Key Set for public key distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
	pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Find a key by its `kid`.
	pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
		self.keys.iter().find(|key| key.kid == kid)
	}
}

/// A single JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
	pub kid: String,
	pub alg: String,
	#[serde(rename = "use")]
	pub key_use: String,
	#[serde(flatten)]
	pub params: JwkParams,
}

/// Key-type specific JWK members, tagged by `kty`.
///
/// Binary members are base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum JwkParams {
	#[serde(rename = "RSA")]
	Rsa { n: String, e: String },
	#[serde(rename = "EC")]
	Ec { crv: String, x: String, y: String },
	#[serde(rename = "OKP")]
	Okp { crv: String, x: String },
}

// =============================================================================
// Key Material
// =============================================================================

/// Errors decoding a single key version's public material.
#[derive(Debug, Error)]
pub enum KeyMaterialError {
	#[error("invalid base64 public key: {0}")]
	Base64(#[from] base64::DecodeError),

	#[error("invalid Ed25519 public key: {0}")]
	Ed25519(#[from] ed25519_dalek::SignatureError),

	#[error("invalid PEM block: {0}")]
	Pem(#[from] pem::PemError),

	#[error("invalid SubjectPublicKeyInfo: {0}")]
	Spki(spki::Error),

	#[error("invalid RSA public key: {0}")]
	Rsa(spki::Error),

	#[error("unsupported public key algorithm: {0}")]
	UnsupportedAlgorithm(ObjectIdentifier),

	#[error("unsupported elliptic curve: {0}")]
	UnsupportedCurve(String),

	#[error("malformed elliptic curve point: {0}")]
	MalformedPoint(String),
}

/// Named curves accepted for EC keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
	P256,
	P384,
	P521,
}

impl EcCurve {
	fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
		if oid == OID_SECP256R1 {
			Some(EcCurve::P256)
		} else if oid == OID_SECP384R1 {
			Some(EcCurve::P384)
		} else if oid == OID_SECP521R1 {
			Some(EcCurve::P521)
		} else {
			None
		}
	}

	/// The `crv` member value.
	pub fn jwk_name(&self) -> &'static str {
		match self {
			EcCurve::P256 => "P-256",
			EcCurve::P384 => "P-384",
			EcCurve::P521 => "P-521",
		}
	}

	/// Byte length of one affine coordinate.
	pub fn coordinate_len(&self) -> usize {
		match self {
			EcCurve::P256 => 32,
			EcCurve::P384 => 48,
			EcCurve::P521 => 66,
		}
	}
}

/// Decoded public key, one variant per key family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyMaterial {
	Ed25519(VerifyingKey),
	Rsa(RsaPublicKey),
	Ec { curve: EcCurve, x: Vec<u8>, y: Vec<u8> },
}

impl PublicKeyMaterial {
	/// Render the JWK members for this key.
	pub fn to_jwk_params(&self) -> JwkParams {
		match self {
			PublicKeyMaterial::Ed25519(key) => JwkParams::Okp {
				crv: "Ed25519".to_string(),
				x: BASE64URL.encode(key.as_bytes()),
			},
			PublicKeyMaterial::Rsa(key) => JwkParams::Rsa {
				n: BASE64URL.encode(key.n().to_bytes_be()),
				e: BASE64URL.encode(key.e().to_bytes_be()),
			},
			PublicKeyMaterial::Ec { curve, x, y } => JwkParams::Ec {
				crv: curve.jwk_name().to_string(),
				x: BASE64URL.encode(x),
				y: BASE64URL.encode(y),
			},
		}
	}
}

impl From<RsaPublicKey> for PublicKeyMaterial {
	fn from(key: RsaPublicKey) -> Self {
		PublicKeyMaterial::Rsa(key)
	}
}

/// Decode a bare standard-base64 Ed25519 public key.
pub fn decode_ed25519_base64(encoded: &str) -> Result<PublicKeyMaterial, KeyMaterialError> {
	let bytes = BASE64.decode(encoded.trim())?;
	let key = VerifyingKey::try_from(bytes.as_slice())?;
	Ok(PublicKeyMaterial::Ed25519(key))
}

/// Decode the first PEM block of `encoded` as a SubjectPublicKeyInfo.
pub fn decode_pem_public_key(encoded: &str) -> Result<PublicKeyMaterial, KeyMaterialError> {
	let block = pem::parse(encoded)?;
	decode_spki_der(block.contents())
}

/// Parse a DER SubjectPublicKeyInfo, dispatching on its algorithm OID.
pub fn decode_spki_der(der: &[u8]) -> Result<PublicKeyMaterial, KeyMaterialError> {
	let info = SubjectPublicKeyInfoRef::try_from(der).map_err(KeyMaterialError::Spki)?;

	let algorithm = info.algorithm.oid;
	if algorithm == OID_RSA_ENCRYPTION {
		let key = RsaPublicKey::from_public_key_der(der).map_err(KeyMaterialError::Rsa)?;
		Ok(PublicKeyMaterial::Rsa(key))
	} else if algorithm == OID_EC_PUBLIC_KEY {
		let curve_oid = info
			.algorithm
			.parameters_oid()
			.map_err(KeyMaterialError::Spki)?;
		let curve = EcCurve::from_oid(curve_oid)
			.ok_or_else(|| KeyMaterialError::UnsupportedCurve(curve_oid.to_string()))?;
		decode_ec_point(curve, subject_key_bytes(&info)?)
	} else if algorithm == OID_ED25519 {
		let key = VerifyingKey::try_from(subject_key_bytes(&info)?)?;
		Ok(PublicKeyMaterial::Ed25519(key))
	} else {
		Err(KeyMaterialError::UnsupportedAlgorithm(algorithm))
	}
}

fn subject_key_bytes<'a>(info: &SubjectPublicKeyInfoRef<'a>) -> Result<&'a [u8], KeyMaterialError> {
	info
		.subject_public_key
		.as_bytes()
		.ok_or_else(|| KeyMaterialError::MalformedPoint("unaligned bit string".into()))
}

/// Split an uncompressed SEC1 point into affine coordinates.
fn decode_ec_point(curve: EcCurve, point: &[u8]) -> Result<PublicKeyMaterial, KeyMaterialError> {
	let len = curve.coordinate_len();
	match point.split_first() {
		Some((&SEC1_UNCOMPRESSED, coords)) if coords.len() == 2 * len => {
			let (x, y) = coords.split_at(len);
			Ok(PublicKeyMaterial::Ec {
				curve,
				x: x.to_vec(),
				y: y.to_vec(),
			})
		}
		Some((&SEC1_UNCOMPRESSED, coords)) => Err(KeyMaterialError::MalformedPoint(format!(
			"expected {} coordinate bytes for {}, got {}",
			2 * len,
			curve.jwk_name(),
			coords.len()
		))),
		Some((tag, _)) => Err(KeyMaterialError::MalformedPoint(format!(
			"unsupported point encoding 0x{tag:02x}"
		))),
		None => Err(KeyMaterialError::MalformedPoint("empty point".into())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const RSA_PEM: &str = include_str!("../testdata/rsa2048_public.pem");
	const P256_PEM: &str = include_str!("../testdata/p256_public.pem");
	const P384_PEM: &str = include_str!("../testdata/p384_public.pem");
	const ED25519_PEM: &str = include_str!("../testdata/ed25519_public.pem");
	const X25519_PEM: &str = include_str!("../testdata/x25519_public.pem");
	const ED25519_BASE64: &str = "I8+nrLGdukTSvPwFZVQ/TKSE4EELqjTpKZimJ+bClo8=";

	#[test]
	fn decodes_rsa_spki() {
		let material = decode_pem_public_key(RSA_PEM).unwrap();
		match material.to_jwk_params() {
			JwkParams::Rsa { n, e } => {
				assert_eq!(e, "AQAB");
				assert!(n.starts_with("kWP85F-i_g0lqcRnS92yBy83cD3N"));
				assert!(n.ends_with("SLcuB-7Q"));
			}
			other => panic!("expected RSA params, got {other:?}"),
		}
	}

	#[test]
	fn decodes_p256_spki() {
		let material = decode_pem_public_key(P256_PEM).unwrap();
		assert_eq!(
			material.to_jwk_params(),
			JwkParams::Ec {
				crv: "P-256".into(),
				x: "PnDFk2oQF6TtH98gPN1myuNXnv3PtvneuNhQYeT3o_M".into(),
				y: "7eX4U17FnaNcXzIiMSVAmFpe8v-Hsz6q94Ha8Z4e20k".into(),
			}
		);
	}

	#[test]
	fn decodes_p384_spki() {
		let material = decode_pem_public_key(P384_PEM).unwrap();
		assert_eq!(
			material.to_jwk_params(),
			JwkParams::Ec {
				crv: "P-384".into(),
				x: "f02VkwPUUba9ggNk3_Mgf3DIytiNsnKp_int7l1l9C2WehSC_Rk_1RYO7FvcU1t1".into(),
				y: "KX_VuiVQm9GYifafb1JfWQjRkChJkI2cIXhwuTYVOqKhOtv56AZoC6lP9GqqUfL2".into(),
			}
		);
	}

	#[test]
	fn ed25519_pem_and_base64_agree() {
		let from_pem = decode_pem_public_key(ED25519_PEM).unwrap();
		let from_b64 = decode_ed25519_base64(ED25519_BASE64).unwrap();
		assert_eq!(from_pem, from_b64);
		assert_eq!(
			from_b64.to_jwk_params(),
			JwkParams::Okp {
				crv: "Ed25519".into(),
				x: "I8-nrLGdukTSvPwFZVQ_TKSE4EELqjTpKZimJ-bClo8".into(),
			}
		);
	}

	#[test]
	fn rejects_unsupported_algorithm() {
		let err = decode_pem_public_key(X25519_PEM).unwrap_err();
		assert!(matches!(err, KeyMaterialError::UnsupportedAlgorithm(_)));
	}

	#[test]
	fn rejects_garbage_pem() {
		let err = decode_pem_public_key("not a pem block").unwrap_err();
		assert!(matches!(err, KeyMaterialError::Pem(_)));
	}

	#[test]
	fn rejects_pem_with_garbage_body() {
		let bogus = "-----BEGIN PUBLIC KEY-----\naGVsbG8gd29ybGQ=\n-----END PUBLIC KEY-----\n";
		let err = decode_pem_public_key(bogus).unwrap_err();
		assert!(matches!(err, KeyMaterialError::Spki(_)));
	}

	#[test]
	fn rejects_short_ed25519_key() {
		let err = decode_ed25519_base64("AAAA").unwrap_err();
		assert!(matches!(err, KeyMaterialError::Ed25519(_)));
	}

	#[test]
	fn rejects_invalid_base64() {
		let err = decode_ed25519_base64("***").unwrap_err();
		assert!(matches!(err, KeyMaterialError::Base64(_)));
	}

	#[test]
	fn rejects_compressed_ec_point() {
		let mut point = vec![0x02];
		point.extend_from_slice(&[1u8; 32]);
		let err = decode_ec_point(EcCurve::P256, &point).unwrap_err();
		assert!(matches!(err, KeyMaterialError::MalformedPoint(_)));
	}

	#[test]
	fn rejects_truncated_ec_point() {
		let mut point = vec![SEC1_UNCOMPRESSED];
		point.extend_from_slice(&[1u8; 40]);
		let err = decode_ec_point(EcCurve::P256, &point).unwrap_err();
		assert!(matches!(err, KeyMaterialError::MalformedPoint(_)));
	}

	#[test]
	fn jwk_serializes_with_kty_and_use() {
		let jwk = JsonWebKey {
			kid: "k1".into(),
			alg: "EdDSA".into(),
			key_use: KEY_USE_SIGNATURE.into(),
			params: JwkParams::Okp {
				crv: "Ed25519".into(),
				x: "abc".into(),
			},
		};
		let value = serde_json::to_value(&jwk).unwrap();
		assert_eq!(value["kty"], "OKP");
		assert_eq!(value["use"], "sig");
		assert_eq!(value["kid"], "k1");
		assert_eq!(value["crv"], "Ed25519");

		let back: JsonWebKey = serde_json::from_value(value).unwrap();
		assert_eq!(back, jwk);
	}
}
