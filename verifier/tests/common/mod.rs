// Copyright (c) 2023 The MobileCoin Foundation

//! Builds DER certificates for tests, signed with seeded P-256 keys.

#![allow(dead_code)]

use mc_x509_verifier::{Certificate, FixedClock, Timestamp};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const LEAF_CERT: &str = include_str!("../../data/tests/leaf_cert.pem");
pub const PROCESSOR_CA: &str = include_str!("../../data/tests/processor_ca.pem");
pub const ROOT_CA: &str = include_str!("../../data/tests/root_ca.pem");
/// RSA code signing CA, signed with SHA-1 by [`VERISIGN_G5_CA`]
pub const CODE_SIGNING_CA: &str = include_str!("../../data/tests/code_signing_ca.pem");
/// Self-signed RSA root, signed with SHA-1
pub const VERISIGN_G5_CA: &str = include_str!("../../data/tests/verisign_g5_ca.pem");

pub const ECDSA_WITH_SHA256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02];
pub const ECDSA_WITH_SHA384: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x03];
const EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];
const PRIME256V1: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
const COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];
pub const BASIC_CONSTRAINTS: &[u8] = &[0x55, 0x1D, 0x13];
pub const KEY_USAGE: &[u8] = &[0x55, 0x1D, 0x0F];

/// Key usage bits as they appear in the first octet of the BIT STRING
pub const DIGITAL_SIGNATURE: u8 = 0x80;
pub const KEY_CERT_SIGN: u8 = 0x04;
pub const CRL_SIGN: u8 = 0x02;

/// 2024-01-01T00:00:00Z, inside the default validity of generated
/// certificates.
pub const NOW: i64 = 1_704_067_200;

pub fn clock() -> FixedClock {
    FixedClock::from_unix_seconds(NOW)
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn der_from_pem(pem: &str) -> Vec<u8> {
    let pem = textwrap::dedent(pem);
    let (_, der) = pem_rfc7468::decode_vec(pem.trim().as_bytes()).expect("Failed decoding PEM");
    der
}

pub fn key(seed: u64) -> SigningKey {
    let mut rng = StdRng::seed_from_u64(seed);
    SigningKey::random(&mut rng)
}

pub fn timestamp(year: i64, month: u32, day: u32) -> Timestamp {
    Timestamp::from_ymd_hms(year, month, day, 0, 0, 0).expect("Failed creating time")
}

/// Encode a DER element with a definite length.
pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xFF {
        out.extend([0x81, len as u8]);
    } else if len <= 0xFFFF {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    } else {
        out.extend([0x83, (len >> 16) as u8, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

pub fn sequence(elements: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &elements.concat())
}

pub fn name(common_name: &str) -> Vec<u8> {
    let attribute = sequence(&[tlv(0x06, COMMON_NAME), tlv(0x0C, common_name.as_bytes())]);
    sequence(&[tlv(0x31, &attribute)])
}

/// A name with the common name as a UniversalString
pub fn universal_string_name(common_name: &str) -> Vec<u8> {
    let ucs4 = common_name
        .chars()
        .flat_map(|c| u32::from(c).to_be_bytes())
        .collect::<Vec<_>>();
    let attribute = sequence(&[tlv(0x06, COMMON_NAME), tlv(0x1C, &ucs4)]);
    sequence(&[tlv(0x31, &attribute)])
}

fn time(timestamp: Timestamp, generalized: bool) -> Vec<u8> {
    // RFC 3339 without the separators is GeneralizedTime
    let text = timestamp
        .to_string()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() && *c != 'T')
        .collect::<String>();
    if generalized {
        tlv(0x18, text.as_bytes())
    } else {
        tlv(0x17, &text.as_bytes()[2..])
    }
}

fn subject_public_key_info(key: &SigningKey) -> Vec<u8> {
    let point = key.verifying_key().to_encoded_point(false);
    let mut bits = vec![0x00];
    bits.extend_from_slice(point.as_bytes());
    sequence(&[
        sequence(&[tlv(0x06, EC_PUBLIC_KEY), tlv(0x06, PRIME256V1)]),
        tlv(0x03, &bits),
    ])
}

fn extension(oid: &[u8], critical: bool, value: &[u8]) -> Vec<u8> {
    let mut fields = vec![tlv(0x06, oid)];
    if critical {
        fields.push(tlv(0x01, &[0xFF]));
    }
    fields.push(tlv(0x04, value));
    sequence(&fields)
}

/// Builder for test certificates.
///
/// Defaults to a self-signed version 3 certificate valid from 2020 to 2030
/// without extensions.
#[derive(Debug, Clone)]
pub struct CertificateBuilder<'a> {
    subject: String,
    subject_key: &'a SigningKey,
    issuer: String,
    issuer_key: &'a SigningKey,
    serial: Vec<u8>,
    not_before: Timestamp,
    not_after: Timestamp,
    generalized_time: bool,
    universal_string_names: bool,
    extensions: Vec<Vec<u8>>,
    outer_algorithm: Vec<u8>,
}

impl<'a> CertificateBuilder<'a> {
    pub fn new(subject: &str, subject_key: &'a SigningKey) -> Self {
        Self {
            subject: subject.to_string(),
            subject_key,
            issuer: subject.to_string(),
            issuer_key: subject_key,
            serial: vec![0x01],
            not_before: timestamp(2020, 1, 1),
            not_after: timestamp(2030, 1, 1),
            generalized_time: false,
            universal_string_names: false,
            extensions: Vec::new(),
            outer_algorithm: ECDSA_WITH_SHA256.to_vec(),
        }
    }

    /// A CA certificate with critical basic constraints and key usage
    pub fn new_ca(subject: &str, subject_key: &'a SigningKey, path_len: Option<u32>) -> Self {
        Self::new(subject, subject_key)
            .basic_constraints(true, path_len)
            .key_usage(KEY_CERT_SIGN | CRL_SIGN)
    }

    pub fn issued_by(mut self, issuer: &str, issuer_key: &'a SigningKey) -> Self {
        self.issuer = issuer.to_string();
        self.issuer_key = issuer_key;
        self
    }

    pub fn serial(mut self, serial: &[u8]) -> Self {
        self.serial = serial.to_vec();
        self
    }

    pub fn validity(mut self, not_before: Timestamp, not_after: Timestamp) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn generalized_time(mut self) -> Self {
        self.generalized_time = true;
        self
    }

    /// Encode the issuer and subject common names as UniversalString
    pub fn universal_string_names(mut self) -> Self {
        self.universal_string_names = true;
        self
    }

    pub fn basic_constraints(self, ca: bool, path_len: Option<u32>) -> Self {
        let mut fields = Vec::new();
        if ca {
            fields.push(tlv(0x01, &[0xFF]));
        }
        if let Some(path_len) = path_len {
            let bytes = path_len.to_be_bytes();
            let first = bytes
                .iter()
                .position(|b| *b != 0)
                .unwrap_or(bytes.len() - 1);
            let mut value = bytes[first..].to_vec();
            if value[0] & 0x80 != 0 {
                value.insert(0, 0x00);
            }
            fields.push(tlv(0x02, &value));
        }
        self.extension(BASIC_CONSTRAINTS, true, &sequence(&fields))
    }

    /// Critical key usage with `bits` as the first octet
    pub fn key_usage(self, bits: u8) -> Self {
        let unused = if bits == 0 { 0 } else { bits.trailing_zeros() as u8 };
        let value = if bits == 0 {
            tlv(0x03, &[0x00])
        } else {
            tlv(0x03, &[unused, bits])
        };
        self.extension(KEY_USAGE, true, &value)
    }

    pub fn extension(mut self, oid: &[u8], critical: bool, value: &[u8]) -> Self {
        self.extensions.push(extension(oid, critical, value));
        self
    }

    /// Use a different signature algorithm outside the TBS certificate
    pub fn outer_algorithm(mut self, oid: &[u8]) -> Self {
        self.outer_algorithm = oid.to_vec();
        self
    }

    pub fn tbs(&self) -> Vec<u8> {
        let encode_name = if self.universal_string_names {
            universal_string_name
        } else {
            name
        };
        let mut fields = vec![
            tlv(0xA0, &tlv(0x02, &[0x02])),
            tlv(0x02, &self.serial),
            sequence(&[tlv(0x06, ECDSA_WITH_SHA256)]),
            encode_name(&self.issuer),
            sequence(&[
                time(self.not_before, self.generalized_time),
                time(self.not_after, self.generalized_time),
            ]),
            encode_name(&self.subject),
            subject_public_key_info(self.subject_key),
        ];
        if !self.extensions.is_empty() {
            fields.push(tlv(0xA3, &sequence(&self.extensions)));
        }
        sequence(&fields)
    }

    pub fn der(&self) -> Vec<u8> {
        let tbs = self.tbs();
        let signature: Signature = self.issuer_key.sign(&tbs);
        let mut bits = vec![0x00];
        bits.extend_from_slice(signature.to_der().as_bytes());
        sequence(&[
            tbs,
            sequence(&[tlv(0x06, &self.outer_algorithm)]),
            tlv(0x03, &bits),
        ])
    }

    pub fn build(&self) -> Certificate {
        Certificate::from_der(&self.der()).expect("Failed building certificate")
    }
}

/// Flip a bit in the last octet of the signature.
pub fn flip_signature_bit(der: &mut [u8]) {
    let last = der.len() - 1;
    der[last] ^= 0x01;
}
