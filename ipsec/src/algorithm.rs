// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Encryption and authentication algorithms, with the codes the dataplane knows them by.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} algorithm code {code}")]
pub struct UnknownAlgorithm {
    pub kind: &'static str,
    pub code: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CryptoAlgorithm {
    #[default]
    None,
    AesCbc128,
    AesCbc192,
    AesCbc256,
    DesCbc,
}

impl CryptoAlgorithm {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            CryptoAlgorithm::None => 0,
            CryptoAlgorithm::AesCbc128 => 1,
            CryptoAlgorithm::AesCbc192 => 2,
            CryptoAlgorithm::AesCbc256 => 3,
            CryptoAlgorithm::DesCbc => 4,
        }
    }
}

impl TryFrom<u8> for CryptoAlgorithm {
    type Error = UnknownAlgorithm;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CryptoAlgorithm::None),
            1 => Ok(CryptoAlgorithm::AesCbc128),
            2 => Ok(CryptoAlgorithm::AesCbc192),
            3 => Ok(CryptoAlgorithm::AesCbc256),
            4 => Ok(CryptoAlgorithm::DesCbc),
            code => Err(UnknownAlgorithm {
                kind: "encryption",
                code,
            }),
        }
    }
}

impl Display for CryptoAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CryptoAlgorithm::None => "none",
            CryptoAlgorithm::AesCbc128 => "aes-cbc-128",
            CryptoAlgorithm::AesCbc192 => "aes-cbc-192",
            CryptoAlgorithm::AesCbc256 => "aes-cbc-256",
            CryptoAlgorithm::DesCbc => "des-cbc",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IntegrityAlgorithm {
    #[default]
    None,
    HmacMd596,
    HmacSha196,
}

impl IntegrityAlgorithm {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            IntegrityAlgorithm::None => 0,
            IntegrityAlgorithm::HmacMd596 => 1,
            IntegrityAlgorithm::HmacSha196 => 2,
        }
    }
}

impl TryFrom<u8> for IntegrityAlgorithm {
    type Error = UnknownAlgorithm;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(IntegrityAlgorithm::None),
            1 => Ok(IntegrityAlgorithm::HmacMd596),
            2 => Ok(IntegrityAlgorithm::HmacSha196),
            code => Err(UnknownAlgorithm {
                kind: "integrity",
                code,
            }),
        }
    }
}

impl Display for IntegrityAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IntegrityAlgorithm::None => "none",
            IntegrityAlgorithm::HmacMd596 => "hmac-md5-96",
            IntegrityAlgorithm::HmacSha196 => "hmac-sha1-96",
        };
        write!(f, "{name}")
    }
}
