use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Wei per display unit of the native asset.
const WEI_PER_UNIT: u128 = 1_000_000_000_000_000_000;

/// One step of the 4-fractional-digit display scale.
const DISPLAY_STEP: u128 = WEI_PER_UNIT / 10_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    #[error("Missing 0x prefix")]
    Prefix,

    #[error("Invalid hex encoding")]
    Encoding,

    #[error("Invalid data length")]
    Length,
}

/// A 20-byte account address in its 0x-prefixed hex string form.
///
/// Parsing enforces the 42-character shape, so [`Address::shortened`] can
/// slice unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub const LENGTH: usize = 42;

    /// First 6 characters, an ellipsis, and the last 4 characters.
    /// Always 13 characters long.
    pub fn shortened(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = DecodingError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        let digits = val
            .strip_prefix("0x")
            .or_else(|| val.strip_prefix("0X"))
            .ok_or(DecodingError::Prefix)?;

        if val.len() != Self::LENGTH {
            return Err(DecodingError::Length);
        }

        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DecodingError::Encoding);
        }

        Ok(Self(val.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = DecodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(val: Address) -> Self {
        val.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chain identifier, parsed from and rendered as the EIP-695 hex string
/// (`"0xa869"`). Equality is numeric, so mixed-case inputs compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl FromStr for ChainId {
    type Err = DecodingError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        let digits = val
            .strip_prefix("0x")
            .or_else(|| val.strip_prefix("0X"))
            .ok_or(DecodingError::Prefix)?;

        if digits.is_empty() {
            return Err(DecodingError::Length);
        }

        u64::from_str_radix(digits, 16).map(Self).map_err(|_| DecodingError::Encoding)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?.parse().map_err(de::Error::custom)
    }
}

/// A native-asset quantity in wei, parsed from a hex quantity string.
///
/// `Display` renders the 1e18-scaled value with exactly 4 fractional digits,
/// rounding half away from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wei(pub u128);

impl FromStr for Wei {
    type Err = DecodingError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        let digits = val
            .strip_prefix("0x")
            .or_else(|| val.strip_prefix("0X"))
            .ok_or(DecodingError::Prefix)?;

        if digits.is_empty() {
            return Err(DecodingError::Length);
        }

        u128::from_str_radix(digits, 16).map(Self).map_err(|_| DecodingError::Encoding)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scaled = (self.0 + DISPLAY_STEP / 2) / DISPLAY_STEP;
        write!(f, "{}.{:04}", scaled / 10_000, scaled % 10_000)
    }
}
