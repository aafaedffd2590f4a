//! Actor address validation.
//!
//! Actors are identified by bech32 account addresses. Services only need a
//! yes/no answer, so the check sits behind [`AddressCodec`] and the host
//! decides which scheme to plug in.

use crate::constants::ADDRESS_PREFIX;
use crate::error::{BlogError, Result};

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];
const CHECKSUM_LEN: usize = 6;
const MAX_ADDRESS_LEN: usize = 90;
const MAX_PAYLOAD_LEN: usize = 255;

/// Rejects malformed actor identifiers before any entity logic runs.
pub trait AddressCodec: Send + Sync {
    fn validate(&self, address: &str) -> Result<()>;
}

/// Bech32 account addresses with a fixed human-readable prefix.
#[derive(Debug, Clone)]
pub struct Bech32Codec {
    hrp: String,
}

impl Bech32Codec {
    pub fn new(hrp: impl Into<String>) -> Self {
        Self {
            hrp: hrp.into().to_ascii_lowercase(),
        }
    }

    /// Encode raw account bytes as `<hrp>1<data><checksum>`.
    pub fn encode(&self, payload: &[u8]) -> String {
        let data = to_base32(payload);
        let checksum = create_checksum(&self.hrp, &data);

        let mut out = String::with_capacity(self.hrp.len() + 1 + data.len() + CHECKSUM_LEN);
        out.push_str(&self.hrp);
        out.push('1');
        for v in data.iter().chain(checksum.iter()) {
            out.push(CHARSET[*v as usize] as char);
        }
        out
    }

    /// Decode an address back to its account bytes, verifying prefix and
    /// checksum.
    pub fn decode(&self, address: &str) -> Result<Vec<u8>> {
        if address.is_empty() {
            return Err(invalid(address, "empty address"));
        }
        if address.len() > MAX_ADDRESS_LEN {
            return Err(invalid(address, "address too long"));
        }

        let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(invalid(address, "mixed-case address"));
        }
        let lowered = address.to_ascii_lowercase();

        let sep = lowered
            .rfind('1')
            .ok_or_else(|| invalid(address, "missing separator"))?;
        let (hrp, data_part) = (&lowered[..sep], &lowered[sep + 1..]);

        if hrp != self.hrp {
            return Err(invalid(
                address,
                &format!("expected prefix '{}', got '{}'", self.hrp, hrp),
            ));
        }
        if data_part.len() < CHECKSUM_LEN {
            return Err(invalid(address, "data part too short"));
        }

        let mut values = Vec::with_capacity(data_part.len());
        for c in data_part.bytes() {
            let v = CHARSET
                .iter()
                .position(|&x| x == c)
                .ok_or_else(|| invalid(address, &format!("invalid character '{}'", c as char)))?;
            values.push(v as u8);
        }

        if !verify_checksum(hrp, &values) {
            return Err(invalid(address, "invalid checksum"));
        }

        let payload = from_base32(&values[..values.len() - CHECKSUM_LEN])
            .ok_or_else(|| invalid(address, "invalid padding"))?;
        if payload.is_empty() || payload.len() > MAX_PAYLOAD_LEN {
            return Err(invalid(address, "invalid payload length"));
        }
        Ok(payload)
    }
}

impl Default for Bech32Codec {
    fn default() -> Self {
        Self::new(ADDRESS_PREFIX)
    }
}

impl AddressCodec for Bech32Codec {
    fn validate(&self, address: &str) -> Result<()> {
        self.decode(address).map(|_| ())
    }
}

fn invalid(address: &str, reason: &str) -> BlogError {
    BlogError::InvalidArgument(format!("invalid address '{address}': {reason}"))
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(v);
        for (i, g) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
    out.extend(bytes.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 0x1f));
    out
}

fn verify_checksum(hrp: &str, values: &[u8]) -> bool {
    polymod(hrp_expand(hrp).into_iter().chain(values.iter().copied())) == 1
}

fn create_checksum(hrp: &str, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let values = hrp_expand(hrp)
        .into_iter()
        .chain(data.iter().copied())
        .chain(std::iter::repeat(0).take(CHECKSUM_LEN));
    let pm = polymod(values) ^ 1;

    let mut out = [0u8; CHECKSUM_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = ((pm >> (5 * (5 - i))) & 0x1f) as u8;
    }
    out
}

/// Regroup 8-bit bytes into 5-bit values, zero-padding the tail.
fn to_base32(data: &[u8]) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity((data.len() * 8).div_ceil(5));
    for &b in data {
        acc = ((acc << 8) | u32::from(b)) & 0xfff;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 0x1f) as u8);
        }
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 0x1f) as u8);
    }
    out
}

/// Regroup 5-bit values into bytes. Padding must be under 5 zero bits.
fn from_base32(data: &[u8]) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    for &v in data {
        acc = ((acc << 5) | u32::from(v)) & 0xfff;
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    if bits >= 5 || ((acc << (8 - bits)) & 0xff) != 0 {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = Bech32Codec::default();
        let payload = [0x42u8; 20];
        let addr = codec.encode(&payload);

        assert!(addr.starts_with("blogchain1"));
        assert_eq!(codec.decode(&addr).unwrap(), payload);
        assert!(codec.validate(&addr).is_ok());
    }

    #[test]
    fn test_uppercase_accepted() {
        let codec = Bech32Codec::default();
        let addr = codec.encode(&[7u8; 20]).to_ascii_uppercase();
        assert!(codec.validate(&addr).is_ok());
    }

    #[test]
    fn test_tampered_checksum_rejected() {
        let codec = Bech32Codec::default();
        let mut addr = codec.encode(&[1u8; 20]);
        let last = addr.pop().unwrap();
        addr.push(if last == 'q' { 'p' } else { 'q' });

        let err = codec.validate(&addr).unwrap_err();
        assert!(matches!(err, BlogError::InvalidArgument(_)));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let other = Bech32Codec::new("cosmos");
        let addr = other.encode(&[9u8; 20]);
        let err = Bech32Codec::default().validate(&addr).unwrap_err();
        assert!(err.to_string().contains("expected prefix"));
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = Bech32Codec::default();
        assert!(codec.validate("").is_err());
        assert!(codec.validate("not-an-address").is_err());
        assert!(codec.validate("blogchain1").is_err());
        assert!(codec.validate("Blogchain1qqqqqq").is_err());
    }
}
