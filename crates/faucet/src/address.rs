//! EVM address parsing and formatting

pub use ethabi::Address;

/// Parse a 20-byte hex address, `0x` prefix optional.
///
/// All-lowercase and all-uppercase digits are accepted as-is; mixed case must
/// carry a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let bytes = hex::decode(digits).ok()?;
    let address = Address::from_slice(&bytes);

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address)[2..] != *digits {
        return None;
    }

    Some(address)
}

/// Lowercase `0x`-prefixed hex
pub fn to_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// EIP-55 mixed-case checksum encoding
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak_hash::keccak(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash.0[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn test_checksum_roundtrip() {
        let address = parse_address(CHECKSUMMED).unwrap();
        assert_eq!(to_checksum(&address), CHECKSUMMED);
        assert_eq!(to_hex(&address), CHECKSUMMED.to_lowercase());
    }

    #[test]
    fn test_single_case_accepted() {
        assert!(parse_address(&CHECKSUMMED.to_lowercase()).is_some());
        assert!(parse_address(&format!("0x{}", CHECKSUMMED[2..].to_uppercase())).is_some());
        assert!(parse_address(&CHECKSUMMED[2..].to_lowercase()).is_some());
    }

    #[test]
    fn test_bad_checksum_rejected() {
        assert!(parse_address("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_none());
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(parse_address("not-an-address").is_none());
        assert!(parse_address("").is_none());
        assert!(parse_address("0x1234").is_none());
        assert!(parse_address("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_none());
    }
}
