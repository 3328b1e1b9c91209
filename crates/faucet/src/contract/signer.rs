//! Faucet account key and EIP-155 legacy transaction signing

use crate::address::Address;
use crate::error::{FaucetError, FaucetResult, NetworkError};
use k256::ecdsa::SigningKey;
use rlp::RlpStream;

/// Unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    fn append_fields(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&trim_leading_zeros(&self.gas_price.to_be_bytes()));
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&trim_leading_zeros(&self.value.to_be_bytes()));
        stream.append(&self.data);
    }

    /// RLP payload hashed for signing (EIP-155)
    pub fn signing_payload(&self, chain_id: u64) -> Vec<u8> {
        let mut stream = RlpStream::new();
        stream.begin_list(9);
        self.append_fields(&mut stream);
        stream.append(&chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        stream.out().to_vec()
    }

    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        keccak_hash::keccak(self.signing_payload(chain_id)).0
    }
}

/// Holds the faucet's signing credential
pub struct FaucetSigner {
    signing_key: SigningKey,
    address: Address,
}

impl FaucetSigner {
    pub fn from_hex(private_key: &str) -> FaucetResult<Self> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let bytes = hex::decode(key)
            .map_err(|e| FaucetError::Configuration(format!("invalid private key: {}", e)))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| FaucetError::Configuration(format!("invalid signing key: {}", e)))?;

        // Address is the last 20 bytes of keccak(uncompressed pubkey without the 0x04 tag)
        let public_key = signing_key.verifying_key().to_encoded_point(false);
        let hash = keccak_hash::keccak(&public_key.as_bytes()[1..]);
        let address = Address::from_slice(&hash.0[12..]);

        Ok(Self {
            signing_key,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign and RLP-encode a transaction ready for `eth_sendRawTransaction`
    pub fn sign_legacy(&self, tx: &LegacyTransaction, chain_id: u64) -> Result<Vec<u8>, NetworkError> {
        let hash = tx.signing_hash(chain_id);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| NetworkError::new(format!("Signing failed: {}", e)))?;

        let sig_bytes = signature.to_bytes();
        let v = chain_id * 2 + 35 + u64::from(recovery_id.to_byte());

        let mut stream = RlpStream::new();
        stream.begin_list(9);
        tx.append_fields(&mut stream);
        stream.append(&v);
        stream.append(&trim_leading_zeros(&sig_bytes[..32]));
        stream.append(&trim_leading_zeros(&sig_bytes[32..]));
        Ok(stream.out().to_vec())
    }
}

/// RLP integers are minimal big-endian
fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}
