use ring::digest::{Context, SHA256};

use crate::error::{NyzoError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, the unit every wire timestamp uses
pub fn current_timestamp() -> Result<u64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| NyzoError::Crypto(format!("System time error: {e}")))?
        .as_millis();

    if duration > u64::MAX as u128 {
        return Err(NyzoError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as u64)
}

pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    let mut output = [0u8; 32];
    output.copy_from_slice(digest.as_ref());
    output
}

/// SHA-256 applied twice; block hashes, balance-list hashes and sender-data
/// digests all use this form
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256_digest(&sha256_digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_encoding::HEXLOWER;

    #[test]
    fn test_single_sha256_vectors() {
        assert_eq!(
            HEXLOWER.encode(&sha256_digest(b"hello")),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            HEXLOWER.encode(&sha256_digest(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_double_sha256_vectors() {
        assert_eq!(
            HEXLOWER.encode(&double_sha256(b"hello")),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
        assert_eq!(
            HEXLOWER.encode(&double_sha256(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_current_timestamp_is_milliseconds() {
        let ts = current_timestamp().unwrap();
        // later than 2020-01-01 in ms, earlier than year 2200
        assert!(ts > 1_577_836_800_000);
        assert!(ts < 7_258_118_400_000);
    }
}
