//! Salsa20 layer of the GT7 stream.
//!
//! Every datagram carries its own IV seed, so decryption is stateless.
//! Plaintext is never logged here.

use byteorder::{ByteOrder, LittleEndian};
use ingest_core::IngestError;
use cipher::{KeyIvInit, StreamCipher};
use salsa20::Salsa20;

/// First word of every valid plaintext ("0S7G" read little-endian).
pub const MAGIC: u32 = 0x4737_5330;

const KEY_SOURCE: &[u8; 38] = b"Simulator Interface Packet GT7 ver 0.0";
const IV_MASK: u32 = 0xDEAD_BEAF;

/// Raw offset of the little-endian IV seed.
pub const SEED_OFFSET: usize = 0x40;
/// Shortest datagram that still carries a seed.
pub const MIN_CIPHERTEXT_LEN: usize = SEED_OFFSET + 4;

fn key() -> [u8; 32] {
    let mut key = [0u8; 32];
    key.copy_from_slice(&KEY_SOURCE[..32]);
    key
}

fn nonce(seed: u32) -> [u8; 8] {
    let mut nonce = [0u8; 8];
    LittleEndian::write_u32(&mut nonce[0..4], seed ^ IV_MASK);
    LittleEndian::write_u32(&mut nonce[4..8], seed);
    nonce
}

fn apply_keystream(buf: &mut [u8], seed: u32) {
    let mut cipher = Salsa20::new(&key().into(), &nonce(seed).into());
    cipher.apply_keystream(buf);
}

fn check_len(len: usize) -> Result<(), IngestError> {
    if len < MIN_CIPHERTEXT_LEN {
        return Err(IngestError::TruncatedPacket { needed: MIN_CIPHERTEXT_LEN, actual: len });
    }
    Ok(())
}

/// Seed the console stamped into a raw datagram.
pub fn seed_of(datagram: &[u8]) -> Result<u32, IngestError> {
    check_len(datagram.len())?;
    Ok(LittleEndian::read_u32(&datagram[SEED_OFFSET..MIN_CIPHERTEXT_LEN]))
}

/// Decrypts one datagram and verifies the magic word.
///
/// The output has the same length as the input. Bytes 0x40..0x44 of the
/// output are keystream noise over the seed and carry no telemetry.
pub fn decrypt(datagram: &[u8]) -> Result<Vec<u8>, IngestError> {
    let seed = seed_of(datagram)?;
    let mut plain = datagram.to_vec();
    apply_keystream(&mut plain, seed);

    let found = LittleEndian::read_u32(&plain[0..4]);
    if found != MAGIC {
        return Err(IngestError::Decryption { found });
    }
    Ok(plain)
}

/// Produces a datagram the console would send for `plain` under `seed`.
///
/// Used for replay and for tests. The seed overwrites bytes 0x40..0x44, so
/// a round trip reproduces `plain` everywhere except that window.
pub fn encrypt(plain: &[u8], seed: u32) -> Result<Vec<u8>, IngestError> {
    check_len(plain.len())?;
    let mut out = plain.to_vec();
    apply_keystream(&mut out, seed);
    LittleEndian::write_u32(&mut out[SEED_OFFSET..MIN_CIPHERTEXT_LEN], seed);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plaintext(len: usize) -> Vec<u8> {
        let mut buf: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
        LittleEndian::write_u32(&mut buf[0..4], MAGIC);
        buf
    }

    fn outside_seed_window(buf: &[u8]) -> Vec<u8> {
        let mut out = buf[..SEED_OFFSET].to_vec();
        out.extend_from_slice(&buf[MIN_CIPHERTEXT_LEN..]);
        out
    }

    #[test]
    fn test_key_is_truncated_source() {
        assert_eq!(&key(), b"Simulator Interface Packet GT7 v");
    }

    #[test]
    fn test_nonce_layout() {
        let n = nonce(0x0102_0304);
        assert_eq!(LittleEndian::read_u32(&n[0..4]), 0x0102_0304 ^ 0xDEAD_BEAF);
        assert_eq!(&n[4..8], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_round_trip() {
        let plain = plaintext(296);
        let wire = encrypt(&plain, 0x1234_5678).unwrap();
        assert_eq!(wire.len(), plain.len());
        assert_ne!(wire[..4], plain[..4]);
        assert_eq!(seed_of(&wire).unwrap(), 0x1234_5678);

        let back = decrypt(&wire).unwrap();
        assert_eq!(back.len(), plain.len());
        assert_eq!(outside_seed_window(&back), outside_seed_window(&plain));
    }

    #[test]
    fn test_bad_magic() {
        let mut plain = plaintext(296);
        LittleEndian::write_u32(&mut plain[0..4], 0xCAFE_F00D);
        let wire = encrypt(&plain, 7).unwrap();
        match decrypt(&wire) {
            Err(IngestError::Decryption { found }) => assert_eq!(found, 0xCAFE_F00D),
            other => panic!("expected decryption error, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_fails_magic_check() {
        let err = decrypt(&[0u8; 296]).unwrap_err();
        assert!(matches!(err, IngestError::Decryption { .. }));
    }

    #[test]
    fn test_too_short_for_seed() {
        let err = decrypt(&[0u8; 0x43]).unwrap_err();
        assert!(matches!(err, IngestError::TruncatedPacket { needed: 0x44, actual: 0x43 }));
        assert!(encrypt(&[0u8; 10], 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(seed in any::<u32>(), body in proptest::collection::vec(any::<u8>(), 0x40..400)) {
            let mut plain = body;
            LittleEndian::write_u32(&mut plain[0..4], MAGIC);
            if plain.len() < MIN_CIPHERTEXT_LEN {
                plain.resize(MIN_CIPHERTEXT_LEN, 0);
            }
            let back = decrypt(&encrypt(&plain, seed).unwrap()).unwrap();
            prop_assert_eq!(outside_seed_window(&back), outside_seed_window(&plain));
        }
    }
}
