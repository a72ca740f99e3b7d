//! BLAKE3 Verification Tests
//!
//! Known-answer tests against published BLAKE3 vectors, checked through the
//! raw crate and through `Digest`.

use treesync::tree::hasher::{self, Blake3, DigestAlgorithm};
use treesync::Digest;

const KNOWN_ANSWERS: &[(&[u8], &str)] = &[
    (
        b"",
        "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262",
    ),
    (
        b"abc",
        "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85",
    ),
];

#[test]
fn test_known_answers_from_blake3_crate() {
    for (input, expected) in KNOWN_ANSWERS {
        assert_eq!(blake3::hash(input).to_hex().as_str(), *expected);
    }
}

#[test]
fn test_known_answers_through_digest() {
    for (input, expected) in KNOWN_ANSWERS {
        let digest = Digest::make(input);
        assert_eq!(digest.to_hex(), *expected);
        assert!(!digest.is_empty());
        assert_eq!(Blake3::hash(input).as_slice(), digest.bytes().as_slice());
    }
}

#[test]
fn test_make_is_deterministic() {
    let inputs: [&[u8]; 4] = [b"", b"a", b"Hello, World!", &[0u8; 4096]];
    for input in inputs {
        assert_eq!(Digest::make(input), Digest::make(input));
    }
    assert_ne!(Digest::make("a"), Digest::make("b"));
}

#[test]
fn test_rehash_replaces_value() {
    let mut digest = Digest::empty();
    assert!(digest.is_empty());
    digest.rehash("abc");
    assert_eq!(digest, Digest::make("abc"));
    assert!(!digest.is_empty());
}

#[test]
fn test_parent_digest_is_concatenated_bytes() {
    let left = Digest::make("left");
    let right = Digest::make("right");

    let mut joined = left.bytes().to_vec();
    joined.extend_from_slice(right.bytes());

    assert_eq!(
        hasher::compute_parent_digest::<Blake3>(&left, &right),
        Digest::make(&joined)
    );
    assert_ne!(
        hasher::compute_parent_digest::<Blake3>(&left, &right),
        hasher::compute_parent_digest::<Blake3>(&right, &left)
    );
}

#[test]
fn test_hex_round_trip_and_empty_text() {
    let digest = Digest::make("abc");
    assert_eq!(Digest::from_hex(&digest.to_hex()).unwrap(), digest);
    assert_eq!(digest.to_string(), digest.to_hex());

    assert_eq!(Digest::empty().to_hex(), "");
    assert!(Digest::from_hex("").unwrap().is_empty());
    assert!(Digest::from_hex("abcd").is_err());
    assert!(Digest::from_hex("zz").is_err());
}
