// Per-chunk AES-256-GCM.

#[cfg(test)]
mod tests {
    use gcmstream_core::crypto::{ChunkCodec, CryptoError, DataKey};
    use gcmstream_core::types::StreamError;

    fn codec() -> (DataKey, ChunkCodec) {
        let dk = DataKey::generate();
        let c = ChunkCodec::new(&dk, 7, 0x1234_5678);
        (dk, c)
    }

    #[test]
    fn ciphertext_keeps_plaintext_length() {
        let (_, c) = codec();
        let sealed = c.encrypt_chunk(0, vec![0x42; 1000]).unwrap();
        assert_eq!(sealed.index, 0);
        assert_eq!(sealed.ciphertext.len(), 1000);
        assert_ne!(sealed.ciphertext, vec![0x42; 1000]);
    }

    #[test]
    fn empty_chunk_round_trips() {
        let (_, c) = codec();
        let sealed = c.encrypt_chunk(5, Vec::new()).unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert_eq!(c.decrypt_chunk(5, sealed.ciphertext, &sealed.tag, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn same_plaintext_differs_by_index() {
        let (_, c) = codec();
        let a = c.encrypt_chunk(0, b"same".to_vec()).unwrap();
        let b = c.encrypt_chunk(1, b"same".to_vec()).unwrap();
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.tag, b.tag);
    }

    #[test]
    fn wrong_index_fails_authentication() {
        let (_, c) = codec();
        let sealed = c.encrypt_chunk(3, b"positioned".to_vec()).unwrap();
        let err = c.decrypt_chunk(4, sealed.ciphertext, &sealed.tag, 10).unwrap_err();
        assert!(matches!(err, CryptoError::TagMismatch { index: 4 }));
    }

    #[test]
    fn declared_length_must_match_before_decrypt() {
        let (_, c) = codec();
        let sealed = c.encrypt_chunk(0, b"abcdef".to_vec()).unwrap();
        let err = c.decrypt_chunk(0, sealed.ciphertext.clone(), &sealed.tag, 5).unwrap_err();
        assert!(matches!(err, CryptoError::LengthMismatch { declared: 5, actual: 6 }));
        assert!(StreamError::from(err).is_integrity_failure());

        let err = c.decrypt_chunk(0, sealed.ciphertext, &sealed.tag, -1).unwrap_err();
        assert!(matches!(err, CryptoError::LengthMismatch { .. }));
    }

    #[test]
    fn tampered_ciphertext_or_tag_fails() {
        let (_, c) = codec();
        let sealed = c.encrypt_chunk(0, vec![7u8; 256]).unwrap();

        let mut ct = sealed.ciphertext.clone();
        ct[100] ^= 0x80;
        assert!(c.decrypt_chunk(0, ct, &sealed.tag, 256).is_err());

        let mut tag = sealed.tag;
        tag[15] ^= 0x01;
        assert!(c.decrypt_chunk(0, sealed.ciphertext.clone(), &tag, 256).is_err());

        let err = c.decrypt_chunk(0, sealed.ciphertext, &sealed.tag[..12], 256).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidTagLen { expected: 16, actual: 12 }));
    }

    #[test]
    fn other_key_or_key_id_or_prefix_fails() {
        let (dk, c) = codec();
        let sealed = c.encrypt_chunk(0, b"bound".to_vec()).unwrap();

        let other_key = ChunkCodec::new(&DataKey::generate(), 7, 0x1234_5678);
        let other_id = ChunkCodec::new(&dk, 8, 0x1234_5678);
        let other_prefix = ChunkCodec::new(&dk, 7, 0x1234_5679);
        for wrong in [other_key, other_id, other_prefix] {
            assert!(matches!(
                wrong.decrypt_chunk(0, sealed.ciphertext.clone(), &sealed.tag, 5),
                Err(CryptoError::TagMismatch { .. })
            ));
        }
    }

    #[test]
    fn negative_index_is_rejected_before_sealing() {
        let (_, c) = codec();
        let err = c.encrypt_chunk(-1, b"x".to_vec()).unwrap_err();
        assert!(matches!(err, CryptoError::Nonce(_)));
        assert!(matches!(StreamError::from(err), StreamError::Configuration(_)));
    }

    #[test]
    fn key_material_is_wiped_on_drop() {
        fn wiped_on_drop<T: zeroize::ZeroizeOnDrop>() {}
        wiped_on_drop::<aes::Aes256>();
        wiped_on_drop::<DataKey>();
        wiped_on_drop::<gcmstream_core::crypto::MasterKey>();
    }
}
