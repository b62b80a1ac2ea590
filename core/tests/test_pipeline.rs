// End-to-end stream-to-stream pipeline.
//
// * round trip across lengths, chunk sizes and worker counts
// * wire shape: header + one frame per chunk, in index order
// * non-seekable input, empty input
// * configuration errors before any I/O
// * cancellation

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use proptest::prelude::*;

    use gcmstream_core::constants::{
        CHUNK_HEADER_LEN, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE, STREAM_HEADER_LEN,
    };
    use gcmstream_core::crypto::MasterKey;
    use gcmstream_core::headers::{decode_header, HeaderLayout};
    use gcmstream_core::prelude::*;
    use gcmstream_core::stream::run_encrypt_pipeline;

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn key() -> Vec<u8> {
        (0u8..32).collect()
    }

    fn cipher(workers: usize) -> StreamCipher {
        StreamCipher::new(&key(), 7)
            .unwrap()
            .with_profile(ParallelismProfile::new(workers))
            .unwrap()
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn encrypt(c: &StreamCipher, data: &[u8], chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        c.encrypt(data, &mut out, Some(chunk), &CancelToken::new()).unwrap();
        out
    }

    fn decrypt(c: &StreamCipher, ct: Vec<u8>) -> Result<Vec<u8>, StreamError> {
        let mut out = Vec::new();
        c.decrypt(ct, &mut out, &CancelToken::new())?;
        Ok(out)
    }

    fn expected_wire_len(len: usize, chunk: usize) -> usize {
        STREAM_HEADER_LEN + len.div_ceil(chunk) * CHUNK_HEADER_LEN + len
    }

    /// Reader that fails on first use; proves nothing was read.
    struct Untouchable;

    impl Read for Untouchable {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "input must not be read"))
        }
    }

    /// Reader that requests cancellation once `after` bytes were handed out.
    struct CancelAfter {
        inner: Cursor<Vec<u8>>,
        token: CancelToken,
        after: u64,
    }

    impl Read for CancelAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            if self.inner.position() >= self.after {
                self.token.cancel();
            }
            Ok(n)
        }
    }

    // ------------------------------------------------------------
    // Round trips
    // ------------------------------------------------------------
    #[test]
    fn concrete_hello_scenario() {
        let c = cipher(1);
        let plaintext = "Hello AES-GCM streaming!".as_bytes();
        let ct = encrypt(&c, plaintext, 1_048_576);
        assert_eq!(ct.len(), STREAM_HEADER_LEN + CHUNK_HEADER_LEN + plaintext.len());
        assert_eq!(decrypt(&c, ct).unwrap(), plaintext);
    }

    #[test]
    fn round_trip_grid() {
        let chunk = MIN_CHUNK_SIZE;
        for workers in [1usize, 2, 4, 8] {
            let c = cipher(workers);
            for len in [0, 1, chunk - 1, chunk, chunk + 1, 3 * chunk + 17, 10 * chunk] {
                let data = pattern(len);
                let ct = encrypt(&c, &data, chunk);
                assert_eq!(ct.len(), expected_wire_len(len, chunk), "len={len} workers={workers}");
                assert_eq!(decrypt(&c, ct).unwrap(), data, "len={len} workers={workers}");
            }
        }
    }

    #[test]
    fn default_chunk_size_used_when_none() {
        let c = cipher(2);
        let data = pattern(DEFAULT_CHUNK_SIZE * 2 + 5);
        let mut ct = Vec::new();
        let snap = c.encrypt(data.clone(), &mut ct, None, &CancelToken::new()).unwrap();
        assert_eq!(snap.chunks(), 3);
        assert_eq!(snap.chunk_size, Some(DEFAULT_CHUNK_SIZE));
        assert_eq!(decrypt(&c, ct).unwrap(), data);
    }

    #[test]
    fn worker_count_may_differ_between_sides() {
        let data = pattern(7 * MIN_CHUNK_SIZE + 3);
        let ct = encrypt(&cipher(1), &data, MIN_CHUNK_SIZE);
        assert_eq!(decrypt(&cipher(8), ct.clone()).unwrap(), data);

        let ct = encrypt(&cipher(8), &data, MIN_CHUNK_SIZE);
        assert_eq!(decrypt(&cipher(1), ct).unwrap(), data);
    }

    #[test]
    fn narrow_window_still_preserves_order() {
        let profile = ParallelismProfile::new(4).with_inflight(4);
        let c = StreamCipher::new(&key(), 7).unwrap().with_profile(profile).unwrap();
        let data = pattern(20 * MIN_CHUNK_SIZE + 99);
        let ct = encrypt(&c, &data, MIN_CHUNK_SIZE);
        assert_eq!(decrypt(&c, ct).unwrap(), data);
    }

    #[test]
    fn empty_input_is_header_only() {
        let c = cipher(4);
        let ct = encrypt(&c, &[], MIN_CHUNK_SIZE);
        assert_eq!(ct.len(), STREAM_HEADER_LEN);
        assert!(decrypt(&c, ct).unwrap().is_empty());
    }

    #[test]
    fn chunk_frames_follow_header_in_index_order() {
        let c = cipher(4);
        let data = pattern(2 * MIN_CHUNK_SIZE + 10);
        let ct = encrypt(&c, &data, MIN_CHUNK_SIZE);

        let mut cur = Cursor::new(&ct);
        let stream = decode_header(&mut cur, HeaderLayout::STREAM).unwrap();
        assert_eq!(stream.key_id, 7);
        assert_eq!(stream.data_length, data.len() as i64);

        let mut lens = Vec::new();
        while (cur.position() as usize) < ct.len() {
            let h = decode_header(&mut cur, HeaderLayout::CHUNK).unwrap();
            assert_eq!(h.key_id, 7);
            lens.push(h.data_length);
            cur.set_position(cur.position() + h.data_length as u64);
        }
        assert_eq!(lens, vec![MIN_CHUNK_SIZE as i64, MIN_CHUNK_SIZE as i64, 10]);
    }

    #[test]
    fn non_seekable_input_declares_zero() {
        let c = cipher(2);
        let data = pattern(3 * MIN_CHUNK_SIZE);
        let mut ct = Vec::new();
        c.encrypt(InputSource::reader(Cursor::new(data.clone())), &mut ct, Some(MIN_CHUNK_SIZE), &CancelToken::new())
            .unwrap();

        let header = decode_header(&mut Cursor::new(&ct), HeaderLayout::STREAM).unwrap();
        assert_eq!(header.data_length, 0);
        assert_eq!(decrypt(&c, ct).unwrap(), data);
    }

    #[test]
    fn file_input_declares_its_length() {
        let path = std::env::temp_dir().join(format!("gcmstream-file-input-{}", std::process::id()));
        let data = pattern(MIN_CHUNK_SIZE + 1);
        std::fs::write(&path, &data).unwrap();

        let c = cipher(2);
        let mut ct = Vec::new();
        c.encrypt(path.clone(), &mut ct, Some(MIN_CHUNK_SIZE), &CancelToken::new()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let header = decode_header(&mut Cursor::new(&ct), HeaderLayout::STREAM).unwrap();
        assert_eq!(header.data_length, data.len() as i64);
        assert_eq!(decrypt(&c, ct).unwrap(), data);
    }

    // ------------------------------------------------------------
    // Configuration errors
    // ------------------------------------------------------------
    #[test]
    fn invalid_key_or_key_id_rejected() {
        assert!(matches!(StreamCipher::new(&[0u8; 16], 7), Err(StreamError::Configuration(_))));
        assert!(matches!(StreamCipher::new(&key(), 0), Err(StreamError::Configuration(_))));
        assert!(matches!(StreamCipher::new(&key(), -1), Err(StreamError::Configuration(_))));
    }

    #[test]
    fn chunk_size_out_of_range_rejected_before_io() {
        let c = cipher(2);
        for bad in [0, 1, MIN_CHUNK_SIZE - 1, MAX_CHUNK_SIZE + 1] {
            let mut out = Vec::new();
            let err = c
                .encrypt(InputSource::reader(Untouchable), &mut out, Some(bad), &CancelToken::new())
                .unwrap_err();
            assert!(matches!(err, StreamError::Configuration(_)), "chunk size {bad}");
            assert!(out.is_empty());
        }
    }

    #[test]
    fn zero_workers_rejected() {
        let c = StreamCipher::new(&key(), 7).unwrap();
        assert!(matches!(
            c.with_profile(ParallelismProfile::new(0)),
            Err(StreamError::Configuration(_))
        ));
    }

    #[test]
    fn declared_length_must_match_bytes_read() {
        let master = MasterKey::new(7, &key()).unwrap();
        let profile = ParallelismProfile::single_threaded();
        let data = pattern(MIN_CHUNK_SIZE + 5);

        for declared in [data.len() as u64 + 10, data.len() as u64 - 1] {
            let err = run_encrypt_pipeline(
                Cursor::new(data.clone()),
                Vec::new(),
                &master,
                MIN_CHUNK_SIZE,
                Some(declared),
                &profile,
                &CancelToken::new(),
            )
            .unwrap_err();
            assert!(matches!(err, StreamError::Format(_)), "declared {declared}");
        }
    }

    // ------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------
    #[test]
    fn cancelled_before_start() {
        let c = cipher(4);
        let token = CancelToken::new();
        token.cancel();
        let mut out = Vec::new();
        let err = c.encrypt(pattern(10), &mut out, Some(MIN_CHUNK_SIZE), &token).unwrap_err();
        assert!(matches!(err, StreamError::Cancelled));
        assert!(out.is_empty());
        assert!(!err.is_integrity_failure());
    }

    #[test]
    fn cancelled_mid_stream() {
        for workers in [1usize, 4] {
            let c = cipher(workers);
            let token = CancelToken::new();
            let total = 40 * MIN_CHUNK_SIZE;
            let input = CancelAfter {
                inner: Cursor::new(pattern(total)),
                token: token.clone(),
                after: (3 * MIN_CHUNK_SIZE) as u64,
            };
            let mut out = Vec::new();
            let err = c
                .encrypt(InputSource::reader(input), &mut out, Some(MIN_CHUNK_SIZE), &token)
                .unwrap_err();
            assert!(matches!(err, StreamError::Cancelled), "workers={workers}: {err:?}");
            assert!(out.len() < expected_wire_len(total, MIN_CHUNK_SIZE));
        }
    }

    #[test]
    fn cancelled_decrypt() {
        let c = cipher(4);
        let ct = encrypt(&c, &pattern(20 * MIN_CHUNK_SIZE), MIN_CHUNK_SIZE);
        let token = CancelToken::new();
        let input = CancelAfter {
            inner: Cursor::new(ct),
            token: token.clone(),
            after: (2 * MIN_CHUNK_SIZE) as u64,
        };
        let mut out = Vec::new();
        let err = c.decrypt(InputSource::reader(input), &mut out, &token).unwrap_err();
        assert!(matches!(err, StreamError::Cancelled));
    }

    // ------------------------------------------------------------
    // Property
    // ------------------------------------------------------------
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn decrypt_inverts_encrypt(
            len in 0usize..(5 * MIN_CHUNK_SIZE),
            workers in 1usize..6,
            chunk in prop::sample::select(vec![MIN_CHUNK_SIZE, 100_000, 2 * MIN_CHUNK_SIZE]),
            seed in any::<u8>(),
        ) {
            let c = cipher(workers);
            let data: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();
            let ct = encrypt(&c, &data, chunk);
            prop_assert_eq!(ct.len(), expected_wire_len(len, chunk));
            prop_assert_eq!(decrypt(&c, ct).unwrap(), data);
        }
    }
}
