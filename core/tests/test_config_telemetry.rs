// CipherConfig loading/validation and TelemetrySnapshot contents.

#[cfg(test)]
mod tests {
    use gcmstream_core::constants::{
        CHUNK_HEADER_LEN, DEFAULT_CHUNK_SIZE, DEFAULT_PIPE_CAPACITY, MAX_INFLIGHT_CHUNKS, MAX_PIPE_CAPACITY,
        MAX_WORKERS, MIN_CHUNK_SIZE, STREAM_HEADER_LEN,
    };
    use gcmstream_core::prelude::*;

    fn key() -> Vec<u8> {
        (0u8..32).collect()
    }

    #[test]
    fn defaults_resolve() {
        let cfg = CipherConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(cfg.pipe_capacity(), DEFAULT_PIPE_CAPACITY);
        let p = cfg.profile();
        assert!(p.worker_count >= 1);
        assert_eq!(p.inflight_chunks, p.worker_count * 4);
    }

    #[test]
    fn loads_from_json() {
        let cfg = CipherConfig::from_json(
            r#"{ "workers": 3, "inflight_chunks": 9, "pipe_capacity": 4, "chunk_size": 131072 }"#,
        )
        .unwrap();
        assert_eq!(cfg.profile(), ParallelismProfile::new(3).with_inflight(9));
        assert_eq!(cfg.pipe_capacity(), 4);
        assert_eq!(cfg.chunk_size(), 131_072);

        let partial = CipherConfig::from_json(r#"{ "workers": 2 }"#).unwrap();
        assert_eq!(partial.profile().inflight_chunks, 8);
        assert_eq!(partial.chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn json_round_trips() {
        let cfg = CipherConfig { workers: Some(2), chunk_size: Some(MIN_CHUNK_SIZE), ..Default::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(CipherConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        let cases = [
            r#"{ "threads": 2 }"#,
            r#"{ "workers": 0 }"#,
            r#"{ "workers": 4, "inflight_chunks": 2 }"#,
            r#"{ "pipe_capacity": 0 }"#,
            r#"{ "chunk_size": 1024 }"#,
            r#"{ "chunk_size": 16777217 }"#,
            r#"{ "workers": "two" }"#,
            r#"{ "workers": 2, "inflight_chunks": 1099511627776 }"#,
            r#"{ "workers": 100000 }"#,
            r#"{ "workers": 18446744073709551615 }"#,
            r#"{ "pipe_capacity": 1000000 }"#,
        ];
        for json in cases {
            assert!(
                matches!(CipherConfig::from_json(json), Err(StreamError::Configuration(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn cipher_rejects_invalid_config() {
        let cfg = CipherConfig { pipe_capacity: Some(0), ..Default::default() };
        let err = StreamCipher::new(&key(), 1).unwrap().with_config(&cfg).unwrap_err();
        assert!(matches!(err, StreamError::Configuration(_)));
    }

    #[test]
    fn resource_limits_are_inclusive() {
        let at_limit = CipherConfig {
            workers: Some(MAX_WORKERS),
            inflight_chunks: Some(MAX_INFLIGHT_CHUNKS),
            pipe_capacity: Some(MAX_PIPE_CAPACITY),
            chunk_size: None,
        };
        at_limit.validate().unwrap();

        let over = [
            CipherConfig { workers: Some(MAX_WORKERS + 1), ..Default::default() },
            CipherConfig { workers: Some(2), inflight_chunks: Some(MAX_INFLIGHT_CHUNKS + 1), ..Default::default() },
            CipherConfig { pipe_capacity: Some(MAX_PIPE_CAPACITY + 1), ..Default::default() },
        ];
        for cfg in over {
            assert!(matches!(cfg.validate(), Err(StreamError::Configuration(_))), "accepted {cfg:?}");
        }
    }

    #[test]
    fn cipher_rejects_oversized_profile() {
        let c = StreamCipher::new(&key(), 1).unwrap();
        let err = c.with_profile(ParallelismProfile::new(2).with_inflight(usize::MAX)).unwrap_err();
        assert!(matches!(err, StreamError::Configuration(_)));

        let err = StreamCipher::new(&key(), 1)
            .unwrap()
            .with_profile(ParallelismProfile::new(MAX_WORKERS + 1))
            .unwrap_err();
        assert!(matches!(err, StreamError::Configuration(_)));
    }

    #[test]
    fn dynamic_profile_stays_within_limits() {
        let p = ParallelismProfile::dynamic();
        assert!(p.worker_count <= MAX_WORKERS);
        p.validate().unwrap();
    }

    #[test]
    fn encrypt_snapshot_counts_wire_bytes() {
        let cfg = CipherConfig { workers: Some(2), chunk_size: Some(MIN_CHUNK_SIZE), ..Default::default() };
        let c = StreamCipher::new(&key(), 5).unwrap().with_config(&cfg).unwrap();
        assert_eq!(c.key_id(), 5);
        assert_eq!(c.profile().worker_count, 2);
        assert_eq!(c.default_chunk_size(), MIN_CHUNK_SIZE);
        let data = vec![1u8; 2 * MIN_CHUNK_SIZE + 100];

        let mut ct = Vec::new();
        let snap = c.encrypt(data.clone(), &mut ct, None, &CancelToken::new()).unwrap();

        assert_eq!(snap.chunks(), 3);
        assert_eq!(snap.bytes_plaintext(), data.len() as u64);
        assert_eq!(snap.counters.headers, 1);
        assert_eq!(snap.counters.bytes_overhead, (STREAM_HEADER_LEN + 3 * CHUNK_HEADER_LEN) as u64);
        assert_eq!(snap.wire_bytes(), ct.len() as u64);
        assert_eq!(snap.worker_count, 2);
        assert_eq!(snap.chunk_size, Some(MIN_CHUNK_SIZE));
        assert!(snap.throughput_plaintext_bytes_per_sec >= 0.0);
    }

    #[test]
    fn decrypt_snapshot_mirrors_encrypt() {
        let c = StreamCipher::new(&key(), 5).unwrap().with_profile(ParallelismProfile::single_threaded()).unwrap();
        let data = vec![2u8; MIN_CHUNK_SIZE + 1];
        let mut ct = Vec::new();
        let enc = c.encrypt(data.clone(), &mut ct, Some(MIN_CHUNK_SIZE), &CancelToken::new()).unwrap();

        let mut pt = Vec::new();
        let dec = c.decrypt(ct.clone(), &mut pt, &CancelToken::new()).unwrap();
        assert_eq!(dec.counters, enc.counters);
        assert_eq!(dec.wire_bytes(), ct.len() as u64);
        assert_eq!(dec.chunk_size, None);
        assert_eq!(dec.worker_count, 1);
    }

    #[test]
    fn snapshot_serialises_to_json() {
        let c = StreamCipher::new(&key(), 5).unwrap();
        let snap = c.encrypt(vec![0u8; 10], std::io::sink(), None, &CancelToken::new()).unwrap();

        let json = snap.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["counters"]["chunks"], 1);
        assert_eq!(value["counters"]["bytes_plaintext"], 10);

        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.counters, snap.counters);
    }
}
