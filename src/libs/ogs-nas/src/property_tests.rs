//! Property-Based Tests for the protected Security Mode Command
//!
//! These tests check the envelope length, the MAC placement and coverage,
//! and that encoding is deterministic.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use ogs_core::OgsPkbuf;

    use crate::eps::*;

    fn arb_integrity() -> impl Strategy<Value = IntegrityAlgorithm> {
        prop_oneof![
            Just(IntegrityAlgorithm::Eia0),
            Just(IntegrityAlgorithm::Eia1),
            Just(IntegrityAlgorithm::Eia2),
        ]
    }

    fn arb_ciphering() -> impl Strategy<Value = CipheringAlgorithm> {
        prop_oneof![
            Just(CipheringAlgorithm::Eea0),
            Just(CipheringAlgorithm::Eea1),
            Just(CipheringAlgorithm::Eea2),
            Just(CipheringAlgorithm::Eea3),
        ]
    }

    fn arb_smc() -> impl Strategy<Value = SecurityModeCommand> {
        (
            arb_ciphering(),
            arb_integrity(),
            0u8..16,
            prop::collection::vec(any::<u8>(), 0..=UE_SECURITY_CAPABILITY_MAX_LEN),
        )
            .prop_map(|(ciphering, integrity, ksi, cap)| SecurityModeCommand {
                selected_nas_security_algorithms: NasSecurityAlgorithms { ciphering, integrity },
                nas_key_set_identifier: ksi,
                replayed_ue_security_capabilities: cap,
            })
    }

    fn encode(
        smc: &SecurityModeCommand,
        alg: IntegrityAlgorithm,
        key: &[u8; 16],
        seq: u8,
    ) -> OgsPkbuf {
        let mut pkbuf = OgsPkbuf::new(64);
        encode_protected_security_mode_command(&mut pkbuf, smc, &alg, key, seq).unwrap();
        pkbuf
    }

    proptest! {
        #[test]
        fn prop_envelope_length(smc in arb_smc(), alg in arb_integrity(), key in any::<[u8; 16]>(), seq in any::<u8>()) {
            let pkbuf = encode(&smc, alg, &key, seq);
            prop_assert_eq!(pkbuf.len(), 11 + smc.replayed_ue_security_capabilities.len());
            prop_assert_eq!(pkbuf.as_slice()[0], 0x37);
            prop_assert_eq!(pkbuf.as_slice()[5], seq);
            prop_assert_eq!(pkbuf.as_slice()[10] as usize, smc.replayed_ue_security_capabilities.len());
        }

        #[test]
        fn prop_mac_covers_sequence_and_message(smc in arb_smc(), alg in arb_integrity(), key in any::<[u8; 16]>(), seq in any::<u8>()) {
            let pkbuf = encode(&smc, alg, &key, seq);
            let out = pkbuf.as_slice();
            let expected = alg.mac(&key, u32::from(seq), NasDirection::Downlink, 0, &out[5..]);
            prop_assert_eq!(&out[1..5], &expected[..]);
        }

        #[test]
        fn prop_encoding_is_deterministic(smc in arb_smc(), alg in arb_integrity(), key in any::<[u8; 16]>(), seq in any::<u8>()) {
            let first = encode(&smc, alg, &key, seq);
            let second = encode(&smc, alg, &key, seq);
            prop_assert_eq!(first.as_slice(), second.as_slice());
        }

        #[test]
        fn prop_verify_accepts_own_output(smc in arb_smc(), alg in arb_integrity(), key in any::<[u8; 16]>(), seq in any::<u8>()) {
            let pkbuf = encode(&smc, alg, &key, seq);
            let (header, decoded) = verify_security_mode_command(pkbuf.as_slice(), &alg, &key).unwrap();
            prop_assert_eq!(header.sequence_number, seq);
            prop_assert_eq!(decoded, smc);
        }
    }

    #[test]
    fn test_attach_scenario() {
        let smc = SecurityModeCommand {
            selected_nas_security_algorithms: NasSecurityAlgorithms::default(),
            nas_key_set_identifier: 1,
            replayed_ue_security_capabilities: vec![1, 2],
        };
        let key = [0u8; 16];
        let pkbuf = encode(&smc, IntegrityAlgorithm::Eia1, &key, 3);
        let out = pkbuf.as_slice();

        let mac = IntegrityAlgorithm::Eia1.mac(&key, 3, NasDirection::Downlink, 0, &out[5..]);
        let mut expected = vec![0x37];
        expected.extend_from_slice(&mac);
        expected.extend_from_slice(&[0x03, 0x07, 0x5d, 0x01, 0x01, 0x02, 0x01, 0x02]);
        assert_eq!(out, &expected[..]);
    }
}
