/// Property-based tests for the init/destroy contract
///
/// Generates configs inside each codec's limits and checks that every one of
/// them initializes, tears down once, and treats further teardown as a no-op.
use encinit::engine::{
    ConfigOverrides, EncoderSession, ErrorCode, Rational, SessionState, SoftwareBackend, Teardown,
    UsageProfile, apply_overrides, get_default, resolve,
};
use proptest::prelude::*;

fn usage_strategy() -> impl Strategy<Value = UsageProfile> {
    prop_oneof![
        Just(UsageProfile::GoodQuality),
        Just(UsageProfile::Realtime),
        Just(UsageProfile::BestQuality),
    ]
}

proptest! {
    // Each case reserves a frame pool; keep the count modest
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_valid_configs_init_and_destroy(
        kind in prop::sample::select(vec!["baseline", "vp8", "vp9"]),
        usage in usage_strategy(),
        width in 1u32..=1920,
        height in 1u32..=1080,
        fps in 1u32..=60,
        bitrate in 1u32..=50_000,
        threads in 1u32..=16,
    ) {
        let iface = resolve(kind).unwrap();
        let base = get_default(&iface, usage).unwrap();
        let overrides = ConfigOverrides {
            width: Some(width),
            height: Some(height),
            timebase: Some(Rational::per_second(fps)),
            target_bitrate_kbps: Some(bitrate),
            threads: Some(threads),
            ..Default::default()
        };
        let config = apply_overrides(base, &overrides);

        let mut session = EncoderSession::new();
        prop_assert!(session.init(&iface, config).is_ok());
        prop_assert_eq!(session.state(), SessionState::Initialized);
        prop_assert_eq!(session.destroy(), Teardown::Released);
        prop_assert_eq!(session.destroy(), Teardown::NoOp);
        prop_assert_eq!(session.state(), SessionState::Destroyed);
    }

    #[test]
    fn proptest_zero_field_never_internal(
        which in 0usize..5,
        width in 1u32..=1920,
        height in 1u32..=1080,
    ) {
        let iface = resolve("baseline").unwrap();
        let base = get_default(&iface, UsageProfile::Realtime).unwrap();
        let mut config = apply_overrides(base, &ConfigOverrides {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        });
        match which {
            0 => config.width = 0,
            1 => config.height = 0,
            2 => config.timebase.den = 0,
            3 => config.timebase.num = 0,
            _ => config.target_bitrate_kbps = 0,
        }

        // A zero budget would fail allocation if validation were skipped
        let mut session = EncoderSession::with_backend(SoftwareBackend::with_memory_limit(0));
        let err = session.init(&iface, config).unwrap_err();
        prop_assert_eq!(err.code(), ErrorCode::InvalidParam);
        prop_assert_eq!(session.state(), SessionState::Uninitialized);
    }
}
