//! Property-based tests for handoff-lib
//!
//! These tests use proptest to verify invariants across a wide range of inputs.

#[cfg(test)]
mod codec_properties {
    use handoff_lib::codec::{
        build_media_share, build_text_share, Media, MediaType, MAX_DESCRIPTION_BYTES,
        MAX_TEXT_BYTES, MAX_TITLE_BYTES,
    };
    use handoff_lib::Scene;
    use proptest::prelude::*;

    fn webpage() -> Media {
        Media::Webpage {
            url: "https://a.example/article".into(),
        }
    }

    proptest! {
        /// Text is accepted exactly when 0 < len < 10240 bytes
        #[test]
        fn text_bound_is_exclusive(len in 0usize..(MAX_TEXT_BYTES + 64)) {
            let result = build_text_share(Scene::Person, "x".repeat(len));
            prop_assert_eq!(result.is_ok(), len > 0 && len < MAX_TEXT_BYTES);
        }

        /// Multi-byte text is measured in bytes, not characters
        #[test]
        fn text_bound_counts_bytes(chars in 3400usize..3420) {
            let text = "好".repeat(chars);
            let len = text.len();
            let result = build_text_share(Scene::Timeline, text);
            prop_assert_eq!(result.is_ok(), len < MAX_TEXT_BYTES);
        }

        /// Title and description are accepted up to and including their limits
        #[test]
        fn title_and_description_bounds(
            title_len in (MAX_TITLE_BYTES - 8)..(MAX_TITLE_BYTES + 8),
            description_len in (MAX_DESCRIPTION_BYTES - 8)..(MAX_DESCRIPTION_BYTES + 8)
        ) {
            let result = build_media_share(
                Scene::Person,
                Some("t".repeat(title_len)),
                Some("d".repeat(description_len)),
                None,
                MediaType::Webpage,
                webpage(),
            );
            prop_assert_eq!(
                result.is_ok(),
                title_len <= MAX_TITLE_BYTES && description_len <= MAX_DESCRIPTION_BYTES
            );
            if let Err(err) = result {
                prop_assert!(err.actual > err.limit);
            }
        }
    }
}

#[cfg(test)]
mod signing_properties {
    use handoff_lib::{sign, verify, SignatureInput};
    use proptest::prelude::*;

    fn fields() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::btree_map("[a-z]{1,12}", "[A-Za-z0-9=]{0,16}", 0..8)
            .prop_map(|map| map.into_iter().collect())
    }

    proptest! {
        /// Insertion order never changes the signature
        #[test]
        fn signature_ignores_field_order(pairs in fields(), secret in "[a-z0-9]{1,32}") {
            let forward: SignatureInput = pairs.iter().cloned().collect();
            let backward: SignatureInput = pairs.iter().rev().cloned().collect();
            prop_assert_eq!(sign(forward, &secret), sign(backward, &secret));
        }

        /// Adding an empty-valued field never changes the signature
        #[test]
        fn empty_values_are_ignored(
            pairs in fields(),
            extra in "[A-Z]{1,8}",
            secret in "[a-z0-9]{1,32}"
        ) {
            let base: SignatureInput = pairs.iter().cloned().collect();
            let padded = base.clone().with(extra, "");
            prop_assert_eq!(sign(base, &secret), sign(padded, &secret));
        }

        /// A signature always verifies against its own input
        #[test]
        fn signature_verifies(pairs in fields(), secret in "[a-z0-9]{1,32}") {
            let input: SignatureInput = pairs.into_iter().collect();
            let signature = sign(input.clone(), &secret);
            prop_assert_eq!(signature.len(), 32);
            prop_assert!(verify(input, &secret, &signature));
        }
    }
}

#[cfg(test)]
mod router_properties {
    use std::sync::Arc;

    use handoff_lib::test_utils::{registered_client, MockPeer};
    use proptest::prelude::*;

    proptest! {
        /// Arbitrary input never panics and never claims an unknown url
        #[test]
        fn arbitrary_urls_do_not_panic(url in "\\PC{0,64}") {
            let client = registered_client(Arc::new(MockPeer::new()));
            let outcome = client.router().route_url(&url);
            if !url.trim().to_ascii_lowercase().starts_with("wx123://") {
                prop_assert!(!outcome.is_handled());
            }
        }
    }
}
