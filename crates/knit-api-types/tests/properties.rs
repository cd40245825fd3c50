//! Property tests for parsing and equality rules.

use chrono::{FixedOffset, TimeZone, Utc};
use knit_api_types::cmp::slice_eq_unordered;
use knit_api_types::tags::KEY_KNIT_TIMESTAMP;
use knit_api_types::{Annotation, Annotations, Rfc3339, Tag};
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,12}"
}

fn value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9:=/_.-]{0,16}"
}

fn user_tag() -> impl Strategy<Value = Tag> {
    (key(), value()).prop_map(|(k, v)| Tag::new(k, v))
}

fn annotation() -> impl Strategy<Value = Annotation> {
    ("[a-z][a-z0-9_.-]{0,12}", "[A-Za-z0-9][A-Za-z0-9=_.-]{0,16}")
        .prop_map(|(k, v)| Annotation::new(k, v))
}

proptest! {
    #[test]
    fn tag_survives_format_then_parse(tag in user_tag()) {
        let parsed = Tag::parse(&tag.to_string()).unwrap();
        prop_assert_eq!(parsed.key(), tag.key());
        prop_assert_eq!(parsed.value(), tag.value());
    }

    #[test]
    fn tag_parse_ignores_surrounding_whitespace(k in key(), v in value(), pad in " {0,3}") {
        let padded = Tag::parse(&format!("{pad}{k}{pad}:{pad}{v}{pad}")).unwrap();
        prop_assert_eq!(padded, Tag::new(k, v));
    }

    #[test]
    fn annotation_survives_format_then_parse(a in annotation()) {
        prop_assert_eq!(Annotation::parse(&a.to_string()).unwrap(), a);
    }

    #[test]
    fn unordered_equality_is_reflexive(xs in prop::collection::vec(user_tag(), 0..8)) {
        prop_assert!(slice_eq_unordered(&xs, &xs));
    }

    #[test]
    fn unordered_equality_is_symmetric(
        xs in prop::collection::vec(0u8..4, 0..6),
        ys in prop::collection::vec(0u8..4, 0..6),
    ) {
        prop_assert_eq!(slice_eq_unordered(&xs, &ys), slice_eq_unordered(&ys, &xs));
    }

    #[test]
    fn unordered_equality_ignores_permutation(
        pair in prop::collection::vec(user_tag(), 0..8).prop_flat_map(|xs| {
            let shuffled = Just(xs.clone()).prop_shuffle();
            (Just(xs), shuffled)
        }),
    ) {
        let (original, shuffled) = pair;
        prop_assert!(slice_eq_unordered(&original, &shuffled));
    }

    #[test]
    fn unordered_equality_counts_duplicates(
        distinct in prop::collection::btree_set(0u8..16, 2..6),
    ) {
        let xs: Vec<u8> = distinct.into_iter().collect();
        let mut ys = xs.clone();
        let last = ys.len() - 1;
        ys[last] = xs[0];
        prop_assert!(!slice_eq_unordered(&xs, &ys));
        prop_assert!(!slice_eq_unordered(&ys, &xs));
    }

    #[test]
    fn annotations_serialize_in_canonical_order(
        items in prop::collection::vec(annotation(), 0..8).prop_flat_map(|xs| {
            let shuffled = Just(xs.clone()).prop_shuffle();
            (Just(xs), shuffled)
        }),
    ) {
        let (original, shuffled) = items;
        let a: Annotations = original.into();
        let b: Annotations = shuffled.into();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn timestamp_tags_match_across_offsets(
        secs in 0i64..4_000_000_000,
        offset_minutes in -840i32..=840,
    ) {
        let utc = Utc.timestamp_opt(secs, 0).unwrap();
        let zone = FixedOffset::east_opt(offset_minutes * 60).unwrap();
        let local = utc.with_timezone(&zone);

        let a = Tag::timestamp(&Rfc3339::from(utc));
        let b = Tag::timestamp(&Rfc3339::from(local));
        prop_assert_eq!(a.key(), KEY_KNIT_TIMESTAMP);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn timestamp_tags_differ_for_different_instants(secs in 0i64..4_000_000_000, delta in 1i64..86_400) {
        let a = Tag::timestamp(&Rfc3339::from(Utc.timestamp_opt(secs, 0).unwrap()));
        let b = Tag::timestamp(&Rfc3339::from(Utc.timestamp_opt(secs + delta, 0).unwrap()));
        prop_assert_ne!(a, b);
    }
}
