use gitqueue::job::Output;
use proptest::prelude::*;

proptest! {
    #[test]
    fn binary_capture_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(Output::capture(bytes.clone(), true), Output::Binary(bytes));
    }

    #[test]
    fn text_capture_drops_only_the_trailing_artifact(
        lines in proptest::collection::vec("[a-zA-Z0-9 ._-]{0,16}", 1..8)
    ) {
        let raw = format!("{}\n", lines.join("\n"));
        prop_assert_eq!(
            Output::capture(raw.into_bytes(), false),
            Output::Text(lines)
        );
    }

    #[test]
    fn text_capture_without_trailing_newline_is_unchanged(
        mut lines in proptest::collection::vec("[a-zA-Z0-9 ._-]{0,16}", 1..8),
        last in "[a-zA-Z0-9._-]{1,16}",
    ) {
        // Only a trailing *empty* element is an artifact; force the real
        // last line to be non-empty so nothing may be dropped.
        if let Some(slot) = lines.last_mut() {
            *slot = last;
        }
        let raw = lines.join("\n");
        prop_assert_eq!(
            Output::capture(raw.into_bytes(), false),
            Output::Text(lines)
        );
    }
}
