//! RT+ Payload Property Tests
//!
//! Properties that must hold for any artist/title pair, regardless of the
//! specific text.

use proptest::prelude::*;
use rds_codec::{
    build_display_text, build_rt_plus_tag, decode_rt_plus, ContentType, MAX_FIELD_LEN,
    MAX_SECOND_FIELD_LEN, MAX_TEXT_LEN,
};

proptest! {
    #[test]
    fn short_joins_are_exact(artist in "[A-Za-z0-9 ]{1,30}", title in "[A-Za-z0-9 ]{1,31}") {
        let display = build_display_text(&artist, &title);
        prop_assert_eq!(display.as_str(), format!("{} - {}", artist, title).to_uppercase());
        prop_assert!(!display.is_truncated());
    }

    #[test]
    fn long_joins_keep_the_first_64(artist in "[A-Za-z ]{30,60}", title in "[A-Za-z ]{32,60}") {
        let joined = format!("{} - {}", artist, title).to_uppercase();
        let display = build_display_text(&artist, &title);
        prop_assert!(display.is_truncated());
        prop_assert_eq!(display.len(), MAX_TEXT_LEN);
        prop_assert_eq!(display.as_str(), &joined[..MAX_TEXT_LEN]);
    }

    #[test]
    fn payload_indexes_back_into_the_text(artist in "[A-Z0-9]{1,20}", title in "[A-Z0-9 ]{1,20}") {
        let display = build_display_text(&artist, &title);
        let payload = build_rt_plus_tag(display.as_str(), &artist, &title, 0).unwrap();

        let decoded = decode_rt_plus(&payload.to_string(), display.as_str()).unwrap();
        prop_assert_eq!(decoded.artist, artist);
        prop_assert_eq!(decoded.title, title);
    }

    #[test]
    fn cut_off_title_leaves_artist_and_blank(artist in "[A-M]{61,70}", title in "[N-Z]{1,20}") {
        let display = build_display_text(&artist, &title);
        prop_assert!(!display.contains(&title));

        let payload = build_rt_plus_tag(display.as_str(), &artist[..artist.len().min(MAX_TEXT_LEN)], &title, 0);
        let payload = payload.unwrap();
        prop_assert_eq!(payload.first().content_type, ContentType::Artist);
        prop_assert_eq!(payload.first().start, 0);
        prop_assert!(payload.second().is_blank());
        prop_assert!(payload.field(ContentType::Title).is_none());
    }

    #[test]
    fn fields_stay_in_range(
        artist in "[ -~]{0,80}",
        title in "[ -~]{0,80}",
        duration in 0u64..100_000,
    ) {
        let display = build_display_text(&artist, &title);
        let artist = artist.to_uppercase();
        let title = title.to_uppercase();

        if let Ok(payload) = build_rt_plus_tag(display.as_str(), &artist, &title, duration) {
            prop_assert!(payload.first().start as usize <= MAX_FIELD_LEN);
            prop_assert!(payload.first().length as usize <= MAX_FIELD_LEN);
            prop_assert!(payload.second().start as usize <= MAX_FIELD_LEN);
            prop_assert!(payload.second().length as usize <= MAX_SECOND_FIELD_LEN);
            prop_assert!(payload.first().end() <= display.len());
            prop_assert!(payload.is_running());
            prop_assert_eq!(payload.to_string().split(',').count(), 8);
        }
    }
}

#[test]
fn test_forty_character_title_emits_31() {
    let title = "X".repeat(40);
    let display = build_display_text("AB", &title);
    let payload = build_rt_plus_tag(display.as_str(), "AB", &title, 0).unwrap();
    assert!(payload.to_string().contains(",5,31,"));
    assert!(!payload.to_string().contains(",40,"));
}
