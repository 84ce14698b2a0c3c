//! Tests for board queries
//!
//! These tests verify:
//! - Ordering of listings
//! - Search semantics (case, segments, blank queries)
//! - Live member counts
//! - NotFound and malformed records

use soundkv::board::{keys, SearchPattern};
use soundkv::keyspace::Batch;
use soundkv::{SoundBoard, SoundKvError};

// =============================================================================
// Helper Functions
// =============================================================================

fn board_with_sounds(names: &[&str]) -> SoundBoard {
    let board = SoundBoard::in_memory().unwrap();
    for name in names {
        board
            .create_sound(name, 1.0, &format!("{}.mp3", name), None)
            .unwrap();
    }
    board
}

fn names(sounds: &[soundkv::Sound]) -> Vec<&str> {
    sounds.iter().map(|s| s.name.as_str()).collect()
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_get_sounds_ordered_case_insensitively() {
    let board = board_with_sounds(&["bravo", "Alpha", "charlie", "ALPINE"]);

    let sounds = board.get_sounds().unwrap();

    assert_eq!(names(&sounds), vec!["Alpha", "ALPINE", "bravo", "charlie"]);
}

#[test]
fn test_get_categories_ordered_by_name() {
    let board = SoundBoard::in_memory().unwrap();
    board.create_category("Music").unwrap();
    board.create_category("Memes").unwrap();
    board.create_category("Animals").unwrap();

    let categories: Vec<String> = board
        .get_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();

    assert_eq!(categories, vec!["Animals", "Memes", "Music"]);
}

#[test]
fn test_sounds_in_category_ordered_by_name() {
    let board = board_with_sounds(&["zebra", "apple", "mango"]);
    let category = board.create_category("c").unwrap();
    for id in 1..=3 {
        board.add_sound_to_category(id, category.id).unwrap();
    }

    let sounds = board.get_sounds_in_category(category.id).unwrap();

    assert_eq!(names(&sounds), vec!["apple", "mango", "zebra"]);
}

#[test]
fn test_categories_for_sound_have_live_counts() {
    let board = board_with_sounds(&["a", "b"]);
    let one = board.create_category("one").unwrap();
    let two = board.create_category("two").unwrap();
    board.add_sound_to_category(1, one.id).unwrap();
    board.add_sound_to_category(1, two.id).unwrap();
    board.add_sound_to_category(2, two.id).unwrap();

    let mut categories = board.get_categories_for_sound(1).unwrap();
    categories.sort_by_key(|c| c.id);

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].membercount, 1);
    assert_eq!(categories[1].membercount, 2);
}

#[test]
fn test_missing_entities_are_not_found() {
    let board = SoundBoard::in_memory().unwrap();

    assert!(matches!(board.get_sound_by_id(1), Err(SoundKvError::NotFound(_))));
    assert!(matches!(board.get_sounds_in_category(1), Err(SoundKvError::NotFound(_))));
    assert!(matches!(board.get_categories_for_sound(1), Err(SoundKvError::NotFound(_))));
}

#[test]
fn test_sounds_number() {
    let board = board_with_sounds(&["a", "b", "c"]);
    assert_eq!(board.get_sounds_number().unwrap(), 3);

    board.delete_sound(2).unwrap();
    assert_eq!(board.get_sounds_number().unwrap(), 2);
}

#[test]
fn test_empty_board() {
    let board = SoundBoard::in_memory().unwrap();

    assert!(board.get_sounds().unwrap().is_empty());
    assert!(board.get_categories().unwrap().is_empty());
    assert_eq!(board.get_sounds_number().unwrap(), 0);
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_is_case_insensitive_substring() {
    let board = board_with_sounds(&["Airhorn", "Foghorn", "Boo"]);

    let mut found: Vec<u64> = board.search_sounds("HORN").unwrap().iter().map(|s| s.id).collect();
    found.sort_unstable();

    assert_eq!(found, vec![1, 2]);
}

#[test]
fn test_search_segments_match_in_order() {
    let board = board_with_sounds(&["sad trombone", "trombone sad", "sadness"]);

    let found = board.search_sounds("sad bone").unwrap();

    assert_eq!(names(&found), vec!["sad trombone"]);
}

#[test]
fn test_search_blank_query_matches_all() {
    let board = board_with_sounds(&["a", "b"]);

    assert_eq!(board.search_sounds("").unwrap().len(), 2);
    assert_eq!(board.search_sounds("   ").unwrap().len(), 2);
}

#[test]
fn test_search_no_match() {
    let board = board_with_sounds(&["Airhorn"]);
    assert!(board.search_sounds("zzz").unwrap().is_empty());
}

#[test]
fn test_search_pattern_glob() {
    let pattern = SearchPattern::parse("Air  Horn");

    assert_eq!(pattern.segments(), ["air".to_string(), "horn".to_string()]);
    assert_eq!(pattern.glob(), "*air*horn*");
    assert!(pattern.matches("big airhorn"));
    assert!(!pattern.matches("horn air"));
    assert_eq!(SearchPattern::parse("").glob(), "*");
}

// =============================================================================
// Malformed Data Tests
// =============================================================================

#[test]
fn test_malformed_length_is_reported() {
    let board = board_with_sounds(&["a"]);
    board
        .connection()
        .exec(Batch::new().hset(keys::sound(1), "length", "not-a-number"))
        .unwrap();

    assert!(matches!(board.get_sound_by_id(1), Err(SoundKvError::MalformedData(_))));
}

#[test]
fn test_missing_field_is_reported() {
    let board = board_with_sounds(&["a"]);
    board
        .connection()
        .exec(Batch::new().op(soundkv::keyspace::Op::HDel {
            key: keys::sound(1),
            field: "file".to_string(),
        }))
        .unwrap();

    assert!(matches!(board.get_sounds(), Err(SoundKvError::MalformedData(_))));
}
