//! Tests for the Keyspace
//!
//! These tests verify:
//! - String, set and hash semantics of every op
//! - Integer replies
//! - Wrong-type access errors
//! - Empty sets and hashes disappearing

use soundkv::keyspace::{Keyspace, Op};
use soundkv::SoundKvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn set(key: &str, value: &str) -> Op {
    Op::Set { key: key.to_string(), value: value.to_string() }
}

fn sadd(key: &str, member: &str) -> Op {
    Op::SAdd { key: key.to_string(), member: member.to_string() }
}

fn srem(key: &str, member: &str) -> Op {
    Op::SRem { key: key.to_string(), member: member.to_string() }
}

fn hset(key: &str, field: &str, value: &str) -> Op {
    Op::HSet { key: key.to_string(), field: field.to_string(), value: value.to_string() }
}

fn hdel(key: &str, field: &str) -> Op {
    Op::HDel { key: key.to_string(), field: field.to_string() }
}

fn incr(key: &str) -> Op {
    Op::Incr { key: key.to_string() }
}

// =============================================================================
// String Tests
// =============================================================================

#[test]
fn test_set_and_get() {
    let mut ks = Keyspace::new();

    assert_eq!(ks.apply(&set("a", "1")).unwrap(), 1);

    assert_eq!(ks.get("a").unwrap(), Some("1"));
    assert_eq!(ks.get("missing").unwrap(), None);
    assert!(ks.exists("a"));
}

#[test]
fn test_set_nx_only_creates() {
    let mut ks = Keyspace::new();
    let op = |value: &str| Op::SetNx { key: "counter".to_string(), value: value.to_string() };

    assert_eq!(ks.apply(&op("0")).unwrap(), 1);
    assert_eq!(ks.apply(&op("5")).unwrap(), 0);

    assert_eq!(ks.get("counter").unwrap(), Some("0"));
}

#[test]
fn test_incr_from_missing_and_existing() {
    let mut ks = Keyspace::new();

    assert_eq!(ks.apply(&incr("c")).unwrap(), 1);
    assert_eq!(ks.apply(&incr("c")).unwrap(), 2);

    ks.apply(&set("d", "41")).unwrap();
    assert_eq!(ks.apply(&incr("d")).unwrap(), 42);
    assert_eq!(ks.get("d").unwrap(), Some("42"));
}

#[test]
fn test_incr_non_integer_fails() {
    let mut ks = Keyspace::new();
    ks.apply(&set("c", "abc")).unwrap();

    assert!(matches!(ks.apply(&incr("c")), Err(SoundKvError::Storage(_))));
    assert_eq!(ks.get("c").unwrap(), Some("abc"));
}

#[test]
fn test_del() {
    let mut ks = Keyspace::new();
    ks.apply(&set("a", "1")).unwrap();

    assert_eq!(ks.apply(&Op::Del { key: "a".to_string() }).unwrap(), 1);
    assert_eq!(ks.apply(&Op::Del { key: "a".to_string() }).unwrap(), 0);
    assert!(ks.is_empty());
}

// =============================================================================
// Set Tests
// =============================================================================

#[test]
fn test_sadd_srem_replies() {
    let mut ks = Keyspace::new();

    assert_eq!(ks.apply(&sadd("s", "x")).unwrap(), 1);
    assert_eq!(ks.apply(&sadd("s", "x")).unwrap(), 0);
    assert_eq!(ks.apply(&sadd("s", "y")).unwrap(), 1);

    assert_eq!(ks.scard("s").unwrap(), 2);
    assert!(ks.sismember("s", "x").unwrap());
    assert_eq!(ks.smembers("s").unwrap(), vec!["x".to_string(), "y".to_string()]);

    assert_eq!(ks.apply(&srem("s", "x")).unwrap(), 1);
    assert_eq!(ks.apply(&srem("s", "x")).unwrap(), 0);
    assert!(!ks.sismember("s", "x").unwrap());
}

#[test]
fn test_empty_set_is_removed() {
    let mut ks = Keyspace::new();
    ks.apply(&sadd("s", "x")).unwrap();

    ks.apply(&srem("s", "x")).unwrap();

    assert!(!ks.exists("s"));
    assert_eq!(ks.scard("s").unwrap(), 0);
    assert!(ks.smembers("s").unwrap().is_empty());
}

// =============================================================================
// Hash Tests
// =============================================================================

#[test]
fn test_hset_hget_hdel() {
    let mut ks = Keyspace::new();

    assert_eq!(ks.apply(&hset("h", "name", "Airhorn")).unwrap(), 1);
    assert_eq!(ks.apply(&hset("h", "name", "Foghorn")).unwrap(), 0);
    ks.apply(&hset("h", "file", "horn.ogg")).unwrap();

    assert_eq!(ks.hget("h", "name").unwrap(), Some("Foghorn"));
    assert_eq!(ks.hlen("h").unwrap(), 2);
    assert_eq!(ks.hgetall("h").unwrap().get("file").map(String::as_str), Some("horn.ogg"));

    assert_eq!(ks.apply(&hdel("h", "name")).unwrap(), 1);
    assert_eq!(ks.apply(&hdel("h", "name")).unwrap(), 0);
    assert_eq!(ks.hget("h", "name").unwrap(), None);
}

#[test]
fn test_empty_hash_is_removed() {
    let mut ks = Keyspace::new();
    ks.apply(&hset("h", "f", "v")).unwrap();

    ks.apply(&hdel("h", "f")).unwrap();

    assert!(!ks.exists("h"));
    assert!(ks.hgetall("h").unwrap().is_empty());
}

// =============================================================================
// Wrong Type Tests
// =============================================================================

#[test]
fn test_wrong_type_reads() {
    let mut ks = Keyspace::new();
    ks.apply(&set("str", "v")).unwrap();
    ks.apply(&sadd("set", "m")).unwrap();

    assert!(matches!(ks.scard("str"), Err(SoundKvError::Storage(_))));
    assert!(matches!(ks.hget("set", "f"), Err(SoundKvError::Storage(_))));
    assert!(matches!(ks.get("set"), Err(SoundKvError::Storage(_))));
}

#[test]
fn test_wrong_type_writes_leave_value_untouched() {
    let mut ks = Keyspace::new();
    ks.apply(&sadd("set", "m")).unwrap();

    assert!(ks.apply(&hset("set", "f", "v")).is_err());
    assert!(ks.apply(&incr("set")).is_err());

    assert_eq!(ks.smembers("set").unwrap(), vec!["m".to_string()]);
}

#[test]
fn test_set_overwrites_any_type() {
    let mut ks = Keyspace::new();
    ks.apply(&sadd("k", "m")).unwrap();

    ks.apply(&set("k", "plain")).unwrap();

    assert_eq!(ks.get("k").unwrap(), Some("plain"));
}
