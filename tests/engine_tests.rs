//! Tests for Engine
//!
//! These tests verify:
//! - Basic get/put/delete operations
//! - Command execution
//! - Flush to segments (manual and threshold-triggered)
//! - Read precedence across MemTable and segments
//! - Automatic compaction policy
//! - Snapshot / restore
//! - Accessors and dump output

use lsmkv::{Command, CompactionTrigger, Config, Engine, LsmError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine<String, String> {
    let config = Config::builder().flush_threshold(1024).build();
    Engine::new(config).unwrap()
}

fn setup_engine_with_small_memtable() -> Engine<String, String> {
    let config = Config::builder().flush_threshold(3).build();
    Engine::new(config).unwrap()
}

fn s(text: &str) -> String {
    text.to_string()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_rejects_invalid_config() {
    let result: Result<Engine<u32, u32>, _> = Engine::with_flush_threshold(0);
    assert!(matches!(result, Err(LsmError::Config(_))));
}

#[test]
fn test_engine_put_get() {
    let mut engine = setup_engine();

    engine.put(s("hello"), s("world")).unwrap();

    assert_eq!(engine.get("hello"), Some(&s("world")));
}

#[test]
fn test_engine_get_nonexistent_key() {
    let engine = setup_engine();

    assert_eq!(engine.get("nonexistent"), None);
    assert!(!engine.contains_key("nonexistent"));
}

#[test]
fn test_engine_put_overwrite() {
    let mut engine = setup_engine();

    engine.put(s("key"), s("value1")).unwrap();
    engine.put(s("key"), s("value2")).unwrap();

    assert_eq!(engine.get("key"), Some(&s("value2")));
}

#[test]
fn test_engine_delete() {
    let mut engine = setup_engine();

    engine.put(s("key"), s("value")).unwrap();
    assert!(engine.contains_key("key"));

    engine.delete(s("key")).unwrap();
    assert_eq!(engine.get("key"), None);
}

#[test]
fn test_engine_delete_nonexistent_key() {
    let mut engine = setup_engine();

    // Should not error
    engine.delete(s("nonexistent")).unwrap();
    assert_eq!(engine.get("nonexistent"), None);
    assert_eq!(engine.memtable_entry_count(), 1);
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_engine_execute_put_and_get() {
    let mut engine = setup_engine();

    let result = engine
        .execute(Command::Put {
            key: s("key"),
            value: s("value"),
        })
        .unwrap();
    assert_eq!(result, None); // Put returns None

    let result = engine.execute(Command::Get { key: s("key") }).unwrap();
    assert_eq!(result, Some(s("value")));
}

#[test]
fn test_engine_execute_delete() {
    let mut engine = setup_engine();
    engine.put(s("key"), s("value")).unwrap();

    let result = engine.execute(Command::Delete { key: s("key") }).unwrap();

    assert_eq!(result, None); // Delete returns None
    assert_eq!(engine.get("key"), None);
}

#[test]
fn test_engine_execute_flush_and_compact() {
    let mut engine = setup_engine();
    engine.put(s("a"), s("1")).unwrap();

    engine.execute(Command::Flush).unwrap();
    assert_eq!(engine.segment_count(), 1);

    engine.put(s("a"), s("2")).unwrap();
    engine.execute(Command::Flush).unwrap();
    engine.execute(Command::Compact).unwrap();

    assert_eq!(engine.segment_count(), 1);
    assert_eq!(engine.get("a"), Some(&s("2")));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_engine_manual_flush() {
    let mut engine = setup_engine();

    engine.put(s("key"), s("value")).unwrap();
    assert_eq!(engine.memtable_entry_count(), 1);
    assert_eq!(engine.segment_count(), 0);

    engine.flush().unwrap();

    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.segment_count(), 1);

    // Data should still be accessible from the segment
    assert_eq!(engine.get("key"), Some(&s("value")));
}

#[test]
fn test_engine_flush_empty_memtable() {
    let mut engine = setup_engine();

    // Flushing empty memtable should be a no-op
    engine.flush().unwrap();
    assert_eq!(engine.segment_count(), 0);
    assert_eq!(engine.stats().flushes, 0);
}

#[test]
fn test_engine_auto_flush_at_threshold() {
    let mut engine = setup_engine_with_small_memtable();

    engine.put(s("a"), s("1")).unwrap();
    engine.put(s("b"), s("2")).unwrap();
    assert_eq!(engine.segment_count(), 0);

    // Third distinct key reaches the threshold of 3
    engine.put(s("c"), s("3")).unwrap();
    assert_eq!(engine.segment_count(), 1);
    assert_eq!(engine.memtable_entry_count(), 0);
}

#[test]
fn test_engine_overwrites_do_not_trigger_flush() {
    let mut engine = setup_engine_with_small_memtable();

    for i in 0..10 {
        engine.put(s("same"), format!("v{}", i)).unwrap();
    }

    assert_eq!(engine.segment_count(), 0);
    assert_eq!(engine.get("same"), Some(&s("v9")));
}

#[test]
fn test_engine_delete_triggers_flush() {
    let mut engine = setup_engine_with_small_memtable();

    engine.put(s("a"), s("1")).unwrap();
    engine.put(s("b"), s("2")).unwrap();
    engine.delete(s("c")).unwrap();

    assert_eq!(engine.segment_count(), 1);
    let newest = engine.chain().newest().unwrap();
    assert_eq!(newest.tombstone_count(), 1);
}

#[test]
fn test_engine_many_writes_all_readable() {
    let mut engine = setup_engine_with_small_memtable();

    for i in 0..50 {
        engine.put(format!("key{:02}", i), format!("value{}", i)).unwrap();
    }

    assert!(engine.segment_count() >= 16);
    for i in 0..50 {
        let key = format!("key{:02}", i);
        assert_eq!(
            engine.get(&key),
            Some(&format!("value{}", i)),
            "Key {} should exist",
            key
        );
    }
}

#[test]
fn test_flush_does_not_change_visible_state() {
    let mut engine = setup_engine();
    engine.put(s("a"), s("1")).unwrap();
    engine.flush().unwrap();
    engine.put(s("b"), s("2")).unwrap();
    engine.delete(s("a")).unwrap();

    let keys = ["a", "b", "c"];
    let before: Vec<_> = keys.iter().map(|k| engine.get(*k).cloned()).collect();
    engine.flush().unwrap();
    let after: Vec<_> = keys.iter().map(|k| engine.get(*k).cloned()).collect();

    assert_eq!(before, after);
    assert_eq!(after, vec![None, Some(s("2")), None]);
}

// =============================================================================
// Read Precedence Tests
// =============================================================================

#[test]
fn test_memtable_tombstone_shadows_segment() {
    let mut engine = setup_engine();

    engine.put(s("k"), s("old")).unwrap();
    engine.flush().unwrap();
    engine.delete(s("k")).unwrap();

    assert_eq!(engine.get("k"), None);
}

#[test]
fn test_memtable_value_shadows_segment() {
    let mut engine = setup_engine();

    engine.put(s("k"), s("old")).unwrap();
    engine.flush().unwrap();
    engine.put(s("k"), s("new")).unwrap();

    assert_eq!(engine.get("k"), Some(&s("new")));
}

#[test]
fn test_segment_tombstone_shadows_older_segment() {
    let mut engine = setup_engine();

    engine.put(s("k"), s("old")).unwrap();
    engine.flush().unwrap();
    engine.delete(s("k")).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.segment_count(), 2);
    assert_eq!(engine.get("k"), None);
}

#[test]
fn test_put_after_flushed_delete_revives_key() {
    let mut engine = setup_engine();

    engine.put(s("k"), s("v1")).unwrap();
    engine.flush().unwrap();
    engine.delete(s("k")).unwrap();
    engine.flush().unwrap();
    engine.put(s("k"), s("v2")).unwrap();

    assert_eq!(engine.get("k"), Some(&s("v2")));
}

// =============================================================================
// Automatic Compaction Tests
// =============================================================================

#[test]
fn test_segment_count_trigger_compacts_after_flush() {
    let config = Config::builder()
        .flush_threshold(2)
        .compaction_trigger(CompactionTrigger::SegmentCount(3))
        .build();
    let mut engine: Engine<u32, u32> = Engine::new(config).unwrap();

    for i in 0..4 {
        engine.put(i, i).unwrap(); // flush every 2 keys → 2 segments
    }
    assert_eq!(engine.segment_count(), 2);
    assert_eq!(engine.stats().compactions, 0);

    engine.put(4, 4).unwrap();
    engine.put(5, 5).unwrap(); // third segment → compaction
    assert_eq!(engine.segment_count(), 1);
    assert_eq!(engine.stats().compactions, 1);

    for i in 0..6 {
        assert_eq!(engine.get(&i), Some(&i));
    }
}

#[test]
fn test_manual_trigger_never_compacts() {
    let mut engine: Engine<u32, u32> = Engine::with_flush_threshold(1).unwrap();

    for i in 0..10 {
        engine.put(i, i).unwrap();
    }

    assert_eq!(engine.segment_count(), 10);
    assert_eq!(engine.stats().compactions, 0);
}

// =============================================================================
// Snapshot / Restore Tests
// =============================================================================

#[test]
fn test_snapshot_restore_preserves_visible_state() {
    let mut engine: Engine<u32, String> = Engine::with_flush_threshold(2).unwrap();
    engine.put(1, s("one")).unwrap();
    engine.put(2, s("two")).unwrap(); // flush
    engine.put(3, s("three")).unwrap();
    engine.delete(1).unwrap(); // flush
    engine.put(2, s("deux")).unwrap(); // stays in memtable

    let image = engine.snapshot().unwrap();
    let restored: Engine<u32, String> = Engine::restore(Config::default(), &image).unwrap();

    assert_eq!(restored.segment_count(), 1);
    assert_eq!(restored.memtable_entry_count(), 0);
    for key in 0..5 {
        assert_eq!(restored.get(&key), engine.get(&key), "key {}", key);
    }
    assert_eq!(restored.chain().total_tombstones(), 0);
}

#[test]
fn test_snapshot_does_not_modify_engine() {
    let mut engine: Engine<u32, u32> = Engine::with_flush_threshold(2).unwrap();
    engine.put(1, 1).unwrap();
    engine.put(2, 2).unwrap();
    engine.delete(1).unwrap();

    let before = engine.stats();
    engine.snapshot().unwrap();

    assert_eq!(engine.stats(), before);
}

#[test]
fn test_restore_empty_snapshot() {
    let engine: Engine<u32, u32> = Engine::with_flush_threshold(2).unwrap();

    let image = engine.snapshot().unwrap();
    let restored: Engine<u32, u32> = Engine::restore(Config::default(), &image).unwrap();

    assert_eq!(restored.segment_count(), 0);
}

#[test]
fn test_restore_rejects_garbage() {
    let result: Result<Engine<u32, u32>, _> = Engine::restore(Config::default(), b"not an image");
    assert!(matches!(result, Err(LsmError::Corruption(_))));
}

// =============================================================================
// Accessor Tests
// =============================================================================

#[test]
fn test_engine_stats() {
    let mut engine: Engine<u32, u32> = Engine::with_flush_threshold(3).unwrap();
    engine.put(1, 1).unwrap();
    engine.delete(2).unwrap();
    engine.put(3, 3).unwrap(); // flush
    engine.delete(4).unwrap();

    let stats = engine.stats();

    assert_eq!(stats.memtable_entries, 1);
    assert_eq!(stats.memtable_tombstones, 1);
    assert_eq!(stats.segment_count, 1);
    assert_eq!(stats.segment_entries, 3);
    assert_eq!(stats.segment_tombstones, 1);
    assert_eq!(stats.flushes, 1);
    assert_eq!(stats.compactions, 0);
    assert_eq!(engine.config().flush_threshold, 3);
}

#[test]
fn test_engine_dump_lists_layers() {
    let mut engine: Engine<u32, u32> = Engine::with_flush_threshold(10).unwrap();
    engine.put(5, 50).unwrap();
    engine.flush().unwrap();
    engine.delete(7).unwrap();

    let dump = engine.to_string();

    assert!(dump.contains("=== MemTable (size: 1) ==="));
    assert!(dump.contains("[Key: 7, TOMBSTONE]"));
    assert!(dump.contains("=== Segments (count: 1) ==="));
    assert!(dump.contains("Segment #1 (size: 1): [Key: 5, Value: 50, VALID]"));
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn test_engine_empty_key_and_value() {
    let mut engine = setup_engine();

    engine.put(s(""), s("")).unwrap();
    assert_eq!(engine.get(""), Some(&s("")));
}

#[test]
fn test_engine_binary_data() {
    let mut engine: Engine<Vec<u8>, Vec<u8>> = Engine::with_flush_threshold(1).unwrap();

    // Binary key and value with null bytes
    let key = b"\x00\x01\x02\xFF\xFE".to_vec();
    let value = b"\xFF\x00\xAB\xCD\x00".to_vec();

    engine.put(key.clone(), value.clone()).unwrap();
    assert_eq!(engine.segment_count(), 1);
    assert_eq!(engine.get(key.as_slice()), Some(&value));
}
