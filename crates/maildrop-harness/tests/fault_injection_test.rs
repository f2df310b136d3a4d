//! Fault-injection tests: every operation is idempotent on error.
//!
//! The protocol promises that a failed mutation leaves counters and storage
//! observably unchanged, so a caller-side retry loop over a transiently
//! failing storage converges to exactly the state a fault-free run reaches.

use std::sync::Arc;

use bytes::Bytes;
use maildrop_core::{
    ConnectionId, MemoryStateStore, MemoryStorage, Socket, StateStore, Storage, StorageError,
};
use maildrop_harness::{FaultyStorage, FlakyStorage, retry};
use maildrop_proto::{Address, MessageHeader};
use proptest::prelude::*;

fn addr(byte: u8) -> Address {
    Address::predefined(vec![byte; 24]).unwrap()
}

#[test]
fn send_succeeds_on_third_attempt() {
    let inner = MemoryStorage::new();
    let storage = FlakyStorage::new(Arc::new(inner.clone()), 2);
    let state = MemoryStateStore::new();

    let a = Socket::new(Arc::new(storage), Arc::new(state.clone()));
    let conn = ConnectionId::new(addr(0x01), addr(0x02));

    let mut attempts = 0;
    retry(10, || {
        attempts += 1;
        a.send(&conn, Bytes::from_static(b"m1"))
    })
    .expect("retry loop must converge");

    assert_eq!(attempts, 3);

    // Exactly one message, under its deterministic name, counter advanced
    // exactly once despite the failed attempts.
    assert_eq!(state.load(&conn).unwrap().tx, 1);
    assert_eq!(inner.entry_count(), 1);

    let name = MessageHeader::new(addr(0x01), addr(0x02), 0).encode();
    assert_eq!(inner.read(&name).unwrap(), Bytes::from_static(b"m1"));
}

#[test]
fn failed_send_leaves_no_trace() {
    let inner = MemoryStorage::new();
    // Every operation fails.
    let storage = FaultyStorage::new(Arc::new(inner.clone()), 0, 1.0);
    let state = MemoryStateStore::new();

    let a = Socket::new(Arc::new(storage), Arc::new(state.clone()));
    let conn = ConnectionId::new(addr(0x01), addr(0x02));

    for _ in 0..10 {
        assert!(matches!(a.send(&conn, Bytes::from_static(b"m")), Err(StorageError::Io(_))));
    }

    assert!(inner.is_empty());
    assert_eq!(state.load(&conn).unwrap().tx, 0);
}

#[test]
fn failed_receive_leaves_message_deliverable() {
    let inner = MemoryStorage::new();
    let state_a = MemoryStateStore::new();
    let state_b = MemoryStateStore::new();

    let a = Socket::new(Arc::new(inner.clone()), Arc::new(state_a));
    let conn_a = ConnectionId::new(addr(0x01), addr(0x02));
    a.send(&conn_a, Bytes::from_static(b"m")).expect("send failed");

    // B's next four storage operations fail.
    let flaky = FlakyStorage::new(Arc::new(inner.clone()), 4);
    let b = Socket::new(Arc::new(flaky), Arc::new(state_b.clone()));
    let conn_b = conn_a.reversed();

    for _ in 0..4 {
        assert!(b.receive(&conn_b).is_err());
        assert_eq!(state_b.load(&conn_b).unwrap().rx, 0);
    }

    // Faults spent; the same message is still there, exactly once.
    assert_eq!(b.receive(&conn_b).unwrap(), Some(Bytes::from_static(b"m")));
    assert_eq!(state_b.load(&conn_b).unwrap().rx, 1);
    assert_eq!(b.receive(&conn_b).unwrap(), None);
}

/// Storage whose `list` always fails; reads, writes, and deletes pass
/// through. Minimal wrapper for pinning the opportunistic-gc path.
#[derive(Clone)]
struct ListlessStorage {
    inner: MemoryStorage,
}

impl maildrop_core::Storage for ListlessStorage {
    fn list(&self) -> Result<Vec<Vec<u8>>, StorageError> {
        Err(StorageError::Io("listing unavailable".into()))
    }

    fn read(&self, name: &[u8]) -> Result<Bytes, StorageError> {
        self.inner.read(name)
    }

    fn write(&self, name: &[u8], data: Bytes) -> Result<(), StorageError> {
        self.inner.write(name, data)
    }

    fn delete(&self, name: &[u8]) -> Result<(), StorageError> {
        self.inner.delete(name)
    }
}

#[test]
fn swallowed_gc_failure_is_retried_later() {
    let inner = MemoryStorage::new();
    let state_a = MemoryStateStore::new();
    let state_b = MemoryStateStore::new();

    let a = Socket::new(Arc::new(inner.clone()), Arc::new(state_a));
    let conn_a = ConnectionId::new(addr(0x01), addr(0x02));
    a.send(&conn_a, Bytes::from_static(b"m")).expect("send failed");

    // B consumes through a storage whose listing is broken: the read
    // succeeds, the opportunistic gc fails and is swallowed, and the
    // consumed entry lingers.
    let b = Socket::new(
        Arc::new(ListlessStorage { inner: inner.clone() }),
        Arc::new(state_b.clone()),
    );
    let conn_b = conn_a.reversed();

    assert_eq!(b.receive(&conn_b).unwrap(), Some(Bytes::from_static(b"m")));
    assert_eq!(state_b.load(&conn_b).unwrap().rx, 1);
    assert_eq!(inner.entry_count(), 1);

    // Once listing works again, an explicit gc reclaims the leftovers.
    let healed = Socket::new(Arc::new(inner.clone()), Arc::new(state_b));
    assert_eq!(healed.gc(&conn_b).expect("gc failed"), 1);
    assert!(inner.is_empty());
}

#[test]
fn prop_faulty_run_converges_to_fault_free_state() {
    proptest!(|(
        seed in any::<u64>(),
        messages in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 1..12),
    )| {
        // Reference run over a perfect storage.
        let perfect = MemoryStorage::new();
        let ref_state_a = MemoryStateStore::new();
        let ref_state_b = MemoryStateStore::new();
        let ref_a = Socket::new(Arc::new(perfect.clone()), Arc::new(ref_state_a.clone()));
        let ref_b = Socket::new(Arc::new(perfect.clone()), Arc::new(ref_state_b.clone()));

        // Same workload over a 10%-faulty storage with caller retries.
        let inner = MemoryStorage::new();
        let faulty = FaultyStorage::new(Arc::new(inner.clone()), seed, 0.1);
        let state_a = MemoryStateStore::new();
        let state_b = MemoryStateStore::new();
        let a = Socket::new(Arc::new(faulty.clone()), Arc::new(state_a.clone()));
        let b = Socket::new(Arc::new(faulty), Arc::new(state_b.clone()));

        let conn_a = ConnectionId::new(addr(0x01), addr(0x02));
        let conn_b = conn_a.reversed();

        for message in &messages {
            ref_a.send(&conn_a, Bytes::from(message.clone())).expect("reference send");
            retry(1_000, || a.send(&conn_a, Bytes::from(message.clone())))
                .expect("faulty send must converge");
        }

        let mut reference = Vec::new();
        while let Some(m) = ref_b.receive(&conn_b).expect("reference receive") {
            reference.push(m.to_vec());
        }

        let mut delivered = Vec::new();
        while let Some(m) = retry(1_000, || b.receive(&conn_b)).expect("faulty receive") {
            delivered.push(m.to_vec());
        }

        // Same messages, same order, same final counters.
        prop_assert_eq!(&delivered, &reference);
        prop_assert_eq!(
            state_a.load(&conn_a).unwrap(),
            ref_state_a.load(&conn_a).unwrap()
        );
        prop_assert_eq!(
            state_b.load(&conn_b).unwrap(),
            ref_state_b.load(&conn_b).unwrap()
        );

        // Swallowed opportunistic gc failures may leave consumed entries;
        // an explicit retried gc reaches the reference's empty storage.
        retry(1_000, || b.gc(&conn_b)).expect("gc must converge");
        prop_assert!(perfect.is_empty());
        prop_assert!(inner.is_empty());
    });
}
