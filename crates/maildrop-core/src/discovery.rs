//! Finding peers with pending traffic.
//!
//! Discovery scans the shared store for entry names that decode to headers
//! addressed to a local endpoint. It needs no cooperation from peers and no
//! local state: pending inbound messages *are* the advertisement.

use std::{collections::BTreeSet, sync::Arc};

use maildrop_proto::{Address, MessageHeader};

use crate::{
    state::ConnectionId,
    storage::{Result, Storage},
};

/// Storage scanner identifying connections with inbound traffic.
pub struct Discovery {
    storage: Arc<dyn Storage>,
}

impl Discovery {
    /// Create a discovery scanner over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Return every distinct connection with at least one stored message
    /// addressed to `local`.
    ///
    /// Names that do not decode are skipped silently (foreign users of the
    /// same store). The result is deduplicated: many pending messages from
    /// one peer yield one connection.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    pub fn scan(&self, local: &Address) -> Result<BTreeSet<ConnectionId>> {
        let mut found = BTreeSet::new();

        for name in self.storage.list()? {
            let Ok(header) = MessageHeader::decode(&name) else {
                continue; // foreign entry
            };

            if header.receiver() != local {
                continue;
            }

            found.insert(ConnectionId::new(local.clone(), header.sender().clone()));
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::{sender::Sender, state::MemoryStateStore, storage::MemoryStorage};

    fn addr(byte: u8) -> Address {
        Address::predefined(vec![byte; 24]).unwrap()
    }

    fn send_some(storage: &MemoryStorage, from: &Address, to: &Address, count: usize) {
        let sender = Sender::new(
            ConnectionId::new(from.clone(), to.clone()),
            Arc::new(storage.clone()),
            Arc::new(MemoryStateStore::new()),
        );
        for _ in 0..count {
            sender.send(Bytes::from_static(b"m")).expect("send failed");
        }
    }

    #[test]
    fn empty_storage_yields_no_connections() {
        let storage = MemoryStorage::new();
        let discovery = Discovery::new(Arc::new(storage));

        assert!(discovery.scan(&addr(1)).expect("scan failed").is_empty());
    }

    #[test]
    fn scan_finds_distinct_senders() {
        let storage = MemoryStorage::new();
        let local = addr(1);

        // Two peers write to us, one of them twice; one unrelated direction.
        send_some(&storage, &addr(2), &local, 2);
        send_some(&storage, &addr(3), &local, 1);
        send_some(&storage, &addr(3), &addr(2), 1);

        let discovery = Discovery::new(Arc::new(storage));
        let found = discovery.scan(&local).expect("scan failed");

        let expected: BTreeSet<_> = [
            ConnectionId::new(local.clone(), addr(2)),
            ConnectionId::new(local.clone(), addr(3)),
        ]
        .into();
        assert_eq!(found, expected);
    }

    #[test]
    fn scan_skips_foreign_entries() {
        let storage = MemoryStorage::new();
        storage.write(&[0xFF, 0x00, 0xDE, 0xAD], Bytes::from_static(b"junk")).unwrap();

        let discovery = Discovery::new(Arc::new(storage));

        assert!(discovery.scan(&addr(1)).expect("scan failed").is_empty());
    }
}
