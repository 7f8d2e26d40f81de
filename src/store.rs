use chrono::Utc;

use crate::db::KeyValue;
use crate::error::Result;
use crate::models::{NewTransaction, Transaction};

/// Slot holding the serialized collection.
pub const TRANSACTIONS_KEY: &str = "transactions";
/// Where an unreadable collection is parked before the store starts empty.
pub const RECOVERY_KEY: &str = "transactions.unreadable";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// No collection had been saved yet.
    Empty,
    Loaded(usize),
    /// The saved collection could not be parsed. The raw payload was copied
    /// to [`RECOVERY_KEY`] and the store started empty.
    Recovered { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Added(i64),
    Removed(i64),
}

pub type SubscriptionId = usize;

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Owns the transaction collection and writes all of it through to a
/// [`KeyValue`] slot after every mutation.
pub struct TransactionStore<K: KeyValue> {
    kv: K,
    transactions: Vec<Transaction>,
    status: LoadStatus,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<K: KeyValue> TransactionStore<K> {
    pub fn open(mut kv: K) -> Result<Self> {
        let (transactions, status) = match kv.get(TRANSACTIONS_KEY)? {
            None => (Vec::new(), LoadStatus::Empty),
            Some(raw) => match serde_json::from_str::<Vec<Transaction>>(&raw) {
                Ok(list) => {
                    let n = list.len();
                    (list, LoadStatus::Loaded(n))
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "saved transactions are unreadable; starting empty and keeping a copy under '{RECOVERY_KEY}'"
                    );
                    kv.set(RECOVERY_KEY, &raw)?;
                    (Vec::new(), LoadStatus::Recovered { reason: e.to_string() })
                }
            },
        };
        tracing::debug!(count = transactions.len(), "transaction store opened");
        Ok(Self {
            kv,
            transactions,
            status,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Full collection in insertion order.
    pub fn all(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: i64) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction and persist. Returns the assigned id.
    pub fn add(&mut self, new: NewTransaction) -> Result<i64> {
        let now = Utc::now();
        let id = self.next_id(now.timestamp_millis());
        self.transactions.push(new.into_transaction(id, now));
        if let Err(e) = self.persist() {
            self.transactions.pop();
            return Err(e);
        }
        tracing::info!(id, "transaction added");
        self.notify(StoreEvent::Added(id));
        Ok(id)
    }

    /// Remove the transaction with `id`, if any, and persist. Returns whether
    /// a record was removed; an unknown id is not an error.
    pub fn remove(&mut self, id: i64) -> Result<bool> {
        let position = self.transactions.iter().position(|t| t.id == id);
        let removed = position.map(|i| (i, self.transactions.remove(i)));
        if let Err(e) = self.persist() {
            if let Some((i, t)) = removed {
                self.transactions.insert(i, t);
            }
            return Err(e);
        }
        match removed {
            Some(_) => {
                tracing::info!(id, "transaction removed");
                self.notify(StoreEvent::Removed(id));
                Ok(true)
            }
            None => {
                tracing::debug!(id, "remove: no such transaction");
                Ok(false)
            }
        }
    }

    /// Register a listener called after each successful mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    #[cfg(test)]
    pub fn into_inner(self) -> K {
        self.kv
    }

    #[cfg(test)]
    pub fn kv(&self) -> &K {
        &self.kv
    }

    // Millisecond timestamps, bumped past the current maximum so two adds in
    // the same millisecond (or after a clock step back) stay unique.
    fn next_id(&self, now_millis: i64) -> i64 {
        match self.transactions.iter().map(|t| t.id).max() {
            Some(max) if now_millis <= max => max + 1,
            _ => now_millis,
        }
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.transactions)?;
        self.kv.set(TRANSACTIONS_KEY, &json)?;
        tracing::debug!(count = self.transactions.len(), bytes = json.len(), "transactions persisted");
        Ok(())
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::db::{MemoryKv, SqliteKv};
    use crate::error::TallyError;
    use crate::models::{parse_input_date, Category, TransactionType};

    fn new_tx(kind: TransactionType, amount: i64, category: Category, date: &str) -> NewTransaction {
        NewTransaction {
            kind,
            description: format!("{category:?}"),
            amount: Decimal::from(amount),
            category,
            date: parse_input_date(date).unwrap(),
            notes: None,
        }
    }

    fn salary() -> NewTransaction {
        new_tx(TransactionType::Income, 1000, Category::Salary, "2024-01-05")
    }

    fn rent() -> NewTransaction {
        new_tx(TransactionType::Expense, 300, Category::Housing, "2024-01-05")
    }

    struct FailingKv;

    impl KeyValue for FailingKv {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(TallyError::Other("disk full".to_string()))
        }
    }

    #[test]
    fn test_open_empty_slot() {
        let store = TransactionStore::open(MemoryKv::default()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.status(), &LoadStatus::Empty);
    }

    #[test]
    fn test_add_appends_with_fresh_id_and_keeps_fields() {
        let mut store = TransactionStore::open(MemoryKv::default()).unwrap();
        let first = store.add(salary()).unwrap();
        let second = store.add(rent()).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);

        let all = store.all();
        assert_eq!(all[0].id, first);
        assert_eq!(all[1].id, second);
        assert_eq!(all[1].kind, TransactionType::Expense);
        assert_eq!(all[1].amount, Decimal::from(300));
        assert_eq!(all[1].category, Category::Housing);
        assert_eq!(all[1].date, parse_input_date("2024-01-05").unwrap());
    }

    #[test]
    fn test_insertion_order_not_date_order() {
        let mut store = TransactionStore::open(MemoryKv::default()).unwrap();
        store
            .add(new_tx(TransactionType::Expense, 5, Category::Food, "2024-03-01"))
            .unwrap();
        store
            .add(new_tx(TransactionType::Expense, 6, Category::Food, "2023-01-01"))
            .unwrap();
        let amounts: Vec<Decimal> = store.all().iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![Decimal::from(5), Decimal::from(6)]);
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut store = TransactionStore::open(MemoryKv::default()).unwrap();
        let mut ids: Vec<i64> = (0..50).map(|_| store.add(rent()).unwrap()).collect();
        let before = ids.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert_eq!(ids, before, "ids should be increasing");
    }

    #[test]
    fn test_remove_existing_and_absent() {
        let mut store = TransactionStore::open(MemoryKv::default()).unwrap();
        let id = store.add(salary()).unwrap();
        store.add(rent()).unwrap();

        assert!(store.remove(id).unwrap());
        assert!(store.all().iter().all(|t| t.id != id));
        assert_eq!(store.len(), 1);

        let snapshot = store.all().to_vec();
        assert!(!store.remove(id).unwrap());
        assert_eq!(store.all(), snapshot.as_slice());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut store = TransactionStore::open(MemoryKv::default()).unwrap();
        let id = store.add(salary()).unwrap();
        store.add(rent()).unwrap();
        store.remove(id).unwrap();
        let expected = store.all().to_vec();

        let reopened = TransactionStore::open(store.into_inner()).unwrap();
        assert_eq!(reopened.all(), expected.as_slice());
        assert_eq!(reopened.status(), &LoadStatus::Loaded(1));
    }

    #[test]
    fn test_roundtrip_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.db");
        let expected = {
            let mut store = TransactionStore::open(SqliteKv::open(&path).unwrap()).unwrap();
            store.add(salary()).unwrap();
            store.add(rent()).unwrap();
            store.all().to_vec()
        };
        let store = TransactionStore::open(SqliteKv::open(&path).unwrap()).unwrap();
        assert_eq!(store.all(), expected.as_slice());
    }

    #[test]
    fn test_amounts_and_dates_survive_reopen_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.db");
        let mut precise = salary();
        precise.amount = "1234567890123456789.12".parse().unwrap();
        precise.date = parse_input_date("2024-01-05T10:00:00.1234").unwrap();
        let mut largest = new_tx(TransactionType::Income, 10, Category::Gifts, "2024-01-06");
        largest.amount = Decimal::MAX;

        let expected = {
            let mut store = TransactionStore::open(SqliteKv::open(&path).unwrap()).unwrap();
            store.add(rent()).unwrap();
            store.add(precise).unwrap();
            store.add(largest).unwrap();
            store.all().to_vec()
        };
        let store = TransactionStore::open(SqliteKv::open(&path).unwrap()).unwrap();
        assert_eq!(store.status(), &LoadStatus::Loaded(3));
        assert_eq!(store.all(), expected.as_slice());
        assert_eq!(store.all()[1].amount.to_string(), "1234567890123456789.12");
        assert_eq!(store.all()[2].amount, Decimal::MAX);
    }

    #[test]
    fn test_malformed_slot_starts_empty_and_keeps_copy() {
        let kv = MemoryKv::with(TRANSACTIONS_KEY, "{not json");
        let mut store = TransactionStore::open(kv).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.status(), LoadStatus::Recovered { .. }));
        assert_eq!(
            store.kv().get(RECOVERY_KEY).unwrap().as_deref(),
            Some("{not json")
        );

        // The store stays usable and the parked copy is left alone.
        store.add(salary()).unwrap();
        assert_eq!(
            store.kv().get(RECOVERY_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let mut store = TransactionStore::open(FailingKv).unwrap();
        assert!(store.add(salary()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_listeners_see_mutations() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = TransactionStore::open(MemoryKv::default()).unwrap();
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |e| sink.borrow_mut().push(*e));

        let id = store.add(salary()).unwrap();
        store.remove(id).unwrap();
        store.remove(id).unwrap();
        assert_eq!(*seen.borrow(), vec![StoreEvent::Added(id), StoreEvent::Removed(id)]);

        assert!(store.unsubscribe(sub));
        store.add(rent()).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }
}
