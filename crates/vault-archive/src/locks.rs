//! Per-business-object mutual exclusion.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use vault_types::BusinessId;

/// Registry of one async mutex per business id.
///
/// The same id always yields the same mutex instance; distinct ids never
/// contend. The registry map itself is only locked for the lookup, never
/// across an await.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<BusinessId, Arc<AsyncMutex<()>>>>,
}

/// Proof that the holder owns the locks of one or more business objects.
///
/// Internal operations that must run under the lock take a guard instead
/// of locking again, so composite operations can nest them.
pub struct ObjectGuard {
    business_ids: Vec<BusinessId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ObjectGuard {
    /// Ids covered by this guard, in acquisition order.
    pub fn business_ids(&self) -> &[BusinessId] {
        &self.business_ids
    }

    pub fn covers(&self, business_id: &BusinessId) -> bool {
        self.business_ids.contains(business_id)
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex registered for `business_id`, created on first use.
    pub fn handle(&self, business_id: &BusinessId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .entry(business_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for and take the lock of `business_id`.
    pub async fn lock(&self, business_id: &BusinessId) -> ObjectGuard {
        let guard = self.handle(business_id).lock_owned().await;
        ObjectGuard {
            business_ids: vec![business_id.clone()],
            _guards: vec![guard],
        }
    }

    /// Wait for and take the locks of every id in `business_ids`.
    ///
    /// Locks are taken in id order, so two callers whose sets overlap can
    /// never each hold a lock the other is waiting for. Duplicates are
    /// locked once.
    pub async fn lock_all<'a, I>(&self, business_ids: I) -> ObjectGuard
    where
        I: IntoIterator<Item = &'a BusinessId>,
    {
        let ordered: BTreeSet<&BusinessId> = business_ids.into_iter().collect();
        let mut guard = ObjectGuard {
            business_ids: Vec::with_capacity(ordered.len()),
            _guards: Vec::with_capacity(ordered.len()),
        };
        for business_id in ordered {
            guard._guards.push(self.handle(business_id).lock_owned().await);
            guard.business_ids.push(business_id.clone());
        }
        guard
    }

    /// Take the lock of `business_id` if nobody holds it.
    pub fn try_lock(&self, business_id: &BusinessId) -> Option<ObjectGuard> {
        let guard = self.handle(business_id).try_lock_owned().ok()?;
        Some(ObjectGuard {
            business_ids: vec![business_id.clone()],
            _guards: vec![guard],
        })
    }

    /// Number of ids with a registered mutex.
    pub fn len(&self) -> usize {
        self.locks.lock().expect("lock registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn same_id_same_mutex() {
        let locks = KeyedLocks::new();
        let a = locks.handle(&BusinessId::new("C1"));
        let b = locks.handle(&BusinessId::new("C1"));
        let c = locks.handle(&BusinessId::new("C2"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn held_lock_blocks_same_id_only() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(&BusinessId::new("C1")).await;
        assert!(guard.covers(&BusinessId::new("C1")));
        assert!(locks.try_lock(&BusinessId::new("C1")).is_none());
        assert!(locks.try_lock(&BusinessId::new("C2")).is_some());
        drop(guard);
        assert!(locks.try_lock(&BusinessId::new("C1")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = locks.lock(&BusinessId::new("C1")).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let _guard = locks.lock(&BusinessId::new("C1")).await;
                order.lock().unwrap().push("waiter");
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        order.lock().unwrap().push("holder");
        drop(first);
        waiter.await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["holder", "waiter"]);
    }

    #[tokio::test]
    async fn lock_all_covers_each_id_once() {
        let locks = KeyedLocks::new();
        let ids = [
            BusinessId::new("F2"),
            BusinessId::new("D1"),
            BusinessId::new("F2"),
        ];
        let guard = locks.lock_all(&ids).await;
        assert_eq!(
            guard.business_ids(),
            &[BusinessId::new("D1"), BusinessId::new("F2")]
        );
        assert!(guard.covers(&BusinessId::new("F2")));
        assert!(!guard.covers(&BusinessId::new("F1")));
        assert!(locks.try_lock(&BusinessId::new("D1")).is_none());
        assert!(locks.try_lock(&BusinessId::new("F2")).is_none());
        drop(guard);
        assert!(locks.try_lock(&BusinessId::new("D1")).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn crossed_lock_sets_do_not_deadlock() {
        let locks = Arc::new(KeyedLocks::new());
        let a = BusinessId::new("A");
        let b = BusinessId::new("B");

        let tasks: Vec<_> = (0..50)
            .map(|n| {
                let locks = Arc::clone(&locks);
                let set = if n % 2 == 0 {
                    [a.clone(), b.clone()]
                } else {
                    [b.clone(), a.clone()]
                };
                tokio::spawn(async move {
                    let _guard = locks.lock_all(&set).await;
                    tokio::task::yield_now().await;
                })
            })
            .collect();

        let all = async {
            for task in tasks {
                task.await.unwrap();
            }
        };
        tokio::time::timeout(Duration::from_secs(10), all)
            .await
            .expect("lock sets deadlocked");
    }
}
