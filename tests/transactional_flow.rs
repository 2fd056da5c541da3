//! End-to-end units of work against built regions.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use txn_cache::{
    Cache, CacheBuilder, CacheKey, CacheKeyBuilder, CacheStrategy, CachingExecutor, Error, Lookup,
    TransactionalCacheManager,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn select_user(id: i64) -> CacheKey {
    CacheKeyBuilder::statement("UserMapper.selectById")
        .sql("SELECT name FROM users WHERE id = ?")
        .param(id)
        .environment("test")
        .build()
}

#[test]
fn test_commit_then_hit_in_next_unit_of_work() {
    init_logger();
    let users = CacheBuilder::new("UserMapper")
        .build::<CacheKey, String>()
        .expect("Failed to build region");

    let mut first = CachingExecutor::new();
    first
        .query(&users, &select_user(1), CacheStrategy::Refresh, || {
            Ok("alice".to_string())
        })
        .expect("Failed to execute");
    first.commit().expect("Failed to commit");

    let mut second = CachingExecutor::new();
    let name = second
        .query(&users, &select_user(1), CacheStrategy::Fresh, || {
            Err(Error::RepositoryError("should not run".to_string()))
        })
        .expect("Failed to execute");
    second.commit().expect("Failed to commit");

    assert_eq!(name, Some("alice".to_string()));
}

#[test]
fn test_equal_keys_built_separately_share_entries() {
    init_logger();
    let users = CacheBuilder::new("UserMapper")
        .build::<CacheKey, String>()
        .expect("Failed to build region");

    let mut tcm = TransactionalCacheManager::new();
    tcm.put(&users, select_user(7), Some("grace".to_string()));
    tcm.commit().expect("Failed to commit");

    let rebuilt = CacheKey::from_parts([
        "UserMapper.selectById".into(),
        0i64.into(),
        (i32::MAX as i64).into(),
        "SELECT name FROM users WHERE id = ?".into(),
        7i64.into(),
        "test".into(),
    ]);
    assert_eq!(rebuilt, select_user(7));
    assert_eq!(
        users.get(&rebuilt).expect("get failed"),
        Lookup::Hit("grace".to_string())
    );
}

#[test]
fn test_blocking_region_waits_for_commit() {
    init_logger();
    let users = CacheBuilder::new("BlockingUsers")
        .blocking(true)
        .lock_timeout(Duration::from_secs(5))
        .build::<CacheKey, String>()
        .expect("Failed to build region");

    let mut first = TransactionalCacheManager::new();
    assert!(first
        .get(&users, &select_user(1))
        .expect("get failed")
        .is_miss());

    let (started_tx, started_rx) = mpsc::channel();
    let waiter_region = Arc::clone(&users);
    let waiter = thread::spawn(move || {
        let mut second = TransactionalCacheManager::new();
        let start = Instant::now();
        started_tx.send(()).expect("Failed to signal");
        let found = second.get(&waiter_region, &select_user(1));
        second.commit().expect("Failed to commit");
        (found, start.elapsed())
    });

    started_rx.recv().expect("Failed to wait for waiter");
    thread::sleep(Duration::from_millis(50));
    first.put(&users, select_user(1), Some("alice".to_string()));
    first.commit().expect("Failed to commit");

    let (found, waited) = waiter.join().expect("waiter panicked");
    assert_eq!(
        found.expect("get failed"),
        Lookup::Hit("alice".to_string())
    );
    assert!(waited >= Duration::from_millis(40));
}

#[test]
fn test_blocking_region_released_by_rollback() {
    init_logger();
    let users = CacheBuilder::new("BlockingUsers")
        .blocking(true)
        .lock_timeout(Duration::from_secs(5))
        .build::<CacheKey, String>()
        .expect("Failed to build region");

    let mut first = CachingExecutor::new();
    let result = first.query(&users, &select_user(2), CacheStrategy::Refresh, || {
        Err(Error::RepositoryError("connection reset".to_string()))
    });
    assert!(result.is_err());
    first.rollback();

    let waiter_region = Arc::clone(&users);
    let found = thread::spawn(move || {
        let mut second = CachingExecutor::new();
        let found = second.query(&waiter_region, &select_user(2), CacheStrategy::Refresh, || {
            Ok("bob".to_string())
        });
        second.commit().expect("Failed to commit");
        found
    })
    .join()
    .expect("waiter panicked")
    .expect("Failed to execute");

    assert_eq!(found, Some("bob".to_string()));
    assert_eq!(
        users.get(&select_user(2)).expect("get failed"),
        Lookup::Hit("bob".to_string())
    );
}

#[test]
fn test_write_flushes_region_for_everyone() {
    init_logger();
    let users = CacheBuilder::new("UserMapper")
        .build::<CacheKey, String>()
        .expect("Failed to build region");
    let orders = CacheBuilder::new("OrderMapper")
        .build::<CacheKey, String>()
        .expect("Failed to build region");

    let mut seed = TransactionalCacheManager::new();
    seed.put(&users, select_user(1), Some("alice".to_string()));
    seed.put(&orders, select_user(1), Some("order-1".to_string()));
    seed.commit().expect("Failed to commit");

    let mut writer = CachingExecutor::new();
    writer.flush(&users);
    writer
        .query(&users, &select_user(3), CacheStrategy::Refresh, || {
            Ok("carol".to_string())
        })
        .expect("Failed to execute");

    // Still visible to others until the writer commits.
    assert!(users.get(&select_user(1)).expect("get failed").is_hit());

    writer.commit().expect("Failed to commit");

    assert_eq!(users.size(), 1);
    assert!(users.get(&select_user(1)).expect("get failed").is_miss());
    assert!(users.get(&select_user(3)).expect("get failed").is_hit());
    assert!(orders.get(&select_user(1)).expect("get failed").is_hit());
}

#[test]
fn test_negative_results_are_cached() {
    init_logger();
    let users = CacheBuilder::new("UserMapper")
        .build::<CacheKey, Option<String>>()
        .expect("Failed to build region");

    let mut first = CachingExecutor::new();
    first
        .query(&users, &select_user(404), CacheStrategy::Refresh, || Ok(None))
        .expect("Failed to execute");
    first.commit().expect("Failed to commit");

    let mut second = CachingExecutor::new();
    let found = second
        .query(&users, &select_user(404), CacheStrategy::Refresh, || {
            Err(Error::RepositoryError("should not run".to_string()))
        })
        .expect("Failed to execute");

    assert_eq!(found, Some(None));
}
