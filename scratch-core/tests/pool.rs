mod common;

use common::harness;
use scratch_core::engine::PoolError;
use scratch_core::store::CardStore;
use std::collections::HashMap;

#[tokio::test]
async fn initialize_is_exclusive_and_pairs_codes() {
    let h = harness();

    let pool = h.engine.pools.initialize(10).await.unwrap();
    assert!(pool.active);
    assert_eq!(pool.card_count, 20);

    let second = h.engine.pools.initialize(10).await;
    assert!(matches!(second, Err(PoolError::PoolAlreadyActive)));

    let cards = h.store.list_active_cards().await.unwrap();
    assert_eq!(cards.len(), 20);

    let mut per_code: HashMap<&str, usize> = HashMap::new();
    for card in &cards {
        assert_eq!(card.pool_id, pool.id);
        assert!(card.claim_a_user.is_none() && card.claim_b_user.is_none());
        assert!(!card.matched);
        *per_code.entry(card.code.as_str()).or_default() += 1;
    }
    assert_eq!(per_code.len(), 10);
    assert!(per_code.values().all(|&n| n == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_initializers_create_one_pool() {
    let h = harness();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pools = h.engine.pools.clone();
            tokio::spawn(async move { pools.initialize(5).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(PoolError::PoolAlreadyActive) => {}
            Err(e) => panic!("unexpected pool error: {e}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.store.list_active_cards().await.unwrap().len(), 10);
}

#[tokio::test]
async fn deactivate_allows_a_fresh_pool() {
    let h = harness();
    let first = h.engine.pools.initialize(2).await.unwrap();

    let retired = h.engine.pools.deactivate().await.unwrap().unwrap();
    assert_eq!(retired.id, first.id);
    assert!(!retired.active);
    assert!(h.store.list_active_cards().await.unwrap().is_empty());

    let second = h.engine.pools.initialize(2).await.unwrap();
    assert_ne!(second.id, first.id);
    assert_eq!(h.store.list_active_cards().await.unwrap().len(), 4);
}
