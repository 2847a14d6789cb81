//! Testes do adaptador frontswap

#![cfg(test)]

use super::{create_fixture, ScriptedHost};
use crate::mm::tmem::config::SWIZ_MASK;
use crate::mm::tmem::proto::{Payload, PoolFlags, RawTmemOp, Status, TmemCmd};
use crate::mm::tmem::{
    swizzle_index, swizzle_oid, swizzle_type, FrontswapOps, Miss, PoolId, TmemFrontswap,
    TmemTransport,
};
use crate::mm::PageFrame;
use alloc::sync::{Arc, Weak};
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Once;

#[test]
fn test_swizzle_properties() {
    for swap_type in 0..16u32 {
        for offset in [0u32, 1, 15, 16, 0xFFFF, 0x1234_5678, u32::MAX] {
            let oid = swizzle_oid(swap_type, offset);
            assert_eq!(swizzle_type(&oid), swap_type);
            assert_eq!(oid, swizzle_oid(swap_type, offset.wrapping_add(16 * 3)));
        }
    }
    assert_ne!(swizzle_oid(1, 0), swizzle_oid(2, 0));
    assert_ne!(swizzle_oid(1, 0), swizzle_oid(1, 1));
    assert_eq!(swizzle_index(0x10), 1);
}

#[test]
fn test_init_creates_persist_pool_once() {
    let fx = create_fixture(1);
    let fs = TmemFrontswap::new(fx.store.clone());
    assert_eq!(fs.pool(), PoolId::INVALID);

    fs.init(0);
    let pool = fs.pool();
    assert!(pool.is_valid());
    assert_eq!(fx.store.pool_flags(pool), Some(PoolFlags::PERSIST));

    fs.init(1);
    assert_eq!(fs.pool(), pool);
    assert_eq!(fx.store.pool_count(), 1);
}

#[test]
fn test_init_failure_leaves_pool_invalid() {
    let fs = TmemFrontswap::new(ScriptedHost::new(Status::FAILURE));
    fs.init(0);
    assert_eq!(fs.pool(), PoolId::INVALID);
    assert_eq!(
        fs.put_page(0, 0, PageFrame::from_pfn(1)),
        Err(Miss)
    );
    // Só o NEW_POOL chegou ao host
    assert_eq!(fs.client().transport().calls(), 1);
}

#[test]
fn test_round_trip_and_move() {
    let fx = create_fixture(2);
    let fs = TmemFrontswap::new(fx.store.clone());
    fs.init(0);

    fx.arena.fill(fx.frame(0), 0x77);
    assert_eq!(fs.put_page(2, 0x4321, fx.frame(0)), Ok(()));
    assert!(fx
        .store
        .contains(fs.pool(), swizzle_oid(2, 0x4321), swizzle_index(0x4321)));

    assert_eq!(fs.get_page(2, 0x4321, fx.frame(1)), Ok(()));
    assert!(fx.page_is(fx.frame(1), 0x77));
    assert_eq!(fs.get_page(2, 0x4321, fx.frame(1)), Err(Miss));
}

#[test]
fn test_devices_do_not_collide() {
    let fx = create_fixture(3);
    let fs = TmemFrontswap::new(fx.store.clone());
    fs.init(0);

    fx.arena.fill(fx.frame(0), 0x01);
    fs.put_page(0, 100, fx.frame(0)).unwrap();
    fx.arena.fill(fx.frame(0), 0x02);
    fs.put_page(1, 100, fx.frame(0)).unwrap();

    fs.get_page(0, 100, fx.frame(1)).unwrap();
    fs.get_page(1, 100, fx.frame(2)).unwrap();
    assert!(fx.page_is(fx.frame(1), 0x01));
    assert!(fx.page_is(fx.frame(2), 0x02));
}

#[test]
fn test_put_rejected_by_host() {
    let fx = create_fixture(1);
    let fs = TmemFrontswap::new(fx.store.clone());
    fs.init(0);
    fx.store.set_reject_puts(true);

    assert_eq!(fs.put_page(0, 1, fx.frame(0)), Err(Miss));
    assert_eq!(fs.stats().put_failures, 1);
}

#[test]
fn test_invalidate_page() {
    let fx = create_fixture(2);
    let fs = TmemFrontswap::new(fx.store.clone());
    fs.init(0);

    fs.put_page(0, 5, fx.frame(0)).unwrap();
    fs.invalidate_page(0, 5);
    assert_eq!(fs.get_page(0, 5, fx.frame(1)), Err(Miss));
}

#[test]
fn test_invalidate_area_flushes_sixteen_objects_then_destroys() {
    let host = ScriptedHost::new(Status::SUCCESS);
    host.push_reply(Status::pool(PoolId::new(4)));
    let fs = TmemFrontswap::new(host);
    fs.init(0);
    fs.invalidate_area(3);

    let ops = fs.client().transport().ops();
    assert_eq!(ops.len(), 1 + 16 + 1);
    assert_eq!(ops[0].cmd(), TmemCmd::NewPool);

    for (i, op) in ops[1..17].iter().enumerate() {
        assert_eq!(op.cmd(), TmemCmd::FlushObject);
        assert_eq!(op.pool(), PoolId::new(4));
        let expected = swizzle_oid(3, SWIZ_MASK - i as u32);
        match op.payload() {
            Payload::Generic(args) => assert_eq!(args.oid, expected),
            other => panic!("payload inesperado: {:?}", other),
        }
    }
    assert_eq!(ops[17].cmd(), TmemCmd::DestroyPool);
    assert_eq!(ops[17].pool(), PoolId::new(4));
    assert_eq!(fs.pool(), PoolId::INVALID);
}

#[test]
fn test_invalidate_area_breaks_every_device_until_init() {
    let fx = create_fixture(2);
    let fs = TmemFrontswap::new(fx.store.clone());
    fs.init(0);
    fs.init(1);

    fs.put_page(1, 9, fx.frame(0)).unwrap();
    fs.invalidate_area(0);

    assert_eq!(fx.store.pool_count(), 0);
    // Dispositivo 1 perdeu o pool junto
    assert_eq!(fs.put_page(1, 9, fx.frame(0)), Err(Miss));
    assert_eq!(fs.get_page(1, 9, fx.frame(1)), Err(Miss));

    let calls = fx.store.calls();
    fs.invalidate_area(1);
    assert_eq!(fx.store.calls(), calls);

    fs.init(1);
    assert!(fs.pool().is_valid());
    assert_eq!(fs.put_page(1, 9, fx.frame(0)), Ok(()));
}

#[test]
fn test_wide_offset_never_reaches_host() {
    let host = ScriptedHost::new(Status::SUCCESS);
    host.push_reply(Status::pool(PoolId::new(0)));
    let fs = TmemFrontswap::new(host);
    fs.init(0);
    let calls = fs.client().transport().calls();

    let wide = u32::MAX as u64 + 1;
    let frame = PageFrame::from_pfn(0x20);
    assert_eq!(fs.put_page(0, wide, frame), Err(Miss));
    assert_eq!(fs.get_page(0, wide, frame), Err(Miss));
    fs.invalidate_page(0, wide);

    assert_eq!(fs.client().transport().calls(), calls);
    assert_eq!(fs.stats().bypassed, 3);
}

#[test]
fn test_invalidate_area_resets_handle_when_destroy_refused() {
    let host = ScriptedHost::new(Status::FAILURE);
    host.push_reply(Status::pool(PoolId::new(4)));
    let fs = TmemFrontswap::new(host);
    fs.init(0);
    assert_eq!(fs.pool(), PoolId::new(4));

    fs.invalidate_area(0);

    let ops = fs.client().transport().ops();
    assert_eq!(ops.last().map(|op| op.cmd()), Some(TmemCmd::DestroyPool));
    assert_eq!(fs.pool(), PoolId::INVALID);
    let stats = fs.stats();
    assert_eq!((stats.flushes, stats.pool_destroys), (0, 0));
}

/// Host que, no primeiro NEW_POOL, dispara um `init` concorrente antes de
/// responder.
struct ReentrantHost {
    inner: ScriptedHost,
    fs: Once<Weak<TmemFrontswap<Arc<ReentrantHost>>>>,
    reentered: AtomicBool,
}

impl TmemTransport for ReentrantHost {
    fn call(&self, op: &RawTmemOp) -> i64 {
        if op.cmd == TmemCmd::NewPool.as_raw() && !self.reentered.swap(true, Ordering::SeqCst) {
            if let Some(fs) = self.fs.get().and_then(Weak::upgrade) {
                fs.init(1);
            }
        }
        self.inner.call(op)
    }
}

#[test]
fn test_init_race_loser_destroys_extra_pool() {
    let inner = ScriptedHost::new(Status::SUCCESS);
    inner.push_reply(Status::pool(PoolId::new(7)));
    inner.push_reply(Status::pool(PoolId::new(4)));
    let host = Arc::new(ReentrantHost {
        inner,
        fs: Once::new(),
        reentered: AtomicBool::new(false),
    });
    let fs = Arc::new(TmemFrontswap::new(host.clone()));
    host.fs.call_once(|| Arc::downgrade(&fs));

    fs.init(0);

    // O init interno ganhou com o pool 7; o externo devolve o pool 4
    assert_eq!(fs.pool(), PoolId::new(7));
    let ops = host.inner.ops();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].cmd(), TmemCmd::NewPool);
    assert_eq!(ops[1].cmd(), TmemCmd::NewPool);
    assert_eq!(ops[2].cmd(), TmemCmd::DestroyPool);
    assert_eq!(ops[2].pool(), PoolId::new(4));
}

#[test]
fn test_flush_counted_only_when_host_accepts() {
    let fx = create_fixture(1);
    let fs = TmemFrontswap::new(fx.store.clone());
    fs.init(0);

    fs.put_page(0, 0, fx.frame(0)).unwrap();
    fs.put_page(0, 1, fx.frame(0)).unwrap();
    fs.invalidate_page(0, 0);
    fs.invalidate_page(0, 0);
    assert_eq!(fs.stats().flushes, 1);

    // Só o objeto do offset 1 ainda existe entre os 16
    fs.invalidate_area(0);
    assert_eq!(fs.stats().flushes, 2);
}
