//! Testes de integração do tmem
//!
//! Cenários de ponta a ponta: mount/umount de filesystem, swapoff e o
//! registro dos backends no boot.

#![cfg(test)]

use super::create_fixture;
use crate::core::cmdline::CommandLine;
use crate::mm::tmem::{
    self, ret_code, FileKey, FrameArena, FrontswapOps, LocalStore, Miss, PoolId, TmemConfig,
};
use alloc::sync::Arc;

#[test]
fn integration_mount_put_get_umount() {
    let fx = create_fixture(2);
    fx.store.set_next_pool_id(5);
    let backends = tmem::init(&TmemConfig::ALL, fx.store.clone());
    let cc = backends.cleancache_ops().expect("cleancache habilitado");

    let pool = cc.init_fs(4096);
    assert_eq!(pool, PoolId::new(5));

    let key_a = FileKey::from_ino(0xA);
    fx.arena.fill(fx.frame(0), 0x3C);
    cc.put_page(pool, key_a, 0, fx.frame(0));

    let res = cc.get_page(pool, key_a, 0, fx.frame(1));
    assert_eq!(ret_code(&res), 0);
    assert!(fx.page_is(fx.frame(1), 0x3C));

    cc.put_page(pool, key_a, 0, fx.frame(0));
    cc.invalidate_fs(pool);
    assert_eq!(cc.get_page(pool, key_a, 0, fx.frame(1)), Err(Miss));
    assert_eq!(fx.store.pool_count(), 0);
    assert_eq!(fx.store.page_count(), 0);
}

#[test]
fn integration_host_drops_everything() {
    let fx = create_fixture(2);
    let backends = tmem::init(&TmemConfig::ALL, fx.store.clone());
    let cc = backends.cleancache_ops().expect("cleancache habilitado");
    let fs = backends.frontswap_ops().expect("frontswap habilitado");

    let pool = cc.init_fs(4096);
    fs.init(0);
    cc.put_page(pool, FileKey::from_ino(1), 0, fx.frame(0));
    fs.put_page(0, 0, fx.frame(0)).unwrap();

    fx.store.evict_all();
    fx.arena.fill(fx.frame(1), 0x99);
    assert_eq!(cc.get_page(pool, FileKey::from_ino(1), 0, fx.frame(1)), Err(Miss));
    assert_eq!(fs.get_page(0, 0, fx.frame(1)), Err(Miss));
    assert!(fx.page_is(fx.frame(1), 0x99));
}

#[test]
fn integration_backends_follow_cmdline() {
    let fx = create_fixture(1);

    let off = TmemConfig::from_cmdline(&CommandLine::new("console=ttyS0"));
    let backends = tmem::init(&off, fx.store.clone());
    assert!(backends.cleancache_ops().is_none());
    assert!(backends.frontswap_ops().is_none());

    let cc_only = TmemConfig::from_cmdline(&CommandLine::new("tmem nofrontswap"));
    let backends = tmem::init(&cc_only, fx.store.clone());
    assert!(backends.cleancache_ops().is_some());
    assert!(backends.frontswap_ops().is_none());

    // Registrar não fala com o host
    assert_eq!(fx.store.calls(), 0);
}

#[test]
fn integration_config_from_boot_cmdline() {
    crate::core::cmdline::init("tmem nofrontswap");
    let config = tmem::config_from_boot();
    assert!(config.use_cleancache());
    assert!(!config.use_frontswap());
}

#[test]
fn integration_capacity_exhausted() {
    let arena = Arc::new(FrameArena::new(1).expect("arena"));
    let store = Arc::new(LocalStore::with_capacity(arena.clone(), 1));
    let backends = tmem::init(&TmemConfig::ALL, store.clone());
    let fs = backends.frontswap.as_ref().expect("frontswap habilitado");
    let frame = arena.frame(0).expect("frame");

    fs.init(0);
    assert_eq!(fs.put_page(0, 0, frame), Ok(()));
    assert_eq!(fs.put_page(0, 1, frame), Err(Miss));
    assert_eq!(fs.stats().put_failures, 1);
    assert_eq!(store.page_count(), 1);
}

#[cfg(feature = "self_test")]
#[test]
fn integration_boot_self_test_passes() {
    let report = crate::mm::tmem::test::run_tmem_tests();
    assert!(report.all_passed(), "{:?}", report);
    assert_eq!(report.skipped, 0);
}
