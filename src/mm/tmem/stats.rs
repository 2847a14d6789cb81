//! # Estatísticas do tmem
//!
//! Contadores por adaptador. Só informativos: nenhuma decisão depende deles.

use core::sync::atomic::{AtomicU64, Ordering};

/// Contadores atômicos de um adaptador
#[derive(Debug, Default)]
pub struct TmemStats {
    puts: AtomicU64,
    put_failures: AtomicU64,
    gets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Flushes aceitos pelo host (um por página ou objeto)
    flushes: AtomicU64,
    pool_creates: AtomicU64,
    pool_destroys: AtomicU64,
    /// Operações descartadas antes do transporte (pool inválido, índice largo)
    bypassed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TmemStatsSnapshot {
    pub puts: u64,
    pub put_failures: u64,
    pub gets: u64,
    pub hits: u64,
    pub misses: u64,
    pub flushes: u64,
    pub pool_creates: u64,
    pub pool_destroys: u64,
    pub bypassed: u64,
}

impl TmemStatsSnapshot {
    /// Hits sobre gets, em porcento
    pub fn hit_percent(&self) -> u64 {
        if self.gets == 0 {
            return 0;
        }
        (self.hits * 100) / self.gets
    }
}

impl TmemStats {
    pub const fn new() -> Self {
        Self {
            puts: AtomicU64::new(0),
            put_failures: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            pool_creates: AtomicU64::new(0),
            pool_destroys: AtomicU64::new(0),
            bypassed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_put(&self, ok: bool) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.put_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_pool_create(&self) {
        self.pool_creates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_pool_destroy(&self) {
        self.pool_destroys.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TmemStatsSnapshot {
        TmemStatsSnapshot {
            puts: self.puts.load(Ordering::Relaxed),
            put_failures: self.put_failures.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            pool_creates: self.pool_creates.load(Ordering::Relaxed),
            pool_destroys: self.pool_destroys.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }
}
