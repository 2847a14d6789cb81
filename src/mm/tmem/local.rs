//! # Store Local (host emulado)
//!
//! Implementação de `TmemTransport` que executa os comandos dentro do
//! próprio guest. Serve de dublê para o self-test de boot e para os testes
//! unitários, com a mesma semântica que o cliente espera do host:
//!
//! - `GET` é "move": a entrada sai do store no hit;
//! - miss não toca no frame de destino;
//! - `PUT` sobre uma entrada existente sobrescreve;
//! - `DESTROY_POOL` descarta o pool inteiro;
//! - comandos reservados falham.
//!
//! Injeção de falhas: despejo forçado (`evict`, `evict_all`), recusa de puts,
//! capacidade máxima e contagem de chamadas ao transporte.
//!
//! O conteúdo de um frame é acessado pelo PFN através de um `FrameAccess`:
//! `DirectMap` usa o HHDM (kernel), `FrameArena` usa frames de heap com PFNs
//! sintéticos (testes no host, self-test).

use super::config::TMEM_CLI;
use super::pool::PoolId;
use super::proto::{decode_flags, decode_pageshift, Payload, PoolFlags, RawTmemOp, Status, TmemCmd, TmemOid};
use super::transport::TmemTransport;
use crate::mm::addr::PageFrame;
use crate::mm::config::PAGE_SIZE;
use crate::mm::hhdm;
use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU64, Ordering};
use spin::Mutex;

// =============================================================================
// ACESSO A FRAMES
// =============================================================================

/// Resolve um PFN (como aparece no registro de comando) em memória.
pub trait FrameAccess: Send + Sync {
    /// Primeiro byte do frame, ou `None` se o PFN não pertence a esta fonte.
    fn frame_ptr(&self, pfn: u32) -> Option<NonNull<u8>>;
}

impl<F: FrameAccess + ?Sized> FrameAccess for &F {
    fn frame_ptr(&self, pfn: u32) -> Option<NonNull<u8>> {
        (**self).frame_ptr(pfn)
    }
}

impl<F: FrameAccess + ?Sized> FrameAccess for Arc<F> {
    fn frame_ptr(&self, pfn: u32) -> Option<NonNull<u8>> {
        (**self).frame_ptr(pfn)
    }
}

/// Frames reais via HHDM
pub struct DirectMap;

impl FrameAccess for DirectMap {
    fn frame_ptr(&self, pfn: u32) -> Option<NonNull<u8>> {
        if !hhdm::is_initialized() {
            return None;
        }
        NonNull::new(hhdm::frame_ptr(PageFrame::from_pfn(pfn as u64)))
    }
}

/// Primeiro PFN sintético de uma `FrameArena`
pub const ARENA_FIRST_PFN: u64 = 0x100;

/// Bloco contíguo de frames alinhados a página, alocados no heap.
///
/// Os frames recebem PFNs sintéticos a partir de `ARENA_FIRST_PFN`, sempre
/// dentro dos 32 bits do registro de comando.
pub struct FrameArena {
    base: NonNull<u8>,
    count: usize,
}

// SAFETY: a arena é dona exclusiva da memória; acessos concorrentes ao
// mesmo frame são responsabilidade do caller, como com frames físicos.
unsafe impl Send for FrameArena {}
unsafe impl Sync for FrameArena {}

impl FrameArena {
    /// Aloca `count` frames zerados. `None` se `count == 0` ou sem memória.
    pub fn new(count: usize) -> Option<Self> {
        let layout = Self::layout(count)?;
        // SAFETY: layout com tamanho não nulo
        let base = NonNull::new(unsafe { alloc_zeroed(layout) })?;
        Some(Self { base, count })
    }

    fn layout(count: usize) -> Option<Layout> {
        if count == 0 {
            return None;
        }
        let size = count.checked_mul(PAGE_SIZE)?;
        Layout::from_size_align(size, PAGE_SIZE).ok()
    }

    /// Número de frames
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Frame `i` da arena
    pub fn frame(&self, i: usize) -> Option<PageFrame> {
        (i < self.count).then(|| PageFrame::from_pfn(ARENA_FIRST_PFN + i as u64))
    }

    fn slot(&self, frame: PageFrame) -> Option<NonNull<u8>> {
        let i = frame.pfn().checked_sub(ARENA_FIRST_PFN)? as usize;
        if i >= self.count {
            return None;
        }
        // SAFETY: i < count, dentro da alocação
        NonNull::new(unsafe { self.base.as_ptr().add(i * PAGE_SIZE) })
    }

    /// Preenche o frame inteiro com `byte`.
    pub fn fill(&self, frame: PageFrame, byte: u8) -> bool {
        match self.slot(frame) {
            Some(ptr) => {
                // SAFETY: PAGE_SIZE bytes a partir de um frame da arena
                unsafe { core::ptr::write_bytes(ptr.as_ptr(), byte, PAGE_SIZE) };
                true
            }
            None => false,
        }
    }

    /// Copia `data` (até uma página) para o início do frame.
    pub fn write(&self, frame: PageFrame, data: &[u8]) -> bool {
        let len = data.len().min(PAGE_SIZE);
        match self.slot(frame) {
            Some(ptr) => {
                // SAFETY: len <= PAGE_SIZE; origem e destino não se sobrepõem
                unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), len) };
                true
            }
            None => false,
        }
    }

    /// Cópia do conteúdo do frame
    pub fn read(&self, frame: PageFrame) -> Option<Vec<u8>> {
        let ptr = self.slot(frame)?;
        // SAFETY: PAGE_SIZE bytes inicializados (alloc_zeroed)
        let page = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), PAGE_SIZE) };
        Some(page.to_vec())
    }
}

impl FrameAccess for FrameArena {
    fn frame_ptr(&self, pfn: u32) -> Option<NonNull<u8>> {
        self.slot(PageFrame::from_pfn(pfn as u64))
    }
}

impl Drop for FrameArena {
    fn drop(&mut self) {
        if let Some(layout) = Self::layout(self.count) {
            // SAFETY: mesmo layout usado em `new`
            unsafe { dealloc(self.base.as_ptr(), layout) };
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

type Object = BTreeMap<u32, Box<[u8]>>;

struct LocalPool {
    flags: u32,
    objects: BTreeMap<TmemOid, Object>,
}

impl LocalPool {
    fn page_count(&self) -> usize {
        self.objects.values().map(BTreeMap::len).sum()
    }
}

struct StoreState {
    pools: BTreeMap<i32, LocalPool>,
    next_pool: i32,
    max_pages: usize,
    used: usize,
    reject_puts: bool,
}

/// Host tmem emulado.
pub struct LocalStore<F: FrameAccess> {
    frames: F,
    state: Mutex<StoreState>,
    calls: AtomicU64,
}

impl<F: FrameAccess> LocalStore<F> {
    /// Store sem limite de capacidade
    pub fn new(frames: F) -> Self {
        Self::with_capacity(frames, usize::MAX)
    }

    /// Store que recusa puts novos acima de `max_pages` páginas
    pub fn with_capacity(frames: F, max_pages: usize) -> Self {
        Self {
            frames,
            state: Mutex::new(StoreState {
                pools: BTreeMap::new(),
                next_pool: 0,
                max_pages,
                used: 0,
                reject_puts: false,
            }),
            calls: AtomicU64::new(0),
        }
    }

    /// Fonte dos frames
    pub fn frames(&self) -> &F {
        &self.frames
    }

    // -------------------------------------------------------------------------
    // Injeção de falhas e inspeção
    // -------------------------------------------------------------------------

    /// Próximo handle devolvido por NEW_POOL
    pub fn set_next_pool_id(&self, id: i32) {
        self.state.lock().next_pool = id;
    }

    /// Faz todo PUT falhar (host sem memória)
    pub fn set_reject_puts(&self, reject: bool) {
        self.state.lock().reject_puts = reject;
    }

    /// Despeja uma página, como o host faria sob pressão.
    pub fn evict(&self, pool: PoolId, oid: TmemOid, index: u32) -> bool {
        let mut state = self.state.lock();
        let removed = state
            .pools
            .get_mut(&pool.as_i32())
            .is_some_and(|p| remove_page(p, &oid, index).is_some());
        if removed {
            state.used -= 1;
        }
        removed
    }

    /// Despeja todas as páginas de todos os pools (pools continuam vivos).
    pub fn evict_all(&self) {
        let mut state = self.state.lock();
        for pool in state.pools.values_mut() {
            pool.objects.clear();
        }
        state.used = 0;
    }

    /// Total de chamadas recebidas pelo transporte
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Páginas armazenadas em todos os pools
    pub fn page_count(&self) -> usize {
        self.state.lock().used
    }

    pub fn pool_count(&self) -> usize {
        self.state.lock().pools.len()
    }

    /// Flags (PERSIST/SHARED) com que o pool foi criado
    pub fn pool_flags(&self, pool: PoolId) -> Option<PoolFlags> {
        self.state
            .lock()
            .pools
            .get(&pool.as_i32())
            .map(|p| decode_flags(p.flags))
    }

    pub fn contains(&self, pool: PoolId, oid: TmemOid, index: u32) -> bool {
        self.state
            .lock()
            .pools
            .get(&pool.as_i32())
            .and_then(|p| p.objects.get(&oid))
            .is_some_and(|obj| obj.contains_key(&index))
    }

    // -------------------------------------------------------------------------
    // Execução
    // -------------------------------------------------------------------------

    fn execute(&self, raw: &RawTmemOp) -> Status {
        let Ok(op) = raw.decode() else {
            return Status::FAILURE;
        };
        let mut state = self.state.lock();

        let args = match *op.payload() {
            Payload::NewPool(args) => {
                // Só páginas de 4 KiB: os frames têm PAGE_SIZE bytes
                if args.cli_id != TMEM_CLI || decode_pageshift(args.flags) != 0 {
                    return Status::FAILURE;
                }
                let id = state.next_pool;
                state.next_pool = id.wrapping_add(1);
                state.pools.insert(
                    id,
                    LocalPool {
                        flags: args.flags,
                        objects: BTreeMap::new(),
                    },
                );
                return Status::pool(PoolId::new(id));
            }
            Payload::Generic(args) => args,
        };

        let pool_id = op.pool().as_i32();
        if !state.pools.contains_key(&pool_id) {
            return Status::FAILURE;
        }

        match op.cmd() {
            TmemCmd::DestroyPool => {
                if let Some(pool) = state.pools.remove(&pool_id) {
                    state.used -= pool.page_count();
                }
                Status::SUCCESS
            }

            TmemCmd::PutPage => {
                let Some(src) = self.frames.frame_ptr(args.pfn) else {
                    return Status::FAILURE;
                };
                if state.reject_puts {
                    return Status::FAILURE;
                }
                // SAFETY: o FrameAccess garante PAGE_SIZE bytes válidos
                let page: Box<[u8]> =
                    unsafe { core::slice::from_raw_parts(src.as_ptr(), PAGE_SIZE) }.into();

                let (used, max) = (state.used, state.max_pages);
                let Some(pool) = state.pools.get_mut(&pool_id) else {
                    return Status::FAILURE;
                };
                let obj = pool.objects.entry(args.oid).or_default();
                if let Some(slot) = obj.get_mut(&args.index) {
                    *slot = page;
                    return Status::SUCCESS;
                }
                if used >= max {
                    if obj.is_empty() {
                        pool.objects.remove(&args.oid);
                    }
                    return Status::FAILURE;
                }
                obj.insert(args.index, page);
                state.used += 1;
                Status::SUCCESS
            }

            TmemCmd::GetPage => {
                let Some(dst) = self.frames.frame_ptr(args.pfn) else {
                    return Status::FAILURE;
                };
                let Some(pool) = state.pools.get_mut(&pool_id) else {
                    return Status::FAILURE;
                };
                let Some(page) = remove_page(pool, &args.oid, args.index) else {
                    return Status::FAILURE;
                };
                // SAFETY: página armazenada tem PAGE_SIZE bytes; destino idem
                unsafe { core::ptr::copy_nonoverlapping(page.as_ptr(), dst.as_ptr(), PAGE_SIZE) };
                state.used -= 1;
                Status::SUCCESS
            }

            TmemCmd::FlushPage => {
                let removed = state
                    .pools
                    .get_mut(&pool_id)
                    .and_then(|p| remove_page(p, &args.oid, args.index));
                match removed {
                    Some(_) => {
                        state.used -= 1;
                        Status::SUCCESS
                    }
                    None => Status::FAILURE,
                }
            }

            TmemCmd::FlushObject => {
                let removed = state
                    .pools
                    .get_mut(&pool_id)
                    .and_then(|p| p.objects.remove(&args.oid));
                match removed {
                    Some(obj) => {
                        state.used -= obj.len();
                        Status::SUCCESS
                    }
                    None => Status::FAILURE,
                }
            }

            // CONTROL e comandos reservados não são suportados
            _ => Status::FAILURE,
        }
    }
}

fn remove_page(pool: &mut LocalPool, oid: &TmemOid, index: u32) -> Option<Box<[u8]>> {
    let obj = pool.objects.get_mut(oid)?;
    let page = obj.remove(&index)?;
    if obj.is_empty() {
        pool.objects.remove(oid);
    }
    Some(page)
}

impl<F: FrameAccess> TmemTransport for LocalStore<F> {
    fn call(&self, op: &RawTmemOp) -> i64 {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.execute(op).to_raw()
    }
}
