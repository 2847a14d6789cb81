//! Testes do subsistema tmem
//!
//! # Como Executar os Testes
//!
//! ```bash
//! # Todos os testes do tmem
//! cargo test --lib mm::tmem::tests
//!
//! # Um módulo específico
//! cargo test --lib mm::tmem::tests::frontswap
//! ```
//!
//! # Estrutura dos Testes
//!
//! - `proto.rs` - Codec de wire e flags de pool
//! - `cleancache.rs` - Adaptador de páginas limpas
//! - `frontswap.rs` - Adaptador de swap e swizzling
//! - `integration.rs` - Cenários completos (mount, swapoff, boot)
//!
//! Os adaptadores rodam contra o `LocalStore` (host emulado) ou contra o
//! `ScriptedHost`, que só grava comandos e devolve status programados.

#![cfg(test)]

pub mod frontswap;
pub mod integration;

use super::local::{FrameArena, LocalStore};
use super::proto::{RawTmemOp, Status, TmemOp};
use super::transport::TmemTransport;
use crate::mm::PageFrame;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

/// Host emulado sobre frames de heap
pub type TestStore = LocalStore<Arc<FrameArena>>;

/// Arena + store compartilhando os mesmos frames
pub struct Fixture {
    pub arena: Arc<FrameArena>,
    pub store: Arc<TestStore>,
}

impl Fixture {
    pub fn frame(&self, i: usize) -> PageFrame {
        self.arena.frame(i).expect("frame fora da arena")
    }

    /// Frame inteiro com o mesmo byte?
    pub fn page_is(&self, frame: PageFrame, byte: u8) -> bool {
        self.arena
            .read(frame)
            .expect("frame fora da arena")
            .iter()
            .all(|&b| b == byte)
    }
}

/// Helper: Cria arena com `frames` frames e um store sem limite
pub fn create_fixture(frames: usize) -> Fixture {
    let arena = Arc::new(FrameArena::new(frames).expect("arena"));
    let store = Arc::new(LocalStore::new(arena.clone()));
    Fixture { arena, store }
}

/// Transporte que grava cada comando e responde com status programados.
pub struct ScriptedHost {
    ops: Mutex<Vec<TmemOp>>,
    replies: Mutex<VecDeque<Status>>,
    fallback: Status,
}

impl ScriptedHost {
    /// Responde sempre `fallback` quando a fila de respostas esvazia
    pub fn new(fallback: Status) -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    pub fn push_reply(&self, status: Status) {
        self.replies.lock().push_back(status);
    }

    pub fn ops(&self) -> Vec<TmemOp> {
        self.ops.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.ops.lock().len()
    }
}

impl TmemTransport for ScriptedHost {
    fn call(&self, op: &RawTmemOp) -> i64 {
        self.ops.lock().push(op.decode().expect("registro inválido"));
        let status = self.replies.lock().pop_front().unwrap_or(self.fallback);
        status.to_raw()
    }
}

#[test]
fn test_fixture_frames_are_distinct() {
    let fx = create_fixture(2);
    assert_ne!(fx.frame(0), fx.frame(1));
    assert!(fx.page_is(fx.frame(0), 0));
}
