//! Tipos de Erro do tmem
//!
//! Erros estruturados da camada cliente. Os adaptadores (cleancache e
//! frontswap) colapsam todos eles em "miss"; só o log distingue a causa.

/// Erros do cliente tmem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmemError {
    /// PFN não cabe no campo de 32 bits do registro de comando
    FrameOutOfRange,
    /// Tamanho de página fora do intervalo codificável
    InvalidPageSize,
    /// Comando desconhecido ou payload incompatível com o comando
    InvalidCommand,
    /// Status de falha reportado pelo host (já normalizado)
    Host(i32),
    /// `FileKey` e `TmemOid` com layouts diferentes
    KeyLayoutMismatch,
}

impl TmemError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrameOutOfRange => "PFN não cabe em 32 bits",
            Self::InvalidPageSize => "Tamanho de página inválido para o tmem",
            Self::InvalidCommand => "Comando tmem inválido",
            Self::Host(_) => "Falha reportada pelo host",
            Self::KeyLayoutMismatch => "FileKey incompatível com TmemOid",
        }
    }
}

impl core::fmt::Display for TmemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Host(status) => write!(f, "{} (status {})", self.as_str(), status),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

/// Tipo Result específico para operações tmem
pub type TmemResult<T> = Result<T, TmemError>;
