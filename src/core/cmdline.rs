/// Arquivo: core/cmdline.rs
///
/// Propósito: Parser da Linha de Comando do Kernel.
/// Os toggles do tmem (`tmem`, `nocleancache`, `nofrontswap`) são lidos daqui.
///
/// Detalhes de Implementação:
/// - Armazenamento estático (sem heap) para estar disponível muito cedo no boot.
/// - Parâmetros separados por espaços; `chave=valor` ou flag sem valor.
use spin::Once;

/// Tamanho máximo da linha de comando
const CMDLINE_MAX_LEN: usize = 256;

pub struct CommandLine {
    buffer: [u8; CMDLINE_MAX_LEN],
    len: usize,
}

impl CommandLine {
    /// Copia a linha de comando fornecida pelo bootloader (truncada em 256 bytes).
    pub fn new(args: &str) -> Self {
        let mut len = core::cmp::min(args.len(), CMDLINE_MAX_LEN);
        // Não cortar no meio de um caractere UTF-8
        while !args.is_char_boundary(len) {
            len -= 1;
        }

        let mut buffer = [0u8; CMDLINE_MAX_LEN];
        buffer[..len].copy_from_slice(&args.as_bytes()[..len]);
        Self { buffer, len }
    }

    /// Texto bruto da linha de comando.
    pub fn as_str(&self) -> &str {
        // Sempre cortado em fronteira de caractere em `new`
        core::str::from_utf8(&self.buffer[..self.len]).unwrap_or("")
    }

    /// Verifica se uma flag (chave sem valor) ou parâmetro existe.
    pub fn has(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Obtém o valor de um parâmetro (ex: "root" -> "/dev/sda").
    /// Se for flag ("tmem"), retorna Some("").
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_value(key)
    }

    fn get_value(&self, key: &str) -> Option<&str> {
        if key.is_empty() {
            return None;
        }

        // Último parâmetro vence, como no Linux
        let mut found = None;
        for param in self.as_str().split_ascii_whitespace() {
            match param.split_once('=') {
                Some((k, v)) if k == key => found = Some(v),
                None if param == key => found = Some(""),
                _ => {}
            }
        }
        found
    }
}

/// Instância global da linha de comando
static CMDLINE: Once<CommandLine> = Once::new();

/// Inicializa a linha de comando global. Chamadas seguintes são ignoradas.
pub fn init(args: &str) -> &'static CommandLine {
    let cmdline = CMDLINE.call_once(|| CommandLine::new(args));
    crate::kinfo!("(CMDLINE) Parâmetros (bytes)=", cmdline.len);
    cmdline
}

/// Linha de comando global, se já inicializada.
pub fn get() -> Option<&'static CommandLine> {
    CMDLINE.get()
}
