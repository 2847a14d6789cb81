// =============================================================================
// SERIAL DRIVER - ZERO OVERHEAD
// =============================================================================
//
// Driver de Porta Serial (COM1) usado como sink dos logs do tmem.
//
// ARQUITETURA:
// - SEM Mutex/Spinlock - Escrita direta via I/O ports
// - SEM core::fmt - Evita geração de código SSE/AVX
// - SEM alocação - Apenas strings e valores imediatos
//
// ALVOS:
// - x86_64 bare-metal (target_os = "none"): bytes vão para COM1 (0x3F8).
// - Builds hosted (testes unitários no host): I/O ports são privilegiadas,
//   então a saída é descartada.
//
// FUNÇÕES DISPONÍVEIS:
// - emit(byte)       : Envia um byte
// - emit_str(s)      : Envia string
// - emit_hex(v)      : Envia u64 em hexadecimal
// - emit_dec(v)      : Envia usize em decimal
// - emit_nl()        : Envia newline (\r\n)
//
// NOTA: Não há exclusão mútua entre CPUs. Em SMP os logs podem se intercalar.
//
// =============================================================================

// Porta de dados da COM1
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
const COM1_DATA: u16 = 0x3F8;

// Porta de status da COM1 (Line Status Register)
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
const COM1_STATUS: u16 = 0x3FD;

/// Bit 5 do LSR: buffer de transmissão vazio
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
const LSR_THR_EMPTY: u8 = 0x20;

// =============================================================================
// INICIALIZAÇÃO
// =============================================================================

/// Inicializa a porta serial COM1 (UART 16550): 38400 baud, 8N1, FIFO.
///
/// Deve ser chamada uma vez durante o early-boot. No-op em builds hosted.
pub fn init() {
    #[cfg(all(target_arch = "x86_64", target_os = "none"))]
    unsafe {
        port_out(COM1_DATA + 1, 0x00); // IRQs off
        port_out(COM1_DATA + 3, 0x80); // DLAB
        port_out(COM1_DATA, 0x03); // divisor lo (38400)
        port_out(COM1_DATA + 1, 0x00); // divisor hi
        port_out(COM1_DATA + 3, 0x03); // 8N1
        port_out(COM1_DATA + 2, 0xC7); // FIFO, 14 bytes
        port_out(COM1_DATA + 4, 0x0B); // RTS/DSR
    }
}

// =============================================================================
// ESCRITA
// =============================================================================

/// Envia um único byte para a porta serial (busy wait no LSR).
#[inline(always)]
pub fn emit(byte: u8) {
    #[cfg(all(target_arch = "x86_64", target_os = "none"))]
    unsafe {
        while port_in(COM1_STATUS) & LSR_THR_EMPTY == 0 {
            core::hint::spin_loop();
        }
        port_out(COM1_DATA, byte);
    }

    #[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
    let _ = byte;
}

/// Envia uma string para a porta serial.
#[inline(never)]
pub fn emit_str(s: &str) {
    for &b in s.as_bytes() {
        emit(b);
    }
}

/// Envia uma nova linha (CRLF).
#[inline(never)]
pub fn emit_nl() {
    emit(b'\r');
    emit(b'\n');
}

/// Envia um valor u64 em hexadecimal.
///
/// Formato de saída: 0x0123456789ABCDEF (sempre 18 caracteres)
#[inline(never)]
pub fn emit_hex(value: u64) {
    emit(b'0');
    emit(b'x');
    let mut shift: i32 = 60;
    while shift >= 0 {
        emit(nibble_to_ascii(((value >> shift) & 0xF) as u8));
        shift -= 4;
    }
}

/// Envia um valor usize em formato decimal.
///
/// Usa um buffer de stack de 20 bytes (máximo para u64).
#[inline(never)]
pub fn emit_dec(mut value: usize) {
    let mut buf: [u8; 20] = [0; 20];
    let mut pos = 20;

    if value == 0 {
        emit(b'0');
        return;
    }

    while value > 0 {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
    }

    while pos < 20 {
        emit(buf[pos]);
        pos += 1;
    }
}

// =============================================================================
// FUNÇÕES AUXILIARES
// =============================================================================

/// Converte nibble (0-15) para caractere ASCII ('0'-'9', 'A'-'F').
#[inline(always)]
const fn nibble_to_ascii(n: u8) -> u8 {
    if n < 10 {
        b'0' + n
    } else {
        b'A' + (n - 10)
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline(always)]
unsafe fn port_out(port: u16, value: u8) {
    core::arch::asm!(
        "out dx, al",
        in("al") value,
        in("dx") port,
        options(nostack, nomem, preserves_flags)
    );
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline(always)]
unsafe fn port_in(port: u16) -> u8 {
    let value: u8;
    core::arch::asm!(
        "in al, dx",
        out("al") value,
        in("dx") port,
        options(nostack, nomem, preserves_flags)
    );
    value
}
