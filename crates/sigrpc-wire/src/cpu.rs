//! Processor state codec.
//!
//! The layout mirrors the x86-64 Linux `mcontext_t` general register set
//! followed by the 512-byte `FXSAVE` area:
//!
//! ```text
//! ┌──────────────────────────┬───────────────────────────────────────────┐
//! │ gregs (23 × u64 LE)      │ fpregs (512 bytes)                        │
//! │ R8 … CR2                 │ cwd swd ftw fop │ rip rdp │ mxcsr mask │   │
//! │                          │ st[8] (16B) │ xmm[16] (16B) │ reserved[24] │
//! └──────────────────────────┴───────────────────────────────────────────┘
//! ```

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_remaining, Result};

/// General-purpose register indices, in `gregset_t` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Greg {
    R8 = 0,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    Rdi,
    Rsi,
    Rbp,
    Rbx,
    Rdx,
    Rax,
    Rcx,
    Rsp,
    Rip,
    Efl,
    Csgsfs,
    Err,
    Trapno,
    Oldmask,
    Cr2,
}

/// Number of general-purpose registers carried on the wire (up to and including `CR2`).
pub const GREG_COUNT: usize = Greg::Cr2 as usize + 1;

/// Size of the floating-point / SIMD block.
pub const FPREGS_SIZE: usize = 512;

/// Encoded size of a [`ProcessorState`].
pub const PROCESSOR_STATE_SIZE: usize = 8 * GREG_COUNT + FPREGS_SIZE;

/// One x87 stack register slot (80-bit value padded to 16 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StReg {
    pub significand: [u16; 4],
    pub exponent: u16,
    pub reserved: [u16; 3],
}

/// One 128-bit SIMD register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmmReg {
    pub element: [u32; 4],
}

/// Floating-point / SIMD register block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpRegs {
    pub cwd: u16,
    pub swd: u16,
    pub ftw: u16,
    pub fop: u16,
    pub rip: u64,
    pub rdp: u64,
    pub mxcsr: u32,
    pub mxcsr_mask: u32,
    pub st: [StReg; 8],
    pub xmm: [XmmReg; 16],
    pub reserved: [u32; 24],
}

/// Snapshot of a thread's register file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorState {
    pub gregs: [u64; GREG_COUNT],
    pub fpregs: FpRegs,
}

impl ProcessorState {
    /// Read a general-purpose register.
    pub fn greg(&self, reg: Greg) -> u64 {
        self.gregs[reg as usize]
    }

    /// Overwrite a general-purpose register.
    pub fn set_greg(&mut self, reg: Greg, value: u64) {
        self.gregs[reg as usize] = value;
    }
}

/// Stateless codec for [`ProcessorState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessorStateCodec;

impl ProcessorStateCodec {
    /// Append exactly [`PROCESSOR_STATE_SIZE`] bytes to `dst`.
    pub fn encode(&self, state: &ProcessorState, dst: &mut impl BufMut) {
        for greg in state.gregs {
            dst.put_u64_le(greg);
        }

        let fp = &state.fpregs;
        dst.put_u16_le(fp.cwd);
        dst.put_u16_le(fp.swd);
        dst.put_u16_le(fp.ftw);
        dst.put_u16_le(fp.fop);
        dst.put_u64_le(fp.rip);
        dst.put_u64_le(fp.rdp);
        dst.put_u32_le(fp.mxcsr);
        dst.put_u32_le(fp.mxcsr_mask);
        for st in &fp.st {
            for word in st.significand {
                dst.put_u16_le(word);
            }
            dst.put_u16_le(st.exponent);
            for word in st.reserved {
                dst.put_u16_le(word);
            }
        }
        for xmm in &fp.xmm {
            for element in xmm.element {
                dst.put_u32_le(element);
            }
        }
        for word in fp.reserved {
            dst.put_u32_le(word);
        }
    }

    /// Consume exactly [`PROCESSOR_STATE_SIZE`] bytes from `src`.
    ///
    /// Register values are taken verbatim; only the length is checked.
    pub fn decode(&self, src: &mut impl Buf) -> Result<ProcessorState> {
        ensure_remaining(src, "processor state", PROCESSOR_STATE_SIZE)?;

        let mut state = ProcessorState::default();
        for greg in state.gregs.iter_mut() {
            *greg = src.get_u64_le();
        }

        let fp = &mut state.fpregs;
        fp.cwd = src.get_u16_le();
        fp.swd = src.get_u16_le();
        fp.ftw = src.get_u16_le();
        fp.fop = src.get_u16_le();
        fp.rip = src.get_u64_le();
        fp.rdp = src.get_u64_le();
        fp.mxcsr = src.get_u32_le();
        fp.mxcsr_mask = src.get_u32_le();
        for st in fp.st.iter_mut() {
            for word in st.significand.iter_mut() {
                *word = src.get_u16_le();
            }
            st.exponent = src.get_u16_le();
            for word in st.reserved.iter_mut() {
                *word = src.get_u16_le();
            }
        }
        for xmm in fp.xmm.iter_mut() {
            for element in xmm.element.iter_mut() {
                *element = src.get_u32_le();
            }
        }
        for word in fp.reserved.iter_mut() {
            *word = src.get_u32_le();
        }

        Ok(state)
    }
}
