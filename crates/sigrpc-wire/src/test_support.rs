use crate::cpu::{Greg, ProcessorState, StReg};
use crate::header::{MessageKind, RpcHeader};
use crate::page::MemoryPage;
use crate::ucontext::UserContext;

pub(crate) fn sample_state() -> ProcessorState {
    let mut state = ProcessorState::default();
    for (i, greg) in state.gregs.iter_mut().enumerate() {
        *greg = 0x1111_0000_0000_0000u64.wrapping_mul(i as u64 + 1) | i as u64;
    }
    state.set_greg(Greg::Rip, 0x7fff_dead_beef);
    state.set_greg(Greg::Rsp, 0x7ffc_0000_1000);
    state.fpregs.cwd = 0x037f;
    state.fpregs.swd = 0x0020;
    state.fpregs.ftw = 0xffff;
    state.fpregs.fop = 0x0001;
    state.fpregs.rip = 0x0040_1000;
    state.fpregs.rdp = 0x0060_2000;
    state.fpregs.mxcsr = 0x1f80;
    state.fpregs.mxcsr_mask = 0xffff;
    state.fpregs.st[3] = StReg {
        significand: [1, 2, 3, 4],
        exponent: 0x3fff,
        reserved: [0, 0, 9],
    };
    state.fpregs.xmm[15].element = [u32::MAX, 0, 0xabcd, 7];
    state.fpregs.reserved[23] = 0x5a5a_5a5a;
    state
}

pub(crate) fn sample_context() -> UserContext {
    UserContext {
        cpu: sample_state(),
        stack_bottom: 0x7ffc_0010_0000,
    }
}

pub(crate) fn sample_page(address: u64, content: &[u8]) -> MemoryPage {
    MemoryPage {
        address,
        runtime_revision: address >> 12,
        client_revision: 3,
        content: content.to_vec(),
    }
}

pub(crate) fn sample_header(kind: MessageKind) -> RpcHeader {
    RpcHeader {
        msg_type: kind.into(),
        status: 0,
        client_id: "node-a-1a2b".to_string(),
        payload_size: 0,
    }
}
