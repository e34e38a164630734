//! Component F: the host interface. `SYS` is the sole dynamic
//! extension point; this models it as a capability value handed to the
//! VM at construction, rather than a weak global symbol plus an opaque
//! `ctx` pointer (see REDESIGN FLAGS / design note on the host syscall
//! handler).

use super::constants::REGISTER_COUNT;

/// Implemented by the embedder to service `SYS` instructions. The
/// handler may freely mutate the current task's registers; it has no
/// return value and cannot fault the VM.
pub trait Host {
    fn syscall(&mut self, registers: &mut [i32; REGISTER_COUNT], num: i32);
}

/// A host that ignores every syscall. Useful for tests and for
/// programs that never execute `SYS`.
#[derive(Clone, Copy, Default, Debug)]
pub struct NullHost;

impl Host for NullHost {
    fn syscall(&mut self, _registers: &mut [i32; REGISTER_COUNT], _num: i32) {}
}
