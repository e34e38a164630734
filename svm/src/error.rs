//! §7 VM error namespace. `OK` isn't a variant here — success is
//! `Ok(())`/`Ok(value)`, as `Result` already gives us that for free.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VmError {
    /// `pc`/`cycle` was called while the VM wasn't running.
    NotRunning,
    /// `pc` ran past the end of the code image.
    CodeOverflow,
    /// A destination argument (e.g. `MOV`'s `dst`) wasn't a register.
    ArgNotReg,
    /// `PUSH`/`POP` with a register range where `rLo >= rHi`.
    PushArgBadOrder,
    /// `JMP`/`INV` target was outside the code image.
    JmpOverflow,
    /// `INV` with no room left on the call stack.
    CallStackOverflow,
    /// `RET` with an empty call stack.
    CallStackUnderflow,
    /// `PUSH` with no room left on the data stack.
    StackOverflow,
    /// `POP` from an empty data stack.
    StackUnderflow,
    /// A scheduler operation referenced a task that doesn't exist.
    TaskNotFound,
    /// `switch` was called while task switching is blocked.
    TaskSwitchBlocked,
    /// The instruction word didn't decode to anything known.
    UnknownInstruction,
    /// `DIV`/`SUB` (division/remainder) by zero (open question 1).
    DivisionByZero,
    /// `task_remove` targeted the sole remaining live task. Refused,
    /// rather than leaving the scheduler with no current task to run.
    NoLiveTasks,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            VmError::NotRunning => "vm is not running",
            VmError::CodeOverflow => "code overflow",
            VmError::ArgNotReg => "argument is not a register",
            VmError::PushArgBadOrder => "register range is out of order",
            VmError::JmpOverflow => "jump target out of range",
            VmError::CallStackOverflow => "call stack overflow",
            VmError::CallStackUnderflow => "call stack underflow",
            VmError::StackOverflow => "stack overflow",
            VmError::StackUnderflow => "stack underflow",
            VmError::TaskNotFound => "task not found",
            VmError::TaskSwitchBlocked => "task switch blocked",
            VmError::UnknownInstruction => "unknown instruction",
            VmError::DivisionByZero => "division by zero",
            VmError::NoLiveTasks => "cannot remove the last live task",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for VmError {}
