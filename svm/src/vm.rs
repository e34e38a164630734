//! Component D: the execution engine (§4.D). Fetches, decodes, and
//! dispatches exactly one instruction per [`Vm::cycle`] call for the
//! currently scheduled task.

use tracing::{trace, warn};

use super::constants::{DEFAULT_CALL_STACK_SIZE, DEFAULT_DATA_STACK_SIZE};
use super::encoding::{decode, ArgKind, Ext, Instruction, OpCode};
use super::error::VmError;
use super::host::Host;
use super::scheduler::Scheduler;
use super::task::{Flags, Task, TaskConfig, TaskId};
use super::Word;

/// Per-task stack sizing recorded alongside a code image. Zero means
/// "use the implementation default" (§3, "Code image" entity).
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageMeta {
    pub call_stack_size: u32,
    pub data_stack_size: u32,
}

impl ImageMeta {
    fn resolved(self) -> (usize, usize) {
        let call = if self.call_stack_size == 0 {
            DEFAULT_CALL_STACK_SIZE
        } else {
            self.call_stack_size as usize
        };
        let data = if self.data_stack_size == 0 {
            DEFAULT_DATA_STACK_SIZE
        } else {
            self.data_stack_size as usize
        };
        (call, data)
    }
}

/// The virtual machine. Borrows its code image for as long as it runs
/// (§3: "it does not own the code image; callers keep that alive for
/// the VM's lifetime").
pub struct Vm<'c, H: Host> {
    code: &'c [Word],
    scheduler: Scheduler,
    host: H,
    running: bool,
}

impl<'c, H: Host> Vm<'c, H> {
    pub fn new(code: &'c [Word], meta: ImageMeta, host: H) -> Vm<'c, H> {
        let (call_stack_capacity, data_stack_capacity) = meta.resolved();
        let scheduler = Scheduler::new(TaskConfig {
            entry_pc: 0,
            call_stack_capacity,
            data_stack_capacity,
        });
        Vm {
            code,
            scheduler,
            host,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_task(&self) -> &Task {
        self.scheduler.current()
    }

    pub fn current_task_id(&self) -> TaskId {
        self.scheduler.current_id()
    }

    pub fn task(&self, id: TaskId) -> Result<&Task, VmError> {
        self.scheduler.get(id)
    }

    pub fn task_count(&self) -> usize {
        self.scheduler.task_count()
    }

    pub fn set_task_switch_blocked(&mut self, blocked: bool) {
        self.scheduler.set_switch_blocked(blocked);
    }

    /// Creates a new task entering at `entry_pc`, sharing this VM's code
    /// image and stack-capacity configuration (§4.E).
    pub fn task_create(&mut self, entry_pc: u32) -> TaskId {
        let (call_stack_capacity, data_stack_capacity) = (
            self.scheduler.current().call_stack_capacity(),
            self.scheduler.current().data_stack_capacity(),
        );
        self.scheduler.task_create(TaskConfig {
            entry_pc,
            call_stack_capacity,
            data_stack_capacity,
        })
    }

    pub fn task_remove(&mut self, id: TaskId) -> Result<(), VmError> {
        self.scheduler.task_remove(id)
    }

    /// Advances the scheduler to the next task (§4.E). Does not execute
    /// any instructions itself.
    pub fn task_switch(&mut self) -> Result<TaskId, VmError> {
        self.scheduler.switch()
    }

    /// Executes exactly one instruction for the current task.
    pub fn cycle(&mut self) -> Result<(), VmError> {
        if !self.running {
            return Err(VmError::NotRunning);
        }

        let task = self.scheduler.current_mut();
        if (task.pc() as usize) >= self.code.len() {
            self.running = false;
            warn!(pc = task.pc(), "code overflow");
            return Err(VmError::CodeOverflow);
        }

        let pc = task.pc();
        let word = self.code[pc as usize];
        task.pc = pc + 1;

        let instruction = decode(word).map_err(|_| VmError::UnknownInstruction)?;
        trace!(pc, op = ?instruction.op, ext = ?instruction.ext, "dispatch");

        self.execute(instruction)
    }

    fn read(&mut self, arg: ArgKind) -> Result<i32, VmError> {
        match arg {
            ArgKind::Reg(r) => Ok(self.scheduler.current().register(r as usize)),
            ArgKind::Imm => {
                let task = self.scheduler.current_mut();
                let pc = task.pc();
                if (pc as usize) >= self.code.len() {
                    self.running = false;
                    return Err(VmError::CodeOverflow);
                }
                let value = self.code[pc as usize] as i32;
                task.pc = pc + 1;
                Ok(value)
            }
            ArgKind::None => unreachable!("read() called on an absent argument"),
        }
    }

    fn gate_open(&self, ext: Ext) -> bool {
        match ext.flag_index() {
            None => true,
            Some(idx) => self.scheduler.current().flags().get(idx),
        }
    }

    fn write_dst(&mut self, arg: ArgKind, value: i32) -> Result<(), VmError> {
        let idx = arg.register_index().ok_or(VmError::ArgNotReg)?;
        self.scheduler.current_mut().registers[idx] = value;
        Ok(())
    }

    fn set_nz_z(&mut self, value: i32) {
        let idx = if value == 0 { Ext::Z } else { Ext::Nz };
        let idx = idx.flag_index().unwrap();
        self.scheduler.current_mut().flags.set(idx);
    }

    fn execute(&mut self, instr: Instruction) -> Result<(), VmError> {
        use OpCode::*;

        match instr.op {
            Nop => {
                let _ = self.gate_open(instr.ext);
                Ok(())
            }

            End => {
                if self.gate_open(instr.ext) {
                    self.running = false;
                }
                Ok(())
            }

            Mov => {
                let src = self.read(instr.arg2)?;
                if self.gate_open(instr.ext) {
                    let dst = instr.arg1.register_index().ok_or(VmError::ArgNotReg)?;
                    self.scheduler.current_mut().registers[dst] = src;
                    self.set_nz_z(src);
                }
                Ok(())
            }

            Add | Sub | Mul | Div | And | Or | Xor | Shl | Shr => {
                self.binary_op(instr)
            }

            Cmp => {
                let a = self.read(instr.arg1)?;
                let b = self.read(instr.arg2)?;
                if self.gate_open(instr.ext) {
                    self.compare(a, b);
                }
                Ok(())
            }

            Clf => {
                let flags = &mut self.scheduler.current_mut().flags;
                match instr.ext.flag_index() {
                    None => flags.clear_all(),
                    Some(idx) => flags.clear(idx),
                }
                Ok(())
            }

            Jmp => {
                let target = self.read(instr.arg1)?;
                if self.gate_open(instr.ext) {
                    self.jump(target)?;
                }
                Ok(())
            }

            Inv => {
                let target = self.read(instr.arg1)?;
                if self.gate_open(instr.ext) {
                    let return_pc = self.scheduler.current().pc();
                    if !self.scheduler.current_mut().push_call(return_pc) {
                        return Err(VmError::CallStackOverflow);
                    }
                    self.jump(target)?;
                }
                Ok(())
            }

            Ret => {
                // No condition gate: arg1 is NONE, and RET always executes.
                match self.scheduler.current_mut().pop_call() {
                    Some(return_pc) => {
                        self.scheduler.current_mut().pc = return_pc;
                        Ok(())
                    }
                    None => Err(VmError::CallStackUnderflow),
                }
            }

            Sys => {
                let num = self.read(instr.arg1)?;
                if self.gate_open(instr.ext) {
                    self.host.syscall(&mut self.scheduler.current_mut().registers, num);
                }
                Ok(())
            }

            Push => self.push(instr),
            Pop => self.pop(instr),
        }
    }

    fn binary_op(&mut self, instr: Instruction) -> Result<(), VmError> {
        use OpCode::*;

        let b = self.read(instr.arg2)?;
        if !self.gate_open(instr.ext) {
            return Ok(());
        }
        let dst = instr.arg1.register_index().ok_or(VmError::ArgNotReg)?;
        let a = self.scheduler.current().register(dst);

        let result = match instr.op {
            Add => a.wrapping_add(b),
            Sub => a.wrapping_sub(b),
            Mul => a.wrapping_mul(b),
            Div => {
                if b == 0 {
                    return Err(VmError::DivisionByZero);
                }
                a.wrapping_div(b)
            }
            And => a & b,
            Or => a | b,
            Xor => a ^ b,
            Shl => a.wrapping_shl((b & 0x1f) as u32),
            Shr => a.wrapping_shr((b & 0x1f) as u32),
            _ => unreachable!(),
        };

        self.scheduler.current_mut().registers[dst] = result;
        self.set_nz_z(result);
        Ok(())
    }

    /// `CMP` is the one instruction that fully recomputes its flags on
    /// every call (both the "relation holds" and "relation doesn't
    /// hold" cases), which is what makes `jmp.ne`-style countdown loops
    /// terminate. The broader stickiness rule — nothing but `CLF`
    /// clears a flag — still holds for every *other* instruction:
    /// `ADD`/`MOV`/etc. only ever set `nz`/`z`, never clear them, and
    /// leave the six comparison flags untouched entirely.
    fn compare(&mut self, a: i32, b: i32) {
        let task = self.scheduler.current_mut();
        let assign = |flags: &mut Flags, ext: Ext, value: bool| {
            let idx = ext.flag_index().unwrap();
            if value {
                flags.set(idx);
            } else {
                flags.clear(idx);
            }
        };
        assign(&mut task.flags, Ext::Eq, a == b);
        assign(&mut task.flags, Ext::Ne, a != b);
        assign(&mut task.flags, Ext::Lt, a < b);
        assign(&mut task.flags, Ext::Le, a <= b);
        assign(&mut task.flags, Ext::Gt, a > b);
        assign(&mut task.flags, Ext::Ge, a >= b);
    }

    fn jump(&mut self, target: i32) -> Result<(), VmError> {
        if target < 0 || target as usize >= self.code.len() {
            return Err(VmError::JmpOverflow);
        }
        self.scheduler.current_mut().pc = target as u32;
        Ok(())
    }

    fn push(&mut self, instr: Instruction) -> Result<(), VmError> {
        match (instr.arg1, instr.arg2) {
            (ArgKind::Imm, ArgKind::None) => {
                let value = self.read(ArgKind::Imm)?;
                if !self.gate_open(instr.ext) {
                    return Ok(());
                }
                if !self.scheduler.current_mut().push_data(value) {
                    return Err(VmError::StackOverflow);
                }
                Ok(())
            }
            (ArgKind::Reg(r), ArgKind::None) => {
                if !self.gate_open(instr.ext) {
                    return Ok(());
                }
                let value = self.scheduler.current().register(r as usize);
                if !self.scheduler.current_mut().push_data(value) {
                    return Err(VmError::StackOverflow);
                }
                Ok(())
            }
            (ArgKind::Reg(lo), ArgKind::Reg(hi)) => {
                if !self.gate_open(instr.ext) {
                    return Ok(());
                }
                if lo >= hi {
                    return Err(VmError::PushArgBadOrder);
                }
                for r in lo..=hi {
                    let value = self.scheduler.current().register(r as usize);
                    if !self.scheduler.current_mut().push_data(value) {
                        return Err(VmError::StackOverflow);
                    }
                }
                Ok(())
            }
            _ => Err(VmError::ArgNotReg),
        }
    }

    fn pop(&mut self, instr: Instruction) -> Result<(), VmError> {
        match (instr.arg1, instr.arg2) {
            (ArgKind::Reg(r), ArgKind::None) => {
                if !self.gate_open(instr.ext) {
                    return Ok(());
                }
                let value = self
                    .scheduler
                    .current_mut()
                    .pop_data()
                    .ok_or(VmError::StackUnderflow)?;
                self.write_dst(ArgKind::Reg(r), value)
            }
            (ArgKind::Reg(lo), ArgKind::Reg(hi)) => {
                if !self.gate_open(instr.ext) {
                    return Ok(());
                }
                if lo >= hi {
                    return Err(VmError::PushArgBadOrder);
                }
                // Top of stack goes into the highest register, working down.
                for r in (lo..=hi).rev() {
                    let value = self
                        .scheduler
                        .current_mut()
                        .pop_data()
                        .ok_or(VmError::StackUnderflow)?;
                    self.write_dst(ArgKind::Reg(r), value)?;
                }
                Ok(())
            }
            _ => Err(VmError::ArgNotReg),
        }
    }
}
