//! End-to-end scenarios from spec §8, run directly against hand-packed
//! instruction words (this crate doesn't depend on `svm-asm`, so these
//! build code images the way the assembler would, by hand).

use svm::{pack, ArgKind, Ext, ImageMeta, NullHost, OpCode, Vm, VmError, Word};

fn run_to_completion(code: &[Word]) -> Vm<'_, NullHost> {
    let mut vm = Vm::new(code, ImageMeta::default(), NullHost);
    while vm.is_running() {
        vm.cycle().unwrap();
    }
    vm
}

#[test]
fn arithmetic() {
    // mov r0 2 / mov r1 3 / add r0 r1 / end
    let code = [
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        2,
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(1), ArgKind::Imm),
        3,
        pack(OpCode::Add, Ext::None, ArgKind::Reg(0), ArgKind::Reg(1)),
        pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
    ];
    let vm = run_to_completion(&code);
    let task = vm.current_task();
    assert_eq!(task.register(0), 5);
    assert_eq!(task.register(1), 3);
    assert!(task.flags().get(Ext::Nz.flag_index().unwrap()));
    assert!(!task.flags().get(Ext::Z.flag_index().unwrap()));
    assert!(!vm.is_running());
}

#[test]
fn conditional_move() {
    // mov r0 5 / mov r1 5 / cmp r0 r1 / mov.eq r2 42 / end
    let code = [
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        5,
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(1), ArgKind::Imm),
        5,
        pack(OpCode::Cmp, Ext::None, ArgKind::Reg(0), ArgKind::Reg(1)),
        pack(OpCode::Mov, Ext::Eq, ArgKind::Reg(2), ArgKind::Imm),
        42,
        pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
    ];
    let vm = run_to_completion(&code);
    let task = vm.current_task();
    assert_eq!(task.register(2), 42);
    assert!(task.flags().get(Ext::Eq.flag_index().unwrap()));
    assert!(task.flags().get(Ext::Ge.flag_index().unwrap()));
    assert!(task.flags().get(Ext::Le.flag_index().unwrap()));
}

#[test]
fn call_and_return() {
    // 0: inv fn(=3)
    // 2: end
    // 3: fn: mov r0 7
    // 5: ret
    let code = [
        pack(OpCode::Inv, Ext::None, ArgKind::Imm, ArgKind::None),
        3,
        pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        7,
        pack(OpCode::Ret, Ext::None, ArgKind::None, ArgKind::None),
    ];
    let vm = run_to_completion(&code);
    let task = vm.current_task();
    assert_eq!(task.register(0), 7);
    assert_eq!(task.rpc(), 0);
    assert!(!vm.is_running());
}

#[test]
fn loop_with_countdown() {
    // 0: mov r0 3
    // 2: loop: sub r0 1
    // 4: cmp r0 0
    // 6: jmp.ne loop(=2)
    // 8: end
    let code = [
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        3,
        pack(OpCode::Sub, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        1,
        pack(OpCode::Cmp, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        0,
        pack(OpCode::Jmp, Ext::Ne, ArgKind::Imm, ArgKind::None),
        2,
        pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
    ];
    let mut vm = Vm::new(&code, ImageMeta::default(), NullHost);
    let mut cycles = 0;
    while vm.is_running() {
        vm.cycle().unwrap();
        cycles += 1;
    }
    let task = vm.current_task();
    assert_eq!(task.register(0), 0);
    assert!(task.flags().get(Ext::Eq.flag_index().unwrap()));
    assert!(task.flags().get(Ext::Le.flag_index().unwrap()));
    assert_eq!(cycles, 11);
}

#[test]
fn stack_round_trip() {
    // push 10 / push 20 / pop r0 / pop r1 / end
    let code = [
        pack(OpCode::Push, Ext::None, ArgKind::Imm, ArgKind::None),
        10,
        pack(OpCode::Push, Ext::None, ArgKind::Imm, ArgKind::None),
        20,
        pack(OpCode::Pop, Ext::None, ArgKind::Reg(0), ArgKind::None),
        pack(OpCode::Pop, Ext::None, ArgKind::Reg(1), ArgKind::None),
        pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
    ];
    let vm = run_to_completion(&code);
    let task = vm.current_task();
    assert_eq!(task.register(0), 20);
    assert_eq!(task.register(1), 10);
    assert_eq!(task.sp(), 0);
}

#[test]
fn forward_label_patch() {
    // jmp skip(=4) / mov r0 1 / skip: mov r0 2 / end
    let code = [
        pack(OpCode::Jmp, Ext::None, ArgKind::Imm, ArgKind::None),
        4,
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        1,
        pack(OpCode::Mov, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        2,
        pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
    ];
    let vm = run_to_completion(&code);
    assert_eq!(vm.current_task().register(0), 2);
}

#[test]
fn jump_to_code_size_faults() {
    // code.len() == 2; jumping to word 2 (== code.size) is out of range.
    let code = [pack(OpCode::Jmp, Ext::None, ArgKind::Imm, ArgKind::None), 2];
    let mut vm = Vm::new(&code, ImageMeta::default(), NullHost);
    assert_eq!(vm.cycle(), Err(VmError::JmpOverflow));
}

#[test]
fn jump_to_last_valid_word_succeeds() {
    // code.len() == 3; jumping to word 2 (== code.size - 1) lands on
    // the final `end` and runs to completion without faulting.
    let code = [
        pack(OpCode::Jmp, Ext::None, ArgKind::Imm, ArgKind::None),
        2,
        pack(OpCode::End, Ext::None, ArgKind::None, ArgKind::None),
    ];
    let vm = run_to_completion(&code);
    assert!(!vm.is_running());
}

#[test]
fn call_stack_overflow_faults() {
    // inv self, looping back through its own call, with a one-deep
    // call stack (ImageMeta::default() gives each task a default call
    // stack, so shrink it by nesting INV until it overflows instead).
    let code = [
        pack(OpCode::Inv, Ext::None, ArgKind::Imm, ArgKind::None),
        0,
    ];
    let mut vm = Vm::new(&code, ImageMeta::default(), NullHost);
    let capacity = vm.current_task().call_stack_capacity();
    for _ in 0..capacity {
        vm.cycle().unwrap();
    }
    assert_eq!(vm.cycle(), Err(VmError::CallStackOverflow));
}

#[test]
fn call_stack_underflow_faults() {
    // ret with nothing ever pushed onto the call stack.
    let code = [pack(OpCode::Ret, Ext::None, ArgKind::None, ArgKind::None)];
    let mut vm = Vm::new(&code, ImageMeta::default(), NullHost);
    assert_eq!(vm.cycle(), Err(VmError::CallStackUnderflow));
}

#[test]
fn push_range_requires_strict_order() {
    let code = [pack(OpCode::Push, Ext::None, ArgKind::Reg(2), ArgKind::Reg(2))];
    let mut vm = Vm::new(&code, ImageMeta::default(), NullHost);
    assert_eq!(vm.cycle(), Err(VmError::PushArgBadOrder));
}

#[test]
fn division_by_zero_faults() {
    let code = [
        pack(OpCode::Div, Ext::None, ArgKind::Reg(0), ArgKind::Imm),
        0,
    ];
    let mut vm = Vm::new(&code, ImageMeta::default(), NullHost);
    assert_eq!(vm.cycle(), Err(VmError::DivisionByZero));
}
