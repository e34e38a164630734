//! A minimal illustrative [`Host`] for `svm run`. Only `SYS 1` (sleep)
//! actually does anything; syscalls 2/3 (set-pixel / flush) are logged
//! stubs — the LED-matrix rendering and terminal colour output they
//! stand in for are named in spec's non-goals and aren't built here.

use std::thread;
use std::time::Duration;

use tracing::debug;

use svm::Host;

#[derive(Clone, Copy, Default, Debug)]
pub struct DemoHost;

impl Host for DemoHost {
    fn syscall(&mut self, registers: &mut [i32; 16], num: i32) {
        match num {
            1 => {
                let millis = registers[0].max(0) as u64;
                thread::sleep(Duration::from_millis(millis));
            }
            2 => debug!(x = registers[0], y = registers[1], value = registers[2], "set pixel"),
            3 => debug!("flush screen"),
            _ => debug!(num, "unhandled syscall"),
        }
    }
}
