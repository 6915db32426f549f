//! Debug trace: indented enter/leave lines on stderr, one level per
//! active `dt!` guard in the current thread.

use std::cell::Cell;

thread_local! {
    static LEVEL: Cell<u32> = Cell::new(0);
}

fn indent(n: u32) -> String {
    " ".repeat(n as usize)
}

pub struct DtGuard {
    pub string: String
}

impl Drop for DtGuard {
    fn drop(&mut self) {
        let l: u32 = LEVEL.with(|c| {
            let new = c.get().saturating_sub(1);
            c.set(new);
            new
        });
        eprintln!("{}{}[90m<- ({}){}[0m",
                  indent(l),
                  27 as char, // \033
                  self.string,
                  27 as char);
    }
}

pub fn enter(s: &str) {
    let l: u32 = LEVEL.with(|c| {
        let old = c.get();
        c.set(old + 1);
        old
    });
    eprintln!("{}-> ({})", indent(l), s);
}

pub fn level() -> u32 {
    LEVEL.with(|c| c.get())
}

#[macro_export]
macro_rules! dt {
    ($namestr:expr $(,$arg:expr)*) => {
        let mut _dt_guard = $crate::dt::DtGuard {
            string: String::new()
        };
        _dt_guard.string.push_str($namestr);
        $(
            _dt_guard.string.push_str(&format!(" {:?}", $arg));
        )*
        $crate::dt::enter(&_dt_guard.string);
    }
}

#[macro_export]
macro_rules! nodt {
    ($namestr:expr $(,$arg:expr)*) => {
    }
}
