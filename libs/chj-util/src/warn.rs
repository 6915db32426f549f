//! Printing statements to stderr for debugging purposes

#[macro_export]
macro_rules! warn {
    ($formatstr:expr $(,$arg:expr)*) => { {
        use std::io::Write;
        let mut outp = std::io::BufWriter::new(std::io::stderr().lock());
        let _ = write!(&mut outp, "W: ");
        let _ = write!(&mut outp, $formatstr $(,$arg)*);
        let _ = writeln!(&mut outp, " at {:?} line {}", file!(), line!());
        let _ = outp.flush();
    } }
}

#[macro_export]
macro_rules! nowarn {
    ($formatstr:expr $(,$arg:expr)*) => {
    }
}

/// Like `warn!` but only prints if the given `AtomicBool` flag is
/// set, e.g. `warn_if!(TRACE, "cache miss for {key:?}")`.
#[macro_export]
macro_rules! warn_if {
    ($flag:expr, $formatstr:expr $(,$arg:expr)*) => {
        if $flag.load(std::sync::atomic::Ordering::Relaxed) {
            $crate::warn!($formatstr $(,$arg)*);
        }
    }
}

#[macro_export]
macro_rules! nowarn_if {
    ($flag:expr, $formatstr:expr $(,$arg:expr)*) => {
    }
}
