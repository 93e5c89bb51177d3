#[macro_export]
macro_rules! root_println {
    ($comm: expr, $($arg:tt)*) => {{
        use $crate::Communicator as _;
        if $comm.is_root() {
            println!($($arg)*);
        }
    }};
}
