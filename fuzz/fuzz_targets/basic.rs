#![no_main]

use bumpalo::Bump;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let arena = Bump::new();
    _ = symdecode::parse(data, symdecode::ParseOptions::empty(), &arena);
});
