#![no_main]

use libfuzzer_sys::fuzz_target;
use scl_syntax::{lex, LineIndex, TextSize};

const MAX_SOURCE_BYTES: usize = 4096;

fuzz_target!(|data: &[u8]| {
    let capped = &data[..data.len().min(MAX_SOURCE_BYTES)];
    let source = String::from_utf8_lossy(capped);

    // Tokens tile the input without gaps.
    let tokens = lex(&source);
    let mut cursor = TextSize::from(0);
    for token in &tokens {
        assert_eq!(token.range.start(), cursor);
        cursor = token.range.end();
    }
    assert_eq!(usize::from(cursor), source.len());

    let lines = LineIndex::new(&source);
    let _ = lines.line(cursor);
});
