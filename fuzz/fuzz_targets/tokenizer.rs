#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldict::{ParseEvent, Tokenizer};

fuzz_target!(|data: &[u8]| {
    let mut depth = 0usize;
    for event in Tokenizer::new(data) {
        match event {
            ParseEvent::StartElement { .. } => depth += 1,
            ParseEvent::EndElement { .. } => {
                assert!(depth > 0, "end event without matching start");
                depth -= 1;
            }
            ParseEvent::CharacterData(_) => assert!(depth > 0, "text outside elements"),
            ParseEvent::ParseError { .. } => break,
        }
    }
});
