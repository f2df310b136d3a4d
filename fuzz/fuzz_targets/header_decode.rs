//! Negative space fuzzer for header name decoding
//!
//! Storage listings contain arbitrary foreign names, so the decoder must
//! reject anything non-canonical without panicking, and anything it does
//! accept must re-encode to the exact input bytes (canonical form means
//! decode is a partial inverse of encode, never a normalizer).

#![no_main]

use libfuzzer_sys::fuzz_target;
use maildrop_proto::MessageHeader;

fuzz_target!(|data: &[u8]| {
    // INVARIANT 1: Decoding arbitrary bytes must never panic
    let Ok(header) = MessageHeader::decode(data) else {
        return;
    };

    // INVARIANT 2: Anything accepted re-encodes to the exact input
    let name = header.encode();
    assert_eq!(name.as_slice(), data, "decoder accepted a non-canonical name");

    // INVARIANT 3: The canonical name decodes back to the same header
    let again = MessageHeader::decode(&name).expect("canonical name must decode");
    assert_eq!(again, header);

    // INVARIANT 4: The printable rendering round-trips too
    let printable = header.printable();
    let from_printable =
        MessageHeader::decode_printable(&printable).expect("printable name must decode");
    assert_eq!(from_printable, header);
});
