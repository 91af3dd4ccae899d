#![no_main]

use keeprelocs::patch;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buffer = data.to_vec();
    if patch(&mut buffer).is_err() {
        assert_eq!(buffer, data);
    }
});
