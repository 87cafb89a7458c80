#![no_main]

use libfuzzer_sys::fuzz_target;
use profinet::config::Config;
use profinet::decode::{decode_frame, Outcome};

fuzz_target!(|data: &[u8]| {
    if let Ok(Outcome::Decoded(message)) = decode_frame(data, &Config::default()) {
        let request = message.request;
        assert_eq!(usize::from(request.iso().len()), request.len());
        assert_eq!(request.ibh().channel(), 7);
    }
});
