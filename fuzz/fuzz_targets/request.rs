#![no_main]

use std::error::Error;

use libfuzzer_sys::fuzz_target;
use profinet::config::Config;

fuzz_target!(|data: &[u8]| {
    let _ = fuzz_request(data);
});

fn fuzz_request(bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    let request = profinet::request::Request::new(bytes)?;
    let _ = request.validate(&Config::default());

    let iso = request.iso();
    let _protocol = iso.protocol_id();
    let _len = iso.len();
    let _function = iso.function();

    let ibh = request.ibh();
    let _channel = ibh.channel();
    let _sequence = ibh.sequence();
    let _flags = (ibh.send_flags(), ibh.recv_flags());

    let _prefix = request.prefix();
    let _read = (request.read_size(), request.read_length());
    let _db = request.db_number();
    let _area = request.area_code();
    let _start = request.start_address();

    Ok(())
}
