#![no_main]

use libfuzzer_sys::fuzz_target;
use mpvipc::protocol::Message;

// Inbound lines come straight from another process; classification must
// never panic, whatever the bytes.
fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let message = Message::parse(&line);

    if let Some(event) = &message.event {
        assert!(!event.name.is_empty());
        let _ = event.kind();
    }
    if let Some(result) = message.result {
        assert!(!result.status.is_empty());
        let _ = result.into_result();
    }
});
