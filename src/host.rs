//! Line-oriented JSON host for the method channel.
//!
//! Reads one `MethodCall` per input line and writes one `MethodResponse`
//! per output line, flushing after each so a parent process can pipeline
//! requests. Blank lines are skipped; a line that is not a valid call gets
//! an `invalid_arguments` error and the loop keeps going.

use std::io::{BufRead, Write};

use crate::channel::{MethodCall, MethodHandler, MethodResponse};

/// Serves calls from `reader` until EOF. Returns how many were answered.
pub fn serve<R: BufRead, W: Write>(
    handler: &MethodHandler,
    runtime: &tokio::runtime::Runtime,
    reader: R,
    mut writer: W,
) -> std::io::Result<usize> {
    let mut answered = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<MethodCall>(&line) {
            Ok(call) => runtime.block_on(handler.handle_async(&call)),
            Err(e) => {
                log::warn!("[CHANNEL] Unreadable call: {}", e);
                MethodResponse::error("invalid_arguments", format!("malformed call: {}", e))
            }
        };

        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        answered += 1;
    }

    Ok(answered)
}

/// Runtime the host drives async handling on.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
}
