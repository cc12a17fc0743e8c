use std::io::Cursor;

use tracing::warn;
use wirerpc::codec::{BasicCodec, Codec, HEADER_LEN};
use wirerpc::frame::{FrameConfig, FrameError, FrameReader};

use crate::cmd::{DecodeArgs, Globals};
use crate::exit::{codec_error, frame_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_decoded, DecodedFrameOutput};

pub fn run(args: DecodeArgs, globals: Globals) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    let out = decode(&bytes, FrameConfig::with_format(globals.frame_format))?;
    print_decoded(&out, globals.format);
    Ok(SUCCESS)
}

fn decode(bytes: &[u8], config: FrameConfig) -> CliResult<DecodedFrameOutput> {
    let format = config.format;
    let mut reader = FrameReader::with_config(Cursor::new(bytes), config);
    let frame = reader.read_frame().map_err(|err| match err {
        FrameError::ConnectionClosed => CliError::new(
            DATA_INVALID,
            format!("frame truncated ({} bytes, {format} header)", bytes.len()),
        ),
        other => frame_error("invalid frame", other),
    })?;

    let consumed = usize::try_from(reader.get_ref().position()).unwrap_or(bytes.len());
    if consumed < bytes.len() {
        warn!(trailing = bytes.len() - consumed, "ignoring bytes after the frame");
    }

    let mut codec = BasicCodec::from_slice(&frame.body);
    let header = codec
        .start_read_message()
        .map_err(|err| codec_error("invalid message envelope", err))?;
    let payload = &frame.body[HEADER_LEN..];

    Ok(DecodedFrameOutput {
        frame_format: format.name(),
        length: frame.header.length,
        body_crc: format!("{:#06x}", frame.header.body_crc),
        header_crc: frame.header.header_crc.map(|crc| format!("{crc:#06x}")),
        message_type: header.message_type.to_string(),
        service_id: header.service_id,
        method_id: header.method_id,
        sequence: header.sequence,
        payload_size: payload.len(),
        payload_hex: hex::encode(payload),
    })
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split_whitespace()
        .map(|chunk| chunk.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}
