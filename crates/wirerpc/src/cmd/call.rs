use tracing::debug;
use wirerpc::demo::{ArithClient, ARITH_SERVICE_ID, DOUBLE_METHOD, ECHO_METHOD, LOG_METHOD};
use wirerpc::frame::{FrameConfig, FramedTransport, Transport};

use crate::cmd::{parse_duration, ArithMethod, CallArgs, Globals};
use crate::exit::{frame_error, rpc_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_call, CallOutput};

/// A validated call, ready to send.
enum Call<'a> {
    Double(i32),
    Echo(&'a str),
    Log(&'a str),
}

impl<'a> Call<'a> {
    fn parse(method: ArithMethod, value: &'a str) -> CliResult<Self> {
        Ok(match method {
            ArithMethod::Double => Call::Double(parse_int32(value)?),
            ArithMethod::Echo => Call::Echo(value),
            ArithMethod::Log => Call::Log(value),
        })
    }
}

pub fn run(args: CallArgs, globals: Globals) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let call = Call::parse(args.method, &args.value)?;

    let stream = args
        .addr
        .connect()
        .map_err(|err| transport_error("connect failed", err))?;
    let config = FrameConfig {
        format: globals.frame_format,
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
        ..FrameConfig::default()
    };
    let transport = FramedTransport::from_stream(stream, config)
        .map_err(|err| frame_error("connect failed", err))?;
    let mut client = ArithClient::new(transport);

    let (method_id, result) = match call {
        Call::Double(value) => {
            let result = client
                .double(value)
                .map_err(|err| rpc_error("call failed", err))?;
            (DOUBLE_METHOD, Some(result.to_string()))
        }
        Call::Echo(text) => {
            let result = client
                .echo(text)
                .map_err(|err| rpc_error("call failed", err))?;
            (ECHO_METHOD, Some(result))
        }
        Call::Log(message) => {
            client
                .log(message)
                .map_err(|err| rpc_error("call failed", err))?;
            (LOG_METHOD, None)
        }
    };

    let out = CallOutput {
        method: args.method.name(),
        service_id: ARITH_SERVICE_ID,
        method_id,
        sequence: client.manager().sequence(),
        oneway: args.method == ArithMethod::Log,
        request: args.value.clone(),
        result,
    };
    if let Err(err) = client.manager().transport().close() {
        debug!(error = %err, "closing connection");
    }

    print_call(&out, globals.format);
    Ok(SUCCESS)
}

fn parse_int32(value: &str) -> CliResult<i32> {
    value.trim().parse().map_err(|_| {
        CliError::new(
            USAGE,
            format!("double expects an int32 value, got {value:?}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int32_accepts_signed_values() {
        assert_eq!(parse_int32("42").unwrap(), 42);
        assert_eq!(parse_int32(" -7 ").unwrap(), -7);
    }

    #[test]
    fn call_parse_validates_before_connecting() {
        assert!(matches!(
            Call::parse(ArithMethod::Double, "21"),
            Ok(Call::Double(21))
        ));
        assert!(matches!(
            Call::parse(ArithMethod::Echo, "21"),
            Ok(Call::Echo("21"))
        ));
        assert!(Call::parse(ArithMethod::Double, "x").is_err());
    }

    #[test]
    fn parse_int32_rejects_out_of_range_and_text() {
        assert_eq!(parse_int32("2147483648").unwrap_err().code, USAGE);
        assert_eq!(parse_int32("forty-two").unwrap_err().code, USAGE);
    }
}
