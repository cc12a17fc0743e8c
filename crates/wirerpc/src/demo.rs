//! The `arith` example service and a typed client for it.
//!
//! Service 2 exposes three methods:
//!
//! | id | name     | request  | reply   |
//! |----|----------|----------|---------|
//! | 5  | `double` | `int32`  | `int32` |
//! | 6  | `echo`   | `string` | `string`|
//! | 7  | `log`    | `string` | none (one-way) |

use tracing::info;
use wirerpc_frame::Transport;
use wirerpc_rpc::{start_reply, ClientManager, Result, Server, Service};

pub const ARITH_SERVICE_ID: u8 = 2;
pub const DOUBLE_METHOD: u8 = 5;
pub const ECHO_METHOD: u8 = 6;
pub const LOG_METHOD: u8 = 7;

/// Server side of the `arith` service.
pub fn arith_service() -> Service {
    Service::new(ARITH_SERVICE_ID)
        .with_method(DOUBLE_METHOD, |sequence, codec| {
            let value = codec.read_int32()?;
            start_reply(codec, ARITH_SERVICE_ID, DOUBLE_METHOD, sequence);
            codec.write_int32(value.wrapping_mul(2));
            Ok(())
        })
        .with_method(ECHO_METHOD, |sequence, codec| {
            let text = codec.read_string()?;
            start_reply(codec, ARITH_SERVICE_ID, ECHO_METHOD, sequence);
            codec.write_string(&text)?;
            Ok(())
        })
        .with_method(LOG_METHOD, |sequence, codec| {
            let message = codec.read_string()?;
            info!(sequence, %message, "remote log");
            Ok(())
        })
}

/// A [`Server`] with only the `arith` service registered.
pub fn arith_server() -> Result<Server> {
    Server::new().with_service(arith_service())
}

/// Typed caller for the `arith` service.
pub struct ArithClient<T> {
    manager: ClientManager<T>,
}

impl<T: Transport> ArithClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            manager: ClientManager::new(transport),
        }
    }

    pub fn double(&mut self, value: i32) -> Result<i32> {
        let mut request = self.manager.create_request(false);
        request.start_invocation(ARITH_SERVICE_ID, DOUBLE_METHOD);
        request.codec().write_int32(value);
        self.manager.perform_request(&mut request)?;
        Ok(request.codec().read_int32()?)
    }

    pub fn echo(&mut self, text: &str) -> Result<String> {
        let mut request = self.manager.create_request(false);
        request.start_invocation(ARITH_SERVICE_ID, ECHO_METHOD);
        request.codec().write_string(text)?;
        self.manager.perform_request(&mut request)?;
        Ok(request.codec().read_string()?)
    }

    /// Fire-and-forget: returns once the message is sent.
    pub fn log(&mut self, message: &str) -> Result<()> {
        let mut request = self.manager.create_request(true);
        request.start_invocation(ARITH_SERVICE_ID, LOG_METHOD);
        request.codec().write_string(message)?;
        self.manager.perform_request(&mut request)
    }

    pub fn manager(&self) -> &ClientManager<T> {
        &self.manager
    }
}
