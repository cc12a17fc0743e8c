use std::collections::BTreeMap;

use tracing::debug;
use wirerpc_codec::{Codec, MessageHeader, MessageType};

use crate::error::{RequestError, Result};
use crate::service::Service;

/// Service registry and request dispatcher.
///
/// Populated with [`add_service`](Self::add_service) before serving starts
/// and only read afterwards.
#[derive(Debug, Default)]
pub struct Server {
    services: BTreeMap<u8, Service>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Fails if its id is already taken.
    pub fn add_service(&mut self, service: Service) -> Result<()> {
        let id = service.id();
        if self.services.contains_key(&id) {
            return Err(RequestError::DuplicateService(id).into());
        }
        debug!(service = id, methods = ?service.method_ids(), "service registered");
        self.services.insert(id, service);
        Ok(())
    }

    /// Builder form of [`add_service`](Self::add_service).
    pub fn with_service(mut self, service: Service) -> Result<Self> {
        self.add_service(service)?;
        Ok(self)
    }

    /// Registered services, ordered by id.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    pub fn service(&self, id: u8) -> Option<&Service> {
        self.services.get(&id)
    }

    /// Decode one request from `codec` and dispatch it.
    ///
    /// On return the codec holds the reply to send, or is empty when no
    /// reply is due. Bytes a one-way handler wrote are discarded.
    pub fn process_request(&self, codec: &mut dyn Codec) -> Result<MessageHeader> {
        let header = codec.start_read_message()?;
        if !matches!(
            header.message_type,
            MessageType::Invocation | MessageType::OneWay
        ) {
            return Err(RequestError::InvalidRequestType(header.message_type).into());
        }

        let service = self
            .services
            .get(&header.service_id)
            .ok_or(RequestError::UnknownService(header.service_id))?;

        debug!(
            service = header.service_id,
            method = header.method_id,
            sequence = header.sequence,
            oneway = header.message_type.is_oneway(),
            "dispatching request"
        );
        service.handle_invocation(header.method_id, header.sequence, codec)?;

        if header.message_type.is_oneway() {
            codec.reset();
        }
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use wirerpc_codec::{BasicCodec, CodecError};

    use super::*;
    use crate::error::RpcError;
    use crate::service::start_reply;

    fn request(kind: MessageType, service: u8, method: u8, sequence: u32) -> BasicCodec {
        let mut codec = BasicCodec::new();
        codec.start_write_message(&MessageHeader::new(kind, service, method, sequence));
        codec.write_int32(42);
        BasicCodec::from_slice(codec.array())
    }

    fn doubling_server() -> Server {
        let service = Service::new(2).with_method(5, |sequence, codec| {
            let value = codec.read_int32()?;
            start_reply(codec, 2, 5, sequence);
            codec.write_int32(value * 2);
            Ok(())
        });
        Server::new().with_service(service).unwrap()
    }

    #[test]
    fn invocation_leaves_reply_in_codec() {
        let server = doubling_server();
        let mut codec = request(MessageType::Invocation, 2, 5, 1);

        let header = server.process_request(&mut codec).unwrap();
        assert_eq!(header.sequence, 1);

        let mut reply = BasicCodec::from_slice(codec.array());
        assert_eq!(
            reply.start_read_message().unwrap(),
            MessageHeader::new(MessageType::Reply, 2, 5, 1)
        );
        assert_eq!(reply.read_int32().unwrap(), 84);
    }

    #[test]
    fn oneway_discards_handler_output() {
        let server = doubling_server();
        let mut codec = request(MessageType::OneWay, 2, 5, 3);

        server.process_request(&mut codec).unwrap();
        assert!(codec.is_empty());
    }

    #[test]
    fn replies_and_notifications_are_rejected() {
        let server = doubling_server();
        for kind in [MessageType::Reply, MessageType::Notification] {
            let mut codec = request(kind, 2, 5, 1);
            let err = server.process_request(&mut codec).unwrap_err();
            assert!(matches!(
                err,
                RpcError::Request(RequestError::InvalidRequestType(k)) if k == kind
            ));
        }
    }

    #[test]
    fn unknown_service_is_reported() {
        let server = doubling_server();
        let mut codec = request(MessageType::Invocation, 9, 5, 1);
        let err = server.process_request(&mut codec).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Request(RequestError::UnknownService(9))
        ));
        assert_eq!(err.to_string(), "request error: invalid service ID (9)");
    }

    #[test]
    fn unknown_method_is_reported() {
        let server = doubling_server();
        let mut codec = request(MessageType::Invocation, 2, 6, 1);
        let err = server.process_request(&mut codec).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Request(RequestError::UnknownMethod {
                service: 2,
                method: 6
            })
        ));
    }

    #[test]
    fn bad_version_is_a_codec_error() {
        let server = doubling_server();
        let mut codec = BasicCodec::from_slice(&[0, 5, 2, 9, 1, 0, 0, 0]);
        let err = server.process_request(&mut codec).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Codec(CodecError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn dispatch_reaches_only_the_addressed_service() {
        let hit_a = Arc::new(AtomicBool::new(false));
        let hit_b = Arc::new(AtomicBool::new(false));
        let (a, b) = (Arc::clone(&hit_a), Arc::clone(&hit_b));

        let server = Server::new()
            .with_service(Service::new(1).with_method(1, move |_, _| {
                a.store(true, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap()
            .with_service(Service::new(2).with_method(1, move |_, _| {
                b.store(true, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        let mut codec = request(MessageType::Invocation, 2, 1, 1);
        server.process_request(&mut codec).unwrap();
        assert!(!hit_a.load(Ordering::SeqCst));
        assert!(hit_b.load(Ordering::SeqCst));
    }

    #[test]
    fn duplicate_service_rejected() {
        let mut server = Server::new();
        server.add_service(Service::new(7)).unwrap();
        let err = server.add_service(Service::new(7)).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Request(RequestError::DuplicateService(7))
        ));
        assert_eq!(server.services().count(), 1);
        assert!(server.service(7).is_some());
    }
}
