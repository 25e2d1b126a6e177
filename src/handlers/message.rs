//! `sendMessage`: relay a chat message to every live session of the receiver.

use super::Context;
use crate::error::{RelayError, RelayResult};
use crate::state::Delivery;
use chirp_proto::{SendMessage, ServerEvent};
use tracing::debug;

/// Relay one message.
///
/// The sender is whatever the authenticator decides from the session's
/// binding and the claimed `senderId`. Extra client fields ride along
/// untouched. A receiver with no live session is a silent drop.
pub fn handle_send_message(ctx: &mut Context<'_>, message: SendMessage) -> RelayResult<Delivery> {
    let session_id = ctx.session.id();
    if !ctx.hub.rate_limits().check_message_rate(session_id) {
        return Err(RelayError::RateLimited);
    }

    let sender_id = ctx
        .hub
        .authenticator()
        .resolve_sender(ctx.session.user_id(), message.sender_id.as_deref())?;
    let chat = message.into_chat_message(sender_id)?;
    let receiver_id = chat.receiver_id.clone();

    let delivery = ctx
        .hub
        .deliver(&receiver_id, &ServerEvent::ReceiveMessage(chat), Some(session_id))?;
    debug!(
        receiver_id = %receiver_id,
        targets = delivery.targets,
        queued = delivery.queued,
        "message relayed"
    );
    Ok(delivery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::security::{AuthError, TokenAuthenticator, TokenSigner, TrustClaimed};
    use crate::state::{Hub, Session};
    use chirp_proto::decode_server_event;
    use serde_json::json;
    use std::sync::Arc;

    fn session() -> Session {
        Session::new("127.0.0.1:40000".parse().unwrap())
    }

    fn received(frame: &str) -> chirp_proto::ChatMessage {
        let ServerEvent::ReceiveMessage(msg) = decode_server_event(frame).unwrap();
        msg
    }

    #[test]
    fn relays_to_receiver_sessions_only() {
        let hub = Hub::with_authenticator("chirp.test", LimitsConfig::default(), Arc::new(TrustClaimed));
        let mut s1 = session();
        let (s2, s3) = (session(), session());
        let mut rx1 = hub.open_session(s1.id());
        let mut rx2 = hub.open_session(s2.id());
        let mut rx3 = hub.open_session(s3.id());
        hub.bind_session("alice", s1.id()).unwrap();
        hub.bind_session("bob", s2.id()).unwrap();
        hub.bind_session("bob", s3.id()).unwrap();
        s1.bind("alice".into()).unwrap();

        let mut ctx = Context::new(&hub, &mut s1);
        for content in ["1", "2"] {
            let msg = SendMessage::new("bob", content).with_sender("alice");
            let delivery = handle_send_message(&mut ctx, msg).unwrap();
            assert_eq!(delivery.queued, 2);
        }

        for rx in [&mut rx2, &mut rx3] {
            let first = received(&rx.try_recv().unwrap());
            let second = received(&rx.try_recv().unwrap());
            assert_eq!((first.content.as_str(), second.content.as_str()), ("1", "2"));
            assert_eq!(first.sender_id, "alice");
        }
        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn extra_fields_are_forwarded() {
        let hub = Hub::with_authenticator("chirp.test", LimitsConfig::default(), Arc::new(TrustClaimed));
        let mut sender = session();
        let receiver = session();
        let mut rx = hub.open_session(receiver.id());
        hub.bind_session("bob", receiver.id()).unwrap();

        let mut msg = SendMessage::new("bob", "hey")
            .with_sender("alice")
            .with_sent_at("2024-05-01T10:00:00Z");
        msg.extra.insert("conversationId".into(), json!("c-17"));

        handle_send_message(&mut Context::new(&hub, &mut sender), msg).unwrap();
        let got = received(&rx.try_recv().unwrap());
        assert_eq!(got.sent_at, Some(json!("2024-05-01T10:00:00Z")));
        assert_eq!(got.extra.get("conversationId"), Some(&json!("c-17")));
    }

    #[test]
    fn bound_identity_fills_missing_sender() {
        let hub = Hub::with_authenticator("chirp.test", LimitsConfig::default(), Arc::new(TrustClaimed));
        let mut sender = session();
        sender.bind("alice".into()).unwrap();
        let receiver = session();
        let mut rx = hub.open_session(receiver.id());
        hub.bind_session("bob", receiver.id()).unwrap();

        handle_send_message(&mut Context::new(&hub, &mut sender), SendMessage::new("bob", "hi"))
            .unwrap();
        assert_eq!(received(&rx.try_recv().unwrap()).sender_id, "alice");
    }

    #[test]
    fn message_to_self_skips_the_sending_session() {
        let hub = Hub::with_authenticator("chirp.test", LimitsConfig::default(), Arc::new(TrustClaimed));
        let mut laptop = session();
        let phone = session();
        let mut laptop_rx = hub.open_session(laptop.id());
        let mut phone_rx = hub.open_session(phone.id());
        hub.bind_session("alice", laptop.id()).unwrap();
        hub.bind_session("alice", phone.id()).unwrap();
        laptop.bind("alice".into()).unwrap();

        let delivery = handle_send_message(
            &mut Context::new(&hub, &mut laptop),
            SendMessage::new("alice", "note to self"),
        )
        .unwrap();
        assert_eq!(delivery.queued, 1);
        assert_eq!(received(&phone_rx.try_recv().unwrap()).content, "note to self");
        assert!(laptop_rx.try_recv().is_err());
    }

    #[test]
    fn unknown_receiver_is_silent() {
        let hub = Hub::with_authenticator("chirp.test", LimitsConfig::default(), Arc::new(TrustClaimed));
        let mut sender = session();
        let delivery = handle_send_message(
            &mut Context::new(&hub, &mut sender),
            SendMessage::new("nobody", "hi").with_sender("alice"),
        )
        .unwrap();
        assert!(delivery.is_offline());
    }

    #[test]
    fn anonymous_unbound_send_is_refused() {
        let hub = Hub::with_authenticator("chirp.test", LimitsConfig::default(), Arc::new(TrustClaimed));
        let mut sender = session();
        let err = handle_send_message(&mut Context::new(&hub, &mut sender), SendMessage::new("bob", "hi"))
            .unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized(AuthError::MissingIdentity)));
    }

    #[test]
    fn strict_mode_rejects_spoofed_sender() {
        let signer = TokenSigner::new(b"0123456789abcdef0123456789abcdef", 60).unwrap();
        let hub = Hub::with_authenticator(
            "chirp.test",
            LimitsConfig::default(),
            Arc::new(TokenAuthenticator::new(signer)),
        );
        let mut unbound = session();
        let err = handle_send_message(
            &mut Context::new(&hub, &mut unbound),
            SendMessage::new("bob", "hi").with_sender("alice"),
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized(AuthError::NotBound)));

        let mut mallory = session();
        mallory.bind("mallory".into()).unwrap();
        let err = handle_send_message(
            &mut Context::new(&hub, &mut mallory),
            SendMessage::new("bob", "hi").with_sender("alice"),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "identity_mismatch");
    }

    #[test]
    fn rate_limit_drops_excess() {
        let hub = Hub::with_authenticator(
            "chirp.test",
            LimitsConfig {
                message_rate_per_second: 1,
                message_burst: 2,
                ..LimitsConfig::default()
            },
            Arc::new(TrustClaimed),
        );
        fn send(ctx: &mut Context<'_>) -> RelayResult<Delivery> {
            handle_send_message(ctx, SendMessage::new("bob", "hi").with_sender("alice"))
        }

        let mut sender = session();
        let mut ctx = Context::new(&hub, &mut sender);
        assert!(send(&mut ctx).is_ok());
        assert!(send(&mut ctx).is_ok());
        assert!(matches!(send(&mut ctx), Err(RelayError::RateLimited)));
    }
}
