mod common;

use std::sync::Arc;

use tokio_stream::StreamExt;

use common::{make_participant, InMemoryDirectory, InMemoryRelay};
use xmtp_core::client::ContentCodec;
use xmtp_core::{ClientConfig, Conversation, ConversationEvent, Conversations, CoreError, RelayClient};
use xmtp_proto::codec::{CompressionMode, ContentTypeId, EncodedContent};
use xmtp_proto::invitation::InvitationContext;
use xmtp_proto::topic;

struct TextCodec;

impl ContentCodec<String> for TextCodec {
    fn content_type(&self) -> ContentTypeId {
        ContentTypeId::new("xmtp.org", "text", 1, 0)
    }

    fn encode(&self, value: &String) -> Result<EncodedContent, CoreError> {
        Ok(EncodedContent {
            content_type: self.content_type(),
            parameters: Default::default(),
            content: value.as_bytes().to_vec(),
            fallback: Some(value.clone()),
        })
    }

    fn decode(&self, encoded: &EncodedContent) -> Result<String, CoreError> {
        String::from_utf8(encoded.content.clone())
            .map_err(|e| CoreError::InvalidArgument(e.to_string()))
    }
}

#[tokio::test]
async fn e1_v1_round_trip() {
    let relay = InMemoryRelay::new();
    let directory = InMemoryDirectory::new();
    let alice = make_participant(0xaa);
    let bob = make_participant(0xbb);
    directory.publish(&alice);
    directory.publish(&bob);
    let codec: Arc<dyn ContentCodec<String>> = Arc::new(TextCodec);

    let alice_reg = Conversations::new(
        alice.private,
        alice.public_v1.clone(),
        alice.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );
    let bob_reg = Conversations::new(
        bob.private,
        bob.public_v1.clone(),
        bob.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );

    alice_reg
        .send_v1(bob.address, &codec, &"hello".to_string(), CompressionMode::None)
        .await
        .unwrap();

    let sessions = bob_reg.list().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].peer_address(), alice.address);

    let messages = bob_reg.messages_v1(alice.address, &codec).await.unwrap();
    assert_eq!(messages, vec!["hello".to_string()]);
}

#[tokio::test]
async fn e2_intro_duplication() {
    let relay = InMemoryRelay::new();
    let directory = InMemoryDirectory::new();
    let alice = make_participant(0x01);
    let bob = make_participant(0x02);
    directory.publish(&alice);
    directory.publish(&bob);
    let codec: Arc<dyn ContentCodec<String>> = Arc::new(TextCodec);

    let alice_reg = Conversations::new(
        alice.private,
        alice.public_v1.clone(),
        alice.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );

    let before = relay.total_envelopes();
    alice_reg
        .send_v1(bob.address, &codec, &"first".to_string(), CompressionMode::None)
        .await
        .unwrap();
    let after_first = relay.total_envelopes();
    assert_eq!(after_first - before, 3, "first send should publish dm + 2 intro envelopes");

    alice_reg
        .send_v1(bob.address, &codec, &"second".to_string(), CompressionMode::None)
        .await
        .unwrap();
    let after_second = relay.total_envelopes();
    assert_eq!(after_second - after_first, 1, "second send should publish only the dm envelope");
}

#[tokio::test]
async fn e3_v2_deterministic() {
    let relay = InMemoryRelay::new();
    let directory = InMemoryDirectory::new();
    let alice = make_participant(0x10);
    let bob = make_participant(0x20);
    directory.publish(&alice);
    directory.publish(&bob);

    let alice_reg = Conversations::new(
        alice.private,
        alice.public_v1.clone(),
        alice.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );
    let bob_reg = Conversations::new(
        bob.private,
        bob.public_v1.clone(),
        bob.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );

    let context = InvitationContext {
        conversation_id: Some("x".into()),
        ..Default::default()
    };

    let alice_convo = alice_reg
        .new_conversation(bob.address, Some(context.clone()))
        .await
        .unwrap();
    let bob_convo = bob_reg
        .new_conversation(alice.address, Some(context))
        .await
        .unwrap();

    assert!(alice_convo.is_v2());
    assert!(bob_convo.is_v2());
    assert_eq!(alice_convo.topic(&alice.address), bob_convo.topic(&bob.address));

    let (Conversation::V2(a), Conversation::V2(b)) = (alice_convo, bob_convo) else {
        panic!("expected v2 sessions");
    };
    assert_eq!(a.key_material, b.key_material);
    assert_eq!(a.key_material.len(), 32);
}

#[tokio::test]
async fn e4_invitation_round_trip() {
    let relay = InMemoryRelay::new();
    let directory = InMemoryDirectory::new();
    let alice = make_participant(0x30);
    let bob = make_participant(0x40);
    directory.publish(&alice);
    directory.publish(&bob);

    let alice_reg = Conversations::new(
        alice.private,
        alice.public_v1.clone(),
        alice.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );
    let bob_reg = Conversations::new(
        bob.private,
        bob.public_v1.clone(),
        bob.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );

    let alice_convo = alice_reg.new_conversation(bob.address, None).await.unwrap();

    let bob_invite_topic = topic::invite_topic(&bob.address);
    let envelopes = relay.envelopes_on(&bob_invite_topic);
    assert_eq!(envelopes.len(), 1);

    let bob_convo = bob_reg.from_invite(&envelopes[0]).unwrap();
    assert_eq!(bob_convo.topic(&bob.address), alice_convo.topic(&alice.address));
    assert_eq!(bob_convo.peer_address(), alice.address);
}

#[tokio::test]
async fn e5_stream_expansion() {
    let relay = InMemoryRelay::new();
    let directory = InMemoryDirectory::new();
    let alice = make_participant(0x50);
    let bob = make_participant(0x60);
    directory.publish(&alice);
    directory.publish(&bob);
    let codec: Arc<dyn ContentCodec<String>> = Arc::new(TextCodec);

    let alice_reg = Arc::new(Conversations::new(
        alice.private,
        alice.public_v1.clone(),
        alice.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    ));
    let bob_reg = Arc::new(Conversations::new(
        bob.private,
        bob.public_v1.clone(),
        bob.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    ));

    let stream = bob_reg.clone().stream_all_messages().await.unwrap();
    tokio::pin!(stream);

    let context = InvitationContext {
        conversation_id: Some("new-convo".into()),
        ..Default::default()
    };
    let alice_convo = alice_reg
        .new_conversation(bob.address, Some(context))
        .await
        .unwrap();

    let first = stream.next().await.expect("discovery event");
    match first {
        ConversationEvent::Discovered(convo) => assert_eq!(convo.peer_address(), alice.address),
        ConversationEvent::Message(_) => panic!("expected a discovery event first"),
    }

    let Conversation::V2(alice_v2) = alice_convo else {
        panic!("expected v2 session")
    };
    alice_reg
        .send_v2(&alice_v2, &codec, &"hi bob".to_string(), CompressionMode::None, None, true)
        .await
        .unwrap();

    let second = stream.next().await.expect("message event");
    match second {
        ConversationEvent::Message(message) => {
            assert_eq!(message.sender, alice.address);
            assert_eq!(message.content.content, b"hi bob");
        }
        ConversationEvent::Discovered(_) => panic!("expected a message event second"),
    }
}

#[tokio::test]
async fn e6_tamper_detection_skips_and_continues() {
    let relay = InMemoryRelay::new();
    let directory = InMemoryDirectory::new();
    let alice = make_participant(0x70);
    let bob = make_participant(0x80);
    directory.publish(&alice);
    directory.publish(&bob);
    let codec: Arc<dyn ContentCodec<String>> = Arc::new(TextCodec);

    let alice_reg = Conversations::new(
        alice.private,
        alice.public_v1.clone(),
        alice.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );
    let bob_reg = Conversations::new(
        bob.private,
        bob.public_v1.clone(),
        bob.public_v2.clone(),
        relay.clone(),
        directory.clone(),
        ClientConfig::default(),
    );

    alice_reg
        .send_v1(bob.address, &codec, &"one".to_string(), CompressionMode::None)
        .await
        .unwrap();

    let dm_topic = topic::dm_topic(&alice.address, &bob.address);
    let good = relay.envelopes_on(&dm_topic);
    assert_eq!(good.len(), 1);

    let mut tampered_message: xmtp_proto::message::MessageV1 =
        serde_json::from_slice(&good[0].message).unwrap();
    tampered_message.ciphertext.payload[0] ^= 0xff;
    let tampered_envelope = xmtp_proto::Envelope::new(
        dm_topic.clone(),
        good[0].timestamp_ns + 1,
        serde_json::to_vec(&tampered_message).unwrap(),
    );
    relay.publish(vec![tampered_envelope]).await.unwrap();

    alice_reg
        .send_v1(bob.address, &codec, &"three".to_string(), CompressionMode::None)
        .await
        .unwrap();

    let messages = bob_reg.messages_v1(alice.address, &codec).await.unwrap();
    assert_eq!(messages, vec!["one".to_string(), "three".to_string()]);
}
