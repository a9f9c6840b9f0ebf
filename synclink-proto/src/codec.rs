//! Tag-prefixed message codec over a [`ByteReader`] / [`ByteWriter`] pair.
//!
//! Each message is one tag byte followed by the variant's fields in
//! declaration order. There is no overall length prefix: the payload size
//! follows from the field layout, so both peers must share the tag table.
//!
//! | tag | variant                  | payload                                   |
//! |-----|--------------------------|-------------------------------------------|
//! | 1   | `SyncStarted`            | `i32 id`                                  |
//! | 2   | `SyncCompleted`          | `i32 id`, `i64 duration_millis`           |
//! | 3   | `SyncParameters`         | `strings gradle_args`, `strings jvm_args` |
//! | 4   | `ConnectionParameters`   | `string installation_path`                |
//! | 5   | `SyncRequest`            | `i32 id`, `string kind`                   |
//! | 6   | `SyncRequestCompleted`   | `i32 id`, `i64 duration_millis`, `string result` |

use std::io::{Read, Write};

use crate::channel::{ByteReader, ByteWriter};
use crate::error::{Error, Result};
use crate::message::{
    ConnectionParameters, Message, MessageKind, Symbol, SyncCompleted, SyncParameters,
    SyncRequest, SyncRequestCompleted, SyncStarted,
};

/// Encodes `msg` and flushes it to the peer.
///
/// On failure nothing is left buffered; the caller decides whether to retry.
pub fn encode<W: Write>(w: &mut ByteWriter<W>, msg: &Message) -> Result<()> {
    if let Err(e) = write_fields(w, msg) {
        w.discard();
        return Err(e);
    }
    w.flush()
}

/// Reads one message.
///
/// Returns `Ok(None)` when the peer closed the stream before the next tag,
/// which is the normal way a session ends. An unknown tag or enum symbol is
/// a protocol error after which the stream must be closed.
pub fn decode<R: Read>(r: &mut ByteReader<R>) -> Result<Option<Message>> {
    let tag = match r.read_u8() {
        Ok(tag) => tag,
        Err(Error::EndOfStream { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    let Some(kind) = MessageKind::from_tag(tag) else {
        return Err(Error::UnknownTag {
            peer: r.peer().to_owned(),
            tag,
        });
    };

    let msg = match kind {
        MessageKind::SyncStarted => SyncStarted { id: r.read_i32()? }.into(),
        MessageKind::SyncCompleted => SyncCompleted {
            id: r.read_i32()?,
            duration_millis: r.read_i64()?,
        }
        .into(),
        MessageKind::SyncParameters => SyncParameters {
            gradle_args: r.read_strings()?,
            jvm_args: r.read_strings()?,
        }
        .into(),
        MessageKind::ConnectionParameters => ConnectionParameters {
            installation_path: r.read_string()?,
        }
        .into(),
        MessageKind::SyncRequest => SyncRequest {
            id: r.read_i32()?,
            kind: read_symbol(r)?,
        }
        .into(),
        MessageKind::SyncRequestCompleted => SyncRequestCompleted {
            id: r.read_i32()?,
            duration_millis: r.read_i64()?,
            result: read_symbol(r)?,
        }
        .into(),
    };
    Ok(Some(msg))
}

/// Buffers the tag and payload of `msg` without flushing.
fn write_fields<W: Write>(w: &mut ByteWriter<W>, msg: &Message) -> Result<()> {
    w.write_u8(msg.kind().tag());
    match msg {
        Message::SyncStarted(m) => w.write_i32(m.id),
        Message::SyncCompleted(m) => {
            w.write_i32(m.id);
            w.write_i64(m.duration_millis);
        }
        Message::SyncParameters(m) => {
            w.write_strings(&m.gradle_args)?;
            w.write_strings(&m.jvm_args)?;
        }
        Message::ConnectionParameters(m) => w.write_str(&m.installation_path)?,
        Message::SyncRequest(m) => {
            w.write_i32(m.id);
            w.write_str(m.kind.as_str())?;
        }
        Message::SyncRequestCompleted(m) => {
            w.write_i32(m.id);
            w.write_i64(m.duration_millis);
            w.write_str(m.result.as_str())?;
        }
    }
    Ok(())
}

/// Reads an enum field sent by its symbolic name.
fn read_symbol<R: Read, S: Symbol>(r: &mut ByteReader<R>) -> Result<S> {
    let name = r.read_string()?;
    S::from_name(&name).ok_or_else(|| Error::UnknownSymbol {
        peer: r.peer().to_owned(),
        kind: S::KIND,
        name,
    })
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::message::{SyncRequestType, SyncResult};

    fn to_bytes(msg: &Message) -> Vec<u8> {
        let mut w = ByteWriter::new("agent", Vec::new());
        encode(&mut w, msg).unwrap();
        w.into_inner()
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Option<Message>> {
        let mut r = ByteReader::new("agent", io::Cursor::new(bytes));
        decode(&mut r)
    }

    fn roundtrip(msg: Message) {
        let decoded = from_bytes(to_bytes(&msg)).unwrap();
        assert_eq!(decoded, Some(msg));
    }

    #[test]
    fn roundtrip_every_variant() {
        roundtrip(SyncStarted { id: 0 }.into());
        roundtrip(SyncStarted { id: i32::MIN }.into());
        roundtrip(
            SyncCompleted {
                id: 42,
                duration_millis: 1500,
            }
            .into(),
        );
        roundtrip(SyncParameters::default().into());
        roundtrip(
            SyncParameters {
                gradle_args: vec!["--offline".into(), "-Dx=ü".into(), String::new()],
                jvm_args: vec!["-Xmx2g".into()],
            }
            .into(),
        );
        roundtrip(ConnectionParameters::new("/opt/gradle-8.5").into());
        roundtrip(ConnectionParameters::new("").into());
        roundtrip(
            SyncRequest {
                id: 7,
                kind: SyncRequestType::Exit,
            }
            .into(),
        );
        roundtrip(
            SyncRequestCompleted {
                id: -1,
                duration_millis: i64::MAX,
                result: SyncResult::Skipped,
            }
            .into(),
        );
    }

    #[test]
    fn sync_completed_fields() {
        let bytes = to_bytes(
            &SyncCompleted {
                id: 42,
                duration_millis: 1500,
            }
            .into(),
        );
        assert_eq!(bytes, [2, 0, 0, 0, 42, 0, 0, 0, 0, 0, 0, 0x05, 0xdc]);
        match from_bytes(bytes).unwrap() {
            Some(Message::SyncCompleted(m)) => {
                assert_eq!(m.id, 42);
                assert_eq!(m.duration_millis, 1500);
            }
            other => panic!("expected SyncCompleted, got {other:?}"),
        }
    }

    #[test]
    fn empty_list_stays_empty() {
        let msg = SyncParameters {
            gradle_args: vec!["--offline".into()],
            jvm_args: vec![],
        };
        match from_bytes(to_bytes(&msg.into())).unwrap() {
            Some(Message::SyncParameters(m)) => {
                assert_eq!(m.gradle_args, ["--offline"]);
                assert!(m.jvm_args.is_empty());
            }
            other => panic!("expected SyncParameters, got {other:?}"),
        }
    }

    #[test]
    fn enums_travel_by_name() {
        let bytes = to_bytes(
            &SyncRequest {
                id: 1,
                kind: SyncRequestType::Sync,
            }
            .into(),
        );
        assert_eq!(bytes, [5, 0, 0, 0, 1, 0, 0, 0, 4, b'S', b'Y', b'N', b'C']);
    }

    #[test]
    fn emits_table_tags() {
        let cases: Vec<(Message, u8)> = vec![
            (SyncStarted { id: 1 }.into(), 1),
            (
                SyncCompleted {
                    id: 1,
                    duration_millis: 1,
                }
                .into(),
                2,
            ),
            (SyncParameters::default().into(), 3),
            (ConnectionParameters::new("/").into(), 4),
            (
                SyncRequest {
                    id: 1,
                    kind: SyncRequestType::Sync,
                }
                .into(),
                5,
            ),
            (
                SyncRequestCompleted {
                    id: 1,
                    duration_millis: 1,
                    result: SyncResult::Succeeded,
                }
                .into(),
                6,
            ),
        ];
        for (msg, tag) in cases {
            assert_eq!(to_bytes(&msg)[0], tag, "{:?}", msg.kind());
        }
    }

    #[test]
    fn unknown_tags_are_protocol_errors() {
        for tag in [0u8, 7, 0x7f, 0xff] {
            let err = from_bytes(vec![tag, 0, 0, 0, 0]).unwrap_err();
            assert!(err.is_protocol());
            assert_eq!(
                err.to_string(),
                format!("received unexpected message tag {tag} from agent")
            );
        }
    }

    #[test]
    fn unknown_symbol_is_protocol_error() {
        let mut w = ByteWriter::new("agent", Vec::new());
        w.write_u8(6);
        w.write_i32(3);
        w.write_i64(10);
        w.write_str("EXPLODED").unwrap();
        w.flush().unwrap();

        let err = from_bytes(w.into_inner()).unwrap_err();
        assert!(err.is_protocol());
        assert!(matches!(
            err,
            Error::UnknownSymbol { kind: "sync result", ref name, .. } if name == "EXPLODED"
        ));
    }

    #[test]
    fn eof_before_tag_is_disconnect() {
        assert_eq!(from_bytes(Vec::new()).unwrap(), None);
    }

    #[test]
    fn eof_inside_payload_is_io_error() {
        let err = from_bytes(vec![2, 0, 0, 0, 1, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!err.is_protocol());
    }

    #[test]
    fn messages_follow_each_other_in_order() {
        let mut bytes = to_bytes(&SyncStarted { id: 1 }.into());
        bytes.extend(to_bytes(&SyncStarted { id: 2 }.into()));

        let mut r = ByteReader::new("agent", io::Cursor::new(bytes));
        assert_eq!(decode(&mut r).unwrap(), Some(SyncStarted { id: 1 }.into()));
        assert_eq!(decode(&mut r).unwrap(), Some(SyncStarted { id: 2 }.into()));
        assert_eq!(decode(&mut r).unwrap(), None);
    }
}
