//! Length-prefixed packet framing.
//!
//! Every packet on the wire is `varint(len) ++ body`. The codec knows
//! nothing about packet IDs or fields; it only moves bodies in and out.

use bytes::{Buf, Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};

use crate::error::ProbeError;
use crate::varint::{peek_varint, put_varint, varint_len};

/// Largest body the decoder will buffer. Status responses with a large
/// favicon stay well below this.
pub const MAX_PACKET_LEN: usize = 2 * 1024 * 1024;

/// `tokio_util` codec for the varint length prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl Decoder for PacketCodec {
    type Item = Bytes;
    type Error = ProbeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some((len, prefix)) = peek_varint(src)? else {
            return Ok(None);
        };
        let len = len as usize;
        if len > MAX_PACKET_LEN {
            return Err(ProbeError::protocol("packet too large"));
        }
        if src.len() < prefix + len {
            src.reserve(prefix + len - src.len());
            return Ok(None);
        }

        src.advance(prefix);
        Ok(Some(src.split_to(len).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            None => Err(ProbeError::protocol("truncated packet")),
        }
    }
}

impl Encoder<Bytes> for PacketCodec {
    type Error = ProbeError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = u32::try_from(item.len())
            .ok()
            .filter(|&len| len as usize <= MAX_PACKET_LEN)
            .ok_or_else(|| ProbeError::protocol("packet too large"))?;

        dst.reserve(varint_len(len) + item.len());
        put_varint(dst, len);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

/// Framed transport over any byte stream.
pub type PacketStream<S> = Framed<S, PacketCodec>;

/// Wrap `stream` in the packet codec.
pub fn framed<S>(stream: S) -> PacketStream<S>
where
    S: AsyncRead + AsyncWrite,
{
    Framed::new(stream, PacketCodec)
}

/// Write one packet and flush it.
pub async fn write_packet<S>(stream: &mut PacketStream<S>, payload: Bytes) -> Result<(), ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.send(payload).await
}

/// Read one whole packet body, waiting for partial reads to complete.
///
/// A stream that closes before a complete packet arrives yields
/// `ProtocolError("truncated packet")`.
pub async fn read_packet<S>(stream: &mut PacketStream<S>) -> Result<Bytes, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match stream.next().await {
        Some(packet) => packet,
        None => Err(ProbeError::protocol("truncated packet")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn encode_prefixes_length() {
        let mut dst = BytesMut::new();
        PacketCodec
            .encode(Bytes::from_static(&[0x00]), &mut dst)
            .unwrap();
        assert_eq!(&dst[..], &[0x01, 0x00]);

        let mut dst = BytesMut::new();
        let body = Bytes::from(vec![7u8; 300]);
        PacketCodec.encode(body, &mut dst).unwrap();
        assert_eq!(&dst[..2], &[0xAC, 0x02]);
        assert_eq!(dst.len(), 302);
    }

    #[test]
    fn decode_waits_for_full_body() {
        let mut src = BytesMut::from(&[0x03, 0xAA][..]);
        assert_eq!(PacketCodec.decode(&mut src).unwrap(), None);

        src.extend_from_slice(&[0xBB, 0xCC, 0x01]);
        let packet = PacketCodec.decode(&mut src).unwrap().unwrap();
        assert_eq!(&packet[..], &[0xAA, 0xBB, 0xCC]);
        assert_eq!(&src[..], &[0x01]);
    }

    #[test]
    fn decode_empty_body() {
        let mut src = BytesMut::from(&[0x00][..]);
        let packet = PacketCodec.decode(&mut src).unwrap().unwrap();
        assert!(packet.is_empty());
    }

    #[test]
    fn decode_rejects_oversized_length() {
        let mut src = BytesMut::new();
        put_varint(&mut src, MAX_PACKET_LEN as u32 + 1);
        assert_eq!(
            PacketCodec.decode(&mut src).unwrap_err(),
            ProbeError::protocol("packet too large")
        );
    }

    #[test]
    fn decode_eof_with_leftover_is_truncated() {
        let mut src = BytesMut::from(&[0x05, 0x01, 0x02][..]);
        assert_eq!(
            PacketCodec.decode_eof(&mut src).unwrap_err(),
            ProbeError::protocol("truncated packet")
        );
    }

    #[tokio::test]
    async fn read_packet_across_partial_reads() {
        let mock = Builder::new()
            .read(&[0x04])
            .read(&[0xDE, 0xAD])
            .read(&[0xBE, 0xEF])
            .build();
        let mut stream = framed(mock);
        let packet = read_packet(&mut stream).await.unwrap();
        assert_eq!(&packet[..], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[tokio::test]
    async fn read_packet_early_close() {
        let mock = Builder::new().read(&[0x0A, 0x01, 0x02]).build();
        let mut stream = framed(mock);
        assert_eq!(
            read_packet(&mut stream).await.unwrap_err(),
            ProbeError::protocol("truncated packet")
        );
    }

    #[tokio::test]
    async fn read_packet_on_closed_stream() {
        let mock = Builder::new().build();
        let mut stream = framed(mock);
        assert_eq!(
            read_packet(&mut stream).await.unwrap_err(),
            ProbeError::protocol("truncated packet")
        );
    }

    #[tokio::test]
    async fn write_then_read_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let mut writer = framed(client);
        let mut reader = framed(server);

        for payload in [&b""[..], &b"x"[..], &[0xFFu8; 200][..]] {
            write_packet(&mut writer, Bytes::copy_from_slice(payload))
                .await
                .unwrap();
            let got = read_packet(&mut reader).await.unwrap();
            assert_eq!(&got[..], payload);
        }
    }

    #[tokio::test]
    async fn write_packet_emits_prefix() {
        let mock = Builder::new().write(&[0x02, 0x00, 0x2F]).build();
        let mut stream = framed(mock);
        write_packet(&mut stream, Bytes::from_static(&[0x00, 0x2F]))
            .await
            .unwrap();
    }
}
