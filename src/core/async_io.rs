//! Primitive and string codec over suspension-capable byte channels.
//!
//! Mirrors [`crate::core::primitives`] method for method. Encoding goes
//! through the same encoders, so both variants put identical bytes on the
//! wire. The only await points are the channel reads and writes.

use std::future::Future;

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::core::channel::{read_full_async, write_full_async};
use crate::core::primitives::{
    check_array_len, check_string_len, decode_string, encode_ascii, encode_byte_array,
    encode_utf, narrow, FixedWidth, Integral, MAX_STRING_CHARS,
};
use crate::core::varint::{encode_varint, encode_varlong, VarDecoder};
use crate::error::Result;

/// Async decode operations, available on every tokio [`AsyncRead`].
pub trait AsyncMcRead: AsyncRead + Unpin + Send {
    fn read_value<T: FixedWidth>(&mut self) -> impl Future<Output = Result<T>> + Send {
        async move { T::take(&read_full_async(self, T::SIZE).await?) }
    }

    fn read_varint(&mut self) -> impl Future<Output = Result<i32>> + Send {
        async move {
            let mut decoder = VarDecoder::varint();
            loop {
                let byte = match read_full_async(self, 1).await {
                    Ok(b) => b[0],
                    Err(e) => return Err(decoder.with_partial(e)),
                };
                if let Some(value) = decoder.push(byte)? {
                    return Ok(value as u32 as i32);
                }
            }
        }
    }

    fn read_varlong(&mut self) -> impl Future<Output = Result<i64>> + Send {
        async move {
            let mut decoder = VarDecoder::varlong();
            loop {
                let byte = match read_full_async(self, 1).await {
                    Ok(b) => b[0],
                    Err(e) => return Err(decoder.with_partial(e)),
                };
                if let Some(value) = decoder.push(byte)? {
                    return Ok(value as i64);
                }
            }
        }
    }

    fn read_utf(&mut self) -> impl Future<Output = Result<String>> + Send {
        self.read_utf_max(MAX_STRING_CHARS)
    }

    fn read_utf_max(&mut self, max_chars: usize) -> impl Future<Output = Result<String>> + Send {
        async move {
            let len = check_string_len(self.read_varint().await?, max_chars)?;
            decode_string(read_full_async(self, len).await?, max_chars)
        }
    }

    fn read_ascii(&mut self) -> impl Future<Output = Result<String>> + Send {
        async move {
            let mut out = String::new();
            loop {
                match read_full_async(self, 1).await?[0] {
                    0 => return Ok(out),
                    byte => out.push(byte as char),
                }
            }
        }
    }

    /// Read a presence flag and, if set, the value produced by `read`.
    ///
    /// ```ignore
    /// let port = reader.read_optional(|r| r.read_value::<u16>().boxed()).await?;
    /// ```
    fn read_optional<T, F>(&mut self, read: F) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T>> + Send,
    {
        async move {
            if self.read_value::<bool>().await? {
                read(self).await.map(Some)
            } else {
                Ok(None)
            }
        }
    }

    fn read_uuid(&mut self) -> impl Future<Output = Result<u128>> + Send {
        self.read_value::<u128>()
    }

    fn read_byte_array(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let len = check_array_len(self.read_varint().await?, "byte array")?;
            read_full_async(self, len).await
        }
    }

    fn read_bytes(&mut self, n: usize) -> impl Future<Output = Result<Vec<u8>>> + Send {
        read_full_async(self, n)
    }
}

impl<R: AsyncRead + Unpin + Send + ?Sized> AsyncMcRead for R {}

/// Async encode operations, available on every tokio [`AsyncWrite`].
pub trait AsyncMcWrite: AsyncWrite + Unpin + Send {
    fn write_value<T: FixedWidth>(&mut self, value: T) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut out = Vec::with_capacity(T::SIZE);
            value.put(&mut out);
            write_full_async(self, &out).await
        }
    }

    fn write_int<T: Integral>(&mut self, value: i128) -> impl Future<Output = Result<()>> + Send {
        async move {
            let narrowed = narrow::<T>(value)?;
            self.write_value(narrowed).await
        }
    }

    fn write_varint(&mut self, value: i32) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut out = Vec::with_capacity(5);
            encode_varint(value, &mut out);
            write_full_async(self, &out).await
        }
    }

    fn write_varlong(&mut self, value: i64) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut out = Vec::with_capacity(10);
            encode_varlong(value, &mut out);
            write_full_async(self, &out).await
        }
    }

    fn write_utf<'a>(&'a mut self, value: &'a str) -> impl Future<Output = Result<()>> + Send + 'a {
        self.write_utf_max(value, MAX_STRING_CHARS)
    }

    fn write_utf_max<'a>(
        &'a mut self,
        value: &'a str,
        max_chars: usize,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        async move {
            let mut out = Vec::with_capacity(value.len() + 3);
            encode_utf(value, max_chars, &mut out)?;
            write_full_async(self, &out).await
        }
    }

    fn write_ascii<'a>(&'a mut self, value: &'a str) -> impl Future<Output = Result<()>> + Send + 'a {
        async move {
            let mut out = Vec::with_capacity(value.len() + 1);
            encode_ascii(value, &mut out)?;
            write_full_async(self, &out).await
        }
    }

    /// Write a presence flag and, if present, delegate to `write`.
    fn write_optional<'a, T, F>(
        &'a mut self,
        value: Option<&'a T>,
        write: F,
    ) -> impl Future<Output = Result<()>> + Send + 'a
    where
        T: Sync + ?Sized,
        F: FnOnce(&'a mut Self, &'a T) -> BoxFuture<'a, Result<()>> + Send + 'a,
    {
        async move {
            self.write_value(value.is_some()).await?;
            match value {
                Some(v) => write(self, v).await,
                None => Ok(()),
            }
        }
    }

    fn write_uuid(&mut self, value: u128) -> impl Future<Output = Result<()>> + Send {
        self.write_value(value)
    }

    fn write_byte_array<'a>(&'a mut self, value: &'a [u8]) -> impl Future<Output = Result<()>> + Send + 'a {
        async move {
            let mut out = Vec::with_capacity(value.len() + 5);
            encode_byte_array(value, &mut out)?;
            write_full_async(self, &out).await
        }
    }

    fn write_raw<'a>(&'a mut self, bytes: &'a [u8]) -> impl Future<Output = Result<()>> + Send + 'a {
        write_full_async(self, bytes)
    }
}

impl<W: AsyncWrite + Unpin + Send + ?Sized> AsyncMcWrite for W {}
