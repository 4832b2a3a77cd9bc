//! Byte sinks and sources.
//!
//! The codec never owns or closes the stream it is handed. Any `bytes::BufMut` is a [`Sink`] and
//! any `bytes::Buf` is a [`Source`]; `std::io` streams are adapted with [`IoSink`] and
//! [`IoSource`].

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut};

use crate::{CodecError, MalformedError, Result};

/// A sequential byte sink.
pub trait Sink {
    /// Appends all of `bytes`.
    fn push_slice(&mut self, bytes: &[u8]) -> Result<()>;

    fn push_byte(&mut self, byte: u8) -> Result<()> {
        self.push_slice(&[byte])
    }
}

/// A sequential byte source.
pub trait Source {
    /// Fills all of `dst`, failing with `MalformedError::InsufficientData` on a short read.
    fn pull_exact(&mut self, dst: &mut [u8]) -> Result<()>;

    /// Bytes known to remain, if the source can tell.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }
}

impl<B: BufMut + ?Sized> Sink for B {
    fn push_slice(&mut self, bytes: &[u8]) -> Result<()> {
        if self.remaining_mut() < bytes.len() {
            return Err(CodecError::Io(std::io::Error::new(
                ErrorKind::WriteZero,
                "sink has no room left",
            )));
        }
        self.put_slice(bytes);
        Ok(())
    }
}

impl<B: Buf + ?Sized> Source for B {
    fn pull_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        if self.remaining() < dst.len() {
            return Err(MalformedError::InsufficientData {
                needed: dst.len() - self.remaining(),
            }
            .into());
        }
        self.copy_to_slice(dst);
        Ok(())
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.remaining())
    }
}

/// Adapts a [`std::io::Write`] into a [`Sink`].
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for IoSink<W> {
    fn push_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }
}

/// Adapts a [`std::io::Read`] into a [`Source`]. Reads exactly what the decoder asks for.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Source for IoSource<R> {
    fn pull_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        self.inner.read_exact(dst).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                MalformedError::InsufficientData { needed: dst.len() }.into()
            } else {
                CodecError::Io(e)
            }
        })
    }
}
