//! Unidirectional byte channel between a parent and a forked child.
//!
//! A [`Channel`] owns both ends of one OS pipe. Each process keeps only the
//! half it uses: the child takes the writer through [`Channel::with_writer`],
//! the parent drains the reader through [`Channel::with_reader`]. Both scoped
//! accessors close the opposite half on entry and their own half on exit,
//! including when the closure unwinds.

use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use crate::config::DEFAULT_READ_CHUNK_SIZE;
use crate::error::{Error, Result};

/// Both ends of a pipe, each released independently.
#[derive(Debug)]
pub struct Channel {
    reader: Option<OwnedFd>,
    writer: Option<OwnedFd>,
    read_chunk_size: usize,
}

impl Channel {
    /// Create a new pipe. Both descriptors are close-on-exec.
    pub fn new() -> Result<Self> {
        let (reader, writer) = cloexec_pipe().map_err(Error::Pipe)?;
        Ok(Self {
            reader: Some(reader),
            writer: Some(writer),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        })
    }

    /// Set the chunk size used by readers handed out by this channel.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Run `f` with the write end, closing the read end first.
    ///
    /// The write end is closed when `f` returns or unwinds.
    pub fn with_writer<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut ChannelWriter) -> R,
    {
        self.close_reader();
        let fd = self.writer.take().ok_or(Error::EndpointClosed("writer"))?;
        let mut writer = ChannelWriter::new(fd);
        Ok(f(&mut writer))
    }

    /// Run `f` with the read end, closing the write end first.
    ///
    /// The read end is closed when `f` returns or unwinds.
    pub fn with_reader<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut ChannelReader) -> R,
    {
        self.close_writer();
        let fd = self.reader.take().ok_or(Error::EndpointClosed("reader"))?;
        let mut reader = ChannelReader::with_chunk_size(fd, self.read_chunk_size);
        Ok(f(&mut reader))
    }

    /// Hand out both ends as unscoped endpoints.
    pub fn split(mut self) -> Result<(ChannelReader, ChannelWriter)> {
        let reader = self.reader.take().ok_or(Error::EndpointClosed("reader"))?;
        let writer = self.writer.take().ok_or(Error::EndpointClosed("writer"))?;
        Ok((
            ChannelReader::with_chunk_size(reader, self.read_chunk_size),
            ChannelWriter::new(writer),
        ))
    }

    /// Release this process's copy of the write end.
    pub fn close_writer(&mut self) {
        self.writer.take();
    }

    /// Release this process's copy of the read end.
    pub fn close_reader(&mut self) {
        self.reader.take();
    }

    /// Whether this process still holds the write end.
    pub fn is_writer_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Whether this process still holds the read end.
    pub fn is_reader_open(&self) -> bool {
        self.reader.is_some()
    }
}

/// Write-only end of a [`Channel`]. Retries on `EINTR`.
#[derive(Debug)]
pub struct ChannelWriter {
    fd: OwnedFd,
}

impl ChannelWriter {
    fn new(fd: OwnedFd) -> Self {
        Self { fd }
    }
}

impl AsFd for ChannelWriter {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for ChannelWriter {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::write(
                    self.fd.as_raw_fd(),
                    buf.as_ptr().cast::<libc::c_void>(),
                    buf.len(),
                )
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        // Unbuffered: every write goes straight to the pipe.
        Ok(())
    }
}

/// Read-only end of a [`Channel`]. Retries on `EINTR`.
#[derive(Debug)]
pub struct ChannelReader {
    fd: OwnedFd,
    chunk_size: usize,
}

impl ChannelReader {
    fn with_chunk_size(fd: OwnedFd, chunk_size: usize) -> Self {
        Self { fd, chunk_size }
    }

    /// Read until end-of-data, accumulating every chunk.
    ///
    /// Blocks until every copy of the write end has been closed.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.read(&mut chunk)? {
                0 => return Ok(bytes),
                n => bytes.extend_from_slice(&chunk[..n]),
            }
        }
    }
}

impl AsFd for ChannelReader {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for ChannelReader {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::read(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                )
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

/// Returns (read_end, write_end) of a pipe with close-on-exec set.
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds: [libc::c_int; 2] = [-1; 2];

    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };

    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: pipe succeeded, so both descriptors are open and owned by nobody else.
    let (reader, writer) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    {
        set_cloexec(&reader)?;
        set_cloexec(&writer)?;
    }

    Ok((reader, writer))
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
    if unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
