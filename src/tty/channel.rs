//! Terminal device handles
//!
//! The device is opened once for reading and writing; the read side is a
//! duplicate of that descriptor handed to the capture loop, the write side
//! pushes bytes into the terminal's input queue with `TIOCSTI`.

use super::inject::InputSink;
use nix::libc;
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

mod ioctl {
    use nix::libc;

    nix::ioctl_write_ptr_bad!(tiocsti, libc::TIOCSTI, libc::c_char);
}

/// The terminal device could not be opened for reading and writing
#[derive(Debug, Error)]
#[error("failed to open {} for read/write: {}", .path.display(), .source)]
pub struct OpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Write side of a terminal: simulates typed input
#[derive(Debug)]
pub struct TtyWriter {
    file: File,
}

impl InputSink for TtyWriter {
    fn push_byte(&self, byte: u8) -> io::Result<()> {
        let byte = byte as libc::c_char;
        // SAFETY: TIOCSTI reads exactly one byte through the pointer, which
        // outlives the call.
        unsafe { ioctl::tiocsti(self.file.as_raw_fd(), &byte) }?;
        Ok(())
    }
}

/// An open terminal device
#[derive(Debug)]
pub struct TerminalChannel {
    path: PathBuf,
    reader: File,
    writer: Arc<TtyWriter>,
}

impl TerminalChannel {
    /// Open `path` for reading and writing.
    ///
    /// The device does not become our controlling terminal.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let path = path.as_ref().to_path_buf();
        let wrap = |source| OpenError {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(wrap)?;
        let reader = file.try_clone().map_err(wrap)?;

        if !file.is_terminal() {
            log::warn!(
                "{} is not a terminal, typo injection will fail",
                path.display()
            );
        }

        Ok(Self {
            path,
            reader,
            writer: Arc::new(TtyWriter { file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_terminal(&self) -> bool {
        self.reader.is_terminal()
    }

    pub fn writer(&self) -> Arc<TtyWriter> {
        Arc::clone(&self.writer)
    }

    /// Hand out the read side and the write side
    pub fn into_parts(self) -> (File, Arc<TtyWriter>) {
        (self.reader, self.writer)
    }

    /// Release both handles
    pub fn close(self) {
        log::debug!("closing {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn missing_device_is_an_open_error() {
        let err = TerminalChannel::open("/nonexistent/tty99").unwrap_err();
        assert_eq!(err.path, PathBuf::from("/nonexistent/tty99"));
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("/nonexistent/tty99"));
    }

    #[test]
    fn non_terminal_opens_but_rejects_injection() {
        let channel = TerminalChannel::open("/dev/null").unwrap();
        assert!(!channel.is_terminal());
        assert_eq!(channel.path(), Path::new("/dev/null"));
        assert!(channel.writer().push_byte(b'a').is_err());
        channel.close();
    }

    /// Allocate a pseudo-terminal, returning the master and the slave's path
    fn open_pty() -> (File, PathBuf) {
        use std::ffi::CStr;
        use std::os::unix::io::FromRawFd;

        // SAFETY: plain libc pty calls on a descriptor we own; `ptsname` is
        // copied out before any other pty call can overwrite its buffer.
        unsafe {
            let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(master >= 0, "posix_openpt: {}", io::Error::last_os_error());
            let master_file = File::from_raw_fd(master);
            assert_eq!(libc::grantpt(master), 0);
            assert_eq!(libc::unlockpt(master), 0);
            let name = libc::ptsname(master);
            assert!(!name.is_null());
            let slave = PathBuf::from(CStr::from_ptr(name).to_str().unwrap());
            (master_file, slave)
        }
    }

    #[test]
    fn injected_bytes_reach_the_terminal_input() {
        let (_master, slave) = open_pty();
        let channel = TerminalChannel::open(&slave).unwrap();
        assert!(channel.is_terminal());

        let writer = channel.writer();
        writer.push_byte(b'z').unwrap();
        writer.push_byte(b'\n').unwrap();

        // Canonical mode: the line shows up on the read side once complete.
        let (mut reader, _writer) = channel.into_parts();
        let mut line = [0u8; 2];
        reader.read_exact(&mut line).unwrap();
        assert_eq!(&line, b"z\n");
    }

    #[test]
    fn read_side_is_usable() {
        let channel = TerminalChannel::open("/dev/null").unwrap();
        let (mut reader, _writer) = channel.into_parts();
        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
