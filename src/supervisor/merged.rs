//! One OS pipe shared by the child's stdout and stderr.
//!
//! Both descriptors of the child point at the same write end, so the reader
//! sees bytes in exactly the order the process wrote them.

use std::io;
use std::process::Stdio;

/// Read size for each output chunk.
const CHUNK: usize = 8 * 1024;

/// Read end of the merged pipe plus the two child-side handles.
pub(crate) struct MergedPipe {
    pub output: MergedOutput,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

#[cfg(unix)]
pub(crate) struct MergedOutput {
    rx: tokio::net::unix::pipe::Receiver,
    buf: Vec<u8>,
}

#[cfg(unix)]
impl MergedPipe {
    /// Must be called from inside a Tokio runtime.
    pub fn open() -> io::Result<Self> {
        use std::os::fd::OwnedFd;

        let (reader, writer) = io::pipe()?;
        let err_writer = writer.try_clone()?;
        let rx = tokio::net::unix::pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
        Ok(MergedPipe {
            output: MergedOutput {
                rx,
                buf: vec![0u8; CHUNK],
            },
            stdout: Stdio::from(writer),
            stderr: Stdio::from(err_writer),
        })
    }
}

#[cfg(unix)]
impl MergedOutput {
    /// Next chunk, or `None` once every write end is closed.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        use tokio::io::AsyncReadExt;

        let n = self.rx.read(&mut self.buf).await?;
        Ok((n > 0).then(|| self.buf[..n].to_vec()))
    }
}

#[cfg(not(unix))]
pub(crate) struct MergedOutput {
    rx: tokio::sync::mpsc::UnboundedReceiver<io::Result<Vec<u8>>>,
}

#[cfg(not(unix))]
impl MergedPipe {
    pub fn open() -> io::Result<Self> {
        use std::io::Read;

        let (mut reader, writer) = io::pipe()?;
        let err_writer = writer.try_clone()?;
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let mut buf = vec![0u8; CHUNK];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });
        Ok(MergedPipe {
            output: MergedOutput { rx },
            stdout: Stdio::from(writer),
            stderr: Stdio::from(err_writer),
        })
    }
}

#[cfg(not(unix))]
impl MergedOutput {
    pub async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.rx.recv().await.transpose()
    }
}
