use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Counting pass-through over an [`AsyncRead`].
///
/// Bytes are forwarded unchanged. After every non-empty read the callback gets
/// `(bytes_so_far, total)`, where `total` is 0 when the length is unknown.
pub struct ProgressReader<R, F> {
    inner: R,
    on_progress: F,
    current: u64,
    total: u64,
}

impl<R, F> ProgressReader<R, F>
where
    R: AsyncRead + Unpin,
    F: FnMut(u64, u64) + Unpin,
{
    pub fn new(inner: R, total: u64, on_progress: F) -> Self {
        Self {
            inner,
            on_progress,
            current: 0,
            total,
        }
    }
}

impl<R, F> AsyncRead for ProgressReader<R, F>
where
    R: AsyncRead + Unpin,
    F: FnMut(u64, u64) + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();

        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            let read = (buf.filled().len() - before) as u64;
            if read > 0 {
                this.current += read;
                (this.on_progress)(this.current, this.total);
            }
        }
        poll
    }
}
