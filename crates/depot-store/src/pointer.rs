use depot_types::{OidHasher, Pointer};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::StoreResult;

/// Buffer size used when streaming content through a hasher.
pub(crate) const COPY_BUF_SIZE: usize = 64 * 1024;

/// Stream `reader` to the end and return the pointer describing its content.
pub async fn generate_pointer<R>(reader: &mut R) -> StoreResult<Pointer>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = OidHasher::new();
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let size = hasher.len();
    Ok(Pointer::new(hasher.finalize(), size))
}
