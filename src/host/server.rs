use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::Result;
use crate::host::{HostReply, HostRequest, Service};

/// Line-delimited JSON loop between the host runtime and the service.
///
/// One request per line, one reply per line, strictly in order. Returns on
/// EOF or after answering a `shutdown` request.
pub async fn serve<R, W>(service: &mut Service, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (reply, stop) = match serde_json::from_str::<HostRequest>(line) {
            Ok(request) => {
                let stop = matches!(request, HostRequest::Shutdown);
                (service.handle(request).await, stop)
            }
            Err(e) => {
                debug!(error = %e, "rejected host line");
                (
                    HostReply::Error {
                        message: format!("invalid request: {e}"),
                    },
                    false,
                )
            }
        };

        write_reply(&mut writer, &reply).await?;
        if stop {
            break;
        }
    }

    service.shutdown();
    info!("host stream closed");
    Ok(())
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &HostReply) -> Result<()> {
    let mut json = serde_json::to_string(reply)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
