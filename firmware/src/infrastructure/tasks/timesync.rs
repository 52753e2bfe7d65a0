//! Network time synchronization
//!
//! Periodically fetches the configured timezone from worldtimeapi over
//! plain HTTP and anchors the shared wall clock. A failed fetch is logged
//! and retried on a short interval; the clock keeps free-running from the
//! previous anchor in the meantime.

use core::fmt::Write as _;

use embassy_net::Stack;
use embassy_net::tcp::TcpSocket;
use embassy_time::{Duration, Timer};
use embedded_io_async::{Read as _, Write as _};
use log::{info, warn};
use serde::Deserialize;

use crate::config;
use crate::context::AppContext;
use crate::infrastructure::drivers::resolve_host;

const TIME_API_HOST: &str = "worldtimeapi.org";
const TIME_API_PORT: u16 = 80;
const RESPONSE_BUF_SIZE: usize = 2048;

/// The fields of the worldtimeapi document the clock needs; everything
/// else in the response is skipped.
#[derive(Debug, Deserialize)]
struct TimeApiResponse {
    unixtime: i64,
    raw_offset: i32,
    #[serde(default)]
    dst_offset: i32,
}

#[embassy_executor::task]
pub(crate) async fn timesync_task(stack: Stack<'static>, ctx: &'static AppContext) {
    loop {
        let interval = match fetch_time(stack).await {
            Ok((unixtime, offset_seconds)) => {
                ctx.clock.set(unixtime, offset_seconds);
                info!(
                    "timesync: unixtime={} offset={}s tz={}",
                    unixtime,
                    offset_seconds,
                    config::TIMEZONE
                );
                config::TIME_SYNC_INTERVAL
            }
            Err(()) => {
                warn!("timesync: fetch failed, retrying soon");
                config::TIME_SYNC_RETRY
            }
        };
        Timer::after(interval).await;
    }
}

async fn fetch_time(stack: Stack<'static>) -> Result<(i64, i32), ()> {
    let address = resolve_host(stack, TIME_API_HOST).await?;

    let mut rx_buffer = [0u8; 1024];
    let mut tx_buffer = [0u8; 512];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(10)));
    socket
        .connect((address, TIME_API_PORT))
        .await
        .map_err(|error| warn!("timesync: TCP connect failed: {:?}", error))?;

    let mut request: heapless::String<160> = heapless::String::new();
    write!(
        request,
        "GET /api/timezone/{} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        config::TIMEZONE,
        TIME_API_HOST
    )
    .map_err(|_| ())?;
    socket
        .write_all(request.as_bytes())
        .await
        .map_err(|error| warn!("timesync: request write failed: {:?}", error))?;

    let mut response = [0u8; RESPONSE_BUF_SIZE];
    let mut length = 0;
    loop {
        match socket.read(&mut response[length..]).await {
            Ok(0) => break,
            Ok(read) => {
                length += read;
                if length == RESPONSE_BUF_SIZE {
                    break;
                }
            }
            Err(error) => {
                warn!("timesync: response read failed: {:?}", error);
                return Err(());
            }
        }
    }

    parse_response(&response[..length])
}

fn parse_response(response: &[u8]) -> Result<(i64, i32), ()> {
    // "HTTP/1.1 200 ..." - anything else is a failed fetch
    if response.get(9..12) != Some(b"200".as_slice()) {
        warn!("timesync: non-200 response");
        return Err(());
    }
    let body_start = response
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or(())?
        + 4;

    let (parsed, _) = serde_json_core::from_slice::<TimeApiResponse>(&response[body_start..])
        .map_err(|_| warn!("timesync: malformed response body"))?;
    Ok((parsed.unixtime, parsed.raw_offset + parsed.dst_offset))
}
