//! Query and decode TCP information for a loopback connection.
//!
//! Opens a connection to a local listener, reads the connection
//! information, congestion control algorithm and its private information
//! through `getsockopt`, and prints the decoded result.
//!
//! Run with: RUST_LOG=debug cargo run -p tcpinfo --example host_tcp_info

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::fd::AsRawFd;

    use tcpinfo::{Platform, SocketOption, SockoptKind, parse_cc_algorithm_info};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await?;
        let mut buf = [0u8; 64];
        let n = sock.read(&mut buf).await?;
        sock.write_all(&buf[..n]).await?;
        Ok::<_, std::io::Error>(())
    });

    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(b"ping").await?;
    let mut echo = [0u8; 4];
    stream.read_exact(&mut echo).await?;
    server.await??;

    let platform = Platform::host();
    let fd = stream.as_raw_fd();

    println!("=== {platform} connection {} -> {addr} ===", stream.local_addr()?);

    // The algorithm name is needed to decode TCP_CC_INFO, so query it first.
    let mut algorithm = None;
    for kind in [SockoptKind::Info, SockoptKind::CcAlgorithm, SockoptKind::CcInfo] {
        let Ok(id) = platform.option_id(kind) else {
            continue;
        };
        let data = match getsockopt(fd, id.level, id.name, 512) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(%kind, error = %e, "getsockopt failed");
                continue;
            }
        };

        match SocketOption::parse(platform, id, &data)? {
            SocketOption::Info(info) => {
                println!("{}", info.to_json_pretty()?);
                println!("{}", info.summary());
            }
            SocketOption::CcAlgorithm(name) => {
                println!("congestion control: {name}");
                algorithm = Some(name);
            }
            SocketOption::CcInfo(raw) => {
                println!("cc info: {} bytes", raw.raw.len());
                let Some(name) = &algorithm else { continue };
                match parse_cc_algorithm_info(name.as_str(), &raw.raw) {
                    Ok(info) => println!("{}: {}", info.algorithm(), info.to_json()),
                    Err(e) => tracing::debug!(%name, error = %e, "no algorithm details"),
                }
            }
        }
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn getsockopt(
    fd: std::os::fd::RawFd,
    level: i32,
    name: i32,
    cap: usize,
) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; cap];
    let mut len = cap as libc::socklen_t;

    // SAFETY: buf is valid for `len` bytes and fd is an open socket.
    let ret = unsafe {
        libc::getsockopt(
            fd,
            level,
            name,
            buf.as_mut_ptr().cast::<libc::c_void>(),
            &mut len,
        )
    };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }

    buf.truncate(len as usize);
    Ok(buf)
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("This example queries sockets with Linux option numbers and only runs on Linux.");
}
