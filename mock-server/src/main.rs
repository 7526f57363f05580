use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = match std::env::var("PORT") {
        Ok(raw) => raw.trim().parse::<u16>().map_err(|err| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("PORT={raw}: {err}"))
        })?,
        Err(_) => 3000,
    };
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await?;
    println!("echo server on http://{}", listener.local_addr()?);
    println!("  ANY /echo, ANY /echo/{{id}}, GET /health");
    mock_server::run(listener).await
}
