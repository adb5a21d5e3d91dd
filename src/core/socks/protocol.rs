// src/core/socks/protocol.rs

//! SOCKS5 wire types and frame readers/writers (RFC 1928 / RFC 1929).

use crate::core::errors::SessionError;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const SOCKS_VERSION: u8 = 0x05;
/// Version byte of the username/password sub-negotiation.
pub const AUTH_VERSION: u8 = 0x01;
pub const AUTH_SUCCESS: u8 = 0x00;
pub const AUTH_FAILURE: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthMethod {
    UserPass = 0x02,
    NoAcceptable = 0xFF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Connect = 0x01,
    Bind = 0x02,
    UdpAssociate = 0x03,
}

impl TryFrom<u8> for Command {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0x01 => Ok(Command::Connect),
            0x02 => Ok(Command::Bind),
            0x03 => Ok(Command::UdpAssociate),
            other => Err(other),
        }
    }
}

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    Succeeded = 0x00,
    GeneralFailure = 0x01,
    NotAllowed = 0x02,
    NetworkUnreachable = 0x03,
    HostUnreachable = 0x04,
    ConnectionRefused = 0x05,
    TtlExpired = 0x06,
    CommandNotSupported = 0x07,
    AddressTypeNotSupported = 0x08,
}

impl ReplyCode {
    /// Maps an outbound connect failure to the closest SOCKS5 reply.
    pub fn from_io_error(e: &io::Error) -> ReplyCode {
        match e.kind() {
            io::ErrorKind::TimedOut => ReplyCode::TtlExpired,
            io::ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
            io::ErrorKind::PermissionDenied => ReplyCode::NotAllowed,
            io::ErrorKind::NetworkUnreachable => ReplyCode::NetworkUnreachable,
            io::ErrorKind::HostUnreachable => ReplyCode::HostUnreachable,
            _ => ReplyCode::GeneralFailure,
        }
    }
}

/// The destination requested by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    Ip(SocketAddr),
    Domain(String, u16),
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{addr}"),
            TargetAddr::Domain(host, port) => write!(f, "{host}:{port}"),
        }
    }
}

/// A parsed request. `command` is kept raw so unsupported values can still be
/// answered after the address has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: u8,
    pub target: TargetAddr,
}

/// Reads the method-selection message and returns the offered methods.
pub async fn read_greeting<R>(reader: &mut R) -> Result<Vec<u8>, SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    reader.read_exact(&mut header).await?;
    if header[0] != SOCKS_VERSION {
        return Err(SessionError::UnsupportedVersion(header[0]));
    }
    let mut methods = vec![0u8; header[1] as usize];
    reader.read_exact(&mut methods).await?;
    Ok(methods)
}

pub async fn write_method_selection<W>(writer: &mut W, method: AuthMethod) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&[SOCKS_VERSION, method as u8]).await
}

/// Reads an RFC 1929 username/password request.
pub async fn read_credentials<R>(reader: &mut R) -> Result<(String, String), SessionError>
where
    R: AsyncRead + Unpin,
{
    let version = reader.read_u8().await?;
    if version != AUTH_VERSION {
        return Err(SessionError::Protocol(format!(
            "unexpected auth sub-negotiation version {version}"
        )));
    }
    let username = read_short_string(reader).await?;
    let password = read_short_string(reader).await?;
    Ok((username, password))
}

pub async fn write_auth_status<W>(writer: &mut W, status: u8) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&[AUTH_VERSION, status]).await
}

/// Reads a request header and its destination address.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    reader.read_exact(&mut header).await?;
    let [version, command, _reserved, atyp] = header;
    if version != SOCKS_VERSION {
        return Err(SessionError::UnsupportedVersion(version));
    }

    let target = match atyp {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            reader.read_exact(&mut octets).await?;
            let port = reader.read_u16().await?;
            TargetAddr::Ip(SocketAddr::new(IpAddr::V4(Ipv4Addr::from(octets)), port))
        }
        ATYP_IPV6 => {
            let mut octets = [0u8; 16];
            reader.read_exact(&mut octets).await?;
            let port = reader.read_u16().await?;
            TargetAddr::Ip(SocketAddr::new(IpAddr::V6(Ipv6Addr::from(octets)), port))
        }
        ATYP_DOMAIN => {
            let host = read_short_string(reader).await?;
            if host.is_empty() {
                return Err(SessionError::Protocol("empty domain name".to_string()));
            }
            let port = reader.read_u16().await?;
            TargetAddr::Domain(host, port)
        }
        other => return Err(SessionError::UnsupportedAddressType(other)),
    };

    Ok(Request { command, target })
}

/// Writes a reply carrying `bound` (or `0.0.0.0:0` when unknown).
pub async fn write_reply<W>(
    writer: &mut W,
    code: ReplyCode,
    bound: Option<SocketAddr>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_reply(code, bound)).await?;
    writer.flush().await
}

pub fn encode_reply(code: ReplyCode, bound: Option<SocketAddr>) -> Vec<u8> {
    let bound = bound.unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 0)));
    let mut buf = Vec::with_capacity(22);
    buf.extend_from_slice(&[SOCKS_VERSION, code as u8, 0x00]);
    match bound.ip() {
        IpAddr::V4(ip) => {
            buf.push(ATYP_IPV4);
            buf.extend_from_slice(&ip.octets());
        }
        IpAddr::V6(ip) => {
            buf.push(ATYP_IPV6);
            buf.extend_from_slice(&ip.octets());
        }
    }
    buf.extend_from_slice(&bound.port().to_be_bytes());
    buf
}

async fn read_short_string<R>(reader: &mut R) -> Result<String, SessionError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u8().await? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    String::from_utf8(buf).map_err(|_| SessionError::Protocol("string is not valid UTF-8".into()))
}
