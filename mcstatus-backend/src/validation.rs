/// Input validation for server addresses
use std::net::Ipv6Addr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Address cannot be empty")]
    AddressEmpty,

    #[error("Host too long (max 253 characters, got {0})")]
    HostTooLong(usize),

    #[error("Host contains invalid characters")]
    HostInvalidChars,

    #[error("Invalid port '{0}' (expected 1-65535)")]
    InvalidPort(String),
}

const MAX_HOST_LEN: usize = 253;

/// Validates a host name or IPv4 address
///
/// Rules:
/// - Cannot be empty
/// - Max 253 characters (DNS name limit)
/// - Only ASCII letters, digits, '.', '-' and '_'
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    if host.is_empty() {
        return Err(ValidationError::AddressEmpty);
    }

    if host.len() > MAX_HOST_LEN {
        return Err(ValidationError::HostTooLong(host.len()));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(ValidationError::HostInvalidChars);
    }

    Ok(())
}

/// Splits `host[:port]`, `[ipv6]:port` or a bare IPv6 address.
///
/// The host is returned as given; `default_port` is used when none is present.
pub fn parse_address(address: &str, default_port: u16) -> Result<(String, u16), ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::AddressEmpty);
    }

    // Bare IPv6, no port
    if address.parse::<Ipv6Addr>().is_ok() {
        return Ok((address.to_owned(), default_port));
    }

    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or(ValidationError::HostInvalidChars)?;
        host.parse::<Ipv6Addr>()
            .map_err(|_| ValidationError::HostInvalidChars)?;

        let port = match after {
            "" => None,
            _ => Some(
                after
                    .strip_prefix(':')
                    .ok_or_else(|| ValidationError::InvalidPort(after.to_owned()))?,
            ),
        };
        (host, port)
    } else {
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (address, None),
        };
        validate_host(host)?;
        (host, port)
    };

    let port = match port {
        Some(port) => parse_port(port)?,
        None => default_port,
    };

    Ok((host.to_owned(), port))
}

fn parse_port(port: &str) -> Result<u16, ValidationError> {
    match port.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ValidationError::InvalidPort(port.to_owned())),
    }
}
