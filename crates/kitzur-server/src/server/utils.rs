//! Utilities for managing the API server.

use kitzur_core::{get_config_dir, KitzurError, Result};
use std::fs;
use std::net::TcpListener;
use std::path::PathBuf;

const PORT_FILENAME: &str = "api_port.txt";
const PORT_ATTEMPTS: u16 = 10;

fn port_file_path() -> PathBuf {
    get_config_dir().join(PORT_FILENAME)
}

/// Try to get the API server port from stored configuration
pub fn get_api_server_port() -> Result<u16> {
    let path = port_file_path();
    if !path.exists() {
        return Err(KitzurError::Other(
            "API server port information not found".to_string(),
        ));
    }

    fs::read_to_string(path)?
        .trim()
        .parse::<u16>()
        .map_err(|_| KitzurError::Other("Invalid port stored in configuration".to_string()))
}

/// Check if a port is available by trying to bind to it
pub fn port_is_available(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// First free port in `start..start + attempts`
pub fn find_available_port(start: u16, attempts: u16) -> Option<u16> {
    (0..attempts)
        .filter_map(|offset| start.checked_add(offset))
        .find(|port| port_is_available(*port))
}

/// `preferred` if it is free, otherwise the next free port after it
pub fn resolve_port(preferred: u16) -> Result<u16> {
    if port_is_available(preferred) {
        return Ok(preferred);
    }
    let fallback = preferred
        .checked_add(1)
        .and_then(|start| find_available_port(start, PORT_ATTEMPTS))
        .ok_or_else(|| {
            KitzurError::Other(format!(
                "Port {} is in use and no free port was found after it",
                preferred
            ))
        })?;
    log::warn!("Port {} is in use, using {} instead", preferred, fallback);
    Ok(fallback)
}

/// Save the API port to a configuration file
pub fn save_api_port(port: u16) -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }
    fs::write(config_dir.join(PORT_FILENAME), port.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_port_is_not_available() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!port_is_available(port));
        assert_ne!(find_available_port(port, 5), Some(port));
    }

    #[test]
    fn busy_port_falls_back_to_a_later_one() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        if port == u16::MAX {
            return;
        }

        let resolved = resolve_port(port).unwrap();
        assert!(resolved > port);
        assert!(u32::from(resolved) <= u32::from(port) + u32::from(PORT_ATTEMPTS));
    }
}
