use std::{fs, path::Path};

use log::{debug, warn};

/// Kernel parameter holding the largest spidev message size.
pub const BUFSIZ_PARAM: &str = "/sys/module/spidev/parameters/bufsiz";

/// Reads the spidev buffer size from `param`, falling back to the driver
/// default when it is missing or unreadable.
pub fn discover_max_transfer(param: &Path) -> usize {
    let fallback = epd4in2::protocol::DEFAULT_MAX_TRANSFER;
    match fs::read_to_string(param) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(size) if size > 0 => {
                debug!("spi: bufsiz {}", size);
                size
            }
            _ => {
                warn!("spi: unexpected bufsiz {:?}, using {}", raw.trim(), fallback);
                fallback
            }
        },
        Err(err) => {
            debug!("spi: {} unreadable ({}), using {}", param.display(), err, fallback);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_kernel_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let param = dir.path().join("bufsiz");
        fs::write(&param, "4096\n").unwrap();
        assert_eq!(discover_max_transfer(&param), 4096);
    }

    #[test]
    fn falls_back_when_missing_or_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let param = dir.path().join("bufsiz");
        assert_eq!(discover_max_transfer(&param), 512);

        fs::write(&param, "lots").unwrap();
        assert_eq!(discover_max_transfer(&param), 512);

        fs::write(&param, "0").unwrap();
        assert_eq!(discover_max_transfer(&param), 512);
    }
}
