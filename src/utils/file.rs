use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Writes `text` to `path`, or to stdout when there is none.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = File::create(path).map_err(|e| Error::io(path, e))?;
            file.write_all(text.as_bytes()).map_err(|e| Error::io(path, e))?;
            file.flush().map_err(|e| Error::io(path, e))
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(text.as_bytes())
                .and_then(|_| lock.flush())
                .map_err(|e| Error::io("<stdout>", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_and_read_back() {
        let path = std::env::temp_dir().join(format!("pi_output_{}.txt", std::process::id()));
        write_output(Some(path.as_path()), "3.14159\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "3.14159\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unopenable_destination() {
        let path = std::env::temp_dir().join("no_such_dir_for_pi").join("pi.txt");
        match write_output(Some(path.as_path()), "3.1\n") {
            Err(Error::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected an io error, got {:?}", other),
        }
    }
}
