use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

fn level_for(debug_enabled: bool) -> LevelFilter {
    if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn logger_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("nudge")
        .build()
}

/// Cuts an oversized log down to its newest half, starting at a line
/// boundary. The handle must be readable and writable.
fn trim_to_recent_half(file: &mut File, max_log_size: u64) -> io::Result<()> {
    let len = file.metadata()?.len();
    if len <= max_log_size {
        return Ok(());
    }

    file.seek(SeekFrom::Start(len - max_log_size / 2))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    let keep_from = tail
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(0, |pos| pos + 1);

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&tail[keep_from..])?;
    file.flush()
}

/// Opens the log for appending, creating its directory first and trimming it
/// when a previous run left it larger than `max_log_size`.
fn open_log_file(log_path: &Path, max_log_size: u64) -> io::Result<File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(log_path)?;
    trim_to_recent_half(&mut file, max_log_size)?;
    Ok(file)
}

/// Installs the process-wide logger for one run of the binary.
///
/// The log file receives warnings and errors, or everything when debug
/// logging is on; debug logging also echoes records to stderr. Only records
/// from the nudge crates pass.
///
/// # Errors
/// Returns the error that kept the log file from opening. The remaining
/// loggers are installed regardless.
pub fn init_logging(
    log_path: Option<&Path>,
    debug_enabled: bool,
    max_log_size: u64,
) -> io::Result<()> {
    let level = level_for(debug_enabled);
    let config = logger_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if debug_enabled {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    let file = log_path.map(|path| open_log_file(path, max_log_size)).transpose();
    let file_result = match file {
        Ok(Some(file)) => {
            loggers.push(WriteLogger::new(level, config, file));
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(error) => Err(error),
    };

    let _ = CombinedLogger::init(loggers);

    if let Some(path) = log_path
        && file_result.is_ok()
    {
        log::debug!("Logging to {}", path.display());
    }
    file_result
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use log::LevelFilter;

    use super::{level_for, open_log_file};

    #[test]
    fn open_log_file_creates_directory_and_appends() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("logs").join("debug.log");

        open_log_file(&log_path, 1024)
            .expect("log file should open")
            .write_all(b"first run\n")
            .expect("first write should succeed");
        open_log_file(&log_path, 1024)
            .expect("log file should reopen")
            .write_all(b"second run\n")
            .expect("second write should succeed");

        let contents = std::fs::read_to_string(&log_path).expect("log should be readable");
        assert_eq!(contents, "first run\nsecond run\n");
    }

    #[test]
    fn oversized_log_keeps_newest_whole_lines() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("debug.log");
        std::fs::write(&log_path, "line-1\nline-2\nline-3\nline-4\nline-5\n")
            .expect("test log file should be written");

        let mut file = open_log_file(&log_path, 20).expect("log file should open");
        file.write_all(b"line-6\n")
            .expect("write after trim should succeed");
        drop(file);

        let contents = std::fs::read_to_string(&log_path).expect("log should be readable");
        assert_eq!(contents, "line-5\nline-6\n");
    }

    #[test]
    fn log_within_limit_is_untouched() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("debug.log");
        std::fs::write(&log_path, "line-1\n").expect("test log file should be written");

        drop(open_log_file(&log_path, 1024).expect("log file should open"));

        let contents = std::fs::read_to_string(&log_path).expect("log should be readable");
        assert_eq!(contents, "line-1\n");
    }

    #[test]
    fn debug_flag_selects_level() {
        assert_eq!(level_for(true), LevelFilter::Debug);
        assert_eq!(level_for(false), LevelFilter::Warn);
    }
}
