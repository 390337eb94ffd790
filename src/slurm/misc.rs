use std::process::Command;

use color_eyre::eyre::{bail, Context};
use color_eyre::Result;

/// Units accepted in memory values, in increasing powers of 1024
const MEM_UNITS: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

/// Converts an iterator of &str to an ``--Format`` argument
pub fn format_string<'a, I, S>(iter: I) -> String
where
    I: Iterator<Item = &'a S>,
    S: ?Sized + AsRef<str> + 'a,
{
    iter
        // Remove limit on field length (defaults to 20)
        .map(|v| format!("{}:0", v.as_ref()))
        .collect::<Vec<_>>()
        // Separate fields by a single space, which does not appear in any value
        .join(" ,")
}

/// Runs a Slurm command and returns its standard output
pub fn run(exe: &str, args: &[&str]) -> Result<Vec<u8>> {
    log::debug!("running {} {}", exe, args.join(" "));

    let output = Command::new(exe)
        .args(args)
        .output()
        .wrap_err_with(|| format!("failed to execute {:?}", exe))?;

    if !output.status.success() {
        bail!(
            "{:?} failed with {}: {}",
            exe,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(output.stdout)
}

/// Creates a reader for space separated `sinfo`/`squeue` output
pub fn reader<R>(reader: R) -> csv::Reader<R>
where
    R: std::io::Read,
{
    csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Parses a value in MB into bytes
pub fn megabytes(value: &str) -> Result<u64> {
    let value = value
        .parse::<u64>()
        .wrap_err_with(|| format!("invalid number of MB: {:?}", value))?;

    match value.checked_mul(1024 * 1024) {
        Some(bytes) => Ok(bytes),
        None => bail!("number of MB is out of range: {}", value),
    }
}

/// Parses memory with an optional unit (K, M, G, T, P, E) into bytes;
/// values without a unit are in bytes
pub fn parse_memory(value: &str) -> Result<u64> {
    if value.is_empty() {
        bail!("mem value is empty");
    }

    let (number, exponent) = match MEM_UNITS
        .iter()
        .position(|&unit| value.ends_with(unit))
    {
        Some(idx) => (&value[..value.len() - 1], idx as i32 + 1),
        None => (value, 0),
    };

    let mem = number
        .parse::<f64>()
        .wrap_err_with(|| format!("parsing mem {:?}", value))?;

    if !mem.is_finite() || mem < 0.0 {
        bail!("invalid mem {:?}", value);
    }

    Ok((mem * 1024f64.powi(exponent)) as u64)
}

/// Converts bytes to GiB
pub fn gib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}
