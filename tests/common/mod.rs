use std::fs::File;
use std::io::Error;
use std::path::Path;

/// Writes a script of `rows` one-coin purchases for user `u1`, every
/// one of them scripted to succeed.
pub fn generate_script(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["user", "amount", "coins", "outcome"])?;

    for _ in 0..rows {
        wtr.write_record(["u1", "1000", "1", "success"])?;
    }

    wtr.flush()?;
    Ok(())
}
