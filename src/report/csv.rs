use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use log::info;

use super::RunSummary;
use crate::{configs::BaseConfig, error::Result};

pub const CSV_HEADER: &str = "clients,rounds,fraction_fit,local_epochs,batch_size,learning_rate,\
best_loss,final_loss,best_acc,final_acc";

/// One line of the sweep summary table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow {
    pub clients: usize,
    pub fraction_fit: f64,
    pub local_epochs: u32,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub summary: RunSummary,
}

impl SummaryRow {
    /// Pairs `summary` with the hyperparameters of the run that produced it.
    pub fn from_config(config: &BaseConfig, summary: RunSummary) -> Self {
        Self {
            clients: config.num_clients,
            fraction_fit: config.fraction_fit,
            local_epochs: config.local_epochs.get(),
            batch_size: config.batch_size.get(),
            learning_rate: config.learning_rate,
            summary,
        }
    }

    /// Renders the row; losses and accuracies keep 4 decimals.
    pub fn to_csv_line(&self) -> String {
        let s = &self.summary;
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.clients,
            s.rounds,
            self.fraction_fit,
            self.local_epochs,
            self.batch_size,
            self.learning_rate,
            round4(s.best_loss),
            round4(s.final_loss),
            round4(s.best_acc),
            round4(s.final_acc),
        )
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Appends `row` to the CSV at `path`, writing the header first if the file
/// is new or empty. Parent directories are created as needed.
///
/// # Errors
/// `Io` if the file cannot be created or written.
pub fn append_summary_row<P: AsRef<Path>>(path: P, row: &SummaryRow) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if file.metadata()?.len() == 0 {
        writeln!(file, "{CSV_HEADER}")?;
    }
    writeln!(file, "{}", row.to_csv_line())?;

    info!("summary row appended to {}", path.display());
    Ok(())
}
