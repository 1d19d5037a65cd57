use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use std::fs;
use std::path::PathBuf;

use roiradiomics::{run_on_input_dir, Config};

/// Extract radiomics features for grey and white matter ROI masks.
#[derive(Parser, Debug)]
#[command(name = "roiradiomics", version, about)]
struct Args {
    /// TOML configuration file. Command line options override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with the *_croppedT1_<x>_.nii.gz images and their masks.
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory for the feature tables and logs.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// ROI index to process. Repeat for several indices.
    #[arg(short, long = "roi")]
    roi: Vec<u32>,

    /// Mask label value of the region of interest.
    #[arg(short, long)]
    label: Option<u32>,

    /// Write the effective configuration to this file and exit.
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Args {
    fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("cannot read configuration file {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if !self.roi.is_empty() {
            config.roi_indices = self.roi.clone();
        }
        if let Some(label) = self.label {
            config.label = label;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.to_config()?;

    if let Some(path) = &args.write_config {
        fs::write(path, config.to_toml_string()?)
            .with_context(|| format!("cannot write configuration file {}", path.display()))?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let summary = run_on_input_dir(&config)
        .with_context(|| format!("extraction over {} failed", config.input_dir.display()))?;
    println!("{}", summary);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn command_line_values_override_the_defaults() {
        let args = Args::parse_from(["roiradiomics", "-i", "/in", "--roi", "5", "--roi", "7", "-l", "2"]);
        let config = args.to_config().unwrap();
        assert_eq!(PathBuf::from("/in"), config.input_dir);
        assert_eq!(PathBuf::from("."), config.output_dir);
        assert_eq!(vec![5, 7], config.roi_indices);
        assert_eq!(2, config.label);
    }

    #[test]
    fn no_arguments_give_the_default_config() {
        let args = Args::parse_from(["roiradiomics"]);
        assert_eq!(Config::default(), args.to_config().unwrap());
    }

    #[test]
    fn the_config_file_is_read_before_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "roi_indices = [1]\nlabel = 3\n").unwrap();
        let args = Args::parse_from(["roiradiomics", "-c", path.to_str().unwrap(), "-l", "4"]);
        let config = args.to_config().unwrap();
        assert_eq!(vec![1], config.roi_indices);
        assert_eq!(4, config.label);
    }
}
